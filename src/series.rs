use std::fmt;
use std::str::FromStr;

use chrono::NaiveDateTime;
use serde::Serialize;

use crate::error::AppError;

pub const FUNCTION_INTRADAY: &str = "TIME_SERIES_INTRADAY";
pub const FUNCTION_DIGITAL_CURRENCY: &str = "DIGITAL_CURRENCY_INTRADAY";

/// Time frames served by the `TIME_SERIES_*` functions.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeSeries {
    Daily,
    DailyAdjusted,
    Weekly,
    WeeklyAdjusted,
    Monthly,
    MonthlyAdjusted,
}

impl TimeSeries {
    pub const ALL: [TimeSeries; 6] = [
        TimeSeries::Daily,
        TimeSeries::DailyAdjusted,
        TimeSeries::Weekly,
        TimeSeries::WeeklyAdjusted,
        TimeSeries::Monthly,
        TimeSeries::MonthlyAdjusted,
    ];

    /// Value of the `function` query parameter.
    pub fn key_name(self) -> &'static str {
        match self {
            TimeSeries::Daily => "TIME_SERIES_DAILY",
            TimeSeries::DailyAdjusted => "TIME_SERIES_DAILY_ADJUSTED",
            TimeSeries::Weekly => "TIME_SERIES_WEEKLY",
            TimeSeries::WeeklyAdjusted => "TIME_SERIES_WEEKLY_ADJUSTED",
            TimeSeries::Monthly => "TIME_SERIES_MONTHLY",
            TimeSeries::MonthlyAdjusted => "TIME_SERIES_MONTHLY_ADJUSTED",
        }
    }

    fn name(self) -> &'static str {
        match self {
            TimeSeries::Daily => "daily",
            TimeSeries::DailyAdjusted => "daily-adjusted",
            TimeSeries::Weekly => "weekly",
            TimeSeries::WeeklyAdjusted => "weekly-adjusted",
            TimeSeries::Monthly => "monthly",
            TimeSeries::MonthlyAdjusted => "monthly-adjusted",
        }
    }
}

impl fmt::Display for TimeSeries {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

impl FromStr for TimeSeries {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_lowercase().replace('_', "-");
        TimeSeries::ALL
            .into_iter()
            .find(|series| series.name() == wanted)
            .ok_or_else(|| AppError::message(format!("unknown time series `{value}`")))
    }
}

/// Bar width for intraday queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimeInterval {
    OneMinute,
    FiveMinute,
    FifteenMinute,
    ThirtyMinute,
    SixtyMinute,
}

impl TimeInterval {
    pub const ALL: [TimeInterval; 5] = [
        TimeInterval::OneMinute,
        TimeInterval::FiveMinute,
        TimeInterval::FifteenMinute,
        TimeInterval::ThirtyMinute,
        TimeInterval::SixtyMinute,
    ];

    /// Value of the `interval` query parameter.
    pub fn key_name(self) -> &'static str {
        match self {
            TimeInterval::OneMinute => "1min",
            TimeInterval::FiveMinute => "5min",
            TimeInterval::FifteenMinute => "15min",
            TimeInterval::ThirtyMinute => "30min",
            TimeInterval::SixtyMinute => "60min",
        }
    }
}

impl fmt::Display for TimeInterval {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.key_name())
    }
}

impl FromStr for TimeInterval {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        let wanted = value.trim().to_lowercase();
        TimeInterval::ALL
            .into_iter()
            .find(|interval| interval.key_name() == wanted)
            .ok_or_else(|| AppError::message(format!("unknown interval `{value}`")))
    }
}

/// One OHLCV bar of a stock time series.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeSeriesValue {
    pub time: NaiveDateTime,
    pub open: f64,
    pub high: f64,
    pub low: f64,
    pub close: f64,
    pub volume: f64,
}

/// One sample of a digital currency, priced in the requested market and in USD.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct DigitalCurrencySeriesValue {
    pub time: NaiveDateTime,
    pub price: f64,
    pub price_usd: f64,
    pub volume: f64,
    pub market_cap_usd: f64,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn series_names_round_trip_through_from_str() {
        for series in TimeSeries::ALL {
            assert_eq!(series.to_string().parse::<TimeSeries>().unwrap(), series);
        }
        assert_eq!(
            "Weekly_Adjusted".parse::<TimeSeries>().unwrap(),
            TimeSeries::WeeklyAdjusted
        );
        assert!("hourly".parse::<TimeSeries>().is_err());
    }

    #[test]
    fn function_names_match_the_service() {
        assert_eq!(TimeSeries::Daily.key_name(), "TIME_SERIES_DAILY");
        assert_eq!(
            TimeSeries::MonthlyAdjusted.key_name(),
            "TIME_SERIES_MONTHLY_ADJUSTED"
        );
        assert_eq!(TimeInterval::FifteenMinute.key_name(), "15min");
        assert_eq!("60MIN".parse::<TimeInterval>().unwrap(), TimeInterval::SixtyMinute);
    }
}
