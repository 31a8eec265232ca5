//! CSV decoding of Alpha Vantage responses into series records.

use std::io::{BufRead, BufReader, Read};

use chrono::{NaiveDate, NaiveDateTime};
use serde_json::Value;

use crate::error::{AppError, Result};
use crate::series::{DigitalCurrencySeriesValue, TimeSeriesValue};

const DATE_TIME_FORMAT: &str = "%Y-%m-%d %H:%M:%S";
const DATE_FORMAT: &str = "%Y-%m-%d";

/// Keys the service uses for JSON error or throttling payloads sent in place of CSV.
const API_MESSAGE_KEYS: &[&str] = &["Error Message", "Note", "Information"];

/// Decode a time series CSV body. Records come back oldest first.
pub fn parse_time_series<R: Read>(body: R) -> Result<Vec<TimeSeriesValue>> {
    let mut body = BufReader::new(body);
    reject_api_message(&mut body)?;

    let mut reader = csv_reader(body);
    let columns = TimeSeriesColumns::locate(reader.headers()?)?;

    let mut values = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        values.push(columns.read(&record, idx + 1)?);
    }

    values.sort_by(|a, b| a.time.cmp(&b.time));
    Ok(values)
}

/// Decode a digital currency CSV body. Records come back oldest first.
pub fn parse_digital_currency_series<R: Read>(body: R) -> Result<Vec<DigitalCurrencySeriesValue>> {
    let mut body = BufReader::new(body);
    reject_api_message(&mut body)?;

    let mut reader = csv_reader(body);
    let mut values = Vec::new();
    for (idx, record) in reader.records().enumerate() {
        let record = record?;
        let row = idx + 1;
        if record.len() < 5 {
            return Err(AppError::parse(format!(
                "row {row}: expected 5 columns, found {}",
                record.len()
            )));
        }

        values.push(DigitalCurrencySeriesValue {
            time: timestamp_field(&record, 0, row)?,
            price: number_field(&record, 1, "price", row)?,
            price_usd: number_field(&record, 2, "price (USD)", row)?,
            volume: number_field(&record, 3, "volume", row)?,
            market_cap_usd: number_field(&record, 4, "market cap (USD)", row)?,
        });
    }

    values.sort_by(|a, b| a.time.cmp(&b.time));
    Ok(values)
}

fn csv_reader<R: Read>(body: R) -> csv::Reader<R> {
    csv::ReaderBuilder::new()
        .has_headers(true)
        .trim(csv::Trim::All)
        .from_reader(body)
}

struct TimeSeriesColumns {
    timestamp: usize,
    open: usize,
    high: usize,
    low: usize,
    close: usize,
    volume: usize,
}

impl TimeSeriesColumns {
    fn locate(headers: &csv::StringRecord) -> Result<Self> {
        let find = |name: &str| -> Result<usize> {
            headers
                .iter()
                .position(|header| header.eq_ignore_ascii_case(name))
                .ok_or_else(|| AppError::parse(format!("missing `{name}` column")))
        };

        Ok(Self {
            timestamp: find("timestamp")?,
            open: find("open")?,
            high: find("high")?,
            low: find("low")?,
            close: find("close")?,
            volume: find("volume")?,
        })
    }

    fn read(&self, record: &csv::StringRecord, row: usize) -> Result<TimeSeriesValue> {
        Ok(TimeSeriesValue {
            time: timestamp_field(record, self.timestamp, row)?,
            open: number_field(record, self.open, "open", row)?,
            high: number_field(record, self.high, "high", row)?,
            low: number_field(record, self.low, "low", row)?,
            close: number_field(record, self.close, "close", row)?,
            volume: number_field(record, self.volume, "volume", row)?,
        })
    }
}

fn timestamp_field(record: &csv::StringRecord, idx: usize, row: usize) -> Result<NaiveDateTime> {
    let raw = record.get(idx).unwrap_or_default();
    parse_timestamp(raw)
        .ok_or_else(|| AppError::parse(format!("row {row}: invalid timestamp `{raw}`")))
}

fn number_field(record: &csv::StringRecord, idx: usize, name: &str, row: usize) -> Result<f64> {
    let raw = record.get(idx).unwrap_or_default();
    raw.parse::<f64>()
        .map_err(|_| AppError::parse(format!("row {row}: invalid {name} value `{raw}`")))
}

fn parse_timestamp(value: &str) -> Option<NaiveDateTime> {
    NaiveDateTime::parse_from_str(value, DATE_TIME_FORMAT)
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(value, DATE_FORMAT)
                .ok()
                .and_then(|date| date.and_hms_opt(0, 0, 0))
        })
}

/// Fail on an empty body or a JSON message body, leaving CSV untouched in the reader.
fn reject_api_message<R: BufRead>(body: &mut R) -> Result<()> {
    loop {
        let (leading_ws, first) = {
            let buf = body.fill_buf()?;
            if buf.is_empty() {
                return Err(AppError::parse("empty response body"));
            }
            let leading_ws = buf.iter().take_while(|b| b.is_ascii_whitespace()).count();
            (leading_ws, buf.get(leading_ws).copied())
        };

        match first {
            None => body.consume(leading_ws),
            Some(b'{') => {
                let mut text = String::new();
                body.read_to_string(&mut text)?;
                return Err(AppError::Api(api_message(&text)));
            }
            Some(_) => {
                body.consume(leading_ws);
                return Ok(());
            }
        }
    }
}

fn api_message(text: &str) -> String {
    let Ok(json) = serde_json::from_str::<Value>(text) else {
        return text.trim().to_string();
    };

    API_MESSAGE_KEYS
        .iter()
        .find_map(|key| json.get(*key).and_then(Value::as_str))
        .map(str::to_string)
        .unwrap_or_else(|| json.to_string())
}
