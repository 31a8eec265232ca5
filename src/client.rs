use std::sync::Arc;

use crate::config::ClientConfig;
use crate::endpoint::{
    Endpoint, QUERY_API_KEY, QUERY_DATA_TYPE, QUERY_FUNCTION, QUERY_INTERVAL, QUERY_MARKET,
    QUERY_OUTPUT_SIZE, QUERY_SYMBOL, VALUE_COMPACT, VALUE_CSV,
};
use crate::error::Result;
use crate::parse::{parse_digital_currency_series, parse_time_series};
use crate::series::{
    DigitalCurrencySeriesValue, TimeInterval, TimeSeries, TimeSeriesValue,
    FUNCTION_DIGITAL_CURRENCY, FUNCTION_INTRADAY,
};
use crate::transport::{Connection, Transport};

/// Queries Alpha Vantage series through a shared transport.
///
/// Cloning is cheap and clones share the transport, and with it the quota tracker.
#[derive(Clone)]
pub struct Client {
    api_key: String,
    transport: Arc<dyn Transport>,
}

impl Client {
    pub fn new(config: ClientConfig) -> Result<Self> {
        let transport = match config.transport {
            Some(transport) => transport,
            None => Arc::new(Connection::new(config.connection)?),
        };

        Ok(Self {
            api_key: config.api_key,
            transport,
        })
    }

    pub fn with_transport<S: Into<String>>(api_key: S, transport: Arc<dyn Transport>) -> Self {
        Self {
            api_key: api_key.into(),
            transport,
        }
    }

    pub fn transport(&self) -> &Arc<dyn Transport> {
        &self.transport
    }

    /// Builds a query endpoint: the key, CSV output and compact size first, then `params`,
    /// which replace defaults that share a key.
    pub fn endpoint<'a, I>(&self, params: I) -> Endpoint
    where
        I: IntoIterator<Item = (&'a str, &'a str)>,
    {
        let mut endpoint = Endpoint::query()
            .with_param(QUERY_API_KEY, self.api_key.as_str())
            .with_param(QUERY_DATA_TYPE, VALUE_CSV)
            .with_param(QUERY_OUTPUT_SIZE, VALUE_COMPACT);

        for (key, value) in params {
            endpoint.set(key, value);
        }

        endpoint
    }

    /// A symbol's bars across one trading day at the given interval, oldest first.
    pub async fn time_series_intraday(
        &self,
        interval: TimeInterval,
        symbol: &str,
    ) -> Result<Vec<TimeSeriesValue>> {
        let endpoint = self.endpoint([
            (QUERY_FUNCTION, FUNCTION_INTRADAY),
            (QUERY_INTERVAL, interval.key_name()),
            (QUERY_SYMBOL, symbol),
        ]);
        let body = self.transport.request(&endpoint).await?;
        parse_time_series(body)
    }

    /// A symbol's bars for the given time frame, oldest first.
    pub async fn time_series(
        &self,
        series: TimeSeries,
        symbol: &str,
    ) -> Result<Vec<TimeSeriesValue>> {
        let endpoint = self.endpoint([
            (QUERY_FUNCTION, series.key_name()),
            (QUERY_SYMBOL, symbol),
        ]);
        let body = self.transport.request(&endpoint).await?;
        parse_time_series(body)
    }

    /// Intraday prices of a digital currency in terms of a physical one, oldest first.
    pub async fn digital_currency(
        &self,
        digital: &str,
        physical: &str,
    ) -> Result<Vec<DigitalCurrencySeriesValue>> {
        let endpoint = self.endpoint([
            (QUERY_FUNCTION, FUNCTION_DIGITAL_CURRENCY),
            (QUERY_SYMBOL, digital),
            (QUERY_MARKET, physical),
        ]);
        let body = self.transport.request(&endpoint).await?;
        parse_digital_currency_series(body)
    }
}
