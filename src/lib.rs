pub mod cli;
pub mod client;
pub mod config;
pub mod endpoint;
pub mod error;
pub mod limiter;
pub mod parse;
pub mod series;
pub mod transport;

pub use client::Client;
pub use config::{ClientConfig, ConnectionConfig, QuotaSettings, Scheme};
pub use endpoint::Endpoint;
pub use error::{AppError, Result};
pub use limiter::{QuotaTracker, QuotaUsage};
pub use series::{DigitalCurrencySeriesValue, TimeInterval, TimeSeries, TimeSeriesValue};
pub use transport::{Connection, ResponseBody, StubTransport, Transport};
