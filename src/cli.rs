use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use clap::{Parser, Subcommand};
use futures::future::join_all;
use serde::Serialize;

use crate::client::Client;
use crate::config::{ClientConfig, ConnectionConfig, QuotaSettings, HOST_DEFAULT};
use crate::error::Result;
use crate::limiter::QuotaTracker;
use crate::series::{TimeInterval, TimeSeries};

#[derive(Parser, Debug)]
#[command(name = "alpha-quotes")]
#[command(about = "Query Alpha Vantage time series through a rate-limited client")]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,

    /// API key for Alpha Vantage
    #[arg(long, env = "ALPHA_VANTAGE_API_KEY", default_value = "", hide_env_values = true)]
    pub api_key: String,

    /// Symbol to list
    #[arg(short, long, default_value = "GOOGL")]
    pub symbol: String,

    #[arg(long, default_value = HOST_DEFAULT)]
    pub host: String,

    #[arg(long, default_value_t = 30)]
    pub timeout_secs: u64,

    /// Calls allowed per second, 0 for no limit
    #[arg(long, default_value_t = 0)]
    pub per_second: u32,

    /// Calls allowed per day, 0 for no limit
    #[arg(long, default_value_t = 0)]
    pub per_day: u32,

    /// Print the fetched records as JSON lines
    #[arg(long)]
    pub json: bool,

    /// Override RUST_LOG level (e.g., info, debug)
    #[arg(long)]
    pub log_level: Option<String>,
}

#[derive(Subcommand, Debug, Clone)]
pub enum Commands {
    /// Query every intraday interval and every time series concurrently
    All,

    /// Query one time series (daily, weekly-adjusted, ...)
    Series { series: TimeSeries },

    /// Query one intraday interval (1min, 5min, 15min, 30min, 60min)
    Intraday { interval: TimeInterval },

    /// Query a digital currency priced in a physical currency
    Crypto { digital: String, physical: String },
}

impl Cli {
    pub fn client_config(&self) -> ClientConfig {
        let quota = QuotaTracker::with_settings(QuotaSettings::from_limits(
            self.per_day,
            self.per_second,
        ));
        let connection = ConnectionConfig::default()
            .with_host(self.host.as_str())
            .with_timeout(Duration::from_secs(self.timeout_secs))
            .with_quota(Arc::new(quota));

        ClientConfig::default()
            .with_api_key(self.api_key.as_str())
            .with_connection(connection)
    }

    pub fn build_client(&self) -> Result<Client> {
        Client::new(self.client_config())
    }
}

pub fn init_logging(level: Option<&str>) {
    let mut builder =
        env_logger::Builder::from_env(env_logger::Env::default().default_filter_or("info"));
    if let Some(level) = level {
        builder.parse_filters(level);
    }
    let _ = builder.try_init();
}

/// Run the selected queries and return how many of them failed.
pub async fn run(cli: &Cli, client: &Client) -> usize {
    let symbol = cli.symbol.as_str();
    let json = cli.json;

    match cli.command.clone().unwrap_or(Commands::All) {
        Commands::All => {
            let intraday = TimeInterval::ALL.into_iter().map(move |interval| {
                report(
                    format!("intraday {interval}"),
                    symbol,
                    json,
                    client.time_series_intraday(interval, symbol),
                )
            });
            let series = TimeSeries::ALL.into_iter().map(move |series| {
                report(
                    series.to_string(),
                    symbol,
                    json,
                    client.time_series(series, symbol),
                )
            });

            let (intraday, series) = futures::join!(join_all(intraday), join_all(series));
            intraday
                .into_iter()
                .chain(series)
                .filter(|succeeded| !succeeded)
                .count()
        }
        Commands::Series { series } => {
            let ok = report(
                series.to_string(),
                symbol,
                json,
                client.time_series(series, symbol),
            )
            .await;
            usize::from(!ok)
        }
        Commands::Intraday { interval } => {
            let ok = report(
                format!("intraday {interval}"),
                symbol,
                json,
                client.time_series_intraday(interval, symbol),
            )
            .await;
            usize::from(!ok)
        }
        Commands::Crypto { digital, physical } => {
            let ok = report(
                format!("{digital} => {physical}"),
                &digital,
                json,
                client.digital_currency(&digital, &physical),
            )
            .await;
            usize::from(!ok)
        }
    }
}

async fn report<T, F>(label: String, symbol: &str, json: bool, query: F) -> bool
where
    T: Serialize,
    F: Future<Output = Result<Vec<T>>>,
{
    match query.await {
        Ok(records) => {
            if json {
                let line = serde_json::json!({
                    "query": label,
                    "symbol": symbol,
                    "records": records,
                });
                println!("{line}");
            } else {
                println!("{} {} with {} records", label, symbol, records.len());
            }
            true
        }
        Err(err) => {
            eprintln!("error loading {} for {}: {}", label, symbol, err);
            false
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::transport::{StubTransport, Transport};

    #[test]
    fn defaults_match_the_demo() {
        let cli = Cli::try_parse_from(["alpha-quotes", "--api-key", "k"]).unwrap();

        assert!(cli.command.is_none());
        assert_eq!(cli.symbol, "GOOGL");
        assert_eq!(cli.host, HOST_DEFAULT);
        assert_eq!(cli.timeout_secs, 30);
    }

    #[test]
    fn parses_subcommand_arguments() {
        let cli = Cli::try_parse_from(["alpha-quotes", "series", "monthly-adjusted"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Series {
                series: TimeSeries::MonthlyAdjusted
            })
        ));

        let cli = Cli::try_parse_from(["alpha-quotes", "intraday", "15min"]).unwrap();
        assert!(matches!(
            cli.command,
            Some(Commands::Intraday {
                interval: TimeInterval::FifteenMinute
            })
        ));

        assert!(Cli::try_parse_from(["alpha-quotes", "intraday", "2min"]).is_err());
    }

    #[test]
    fn limits_flow_into_the_quota_tracker() {
        let cli = Cli::try_parse_from([
            "alpha-quotes",
            "--per-second",
            "5",
            "--per-day",
            "500",
            "--host",
            "mirror.example",
        ])
        .unwrap();

        let config = cli.client_config();
        let quota = config.connection.quota.expect("quota is configured");

        assert_eq!(quota.second_limit(), Some(5));
        assert_eq!(quota.day_limit(), Some(500));
        assert_eq!(config.connection.host, "mirror.example");
        assert!(cli.build_client().is_ok());
    }

    #[tokio::test]
    async fn failing_queries_do_not_abort_siblings() {
        let body = "timestamp,open,high,low,close,volume\n2024-01-05,1,2,0.5,1.5,100\n";
        let cli = Cli::try_parse_from(["alpha-quotes"]).unwrap();

        let ok = Client::with_transport("k", Arc::new(StubTransport::with_body(body)));
        assert_eq!(run(&cli, &ok).await, 0);

        let stub = Arc::new(StubTransport::with_error("down"));
        let failing = Client::with_transport("k", Arc::clone(&stub) as Arc<dyn Transport>);
        let failures = run(&cli, &failing).await;

        assert_eq!(failures, TimeInterval::ALL.len() + TimeSeries::ALL.len());
        assert_eq!(stub.calls(), failures);
    }
}
