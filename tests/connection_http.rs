use std::sync::Arc;
use std::time::{Duration, Instant};

use alpha_quotes::{
    AppError, Client, ClientConfig, Connection, ConnectionConfig, Endpoint, QuotaTracker, Scheme,
    TimeSeries, Transport,
};
use httpmock::{Method::GET, MockServer};

const DAILY_CSV: &str = "timestamp,open,high,low,close,volume
2024-01-08,181.99,185.60,181.50,185.56,59144500
2024-01-05,181.99,182.76,180.17,181.18,62379700
2024-01-04,182.15,183.09,180.88,181.91,71983600
2024-01-03,184.22,185.88,183.43,184.25,58414500
2024-01-02,187.15,188.44,183.89,185.64,82488700
";

fn local_connection(server: &MockServer) -> ConnectionConfig {
    ConnectionConfig::default()
        .with_scheme(Scheme::Http)
        .with_host(server.address().to_string())
}

#[tokio::test]
async fn daily_series_over_http() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET)
                .path("/query")
                .query_param("apikey", "test")
                .query_param("datatype", "csv")
                .query_param("outputsize", "compact")
                .query_param("function", "TIME_SERIES_DAILY")
                .query_param("symbol", "TEST");
            then.status(200)
                .header("content-type", "application/x-download")
                .body(DAILY_CSV);
        })
        .await;

    let client = Client::new(
        ClientConfig::default()
            .with_api_key("test")
            .with_connection(local_connection(&server)),
    )
    .unwrap();

    let values = client.time_series(TimeSeries::Daily, "TEST").await.unwrap();

    mock.assert_async().await;
    assert_eq!(values.len(), 5);
    assert_eq!(values[0].time.date().to_string(), "2024-01-02");
}

#[tokio::test]
async fn status_codes_are_left_to_the_caller() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/query");
            then.status(503).body("maintenance");
        })
        .await;

    let conn = Connection::new(local_connection(&server)).unwrap();
    let body = conn
        .request(&Endpoint::query().with_param("function", "TIME_SERIES_DAILY"))
        .await
        .unwrap();

    assert_eq!(body.into_string().unwrap(), "maintenance");
}

#[tokio::test]
async fn daily_limit_rejects_before_any_request() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/query");
            then.status(200).body(DAILY_CSV);
        })
        .await;

    let quota = Arc::new(QuotaTracker::new(1, 0));
    let client = Client::new(
        ClientConfig::default()
            .with_api_key("test")
            .with_connection(local_connection(&server).with_quota(Arc::clone(&quota))),
    )
    .unwrap();

    client.time_series(TimeSeries::Daily, "TEST").await.unwrap();
    let err = client
        .time_series(TimeSeries::Weekly, "TEST")
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::DailyLimitReached));
    assert_eq!(mock.hits_async().await, 1);
    assert_eq!(quota.usage().day_count, 1);
}

#[tokio::test]
async fn exhausted_tracker_sends_nothing() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/query");
            then.status(200).body(DAILY_CSV);
        })
        .await;

    let quota = Arc::new(QuotaTracker::new(1, 0));
    quota.admit(|| async { Ok(()) }).await.unwrap();

    let conn = Connection::new(local_connection(&server).with_quota(quota)).unwrap();
    let err = conn.request(&Endpoint::query()).await.unwrap_err();

    assert!(err.is_quota_exceeded());
    assert_eq!(mock.hits_async().await, 0);
}

#[tokio::test]
async fn per_second_limit_spaces_out_requests() {
    let server = MockServer::start_async().await;
    let mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/query");
            then.status(200).body(DAILY_CSV);
        })
        .await;

    let quota = Arc::new(QuotaTracker::new(0, 2));
    let client = Client::new(
        ClientConfig::default()
            .with_api_key("test")
            .with_connection(local_connection(&server).with_quota(quota)),
    )
    .unwrap();

    let started = Instant::now();
    for _ in 0..3 {
        client.time_series(TimeSeries::Daily, "TEST").await.unwrap();
    }

    assert!(started.elapsed() >= Duration::from_millis(500));
    assert_eq!(mock.hits_async().await, 3);
}

#[tokio::test]
async fn timeout_surfaces_as_transport_error() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/query");
            then.status(200)
                .delay(Duration::from_secs(2))
                .body(DAILY_CSV);
        })
        .await;

    let conn = Connection::new(
        local_connection(&server).with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let err = conn.request(&Endpoint::query()).await.unwrap_err();

    match err {
        AppError::Transport(inner) => assert!(inner.is_timeout()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn later_timeout_applies_to_injected_client() {
    let server = MockServer::start_async().await;
    let _mock = server
        .mock_async(|when, then| {
            when.method(GET).path("/query");
            then.status(200)
                .delay(Duration::from_secs(2))
                .body(DAILY_CSV);
        })
        .await;

    let conn = Connection::new(
        local_connection(&server)
            .with_http_client(reqwest::Client::new())
            .with_timeout(Duration::from_millis(200)),
    )
    .unwrap();

    let started = Instant::now();
    let err = conn.request(&Endpoint::query()).await.unwrap_err();

    assert!(started.elapsed() < Duration::from_millis(1500));
    match err {
        AppError::Transport(inner) => assert!(inner.is_timeout()),
        other => panic!("unexpected error: {other:?}"),
    }
}

#[tokio::test]
async fn concurrent_queries_fail_independently() {
    let server = MockServer::start_async().await;
    let _ok = server
        .mock_async(|when, then| {
            when.method(GET).path("/query").query_param("symbol", "GOOD");
            then.status(200).body(DAILY_CSV);
        })
        .await;
    let _bad = server
        .mock_async(|when, then| {
            when.method(GET).path("/query").query_param("symbol", "BAD");
            then.status(200)
                .body(r#"{"Error Message": "Invalid API call."}"#);
        })
        .await;

    let client = Client::new(
        ClientConfig::default()
            .with_api_key("test")
            .with_connection(local_connection(&server)),
    )
    .unwrap();

    let (good, bad) = tokio::join!(
        client.time_series(TimeSeries::Daily, "GOOD"),
        client.time_series(TimeSeries::Daily, "BAD"),
    );

    assert_eq!(good.unwrap().len(), 5);
    assert!(matches!(bad, Err(AppError::Api(ref msg)) if msg == "Invalid API call."));
}
