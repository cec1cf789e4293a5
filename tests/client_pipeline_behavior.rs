//! Behavior-driven tests for the full client pipeline
//!
//! These tests verify HOW a query travels through validation, caching,
//! concurrency limiting, retry, transport, and the response transform,
//! focusing on user-visible outcomes.

use quantrail_core::{
    cache::CacheMode,
    client::QueryClient,
    config::{CacheConfig, ClientConfig, ConcurrencyConfig, RetryConfig},
    error::ApiError,
    params::{QueryRequest, Scalar},
    transform::ColumnarTable,
    transport::Transport,
};
use std::collections::VecDeque;
use std::future::Future;
use std::pin::Pin;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::{Arc, Mutex};
use std::time::Duration;

/// Transport that replays a scripted sequence of outcomes and records how
/// many concurrent sends it observed.
struct ScriptedTransport {
    script: Mutex<VecDeque<Result<ColumnarTable, ApiError>>>,
    calls: AtomicUsize,
    concurrent: AtomicUsize,
    peak_concurrent: AtomicUsize,
    per_call_delay: Duration,
}

impl ScriptedTransport {
    fn new(script: Vec<Result<ColumnarTable, ApiError>>) -> Arc<Self> {
        Self::with_delay(script, Duration::ZERO)
    }

    fn with_delay(
        script: Vec<Result<ColumnarTable, ApiError>>,
        per_call_delay: Duration,
    ) -> Arc<Self> {
        Arc::new(Self {
            script: Mutex::new(script.into()),
            calls: AtomicUsize::new(0),
            concurrent: AtomicUsize::new(0),
            peak_concurrent: AtomicUsize::new(0),
            per_call_delay,
        })
    }

    fn calls(&self) -> usize {
        self.calls.load(Ordering::SeqCst)
    }

    fn peak_concurrent(&self) -> usize {
        self.peak_concurrent.load(Ordering::SeqCst)
    }
}

impl Transport for ScriptedTransport {
    fn send<'a>(
        &'a self,
        _request: &'a QueryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ColumnarTable, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            self.calls.fetch_add(1, Ordering::SeqCst);
            let now = self.concurrent.fetch_add(1, Ordering::SeqCst) + 1;
            self.peak_concurrent.fetch_max(now, Ordering::SeqCst);
            if self.per_call_delay > Duration::ZERO {
                tokio::time::sleep(self.per_call_delay).await;
            }
            self.concurrent.fetch_sub(1, Ordering::SeqCst);
            self.script
                .lock()
                .expect("script lock")
                .pop_front()
                .unwrap_or_else(|| Ok(bars_table()))
        })
    }
}

fn bars_table() -> ColumnarTable {
    ColumnarTable::new(
        vec![
            String::from("date"),
            String::from("open"),
            String::from("close"),
        ],
        vec![
            vec![
                Scalar::from("20240102"),
                Scalar::from(187.15),
                Scalar::from(185.64),
            ],
            vec![Scalar::from("20240103"), Scalar::from(184.22)],
        ],
    )
}

fn config() -> ClientConfig {
    ClientConfig::new("integration-token").with_retry(RetryConfig {
        max_retries: 2,
        initial_delay: Duration::from_millis(100),
        max_delay: Duration::from_secs(1),
        multiplier: 2.0,
    })
}

// =============================================================================
// Pipeline: End-to-End Success Path
// =============================================================================

#[tokio::test]
async fn when_the_transport_answers_records_reflect_the_columnar_payload() {
    // Given: a transport with a two-row columnar payload, one row short
    let transport = ScriptedTransport::new(vec![Ok(bars_table())]);
    let client = QueryClient::new(config(), transport.clone()).expect("valid config");

    // When: a validated query runs through the pipeline
    let records = client
        .query(
            QueryRequest::new("market.bars")
                .with_param("symbol", "AAPL")
                .with_param("start_date", "20240101")
                .with_param("end_date", "20240131"),
        )
        .await
        .expect("pipeline succeeds");

    // Then: one record per row, fields in declared order, short row padded
    assert_eq!(records.len(), 2);
    let first = &records.records()[0];
    let fields: Vec<&str> = first.fields().collect();
    assert_eq!(fields, vec!["date", "open", "close"]);

    let second = &records.records()[1];
    assert_eq!(second.get("open"), Some(&Scalar::Number(184.22)));
    assert_eq!(second.get("close"), None, "short row pads with absent");
    assert!(second.contains_field("close"));
}

#[tokio::test(start_paused = true)]
async fn when_the_transport_fails_twice_then_succeeds_three_attempts_resolve() {
    // Given: maxRetries=2 and a transport that fails twice with a retryable
    // network error before succeeding
    let transport = ScriptedTransport::new(vec![
        Err(ApiError::network("connection reset")),
        Err(ApiError::network("connection reset")),
        Ok(bars_table()),
    ]);
    let client = QueryClient::new(config(), transport.clone()).expect("valid config");

    // When: the query executes
    let result = client.query(QueryRequest::new("market.bars")).await;

    // Then: it resolves with the success value after exactly 3 attempts
    assert!(result.is_ok());
    assert_eq!(transport.calls(), 3);
}

// =============================================================================
// Pipeline: Cache Interaction
// =============================================================================

#[tokio::test]
async fn when_parameters_reorder_the_cache_still_hits() {
    let transport = ScriptedTransport::new(vec![Ok(bars_table())]);
    let client = QueryClient::new(config(), transport.clone()).expect("valid config");

    let first = client
        .query(
            QueryRequest::new("market.bars")
                .with_param("symbol", "AAPL")
                .with_param("interval", "1d"),
        )
        .await
        .expect("network fetch");

    let second = client
        .query(
            QueryRequest::new("market.bars")
                .with_param("interval", "1d")
                .with_param("symbol", "AAPL"),
        )
        .await
        .expect("cache hit");

    assert_eq!(transport.calls(), 1);
    assert_eq!(first, second);
}

#[tokio::test(start_paused = true)]
async fn when_the_ttl_elapses_the_next_query_refetches() {
    let transport = ScriptedTransport::new(vec![Ok(bars_table()), Ok(bars_table())]);
    let client_config = config().with_cache(CacheConfig {
        enabled: true,
        default_ttl: Duration::from_secs(5),
        capacity: 16,
    });
    let client = QueryClient::new(client_config, transport.clone()).expect("valid config");

    let request = QueryRequest::new("market.quote").with_param("symbol", "AAPL");
    client.query(request.clone()).await.expect("first fetch");
    client.query(request.clone()).await.expect("cache hit");
    assert_eq!(transport.calls(), 1);

    tokio::time::advance(Duration::from_secs(5)).await;
    client.query(request).await.expect("refetch after expiry");
    assert_eq!(transport.calls(), 2);
}

#[tokio::test]
async fn when_cache_mode_is_refresh_the_cache_is_updated_not_read() {
    let transport = ScriptedTransport::new(vec![Ok(bars_table()), Ok(bars_table())]);
    let client = QueryClient::new(config(), transport.clone()).expect("valid config");

    let request = QueryRequest::new("market.quote").with_param("symbol", "AAPL");
    client.query(request.clone()).await.expect("seed the cache");
    client
        .query_with(request.clone(), CacheMode::Refresh, None)
        .await
        .expect("forced refetch");
    assert_eq!(transport.calls(), 2);

    // A plain query afterwards is served from the refreshed entry.
    client.query(request).await.expect("cache hit");
    assert_eq!(transport.calls(), 2);
}

// =============================================================================
// Pipeline: Concurrency Limiting
// =============================================================================

#[tokio::test(start_paused = true)]
async fn when_many_queries_race_in_flight_count_respects_the_bound() {
    // Given: a client allowing 2 simultaneous requests and a slow transport
    let transport = ScriptedTransport::with_delay(Vec::new(), Duration::from_millis(20));
    let client_config = config()
        .with_concurrency(ConcurrencyConfig {
            max_concurrent: 2,
            min_spacing: Duration::ZERO,
        })
        .with_cache(CacheConfig {
            enabled: false,
            default_ttl: Duration::ZERO,
            capacity: 0,
        });
    let client =
        Arc::new(QueryClient::new(client_config, transport.clone()).expect("valid config"));

    // When: eight distinct queries are submitted at once
    let mut handles = Vec::new();
    for i in 0..8 {
        let client = Arc::clone(&client);
        handles.push(tokio::spawn(async move {
            client
                .query(QueryRequest::new("market.quote").with_param("symbol", format!("SYM{i}")))
                .await
        }));
    }
    for handle in handles {
        handle.await.expect("task completes").expect("query succeeds");
    }

    // Then: the transport never observed more than 2 concurrent sends
    assert_eq!(transport.calls(), 8);
    assert!(transport.peak_concurrent() <= 2);
    assert_eq!(client.in_flight(), 0);
    assert_eq!(client.queued_len(), 0);
}
