//! Transport boundary: an opaque async point-to-point request function.
//!
//! The pipeline only requires that a transport resolve a query to a
//! [`ColumnarTable`] or fail with a classified [`ApiError`]. The shipped
//! [`HttpTransport`] speaks JSON over HTTPS; [`NoopTransport`] answers every
//! query with an empty table for deterministic offline tests.

use std::future::Future;
use std::pin::Pin;
use std::sync::Arc;
use std::time::Duration;

use crate::config::ClientConfig;
use crate::error::ApiError;
use crate::params::QueryRequest;
use crate::transform::ColumnarTable;

/// Asynchronous request/response contract consumed by the pipeline.
pub trait Transport: Send + Sync {
    fn send<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ColumnarTable, ApiError>> + Send + 'a>>;
}

/// Default no-op transport for deterministic offline tests.
#[derive(Debug, Default)]
pub struct NoopTransport;

impl Transport for NoopTransport {
    fn send<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ColumnarTable, ApiError>> + Send + 'a>> {
        let _ = request;
        Box::pin(async move { Ok(ColumnarTable::empty()) })
    }
}

/// Production transport over reqwest.
///
/// Queries become `GET {base_url}/{operation}?{params}` with bearer-token
/// auth; responses are decoded as the columnar JSON shape and non-success
/// statuses map onto the error taxonomy.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Arc<reqwest::Client>,
    base_url: String,
    token: String,
    timeout: Duration,
}

impl HttpTransport {
    /// # Panics
    ///
    /// Panics if the HTTP client cannot be constructed (e.g. the TLS backend
    /// fails to initialize) — the same condition under which
    /// `reqwest::Client::new` panics.
    pub fn new(base_url: impl Into<String>, token: impl Into<String>) -> Self {
        Self {
            client: Arc::new(
                reqwest::Client::builder()
                    .user_agent("quantrail/0.1.0")
                    .build()
                    .expect("http client construction failed"),
            ),
            base_url: base_url.into().trim_end_matches('/').to_owned(),
            token: token.into(),
            timeout: Duration::from_secs(30),
        }
    }

    /// Build a transport from a validated client configuration.
    pub fn from_config(base_url: impl Into<String>, config: &ClientConfig) -> Self {
        let mut transport = Self::new(base_url, config.token.clone());
        if let Some(timeout) = config.timeout {
            transport.timeout = timeout;
        }
        transport
    }

    pub fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }

    fn url_for(&self, request: &QueryRequest) -> String {
        let mut url = format!("{}/{}", self.base_url, request.operation());
        let mut separator = '?';
        for (key, value) in request.params() {
            if value.is_null() {
                continue;
            }
            let encoded = urlencoding::encode(&value.to_string()).into_owned();
            url.push(separator);
            url.push_str(&urlencoding::encode(key));
            url.push('=');
            url.push_str(&encoded);
            separator = '&';
        }
        url
    }
}

impl Transport for HttpTransport {
    fn send<'a>(
        &'a self,
        request: &'a QueryRequest,
    ) -> Pin<Box<dyn Future<Output = Result<ColumnarTable, ApiError>> + Send + 'a>> {
        Box::pin(async move {
            let response = self
                .client
                .get(self.url_for(request))
                .bearer_auth(&self.token)
                .timeout(self.timeout)
                .send()
                .await
                .map_err(|e| {
                    if e.is_timeout() {
                        ApiError::timeout(format!("request timeout: {e}"))
                    } else if e.is_connect() {
                        ApiError::network(format!("connection failed: {e}"))
                    } else {
                        ApiError::network(format!("request failed: {e}"))
                    }
                })?;

            let status = response.status().as_u16();
            if !(200..300).contains(&status) {
                let retry_after = response
                    .headers()
                    .get("retry-after")
                    .and_then(|v| v.to_str().ok())
                    .and_then(|v| v.parse::<u64>().ok())
                    .map(Duration::from_secs);
                return Err(classify_status(status, retry_after));
            }

            response
                .json::<ColumnarTable>()
                .await
                .map_err(|e| ApiError::unknown(format!("failed to decode response body: {e}")))
        })
    }
}

/// Map a non-success HTTP status onto the error taxonomy.
fn classify_status(status: u16, retry_after: Option<Duration>) -> ApiError {
    match status {
        401 | 403 => ApiError::auth(format!("authentication rejected (status {status})")),
        408 => ApiError::timeout("server reported a request timeout (status 408)"),
        429 => {
            let err = ApiError::rate_limited("rate limit exceeded (status 429)");
            match retry_after {
                Some(wait) => err.with_retry_after(wait),
                None => err,
            }
        }
        500..=599 => ApiError::server(format!("server error (status {status})")),
        _ => ApiError::unknown(format!("unexpected response status {status}")),
    }
}
