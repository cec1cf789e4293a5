//! The query client: validation, caching, pacing, and retries around a
//! transport.
//!
//! Call flow for [`QueryClient::query`]: validate the request, consult the
//! cache (a hit short-circuits), wait for a limiter slot and pacing interval,
//! run the transport under the retry policy, transform the columnar response
//! into records, store them in the cache, and return them.

use std::sync::Arc;
use std::time::Duration;

use crate::cache::{CacheMode, CacheStore};
use crate::config::ClientConfig;
use crate::error::{ApiError, ValidationError};
use crate::limiter::RequestLimiter;
use crate::params::QueryRequest;
use crate::retry::RetryPolicy;
use crate::transform::RecordSet;
use crate::transport::{HttpTransport, Transport};

/// Typed client for the remote query API.
///
/// Each instance owns its cache, limiter, and retry policy; nothing is shared
/// across instances. Configuration is validated once at construction and
/// immutable afterwards.
pub struct QueryClient {
    config: ClientConfig,
    transport: Arc<dyn Transport>,
    cache: CacheStore,
    limiter: RequestLimiter,
    retry: RetryPolicy,
}

impl QueryClient {
    /// Build a client over an arbitrary transport.
    ///
    /// # Errors
    ///
    /// Returns the first configuration bound violation; no component state is
    /// created for an invalid configuration.
    pub fn new(config: ClientConfig, transport: Arc<dyn Transport>) -> Result<Self, ValidationError> {
        config.validate()?;
        let cache = CacheStore::from_config(&config.cache);
        let limiter = RequestLimiter::from_config(&config.concurrency);
        let retry = RetryPolicy::new(&config.retry);
        Ok(Self {
            config,
            transport,
            cache,
            limiter,
            retry,
        })
    }

    /// Build a client over the HTTP transport rooted at `base_url`.
    pub fn over_http(
        config: ClientConfig,
        base_url: impl Into<String>,
    ) -> Result<Self, ValidationError> {
        let transport = Arc::new(HttpTransport::from_config(base_url, &config));
        Self::new(config, transport)
    }

    pub fn config(&self) -> &ClientConfig {
        &self.config
    }

    pub fn cache(&self) -> &CacheStore {
        &self.cache
    }

    /// Requests waiting for a limiter slot.
    pub fn queued_len(&self) -> usize {
        self.limiter.queued_len()
    }

    /// Requests currently executing against the transport.
    pub fn in_flight(&self) -> usize {
        self.limiter.in_flight()
    }

    /// Run a query through the full pipeline with default cache behavior.
    ///
    /// # Errors
    ///
    /// Request validation failures surface before any network interaction;
    /// transport failures surface classified, with the last underlying error
    /// unchanged once retries are exhausted.
    pub async fn query(&self, request: QueryRequest) -> Result<RecordSet, ApiError> {
        self.query_with(request, CacheMode::Use, None).await
    }

    /// Run a query with explicit cache behavior and an optional per-call TTL.
    pub async fn query_with(
        &self,
        request: QueryRequest,
        cache_mode: CacheMode,
        ttl_override: Option<Duration>,
    ) -> Result<RecordSet, ApiError> {
        request.validate()?;
        let key = request.cache_key();

        if cache_mode == CacheMode::Use {
            if let Some(hit) = self.cache.get(&key).await {
                tracing::debug!(operation = request.operation(), "served from cache");
                return Ok(hit);
            }
        }

        let table = self
            .limiter
            .execute(self.retry.execute(|| {
                let transport = Arc::clone(&self.transport);
                let request = &request;
                async move { transport.send(request).await }
            }))
            .await?;

        let records = table.into_records();
        if cache_mode != CacheMode::Bypass {
            self.cache
                .set(key, records.clone(), ttl_override)
                .await;
        }
        Ok(records)
    }
}
