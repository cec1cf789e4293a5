//! # Quantrail Core
//!
//! Resilient request pipeline for a rate-limited, pagination-free remote
//! financial-data query API.
//!
//! ## Overview
//!
//! This crate provides the foundational components of the quantrail client:
//!
//! - **Configuration and request validation** with closed-range bounds
//! - **Columnar-to-record response transform** preserving field order
//! - **Time- and capacity-bounded cache** with LRU eviction
//! - **Concurrency limiter** that also paces dispatch spacing
//! - **Retry policy** with exponential backoff, jitter, and server wait hints
//! - **Sliding-window rate limiter** for admission accounting at a second
//!   boundary
//!
//! ## Modules
//!
//! | Module | Description |
//! |--------|-------------|
//! | [`cache`] | Response cache with TTL expiry and LRU eviction |
//! | [`client`] | The assembled query pipeline |
//! | [`config`] | Client configuration and bounds validation |
//! | [`error`] | Error taxonomy and validation errors |
//! | [`limiter`] | Paced FIFO concurrency limiter |
//! | [`params`] | Query requests, scalars, canonical cache keys |
//! | [`ratelimit`] | Sliding-window admission accounting |
//! | [`retry`] | Backoff computation and the attempt loop |
//! | [`transform`] | Columnar-to-record transform |
//! | [`transport`] | Transport trait, HTTP and no-op implementations |
//!
//! ## Quick Start
//!
//! ```rust,ignore
//! use quantrail_core::{ClientConfig, QueryClient, QueryRequest};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let config = ClientConfig::new(std::env::var("QUANTRAIL_TOKEN")?);
//!     let client = QueryClient::over_http(config, "https://api.example.com/v1")?;
//!
//!     let records = client
//!         .query(QueryRequest::new("market.quote").with_param("symbol", "AAPL"))
//!         .await?;
//!
//!     for record in records.iter() {
//!         println!("{:?}", record.get("price"));
//!     }
//!     Ok(())
//! }
//! ```
//!
//! ## Pipeline
//!
//! ```text
//! ┌───────────┐   ┌───────┐   ┌──────────┐   ┌───────┐   ┌───────────┐
//! │ Validator │──▶│ Cache │──▶│ Limiter  │──▶│ Retry │──▶│ Transport │
//! └───────────┘   └───┬───┘   └──────────┘   └───────┘   └─────┬─────┘
//!                     │ hit short-circuits                     │
//!                     ▲                 ┌───────────┐          │
//!                     └─────────────────│ Transform │◀─────────┘
//!                                       └───────────┘
//! ```
//!
//! The sliding-window rate limiter is not part of this chain; it guards an
//! independent admission boundary and only shares the time-window accounting
//! idiom.
//!
//! ## Error Handling
//!
//! All transport failures carry a classification from the taxonomy:
//!
//! ```rust
//! use quantrail_core::{ApiError, ErrorKind};
//!
//! fn handle_error(error: ApiError) {
//!     match error.kind() {
//!         ErrorKind::RateLimit => {
//!             // Wait and retry, honoring error.retry_after()
//!         }
//!         ErrorKind::Auth => {
//!             // Fatal: fix credentials
//!         }
//!         _ => {}
//!     }
//! }
//! ```

pub mod cache;
pub mod client;
pub mod config;
pub mod error;
pub mod limiter;
pub mod params;
pub mod ratelimit;
pub mod retry;
pub mod transform;
pub mod transport;

// Re-export commonly used types at crate root for convenience

pub use cache::{CacheMode, CacheStore};
pub use client::QueryClient;
pub use config::{
    CacheConfig, ClientConfig, ConcurrencyConfig, RetryConfig, MAX_CONCURRENT_LIMIT,
    MAX_RETRIES_LIMIT, MAX_TIMEOUT, MIN_TIMEOUT,
};
pub use error::{ApiError, ErrorKind, ValidationError};
pub use limiter::RequestLimiter;
pub use params::{QueryRequest, Scalar};
pub use ratelimit::SlidingWindowLimiter;
pub use retry::RetryPolicy;
pub use transform::{ColumnarTable, Record, RecordSet};
pub use transport::{HttpTransport, NoopTransport, Transport};
