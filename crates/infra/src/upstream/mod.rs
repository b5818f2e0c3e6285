//! Upstream HTTP access: a pluggable transport and the rate-limited,
//! retrying client every upstream call goes through.

pub mod client;
pub mod error;
pub mod transport;

pub use client::{ClientConfig, ClientStats, RateLimitedClient, RetryPolicy};
pub use error::UpstreamError;
pub use transport::{HttpTransport, ReqwestTransport, TransportError, UpstreamResponse};
