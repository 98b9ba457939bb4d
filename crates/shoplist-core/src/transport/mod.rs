//! HTTP collaborators: the `Transport` seam, URL layout and wire bodies.

pub mod endpoints;
pub mod http;
pub mod requests;
pub mod responses;

use std::future::Future;

use serde_json::Value;

pub use endpoints::Endpoints;
pub use http::HttpTransport;
pub use responses::{PostResponse, UpdateResponse};

/// Failure of a single HTTP exchange.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum TransportError {
    #[error("Bad URL: {0}")]
    BadUrl(String),

    #[error("Request timed out")]
    Timeout,

    #[error("Network error: {0}")]
    NetworkError(String),

    #[error("Bad status: {0}")]
    BadStatus(u16),

    #[error("Bad body: {0}")]
    BadBody(String),
}

/// Asynchronous HTTP client used by the runtime. Every call yields the raw
/// response body; decoding happens in the caller.
pub trait Transport: Send + Sync + 'static {
    fn post(
        &self,
        url: &str,
        body: Value,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;

    fn delete(&self, url: &str) -> impl Future<Output = Result<String, TransportError>> + Send;

    fn update(
        &self,
        url: &str,
        body: Value,
    ) -> impl Future<Output = Result<String, TransportError>> + Send;
}
