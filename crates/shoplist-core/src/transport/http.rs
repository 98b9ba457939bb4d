use std::time::Duration;

use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, Method, RequestBuilder, Url};
use serde_json::Value;

use crate::constants::UPDATE_METHOD;
use crate::transport::{Transport, TransportError};

const REQUEST_TIMEOUT: Duration = Duration::from_secs(30);

/// `Transport` over a shared reqwest client.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: Client,
}

impl HttpTransport {
    pub fn new() -> anyhow::Result<Self> {
        Self::with_timeout(REQUEST_TIMEOUT)
    }

    pub fn with_timeout(timeout: Duration) -> anyhow::Result<Self> {
        let client = Client::builder().timeout(timeout).build()?;
        Ok(Self { client })
    }

    fn request(&self, method: Method, url: &str) -> Result<RequestBuilder, TransportError> {
        let url = Url::parse(url).map_err(|e| TransportError::BadUrl(format!("{}: {}", url, e)))?;
        Ok(self.client.request(method, url))
    }

    async fn send(&self, request: RequestBuilder) -> Result<String, TransportError> {
        let response = request.send().await.map_err(classify)?;
        let status = response.status();
        if !status.is_success() {
            return Err(TransportError::BadStatus(status.as_u16()));
        }
        response.text().await.map_err(|e| TransportError::BadBody(e.to_string()))
    }
}

fn classify(error: reqwest::Error) -> TransportError {
    if error.is_timeout() {
        TransportError::Timeout
    } else if error.is_builder() {
        TransportError::BadUrl(error.to_string())
    } else {
        TransportError::NetworkError(error.to_string())
    }
}

impl Transport for HttpTransport {
    async fn post(&self, url: &str, body: Value) -> Result<String, TransportError> {
        tracing::debug!("POST {}", url);
        let request = self.request(Method::POST, url)?.json(&body);
        self.send(request).await
    }

    async fn delete(&self, url: &str) -> Result<String, TransportError> {
        tracing::debug!("DELETE {}", url);
        let request = self
            .request(Method::DELETE, url)?
            .header(CONTENT_TYPE, "application/json");
        self.send(request).await
    }

    async fn update(&self, url: &str, body: Value) -> Result<String, TransportError> {
        tracing::debug!("{} {}", UPDATE_METHOD, url);
        let method = Method::from_bytes(UPDATE_METHOD.as_bytes())
            .map_err(|e| TransportError::NetworkError(e.to_string()))?;
        let request = self.request(method, url)?.json(&body);
        self.send(request).await
    }
}
