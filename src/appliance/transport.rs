//! reqwest-backed transport
//!
//! Sends one request per call; connection pooling and TLS are left to
//! reqwest. HTTP error statuses come back as ordinary responses, only
//! failures to complete the exchange become [`TransportError`]s.

use crate::domain::ports::{
    ApplianceRequest, ApplianceResponse, HttpMethod, Transport, TransportError,
};
use crate::error::{Error, Result};
use async_trait::async_trait;
use reqwest::Method;
use std::error::Error as StdError;
use tracing::debug;

/// Production [`Transport`] built on a shared `reqwest::Client`
#[derive(Debug, Clone)]
pub struct ReqwestTransport {
    client: reqwest::Client,
}

impl ReqwestTransport {
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .build()
            .map_err(|e| Error::Internal(format!("Failed to build HTTP client: {}", e)))?;
        Ok(Self { client })
    }

    pub fn with_client(client: reqwest::Client) -> Self {
        Self { client }
    }
}

#[async_trait]
impl Transport for ReqwestTransport {
    async fn send(
        &self,
        request: ApplianceRequest,
    ) -> std::result::Result<ApplianceResponse, TransportError> {
        let method = match request.method {
            HttpMethod::Get => Method::GET,
            HttpMethod::Post => Method::POST,
            HttpMethod::Put => Method::PUT,
            HttpMethod::Delete => Method::DELETE,
        };

        let mut builder = self.client.request(method, &request.url);
        for (name, value) in &request.headers {
            builder = builder.header(name.as_str(), value.as_str());
        }
        if let Some(body) = request.body {
            builder = builder.body(body);
        }

        let response = builder.send().await.map_err(classify_error)?;
        let status = response.status();
        let body = response.text().await.map_err(classify_error)?;

        debug!("{} {} -> {}", request.method, request.url, status);

        Ok(ApplianceResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().map(str::to_string),
            body,
        })
    }
}

/// Connect and timeout failures are classified; everything else is not
fn classify_error(err: reqwest::Error) -> TransportError {
    if err.is_connect() || err.is_timeout() {
        let (errno, reason) = io_cause(&err);
        TransportError::Connection { errno, reason }
    } else {
        TransportError::Unclassified(err.to_string())
    }
}

/// OS error number and message of the innermost I/O error, if any
fn io_cause(err: &reqwest::Error) -> (Option<i32>, String) {
    let mut source: Option<&(dyn StdError + 'static)> = err.source();
    let mut reason = err.to_string();

    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            return (io.raw_os_error(), io.to_string());
        }
        reason = cause.to_string();
        source = cause.source();
    }

    (None, reason)
}
