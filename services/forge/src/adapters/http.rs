//! services/forge/src/adapters/http.rs
//!
//! This module contains the HTTP adapter for provider calls.
//! It implements the `Transport` port from the `core` crate using `reqwest`.

use async_trait::async_trait;
use bytes::Bytes;
use cardforge_core::ports::{Endpoint, Transport, TransportError};
use reqwest::header::{HeaderMap, HeaderName, HeaderValue};
use reqwest::Client;
use std::time::Duration;
use tracing::{debug, error, instrument};

//=========================================================================================
// The Main Adapter Struct
//=========================================================================================

/// An adapter that implements the `Transport` port with a pooled `reqwest::Client`.
#[derive(Clone)]
pub struct ReqwestTransport {
    http: Client,
}

impl ReqwestTransport {
    /// Creates a new `ReqwestTransport` whose requests give up after `timeout`.
    pub fn new(timeout: Duration) -> Result<Self, reqwest::Error> {
        let http = Client::builder().timeout(timeout).build()?;
        Ok(Self { http })
    }

    /// Wraps an existing client, e.g. one shared with other components.
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    fn headers(endpoint: &Endpoint) -> Result<HeaderMap, TransportError> {
        let mut headers = HeaderMap::new();
        for (name, value) in &endpoint.headers {
            let name = HeaderName::from_bytes(name.as_bytes())
                .map_err(|e| TransportError::Network(format!("bad header name '{}': {}", name, e)))?;
            let value = HeaderValue::from_str(value)
                .map_err(|e| TransportError::Network(format!("bad header value for '{}': {}", name, e)))?;
            headers.insert(name, value);
        }
        Ok(headers)
    }
}

fn map_reqwest_error(err: reqwest::Error) -> TransportError {
    if err.is_timeout() {
        TransportError::Timeout
    } else {
        TransportError::Network(err.to_string())
    }
}

//=========================================================================================
// `Transport` Trait Implementation
//=========================================================================================

#[async_trait]
impl Transport for ReqwestTransport {
    #[instrument(skip(self, body), fields(url = %endpoint.url))]
    async fn send(&self, endpoint: &Endpoint, body: Bytes) -> Result<Bytes, TransportError> {
        let response = self
            .http
            .post(&endpoint.url)
            .headers(Self::headers(endpoint)?)
            .body(body)
            .send()
            .await
            .map_err(map_reqwest_error)?;

        let status = response.status();
        debug!("Response status: {}", status);

        let body = response.bytes().await.map_err(map_reqwest_error)?;
        if !status.is_success() {
            error!("Provider request failed with {}", status);
            return Err(TransportError::Status {
                status: status.as_u16(),
                body: String::from_utf8_lossy(&body).into_owned(),
            });
        }
        Ok(body)
    }
}
