//! HTTP client implementation using reqwest

use crate::config::{ConnectionConfig, SecretString};
use crate::http::{
    BufferedResponse, HttpTransport, RequestOptions, StreamingResponse, TransportError,
};
use async_trait::async_trait;
use futures::StreamExt;
use reqwest::header::CONTENT_TYPE;
use reqwest::{Client, ClientBuilder, RequestBuilder, Response};
use serde_json::Value;
use std::sync::Arc;
use std::time::Duration;
use tracing::{debug, error, warn};

/// Default user agent
const USER_AGENT: &str = concat!("ondemand-core/", env!("CARGO_PKG_VERSION"));

/// Header carrying the API key
const API_KEY_HEADER: &str = "apikey";

/// Shared HTTP client with connection pooling
#[derive(Clone)]
pub struct HttpClient {
    /// The underlying reqwest client
    client: Arc<Client>,
}

impl HttpClient {
    /// Create a new HTTP client with default settings
    pub fn new() -> Result<Self, TransportError> {
        Self::with_config(&ConnectionConfig::default())
    }

    /// Create a new HTTP client from connection settings
    ///
    /// No overall request timeout is applied unless one is configured: a
    /// streamed answer may legitimately take minutes.
    pub fn with_config(config: &ConnectionConfig) -> Result<Self, TransportError> {
        let mut builder = ClientBuilder::new()
            .pool_max_idle_per_host(config.max_idle_per_host)
            .pool_idle_timeout(Duration::from_secs(90))
            .connect_timeout(Duration::from_millis(config.connect_timeout_ms))
            .user_agent(USER_AGENT)
            .gzip(true);

        if let Some(timeout_ms) = config.request_timeout_ms {
            builder = builder.timeout(Duration::from_millis(timeout_ms));
        }

        let client = builder
            .build()
            .map_err(|e| TransportError::Build(e.to_string()))?;

        Ok(Self {
            client: Arc::new(client),
        })
    }

    fn build_request(
        &self,
        url: &str,
        api_key: &SecretString,
        body: &Value,
        options: &RequestOptions,
    ) -> RequestBuilder {
        debug!("POST {} [request_id: {}]", url, options.request_id);
        self.client
            .post(url)
            .header(API_KEY_HEADER, api_key.expose_secret())
            .header(CONTENT_TYPE, "application/json")
            .json(body)
    }

    async fn send(
        &self,
        url: &str,
        api_key: &SecretString,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<Response, TransportError> {
        let request_id = options.request_id;

        let response = self
            .build_request(url, api_key, body, options)
            .send()
            .await
            .map_err(|e| {
                let mapped = TransportError::from(e);
                match &mapped {
                    TransportError::Timeout => {
                        warn!("Request timeout for {} [request_id: {}]", url, request_id)
                    }
                    other => error!(
                        "Request error for {} [request_id: {}]: {}",
                        url, request_id, other
                    ),
                }
                mapped
            })?;

        debug!(
            "Response status: {} [request_id: {}]",
            response.status(),
            request_id
        );
        Ok(response)
    }
}

#[async_trait]
impl HttpTransport for HttpClient {
    async fn post_json(
        &self,
        url: &str,
        api_key: &SecretString,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<BufferedResponse, TransportError> {
        let response = self.send(url, api_key, body, options).await?;
        let status = response.status().as_u16();

        let body = response.text().await.map_err(|e| {
            error!(
                "Failed to read response body [request_id: {}]: {}",
                options.request_id, e
            );
            TransportError::Body(e.to_string())
        })?;

        Ok(BufferedResponse { status, body })
    }

    async fn post_streaming(
        &self,
        url: &str,
        api_key: &SecretString,
        body: &Value,
        options: &RequestOptions,
    ) -> Result<StreamingResponse, TransportError> {
        let response = self.send(url, api_key, body, options).await?;
        let status = response.status().as_u16();

        let body = response
            .bytes_stream()
            .map(|chunk| chunk.map_err(|e| TransportError::Body(e.to_string())))
            .boxed();

        Ok(StreamingResponse::new(status, body))
    }
}
