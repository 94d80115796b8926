//! HTTP transport to the Machines API.
//!
//! [`MachinesTransport`] is the seam between typed API calls and the wire.
//! [`HttpTransport`] is the production implementation on top of reqwest;
//! tests substitute a scripted transport.

use crate::config::MachinesConfig;
use crate::error::{MachinesError, Result, TransportErrorKind};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue, AUTHORIZATION};
use std::error::Error as _;
use std::fmt;

/// HTTP verbs used by the Machines API.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Method {
    /// GET
    Get,
    /// POST
    Post,
    /// DELETE
    Delete,
}

impl fmt::Display for Method {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Get => write!(f, "GET"),
            Self::Post => write!(f, "POST"),
            Self::Delete => write!(f, "DELETE"),
        }
    }
}

/// One request, relative to the API base URL.
#[derive(Debug, Clone, PartialEq)]
pub struct ApiRequest {
    /// HTTP verb
    pub method: Method,
    /// Path beginning with `/`
    pub path: String,
    /// Query string pairs
    pub query: Vec<(String, String)>,
    /// JSON body, if any
    pub body: Option<serde_json::Value>,
}

impl ApiRequest {
    /// Build a request without query or body.
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Append a query pair.
    pub fn query(mut self, key: impl Into<String>, value: impl Into<String>) -> Self {
        self.query.push((key.into(), value.into()));
        self
    }

    /// Attach a JSON body.
    pub fn json(mut self, body: serde_json::Value) -> Self {
        self.body = Some(body);
        self
    }
}

/// Raw response: status plus body text.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code
    pub status: u16,
    /// Body text (may be empty)
    pub body: String,
}

impl ApiResponse {
    /// Whether the status is 2xx.
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Sends requests to the Machines API.
///
/// Implementations return `Ok` for every response that arrives, whatever
/// its status, and `Err(MachinesError::Transport)` when none does.
#[async_trait]
pub trait MachinesTransport: Send + Sync {
    /// Send one request and wait for its response.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// reqwest-backed transport with bearer auth and a fixed timeout.
#[derive(Debug, Clone)]
pub struct HttpTransport {
    client: reqwest::Client,
    base_url: String,
}

impl HttpTransport {
    /// Build a transport from validated configuration.
    pub fn new(config: &MachinesConfig) -> Result<Self> {
        config.validate()?;

        let mut auth = HeaderValue::from_str(&format!("Bearer {}", config.api_token))
            .map_err(|_| MachinesError::Config("api_token is not a valid header value".into()))?;
        auth.set_sensitive(true);

        let mut headers = HeaderMap::new();
        headers.insert(AUTHORIZATION, auth);

        let client = reqwest::Client::builder()
            .default_headers(headers)
            .timeout(config.request_timeout)
            .build()
            .map_err(|e| MachinesError::Config(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            base_url: config.api_base_url.trim_end_matches('/').to_string(),
        })
    }

    fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }
}

#[async_trait]
impl MachinesTransport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.url(&request.path);
        tracing::debug!(method = %request.method, url = %url, "Sending Machines API request");

        let mut builder = match request.method {
            Method::Get => self.client.get(&url),
            Method::Post => self.client.post(&url),
            Method::Delete => self.client.delete(&url),
        };
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = &request.body {
            tracing::trace!(body = %body, "Request body");
            builder = builder.json(body);
        }

        let response = builder.send().await.map_err(transport_error)?;
        let status = response.status().as_u16();
        let body = response.text().await.map_err(transport_error)?;

        tracing::debug!(method = %request.method, url = %url, status, "Machines API response");
        tracing::trace!(body = %body, "Response body");

        Ok(ApiResponse { status, body })
    }
}

fn transport_error(err: reqwest::Error) -> MachinesError {
    MachinesError::Transport {
        kind: classify(&err),
        message: err.to_string(),
    }
}

/// Map a reqwest failure onto the retry taxonomy.
fn classify(err: &reqwest::Error) -> TransportErrorKind {
    if err.is_timeout() {
        return TransportErrorKind::TimedOut;
    }
    if err.is_connect() {
        return TransportErrorKind::Aborted;
    }

    let mut source = err.source();
    while let Some(cause) = source {
        if let Some(io) = cause.downcast_ref::<std::io::Error>() {
            match io.kind() {
                std::io::ErrorKind::TimedOut => return TransportErrorKind::TimedOut,
                std::io::ErrorKind::ConnectionAborted
                | std::io::ErrorKind::ConnectionReset
                | std::io::ErrorKind::BrokenPipe
                | std::io::ErrorKind::UnexpectedEof => return TransportErrorKind::Aborted,
                _ => {}
            }
        }
        source = cause.source();
    }

    TransportErrorKind::Other
}
