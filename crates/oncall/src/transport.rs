//! HTTP transport underneath [`crate::OnCallClient`].
//!
//! A [`Transport`] performs one request and hands back the status and the
//! fully read body. It only fails for transport-level problems; mapping
//! status codes and decoding bodies is the client's job.

use async_trait::async_trait;
use reqwest::header::{AUTHORIZATION, CONTENT_TYPE};
use reqwest::{redirect, Client};
use tracing::{debug, trace};
use url::Url;

pub use reqwest::Method;

use crate::config::ClientConfig;
use crate::error::{OnCallError, Result};

/// Path segments every endpoint lives under.
const API_PREFIX: [&str; 2] = ["api", "v1"];

/// A request relative to the API root.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiRequest {
    /// HTTP method.
    pub method: Method,
    /// Unescaped path segments below `api/v1`.
    pub path: Vec<String>,
    /// Query parameters.
    pub query: Vec<(String, String)>,
    /// JSON body.
    pub body: Option<Vec<u8>>,
}

impl ApiRequest {
    /// Create a request with no query and no body.
    pub fn new<I, S>(method: Method, path: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        Self {
            method,
            path: path.into_iter().map(Into::into).collect(),
            query: Vec::new(),
            body: None,
        }
    }

    /// Attach query parameters.
    #[must_use]
    pub fn with_query(mut self, query: Vec<(String, String)>) -> Self {
        self.query = query;
        self
    }

    /// Attach a JSON body.
    #[must_use]
    pub fn with_body(mut self, body: Vec<u8>) -> Self {
        self.body = Some(body);
        self
    }
}

/// A drained response.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiResponse {
    /// HTTP status code.
    pub status: u16,
    /// Canonical reason phrase for the status, empty if unknown.
    pub reason: String,
    /// Response body.
    pub body: Vec<u8>,
}

impl ApiResponse {
    /// Whether the status is 2xx.
    #[must_use]
    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Performs a single HTTP exchange.
#[async_trait]
pub trait Transport: Send + Sync {
    /// Send the request and read the whole response body.
    ///
    /// # Errors
    ///
    /// Returns an error only when no complete response was received.
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse>;
}

/// [`Transport`] backed by `reqwest`.
#[derive(Clone)]
pub struct HttpTransport {
    client: Client,
    base_url: Url,
    auth_token: String,
}

impl HttpTransport {
    /// Build a transport from a configuration.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        let client = Client::builder()
            .timeout(config.timeout)
            .redirect(redirect::Policy::limited(config.max_redirects))
            .user_agent(concat!("oncall/", env!("CARGO_PKG_VERSION")))
            .build()?;

        Ok(Self {
            client,
            base_url: config.base_url.clone(),
            auth_token: config.auth_token.clone(),
        })
    }

    /// Full URL for a path below `api/v1`. Segments are percent-escaped.
    ///
    /// # Errors
    ///
    /// Returns an error if the base URL cannot carry a path, or if a segment
    /// is empty, `.` or `..`, which would address a different resource.
    pub fn endpoint(&self, path: &[String]) -> Result<Url> {
        if let Some(segment) = path
            .iter()
            .find(|segment| matches!(segment.as_str(), "" | "." | ".."))
        {
            return Err(OnCallError::Config(format!(
                "invalid path segment {segment:?} in /{}",
                path.join("/")
            )));
        }

        let mut url = self.base_url.clone();
        url.path_segments_mut()
            .map_err(|()| {
                OnCallError::Config(format!("{} cannot be used as a base URL", self.base_url))
            })?
            .pop_if_empty()
            .extend(API_PREFIX)
            .extend(path);
        Ok(url)
    }
}

#[async_trait]
impl Transport for HttpTransport {
    async fn send(&self, request: ApiRequest) -> Result<ApiResponse> {
        let url = self.endpoint(&request.path)?;
        debug!(method = %request.method, url = %url, "Sending request");

        let mut builder = self
            .client
            .request(request.method, url)
            .header(AUTHORIZATION, &self.auth_token);
        if !request.query.is_empty() {
            builder = builder.query(&request.query);
        }
        if let Some(body) = request.body {
            builder = builder.header(CONTENT_TYPE, "application/json").body(body);
        }

        let response = builder.send().await?;
        let status = response.status();
        let body = response.bytes().await?;
        trace!(
            status = status.as_u16(),
            body = %String::from_utf8_lossy(&body),
            "Received response"
        );

        Ok(ApiResponse {
            status: status.as_u16(),
            reason: status.canonical_reason().unwrap_or_default().to_string(),
            body: body.to_vec(),
        })
    }
}

impl std::fmt::Debug for HttpTransport {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("HttpTransport")
            .field("base_url", &self.base_url.as_str())
            .finish_non_exhaustive()
    }
}
