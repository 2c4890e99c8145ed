//! OnCall API client.

use serde::de::DeserializeOwned;
use serde::Serialize;
use tracing::warn;

use crate::config::ClientConfig;
use crate::error::{OnCallError, Result};
use crate::pagination::Page;
use crate::resources::ListFilter;
use crate::transport::{ApiRequest, ApiResponse, HttpTransport, Method, Transport};

/// Query parameter carrying the page number.
const PAGE_PARAM: &str = "page";

/// Client for the OnCall public API.
///
/// Resource operations live in [`crate::resources`]; each one issues exactly
/// one request, except the list-all operations which walk pages in sequence.
#[derive(Debug, Clone)]
pub struct OnCallClient<T = HttpTransport> {
    transport: T,
}

impl OnCallClient<HttpTransport> {
    /// Create a client talking HTTP to the configured instance.
    ///
    /// # Errors
    ///
    /// Returns error if HTTP client cannot be created.
    pub fn new(config: &ClientConfig) -> Result<Self> {
        Ok(Self::with_transport(HttpTransport::new(config)?))
    }

    /// Create a client from `ONCALL_API_URL` / `ONCALL_API_TOKEN`.
    ///
    /// # Errors
    ///
    /// Returns an error if the environment is incomplete or invalid.
    pub fn from_env() -> Result<Self> {
        Self::new(&ClientConfig::from_env()?)
    }
}

impl<T: Transport> OnCallClient<T> {
    /// Create a client over a custom transport.
    pub fn with_transport(transport: T) -> Self {
        Self { transport }
    }

    /// The underlying transport.
    pub fn transport(&self) -> &T {
        &self.transport
    }

    /// Send a request and fail on non-2xx status.
    async fn execute(&self, request: ApiRequest) -> Result<ApiResponse> {
        let response = self.transport.send(request).await?;
        if response.is_success() {
            Ok(response)
        } else {
            Err(OnCallError::Api {
                status: response.status,
                reason: response.reason,
                body: String::from_utf8_lossy(&response.body).into_owned(),
            })
        }
    }

    /// Send a request and decode the JSON response.
    async fn fetch<R: DeserializeOwned>(&self, request: ApiRequest) -> Result<R> {
        let response = self.execute(request).await?;
        serde_json::from_slice(&response.body).map_err(|e| {
            warn!(
                error = %e,
                body = %String::from_utf8_lossy(&response.body),
                "Failed to parse response"
            );
            OnCallError::Decode(e)
        })
    }

    pub(crate) async fn get<R: DeserializeOwned>(&self, path: &[&str]) -> Result<R> {
        self.fetch(ApiRequest::new(Method::GET, path.iter().copied()))
            .await
    }

    pub(crate) async fn post<B, R>(&self, path: &[&str], body: &B) -> Result<R>
    where
        B: Serialize + ?Sized + Sync,
        R: DeserializeOwned,
    {
        let body = serde_json::to_vec(body).map_err(OnCallError::Encode)?;
        self.fetch(ApiRequest::new(Method::POST, path.iter().copied()).with_body(body))
            .await
    }

    pub(crate) async fn delete(&self, path: &[&str]) -> Result<()> {
        self.execute(ApiRequest::new(Method::DELETE, path.iter().copied()))
            .await
            .map(drop)
    }

    /// Fetch one page of a listing.
    ///
    /// `page` is zero-based; the API numbers pages from one and treats a
    /// missing parameter as the first page.
    pub(crate) async fn get_page<R, F>(&self, path: &str, page: u32, filter: &F) -> Result<Page<R>>
    where
        R: DeserializeOwned,
        F: ListFilter + ?Sized,
    {
        let mut query = filter.query();
        if page > 0 {
            query.push((PAGE_PARAM.to_string(), (page + 1).to_string()));
        }

        self.fetch(ApiRequest::new(Method::GET, [path]).with_query(query))
            .await
    }
}
