//! Gateway client implementation
//!
//! One [`ApiClient`] is shared by every service wrapper. It owns the
//! `reqwest::Client` (and therefore the connection pool), the gateway base URL
//! and, optionally, the bearer token of the signed-in user.

use crate::error::ApiError;
use ourbusway_core::session::Session;
use reqwest::header::{CONTENT_TYPE, HeaderMap, HeaderValue};
use reqwest::{Client, Method, RequestBuilder, Response, StatusCode};
use serde::Serialize;
use serde::de::DeserializeOwned;
use std::time::Duration;

/// Default gateway URL
pub const DEFAULT_BASE_URL: &str = "http://localhost:8080";

/// Default request timeout
pub const DEFAULT_TIMEOUT: Duration = Duration::from_secs(30);

/// Gateway connection settings
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApiConfig {
    /// Gateway base URL, without trailing slash
    pub base_url: String,
    /// Per-request timeout
    pub timeout: Duration,
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: DEFAULT_BASE_URL.to_string(),
            timeout: DEFAULT_TIMEOUT,
        }
    }
}

impl ApiConfig {
    /// Config for `base_url` with the default timeout
    #[must_use]
    pub fn new(base_url: impl Into<String>) -> Self {
        Self {
            base_url: base_url.into(),
            ..Self::default()
        }
    }

    /// Override the request timeout
    #[must_use]
    pub const fn with_timeout(mut self, timeout: Duration) -> Self {
        self.timeout = timeout;
        self
    }
}

/// Pagination parameters accepted by list endpoints
#[derive(Debug, Clone, Copy, Serialize)]
pub(crate) struct PageQuery {
    pub page: u32,
    pub size: u32,
}

/// OurBusWay gateway client
#[derive(Clone)]
pub struct ApiClient {
    http: Client,
    base_url: String,
    token: Option<String>,
}

impl ApiClient {
    /// Create a client without a session
    ///
    /// # Errors
    ///
    /// Returns [`ApiError::InvalidConfig`] if the HTTP client cannot be built.
    pub fn new(config: &ApiConfig) -> Result<Self, ApiError> {
        let mut headers = HeaderMap::new();
        headers.insert(CONTENT_TYPE, HeaderValue::from_static("application/json"));

        let http = Client::builder()
            .timeout(config.timeout)
            .default_headers(headers)
            .build()
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;

        Ok(Self {
            http,
            base_url: config.base_url.trim_end_matches('/').to_string(),
            token: None,
        })
    }

    /// Same client, authenticated as `session`
    #[must_use]
    pub fn with_session(&self, session: &Session) -> Self {
        self.with_token(session.token())
    }

    /// Same client, sending `token` as bearer credentials
    #[must_use]
    pub fn with_token(&self, token: impl Into<String>) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: Some(token.into()),
        }
    }

    /// Same client, without credentials
    #[must_use]
    pub fn without_session(&self) -> Self {
        Self {
            http: self.http.clone(),
            base_url: self.base_url.clone(),
            token: None,
        }
    }

    /// Gateway base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    /// Whether requests carry a bearer token
    #[must_use]
    pub const fn is_authenticated(&self) -> bool {
        self.token.is_some()
    }

    fn request(&self, method: Method, path: &str) -> RequestBuilder {
        let builder = self.http.request(method, format!("{}{path}", self.base_url));
        match &self.token {
            Some(token) => builder.bearer_auth(token),
            None => builder,
        }
    }

    fn with_query<Q: Serialize>(path: &str, query: &Q) -> Result<String, ApiError> {
        let encoded = serde_urlencoded::to_string(query)
            .map_err(|e| ApiError::InvalidConfig(e.to_string()))?;
        if encoded.is_empty() {
            Ok(path.to_string())
        } else {
            Ok(format!("{path}?{encoded}"))
        }
    }

    /// Send and turn non-success statuses into [`ApiError`]s.
    async fn execute(&self, builder: RequestBuilder) -> Result<Response, ApiError> {
        let response = builder
            .send()
            .await
            .map_err(|e| ApiError::RequestFailed(e.to_string()))?;

        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let body = response.text().await.unwrap_or_default();
        let message = error_message(&body);
        match status {
            StatusCode::UNAUTHORIZED => {
                tracing::info!("Gateway rejected the session token");
                Err(ApiError::Unauthorized)
            },
            StatusCode::FORBIDDEN => {
                tracing::warn!("Access denied: insufficient permissions");
                Err(ApiError::Forbidden { message })
            },
            status => {
                tracing::debug!(status = status.as_u16(), message = ?message, "Gateway returned an error");
                Err(ApiError::Status {
                    status: status.as_u16(),
                    message,
                })
            },
        }
    }

    async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ApiError> {
        response
            .json::<T>()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
    }

    pub(crate) async fn get_json<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        Self::decode(response).await
    }

    pub(crate) async fn get_json_query<T, Q>(&self, path: &str, query: &Q) -> Result<T, ApiError>
    where
        T: DeserializeOwned,
        Q: Serialize,
    {
        let path = Self::with_query(path, query)?;
        self.get_json(&path).await
    }

    pub(crate) async fn get_text_query<Q: Serialize>(
        &self,
        path: &str,
        query: &Q,
    ) -> Result<String, ApiError> {
        let path = Self::with_query(path, query)?;
        let response = self.execute(self.request(Method::GET, &path)).await?;
        response
            .text()
            .await
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
    }

    pub(crate) async fn get_bytes(&self, path: &str) -> Result<Vec<u8>, ApiError> {
        let response = self.execute(self.request(Method::GET, path)).await?;
        response
            .bytes()
            .await
            .map(|bytes| bytes.to_vec())
            .map_err(|e| ApiError::ResponseParseFailed(e.to_string()))
    }

    pub(crate) async fn send_json<B, T>(
        &self,
        method: Method,
        path: &str,
        body: &B,
    ) -> Result<T, ApiError>
    where
        B: Serialize + ?Sized,
        T: DeserializeOwned,
    {
        let response = self.execute(self.request(method, path).json(body)).await?;
        Self::decode(response).await
    }

    /// Send a JSON body; the response body is irrelevant.
    pub(crate) async fn send_unit<B>(&self, method: Method, path: &str, body: &B) -> Result<(), ApiError>
    where
        B: Serialize + ?Sized,
    {
        self.execute(self.request(method, path).json(body))
            .await
            .map(drop)
    }

    /// Send a request without body; the response body is irrelevant.
    pub(crate) async fn send_empty(&self, method: Method, path: &str) -> Result<(), ApiError> {
        self.execute(self.request(method, path)).await.map(drop)
    }

    /// Send a request without body and decode the JSON answer.
    pub(crate) async fn post_empty<T: DeserializeOwned>(&self, path: &str) -> Result<T, ApiError> {
        let response = self.execute(self.request(Method::POST, path)).await?;
        Self::decode(response).await
    }
}

impl std::fmt::Debug for ApiClient {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("ApiClient")
            .field("base_url", &self.base_url)
            .field("authenticated", &self.token.is_some())
            .finish_non_exhaustive()
    }
}

/// Extract a readable message from an error body.
///
/// JSON bodies contribute their `message` field; plain-text bodies are used
/// as is. Empty bodies and JSON without a message yield `None`.
pub(crate) fn error_message(body: &str) -> Option<String> {
    let trimmed = body.trim();
    if trimmed.is_empty() {
        return None;
    }
    match serde_json::from_str::<serde_json::Value>(trimmed) {
        Ok(serde_json::Value::Object(map)) => map
            .get("message")
            .and_then(serde_json::Value::as_str)
            .filter(|m| !m.is_empty())
            .map(ToString::to_string),
        Ok(serde_json::Value::String(text)) => Some(text).filter(|t| !t.is_empty()),
        Ok(_) => None,
        Err(_) => Some(trimmed.to_string()),
    }
}
