//! Request dispatch: bearer attachment and response decoding

use super::error::ClientError;
use super::token_store::{TokenKind, TokenStore};
use reqwest::header::{self, HeaderMap, HeaderName, HeaderValue};
use reqwest::{Method, Response};
use serde::Serialize;
use serde::de::DeserializeOwned;
use serde_json::Value;
use std::sync::Arc;
use studio_core::MessageResponse;
use tracing::trace;

/// An outbound API call, kept as plain data so it can be replayed after a refresh
#[derive(Debug, Clone)]
pub struct ApiRequest {
    method: Method,
    path: String,
    body: Option<Value>,
    headers: HeaderMap,
    refreshable: bool,
}

impl ApiRequest {
    #[must_use]
    pub fn new(method: Method, path: impl Into<String>) -> Self {
        Self {
            method,
            path: path.into(),
            body: None,
            headers: HeaderMap::new(),
            refreshable: true,
        }
    }

    #[must_use]
    pub fn get(path: impl Into<String>) -> Self {
        Self::new(Method::GET, path)
    }

    #[must_use]
    pub fn post(path: impl Into<String>) -> Self {
        Self::new(Method::POST, path)
    }

    #[must_use]
    pub fn put(path: impl Into<String>) -> Self {
        Self::new(Method::PUT, path)
    }

    #[must_use]
    pub fn delete(path: impl Into<String>) -> Self {
        Self::new(Method::DELETE, path)
    }

    /// Attach a JSON body
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Serialization`] if `body` cannot be turned into JSON.
    pub fn json<T: Serialize + ?Sized>(mut self, body: &T) -> Result<Self, ClientError> {
        self.body = Some(serde_json::to_value(body)?);
        Ok(self)
    }

    /// Add a header sent with every attempt of this request
    #[must_use]
    pub fn header(mut self, name: HeaderName, value: HeaderValue) -> Self {
        self.headers.insert(name, value);
        self
    }

    /// Never run the refresh path for this request.
    ///
    /// Used for sign-in and sign-up, where a 401 means bad credentials rather
    /// than an expired session.
    #[must_use]
    pub fn without_refresh(mut self) -> Self {
        self.refreshable = false;
        self
    }

    #[must_use]
    pub fn method(&self) -> &Method {
        &self.method
    }

    #[must_use]
    pub fn path(&self) -> &str {
        &self.path
    }

    #[must_use]
    pub fn body(&self) -> Option<&Value> {
        self.body.as_ref()
    }

    #[must_use]
    pub fn is_refreshable(&self) -> bool {
        self.refreshable
    }
}

/// One attempt at sending a request.
///
/// The first attempt reads the bearer token from the store; the retry after a
/// refresh carries the refreshed token explicitly.
#[derive(Debug, Clone)]
pub struct Attempt {
    number: u8,
    request: ApiRequest,
    bearer: Option<String>,
}

impl Attempt {
    #[must_use]
    pub fn first(request: ApiRequest) -> Self {
        Self {
            number: 0,
            request,
            bearer: None,
        }
    }

    /// The single retry, sent with a freshly issued access token
    #[must_use]
    pub fn retry(self, token: String) -> Self {
        Self {
            number: self.number + 1,
            request: self.request,
            bearer: Some(token),
        }
    }

    #[must_use]
    pub fn number(&self) -> u8 {
        self.number
    }

    #[must_use]
    pub fn request(&self) -> &ApiRequest {
        &self.request
    }

    /// A 401 on this attempt may start (or join) a token refresh
    #[must_use]
    pub fn may_refresh(&self) -> bool {
        self.request.is_refreshable() && self.number == 0
    }
}

/// Response together with the bearer token it was sent with
pub struct Dispatched {
    pub response: Response,
    pub token: Option<String>,
}

/// Sends attempts against the configured base URL
#[derive(Clone)]
pub struct Dispatcher {
    http: reqwest::Client,
    base_url: String,
    tokens: Arc<dyn TokenStore>,
}

impl Dispatcher {
    #[must_use]
    pub fn new(http: reqwest::Client, base_url: String, tokens: Arc<dyn TokenStore>) -> Self {
        Self {
            http,
            base_url,
            tokens,
        }
    }

    #[must_use]
    pub fn base_url(&self) -> &str {
        &self.base_url
    }

    #[must_use]
    pub fn url(&self, path: &str) -> String {
        format!("{}{}", self.base_url, path)
    }

    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        &self.tokens
    }

    /// Send an attempt. A missing token is not an error here: sign-in and
    /// sign-up are sent unauthenticated.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Request`] when the request never gets a response.
    pub async fn send(&self, attempt: &Attempt) -> Result<Dispatched, ClientError> {
        let request = &attempt.request;
        let token = attempt
            .bearer
            .clone()
            .or_else(|| self.tokens.get(TokenKind::Access));

        let mut builder = self
            .http
            .request(request.method.clone(), self.url(&request.path))
            .headers(request.headers.clone());

        if let Some(token) = &token {
            builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
        }
        if let Some(body) = &request.body {
            builder = builder.json(body);
        }

        trace!(
            method = %request.method,
            path = %request.path,
            attempt = attempt.number,
            authenticated = token.is_some(),
            "Dispatching request"
        );

        let response = builder.send().await?;
        Ok(Dispatched { response, token })
    }
}

/// Pass a successful response through, or turn an error status into a
/// [`ClientError`] carrying the backend's message
///
/// # Errors
///
/// Maps any non-2xx status through [`ClientError::from_status`].
pub async fn ensure_success(response: Response) -> Result<Response, ClientError> {
    let status = response.status();
    if status.is_success() {
        return Ok(response);
    }
    let text = response.text().await.unwrap_or_default();
    Err(ClientError::from_status(status, error_message(status, &text)))
}

/// Decode a successful JSON body.
///
/// An empty body decodes as JSON `null`, so optional results read as `None`.
///
/// # Errors
///
/// Fails like [`ensure_success`], or with [`ClientError::Request`] when the
/// body does not match `T`.
pub async fn decode<T: DeserializeOwned>(response: Response) -> Result<T, ClientError> {
    let bytes = ensure_success(response).await?.bytes().await?;
    if bytes.iter().all(u8::is_ascii_whitespace) {
        Ok(serde_json::from_value(Value::Null)?)
    } else {
        Ok(serde_json::from_slice(&bytes)?)
    }
}

/// Backend `{ "message": ... }` when present, else the raw body, else the status text
pub(crate) fn error_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(MessageResponse { message }) = serde_json::from_str(body) {
        return message;
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .map_or_else(|| status.to_string(), str::to_string)
    } else {
        body.to_string()
    }
}
