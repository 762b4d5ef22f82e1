//! Studio booking API client

pub mod appointments;
pub mod auth;
pub mod config;
pub mod dispatcher;
pub mod error;
pub mod refresh;
pub mod services;
pub mod session;
pub mod token_store;
pub mod users;

pub use config::ClientConfig;
pub use dispatcher::{ApiRequest, Attempt};
pub use error::{ClientError, RefreshError};
pub use refresh::{LoginRedirect, NoopRedirect};
pub use session::Session;
pub use token_store::{FileTokenStore, MemoryTokenStore, TokenKind, TokenStore, TokenTtl};

use dispatcher::{Dispatched, Dispatcher, decode, ensure_success};
use refresh::RefreshCoordinator;
use reqwest::{ClientBuilder, StatusCode, header};
use serde::de::DeserializeOwned;
use std::sync::Arc;
use std::time::Duration;
use tracing::debug;

const DEFAULT_USER_AGENT: &str = concat!("studio-client/", env!("CARGO_PKG_VERSION"));

/// Studio API client.
///
/// Every call goes through the dispatcher; a 401 on a first attempt is handed
/// to the refresh coordinator and the request is replayed once with the
/// refreshed token.
#[derive(Clone)]
pub struct StudioClient {
    dispatcher: Dispatcher,
    coordinator: Arc<RefreshCoordinator>,
}

impl StudioClient {
    /// Create a new client with default configuration
    ///
    /// # Errors
    ///
    /// See [`StudioClientBuilder::build`].
    pub fn new(base_url: impl Into<String>) -> Result<Self, ClientError> {
        Self::builder().base_url(base_url).build()
    }

    /// Create a new client builder
    #[must_use]
    pub fn builder() -> StudioClientBuilder {
        StudioClientBuilder::default()
    }

    /// Get the base URL
    #[must_use]
    pub fn base_url(&self) -> &str {
        self.dispatcher.base_url()
    }

    /// Token store shared by the dispatcher and the refresh coordinator
    #[must_use]
    pub fn tokens(&self) -> &Arc<dyn TokenStore> {
        self.dispatcher.tokens()
    }

    /// Whether a token refresh is currently in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        self.coordinator.is_refreshing()
    }

    /// Execute a request and decode its JSON body
    ///
    /// # Errors
    ///
    /// Any dispatch error, a non-2xx status, or a body that does not decode as `T`.
    pub async fn execute<T: DeserializeOwned>(&self, request: ApiRequest) -> Result<T, ClientError> {
        let response = self.dispatch(request).await?;
        decode(response).await
    }

    /// Execute a request whose response body is not needed
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn execute_void(&self, request: ApiRequest) -> Result<(), ClientError> {
        ensure_success(self.dispatch(request).await?).await?;
        Ok(())
    }

    /// Send a request, running the refresh-and-retry path on a first 401.
    ///
    /// Responses other than 401, and a 401 on the retry, are returned as-is.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Refresh`] when a 401 could not be recovered by
    /// refreshing the token, and [`ClientError::Request`] on transport failure.
    pub async fn dispatch(&self, request: ApiRequest) -> Result<reqwest::Response, ClientError> {
        let mut attempt = Attempt::first(request);
        loop {
            let Dispatched { response, token } = self.dispatcher.send(&attempt).await?;
            if response.status() != StatusCode::UNAUTHORIZED || !attempt.may_refresh() {
                return Ok(response);
            }

            debug!(
                path = attempt.request().path(),
                "Request unauthorized, waiting for refreshed token"
            );
            let fresh = self.coordinator.refreshed_token(token.as_deref()).await?;
            attempt = attempt.retry(fresh);
        }
    }
}

/// Builder for StudioClient
#[derive(Default)]
pub struct StudioClientBuilder {
    base_url: Option<String>,
    timeout: Option<Duration>,
    user_agent: Option<String>,
    tokens: Option<Arc<dyn TokenStore>>,
    redirect: Option<Arc<dyn LoginRedirect>>,
}

impl StudioClientBuilder {
    /// Start from a loaded configuration
    #[must_use]
    pub fn from_config(config: &ClientConfig) -> Self {
        let mut builder = Self::default()
            .base_url(&config.api_base_url)
            .user_agent(&config.user_agent);
        if let Some(timeout) = config.timeout() {
            builder = builder.timeout(timeout);
        }
        builder
    }

    /// Set the base URL
    #[must_use]
    pub fn base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = Some(url.into());
        self
    }

    /// Set the request timeout
    #[must_use]
    pub fn timeout(mut self, timeout: Duration) -> Self {
        self.timeout = Some(timeout);
        self
    }

    /// Set the user agent
    #[must_use]
    pub fn user_agent(mut self, agent: impl Into<String>) -> Self {
        self.user_agent = Some(agent.into());
        self
    }

    /// Use a specific token store (defaults to an in-memory store)
    #[must_use]
    pub fn token_store(mut self, tokens: Arc<dyn TokenStore>) -> Self {
        self.tokens = Some(tokens);
        self
    }

    /// Set what happens when the session ends (defaults to nothing)
    #[must_use]
    pub fn login_redirect(mut self, redirect: Arc<dyn LoginRedirect>) -> Self {
        self.redirect = Some(redirect);
        self
    }

    /// Build the client
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] without a base URL, or
    /// [`ClientError::Request`] if the HTTP client cannot be built.
    pub fn build(self) -> Result<StudioClient, ClientError> {
        let base_url = self
            .base_url
            .ok_or_else(|| ClientError::Configuration("base_url is required".into()))?;

        // Ensure base_url ends without a trailing slash
        let base_url = base_url.trim_end_matches('/').to_string();

        let mut headers = header::HeaderMap::new();
        headers.insert(
            header::CONTENT_TYPE,
            header::HeaderValue::from_static("application/json"),
        );

        let mut client_builder = ClientBuilder::new().default_headers(headers);

        #[cfg(not(target_arch = "wasm32"))]
        if let Some(timeout) = self.timeout {
            client_builder = client_builder.timeout(timeout);
        }

        client_builder =
            client_builder.user_agent(self.user_agent.as_deref().unwrap_or(DEFAULT_USER_AGENT));

        let http = client_builder.build()?;
        let tokens = self
            .tokens
            .unwrap_or_else(|| Arc::new(MemoryTokenStore::default()) as Arc<dyn TokenStore>);
        let redirect = self
            .redirect
            .unwrap_or_else(|| Arc::new(NoopRedirect) as Arc<dyn LoginRedirect>);

        let coordinator = Arc::new(RefreshCoordinator::new(
            http.clone(),
            &base_url,
            tokens.clone(),
            redirect,
        ));

        Ok(StudioClient {
            dispatcher: Dispatcher::new(http, base_url, tokens),
            coordinator,
        })
    }
}
