//! Single-flight access token refresh.
//!
//! When a request comes back 401 the coordinator either starts the one
//! refresh call (`POST /auth/refresh`) or, if a refresh is already running,
//! parks the caller until that refresh settles. Every parked caller is settled
//! exactly once, in arrival order, with the refreshed token or the refresh
//! error.

use super::dispatcher::error_message;
use super::error::RefreshError;
use super::token_store::{TokenKind, TokenStore};
use std::mem;
use std::sync::{Arc, Mutex, MutexGuard, PoisonError};
use studio_core::{RefreshRequest, RefreshResponse};
use tokio::sync::oneshot;
use tracing::{debug, error, info, warn};

/// Outcome broadcast to every caller waiting on a refresh
pub type RefreshOutcome = Result<String, RefreshError>;

type Waiter = oneshot::Sender<RefreshOutcome>;

/// Where the user is sent once the session can no longer be renewed
pub trait LoginRedirect: Send + Sync {
    /// Location the user is currently looking at, if known
    fn current_location(&self) -> Option<String> {
        None
    }

    /// Send the user to the login view
    fn redirect_to_login(&self);
}

/// Redirect that does nothing, for headless use
#[derive(Debug, Default, Clone, Copy)]
pub struct NoopRedirect;

impl LoginRedirect for NoopRedirect {
    fn redirect_to_login(&self) {}
}

enum RefreshState {
    Idle,
    Refreshing { waiters: Vec<Waiter> },
}

enum Role {
    Leader,
    Follower(oneshot::Receiver<RefreshOutcome>),
}

pub struct RefreshCoordinator {
    http: reqwest::Client,
    refresh_url: String,
    tokens: Arc<dyn TokenStore>,
    redirect: Arc<dyn LoginRedirect>,
    state: Mutex<RefreshState>,
}

impl RefreshCoordinator {
    #[must_use]
    pub fn new(
        http: reqwest::Client,
        base_url: &str,
        tokens: Arc<dyn TokenStore>,
        redirect: Arc<dyn LoginRedirect>,
    ) -> Self {
        Self {
            http,
            refresh_url: format!("{base_url}/auth/refresh"),
            tokens,
            redirect,
            state: Mutex::new(RefreshState::Idle),
        }
    }

    fn state(&self) -> MutexGuard<'_, RefreshState> {
        self.state.lock().unwrap_or_else(PoisonError::into_inner)
    }

    /// Whether a refresh call is currently in flight
    #[must_use]
    pub fn is_refreshing(&self) -> bool {
        matches!(*self.state(), RefreshState::Refreshing { .. })
    }

    /// Obtain an access token to retry a request that was rejected with 401.
    ///
    /// `rejected` is the token the failed request carried. If the store
    /// already holds a different token, a refresh finished after that request
    /// was sent and the current token is returned without another refresh.
    pub async fn refreshed_token(&self, rejected: Option<&str>) -> RefreshOutcome {
        let role = {
            let mut state = self.state();
            match &mut *state {
                RefreshState::Refreshing { waiters } => {
                    let (tx, rx) = oneshot::channel();
                    waiters.push(tx);
                    debug!(queued = waiters.len(), "Refresh in progress, queueing request");
                    Role::Follower(rx)
                }
                RefreshState::Idle => {
                    if let Some(current) = self.tokens.get(TokenKind::Access) {
                        if rejected != Some(current.as_str()) {
                            debug!("Access token already renewed, retrying without refresh");
                            return Ok(current);
                        }
                    }
                    *state = RefreshState::Refreshing {
                        waiters: Vec::new(),
                    };
                    Role::Leader
                }
            }
        };

        match role {
            Role::Follower(rx) => rx.await.unwrap_or(Err(RefreshError::Abandoned)),
            Role::Leader => {
                let flight = InFlight {
                    coordinator: self,
                    settled: false,
                };
                let outcome = self.refresh().await;
                flight.settle(&outcome);
                outcome
            }
        }
    }

    /// Perform the refresh call and update the store. Runs only on the leader.
    async fn refresh(&self) -> RefreshOutcome {
        let outcome = match self.tokens.get(TokenKind::Refresh) {
            Some(refresh_token) => {
                info!("Attempting to refresh access token");
                self.call_refresh(refresh_token).await
            }
            None => Err(RefreshError::MissingRefreshToken),
        };

        match &outcome {
            Ok(_) => info!("Access token refreshed"),
            Err(err) => {
                warn!(error = %err, "Token refresh failed, ending session");
                if let Err(clear_err) = self.tokens.clear() {
                    error!(error = %clear_err, "Failed to clear tokens after refresh failure");
                }
            }
        }

        outcome
    }

    async fn call_refresh(&self, refresh_token: String) -> RefreshOutcome {
        let response = self
            .http
            .post(&self.refresh_url)
            .json(&RefreshRequest { refresh_token })
            .send()
            .await
            .map_err(|err| RefreshError::Transport(err.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(RefreshError::Rejected {
                status: status.as_u16(),
                message: error_message(status, &body),
            });
        }

        let RefreshResponse {
            token,
            refresh_token,
        } = response
            .json()
            .await
            .map_err(|err| RefreshError::InvalidResponse(err.to_string()))?;

        self.tokens
            .set(&token, &refresh_token)
            .map_err(|err| RefreshError::InvalidResponse(err.to_string()))?;
        Ok(token)
    }

    fn redirect_if_needed(&self) {
        let at_login = self
            .redirect
            .current_location()
            .is_some_and(|location| location.contains("/login"));
        if !at_login {
            self.redirect.redirect_to_login();
        }
    }
}

/// Held by the leader while its refresh runs. Settling returns the
/// coordinator to idle and drains the queue; dropping an unsettled flight
/// does the same with [`RefreshError::Abandoned`].
struct InFlight<'a> {
    coordinator: &'a RefreshCoordinator,
    settled: bool,
}

impl InFlight<'_> {
    fn settle(mut self, outcome: &RefreshOutcome) {
        self.settled = true;
        self.drain(outcome);
        if matches!(outcome, Err(err) if err.ends_session()) {
            self.coordinator.redirect_if_needed();
        }
    }

    fn drain(&self, outcome: &RefreshOutcome) {
        let waiters = match mem::replace(&mut *self.coordinator.state(), RefreshState::Idle) {
            RefreshState::Refreshing { waiters } => waiters,
            RefreshState::Idle => Vec::new(),
        };
        if !waiters.is_empty() {
            debug!(count = waiters.len(), ok = outcome.is_ok(), "Settling queued requests");
        }
        for waiter in waiters {
            // A receiver that went away no longer needs the result
            let _ = waiter.send(outcome.clone());
        }
    }
}

impl Drop for InFlight<'_> {
    fn drop(&mut self) {
        if !self.settled {
            warn!("Token refresh dropped before completion");
            self.drain(&Err(RefreshError::Abandoned));
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::client::token_store::MemoryTokenStore;
    use std::sync::atomic::{AtomicUsize, Ordering};

    #[derive(Default)]
    struct CountingRedirect {
        location: Option<String>,
        count: AtomicUsize,
    }

    impl LoginRedirect for CountingRedirect {
        fn current_location(&self) -> Option<String> {
            self.location.clone()
        }

        fn redirect_to_login(&self) {
            self.count.fetch_add(1, Ordering::SeqCst);
        }
    }

    fn coordinator(
        tokens: Arc<MemoryTokenStore>,
        redirect: Arc<CountingRedirect>,
    ) -> RefreshCoordinator {
        // Never contacted by these tests
        RefreshCoordinator::new(
            reqwest::Client::new(),
            "http://127.0.0.1:9",
            tokens,
            redirect,
        )
    }

    #[tokio::test]
    async fn missing_refresh_token_clears_store_and_redirects() {
        let tokens = Arc::new(MemoryTokenStore::default());
        let redirect = Arc::new(CountingRedirect::default());
        let coordinator = coordinator(tokens.clone(), redirect.clone());

        let outcome = coordinator.refreshed_token(None).await;

        assert_eq!(outcome, Err(RefreshError::MissingRefreshToken));
        assert_eq!(tokens.get(TokenKind::Access), None);
        assert_eq!(redirect.count.load(Ordering::SeqCst), 1);
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn no_redirect_when_already_on_login() {
        let tokens = Arc::new(MemoryTokenStore::default());
        let redirect = Arc::new(CountingRedirect {
            location: Some("/login".into()),
            ..Default::default()
        });
        let coordinator = coordinator(tokens, redirect.clone());

        let _ = coordinator.refreshed_token(Some("stale")).await;
        assert_eq!(redirect.count.load(Ordering::SeqCst), 0);
    }

    #[tokio::test]
    async fn renewed_token_is_reused_without_refresh() {
        let tokens = Arc::new(MemoryTokenStore::default());
        tokens.set("new-access", "new-refresh").unwrap();
        let coordinator = coordinator(tokens, Arc::new(CountingRedirect::default()));

        let outcome = coordinator.refreshed_token(Some("old-access")).await;
        assert_eq!(outcome.as_deref(), Ok("new-access"));
        assert!(!coordinator.is_refreshing());
    }

    #[tokio::test]
    async fn dropped_leader_releases_queued_callers() {
        let tokens = Arc::new(MemoryTokenStore::default());
        let coordinator = coordinator(tokens, Arc::new(CountingRedirect::default()));

        *coordinator.state() = RefreshState::Refreshing {
            waiters: Vec::new(),
        };
        let flight = InFlight {
            coordinator: &coordinator,
            settled: false,
        };

        let (tx, rx) = oneshot::channel();
        if let RefreshState::Refreshing { waiters } = &mut *coordinator.state() {
            waiters.push(tx);
        }

        drop(flight);

        assert_eq!(rx.await.unwrap(), Err(RefreshError::Abandoned));
        assert!(!coordinator.is_refreshing());
    }
}
