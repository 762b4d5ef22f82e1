//! Session facade: login, signup, logout and the current profile.
//!
//! This is the entry point front ends use. It stores tokens on login, clears
//! them on logout, and decides which profile-fetch failures end the session.

use super::error::ClientError;
use super::token_store::{TokenKind, TokenStore};
use super::StudioClient;
use std::sync::{Arc, PoisonError, RwLock};
use studio_core::{JwtResponse, LoginRequest, Profile, SignupRequest, UpdateProfileRequest, Validate};
use tracing::{debug, info, warn};

pub struct Session {
    client: StudioClient,
    profile: RwLock<Option<Profile>>,
}

impl Session {
    #[must_use]
    pub fn new(client: StudioClient) -> Self {
        Self {
            client,
            profile: RwLock::new(None),
        }
    }

    #[must_use]
    pub fn client(&self) -> &StudioClient {
        &self.client
    }

    fn tokens(&self) -> &Arc<dyn TokenStore> {
        self.client.tokens()
    }

    fn set_profile(&self, profile: Option<Profile>) {
        *self.profile.write().unwrap_or_else(PoisonError::into_inner) = profile;
    }

    /// Profile loaded by the last successful login or profile fetch
    #[must_use]
    pub fn profile(&self) -> Option<Profile> {
        self.profile
            .read()
            .unwrap_or_else(PoisonError::into_inner)
            .clone()
    }

    /// Whether an access token is on record
    #[must_use]
    pub fn is_authenticated(&self) -> bool {
        self.tokens().get(TokenKind::Access).is_some()
    }

    /// Sign in and store the issued tokens.
    ///
    /// The profile is loaded right after; a failure there is logged but does
    /// not fail the login. A rejected login leaves stored tokens untouched.
    ///
    /// # Errors
    ///
    /// Returns the sign-in error; stored tokens are left untouched in that case.
    pub async fn login(&self, credentials: &LoginRequest) -> Result<JwtResponse, ClientError> {
        credentials.validate()?;
        let response = self.client.sign_in(credentials).await?;
        self.tokens().set(&response.token, &response.refresh_token)?;
        info!(username = %response.username, "Signed in");

        match self.client.profile().await {
            Ok(profile) => self.set_profile(Some(profile)),
            Err(err) => warn!(error = %err, "Signed in but failed to load profile"),
        }

        Ok(response)
    }

    /// Register a new account. Does not sign in.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] without a network call when a field is
    /// invalid, otherwise the backend's rejection.
    pub async fn signup(&self, fields: &SignupRequest) -> Result<(), ClientError> {
        fields.validate()?;
        self.client.sign_up(fields).await?;
        info!(username = %fields.username, "Registered new account");
        Ok(())
    }

    /// Forget the session. Always succeeds locally; a failure to remove the
    /// stored tokens is logged.
    pub fn logout(&self) {
        if let Err(err) = self.tokens().clear() {
            warn!(error = %err, "Failed to clear stored tokens");
        }
        self.set_profile(None);
        info!("Logged out");
    }

    /// Load the current user's profile, reporting why it is unavailable.
    ///
    /// Returns `Ok(None)` without a network call when no access token is
    /// stored. Auth failures (401/403 after the refresh path, or a failed
    /// refresh) clear the session; other failures leave the tokens in place.
    ///
    /// # Errors
    ///
    /// Returns the dispatch error. Auth errors also clear the stored tokens.
    pub async fn load_profile(&self) -> Result<Option<Profile>, ClientError> {
        if !self.is_authenticated() {
            debug!("No access token, skipping profile fetch");
            self.set_profile(None);
            return Ok(None);
        }

        match self.client.profile().await {
            Ok(profile) => {
                self.set_profile(Some(profile.clone()));
                Ok(Some(profile))
            }
            Err(err) => {
                self.set_profile(None);
                if err.is_auth_error() {
                    warn!(error = %err, "Session rejected, clearing tokens");
                    if let Err(clear_err) = self.tokens().clear() {
                        warn!(error = %clear_err, "Failed to clear stored tokens");
                    }
                }
                Err(err)
            }
        }
    }

    /// Current profile, or `None` when signed out or temporarily unreachable
    pub async fn current_profile(&self) -> Option<Profile> {
        match self.load_profile().await {
            Ok(profile) => profile,
            Err(err) => {
                debug!(error = %err, retryable = err.is_retryable(), "Profile unavailable");
                None
            }
        }
    }

    /// Update contact details and keep the cached profile in step
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn update_profile(
        &self,
        update: &UpdateProfileRequest,
    ) -> Result<Profile, ClientError> {
        let profile = self.client.update_profile(update).await?;
        self.set_profile(Some(profile.clone()));
        Ok(profile)
    }
}
