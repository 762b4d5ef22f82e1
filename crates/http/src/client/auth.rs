//! Authentication and profile endpoints

use super::{ApiRequest, ClientError, StudioClient};
use studio_core::{JwtResponse, LoginRequest, Profile, SignupRequest, UpdateProfileRequest};

impl StudioClient {
    /// Exchange credentials for an access/refresh token pair.
    ///
    /// Does not store the tokens; see [`Session::login`](super::Session::login).
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::AuthenticationFailed`] on bad credentials. The
    /// refresh path is never taken.
    pub async fn sign_in(&self, credentials: &LoginRequest) -> Result<JwtResponse, ClientError> {
        let request = ApiRequest::post("/auth/signin")
            .json(credentials)?
            .without_refresh();
        self.execute(request).await
    }

    /// Register a new client account
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::BadRequest`] carrying the backend's message when the
    /// username or e-mail is taken.
    pub async fn sign_up(&self, fields: &SignupRequest) -> Result<(), ClientError> {
        let request = ApiRequest::post("/auth/signup")
            .json(fields)?
            .without_refresh();
        // The backend answers with a message body or nothing at all
        self.execute_void(request).await
    }

    /// Get the signed-in user's profile
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn profile(&self) -> Result<Profile, ClientError> {
        self.execute(ApiRequest::get("/users/profile")).await
    }

    /// Update the signed-in user's contact details
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn update_profile(
        &self,
        update: &UpdateProfileRequest,
    ) -> Result<Profile, ClientError> {
        let request = ApiRequest::put("/users/profile").json(update)?;
        self.execute(request).await
    }
}
