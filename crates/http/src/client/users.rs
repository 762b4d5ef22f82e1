//! User administration endpoints

use super::{ApiRequest, ClientError, StudioClient};
use studio_core::{Profile, Role, RoleUpdateRequest};

impl StudioClient {
    /// Registered clients (staff only)
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn list_clients(&self) -> Result<Vec<Profile>, ClientError> {
        self.execute(ApiRequest::get("/users/clients")).await
    }

    /// Change a user's role (staff only)
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::NotFound`] for an unknown user, or
    /// [`ClientError::Forbidden`] when the caller is not staff.
    pub async fn set_user_role(&self, user_id: i64, role: Role) -> Result<(), ClientError> {
        let request = ApiRequest::put(format!("/users/{user_id}/role"))
            .json(&RoleUpdateRequest { role })?;
        self.execute_void(request).await
    }
}
