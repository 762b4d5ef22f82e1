//! Service catalog endpoints

use super::{ApiRequest, ClientError, StudioClient};
use serde_json::json;
use studio_core::{Service, ServiceRequest, Validate};

impl StudioClient {
    /// List bookable (active) services
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn list_services(&self) -> Result<Vec<Service>, ClientError> {
        self.execute(ApiRequest::get("/services")).await
    }

    /// List every service, including inactive ones (staff only)
    ///
    /// # Errors
    ///
    /// Non-staff accounts get [`ClientError::Forbidden`].
    pub async fn list_all_services(&self) -> Result<Vec<Service>, ClientError> {
        self.execute(ApiRequest::get("/services/all")).await
    }

    /// Add a service to the catalog
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] before sending when the form is
    /// incomplete.
    pub async fn create_service(&self, service: &ServiceRequest) -> Result<(), ClientError> {
        service.validate()?;
        let request = ApiRequest::post("/services").json(service)?;
        self.execute_void(request).await
    }

    /// Replace a service's details
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] before sending when the form is
    /// incomplete, and [`ClientError::NotFound`] for an unknown id.
    pub async fn update_service(
        &self,
        id: i64,
        service: &ServiceRequest,
    ) -> Result<(), ClientError> {
        service.validate()?;
        let request = ApiRequest::put(format!("/services/{id}")).json(service)?;
        self.execute_void(request).await
    }

    /// Activate or deactivate a service
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn set_service_active(&self, id: i64, active: bool) -> Result<(), ClientError> {
        let request =
            ApiRequest::put(format!("/services/{id}")).json(&json!({ "active": active }))?;
        self.execute_void(request).await
    }

    /// Remove a service. The backend deactivates rather than deletes.
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn delete_service(&self, id: i64) -> Result<(), ClientError> {
        self.execute_void(ApiRequest::delete(format!("/services/{id}")))
            .await
    }
}
