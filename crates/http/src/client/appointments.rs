//! Appointment endpoints

use super::{ApiRequest, ClientError, StudioClient};
use studio_core::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, StatusUpdateRequest, Validate,
};

impl StudioClient {
    /// Every appointment (staff only)
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Forbidden`] for non-staff accounts, or any dispatch error.
    pub async fn list_appointments(&self) -> Result<Vec<Appointment>, ClientError> {
        self.execute(ApiRequest::get("/appointments")).await
    }

    /// Appointments belonging to the signed-in client
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn my_appointments(&self) -> Result<Vec<Appointment>, ClientError> {
        self.execute(ApiRequest::get("/appointments/my")).await
    }

    /// Book an appointment. Staff may book on behalf of a client via `client_id`.
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Validation`] without sending anything when no
    /// service is selected; otherwise any dispatch error.
    pub async fn book_appointment(
        &self,
        booking: &CreateAppointmentRequest,
    ) -> Result<(), ClientError> {
        booking.validate()?;
        let request = ApiRequest::post("/appointments").json(booking)?;
        self.execute_void(request).await
    }

    /// Move an appointment to a new status (staff only)
    ///
    /// # Errors
    ///
    /// Returns any error from dispatching the request.
    pub async fn update_appointment_status(
        &self,
        id: i64,
        status: AppointmentStatus,
    ) -> Result<(), ClientError> {
        let request = ApiRequest::put(format!("/appointments/{id}/status"))
            .json(&StatusUpdateRequest { status })?;
        self.execute_void(request).await
    }

    /// Cancel an appointment
    ///
    /// # Errors
    ///
    /// The backend refuses appointments that are no longer open with
    /// [`ClientError::BadRequest`].
    pub async fn cancel_appointment(&self, id: i64) -> Result<(), ClientError> {
        self.execute_void(ApiRequest::put(format!("/appointments/{id}/cancel")))
            .await
    }
}
