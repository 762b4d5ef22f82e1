use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum Role {
    Client,
    Staff,
}

impl Role {
    #[must_use]
    pub fn is_staff(self) -> bool {
        matches!(self, Self::Staff)
    }
}

impl fmt::Display for Role {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Client => f.write_str("CLIENT"),
            Self::Staff => f.write_str("STAFF"),
        }
    }
}

/// The signed-in user as reported by `GET /users/profile`
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Profile {
    pub id: i64,
    pub username: String,
    pub email: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
    pub role: Role,
    pub created_at: String,
}

impl Profile {
    /// First and last name joined for display
    #[must_use]
    pub fn full_name(&self) -> String {
        format!("{} {}", self.first_name, self.last_name)
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ServiceCategory {
    Bridal,
    Party,
    Everyday,
    Photoshoot,
    SpecialFx,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Service {
    pub id: i64,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: u32,
    pub category: ServiceCategory,
    pub active: bool,
    pub created_at: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum AppointmentStatus {
    Scheduled,
    Confirmed,
    InProgress,
    Completed,
    Cancelled,
    NoShow,
}

impl AppointmentStatus {
    /// Whether the appointment can still be cancelled by its client
    #[must_use]
    pub fn is_open(self) -> bool {
        matches!(self, Self::Scheduled | Self::Confirmed)
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Appointment {
    pub id: i64,
    pub appointment_date: String,
    pub status: AppointmentStatus,
    pub total_price: f64,
    #[serde(default)]
    pub notes: Option<String>,
    pub client: Profile,
    #[serde(default)]
    pub staff_member: Option<Profile>,
    #[serde(default)]
    pub services: Vec<Service>,
    pub created_at: String,
}

// Auth request/response types

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SignupRequest {
    pub username: String,
    pub email: String,
    pub password: String,
    pub first_name: String,
    pub last_name: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub phone: Option<String>,
}

/// Response to a successful sign-in
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct JwtResponse {
    pub token: String,
    pub refresh_token: String,
    #[serde(rename = "type", default)]
    pub token_type: Option<String>,
    pub id: i64,
    pub username: String,
    pub email: String,
    pub role: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshRequest {
    pub refresh_token: String,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RefreshResponse {
    pub token: String,
    pub refresh_token: String,
}

/// Generic `{ "message": ... }` body the backend uses for errors and acknowledgements
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

// Resource request types

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UpdateProfileRequest {
    pub first_name: String,
    pub last_name: String,
    pub phone: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateAppointmentRequest {
    pub appointment_date: DateTime<Utc>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub client_id: Option<i64>,
    pub service_ids: Vec<i64>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub notes: Option<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServiceRequest {
    pub name: String,
    pub description: String,
    pub price: f64,
    pub duration_minutes: u32,
    pub category: ServiceCategory,
    pub active: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StatusUpdateRequest {
    pub status: AppointmentStatus,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleUpdateRequest {
    pub role: Role,
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn profile_uses_backend_field_names() {
        let profile: Profile = serde_json::from_value(json!({
            "id": 7,
            "username": "ana",
            "email": "ana@example.com",
            "firstName": "Ana",
            "lastName": "Silva",
            "role": "STAFF",
            "createdAt": "2024-05-01T09:30:00"
        }))
        .unwrap();

        assert_eq!(profile.role, Role::Staff);
        assert_eq!(profile.phone, None);
        assert_eq!(profile.full_name(), "Ana Silva");
    }

    #[test]
    fn enum_wire_names_are_screaming_snake_case() {
        assert_eq!(
            serde_json::to_value(ServiceCategory::SpecialFx).unwrap(),
            json!("SPECIAL_FX")
        );
        assert_eq!(
            serde_json::to_value(AppointmentStatus::NoShow).unwrap(),
            json!("NO_SHOW")
        );
        assert_eq!(Role::Client.to_string(), "CLIENT");
    }

    #[test]
    fn optional_request_fields_are_omitted() {
        let request = SignupRequest {
            username: "ana".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            phone: None,
        };
        let value = serde_json::to_value(&request).unwrap();
        assert!(value.get("phone").is_none());
        assert_eq!(value["firstName"], "Ana");
    }

    #[test]
    fn jwt_response_reads_token_type() {
        let response: JwtResponse = serde_json::from_value(json!({
            "token": "a",
            "refreshToken": "r",
            "type": "Bearer",
            "id": 1,
            "username": "ana",
            "email": "ana@example.com",
            "role": "CLIENT"
        }))
        .unwrap();
        assert_eq!(response.refresh_token, "r");
        assert_eq!(response.token_type.as_deref(), Some("Bearer"));
    }
}
