//! Studio booking core types and utilities

pub mod error;
pub mod types;
pub mod validation;

pub use error::{ValidationError, ValidationResult};
pub use types::{
    Appointment, AppointmentStatus, CreateAppointmentRequest, JwtResponse, LoginRequest,
    MessageResponse, Profile, RefreshRequest, RefreshResponse, Role, RoleUpdateRequest, Service,
    ServiceCategory, ServiceRequest, SignupRequest, StatusUpdateRequest, UpdateProfileRequest,
};
pub use validation::Validate;
