//! Client-side validation for outbound requests
//!
//! These checks mirror the rules the booking forms enforce before anything is
//! sent. The backend remains authoritative and may still reject a request.

use crate::error::{ValidationError, ValidationResult};
use crate::types::{CreateAppointmentRequest, LoginRequest, ServiceRequest, SignupRequest};

/// Trait for validating a request before it is dispatched
pub trait Validate {
    /// Returns Ok(()) if valid, or the first field that is wrong
    fn validate(&self) -> ValidationResult;
}

impl Validate for LoginRequest {
    fn validate(&self) -> ValidationResult {
        validators::validate_not_empty(&self.username, "username")?;
        validators::validate_not_empty(&self.password, "password")
    }
}

impl Validate for SignupRequest {
    fn validate(&self) -> ValidationResult {
        validators::validate_min_len(&self.username, 3, "username")?;
        validators::validate_email(&self.email, "email")?;
        validators::validate_min_len(&self.password, 6, "password")?;
        validators::validate_not_empty(&self.first_name, "firstName")?;
        validators::validate_not_empty(&self.last_name, "lastName")
    }
}

impl Validate for CreateAppointmentRequest {
    fn validate(&self) -> ValidationResult {
        if self.service_ids.is_empty() {
            return Err(ValidationError::new(
                "serviceIds",
                "select at least one service",
            ));
        }
        Ok(())
    }
}

impl Validate for ServiceRequest {
    fn validate(&self) -> ValidationResult {
        validators::validate_not_empty(&self.name, "name")?;
        if !self.price.is_finite() || self.price < 0.0 {
            return Err(ValidationError::new("price", "enter a valid price"));
        }
        validators::validate_range(self.duration_minutes, 1, 24 * 60, "durationMinutes")
    }
}

/// Common validation helpers
pub mod validators {
    use crate::error::{ValidationError, ValidationResult};

    /// Validate that a string is not empty
    #[must_use]
    pub fn validate_not_empty(value: &str, field: &str) -> ValidationResult {
        if value.trim().is_empty() {
            return Err(ValidationError::new(field, "is required"));
        }
        Ok(())
    }

    /// Validate that a string has at least `min` characters
    #[must_use]
    pub fn validate_min_len(value: &str, min: usize, field: &str) -> ValidationResult {
        if value.chars().count() < min {
            return Err(ValidationError::new(
                field,
                format!("must be at least {min} characters"),
            ));
        }
        Ok(())
    }

    /// Validate email format (basic `local@domain` check, no whitespace)
    #[must_use]
    pub fn validate_email(email: &str, field: &str) -> ValidationResult {
        let valid = match email.split_once('@') {
            Some((local, domain)) => {
                !local.is_empty()
                    && !domain.is_empty()
                    && !domain.contains('@')
                    && !email.chars().any(char::is_whitespace)
            }
            None => false,
        };
        if !valid {
            return Err(ValidationError::new(field, "valid email is required"));
        }
        Ok(())
    }

    /// Validate URL format
    #[must_use]
    pub fn validate_url(url: &str, field: &str) -> ValidationResult {
        url::Url::parse(url)
            .map_err(|e| ValidationError::new(field, format!("invalid URL - {e}")))?;
        Ok(())
    }

    /// Validate that a value is within range
    #[must_use]
    pub fn validate_range<T: PartialOrd + std::fmt::Display>(
        value: T,
        min: T,
        max: T,
        field: &str,
    ) -> ValidationResult {
        if value < min || value > max {
            return Err(ValidationError::new(
                field,
                format!("must be between {min} and {max}"),
            ));
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::types::ServiceCategory;

    fn signup() -> SignupRequest {
        SignupRequest {
            username: "ana".into(),
            email: "ana@example.com".into(),
            password: "secret1".into(),
            first_name: "Ana".into(),
            last_name: "Silva".into(),
            phone: None,
        }
    }

    #[test]
    fn valid_signup_passes() {
        assert!(signup().validate().is_ok());
    }

    #[test]
    fn short_username_is_rejected() {
        let mut request = signup();
        request.username = "an".into();
        let err = request.validate().unwrap_err();
        assert_eq!(err.field, "username");
    }

    #[test]
    fn malformed_email_is_rejected() {
        for email in ["", "ana", "ana@", "@example.com", "a b@example.com", "a@b@c"] {
            let mut request = signup();
            request.email = email.into();
            assert_eq!(request.validate().unwrap_err().field, "email", "{email}");
        }
    }

    #[test]
    fn short_password_is_rejected() {
        let mut request = signup();
        request.password = "12345".into();
        assert_eq!(request.validate().unwrap_err().field, "password");
    }

    #[test]
    fn blank_names_are_rejected() {
        let mut request = signup();
        request.last_name = "   ".into();
        assert_eq!(request.validate().unwrap_err().field, "lastName");
    }

    #[test]
    fn service_duration_must_be_positive() {
        let request = ServiceRequest {
            name: "Bridal trial".into(),
            description: String::new(),
            price: 120.0,
            duration_minutes: 0,
            category: ServiceCategory::Bridal,
            active: true,
        };
        assert_eq!(request.validate().unwrap_err().field, "durationMinutes");
    }

    #[test]
    fn url_validator_accepts_http_urls() {
        assert!(validators::validate_url("http://localhost:8080/api", "base_url").is_ok());
        assert!(validators::validate_url("not a url", "base_url").is_err());
    }
}
