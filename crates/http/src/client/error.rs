//! Client error types

use studio_core::ValidationError;
use thiserror::Error;

use super::token_store::StoreError;

/// Client error types
#[derive(Debug, Error)]
pub enum ClientError {
    /// Network or request error
    #[error("Request failed: {0}")]
    Request(#[from] reqwest::Error),

    /// Server returned an error status
    #[error("Server error {status}: {message}")]
    ServerError { status: u16, message: String },

    /// Authentication failed
    #[error("Authentication failed: {0}")]
    AuthenticationFailed(String),

    /// Resource not found
    #[error("Resource not found: {0}")]
    NotFound(String),

    /// Bad request
    #[error("Bad request: {0}")]
    BadRequest(String),

    /// Forbidden
    #[error("Forbidden: {0}")]
    Forbidden(String),

    /// Request rejected before it was sent
    #[error("Invalid input: {0}")]
    Validation(#[from] ValidationError),

    /// Serialization/deserialization error
    #[error("Serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    /// Invalid configuration
    #[error("Invalid configuration: {0}")]
    Configuration(String),

    /// The access token expired and could not be renewed
    #[error(transparent)]
    Refresh(#[from] RefreshError),

    /// Token storage failed
    #[error("Token storage failed: {0}")]
    Storage(#[from] StoreError),
}

impl ClientError {
    /// Create error from HTTP status code
    #[must_use]
    pub fn from_status(status: reqwest::StatusCode, message: String) -> Self {
        match status.as_u16() {
            400 => Self::BadRequest(message),
            401 => Self::AuthenticationFailed(message),
            403 => Self::Forbidden(message),
            404 => Self::NotFound(message),
            _ => Self::ServerError {
                status: status.as_u16(),
                message,
            },
        }
    }

    /// HTTP status reported by the backend, if any
    #[must_use]
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::BadRequest(_) => Some(400),
            Self::AuthenticationFailed(_) => Some(401),
            Self::Forbidden(_) => Some(403),
            Self::NotFound(_) => Some(404),
            Self::ServerError { status, .. } => Some(*status),
            Self::Request(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// 401 or 403 on a token-bearing request that survived the refresh path
    #[must_use]
    pub fn is_auth_expired(&self) -> bool {
        matches!(self, Self::AuthenticationFailed(_) | Self::Forbidden(_))
    }

    /// The session can no longer be used and the user must sign in again
    #[must_use]
    pub fn is_session_invalid(&self) -> bool {
        matches!(self, Self::Refresh(err) if err.ends_session())
    }

    /// Either flavour of authentication failure
    #[must_use]
    pub fn is_auth_error(&self) -> bool {
        self.is_auth_expired() || self.is_session_invalid()
    }

    /// Transient failure that leaves the session intact
    #[must_use]
    pub fn is_retryable(&self) -> bool {
        match self {
            Self::Request(_) => true,
            Self::ServerError { status, .. } => *status >= 500,
            Self::Refresh(err) => !err.ends_session(),
            _ => false,
        }
    }

    /// Message suitable for showing to a user, falling back to `fallback`
    /// when the backend did not provide one
    #[must_use]
    pub fn user_message(&self, fallback: &str) -> String {
        let message = match self {
            Self::BadRequest(m)
            | Self::AuthenticationFailed(m)
            | Self::Forbidden(m)
            | Self::NotFound(m)
            | Self::ServerError { message: m, .. } => m.as_str(),
            Self::Validation(err) => return err.to_string(),
            Self::Refresh(err) if err.ends_session() => {
                return "Your session has expired. Please log in again.".to_string();
            }
            _ => "",
        };
        if message.trim().is_empty() {
            fallback.to_string()
        } else {
            message.to_string()
        }
    }
}

/// Failure of the single-flight token refresh.
///
/// Cloned to every request that was waiting on the refresh.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum RefreshError {
    /// No refresh token was on record; no refresh call was made
    #[error("No refresh token available")]
    MissingRefreshToken,

    /// The backend answered the refresh call with an error status
    #[error("Token refresh rejected ({status}): {message}")]
    Rejected { status: u16, message: String },

    /// The refresh call succeeded but its body was unusable
    #[error("Token refresh returned an invalid response: {0}")]
    InvalidResponse(String),

    /// The refresh call never got a response
    #[error("Token refresh could not reach the server: {0}")]
    Transport(String),

    /// The refreshing task was dropped before it settled
    #[error("Token refresh was abandoned before it completed")]
    Abandoned,
}

impl RefreshError {
    /// Whether this failure clears the stored tokens.
    ///
    /// Every failed refresh call ends the session, including one that never
    /// reached the server. Only an abandoned refresh leaves it in place.
    #[must_use]
    pub const fn ends_session(&self) -> bool {
        !matches!(self, Self::Abandoned)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn status_codes_map_to_variants() {
        assert!(matches!(
            ClientError::from_status(StatusCode::UNAUTHORIZED, String::new()),
            ClientError::AuthenticationFailed(_)
        ));
        assert!(matches!(
            ClientError::from_status(StatusCode::CONFLICT, "taken".into()),
            ClientError::ServerError { status: 409, .. }
        ));
    }

    #[test]
    fn failed_refresh_ends_session_unless_abandoned() {
        let rejected = ClientError::from(RefreshError::Rejected {
            status: 401,
            message: "expired".into(),
        });
        assert!(rejected.is_session_invalid());
        assert!(!rejected.is_retryable());

        let offline = ClientError::from(RefreshError::Transport("connection refused".into()));
        assert!(offline.is_session_invalid());
        assert!(!offline.is_retryable());
        assert_eq!(
            offline.user_message("Request failed"),
            "Your session has expired. Please log in again."
        );

        let abandoned = ClientError::from(RefreshError::Abandoned);
        assert!(!abandoned.is_session_invalid());
        assert!(abandoned.is_retryable());
        assert_eq!(abandoned.user_message("Request failed"), "Request failed");
    }

    #[test]
    fn user_message_prefers_backend_text() {
        let err = ClientError::BadRequest("Username is already taken!".into());
        assert_eq!(err.user_message("Registration failed"), "Username is already taken!");

        let err = ClientError::AuthenticationFailed(String::new());
        assert_eq!(err.user_message("Login failed"), "Login failed");
    }
}
