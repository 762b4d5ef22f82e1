//! Client configuration

use super::error::ClientError;
use super::token_store::TokenTtl;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::time::Duration;
use studio_core::validation::validators;

/// Backend address used when nothing else is configured
pub const DEFAULT_API_BASE_URL: &str = "http://localhost:8080/api";

/// Environment variable prefix; `STUDIO_API_BASE_URL` sets `api_base_url`
pub const ENV_PREFIX: &str = "STUDIO";

/// Settings for [`StudioClient`](super::StudioClient)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClientConfig {
    /// Base URL of the booking API
    pub api_base_url: String,

    /// Lifetime of a stored access token, in hours
    pub access_ttl_hours: i64,

    /// Lifetime of a stored refresh token, in days
    pub refresh_ttl_days: i64,

    /// Request timeout in seconds (0 = no timeout)
    pub timeout_secs: u64,

    /// User agent sent with every request
    pub user_agent: String,
}

impl Default for ClientConfig {
    fn default() -> Self {
        Self {
            api_base_url: DEFAULT_API_BASE_URL.to_string(),
            access_ttl_hours: 24,
            refresh_ttl_days: 7,
            timeout_secs: 30,
            user_agent: concat!("studio-client/", env!("CARGO_PKG_VERSION")).to_string(),
        }
    }
}

impl ClientConfig {
    /// Load configuration: defaults, then the optional file, then `STUDIO_*`
    /// environment variables.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be parsed or the result is invalid
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] if a source cannot be read or the
    /// result fails [`ClientConfig::validate`].
    pub fn load(file: Option<&Path>) -> Result<Self, ClientError> {
        let mut builder = config::Config::builder().add_source(
            config::Config::try_from(&Self::default()).map_err(configuration_error)?,
        );

        if let Some(path) = file {
            builder = builder.add_source(config::File::from(path).required(false));
        }

        let config: Self = builder
            .add_source(config::Environment::with_prefix(ENV_PREFIX).try_parsing(true))
            .build()
            .and_then(config::Config::try_deserialize)
            .map_err(configuration_error)?;

        config.validate()?;
        Ok(config)
    }

    /// Check that the values are usable
    ///
    /// # Errors
    ///
    /// Returns [`ClientError::Configuration`] when the base URL is not http(s).
    pub fn validate(&self) -> Result<(), ClientError> {
        validators::validate_url(&self.api_base_url, "api_base_url")?;
        validators::validate_range(self.access_ttl_hours, 1, 24 * 365, "access_ttl_hours")?;
        validators::validate_range(self.refresh_ttl_days, 1, 365, "refresh_ttl_days")?;
        Ok(())
    }

    /// Token lifetimes to apply when storing tokens
    #[must_use]
    pub fn token_ttl(&self) -> TokenTtl {
        TokenTtl {
            access: chrono::Duration::hours(self.access_ttl_hours),
            refresh: chrono::Duration::days(self.refresh_ttl_days),
        }
    }

    /// Request timeout, if one is configured
    #[must_use]
    pub fn timeout(&self) -> Option<Duration> {
        (self.timeout_secs > 0).then(|| Duration::from_secs(self.timeout_secs))
    }
}

fn configuration_error(err: config::ConfigError) -> ClientError {
    ClientError::Configuration(err.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::io::Write;

    #[test]
    fn defaults_match_the_local_backend() {
        let config = ClientConfig::default();
        assert_eq!(config.api_base_url, "http://localhost:8080/api");
        assert_eq!(config.token_ttl(), TokenTtl::default());
        assert_eq!(config.timeout(), Some(Duration::from_secs(30)));
        assert!(config.validate().is_ok());
    }

    #[test]
    fn file_values_override_defaults() {
        let mut file = tempfile::Builder::new().suffix(".toml").tempfile().unwrap();
        writeln!(file, "api_base_url = \"https://booking.example.com/api\"").unwrap();
        writeln!(file, "timeout_secs = 0").unwrap();

        let config = ClientConfig::load(Some(file.path())).unwrap();
        assert_eq!(config.api_base_url, "https://booking.example.com/api");
        assert_eq!(config.timeout(), None);
        assert_eq!(config.refresh_ttl_days, 7);
    }

    #[test]
    fn invalid_url_is_rejected() {
        let config = ClientConfig {
            api_base_url: "localhost api".into(),
            ..Default::default()
        };
        assert!(matches!(config.validate(), Err(ClientError::Validation(_))));
    }
}
