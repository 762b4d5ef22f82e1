//! CLI configuration and state directory management

use anyhow::{Context, Result};
use directories::ProjectDirs;
use std::path::{Path, PathBuf};
use studio_http::ClientConfig;
use tracing::{debug, warn};

const CONFIG_FILE_NAME: &str = "studio.toml";

/// Manages platform-specific application directories
pub struct StateDir {
    /// Project directories from the directories crate
    project_dirs: Option<ProjectDirs>,
    /// Override directory from `--data-dir` or `STUDIO_STATE_DIR`
    override_dir: Option<PathBuf>,
}

impl StateDir {
    /// Create a new StateDir instance
    pub fn new() -> Self {
        let project_dirs = ProjectDirs::from("local", "Studio", "studio");
        if project_dirs.is_none() {
            warn!("Failed to determine platform-specific directories, will use fallback");
        }
        Self {
            project_dirs,
            override_dir: None,
        }
    }

    /// Create a new StateDir with an override directory
    pub fn with_override(path: impl Into<PathBuf>) -> Self {
        Self {
            project_dirs: None,
            override_dir: Some(path.into()),
        }
    }

    /// Get the configuration directory
    pub fn config_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.clone();
        }

        match &self.project_dirs {
            Some(project_dirs) => project_dirs.config_dir().to_path_buf(),
            None => PathBuf::from("."),
        }
    }

    /// Get the data directory holding the session and logs
    pub fn data_dir(&self) -> PathBuf {
        if let Some(override_dir) = &self.override_dir {
            return override_dir.clone();
        }

        match &self.project_dirs {
            Some(project_dirs) => project_dirs.data_dir().to_path_buf(),
            None => PathBuf::from("./.studio"),
        }
    }
}

/// Load the client configuration.
///
/// An explicit `--config` file must exist; the default `studio.toml` in the
/// config directory is optional. `--base-url` wins over both.
pub fn load_client_config(
    file: Option<&Path>,
    state_dir: &StateDir,
    base_url: Option<&str>,
) -> Result<ClientConfig> {
    let path = match file {
        Some(path) => {
            if !path.exists() {
                anyhow::bail!("Configuration file not found: {}", path.display());
            }
            path.to_path_buf()
        }
        None => state_dir.config_dir().join(CONFIG_FILE_NAME),
    };
    debug!(path = %path.display(), "Loading configuration");

    let mut config = ClientConfig::load(Some(&path))
        .with_context(|| format!("Failed to load configuration from {}", path.display()))?;

    if let Some(base_url) = base_url {
        config.api_base_url = base_url.to_string();
        config.validate().context("Invalid --base-url")?;
    }

    Ok(config)
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn override_dir_is_used_for_everything() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::with_override(dir.path());
        assert_eq!(state.data_dir(), dir.path());
        assert_eq!(state.config_dir(), dir.path());
    }

    #[test]
    fn base_url_flag_overrides_config() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::with_override(dir.path());
        let config =
            load_client_config(None, &state, Some("https://booking.example.com/api")).unwrap();
        assert_eq!(config.api_base_url, "https://booking.example.com/api");
    }

    #[test]
    fn missing_explicit_config_is_an_error() {
        let dir = tempfile::tempdir().unwrap();
        let state = StateDir::with_override(dir.path());
        let missing = dir.path().join("nope.toml");
        assert!(load_client_config(Some(&missing), &state, None).is_err());
    }
}
