//! Access and refresh token storage
//!
//! Both tokens are stored under the names the web client used (`token` and
//! `refreshToken`), each with its own expiry. Writes are visible to the very
//! next read, so a login can be followed immediately by an authenticated call.

use chrono::{DateTime, Duration, Utc};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io;
use std::path::{Path, PathBuf};
use std::sync::{Arc, Mutex, PoisonError};
use thiserror::Error;
use tracing::{debug, warn};

/// Which of the two tokens to read
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TokenKind {
    Access,
    Refresh,
}

impl TokenKind {
    /// Name the token is persisted under
    #[must_use]
    pub fn storage_key(self) -> &'static str {
        match self {
            Self::Access => "token",
            Self::Refresh => "refreshToken",
        }
    }
}

/// Lifetimes applied when tokens are written
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TokenTtl {
    pub access: Duration,
    pub refresh: Duration,
}

impl Default for TokenTtl {
    fn default() -> Self {
        Self {
            access: Duration::days(1),
            refresh: Duration::days(7),
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("I/O error on {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: io::Error,
    },

    #[error("Malformed token file: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// Persistent storage for the credentials pair.
///
/// Implementations must make `set` and `clear` visible to the next `get`.
pub trait TokenStore: Send + Sync {
    /// Store both tokens, replacing whatever was there
    fn set(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError>;

    /// Current value of a token, or `None` if unset or expired
    fn get(&self, kind: TokenKind) -> Option<String>;

    /// Remove both tokens. Clearing an empty store succeeds.
    fn clear(&self) -> Result<(), StoreError>;
}

/// Source of the current time, injectable for expiry tests
pub type Clock = Arc<dyn Fn() -> DateTime<Utc> + Send + Sync>;

fn system_clock() -> Clock {
    Arc::new(Utc::now)
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
struct StoredToken {
    value: String,
    expires_at: DateTime<Utc>,
}

impl StoredToken {
    fn live_value(&self, now: DateTime<Utc>) -> Option<String> {
        (now < self.expires_at).then(|| self.value.clone())
    }
}

/// On-disk and in-memory layout: two independently expiring entries
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
struct StoredTokens {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    token: Option<StoredToken>,
    #[serde(
        rename = "refreshToken",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    refresh_token: Option<StoredToken>,
}

impl StoredTokens {
    fn issue(access: &str, refresh: &str, ttl: TokenTtl, now: DateTime<Utc>) -> Self {
        Self {
            token: Some(StoredToken {
                value: access.to_string(),
                expires_at: now + ttl.access,
            }),
            refresh_token: Some(StoredToken {
                value: refresh.to_string(),
                expires_at: now + ttl.refresh,
            }),
        }
    }

    fn read(&self, kind: TokenKind, now: DateTime<Utc>) -> Option<String> {
        let entry = match kind {
            TokenKind::Access => self.token.as_ref(),
            TokenKind::Refresh => self.refresh_token.as_ref(),
        };
        entry.and_then(|e| e.live_value(now))
    }
}

/// Token store that lives only as long as the process
pub struct MemoryTokenStore {
    ttl: TokenTtl,
    clock: Clock,
    tokens: Mutex<StoredTokens>,
}

impl MemoryTokenStore {
    #[must_use]
    pub fn new(ttl: TokenTtl) -> Self {
        Self::with_clock(ttl, system_clock())
    }

    #[must_use]
    pub fn with_clock(ttl: TokenTtl, clock: Clock) -> Self {
        Self {
            ttl,
            clock,
            tokens: Mutex::new(StoredTokens::default()),
        }
    }
}

impl Default for MemoryTokenStore {
    fn default() -> Self {
        Self::new(TokenTtl::default())
    }
}

impl TokenStore for MemoryTokenStore {
    fn set(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        let issued = StoredTokens::issue(access_token, refresh_token, self.ttl, (self.clock)());
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = issued;
        Ok(())
    }

    fn get(&self, kind: TokenKind) -> Option<String> {
        self.tokens
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .read(kind, (self.clock)())
    }

    fn clear(&self) -> Result<(), StoreError> {
        *self.tokens.lock().unwrap_or_else(PoisonError::into_inner) = StoredTokens::default();
        Ok(())
    }
}

/// Token store persisted as a JSON file so separate processes share a session
pub struct FileTokenStore {
    path: PathBuf,
    ttl: TokenTtl,
    clock: Clock,
    write_lock: Mutex<()>,
}

impl FileTokenStore {
    /// File name used inside a data directory
    pub const FILE_NAME: &'static str = "tokens.json";

    #[must_use]
    pub fn new(path: impl Into<PathBuf>, ttl: TokenTtl) -> Self {
        Self::with_clock(path, ttl, system_clock())
    }

    #[must_use]
    pub fn with_clock(path: impl Into<PathBuf>, ttl: TokenTtl, clock: Clock) -> Self {
        Self {
            path: path.into(),
            ttl,
            clock,
            write_lock: Mutex::new(()),
        }
    }

    /// Store tokens in `tokens.json` inside `dir`
    #[must_use]
    pub fn in_dir(dir: impl AsRef<Path>, ttl: TokenTtl) -> Self {
        Self::new(dir.as_ref().join(Self::FILE_NAME), ttl)
    }

    #[must_use]
    pub fn path(&self) -> &Path {
        &self.path
    }

    fn load(&self) -> Result<StoredTokens, StoreError> {
        match fs::read(&self.path) {
            Ok(bytes) if bytes.is_empty() => Ok(StoredTokens::default()),
            Ok(bytes) => Ok(serde_json::from_slice(&bytes)?),
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(StoredTokens::default()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }

    fn write(&self, tokens: &StoredTokens) -> Result<(), StoreError> {
        let io_err = |source| StoreError::Io {
            path: self.path.clone(),
            source,
        };

        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(io_err)?;
        }

        // Write-then-rename so a reader never sees a half-written file
        let tmp = self.path.with_extension("json.tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(tokens)?).map_err(io_err)?;
        restrict_permissions(&tmp).map_err(io_err)?;
        fs::rename(&tmp, &self.path).map_err(io_err)?;
        Ok(())
    }
}

#[cfg(unix)]
fn restrict_permissions(path: &Path) -> io::Result<()> {
    use std::os::unix::fs::PermissionsExt;
    fs::set_permissions(path, fs::Permissions::from_mode(0o600))
}

#[cfg(not(unix))]
fn restrict_permissions(_path: &Path) -> io::Result<()> {
    Ok(())
}

impl TokenStore for FileTokenStore {
    fn set(&self, access_token: &str, refresh_token: &str) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        let issued = StoredTokens::issue(access_token, refresh_token, self.ttl, (self.clock)());
        self.write(&issued)?;
        debug!(path = %self.path.display(), "Stored session tokens");
        Ok(())
    }

    fn get(&self, kind: TokenKind) -> Option<String> {
        match self.load() {
            Ok(tokens) => tokens.read(kind, (self.clock)()),
            Err(err) => {
                warn!(error = %err, key = kind.storage_key(), "Failed to read token file");
                None
            }
        }
    }

    fn clear(&self) -> Result<(), StoreError> {
        let _guard = self.write_lock.lock().unwrap_or_else(PoisonError::into_inner);
        match fs::remove_file(&self.path) {
            Ok(()) => {
                debug!(path = %self.path.display(), "Cleared session tokens");
                Ok(())
            }
            Err(err) if err.kind() == io::ErrorKind::NotFound => Ok(()),
            Err(source) => Err(StoreError::Io {
                path: self.path.clone(),
                source,
            }),
        }
    }
}
