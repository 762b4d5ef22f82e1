//! Studio booking HTTP client
//!
//! This crate owns the authenticated API-access layer used by every studio
//! front end: token storage, bearer attachment, single-flight token refresh
//! with request replay, and the session facade built on top of them.

#[cfg(feature = "client")]
pub mod client;

#[cfg(feature = "client")]
pub use client::{
    ClientConfig, ClientError, LoginRedirect, RefreshError, Session, StudioClient,
    StudioClientBuilder, TokenKind, TokenStore, TokenTtl,
};

pub use studio_core::types;
