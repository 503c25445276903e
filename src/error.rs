//! Error taxonomy for the enrichment pipeline
//!
//! Only [`EnrichError::Validation`] ever crosses the `Enricher` boundary.
//! Fetch, parse and cache-read failures are recovered inside the component
//! that hit them by falling back to a weaker signal.

use std::path::PathBuf;
use thiserror::Error;

/// Message surfaced for a malformed email address
pub const INVALID_EMAIL: &str = "Invalid email format";

/// Failure category for a network fetch
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FetchErrorKind {
    Timeout,
    Connect,
    Status(u16),
    Body,
    Other,
}

impl std::fmt::Display for FetchErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            FetchErrorKind::Timeout => write!(f, "timeout"),
            FetchErrorKind::Connect => write!(f, "connect"),
            FetchErrorKind::Status(code) => write!(f, "status_{}", code),
            FetchErrorKind::Body => write!(f, "body"),
            FetchErrorKind::Other => write!(f, "other"),
        }
    }
}

#[derive(Error, Debug)]
pub enum EnrichError {
    #[error("{0}")]
    Validation(String),

    #[error("Fetch failed ({kind}): {message}")]
    Fetch {
        kind: FetchErrorKind,
        message: String,
    },

    #[error("Failed to parse content: {0}")]
    Parse(String),

    #[error("Failed to read cache {path}: {message}")]
    CacheRead { path: PathBuf, message: String },
}

impl EnrichError {
    pub fn invalid_email() -> Self {
        EnrichError::Validation(INVALID_EMAIL.to_string())
    }

    pub fn fetch(kind: FetchErrorKind, message: impl Into<String>) -> Self {
        EnrichError::Fetch {
            kind,
            message: message.into(),
        }
    }

    /// Fetch failure category, if this is a fetch error
    pub fn fetch_kind(&self) -> Option<FetchErrorKind> {
        match self {
            EnrichError::Fetch { kind, .. } => Some(*kind),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for EnrichError {
    fn from(e: reqwest::Error) -> Self {
        let kind = if e.is_timeout() {
            FetchErrorKind::Timeout
        } else if e.is_connect() {
            FetchErrorKind::Connect
        } else if let Some(status) = e.status() {
            FetchErrorKind::Status(status.as_u16())
        } else if e.is_body() || e.is_decode() {
            FetchErrorKind::Body
        } else {
            FetchErrorKind::Other
        };
        EnrichError::fetch(kind, e.to_string())
    }
}
