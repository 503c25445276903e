//! Email address validation and decomposition

use crate::error::EnrichError;
use once_cell::sync::Lazy;
use regex::Regex;

static EMAIL_SHAPE: Lazy<Regex> = Lazy::new(|| {
    Regex::new(r"^[^@\s]+@[^@\s]+\.[^@\s]+$").expect("email shape regex is valid")
});

/// A validated `local@domain` address
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EmailAddress {
    original: String,
    local_part: String,
    domain: String,
}

impl EmailAddress {
    /// Parse and validate an address. Processing fields are lower-cased,
    /// the original casing is kept for display.
    pub fn parse(raw: &str) -> Result<Self, EnrichError> {
        let trimmed = raw.trim();
        if !EMAIL_SHAPE.is_match(trimmed) {
            return Err(EnrichError::invalid_email());
        }

        let lower = trimmed.to_lowercase();
        let (local_part, domain) = lower.split_once('@').ok_or_else(EnrichError::invalid_email)?;

        if local_part.is_empty() || !domain.contains('.') {
            return Err(EnrichError::invalid_email());
        }

        Ok(Self {
            original: trimmed.to_string(),
            local_part: local_part.to_string(),
            domain: domain.to_string(),
        })
    }

    pub fn original(&self) -> &str {
        &self.original
    }

    pub fn local_part(&self) -> &str {
        &self.local_part
    }

    pub fn domain(&self) -> &str {
        &self.domain
    }

    /// Lower-cased `local@domain`
    pub fn normalized(&self) -> String {
        format!("{}@{}", self.local_part, self.domain)
    }
}

impl std::fmt::Display for EmailAddress {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.original)
    }
}
