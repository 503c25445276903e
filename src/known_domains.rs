//! Curated domain tables: free webmail providers and known universities
//!
//! Built-in entries can be extended (or overridden) by JSON overlays in the
//! config directory:
//! - `known_universities.json`
//! - `free_email_domains.json`
//!
//! Both use `{"version": "...", "domains": {"<domain>": "<label>"}}`.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::path::Path;
use tracing::{debug, warn};

pub const UNIVERSITIES_OVERLAY: &str = "known_universities.json";
pub const FREE_EMAIL_OVERLAY: &str = "free_email_domains.json";

const FREE_EMAIL_PROVIDERS: &[(&str, &str)] = &[
    ("gmail.com", "Free webmail (Google)"),
    ("yahoo.com", "Free webmail (Yahoo)"),
    ("outlook.com", "Free webmail (Microsoft)"),
    ("hotmail.com", "Free webmail (Microsoft)"),
    ("aol.com", "Free webmail (AOL)"),
    ("protonmail.com", "Free webmail (ProtonMail)"),
    ("icloud.com", "Free webmail (Apple)"),
    ("mail.com", "Free webmail"),
];

const KNOWN_UNIVERSITIES: &[(&str, &str)] = &[
    ("iitjammu.ac.in", "Indian Institute of Technology Jammu (IIT Jammu)"),
    ("iitd.ac.in", "Indian Institute of Technology Delhi (IIT Delhi)"),
    ("iitb.ac.in", "Indian Institute of Technology Bombay (IIT Bombay)"),
    ("iitkgp.ac.in", "Indian Institute of Technology Kharagpur (IIT Kharagpur)"),
    ("iitm.ac.in", "Indian Institute of Technology Madras (IIT Madras)"),
    ("iitk.ac.in", "Indian Institute of Technology Kanpur (IIT Kanpur)"),
    ("iitg.ac.in", "Indian Institute of Technology Guwahati (IIT Guwahati)"),
    ("iitr.ac.in", "Indian Institute of Technology Roorkee (IIT Roorkee)"),
    ("iitbhu.ac.in", "Indian Institute of Technology Varanasi (IIT BHU)"),
    ("berkeley.edu", "University of California, Berkeley"),
    ("mit.edu", "Massachusetts Institute of Technology"),
    ("stanford.edu", "Stanford University"),
    ("harvard.edu", "Harvard University"),
    ("oxford.ac.uk", "University of Oxford"),
    ("cam.ac.uk", "University of Cambridge"),
];

/// Overlay file structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct DomainTableFile {
    #[serde(default)]
    pub version: String,
    pub domains: HashMap<String, String>,
}

#[derive(Debug, Clone)]
pub struct KnownDomains {
    free_email: HashMap<String, String>,
    universities: HashMap<String, String>,
}

impl Default for KnownDomains {
    fn default() -> Self {
        Self::builtin()
    }
}

impl KnownDomains {
    /// Built-in tables only
    pub fn builtin() -> Self {
        Self {
            free_email: to_map(FREE_EMAIL_PROVIDERS),
            universities: to_map(KNOWN_UNIVERSITIES),
        }
    }

    /// Built-in tables plus any overlay files present in `config_dir`.
    /// A malformed overlay is logged and ignored.
    pub fn with_overlays(config_dir: &Path) -> Self {
        let mut known = Self::builtin();

        for (file, table) in [
            (UNIVERSITIES_OVERLAY, &mut known.universities),
            (FREE_EMAIL_OVERLAY, &mut known.free_email),
        ] {
            let path = config_dir.join(file);
            if !path.exists() {
                continue;
            }
            match load_overlay(&path) {
                Ok(overlay) => {
                    debug!("Loaded {} entries from {}", overlay.domains.len(), path.display());
                    for (domain, label) in overlay.domains {
                        table.insert(domain.trim().to_lowercase(), label);
                    }
                }
                Err(e) => warn!("Ignoring domain table overlay: {:#}", e),
            }
        }

        known
    }

    /// Provider label for a free webmail domain
    pub fn free_email_provider(&self, domain: &str) -> Option<&str> {
        self.free_email.get(domain).map(String::as_str)
    }

    pub fn is_free_email(&self, domain: &str) -> bool {
        self.free_email.contains_key(domain)
    }

    /// Official name of a curated university domain
    pub fn university_name(&self, domain: &str) -> Option<&str> {
        self.universities.get(domain).map(String::as_str)
    }

    pub fn university_count(&self) -> usize {
        self.universities.len()
    }
}

fn to_map(entries: &[(&str, &str)]) -> HashMap<String, String> {
    entries
        .iter()
        .map(|(domain, label)| (domain.to_string(), label.to_string()))
        .collect()
}

fn load_overlay(path: &Path) -> Result<DomainTableFile> {
    let content = std::fs::read_to_string(path)
        .with_context(|| format!("Failed to read {}", path.display()))?;
    serde_json::from_str(&content).with_context(|| format!("Failed to parse {}", path.display()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_builtin_tables() {
        let known = KnownDomains::builtin();
        assert_eq!(known.free_email_provider("gmail.com"), Some("Free webmail (Google)"));
        assert!(known.is_free_email("icloud.com"));
        assert!(!known.is_free_email("acme.com"));
        assert_eq!(known.university_name("berkeley.edu"), Some("University of California, Berkeley"));
        assert_eq!(known.university_name("iitd.ac.in"), Some("Indian Institute of Technology Delhi (IIT Delhi)"));
        assert_eq!(known.university_name("example.edu"), None);
    }

    #[test]
    fn test_overlays_extend_and_override() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(
            temp_dir.path().join(UNIVERSITIES_OVERLAY),
            r#"{"version": "1", "domains": {"Example.EDU": "Example University", "mit.edu": "MIT"}}"#,
        )
        .unwrap();
        std::fs::write(
            temp_dir.path().join(FREE_EMAIL_OVERLAY),
            r#"{"domains": {"fastmail.com": "Free webmail (Fastmail)"}}"#,
        )
        .unwrap();

        let known = KnownDomains::with_overlays(temp_dir.path());
        assert_eq!(known.university_name("example.edu"), Some("Example University"));
        assert_eq!(known.university_name("mit.edu"), Some("MIT"));
        assert!(known.is_free_email("fastmail.com"));
        assert!(known.is_free_email("gmail.com"));
    }

    #[test]
    fn test_malformed_overlay_is_ignored() {
        let temp_dir = TempDir::new().unwrap();
        std::fs::write(temp_dir.path().join(UNIVERSITIES_OVERLAY), "{ not json").unwrap();

        let known = KnownDomains::with_overlays(temp_dir.path());
        assert_eq!(known.university_count(), KNOWN_UNIVERSITIES.len());
    }
}
