//! Coarse domain classification: free webmail, university or company
//!
//! Precedence (first answer wins):
//! 1. Persistent cache
//! 2. Free webmail table (1.0)
//! 3. Page signals: education sector or "university" in the site name (0.9),
//!    any other known sector (0.8)
//! 4. Academic suffix or keyword in the domain (0.7)
//! 5. Word-vector similarity to institution keywords (0.75, else company 0.6)
//!
//! Every computed verdict is cached, including fallback guesses.

use crate::domain_utils::normalize_domain;
use crate::embedding::WordVectors;
use crate::known_domains::KnownDomains;
use crate::page_fetcher::PageFetcher;
use crate::sector::SectorLabel;
use crate::store::JsonlStore;
use crate::strategy::first_success;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Suffixes that mark an academic domain outright
pub const ACADEMIC_SUFFIXES: &[&str] = &[".edu", ".edu.in", ".ac.in", ".ac.uk", ".ac.id", ".ac.jp", ".ac.nz"];

/// Institution keywords, used both as substrings and as embedding anchors
pub const INSTITUTION_KEYWORDS: &[&str] = &["university", "college", "institute", "school", "academy"];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum DomainType {
    FreeEmail,
    University,
    Company,
}

impl DomainType {
    pub fn as_str(&self) -> &'static str {
        match self {
            DomainType::FreeEmail => "free_email",
            DomainType::University => "university",
            DomainType::Company => "company",
        }
    }

    fn display_label(&self) -> &'static str {
        match self {
            DomainType::FreeEmail => "Free Webmail",
            DomainType::University => "University/Educational",
            DomainType::Company => "Company/Business",
        }
    }
}

impl std::fmt::Display for DomainType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached verdict for one normalized domain
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct DomainTypeRecord {
    pub domain: String,
    #[serde(rename = "type")]
    pub domain_type: DomainType,
    pub confidence: f32,
}

impl DomainTypeRecord {
    fn new(domain: &str, domain_type: DomainType, confidence: f32) -> Self {
        Self {
            domain: domain.to_string(),
            domain_type,
            confidence,
        }
    }

    /// `"University/Educational (90% confidence)"`
    pub fn label(&self) -> String {
        format!(
            "{} ({:.0}% confidence)",
            self.domain_type.display_label(),
            self.confidence * 100.0
        )
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DomainTypeStep {
    Cache,
    FreeEmail,
    PageSignals,
    AcademicRules,
    Similarity,
}

pub const DOMAIN_TYPE_STEPS: &[DomainTypeStep] = &[
    DomainTypeStep::Cache,
    DomainTypeStep::FreeEmail,
    DomainTypeStep::PageSignals,
    DomainTypeStep::AcademicRules,
    DomainTypeStep::Similarity,
];

/// Whether a domain ends with an academic suffix or contains an institution keyword
pub fn matches_academic_rules(domain: &str) -> bool {
    ACADEMIC_SUFFIXES.iter().any(|s| domain.ends_with(s))
        || INSTITUTION_KEYWORDS.iter().any(|k| domain.contains(k))
}

pub struct DomainTypeClassifier {
    fetcher: Arc<PageFetcher>,
    known: Arc<KnownDomains>,
    vectors: Arc<WordVectors>,
    similarity_threshold: f32,
    cache: JsonlStore<DomainTypeRecord>,
}

impl DomainTypeClassifier {
    pub fn new(
        fetcher: Arc<PageFetcher>,
        known: Arc<KnownDomains>,
        vectors: Arc<WordVectors>,
        similarity_threshold: f32,
        cache_path: &Path,
    ) -> Self {
        Self {
            fetcher,
            known,
            vectors,
            similarity_threshold,
            cache: JsonlStore::open(cache_path),
        }
    }

    pub fn cache(&self) -> &JsonlStore<DomainTypeRecord> {
        &self.cache
    }

    pub async fn classify(&self, domain: &str) -> DomainTypeRecord {
        let domain = normalize_domain(domain);

        let resolved = first_success(DOMAIN_TYPE_STEPS, |step| self.run_step(step, &domain)).await;
        let (step, record) = match resolved {
            Some(found) => found,
            // The similarity step always answers; keep a company guess as the floor
            None => (
                DomainTypeStep::Similarity,
                DomainTypeRecord::new(&domain, DomainType::Company, 0.6),
            ),
        };

        if step != DomainTypeStep::Cache {
            if let Err(e) = self.cache.insert(&domain, record.clone()) {
                warn!("Failed to cache domain type for {}: {:#}", domain, e);
            }
        }

        record
    }

    async fn run_step(&self, step: DomainTypeStep, domain: &str) -> Option<DomainTypeRecord> {
        match step {
            DomainTypeStep::Cache => self.cache.get(domain),
            DomainTypeStep::FreeEmail => self
                .known
                .is_free_email(domain)
                .then(|| DomainTypeRecord::new(domain, DomainType::FreeEmail, 1.0)),
            DomainTypeStep::PageSignals => self.page_signals(domain).await,
            DomainTypeStep::AcademicRules => matches_academic_rules(domain)
                .then(|| DomainTypeRecord::new(domain, DomainType::University, 0.7)),
            DomainTypeStep::Similarity => {
                let similarity = self.vectors.max_similarity(domain, INSTITUTION_KEYWORDS);
                Some(if similarity > self.similarity_threshold {
                    DomainTypeRecord::new(domain, DomainType::University, 0.75)
                } else {
                    DomainTypeRecord::new(domain, DomainType::Company, 0.6)
                })
            }
        }
    }

    async fn page_signals(&self, domain: &str) -> Option<DomainTypeRecord> {
        let info = self.fetcher.fetch_page_info(domain).await;
        // Only a scraped name counts; the domain fallback would echo the domain itself
        let name = info
            .fetch_succeeded
            .then(|| info.display_name())
            .unwrap_or_default()
            .to_lowercase();
        debug!("Page signals for {}: sector={:?}, name={}", domain, info.sector, name);

        match info.sector {
            Some(SectorLabel::Education) => Some(DomainTypeRecord::new(domain, DomainType::University, 0.9)),
            _ if name.contains("university") => Some(DomainTypeRecord::new(domain, DomainType::University, 0.9)),
            Some(_) => Some(DomainTypeRecord::new(domain, DomainType::Company, 0.8)),
            None => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_labels() {
        assert_eq!(
            DomainTypeRecord::new("gmail.com", DomainType::FreeEmail, 1.0).label(),
            "Free Webmail (100% confidence)"
        );
        assert_eq!(
            DomainTypeRecord::new("x.edu", DomainType::University, 0.75).label(),
            "University/Educational (75% confidence)"
        );
        assert_eq!(
            DomainTypeRecord::new("acme.com", DomainType::Company, 0.6).label(),
            "Company/Business (60% confidence)"
        );
    }

    #[test]
    fn test_record_serialization() {
        let record = DomainTypeRecord::new("gmail.com", DomainType::FreeEmail, 1.0);
        let json = serde_json::to_value(&record).unwrap();
        assert_eq!(json["type"], "free_email");
        assert_eq!(json["confidence"], 1.0);
    }

    #[test]
    fn test_academic_rules() {
        assert!(matches_academic_rules("cs.stateu.edu"));
        assert!(matches_academic_rules("iitd.ac.in"));
        assert!(matches_academic_rules("cityschool.org"));
        assert!(!matches_academic_rules("acme.com"));
        // ".edu" must be a suffix
        assert!(!matches_academic_rules("edu.acme.com"));
    }

    #[test]
    fn test_step_order() {
        assert_eq!(DOMAIN_TYPE_STEPS.first(), Some(&DomainTypeStep::Cache));
        assert_eq!(DOMAIN_TYPE_STEPS.last(), Some(&DomainTypeStep::Similarity));
    }
}
