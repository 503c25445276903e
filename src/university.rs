//! Educational-institution resolution for an email domain

use crate::domain_utils::normalize_domain;
use crate::known_domains::KnownDomains;
use crate::page_fetcher::PageFetcher;
use crate::store::JsonlStore;
use crate::strategy::first_success;
use once_cell::sync::Lazy;
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::sync::Arc;
use tracing::{debug, warn};

/// Substrings that mark a domain as an institution (weak evidence)
const UNIVERSITY_DOMAIN_KEYWORDS: &[&str] = &[
    "university", "college", "institute", "school", "academy", "edu", "ac.in", "ac.uk", "ac.id",
    "ac.jp", "ac.nz", ".edu",
];

/// Page words that make the institution check worth running
const EDUCATION_PAGE_KEYWORDS: &[&str] = &[
    "university", "college", "institute", "campus", "faculty", "admissions", "research", "students",
];

/// Only this much markup is scanned for education keywords
const MARKUP_SCAN_LIMIT: usize = 5000;

static UNIVERSITY_OF: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(?i)university\s+of\s+[A-Z][a-z]+").expect("university regex is valid"));

/// Qualitative trust label for a university or company guess
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ConfidenceTier {
    High,
    Medium,
    Low,
}

impl ConfidenceTier {
    pub fn as_str(&self) -> &'static str {
        match self {
            ConfidenceTier::High => "High",
            ConfidenceTier::Medium => "Medium",
            ConfidenceTier::Low => "Low",
        }
    }
}

impl std::fmt::Display for ConfidenceTier {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Cached verdict; `name == None` records a confirmed non-university
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UniversityRecord {
    pub domain: String,
    pub name: Option<String>,
    pub confidence: ConfidenceTier,
}

/// Resolver answer for one domain
#[derive(Debug, Clone, PartialEq)]
pub struct UniversityMatch {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub confidence: ConfidenceTier,
}

impl From<UniversityRecord> for UniversityMatch {
    fn from(record: UniversityRecord) -> Self {
        let domain = record.name.as_ref().map(|_| record.domain.clone());
        Self {
            name: record.name,
            domain,
            confidence: record.confidence,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum UniversityStep {
    Cache,
    KnownTable,
    AcademicSuffix,
    DomainKeyword,
    PageEvidence,
}

pub const UNIVERSITY_STEPS: &[UniversityStep] = &[
    UniversityStep::Cache,
    UniversityStep::KnownTable,
    UniversityStep::AcademicSuffix,
    UniversityStep::DomainKeyword,
    UniversityStep::PageEvidence,
];

/// Synthesized display name for a rule-based match
fn synthesized_name(domain: &str) -> String {
    format!("University ({})", domain)
}

/// Confidence from homepage content, `None` when the page shows no education signal
pub fn page_evidence(title: &str, description: &str, markup: &str) -> Option<ConfidenceTier> {
    let head: String = markup.chars().take(MARKUP_SCAN_LIMIT).collect();
    let combined = format!("{} {} {}", title, description, head).to_lowercase();
    if !EDUCATION_PAGE_KEYWORDS.iter().any(|k| combined.contains(k)) {
        return None;
    }

    let structured = markup.replace(' ', "").contains(r#""@type":"CollegeOrUniversity""#);
    if UNIVERSITY_OF.is_match(markup) || structured {
        Some(ConfidenceTier::High)
    } else {
        Some(ConfidenceTier::Medium)
    }
}

pub struct UniversityResolver {
    fetcher: Arc<PageFetcher>,
    known: Arc<KnownDomains>,
    cache: JsonlStore<UniversityRecord>,
}

impl UniversityResolver {
    pub fn new(fetcher: Arc<PageFetcher>, known: Arc<KnownDomains>, cache_path: &Path) -> Self {
        Self {
            fetcher,
            known,
            cache: JsonlStore::open(cache_path),
        }
    }

    pub fn cache(&self) -> &JsonlStore<UniversityRecord> {
        &self.cache
    }

    pub async fn resolve(&self, domain: &str) -> UniversityMatch {
        let domain = normalize_domain(domain);

        // Webmail providers are never institutions and are never scraped
        if self.known.is_free_email(&domain) {
            return UniversityMatch {
                name: None,
                domain: None,
                confidence: ConfidenceTier::Low,
            };
        }

        let resolved = first_success(UNIVERSITY_STEPS, |step| self.run_step(step, &domain)).await;
        let (step, record) = resolved.unwrap_or_else(|| {
            debug!("{} is not a university", domain);
            (
                UniversityStep::PageEvidence,
                UniversityRecord {
                    domain: domain.clone(),
                    name: None,
                    confidence: ConfidenceTier::Low,
                },
            )
        });

        if step != UniversityStep::Cache {
            if let Err(e) = self.cache.insert(&domain, record.clone()) {
                warn!("Failed to cache university verdict for {}: {:#}", domain, e);
            }
        }

        record.into()
    }

    async fn run_step(&self, step: UniversityStep, domain: &str) -> Option<UniversityRecord> {
        let record = |name: String, confidence| UniversityRecord {
            domain: domain.to_string(),
            name: Some(name),
            confidence,
        };

        match step {
            UniversityStep::Cache => self.cache.get(domain),
            UniversityStep::KnownTable => self
                .known
                .university_name(domain)
                .map(|name| record(name.to_string(), ConfidenceTier::High)),
            UniversityStep::AcademicSuffix => (domain.contains(".ac.") || domain.contains(".edu"))
                .then(|| record(synthesized_name(domain), ConfidenceTier::Medium)),
            UniversityStep::DomainKeyword => UNIVERSITY_DOMAIN_KEYWORDS
                .iter()
                .any(|k| domain.contains(k))
                .then(|| record(synthesized_name(domain), ConfidenceTier::Low)),
            UniversityStep::PageEvidence => {
                let info = self.fetcher.fetch_page_info(domain).await;
                if !info.fetch_succeeded {
                    return None;
                }
                page_evidence(&info.title, &info.meta_description, &info.raw_markup)
                    .map(|tier| record(synthesized_name(domain), tier))
            }
        }
    }
}
