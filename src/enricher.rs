//! Email enrichment: validation plus the fixed resolver sequence
//!
//! Per address: person name, domain type, university, company, then sector.
//! Only a malformed address produces a failure; every other problem degrades
//! to sentinel values inside a normal record.

use crate::company::CompanyResolver;
use crate::config::AppConfig;
use crate::domain_type::DomainTypeClassifier;
use crate::email::EmailAddress;
use crate::embedding::WordVectors;
use crate::known_domains::KnownDomains;
use crate::page_fetcher::PageFetcher;
use crate::person_name::{parse_username, PersonNameResolver};
use crate::sector::{SectorLabel, SectorLookup};
use crate::university::{ConfidenceTier, UniversityResolver};
use crate::web_source::WebSource;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

/// Placeholder for a field with no answer
pub const NOT_AVAILABLE: &str = "N/A";

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ConfidenceBundle {
    pub domain: ConfidenceTier,
    pub university: ConfidenceTier,
    pub company: ConfidenceTier,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentRecord {
    pub email: String,
    pub email_domain: String,
    pub domain_type: String,
    pub likely_person: String,
    pub related_university: String,
    pub university_domain: String,
    pub related_company: String,
    pub company_domain: String,
    pub sector: SectorLabel,
    pub confidence: ConfidenceBundle,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EnrichmentFailure {
    pub email: String,
    pub error: String,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum EnrichmentOutcome {
    Record(EnrichmentRecord),
    Failure(EnrichmentFailure),
}

impl EnrichmentOutcome {
    pub fn email(&self) -> &str {
        match self {
            EnrichmentOutcome::Record(record) => &record.email,
            EnrichmentOutcome::Failure(failure) => &failure.email,
        }
    }

    pub fn is_failure(&self) -> bool {
        matches!(self, EnrichmentOutcome::Failure(_))
    }
}

/// Breakdown of how a name was (or was not) found
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NameDebug {
    pub original_email: String,
    pub email_user: String,
    pub email_domain: Option<String>,
    pub extracted_name: Option<String>,
    pub from_username_only: Option<String>,
}

fn or_sentinel(value: Option<String>) -> String {
    value.unwrap_or_else(|| NOT_AVAILABLE.to_string())
}

pub struct Enricher {
    names: PersonNameResolver,
    domain_types: DomainTypeClassifier,
    universities: UniversityResolver,
    companies: CompanyResolver,
    sectors: SectorLookup,
}

impl Enricher {
    pub fn new(config: &AppConfig, web: Arc<dyn WebSource>, vectors: Arc<WordVectors>) -> Self {
        let known = Arc::new(KnownDomains::with_overlays(&config.tables.dir));
        let fetcher = Arc::new(PageFetcher::new(web, config.search.max_snippets));

        Self {
            names: PersonNameResolver::new(
                fetcher.clone(),
                config.names.pages.clone(),
                config.names.memo_capacity,
            ),
            domain_types: DomainTypeClassifier::new(
                fetcher.clone(),
                known.clone(),
                vectors,
                config.embedding.threshold,
                &config.cache.domain_type_path(),
            ),
            universities: UniversityResolver::new(fetcher.clone(), known.clone(), &config.cache.university_path()),
            companies: CompanyResolver::new(fetcher.clone(), known),
            sectors: SectorLookup::new(fetcher, config.cache.sector_capacity),
        }
    }

    pub fn domain_types(&self) -> &DomainTypeClassifier {
        &self.domain_types
    }

    pub fn universities(&self) -> &UniversityResolver {
        &self.universities
    }

    pub async fn enrich(&self, raw: &str) -> EnrichmentOutcome {
        let email = match EmailAddress::parse(raw) {
            Ok(email) => email,
            Err(e) => {
                debug!("Rejected '{}': {}", raw, e);
                return EnrichmentOutcome::Failure(EnrichmentFailure {
                    email: raw.to_string(),
                    error: e.to_string(),
                });
            }
        };
        let domain = email.domain();

        let likely_person = self.names.resolve(&email.normalized()).await;
        let domain_type = self.domain_types.classify(domain).await;
        let university = self.universities.resolve(domain).await;
        let company = self.companies.resolve(domain).await;

        let sector = if let Some(sector) = company.sector {
            sector
        } else if company.page_loaded {
            // The homepage and its sector search both came up empty
            SectorLabel::Unknown
        } else if let Some(company_domain) = &company.domain {
            self.sectors.sector_for_domain(company_domain).await
        } else if university.domain.is_some() {
            SectorLabel::Education
        } else {
            SectorLabel::Unknown
        };

        info!("Enriched {} as {} ({})", email, domain_type.domain_type, sector);

        EnrichmentOutcome::Record(EnrichmentRecord {
            email: raw.to_string(),
            email_domain: domain.to_string(),
            domain_type: domain_type.label(),
            likely_person: or_sentinel(likely_person),
            related_university: or_sentinel(university.name),
            university_domain: or_sentinel(university.domain),
            related_company: or_sentinel(company.name),
            company_domain: or_sentinel(company.domain),
            sector,
            confidence: ConfidenceBundle {
                domain: ConfidenceTier::High,
                university: university.confidence,
                company: company.confidence,
            },
        })
    }

    /// Enrich each address in input order, one at a time
    pub async fn enrich_batch(&self, emails: &[String]) -> Vec<EnrichmentOutcome> {
        let mut results = Vec::with_capacity(emails.len());
        for email in emails {
            results.push(self.enrich(email).await);
        }
        results
    }

    /// Name extraction for one address, with the username-only parse alongside
    pub async fn explain_name(&self, email: &str) -> NameDebug {
        let lower = email.trim().to_lowercase();
        let (user, domain) = match lower.split_once('@') {
            Some((user, domain)) => (user.to_string(), Some(domain.to_string())),
            None => (lower.clone(), None),
        };

        NameDebug {
            original_email: email.to_string(),
            from_username_only: parse_username(&user),
            extracted_name: self.names.resolve(&lower).await,
            email_user: user,
            email_domain: domain,
        }
    }
}
