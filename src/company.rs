//! Company resolution for a non-webmail, non-academic domain

use crate::domain_utils::{dot_count, normalize_domain, registrable_label, title_case};
use crate::known_domains::KnownDomains;
use crate::page_fetcher::PageFetcher;
use crate::sector::SectorLabel;
use crate::university::ConfidenceTier;
use std::sync::Arc;
use tracing::debug;

/// Substrings that hand a domain to the university resolver instead
const EDUCATION_MARKERS: &[&str] = &["edu", ".ac", "university"];

/// Domains with more dots than this are treated as unreliable subdomains
const MAX_RELIABLE_DOTS: usize = 2;

#[derive(Debug, Clone, PartialEq)]
pub struct CompanyMatch {
    pub name: Option<String>,
    pub domain: Option<String>,
    pub confidence: ConfidenceTier,
    pub sector: Option<SectorLabel>,
    /// The homepage loaded, so its sector lookup already ran
    pub page_loaded: bool,
}

impl CompanyMatch {
    fn none() -> Self {
        Self {
            name: None,
            domain: None,
            confidence: ConfidenceTier::Low,
            sector: None,
            page_loaded: false,
        }
    }
}

/// Title-cased registrable label (`acme-corp.co.uk` -> `Acme Corp`)
pub fn fallback_company_name(domain: &str) -> String {
    title_case(&registrable_label(domain).replace('-', " "))
}

pub struct CompanyResolver {
    fetcher: Arc<PageFetcher>,
    known: Arc<KnownDomains>,
}

impl CompanyResolver {
    pub fn new(fetcher: Arc<PageFetcher>, known: Arc<KnownDomains>) -> Self {
        Self { fetcher, known }
    }

    /// Whether company resolution is skipped outright for this domain
    pub fn is_excluded(&self, domain: &str) -> bool {
        self.known.is_free_email(domain) || EDUCATION_MARKERS.iter().any(|m| domain.contains(m))
    }

    pub async fn resolve(&self, domain: &str) -> CompanyMatch {
        let domain = normalize_domain(domain);
        if self.is_excluded(&domain) {
            debug!("Skipping company resolution for {}", domain);
            return CompanyMatch::none();
        }

        let fallback_name = fallback_company_name(&domain);
        let info = self.fetcher.fetch_page_info(&domain).await;

        if !info.fetch_succeeded {
            return CompanyMatch {
                name: Some(fallback_name),
                domain: Some(domain),
                confidence: ConfidenceTier::Medium,
                sector: None,
                page_loaded: false,
            };
        }

        let mut confidence = if info.company_name.is_some() {
            ConfidenceTier::High
        } else {
            ConfidenceTier::Medium
        };
        if dot_count(&domain) > MAX_RELIABLE_DOTS {
            confidence = ConfidenceTier::Low;
        }

        CompanyMatch {
            name: Some(info.company_name.unwrap_or(fallback_name)),
            domain: Some(domain),
            confidence,
            sector: info.sector,
            page_loaded: true,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_fallback_company_name() {
        assert_eq!(fallback_company_name("acme-corp.com"), "Acme Corp");
        assert_eq!(fallback_company_name("mail.globex.co.uk"), "Globex");
        assert_eq!(fallback_company_name("initech.io"), "Initech");
    }
}
