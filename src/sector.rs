//! Sector classification by keyword table
//!
//! The table is scanned in declaration order and the first sector with any
//! keyword substring match wins, so text matching both "bank" and
//! "software" resolves to Technology.

use crate::page_fetcher::PageFetcher;
use lru::LruCache;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;
use std::sync::Arc;
use tokio::sync::Mutex;
use tracing::debug;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum SectorLabel {
    Technology,
    Finance,
    Healthcare,
    Retail,
    Manufacturing,
    Consulting,
    Education,
    Media,
    Energy,
    #[serde(rename = "Real Estate")]
    RealEstate,
    Unknown,
}

impl SectorLabel {
    pub fn as_str(&self) -> &'static str {
        match self {
            SectorLabel::Technology => "Technology",
            SectorLabel::Finance => "Finance",
            SectorLabel::Healthcare => "Healthcare",
            SectorLabel::Retail => "Retail",
            SectorLabel::Manufacturing => "Manufacturing",
            SectorLabel::Consulting => "Consulting",
            SectorLabel::Education => "Education",
            SectorLabel::Media => "Media",
            SectorLabel::Energy => "Energy",
            SectorLabel::RealEstate => "Real Estate",
            SectorLabel::Unknown => "Unknown",
        }
    }

    pub fn is_known(&self) -> bool {
        *self != SectorLabel::Unknown
    }
}

impl std::fmt::Display for SectorLabel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Keyword table in tie-break order
pub const SECTOR_KEYWORDS: &[(SectorLabel, &[&str])] = &[
    (
        SectorLabel::Technology,
        &["software", "technology", "ai", "ml", "cloud", "saas", "fintech", "edtech", "devops", "digital", "app", "platform"],
    ),
    (SectorLabel::Finance, &["bank", "finance", "investment", "trading", "crypto", "insurance"]),
    (SectorLabel::Healthcare, &["health", "medical", "hospital", "pharma", "healthcare", "clinic"]),
    (SectorLabel::Retail, &["retail", "ecommerce", "shop", "store", "commerce"]),
    (SectorLabel::Manufacturing, &["manufacturing", "factory", "production", "industrial"]),
    (SectorLabel::Consulting, &["consulting", "consultant", "advisory", "services"]),
    (SectorLabel::Education, &["education", "school", "university", "training", "learning"]),
    (SectorLabel::Media, &["media", "publishing", "news", "content", "entertainment"]),
    (SectorLabel::Energy, &["energy", "oil", "gas", "renewable", "power"]),
    (SectorLabel::RealEstate, &["real estate", "property", "realty", "construction"]),
];

/// Map free text to the first sector whose keyword list matches
pub fn classify(text: &str) -> SectorLabel {
    let text = text.to_lowercase();
    SECTOR_KEYWORDS
        .iter()
        .find(|(_, keywords)| keywords.iter().any(|k| text.contains(k)))
        .map(|(sector, _)| *sector)
        .unwrap_or(SectorLabel::Unknown)
}

/// Sector of a company domain, via its scraped page, memoized in a bounded LRU
pub struct SectorLookup {
    fetcher: Arc<PageFetcher>,
    memo: Mutex<LruCache<String, SectorLabel>>,
}

impl SectorLookup {
    pub fn new(fetcher: Arc<PageFetcher>, capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            fetcher,
            memo: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub async fn sector_for_domain(&self, domain: &str) -> SectorLabel {
        if domain.is_empty() {
            return SectorLabel::Unknown;
        }

        if let Some(sector) = self.memo.lock().await.get(domain) {
            debug!("Sector memo hit for {}: {}", domain, sector);
            return *sector;
        }

        let info = self.fetcher.fetch_page_info(domain).await;
        let sector = info.sector.unwrap_or(SectorLabel::Unknown);
        self.memo.lock().await.put(domain.to_string(), sector);
        sector
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_classify_each_sector() {
        assert_eq!(classify("Enterprise SOFTWARE for teams"), SectorLabel::Technology);
        assert_eq!(classify("investment banking"), SectorLabel::Finance);
        assert_eq!(classify("A rural hospital"), SectorLabel::Healthcare);
        assert_eq!(classify("realty and property"), SectorLabel::RealEstate);
        assert_eq!(classify("renewable power"), SectorLabel::Energy);
        assert_eq!(classify("zzz qqq"), SectorLabel::Unknown);
        assert_eq!(classify(""), SectorLabel::Unknown);
    }

    #[test]
    fn test_tie_break_prefers_earlier_sector() {
        assert_eq!(classify("the bank builds software"), SectorLabel::Technology);
        assert_eq!(classify("school for bankers"), SectorLabel::Finance);
    }

    #[test]
    fn test_substring_matching() {
        // "ai" is a Technology keyword and matches inside other words
        assert_eq!(classify("email"), SectorLabel::Technology);
    }

    #[test]
    fn test_label_rendering() {
        assert_eq!(SectorLabel::RealEstate.to_string(), "Real Estate");
        assert_eq!(serde_json::to_string(&SectorLabel::RealEstate).unwrap(), "\"Real Estate\"");
        assert_eq!(serde_json::to_string(&SectorLabel::Unknown).unwrap(), "\"Unknown\"");
        assert!(!SectorLabel::Unknown.is_known());
    }
}
