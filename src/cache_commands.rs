//! Cache management commands for the emailenrich CLI
//!
//! Lists, shows and clears entries of the two persistent verdict stores
//! (domain type and university).

use crate::config::CacheConfig;
use crate::domain_type::DomainTypeRecord;
use crate::domain_utils::normalize_domain;
use crate::store::JsonlStore;
use crate::university::UniversityRecord;
use anyhow::Result;
use std::collections::BTreeSet;

/// Both persistent stores, opened from the cache configuration
pub struct CacheStores {
    pub domain_types: JsonlStore<DomainTypeRecord>,
    pub universities: JsonlStore<UniversityRecord>,
}

/// One domain's cached verdicts
#[derive(Debug, Clone, PartialEq)]
pub struct CacheRow {
    pub domain: String,
    pub domain_type: Option<DomainTypeRecord>,
    pub university: Option<UniversityRecord>,
}

impl CacheStores {
    pub fn open(config: &CacheConfig) -> Self {
        Self {
            domain_types: JsonlStore::open(&config.domain_type_path()),
            universities: JsonlStore::open(&config.university_path()),
        }
    }

    /// Every cached domain, sorted, with whatever each store knows about it
    pub fn rows(&self) -> Vec<CacheRow> {
        let domains: BTreeSet<String> = self
            .domain_types
            .keys()
            .into_iter()
            .chain(self.universities.keys())
            .collect();

        domains.into_iter().map(|domain| self.row(&domain)).collect()
    }

    pub fn row(&self, domain: &str) -> CacheRow {
        CacheRow {
            domain: domain.to_string(),
            domain_type: self.domain_types.get(domain),
            university: self.universities.get(domain),
        }
    }

    /// Remove a domain from both stores; returns how many entries were dropped
    pub fn clear_domain(&self, domain: &str) -> Result<usize> {
        let mut removed = 0;
        if self.domain_types.remove(domain)? {
            removed += 1;
        }
        if self.universities.remove(domain)? {
            removed += 1;
        }
        Ok(removed)
    }

    pub fn clear_all(&self) -> Result<usize> {
        Ok(self.domain_types.clear()? + self.universities.clear()?)
    }
}

fn university_summary(record: &Option<UniversityRecord>) -> String {
    match record {
        Some(UniversityRecord { name: Some(name), confidence, .. }) => format!("{} ({})", name, confidence),
        Some(UniversityRecord { name: None, .. }) => "not a university".to_string(),
        None => "-".to_string(),
    }
}

/// List all cached domains
pub fn list_cached_domains(config: &CacheConfig) -> Result<()> {
    let stores = CacheStores::open(config);
    let rows = stores.rows();

    if rows.is_empty() {
        println!("No cached domains found in {}.", config.dir.display());
        return Ok(());
    }

    println!("Cached Domains ({} total):", rows.len());
    println!("{}", "=".repeat(80));
    println!("{:<32} {:<36} University", "Domain", "Domain Type");
    println!("{}", "-".repeat(80));

    for row in rows {
        let domain_type = row
            .domain_type
            .as_ref()
            .map(|r| r.label())
            .unwrap_or_else(|| "-".to_string());
        println!("{:<32} {:<36} {}", row.domain, domain_type, university_summary(&row.university));
    }

    Ok(())
}

/// Show cached verdicts for a specific domain
pub fn show_cache_entry(config: &CacheConfig, domain: &str) -> Result<()> {
    let domain = normalize_domain(domain);
    let row = CacheStores::open(config).row(&domain);

    if row.domain_type.is_none() && row.university.is_none() {
        println!("No cache entry for: {}", domain);
        return Ok(());
    }

    println!("Cache Entry for: {}", domain);
    println!("{}", "=".repeat(60));
    if let Some(record) = &row.domain_type {
        println!("Domain Type: {} [{}]", record.label(), record.domain_type);
    }
    println!("University: {}", university_summary(&row.university));

    Ok(())
}

/// Clear cached verdicts for one domain
pub fn clear_domain_cache(config: &CacheConfig, domain: &str) -> Result<()> {
    let domain = normalize_domain(domain);
    let removed = CacheStores::open(config).clear_domain(&domain)?;

    if removed == 0 {
        println!("No cache entry for: {}", domain);
    } else {
        println!("Cleared {} cache entries for: {}", removed, domain);
    }
    Ok(())
}

/// Clear both stores
pub fn clear_all_cache(config: &CacheConfig) -> Result<()> {
    let removed = CacheStores::open(config).clear_all()?;
    println!("Cleared {} cache entries.", removed);
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain_type::DomainType;
    use crate::university::ConfidenceTier;
    use tempfile::TempDir;

    fn config(dir: &TempDir) -> CacheConfig {
        CacheConfig {
            dir: dir.path().to_path_buf(),
            domain_type_file: "domain_cache.jsonl".to_string(),
            university_file: "university_cache.jsonl".to_string(),
            sector_capacity: 16,
        }
    }

    fn seed(stores: &CacheStores) {
        stores
            .domain_types
            .insert(
                "acme.com",
                DomainTypeRecord {
                    domain: "acme.com".to_string(),
                    domain_type: DomainType::Company,
                    confidence: 0.8,
                },
            )
            .unwrap();
        stores
            .universities
            .insert(
                "acme.com",
                UniversityRecord {
                    domain: "acme.com".to_string(),
                    name: None,
                    confidence: ConfidenceTier::Low,
                },
            )
            .unwrap();
        stores
            .universities
            .insert(
                "mit.edu",
                UniversityRecord {
                    domain: "mit.edu".to_string(),
                    name: Some("Massachusetts Institute of Technology".to_string()),
                    confidence: ConfidenceTier::High,
                },
            )
            .unwrap();
    }

    #[test]
    fn test_rows_merge_both_stores() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        seed(&CacheStores::open(&config));

        let rows = CacheStores::open(&config).rows();
        assert_eq!(rows.len(), 2);
        assert_eq!(rows[0].domain, "acme.com");
        assert!(rows[0].domain_type.is_some());
        assert_eq!(rows[1].domain, "mit.edu");
        assert!(rows[1].domain_type.is_none());
        assert_eq!(
            university_summary(&rows[1].university),
            "Massachusetts Institute of Technology (High)"
        );
        assert_eq!(university_summary(&rows[0].university), "not a university");
    }

    #[test]
    fn test_clear_domain_and_all() {
        let dir = TempDir::new().unwrap();
        let config = config(&dir);
        let stores = CacheStores::open(&config);
        seed(&stores);

        assert_eq!(stores.clear_domain("acme.com").unwrap(), 2);
        assert_eq!(stores.clear_domain("acme.com").unwrap(), 0);
        assert_eq!(stores.clear_all().unwrap(), 1);
        assert!(CacheStores::open(&config).rows().is_empty());
    }
}
