//! Best-guess person name for an email address (or free text)
//!
//! Cheap local parsing of the username runs first. Only when that fails does
//! the resolver scrape the organization's site and, last, search snippets.

use crate::page_fetcher::{json_ld_names_in_html, normalize_url, visible_text, PageFetcher};
use crate::domain_utils::capitalize;
use crate::search::extract_link_text;
use crate::strategy::first_success;
use lru::LruCache;
use once_cell::sync::Lazy;
use regex::Regex;
use scraper::Html;
use std::collections::BTreeSet;
use std::num::NonZeroUsize;
use std::sync::{Arc, Mutex};
use tracing::debug;

const NAME_TITLES: &[&str] = &["Mr", "Mrs", "Ms", "Dr", "Prof", "Er", "Miss", "Mx", "Shri", "Smt", "Madam", "Sir"];

const ROLE_KEYWORDS: &[&str] = &[
    "CEO", "Founder", "Director", "Professor", "Manager", "Head", "President", "Chairman", "Lead",
    "Engineer", "Developer", "Researcher", "Scientist",
];

/// Page chrome that never holds staff names
const SKIPPED_ELEMENTS: &[&str] = &["script", "style", "nav", "footer"];

const BOILERPLATE: &[&str] = &["about us", "contact us", "privacy policy", "terms conditions"];

/// Entities longer than this many words are not names
const MAX_ENTITY_WORDS: usize = 4;

static TITLED_NAME: Lazy<Regex> = Lazy::new(|| {
    Regex::new(&format!(
        r"\b(?:{})\.?\s+[A-Z][a-z]+\s*[A-Z]?[a-z]*\b",
        NAME_TITLES.join("|")
    ))
    .expect("title regex is valid")
});

static ROLE_NAMES: Lazy<Vec<Regex>> = Lazy::new(|| {
    ROLE_KEYWORDS
        .iter()
        .map(|role| {
            Regex::new(&format!(
                r"(?i)(?:{}\s+[:\-–]?\s*)([A-Z][a-z]+(?:\s+[A-Z][a-z]+){{0,2}})",
                role
            ))
            .expect("role regex is valid")
        })
        .collect()
});

static CAPITALIZED_PAIR: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"\b[A-Z][a-z]{2,}\s+[A-Z][a-z]{2,}\b").expect("pair regex is valid"));

static USERNAME_SEPARATORS: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[._\-\d]+").expect("separator regex is valid"));

static NON_LETTERS: Lazy<Regex> = Lazy::new(|| Regex::new(r"[^A-Za-z\s]").expect("letter regex is valid"));

/// Pluggable named-entity recognizer; returns PERSON entity spans
pub trait EntityRecognizer: Send + Sync {
    fn person_entities(&self, text: &str) -> Vec<String>;
}

/// Name from an email username: `john.doe` -> `John Doe`, `jsmith` -> `Jsmith`
pub fn parse_username(username: &str) -> Option<String> {
    let lower = username.to_lowercase();
    let parts: Vec<&str> = USERNAME_SEPARATORS
        .split(&lower)
        .map(str::trim)
        .filter(|p| p.chars().count() > 1)
        .collect();

    match parts.as_slice() {
        [first, second, ..] => Some(format!("{} {}", capitalize(first), capitalize(second))),
        [only] if only.chars().count() > 2 => Some(capitalize(only)),
        _ => None,
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum NameStep {
    Username,
    UsernameText,
    SiteScrape,
    SearchSnippets,
}

pub const EMAIL_NAME_STEPS: &[NameStep] = &[
    NameStep::Username,
    NameStep::UsernameText,
    NameStep::SiteScrape,
    NameStep::SearchSnippets,
];

pub struct PersonNameResolver {
    fetcher: Arc<PageFetcher>,
    recognizer: Option<Arc<dyn EntityRecognizer>>,
    pages: Vec<String>,
    memo: Mutex<LruCache<String, Vec<String>>>,
}

impl PersonNameResolver {
    pub fn new(fetcher: Arc<PageFetcher>, pages: Vec<String>, memo_capacity: usize) -> Self {
        let capacity = NonZeroUsize::new(memo_capacity).unwrap_or(NonZeroUsize::MIN);
        Self {
            fetcher,
            recognizer: None,
            pages,
            memo: Mutex::new(LruCache::new(capacity)),
        }
    }

    pub fn with_recognizer(mut self, recognizer: Arc<dyn EntityRecognizer>) -> Self {
        self.recognizer = Some(recognizer);
        self
    }

    /// Best guess for an email address, free text or bare domain
    pub async fn resolve(&self, text: &str) -> Option<String> {
        let text = text.trim();
        if text.is_empty() {
            return None;
        }

        if let Some((username, domain)) = split_email(text) {
            return first_success(EMAIL_NAME_STEPS, |step| self.run_step(step, username, domain))
                .await
                .map(|(_, name)| name);
        }

        if let Some(name) = self.extract_names(text).into_iter().next() {
            return Some(name);
        }

        if text.contains('.') && !text.contains(' ') {
            if let Some(name) = self.names_from_site(text).await.into_iter().next() {
                return Some(name);
            }
            return self.names_from_search(text).await.into_iter().next();
        }

        None
    }

    async fn run_step(&self, step: NameStep, username: &str, domain: &str) -> Option<String> {
        match step {
            NameStep::Username => parse_username(username),
            NameStep::UsernameText => {
                let readable = username.replace(['.', '_', '-'], " ");
                self.extract_names(&readable).into_iter().next()
            }
            NameStep::SiteScrape => self.names_from_site(domain).await.into_iter().next(),
            NameStep::SearchSnippets => self.names_from_search(domain).await.into_iter().next(),
        }
    }

    /// Candidate names in `text`, sorted. Memoized per distinct input.
    pub fn extract_names(&self, text: &str) -> Vec<String> {
        if text.is_empty() {
            return Vec::new();
        }

        if let Some(cached) = self.lock_memo().get(text) {
            return cached.clone();
        }

        let names = self.extract_uncached(text);
        self.lock_memo().put(text.to_string(), names.clone());
        names
    }

    fn extract_uncached(&self, text: &str) -> Vec<String> {
        let mut raw: Vec<String> = Vec::new();

        if let Some(recognizer) = &self.recognizer {
            raw.extend(
                recognizer
                    .person_entities(text)
                    .into_iter()
                    .filter(|e| e.split_whitespace().count() <= MAX_ENTITY_WORDS),
            );
        }

        raw.extend(TITLED_NAME.find_iter(text).map(|m| m.as_str().to_string()));

        for pattern in ROLE_NAMES.iter() {
            raw.extend(
                pattern
                    .captures_iter(text)
                    .filter_map(|c| c.get(1))
                    .map(|m| m.as_str().to_string()),
            );
        }

        raw.extend(CAPITALIZED_PAIR.find_iter(text).map(|m| m.as_str().to_string()));

        clean_names(raw).into_iter().collect()
    }

    /// Names found across the configured site pages, sorted
    pub async fn names_from_site(&self, domain: &str) -> Vec<String> {
        let base = normalize_url(domain);
        let mut names = BTreeSet::new();

        for page in &self.pages {
            let url = format!("{}{}", base, page);
            let html = match self.fetcher.fetch_raw(&url).await {
                Ok(html) => html,
                Err(e) => {
                    debug!("Skipping {}: {}", url, e);
                    continue;
                }
            };

            let text = visible_text(&Html::parse_document(&html), SKIPPED_ELEMENTS);
            names.extend(self.extract_names(&text));
            names.extend(json_ld_names_in_html(&html, "Person"));
        }

        names.into_iter().collect()
    }

    /// Names mined from search results for the domain's leadership
    pub async fn names_from_search(&self, domain: &str) -> Vec<String> {
        let query = format!("{} team OR leadership OR founders", domain);
        match self.fetcher.web().search(&query).await {
            Ok(html) => self.extract_names(&extract_link_text(&html)),
            Err(e) => {
                debug!("Name search failed for {}: {}", domain, e);
                Vec::new()
            }
        }
    }

    fn lock_memo(&self) -> std::sync::MutexGuard<'_, LruCache<String, Vec<String>>> {
        self.memo.lock().unwrap_or_else(|poisoned| poisoned.into_inner())
    }
}

/// `(username, domain)` when `text` has the `user@domain` shape
fn split_email(text: &str) -> Option<(&str, &str)> {
    let (username, rest) = text.split_once('@')?;
    let domain = rest.split('@').next().unwrap_or(rest);
    (!username.is_empty() && !domain.is_empty()).then_some((username, domain))
}

/// Strip non-letters, drop boilerplate and implausible lengths
fn clean_names(raw: Vec<String>) -> BTreeSet<String> {
    raw.into_iter()
        .filter_map(|name| {
            let cleaned = NON_LETTERS.replace_all(&name, "").trim().to_string();
            let len = cleaned.chars().count();
            let boilerplate = BOILERPLATE.contains(&cleaned.to_lowercase().as_str());
            ((2..=40).contains(&len) && !boilerplate).then_some(cleaned)
        })
        .collect()
}
