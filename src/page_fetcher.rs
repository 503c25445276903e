//! Homepage fetching and parsing into a normalized [`PageInfo`]
//!
//! Extraction order for the site name:
//! - OpenGraph `og:site_name`, then `og:title`
//! - `<title>` text, cut at the first `|`
//! - First `<h1>`
//! - Capitalized first domain label
//!
//! When the homepage cannot be loaded the fetcher degrades to search-result
//! snippets for the domain and reports `fetch_succeeded = false`.

use crate::domain_utils::{capitalize, normalize_domain, title_case};
use crate::error::{EnrichError, FetchErrorKind};
use crate::search::{collapse_whitespace, extract_snippets};
use crate::sector::{self, SectorLabel};
use crate::web_source::WebSource;
use scraper::{ElementRef, Html, Selector};
use serde::Deserialize;
use std::collections::BTreeSet;
use std::sync::Arc;
use tracing::{debug, warn};

/// Maximum description length in characters
const DESCRIPTION_LIMIT: usize = 300;

/// Domain markers that switch name extraction to the institution rules
const EDUCATION_DOMAIN_MARKERS: &[&str] = &[
    "university", "college", "institute", "school", "academy", ".edu", ".ac.",
];

/// Everything learned about a domain from one page load (or its search fallback)
#[derive(Debug, Clone, Default)]
pub struct PageInfo {
    pub domain: String,
    pub title: String,
    pub meta_description: String,
    pub body_text: String,
    pub raw_markup: String,
    /// Site name taken from the page itself (never the domain-derived fallback)
    pub company_name: Option<String>,
    pub description: Option<String>,
    /// Known sector, `None` when no keyword matched
    pub sector: Option<SectorLabel>,
    pub fetch_succeeded: bool,
    pub error_kind: Option<FetchErrorKind>,
}

impl PageInfo {
    /// Scraped site name, or the capitalized first domain label
    pub fn display_name(&self) -> String {
        self.company_name
            .clone()
            .unwrap_or_else(|| domain_fallback_name(&self.domain))
    }
}

/// Schema.org JSON-LD node (partial)
#[derive(Debug, Deserialize)]
struct SchemaNode {
    #[serde(rename = "@type")]
    schema_type: Option<serde_json::Value>,
    name: Option<serde_json::Value>,
    #[serde(rename = "@graph")]
    graph: Option<Vec<SchemaNode>>,
}

impl SchemaNode {
    fn has_type(&self, wanted: &str) -> bool {
        match &self.schema_type {
            Some(serde_json::Value::String(t)) => t == wanted,
            Some(serde_json::Value::Array(types)) => types.iter().any(|t| t.as_str() == Some(wanted)),
            _ => false,
        }
    }

    fn collect_names(&self, wanted: &str, out: &mut BTreeSet<String>) {
        if self.has_type(wanted) {
            if let Some(name) = self.name.as_ref().and_then(|n| n.as_str()) {
                let name = collapse_whitespace(name);
                if !name.is_empty() {
                    out.insert(name);
                }
            }
        }
        for node in self.graph.iter().flatten() {
            node.collect_names(wanted, out);
        }
    }
}

pub struct PageFetcher {
    web: Arc<dyn WebSource>,
    max_snippets: usize,
}

impl PageFetcher {
    pub fn new(web: Arc<dyn WebSource>, max_snippets: usize) -> Self {
        Self { web, max_snippets }
    }

    pub fn web(&self) -> &Arc<dyn WebSource> {
        &self.web
    }

    /// Fetch and parse the homepage of `domain`. Never fails: any fetch or
    /// parse problem degrades to the search-snippet fallback.
    pub async fn fetch_page_info(&self, domain: &str) -> PageInfo {
        let domain = normalize_domain(domain);
        let url = normalize_url(&domain);

        match self.web.fetch_page(&url).await {
            Ok(html) => self.parse_page(&domain, html).await,
            Err(e) => {
                debug!("Homepage fetch failed for {}: {}", domain, e);
                self.search_fallback(&domain, e).await
            }
        }
    }

    /// Fetch one URL, no fallback
    pub async fn fetch_raw(&self, url: &str) -> Result<String, EnrichError> {
        self.web.fetch_page(url).await
    }

    /// Search snippets for a query; search failures yield no snippets
    pub async fn search_snippets(&self, query: &str) -> Vec<String> {
        match self.web.search(query).await {
            Ok(html) => extract_snippets(&html, self.max_snippets),
            Err(e) => {
                debug!("Search failed for '{}': {}", query, e);
                Vec::new()
            }
        }
    }

    async fn parse_page(&self, domain: &str, html: String) -> PageInfo {
        let mut info = {
            let document = Html::parse_document(&html);
            let title = select_text(&document, "title").unwrap_or_default();
            let meta_description = get_meta_name(&document, "description").unwrap_or_default();
            let body_text = select_text(&document, "body").unwrap_or_default();
            let description = extract_description(&document);
            let meta_keywords = get_meta_name(&document, "keywords").unwrap_or_default();

            let (company_name, sector) = if is_education_domain(domain) {
                (extract_institution_name(&document), Some(SectorLabel::Education))
            } else {
                let text = [
                    body_text.as_str(),
                    meta_keywords.as_str(),
                    title.as_str(),
                    description.as_deref().unwrap_or_default(),
                ]
                .join(" ");
                let sector = sector::classify(&text);
                (extract_company_name(&document), sector.is_known().then_some(sector))
            };

            PageInfo {
                domain: domain.to_string(),
                title,
                meta_description,
                body_text,
                raw_markup: String::new(),
                company_name,
                description,
                sector,
                fetch_succeeded: true,
                error_kind: None,
            }
        };
        info.raw_markup = html;

        if info.sector.is_none() {
            let snippets = self.search_snippets(&format!("{} company sector", domain)).await;
            let sector = sector::classify(&snippets.join(" "));
            info.sector = sector.is_known().then_some(sector);
        }

        info
    }

    async fn search_fallback(&self, domain: &str, error: EnrichError) -> PageInfo {
        let snippets = self.search_snippets(domain).await;
        let text = snippets.join(" ");
        let sector = sector::classify(&text);

        if snippets.is_empty() {
            warn!("No page or search signal for {}", domain);
        }

        PageInfo {
            domain: domain.to_string(),
            body_text: text,
            sector: sector.is_known().then_some(sector),
            fetch_succeeded: false,
            error_kind: Some(error.fetch_kind().unwrap_or(FetchErrorKind::Other)),
            ..PageInfo::default()
        }
    }
}

/// `https://<host>` for a bare domain; an explicit scheme is kept
pub fn normalize_url(domain: &str) -> String {
    let trimmed = domain.trim();
    let (scheme, rest) = match trimmed.split_once("://") {
        Some((scheme, rest)) if scheme.starts_with("http") => (scheme.to_lowercase(), rest),
        _ => ("https".to_string(), trimmed),
    };

    let host = rest.split('/').next().unwrap_or(rest);
    let host = host.strip_prefix("www.").unwrap_or(host);
    format!("{}://{}", scheme, host)
}

/// Whether the domain itself looks like an educational institution
pub fn is_education_domain(domain: &str) -> bool {
    let domain = domain.to_lowercase();
    EDUCATION_DOMAIN_MARKERS.iter().any(|m| domain.contains(m))
}

/// Names of JSON-LD entries of the given `@type` in the raw markup
pub fn json_ld_names_in_html(html: &str, wanted: &str) -> BTreeSet<String> {
    json_ld_names(&Html::parse_document(html), wanted)
}

/// Whitespace-collapsed text of the document, skipping the given elements
pub fn visible_text(document: &Html, skip: &[&str]) -> String {
    let mut parts = Vec::new();
    for node in document.root_element().descendants() {
        if let Some(text) = node.value().as_text() {
            let hidden = node.ancestors().any(|a| {
                a.value().as_element().map(|e| skip.contains(&e.name())).unwrap_or(false)
            });
            let text = text.trim();
            if !hidden && !text.is_empty() {
                parts.push(text.to_string());
            }
        }
    }
    collapse_whitespace(&parts.join(" "))
}

fn json_ld_names(document: &Html, wanted: &str) -> BTreeSet<String> {
    let mut names = BTreeSet::new();
    let selector = match Selector::parse(r#"script[type="application/ld+json"]"#) {
        Ok(selector) => selector,
        Err(_) => return names,
    };

    for element in document.select(&selector) {
        match parse_json_ld(&element.text().collect::<String>()) {
            Ok(nodes) => {
                for node in &nodes {
                    node.collect_names(wanted, &mut names);
                }
            }
            Err(e) => debug!("Skipping JSON-LD block: {}", e),
        }
    }

    names
}

/// One JSON-LD block, either a single node or a top-level array
fn parse_json_ld(json_text: &str) -> Result<Vec<SchemaNode>, EnrichError> {
    if let Ok(node) = serde_json::from_str::<SchemaNode>(json_text) {
        return Ok(vec![node]);
    }
    serde_json::from_str::<Vec<SchemaNode>>(json_text)
        .map_err(|e| EnrichError::Parse(format!("malformed JSON-LD: {}", e)))
}

fn extract_company_name(document: &Html) -> Option<String> {
    for property in ["og:site_name", "og:title"] {
        if let Some(content) = get_meta_property(document, property) {
            let content = collapse_whitespace(&content);
            if is_valid_site_name(&content) {
                return Some(content);
            }
        }
    }

    if let Some(title) = select_text(document, "title") {
        let head = title.split('|').next().unwrap_or_default().trim().to_string();
        if is_valid_site_name(&head) {
            return Some(head);
        }
    }

    select_text(document, "h1").filter(|h| is_valid_site_name(h))
}

fn extract_institution_name(document: &Html) -> Option<String> {
    select_text(document, "title")
        .filter(|t| is_valid_site_name(t))
        .or_else(|| select_text(document, "h1").filter(|h| is_valid_site_name(h)))
}

fn extract_description(document: &Html) -> Option<String> {
    let from_meta = get_meta_name(document, "description")
        .or_else(|| get_meta_property(document, "og:description"))
        .map(|d| d.trim().to_string())
        .filter(|d| !d.is_empty());

    from_meta
        .or_else(|| select_text(document, "p"))
        .map(|d| d.chars().take(DESCRIPTION_LIMIT).collect())
}

/// Capitalized first label, or title-cased for institution domains
fn domain_fallback_name(domain: &str) -> String {
    let first = domain.split('.').next().unwrap_or(domain);
    if is_education_domain(domain) {
        title_case(&first.replace('-', " "))
    } else {
        capitalize(first)
    }
}

/// Whitespace-collapsed text of the first element matching `selector`
fn select_text(document: &Html, selector: &str) -> Option<String> {
    let selector = Selector::parse(selector).ok()?;
    document
        .select(&selector)
        .next()
        .map(|el: ElementRef| collapse_whitespace(&el.text().collect::<Vec<_>>().join(" ")))
        .filter(|t| !t.is_empty())
}

/// Get meta tag content by property attribute
fn get_meta_property(document: &Html, property: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[property="{}"]"#, property)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.to_string())
}

/// Get meta tag content by name attribute
fn get_meta_name(document: &Html, name: &str) -> Option<String> {
    let selector = Selector::parse(&format!(r#"meta[name="{}"]"#, name)).ok()?;
    document
        .select(&selector)
        .next()
        .and_then(|el| el.value().attr("content"))
        .map(|s| s.to_string())
}

/// Reject empty values and SPA placeholders
fn is_valid_site_name(name: &str) -> bool {
    let name = name.trim();
    if name.chars().count() < 2 || name.len() > 150 {
        return false;
    }

    let placeholders = ["loading", "loading...", "please wait", "redirecting", "undefined", "null"];
    let lower = name.to_lowercase();
    !placeholders.iter().any(|p| lower == *p)
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;
    use std::sync::Mutex;

    struct FakeWeb {
        page: Option<String>,
        search_html: String,
        searches: Mutex<Vec<String>>,
    }

    #[async_trait]
    impl WebSource for FakeWeb {
        async fn fetch_page(&self, _url: &str) -> Result<String, EnrichError> {
            self.page
                .clone()
                .ok_or_else(|| EnrichError::fetch(FetchErrorKind::Status(503), "unavailable"))
        }

        async fn search(&self, query: &str) -> Result<String, EnrichError> {
            self.searches.lock().unwrap().push(query.to_string());
            Ok(self.search_html.clone())
        }
    }

    fn fetcher(page: Option<&str>, search_html: &str) -> (PageFetcher, Arc<FakeWeb>) {
        let web = Arc::new(FakeWeb {
            page: page.map(|p| p.to_string()),
            search_html: search_html.to_string(),
            searches: Mutex::new(Vec::new()),
        });
        (PageFetcher::new(web.clone(), 5), web)
    }

    #[test]
    fn test_normalize_url() {
        assert_eq!(normalize_url("acme.com"), "https://acme.com");
        assert_eq!(normalize_url("www.acme.com"), "https://acme.com");
        assert_eq!(normalize_url("http://www.acme.com/"), "http://acme.com");
        assert_eq!(normalize_url("https://acme.com/about"), "https://acme.com");
    }

    #[test]
    fn test_is_education_domain() {
        assert!(is_education_domain("berkeley.edu"));
        assert!(is_education_domain("iitd.ac.in"));
        assert!(is_education_domain("stateuniversity.org"));
        assert!(!is_education_domain("acme.com"));
    }

    #[tokio::test]
    async fn test_company_page_extraction() {
        let html = r#"
        <html>
        <head>
            <title>Acme Cloud | Home</title>
            <meta property="og:site_name" content="Acme Cloud">
            <meta name="description" content="Acme builds cloud software for teams.">
            <script type="application/ld+json">
            {"@type": "Person", "name": "Jane Smith"}
            </script>
        </head>
        <body><h1>Welcome</h1><p>We build things.</p></body>
        </html>
        "#;
        let (fetcher, web) = fetcher(Some(html), "");

        let info = fetcher.fetch_page_info("www.Acme.com").await;
        assert!(info.fetch_succeeded);
        assert_eq!(info.domain, "acme.com");
        assert_eq!(info.company_name.as_deref(), Some("Acme Cloud"));
        assert_eq!(info.title, "Acme Cloud | Home");
        assert_eq!(info.meta_description, "Acme builds cloud software for teams.");
        assert_eq!(info.description.as_deref(), Some("Acme builds cloud software for teams."));
        assert_eq!(info.sector, Some(SectorLabel::Technology));
        assert!(json_ld_names_in_html(&info.raw_markup, "Person").contains("Jane Smith"));
        assert!(info.raw_markup.contains("og:site_name"));
        assert!(web.searches.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_title_split_when_no_meta() {
        let html = "<html><head><title>Globex Corporation | Official Site</title></head><body><p>zzz</p></body></html>";
        let (fetcher, _) = fetcher(Some(html), "");

        let info = fetcher.fetch_page_info("globex.com").await;
        assert_eq!(info.company_name.as_deref(), Some("Globex Corporation"));
        assert_eq!(info.description.as_deref(), Some("zzz"));
    }

    #[tokio::test]
    async fn test_unknown_sector_retries_with_search() {
        let html = "<html><head><title>Zzz</title></head><body><p>qqq</p></body></html>";
        let search = r#"<a href="https://x.com">Zzz is an investment firm</a>"#;
        let (fetcher, web) = fetcher(Some(html), search);

        let info = fetcher.fetch_page_info("zzz.com").await;
        assert_eq!(info.sector, Some(SectorLabel::Finance));
        assert_eq!(web.searches.lock().unwrap().as_slice(), ["zzz.com company sector"]);
    }

    #[test]
    fn test_malformed_json_ld_is_a_parse_error() {
        assert!(matches!(parse_json_ld("{\"@type\": \"Person\", "), Err(EnrichError::Parse(_))));
        assert_eq!(parse_json_ld(r#"[{"@type": "Person", "name": "A B"}, {}]"#).unwrap().len(), 2);

        let html = r#"<script type="application/ld+json">{broken</script>
            <script type="application/ld+json">{"@type": "Person", "name": "Jane Smith"}</script>"#;
        let names = json_ld_names_in_html(html, "Person");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["Jane Smith".to_string()]);
    }

    #[tokio::test]
    async fn test_fetch_failure_degrades_to_search_snippets() {
        let search = r#"<a href="https://h.com">Northwind hospital network</a>"#;
        let (fetcher, web) = fetcher(None, search);

        let info = fetcher.fetch_page_info("northwind.org").await;
        assert!(!info.fetch_succeeded);
        assert_eq!(info.error_kind, Some(FetchErrorKind::Status(503)));
        assert_eq!(info.sector, Some(SectorLabel::Healthcare));
        assert!(info.company_name.is_none());
        assert_eq!(info.display_name(), "Northwind");
        assert_eq!(web.searches.lock().unwrap().as_slice(), ["northwind.org"]);
    }

    #[tokio::test]
    async fn test_institution_page_uses_title() {
        let html = "<html><head><title>Welcome to Example State University</title></head><body></body></html>";
        let (fetcher, _) = fetcher(Some(html), "");

        let info = fetcher.fetch_page_info("example.edu").await;
        assert_eq!(info.company_name.as_deref(), Some("Welcome to Example State University"));
        assert_eq!(info.sector, Some(SectorLabel::Education));
    }

    #[test]
    fn test_visible_text_skips_hidden_elements() {
        let document = Html::parse_document(
            "<html><body><nav>Menu Item</nav><p>Jane Smith leads</p><script>var x = 1;</script><footer>Footer Text</footer></body></html>",
        );
        let text = visible_text(&document, &["script", "style", "nav", "footer"]);
        assert_eq!(text, "Jane Smith leads");
    }

    #[test]
    fn test_json_ld_person_names_from_array_and_graph() {
        let html = r#"
        <script type="application/ld+json">
        [{"@type": "Person", "name": "Ada Lovelace"}, {"@type": "Organization", "name": "Acme"}]
        </script>
        <script type="application/ld+json">
        {"@graph": [{"@type": ["Person"], "name": "Alan Turing"}]}
        </script>
        <script type="application/ld+json">not json</script>
        "#;
        let names = json_ld_names_in_html(html, "Person");
        assert_eq!(names.into_iter().collect::<Vec<_>>(), vec!["Ada Lovelace", "Alan Turing"]);
    }
}
