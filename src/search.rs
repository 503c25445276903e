//! Snippet extraction from generic search-result markup

use scraper::{Html, Selector};

/// Text of result anchors whose `href` points at an http(s) URL,
/// trimmed and de-duplicated, stopping after `limit` snippets
pub fn extract_snippets(html: &str, limit: usize) -> Vec<String> {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return Vec::new(),
    };

    let mut snippets: Vec<String> = Vec::new();
    for link in document.select(&selector) {
        let href = link.value().attr("href").unwrap_or_default();
        if !href.contains("http") {
            continue;
        }

        let text = collapse_whitespace(&link.text().collect::<String>());
        if !text.is_empty() && !snippets.contains(&text) {
            snippets.push(text);
        }
        if snippets.len() >= limit {
            break;
        }
    }

    snippets
}

/// Text of every anchor with an `href`, joined by spaces
pub fn extract_link_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let selector = match Selector::parse("a[href]") {
        Ok(selector) => selector,
        Err(_) => return String::new(),
    };

    document
        .select(&selector)
        .map(|a| collapse_whitespace(&a.text().collect::<String>()))
        .filter(|t| !t.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<&str>>().join(" ")
}

#[cfg(test)]
mod tests {
    use super::*;

    const RESULTS: &str = r#"
    <html><body>
        <a href="/settings">Settings</a>
        <a href="https://acme.com">Acme Cloud Software</a>
        <a href="https://acme.com/about">  Acme   Cloud Software </a>
        <a href="https://news.example.com/acme">Acme raises funding</a>
        <a href="https://jobs.example.com">Jobs at Acme</a>
        <a>No href</a>
    </body></html>
    "#;

    #[test]
    fn test_extract_snippets_filters_and_dedupes() {
        let snippets = extract_snippets(RESULTS, 5);
        assert_eq!(
            snippets,
            vec!["Acme Cloud Software", "Acme raises funding", "Jobs at Acme"]
        );
    }

    #[test]
    fn test_extract_snippets_respects_limit() {
        assert_eq!(extract_snippets(RESULTS, 2).len(), 2);
    }

    #[test]
    fn test_extract_link_text_keeps_relative_links() {
        let text = extract_link_text(RESULTS);
        assert!(text.starts_with("Settings Acme Cloud Software"));
        assert!(!text.contains("No href"));
    }
}
