//! Domain string helpers shared by every resolver

use url::Url;

/// Multi-label public suffixes that need three labels for the registrable domain
const COMPOUND_SUFFIXES: &[&str] = &[
    "co.uk", "org.uk", "ac.uk", "gov.uk", "com.au", "net.au", "org.au", "edu.au",
    "co.nz", "ac.nz", "co.jp", "ac.jp", "co.kr", "com.br", "com.mx", "com.cn",
    "co.in", "ac.in", "edu.in", "ac.id", "co.id",
];

/// Normalize a domain: scheme, leading `www.` and trailing slash stripped, lower-cased
pub fn normalize_domain(domain: &str) -> String {
    let mut normalized = domain.trim().to_lowercase();

    if normalized.starts_with("http") {
        if let Some(host) = Url::parse(&normalized).ok().and_then(|u| u.host_str().map(|h| h.to_string())) {
            normalized = host;
        } else if let Some((_, rest)) = normalized.split_once("://") {
            normalized = rest.to_string();
        }
    }

    if let Some(stripped) = normalized.strip_prefix("www.") {
        normalized = stripped.to_string();
    }

    normalized.trim_end_matches('/').to_string()
}

/// Registrable label of a domain, public-suffix aware
/// (`mail.acme.co.uk` -> `acme`, `acme-corp.com` -> `acme-corp`)
pub fn registrable_label(domain: &str) -> String {
    let domain = normalize_domain(domain);
    let parts: Vec<&str> = domain.split('.').filter(|p| !p.is_empty()).collect();

    match parts.len() {
        0 => domain.clone(),
        1 => parts[0].to_string(),
        n => {
            let last_two = format!("{}.{}", parts[n - 2], parts[n - 1]);
            if COMPOUND_SUFFIXES.contains(&last_two.as_str()) {
                if n >= 3 {
                    parts[n - 3].to_string()
                } else {
                    parts[0].to_string()
                }
            } else {
                parts[n - 2].to_string()
            }
        }
    }
}

/// Upper-case the first character, lower-case the rest
pub fn capitalize(word: &str) -> String {
    let mut chars = word.chars();
    match chars.next() {
        Some(first) => first.to_uppercase().chain(chars.flat_map(|c| c.to_lowercase())).collect(),
        None => String::new(),
    }
}

/// Title-case every alphabetic run (`acme corp` -> `Acme Corp`, `o'neil` -> `O'Neil`)
pub fn title_case(text: &str) -> String {
    let mut result = String::with_capacity(text.len());
    let mut prev_is_letter = false;

    for c in text.chars() {
        if c.is_alphabetic() {
            if prev_is_letter {
                result.extend(c.to_lowercase());
            } else {
                result.extend(c.to_uppercase());
            }
            prev_is_letter = true;
        } else {
            result.push(c);
            prev_is_letter = false;
        }
    }

    result
}

/// Number of dots inside a domain
pub fn dot_count(domain: &str) -> usize {
    domain.matches('.').count()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_normalize_domain() {
        assert_eq!(normalize_domain("Example.COM"), "example.com");
        assert_eq!(normalize_domain("https://www.example.com/"), "example.com");
        assert_eq!(normalize_domain("http://example.com/path"), "example.com");
        assert_eq!(normalize_domain("www.acme.io/"), "acme.io");
        assert_eq!(normalize_domain("  berkeley.edu  "), "berkeley.edu");
    }

    #[test]
    fn test_registrable_label() {
        assert_eq!(registrable_label("acme.com"), "acme");
        assert_eq!(registrable_label("mail.acme.com"), "acme");
        assert_eq!(registrable_label("acme-corp.io"), "acme-corp");
        assert_eq!(registrable_label("shop.acme.co.uk"), "acme");
        assert_eq!(registrable_label("acme.co.uk"), "acme");
        assert_eq!(registrable_label("localhost"), "localhost");
    }

    #[test]
    fn test_capitalize_and_title_case() {
        assert_eq!(capitalize("jOHN"), "John");
        assert_eq!(capitalize(""), "");
        assert_eq!(title_case("acme corp"), "Acme Corp");
        assert_eq!(title_case("acme-corp"), "Acme-Corp");
        assert_eq!(title_case("ACME"), "Acme");
    }

    #[test]
    fn test_dot_count() {
        assert_eq!(dot_count("acme.com"), 1);
        assert_eq!(dot_count("a.b.acme.com"), 3);
    }
}
