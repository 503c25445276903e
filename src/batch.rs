//! Batch input for email enrichment
//!
//! Supports:
//! - CSV files with a header column named exactly `Email`
//! - JSON files with an array of address strings, or `{"emails": [...]}`
//!
//! Malformed addresses are kept: they come back from enrichment as failure
//! records so the output lines up with the input.

use crate::enricher::EnrichmentOutcome;
use anyhow::{bail, Context, Result};
use chrono::Utc;
use serde::Serialize;
use std::fs;
use std::path::Path;

/// Column that holds the addresses in CSV input (case-sensitive)
pub const EMAIL_COLUMN: &str = "Email";

/// Input format for batch files
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum InputFormat {
    Csv,
    Json,
}

impl InputFormat {
    /// Detect format from file extension
    pub fn from_path(path: &Path) -> Option<Self> {
        match path.extension().and_then(|e| e.to_str()).map(|e| e.to_lowercase()).as_deref() {
            Some("csv") => Some(Self::Csv),
            Some("json") => Some(Self::Json),
            _ => None,
        }
    }
}

/// Summary of a batch run
#[derive(Debug, Clone, Serialize)]
pub struct BatchSummary {
    pub total: usize,
    pub enriched: usize,
    pub failed: usize,
    pub started_at: String,
    pub completed_at: String,
    pub duration_secs: f64,
}

impl BatchSummary {
    pub fn start() -> Self {
        Self {
            total: 0,
            enriched: 0,
            failed: 0,
            started_at: timestamp(),
            completed_at: String::new(),
            duration_secs: 0.0,
        }
    }

    /// Fill in counts and the end time from the finished outcomes
    pub fn finish(&mut self, outcomes: &[EnrichmentOutcome], duration_secs: f64) {
        self.total = outcomes.len();
        self.failed = outcomes.iter().filter(|o| o.is_failure()).count();
        self.enriched = self.total - self.failed;
        self.completed_at = timestamp();
        self.duration_secs = duration_secs;
    }
}

fn timestamp() -> String {
    Utc::now().format("%Y-%m-%d %H:%M:%S UTC").to_string()
}

/// Read addresses from a file (format from extension)
pub fn parse_email_file(path: &Path) -> Result<Vec<String>> {
    let format = InputFormat::from_path(path).with_context(|| {
        format!("Cannot determine input format from file extension. Expected .csv or .json: {}", path.display())
    })?;

    let content = fs::read_to_string(path)
        .with_context(|| format!("Failed to read input file: {}", path.display()))?;

    match format {
        InputFormat::Csv => parse_csv_emails(&content),
        InputFormat::Json => parse_json_emails(&content),
    }
}

/// Addresses from the `Email` column; rows with an empty or missing value are dropped
pub fn parse_csv_emails(content: &str) -> Result<Vec<String>> {
    let mut reader = csv::ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(content.as_bytes());

    let headers = reader.headers().context("Failed to read CSV headers")?.clone();
    let email_idx = headers
        .iter()
        .position(|h| h.trim() == EMAIL_COLUMN)
        .with_context(|| format!("CSV must have an '{}' column", EMAIL_COLUMN))?;

    let mut emails = Vec::new();
    for result in reader.records() {
        let record = result.context("Failed to parse CSV record")?;
        if let Some(email) = record.get(email_idx).map(str::trim).filter(|s| !s.is_empty()) {
            emails.push(email.to_string());
        }
    }

    Ok(emails)
}

/// Addresses from a JSON array of strings or an object with an `emails` array
pub fn parse_json_emails(content: &str) -> Result<Vec<String>> {
    let value: serde_json::Value = serde_json::from_str(content).context("Failed to parse JSON content")?;

    let items = match &value {
        serde_json::Value::Array(arr) => arr,
        serde_json::Value::Object(obj) => match obj.get("emails") {
            Some(serde_json::Value::Array(arr)) => arr,
            Some(_) => bail!("'emails' field must be an array"),
            None => bail!("JSON object must have an 'emails' array field"),
        },
        _ => bail!("JSON must be an array of addresses or an object with an 'emails' field"),
    };

    Ok(items
        .iter()
        .filter_map(|item| item.as_str())
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_string)
        .collect())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::enricher::EnrichmentFailure;

    #[test]
    fn test_parse_csv_email_column() {
        let content = "Name,Email\nJohn,john.doe@berkeley.edu\nNobody,\nBad,not-an-email\n";
        let result = parse_csv_emails(content).unwrap();
        assert_eq!(result, vec!["john.doe@berkeley.edu", "not-an-email"]);
    }

    #[test]
    fn test_parse_csv_header_is_case_sensitive() {
        let content = "email\nsomeone@gmail.com\n";
        let err = parse_csv_emails(content).unwrap_err();
        assert!(err.to_string().contains("'Email' column"));
    }

    #[test]
    fn test_parse_csv_short_rows() {
        let content = "Email,Note\nsomeone@gmail.com\n";
        assert_eq!(parse_csv_emails(content).unwrap(), vec!["someone@gmail.com"]);
    }

    #[test]
    fn test_parse_json_formats() {
        let array = r#"["a@b.com", "  ", 42, "c@d.org"]"#;
        assert_eq!(parse_json_emails(array).unwrap(), vec!["a@b.com", "c@d.org"]);

        let object = r#"{"emails": ["a@b.com"]}"#;
        assert_eq!(parse_json_emails(object).unwrap(), vec!["a@b.com"]);

        assert!(parse_json_emails(r#"{"emails": "a@b.com"}"#).is_err());
        assert!(parse_json_emails("not json").is_err());
    }

    #[test]
    fn test_input_format_detection() {
        assert_eq!(InputFormat::from_path(Path::new("emails.CSV")), Some(InputFormat::Csv));
        assert_eq!(InputFormat::from_path(Path::new("emails.json")), Some(InputFormat::Json));
        assert_eq!(InputFormat::from_path(Path::new("emails.txt")), None);
    }

    #[test]
    fn test_summary_counts_failures() {
        let outcomes = vec![EnrichmentOutcome::Failure(EnrichmentFailure {
            email: "x".to_string(),
            error: "Invalid email format".to_string(),
        })];
        let mut summary = BatchSummary::start();
        summary.finish(&outcomes, 0.5);
        assert_eq!(summary.total, 1);
        assert_eq!(summary.failed, 1);
        assert_eq!(summary.enriched, 0);
        assert!(!summary.completed_at.is_empty());
    }
}
