#![allow(dead_code)]

pub mod fixtures;
pub mod wiremock_helpers;

use async_trait::async_trait;
use emailenrich::config::AppConfig;
use emailenrich::error::{EnrichError, FetchErrorKind};
use emailenrich::WebSource;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Mutex;
use tempfile::TempDir;

/// In-process [`WebSource`]: serves canned pages by URL, 404s everything
/// else, and counts every call.
#[derive(Default)]
pub struct CountingWeb {
    pages: HashMap<String, String>,
    search_html: Option<String>,
    page_calls: AtomicUsize,
    search_calls: AtomicUsize,
    queries: Mutex<Vec<String>>,
}

impl CountingWeb {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_page(mut self, url: &str, html: &str) -> Self {
        self.pages.insert(url.to_string(), html.to_string());
        self
    }

    pub fn with_search(mut self, html: &str) -> Self {
        self.search_html = Some(html.to_string());
        self
    }

    pub fn page_calls(&self) -> usize {
        self.page_calls.load(Ordering::SeqCst)
    }

    pub fn search_calls(&self) -> usize {
        self.search_calls.load(Ordering::SeqCst)
    }

    pub fn total_calls(&self) -> usize {
        self.page_calls() + self.search_calls()
    }

    pub fn queries(&self) -> Vec<String> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl WebSource for CountingWeb {
    async fn fetch_page(&self, url: &str) -> Result<String, EnrichError> {
        self.page_calls.fetch_add(1, Ordering::SeqCst);
        self.pages
            .get(url)
            .cloned()
            .ok_or_else(|| EnrichError::fetch(FetchErrorKind::Status(404), format!("no page at {}", url)))
    }

    async fn search(&self, query: &str) -> Result<String, EnrichError> {
        self.search_calls.fetch_add(1, Ordering::SeqCst);
        self.queries.lock().unwrap().push(query.to_string());
        Ok(self.search_html.clone().unwrap_or_else(|| "<html><body></body></html>".to_string()))
    }
}

/// Default configuration with caches and table overlays inside `dir`
pub fn test_config(dir: &TempDir) -> AppConfig {
    let mut config = AppConfig::default();
    config.cache.dir = dir.path().join("cache");
    config.tables.dir = dir.path().join("tables");
    config
}
