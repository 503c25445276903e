//! Network access for page loads and the search fallback
//!
//! Every resolver reaches the network through [`WebSource`], so a lookup can
//! be driven against a live site, a mock server, or an in-process fake.

use crate::config::AppConfig;
use crate::error::{EnrichError, FetchErrorKind};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

#[async_trait]
pub trait WebSource: Send + Sync {
    /// GET a page and return its body. Non-2xx statuses are errors.
    async fn fetch_page(&self, url: &str) -> Result<String, EnrichError>;

    /// Run a generic web search and return the raw result markup
    async fn search(&self, query: &str) -> Result<String, EnrichError>;
}

/// [`WebSource`] backed by a shared reqwest client with a bounded timeout
#[derive(Debug, Clone)]
pub struct HttpWebSource {
    client: reqwest::Client,
    search_endpoint: String,
}

impl HttpWebSource {
    pub fn new(config: &AppConfig) -> Result<Self, EnrichError> {
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.http.request_timeout_secs))
            .user_agent(config.http.user_agent.clone())
            .redirect(reqwest::redirect::Policy::limited(config.http.max_redirects))
            .build()
            .map_err(|e| EnrichError::fetch(FetchErrorKind::Other, format!("Failed to build HTTP client: {}", e)))?;

        Ok(Self {
            client,
            search_endpoint: config.search.endpoint.clone(),
        })
    }

    async fn get_text(&self, request: reqwest::RequestBuilder, label: &str) -> Result<String, EnrichError> {
        let response = request.send().await.map_err(|e| {
            debug!("Failed to fetch {}: {}", label, e);
            EnrichError::from(e)
        })?;

        let status = response.status();
        if !status.is_success() {
            debug!("Non-success status {} for {}", status, label);
            return Err(EnrichError::fetch(
                FetchErrorKind::Status(status.as_u16()),
                format!("Non-success status {} for {}", status, label),
            ));
        }

        response.text().await.map_err(|e| {
            EnrichError::fetch(FetchErrorKind::Body, format!("Failed to read response body: {}", e))
        })
    }
}

#[async_trait]
impl WebSource for HttpWebSource {
    async fn fetch_page(&self, url: &str) -> Result<String, EnrichError> {
        debug!("Fetching web page content: {}", url);
        self.get_text(self.client.get(url), url).await
    }

    async fn search(&self, query: &str) -> Result<String, EnrichError> {
        debug!("Searching for snippets: {}", query);
        let request = self.client.get(&self.search_endpoint).query(&[("q", query)]);
        self.get_text(request, &self.search_endpoint).await
    }
}
