//! Topic → candidate URL resolution.
//!
//! A [`SearchProvider`] issues one search request and returns raw candidate
//! hrefs in discovery order. [`resolve`] turns those into validated,
//! deduplicated [`SearchResult`]s capped at the requested count.

mod parser;

use std::collections::HashSet;
use std::time::Duration;

use assigngen_shared::{AssignGenError, Query, Result, SearchConfig, SearchResult};
use async_trait::async_trait;
use reqwest::Client;
use tracing::{debug, info, instrument};
use url::Url;

/// Maximum number of redirects to follow for the search request.
const MAX_REDIRECTS: usize = 3;

// ---------------------------------------------------------------------------
// Provider trait
// ---------------------------------------------------------------------------

/// A search backend mapping a topic to raw result hrefs.
///
/// Implementations return `AssignGenError::Search` when the request cannot
/// complete. They do not need to validate or deduplicate; [`resolve`] does.
#[async_trait]
pub trait SearchProvider: Send + Sync {
    /// Run one search and return hrefs in discovery order.
    async fn search(&self, query: &Query, limit: usize) -> Result<Vec<String>>;

    /// Human-readable provider name for tracing.
    fn name(&self) -> &str;
}

// ---------------------------------------------------------------------------
// DuckDuckGo HTML endpoint
// ---------------------------------------------------------------------------

/// Searches the JavaScript-free DuckDuckGo endpoint with a form POST.
pub struct DuckDuckGoProvider {
    endpoint: Url,
    client: Client,
}

impl DuckDuckGoProvider {
    pub fn new(config: &SearchConfig) -> Result<Self> {
        let endpoint = Url::parse(&config.endpoint).map_err(|e| {
            AssignGenError::config(format!("invalid search endpoint '{}': {e}", config.endpoint))
        })?;

        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssignGenError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self { endpoint, client })
    }
}

#[async_trait]
impl SearchProvider for DuckDuckGoProvider {
    #[instrument(skip_all, fields(query = %query, endpoint = %self.endpoint))]
    async fn search(&self, query: &Query, _limit: usize) -> Result<Vec<String>> {
        let response = self
            .client
            .post(self.endpoint.clone())
            .form(&[("q", query.as_str())])
            .send()
            .await
            .map_err(|e| AssignGenError::search(format!("{}: {e}", self.endpoint)))?;

        let status = response.status();
        if !status.is_success() {
            return Err(AssignGenError::search(format!(
                "{}: HTTP {status}",
                self.endpoint
            )));
        }

        let body = response.text().await.map_err(|e| {
            AssignGenError::search(format!("{}: failed to read body: {e}", self.endpoint))
        })?;

        let links = parser::parse_result_links(&body, &self.endpoint);
        debug!(candidates = links.len(), "parsed search results page");

        Ok(links)
    }

    fn name(&self) -> &str {
        "duckduckgo"
    }
}

// ---------------------------------------------------------------------------
// Resolution
// ---------------------------------------------------------------------------

/// Resolve a topic into at most `count` unique http(s) URLs in discovery order.
///
/// An empty result is returned as `Ok(vec![])`; deciding that this is fatal is
/// the caller's job.
#[instrument(skip_all, fields(query = %query, provider = provider.name(), count = count))]
pub async fn resolve(
    provider: &dyn SearchProvider,
    query: &Query,
    count: usize,
) -> Result<Vec<SearchResult>> {
    let raw = provider.search(query, count).await?;
    let results = filter_candidates(&raw, count);

    info!(
        candidates = raw.len(),
        resolved = results.len(),
        "search resolved"
    );

    Ok(results)
}

/// Keep well-formed http(s) URLs, drop exact duplicates, cap at `count`.
///
/// Duplicates are judged on the trimmed href string, not the normalized URL.
fn filter_candidates(raw: &[String], count: usize) -> Vec<SearchResult> {
    let mut seen = HashSet::new();
    let mut results = Vec::new();

    for href in raw {
        if results.len() >= count {
            break;
        }

        let Some(result) = SearchResult::parse(href) else {
            debug!(%href, "discarding malformed or non-http candidate");
            continue;
        };

        if seen.insert(href.trim().to_string()) {
            results.push(result);
        }
    }

    results
}
