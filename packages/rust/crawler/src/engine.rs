//! Sequential page fetcher.
//!
//! Each URL is fetched once, in resolver order. A failure on one URL yields
//! an empty [`ScrapedDocument`] with the failure recorded; it never stops the
//! remaining fetches and never surfaces as an error.

use std::net::IpAddr;
use std::time::Duration;

use reqwest::Client;
use tracing::{debug, info, instrument, warn};
use url::Url;

use assigngen_shared::{
    AssignGenError, Result, ScrapeConfig, ScrapeFailure, ScrapedDocument, SearchResult,
};

use crate::extract::extract_text;

/// Maximum redirects followed per page.
const MAX_REDIRECTS: usize = 5;

// ---------------------------------------------------------------------------
// Scraper
// ---------------------------------------------------------------------------

/// Fetches pages and extracts their paragraph text.
pub struct Scraper {
    client: Client,
    /// Allow localhost/private IPs (integration tests with mock servers).
    allow_private_hosts: bool,
}

impl Scraper {
    /// Create a scraper with one shared HTTP client.
    pub fn new(config: &ScrapeConfig) -> Result<Self> {
        let client = Client::builder()
            .user_agent(config.user_agent.as_str())
            .redirect(reqwest::redirect::Policy::limited(MAX_REDIRECTS))
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| AssignGenError::Network(format!("failed to build HTTP client: {e}")))?;

        Ok(Self {
            client,
            allow_private_hosts: config.allow_private_hosts,
        })
    }

    /// Scrape one URL. Never fails; failures produce an empty document.
    pub async fn scrape(&self, target: &SearchResult) -> ScrapedDocument {
        match self.try_scrape(target.url()).await {
            Ok(text) => {
                debug!(url = %target, chars = text.chars().count(), "page scraped");
                ScrapedDocument::ok(target.as_str(), text)
            }
            Err(failure) => {
                warn!(url = %target, error = %failure, "scrape failed, continuing with empty content");
                ScrapedDocument::failed(target.as_str(), failure)
            }
        }
    }

    /// Scrape every target one at a time, in order.
    ///
    /// `on_progress` is called with `(current, total)` before each fetch.
    #[instrument(skip_all, fields(targets = targets.len()))]
    pub async fn scrape_all<F>(
        &self,
        targets: &[SearchResult],
        mut on_progress: F,
    ) -> Vec<ScrapedDocument>
    where
        F: FnMut(usize, usize),
    {
        let total = targets.len();
        let mut documents = Vec::with_capacity(total);

        for (i, target) in targets.iter().enumerate() {
            on_progress(i + 1, total);
            documents.push(self.scrape(target).await);
        }

        let failed = documents.iter().filter(|d| d.failure.is_some()).count();
        let with_content = documents.iter().filter(|d| !d.is_empty()).count();
        info!(total, failed, with_content, "scraping complete");

        documents
    }

    /// Fetch and extract one page, reporting why it produced nothing.
    pub async fn try_scrape(&self, url: &Url) -> std::result::Result<String, ScrapeFailure> {
        if !self.allow_private_hosts && is_ssrf_target(url) {
            return Err(ScrapeFailure::Blocked(url.host_str().unwrap_or_default().to_string()));
        }

        let response = self
            .client
            .get(url.as_str())
            .send()
            .await
            .map_err(|e| ScrapeFailure::Network(e.to_string()))?;

        let status = response.status();
        if !status.is_success() {
            return Err(ScrapeFailure::Status(status.as_u16()));
        }

        let body = response
            .text()
            .await
            .map_err(|e| ScrapeFailure::Body(e.to_string()))?;

        Ok(extract_text(&body))
    }
}

// ---------------------------------------------------------------------------
// SSRF protection
// ---------------------------------------------------------------------------

/// Check if a URL targets a potentially dangerous resource.
fn is_ssrf_target(url: &Url) -> bool {
    match url.scheme() {
        "http" | "https" => {}
        _ => return true,
    }

    match url.host() {
        Some(url::Host::Ipv4(v4)) => is_private_ip(&IpAddr::V4(v4)),
        Some(url::Host::Ipv6(v6)) => is_private_ip(&IpAddr::V6(v6)),
        Some(url::Host::Domain(host)) => {
            host == "localhost"
                || host.ends_with(".localhost")
                || host.ends_with(".local")
                || host.ends_with(".internal")
        }
        None => true,
    }
}

/// Check if an IP is in a private/reserved range.
fn is_private_ip(ip: &IpAddr) -> bool {
    match ip {
        IpAddr::V4(v4) => {
            v4.is_loopback()
                || v4.is_private()
                || v4.is_link_local()
                || v4.is_broadcast()
                || v4.is_unspecified()
                // 100.64.0.0/10 (Carrier-grade NAT)
                || (v4.octets()[0] == 100 && (v4.octets()[1] & 0xC0) == 64)
        }
        IpAddr::V6(v6) => {
            v6.is_loopback()
                || v6.is_unspecified()
                // fc00::/7 unique local
                || (v6.segments()[0] & 0xfe00) == 0xfc00
                // fe80::/10 link local
                || (v6.segments()[0] & 0xffc0) == 0xfe80
        }
    }
}
