//! HTTP fetcher implementation
//!
//! This module handles all HTTP requests for the crawler, including:
//! - Building HTTP clients with the configured user agent
//! - GET requests with the configured referrer
//! - Status and Content-Type validation
//! - Link extraction from accepted pages

use crate::config::{Config, UserAgentConfig};
use crate::crawler::parser::parse_html;
use crate::url::normalize_links;
use reqwest::header::{CONTENT_TYPE, REFERER};
use reqwest::{redirect::Policy, Client};
use std::sync::Arc;
use std::time::Duration;
use tokio::sync::OnceCell;
use tracing::{debug, info};

/// Status recorded when the request itself failed (timeout, DNS, refused)
pub const FETCH_FAILED_STATUS: u16 = 400;

/// Status recorded when the status was acceptable but the body is not HTML
pub const NOT_HTML_STATUS: u16 = 415;

/// Result of a fetch operation
#[derive(Debug, Clone)]
pub struct FetchOutcome {
    /// Status to record for the page
    pub status: u16,

    /// Page body; empty unless the response was accepted
    pub html: String,

    /// Normalized in-site links found on the page
    pub links: Vec<String>,

    /// True if the status was valid and the body was HTML
    pub accepted: bool,
}

impl FetchOutcome {
    fn rejected(status: u16) -> Self {
        Self {
            status,
            html: String::new(),
            links: Vec::new(),
            accepted: false,
        }
    }
}

/// Builds an HTTP client with proper configuration
///
/// # Arguments
///
/// * `config` - The user agent configuration
/// * `timeout` - Whole-request timeout
///
/// # Returns
///
/// * `Ok(Client)` - Successfully built HTTP client
/// * `Err(reqwest::Error)` - Failed to build client
///
/// # Example
///
/// ```no_run
/// use sitesearch::config::UserAgentConfig;
/// use sitesearch::crawler::build_http_client;
/// use std::time::Duration;
///
/// let config = UserAgentConfig {
///     agent: "SiteSearchBot/1.0".to_string(),
///     referrer: "https://www.google.com".to_string(),
/// };
///
/// let client = build_http_client(&config, Duration::from_secs(30)).unwrap();
/// ```
pub fn build_http_client(
    config: &UserAgentConfig,
    timeout: Duration,
) -> Result<Client, reqwest::Error> {
    Client::builder()
        .user_agent(config.agent.clone())
        .timeout(timeout)
        .connect_timeout(timeout.min(Duration::from_secs(10)))
        .redirect(Policy::limited(10))
        .gzip(true)
        .brotli(true)
        .build()
}

/// Shared fetch settings: the client, the referrer and the valid status set
#[derive(Clone)]
pub struct Fetcher {
    client: Client,
    referrer: Arc<str>,
    valid_status_codes: Arc<[u16]>,
}

impl Fetcher {
    pub fn new(client: Client, referrer: &str, valid_status_codes: &[u16]) -> Self {
        Self {
            client,
            referrer: Arc::from(referrer),
            valid_status_codes: Arc::from(valid_status_codes),
        }
    }

    /// Builds a fetcher from the `[user-agent]`, `[crawler]` and `[indexing]` sections
    pub fn from_config(config: &Config) -> Result<Self, reqwest::Error> {
        let client = build_http_client(
            &config.user_agent,
            Duration::from_secs(config.crawler.request_timeout_secs),
        )?;
        Ok(Self::new(
            client,
            &config.user_agent.referrer,
            &config.indexing.valid_status_codes,
        ))
    }

    /// Returns true if pages fetched with `status` may be indexed
    pub fn is_valid_status(&self, status: u16) -> bool {
        self.valid_status_codes.contains(&status)
    }

    /// Prepares a single-use fetch of `url`, resolving links against `root`
    pub fn page(&self, url: &str, root: &str) -> PageFetcher {
        PageFetcher {
            fetcher: self.clone(),
            url: url.to_string(),
            root: root.to_string(),
            outcome: OnceCell::new(),
        }
    }

    async fn perform(&self, url: &str, root: &str) -> FetchOutcome {
        let response = match self
            .client
            .get(url)
            .header(REFERER, self.referrer.as_ref())
            .send()
            .await
        {
            Ok(response) => response,
            Err(e) => {
                info!("Request to {} failed: {}", url, e);
                return FetchOutcome::rejected(FETCH_FAILED_STATUS);
            }
        };

        let status = response.status().as_u16();
        if !self.is_valid_status(status) {
            debug!("{} answered with status {}", url, status);
            return FetchOutcome::rejected(status);
        }

        let content_type = response
            .headers()
            .get(CONTENT_TYPE)
            .and_then(|v| v.to_str().ok())
            .unwrap_or("")
            .to_ascii_lowercase();

        if !content_type.contains("text/html") {
            debug!("{} is not HTML ({})", url, content_type);
            return FetchOutcome::rejected(NOT_HTML_STATUS);
        }

        let html = match response.text().await {
            Ok(body) => body,
            Err(e) => {
                info!("Failed to read body of {}: {}", url, e);
                return FetchOutcome::rejected(FETCH_FAILED_STATUS);
            }
        };

        let parsed = parse_html(&html);
        let links = normalize_links(parsed.hrefs.iter().map(String::as_str), root);
        debug!("{} [{}]: {} internal links", url, status, links.len());

        FetchOutcome {
            status,
            html,
            links,
            accepted: true,
        }
    }
}

/// Fetcher for exactly one URL
///
/// The network request happens on the first call to [`PageFetcher::fetch`];
/// later calls return the cached outcome.
pub struct PageFetcher {
    fetcher: Fetcher,
    url: String,
    root: String,
    outcome: OnceCell<FetchOutcome>,
}

impl PageFetcher {
    pub fn url(&self) -> &str {
        &self.url
    }

    /// Fetches the page once and returns the memoized outcome
    pub async fn fetch(&self) -> &FetchOutcome {
        self.outcome
            .get_or_init(|| self.fetcher.perform(&self.url, &self.root))
            .await
    }
}
