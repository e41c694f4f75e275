//! Page analysis via the Firecrawl scrape API.
//!
//! Turns a user-supplied URL into the title, description and hero image that
//! seed a teaser render.

use std::time::Duration;

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use teaser_core::AnalyzerConfig;
use url::Url;

#[derive(Debug, thiserror::Error)]
pub enum AnalyzeError {
    #[error("Missing or invalid url")]
    InvalidUrl,

    #[error("FIRECRAWL_API_KEY is not set. Add it to your environment.")]
    MissingCredential,

    #[error("Invalid Firecrawl API key. Check FIRECRAWL_API_KEY.")]
    Unauthorized,

    #[error("Too many requests. Please wait a minute and try again.")]
    RateLimited,

    #[error(
        "Scraper is temporarily unavailable or the page could not be reached. \
         Try again in a moment or use a different URL."
    )]
    Unavailable,

    /// The scraper answered but reported failure.
    #[error("{0}")]
    ScrapeFailed(String),

    #[error("Analysis failed: {0}")]
    Other(String),
}

/// What the teaser needs to know about a page.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PageSummary {
    pub url: String,
    pub title: String,
    pub description: String,
    pub markdown: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image: Option<String>,
}

#[async_trait]
pub trait ContentAnalyzer: Send + Sync {
    async fn analyze(&self, url: &str) -> Result<PageSummary, AnalyzeError>;
}

/// Trim `raw` and default the scheme to `https://`.
pub fn normalize_url(raw: &str) -> Result<Url, AnalyzeError> {
    let trimmed = raw.trim();
    if trimmed.is_empty() {
        return Err(AnalyzeError::InvalidUrl);
    }
    let candidate = if trimmed.starts_with("http://") || trimmed.starts_with("https://") {
        trimmed.to_string()
    } else {
        format!("https://{}", trimmed)
    };
    let url = Url::parse(&candidate).map_err(|_| AnalyzeError::InvalidUrl)?;
    if url.host_str().is_none() {
        return Err(AnalyzeError::InvalidUrl);
    }
    Ok(url)
}

fn truncate_chars(text: &str, limit: usize) -> String {
    match text.char_indices().nth(limit) {
        Some((end, _)) => text[..end].to_string(),
        None => text.to_string(),
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeRequest<'a> {
    url: &'a str,
    formats: [&'a str; 1],
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeResponse {
    #[serde(default)]
    success: bool,
    #[serde(default)]
    error: Option<String>,
    #[serde(default)]
    data: Option<ScrapeData>,
}

#[derive(Debug, Default, Deserialize)]
struct ScrapeData {
    #[serde(default)]
    markdown: Option<String>,
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    metadata: Option<ScrapeMetadata>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ScrapeMetadata {
    #[serde(default)]
    title: Option<String>,
    #[serde(default)]
    description: Option<String>,
    #[serde(default)]
    og_image: Option<String>,
}

/// A failed scrape attempt, before it is mapped to an [`AnalyzeError`].
#[derive(Debug)]
enum AttemptError {
    Status(u16, String),
    Transport(String),
}

impl AttemptError {
    fn is_transient(&self) -> bool {
        matches!(self, AttemptError::Status(502 | 503, _))
    }
}

impl From<AttemptError> for AnalyzeError {
    fn from(err: AttemptError) -> Self {
        match err {
            AttemptError::Status(401, _) => AnalyzeError::Unauthorized,
            AttemptError::Status(429, _) => AnalyzeError::RateLimited,
            AttemptError::Status(502 | 503, _) => AnalyzeError::Unavailable,
            AttemptError::Status(status, message) => {
                AnalyzeError::Other(format!("HTTP {}: {}", status, message))
            }
            AttemptError::Transport(message) => AnalyzeError::Other(message),
        }
    }
}

pub struct FirecrawlAnalyzer {
    client: reqwest::Client,
    api_key: Option<String>,
    base_url: String,
    retry_delay: Duration,
    markdown_limit: usize,
}

impl FirecrawlAnalyzer {
    pub fn new(config: &AnalyzerConfig) -> Self {
        Self {
            client: reqwest::Client::new(),
            api_key: config
                .api_key
                .as_deref()
                .map(str::trim)
                .filter(|k| !k.is_empty())
                .map(str::to_string),
            base_url: config.base_url.trim_end_matches('/').to_string(),
            retry_delay: Duration::from_millis(config.retry_delay_ms),
            markdown_limit: config.markdown_limit,
        }
    }

    async fn scrape_once(&self, api_key: &str, url: &str) -> Result<ScrapeResponse, AttemptError> {
        let res = self
            .client
            .post(format!("{}/v1/scrape", self.base_url))
            .bearer_auth(api_key)
            .json(&ScrapeRequest {
                url,
                formats: ["markdown"],
            })
            .send()
            .await
            .map_err(|e| AttemptError::Transport(e.to_string()))?;

        let status = res.status();
        if !status.is_success() {
            let body: ScrapeResponse = res.json().await.unwrap_or_default();
            let message = body
                .error
                .unwrap_or_else(|| status.canonical_reason().unwrap_or("request failed").to_string());
            return Err(AttemptError::Status(status.as_u16(), message));
        }

        res.json()
            .await
            .map_err(|e| AttemptError::Transport(format!("invalid scrape response: {}", e)))
    }
}

#[async_trait]
impl ContentAnalyzer for FirecrawlAnalyzer {
    async fn analyze(&self, raw_url: &str) -> Result<PageSummary, AnalyzeError> {
        if raw_url.trim().is_empty() {
            return Err(AnalyzeError::InvalidUrl);
        }
        let api_key = self.api_key.as_deref().ok_or(AnalyzeError::MissingCredential)?;
        let url = normalize_url(raw_url)?;

        tracing::info!("Analyzing {}", url);
        let response = match self.scrape_once(api_key, url.as_str()).await {
            Ok(response) => response,
            Err(err) if err.is_transient() => {
                tracing::warn!("Scrape of {} failed ({:?}), retrying in {:?}", url, err, self.retry_delay);
                tokio::time::sleep(self.retry_delay).await;
                self.scrape_once(api_key, url.as_str()).await?
            }
            Err(err) => return Err(err.into()),
        };

        if !response.success {
            return Err(AnalyzeError::ScrapeFailed(
                response.error.unwrap_or_else(|| "Failed to scrape URL".to_string()),
            ));
        }

        let data = response.data.unwrap_or_default();
        let metadata = data.metadata.unwrap_or_default();
        let title = metadata.title.or(data.title).unwrap_or_default();
        let title = if title.trim().is_empty() {
            url.host_str().unwrap_or_default().to_string()
        } else {
            title
        };

        Ok(PageSummary {
            url: url.to_string(),
            title,
            description: metadata.description.or(data.description).unwrap_or_default(),
            markdown: truncate_chars(data.markdown.as_deref().unwrap_or_default(), self.markdown_limit),
            image: metadata.og_image.filter(|i| !i.trim().is_empty()),
        })
    }
}
