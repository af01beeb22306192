//! arXiv search and PDF download
//!
//! API documentation: https://info.arxiv.org/help/api/user-manual.html
//! Results come back as an Atom feed. No API key required.

use super::{join_authors, validate_limit, ArticleSearch, SearchResult};
use crate::error::{LabError, LabResult};
use crate::utils::collapse_whitespace;
use async_trait::async_trait;
use regex::Regex;
use reqwest::Client;
use serde::Deserialize;
use std::sync::OnceLock;
use std::time::Duration;

const USER_AGENT: &str = concat!("reasoning-lab/", env!("CARGO_PKG_VERSION"));

/// Largest PDF accepted for download (20MB)
const MAX_PDF_BYTES: usize = 20 * 1024 * 1024;

/// Atom feed returned by the export API
#[derive(Debug, Deserialize)]
struct Feed {
    #[serde(rename = "entry", default)]
    entries: Vec<Entry>,
}

#[derive(Debug, Deserialize)]
struct Entry {
    #[serde(default)]
    id: String,
    #[serde(default)]
    title: String,
    #[serde(default)]
    summary: String,
    #[serde(rename = "author", default)]
    authors: Vec<RawAuthor>,
    #[serde(rename = "link", default)]
    links: Vec<RawLink>,
}

#[derive(Debug, Deserialize)]
struct RawAuthor {
    #[serde(default)]
    name: String,
}

#[derive(Debug, Deserialize)]
struct RawLink {
    #[serde(rename = "@href", default)]
    href: String,
    #[serde(rename = "@title")]
    title: Option<String>,
    #[serde(rename = "@type")]
    link_type: Option<String>,
}

/// Extract arXiv ID from an identifier or URL
///
/// Handles:
/// - `arXiv:2301.12345v2` → `2301.12345`
/// - `http://arxiv.org/abs/2301.12345v1` → `2301.12345`
/// - `http://arxiv.org/abs/hep-th/9901001v1` → `hep-th/9901001`
pub fn extract_arxiv_id(identifier: &str) -> Option<String> {
    static NEW_FORMAT: OnceLock<Regex> = OnceLock::new();
    static OLD_FORMAT: OnceLock<Regex> = OnceLock::new();

    // YYMM.NNNNN, optional version suffix
    let new_format = NEW_FORMAT.get_or_init(|| Regex::new(r"(?:arXiv:)?(\d{4}\.\d{4,5})(?:v\d+)?").unwrap());
    // Pre-2007: archive/YYMMNNN
    let old_format = OLD_FORMAT.get_or_init(|| Regex::new(r"(?:arXiv:)?([a-z\-]+(?:\.[A-Z]{2})?/\d{7})").unwrap());

    new_format
        .captures(identifier)
        .or_else(|| old_format.captures(identifier))
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}

/// Parse the Atom feed into normalized results, keeping at most `max_results`
fn parse_feed(xml: &str, max_results: usize) -> LabResult<Vec<SearchResult>> {
    let feed: Feed = quick_xml::de::from_str(xml)
        .map_err(|e| LabError::Network(format!("Malformed arXiv response: {}", e)))?;

    // The API reports bad queries as a single entry pointing at its error docs
    if let Some(err) = feed.entries.iter().find(|e| e.id.contains("/api/errors")) {
        return Err(LabError::Api {
            status: 400,
            body: collapse_whitespace(&err.summary),
        });
    }

    let results = feed
        .entries
        .into_iter()
        .filter_map(parse_entry)
        .take(max_results)
        .collect();

    Ok(results)
}

/// Map one entry; entries without a PDF URL are dropped
fn parse_entry(entry: Entry) -> Option<SearchResult> {
    let pdf_url = entry
        .links
        .iter()
        .find(|l| {
            l.title.as_deref() == Some("pdf")
                || l.link_type.as_deref() == Some("application/pdf")
        })
        .map(|l| l.href.trim().to_string())
        .filter(|href| !href.is_empty())
        .or_else(|| extract_arxiv_id(&entry.id).map(|id| format!("https://arxiv.org/pdf/{}", id)))?;

    let names: Vec<&str> = entry.authors.iter().map(|a| a.name.as_str()).collect();

    Some(SearchResult {
        title: collapse_whitespace(&entry.title),
        summary: collapse_whitespace(&entry.summary),
        authors: join_authors(&names),
        pdf_url,
    })
}

/// Validate URL for document download
fn is_valid_download_url(url_str: &str) -> bool {
    let parsed = match url::Url::parse(url_str) {
        Ok(u) => u,
        Err(_) => return false,
    };

    // Must be http/https
    if !matches!(parsed.scheme(), "http" | "https") {
        return false;
    }

    match parsed.host_str() {
        Some(host) => host != "localhost" && host != "127.0.0.1" && host.contains('.'),
        None => false,
    }
}

/// Reject a download before reading its body: wrong content type or a
/// declared length over the cap
fn check_pdf_headers(content_type: Option<&str>, content_length: Option<u64>) -> LabResult<()> {
    if let Some(content_type) = content_type {
        if !content_type.contains("pdf") && !content_type.contains("octet-stream") {
            return Err(LabError::Decode(format!("Server returned non-PDF content: {}", content_type)));
        }
    }

    // Check content-length header first
    if let Some(length) = content_length {
        if length > MAX_PDF_BYTES as u64 {
            return Err(LabError::Decode(format!(
                "PDF too large: {} MB (limit: {} MB)",
                length / 1024 / 1024,
                MAX_PDF_BYTES / 1024 / 1024
            )));
        }
    }
    Ok(())
}

/// Servers may omit or misreport Content-Length, so the body is checked too
fn check_pdf_body(bytes: &[u8]) -> LabResult<()> {
    // Validate PDF magic bytes
    if bytes.len() < 4 || &bytes[0..4] != b"%PDF" {
        return Err(LabError::Decode("Download is not a valid PDF".to_string()));
    }

    if bytes.len() > MAX_PDF_BYTES {
        return Err(LabError::Decode(format!("PDF too large: {} MB", bytes.len() / 1024 / 1024)));
    }
    Ok(())
}

/// arXiv export API client
pub struct ArxivClient {
    client: Client,
    base_url: String,
}

impl ArxivClient {
    pub fn new(base_url: &str, timeout: Duration) -> LabResult<Self> {
        let client = Client::builder()
            .timeout(timeout)
            .user_agent(USER_AGENT)
            .build()
            .map_err(|e| LabError::Config(format!("Failed to create HTTP client: {}", e)))?;

        Ok(Self {
            client,
            base_url: base_url.to_string(),
        })
    }

    /// Download a PDF, e.g. the `pdf_url` of a search result
    ///
    /// Redirects are followed automatically.
    pub async fn fetch_pdf(&self, url: &str) -> LabResult<Vec<u8>> {
        if !is_valid_download_url(url) {
            return Err(LabError::Config(format!("Not a downloadable URL: {}", url)));
        }

        tracing::info!(url, "Downloading PDF");
        let mut response = self.client.get(url).send().await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LabError::Api { status, body });
        }

        let content_type = response
            .headers()
            .get("content-type")
            .map(|v| v.to_str().unwrap_or("").to_string());
        check_pdf_headers(content_type.as_deref(), response.content_length())?;

        // Read in chunks so an undeclared oversized body stops at the cap
        let mut bytes = Vec::new();
        while let Some(chunk) = response.chunk().await? {
            bytes.extend_from_slice(&chunk);
            if bytes.len() > MAX_PDF_BYTES {
                break;
            }
        }
        check_pdf_body(&bytes)?;

        Ok(bytes)
    }
}

#[async_trait]
impl ArticleSearch for ArxivClient {
    async fn search(&self, query: &str, max_results: usize) -> LabResult<Vec<SearchResult>> {
        validate_limit(max_results)?;

        tracing::info!(query, max_results, "[arXiv] Searching");

        let max = max_results.to_string();
        let response = self
            .client
            .get(&self.base_url)
            .query(&[
                ("search_query", query),
                ("start", "0"),
                ("max_results", max.as_str()),
                ("sortBy", "relevance"),
                ("sortOrder", "descending"),
            ])
            .header("Accept", "application/atom+xml")
            .send()
            .await?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let body = response.text().await.unwrap_or_default();
            return Err(LabError::Api { status, body });
        }

        let text = response.text().await?;
        let results = parse_feed(&text, max_results)?;

        tracing::info!(returned = results.len(), "[arXiv] Search finished");
        Ok(results)
    }
}
