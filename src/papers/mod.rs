//! Scientific article search and PDF text extraction
//!
//! - `arxiv`: relevance-sorted search against the arXiv export API, plus PDF download
//! - `pdf_extractor`: page-by-page text extraction from uploaded PDFs

pub mod arxiv;
pub mod pdf_extractor;

use crate::error::{LabError, LabResult};
use async_trait::async_trait;
use serde::{Deserialize, Serialize};

/// Result limit used when the caller does not pick one
pub const DEFAULT_MAX_RESULTS: usize = 5;

/// One normalized search hit
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SearchResult {
    pub title: String,
    pub summary: String,
    /// Author names joined with ", "
    pub authors: String,
    pub pdf_url: String,
}

#[async_trait]
pub trait ArticleSearch: Send + Sync {
    /// Up to `max_results` matches, most relevant first
    async fn search(&self, query: &str, max_results: usize) -> LabResult<Vec<SearchResult>>;
}

/// Reject a zero limit before any request goes out
pub fn validate_limit(max_results: usize) -> LabResult<()> {
    if max_results == 0 {
        return Err(LabError::Config("max_results must be a positive integer".to_string()));
    }
    Ok(())
}

pub fn join_authors<S: AsRef<str>>(names: &[S]) -> String {
    names
        .iter()
        .map(|n| n.as_ref().trim())
        .filter(|n| !n.is_empty())
        .collect::<Vec<_>>()
        .join(", ")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_join_authors() {
        assert_eq!(join_authors(&["Ada Lovelace", "Alan Turing"]), "Ada Lovelace, Alan Turing");
        assert_eq!(join_authors(&["  Solo  "]), "Solo");
        assert_eq!(join_authors::<&str>(&[]), "");
    }

    #[test]
    fn test_validate_limit() {
        assert!(validate_limit(1).is_ok());
        assert!(matches!(validate_limit(0), Err(LabError::Config(_))));
    }
}
