//! In-memory stand-ins for the external services, used by unit tests.

use crate::ai_client::{Completion, CompletionBackend, CompletionRequest};
use crate::error::{LabError, LabResult};
use crate::papers::pdf_extractor::DocumentDecoder;
use crate::papers::{validate_limit, ArticleSearch, SearchResult};
use async_trait::async_trait;
use std::sync::Mutex;

enum Reply {
    Fixed(String),
    Echo,
    Fail,
}

/// Records every request; replies with a fixed text, the prompt, or an error
pub struct FakeLlm {
    reply: Reply,
    requests: Mutex<Vec<CompletionRequest>>,
}

impl FakeLlm {
    pub fn replying(text: &str) -> Self {
        Self::new(Reply::Fixed(text.to_string()))
    }

    pub fn echoing() -> Self {
        Self::new(Reply::Echo)
    }

    pub fn failing() -> Self {
        Self::new(Reply::Fail)
    }

    fn new(reply: Reply) -> Self {
        Self { reply, requests: Mutex::new(Vec::new()) }
    }

    pub fn requests(&self) -> Vec<CompletionRequest> {
        self.requests.lock().unwrap().clone()
    }
}

#[async_trait]
impl CompletionBackend for FakeLlm {
    async fn complete(&self, request: CompletionRequest) -> LabResult<Completion> {
        self.requests.lock().unwrap().push(request.clone());
        let text = match &self.reply {
            Reply::Fixed(text) => text.clone(),
            Reply::Echo => request.prompt,
            Reply::Fail => return Err(LabError::Network("connection refused".to_string())),
        };
        Ok(Completion { text, usage: None })
    }
}

pub struct FakeDecoder {
    pages: Option<Vec<String>>,
}

impl FakeDecoder {
    pub fn with_pages(pages: Vec<String>) -> Self {
        Self { pages: Some(pages) }
    }

    pub fn failing() -> Self {
        Self { pages: None }
    }
}

impl DocumentDecoder for FakeDecoder {
    fn page_texts(&self, _document: &[u8]) -> LabResult<Vec<String>> {
        self.pages
            .clone()
            .ok_or_else(|| LabError::Decode("malformed document".to_string()))
    }
}

pub struct FakeSearch {
    results: Option<Vec<SearchResult>>,
    queries: Mutex<Vec<(String, usize)>>,
}

impl FakeSearch {
    pub fn with_results(results: Vec<SearchResult>) -> Self {
        Self { results: Some(results), queries: Mutex::new(Vec::new()) }
    }

    pub fn failing() -> Self {
        Self { results: None, queries: Mutex::new(Vec::new()) }
    }

    pub fn queries(&self) -> Vec<(String, usize)> {
        self.queries.lock().unwrap().clone()
    }
}

#[async_trait]
impl ArticleSearch for FakeSearch {
    async fn search(&self, query: &str, max_results: usize) -> LabResult<Vec<SearchResult>> {
        validate_limit(max_results)?;
        self.queries.lock().unwrap().push((query.to_string(), max_results));
        let results = self
            .results
            .clone()
            .ok_or_else(|| LabError::Api { status: 503, body: "unavailable".to_string() })?;
        Ok(results.into_iter().take(max_results).collect())
    }
}

pub fn article(n: usize) -> SearchResult {
    SearchResult {
        title: format!("Paper {}", n),
        summary: format!("Summary of paper {}", n),
        authors: format!("Author {}a, Author {}b", n, n),
        pdf_url: format!("https://arxiv.org/pdf/2401.{:05}", n),
    }
}
