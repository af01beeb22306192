//! Interactive session: menu routing, per-workflow result slots, rendering
//!
//! A [`LabSession`] owns everything that survives between UI interactions.
//! The UI feeds it [`UiEvent`]s and draws whatever [`LabSession::render`]
//! returns for the current menu choice.

use crate::ai_client::{AimlClient, CompletionBackend};
use crate::analysis;
use crate::error::LabResult;
use crate::experiment;
use crate::papers::arxiv::ArxivClient;
use crate::papers::pdf_extractor::{DocumentDecoder, PdfExtractDecoder};
use crate::papers::{ArticleSearch, SearchResult, DEFAULT_MAX_RESULTS};
use crate::settings::{ModelRegistry, Settings};
use crate::utils::truncate_chars;
use serde::Serialize;
use std::sync::Arc;
use std::time::Duration;

/// The three workflows offered in the sidebar
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum MenuChoice {
    SearchArticles,
    PdfAnalysis,
    HypotheticalExperiments,
}

impl MenuChoice {
    pub const ALL: [MenuChoice; 3] = [
        MenuChoice::SearchArticles,
        MenuChoice::PdfAnalysis,
        MenuChoice::HypotheticalExperiments,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            MenuChoice::SearchArticles => "Search Articles",
            MenuChoice::PdfAnalysis => "PDF Analysis",
            MenuChoice::HypotheticalExperiments => "Hypothetical Experiments",
        }
    }

    pub fn heading(&self) -> &'static str {
        match self {
            MenuChoice::SearchArticles => "Search Scientific Articles",
            MenuChoice::PdfAnalysis => "PDF Analysis",
            MenuChoice::HypotheticalExperiments => "Create Hypothetical Experiments",
        }
    }

    /// Label of the input control for this workflow
    pub fn input_label(&self) -> &'static str {
        match self {
            MenuChoice::SearchArticles => "Enter your search query",
            MenuChoice::PdfAnalysis => "Upload a PDF file (path)",
            MenuChoice::HypotheticalExperiments => "Enter a topic for the hypothetical experiment",
        }
    }
}

/// What the main panel is showing
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum View {
    Idle,
    ShowingSearch,
    ShowingAnalysis,
    ShowingExperiment,
}

impl From<Option<MenuChoice>> for View {
    fn from(choice: Option<MenuChoice>) -> Self {
        match choice {
            None => View::Idle,
            Some(MenuChoice::SearchArticles) => View::ShowingSearch,
            Some(MenuChoice::PdfAnalysis) => View::ShowingAnalysis,
            Some(MenuChoice::HypotheticalExperiments) => View::ShowingExperiment,
        }
    }
}

/// One user interaction
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum UiEvent {
    Select(MenuChoice),
    SearchClicked(String),
    FileUploaded(Vec<u8>),
    GenerateClicked(String),
}

impl UiEvent {
    /// Workflow panel the control behind this event lives on
    fn panel(&self) -> Option<MenuChoice> {
        match self {
            UiEvent::Select(_) => None,
            UiEvent::SearchClicked(_) => Some(MenuChoice::SearchArticles),
            UiEvent::FileUploaded(_) => Some(MenuChoice::PdfAnalysis),
            UiEvent::GenerateClicked(_) => Some(MenuChoice::HypotheticalExperiments),
        }
    }
}

/// Results kept across interactions; an empty string means "not yet computed"
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize)]
pub struct SessionState {
    pub last_search_results: Vec<SearchResult>,
    pub last_pdf_analysis: String,
    pub last_experiment: String,
}

/// External collaborators of a session
#[derive(Clone)]
pub struct LabServices {
    pub search: Arc<dyn ArticleSearch>,
    pub decoder: Arc<dyn DocumentDecoder>,
    pub llm: Arc<dyn CompletionBackend>,
}

impl LabServices {
    /// Production wiring: arXiv, pdf-extract and the AIML API
    pub fn from_settings(settings: &Settings) -> LabResult<Self> {
        let timeout = Duration::from_secs(settings.request_timeout_secs);
        let models = ModelRegistry::from_settings(settings)?;

        Ok(Self {
            search: Arc::new(ArxivClient::new(&settings.arxiv_base_url, timeout)?),
            decoder: Arc::new(PdfExtractDecoder),
            llm: Arc::new(AimlClient::new(models, timeout)?),
        })
    }
}

pub struct LabSession {
    services: LabServices,
    state: SessionState,
    choice: Option<MenuChoice>,
    search_limit: usize,
    summary_preview_chars: usize,
}

impl LabSession {
    pub fn new(services: LabServices) -> Self {
        Self {
            services,
            state: SessionState::default(),
            choice: None,
            search_limit: DEFAULT_MAX_RESULTS,
            summary_preview_chars: 200,
        }
    }

    pub fn with_summary_preview(mut self, chars: usize) -> Self {
        self.summary_preview_chars = chars;
        self
    }

    pub fn with_search_limit(mut self, limit: usize) -> Self {
        self.search_limit = limit;
        self
    }

    pub fn state(&self) -> &SessionState {
        &self.state
    }

    pub fn view(&self) -> View {
        View::from(self.choice)
    }

    pub fn select(&mut self, choice: MenuChoice) {
        self.choice = Some(choice);
    }

    /// Route one interaction. Controls belong to a panel; events from a
    /// panel that is not on screen are ignored.
    pub async fn handle(&mut self, event: UiEvent) -> LabResult<()> {
        if let Some(panel) = event.panel() {
            if self.choice != Some(panel) {
                tracing::debug!(?panel, current = ?self.choice, "Ignoring event for hidden panel");
                return Ok(());
            }
        }

        match event {
            UiEvent::Select(choice) => self.select(choice),
            UiEvent::SearchClicked(query) => {
                self.search(&query).await?;
            }
            UiEvent::FileUploaded(document) => {
                self.analyze_upload(&document).await?;
            }
            UiEvent::GenerateClicked(topic) => {
                self.generate_experiment(&topic).await?;
            }
        }
        Ok(())
    }

    /// Run a search and replace the cached results
    pub async fn search(&mut self, query: &str) -> LabResult<&[SearchResult]> {
        let results = self.services.search.search(query, self.search_limit).await?;
        self.state.last_search_results = results;
        Ok(&self.state.last_search_results)
    }

    /// Analyze an upload unless an analysis is already cached.
    ///
    /// The slot is keyed on emptiness only: a different document still gets
    /// the cached analysis until [`LabSession::reset_analysis`] is called.
    pub async fn analyze_upload(&mut self, document: &[u8]) -> LabResult<&str> {
        if self.state.last_pdf_analysis.is_empty() {
            let text = analysis::analyze(
                self.services.decoder.as_ref(),
                self.services.llm.as_ref(),
                document,
            )
            .await?;
            self.state.last_pdf_analysis = text;
        } else {
            tracing::debug!("Reusing cached PDF analysis");
        }
        Ok(&self.state.last_pdf_analysis)
    }

    /// Generate an experiment unless one is already cached (same slot rule
    /// as [`LabSession::analyze_upload`]).
    pub async fn generate_experiment(&mut self, topic: &str) -> LabResult<&str> {
        if self.state.last_experiment.is_empty() {
            let text = experiment::generate(self.services.llm.as_ref(), topic).await?;
            self.state.last_experiment = text;
        } else {
            tracing::debug!("Reusing cached experiment");
        }
        Ok(&self.state.last_experiment)
    }

    pub fn reset_analysis(&mut self) {
        self.state.last_pdf_analysis.clear();
    }

    pub fn reset_experiment(&mut self) {
        self.state.last_experiment.clear();
    }

    /// Markdown for the current panel
    pub fn render(&self) -> String {
        match self.view() {
            View::Idle => String::new(),
            View::ShowingSearch => render_search_results(&self.state.last_search_results, self.summary_preview_chars),
            View::ShowingAnalysis => render_slot("PDF Analysis:", &self.state.last_pdf_analysis),
            View::ShowingExperiment => render_slot("Hypothetical Experiment:", &self.state.last_experiment),
        }
    }
}

/// One block per article; nothing at all for an empty result list
pub fn render_search_results(results: &[SearchResult], preview_chars: usize) -> String {
    let mut out = String::new();
    for result in results {
        out.push_str(&format!("**{}**\n", result.title));
        out.push_str(&format!("Authors: {}\n", result.authors));
        out.push_str(&format!("Summary: {}...\n", truncate_chars(&result.summary, preview_chars)));
        out.push_str(&format!("[PDF Link]({})\n", result.pdf_url));
        out.push_str("---\n");
    }
    out
}

fn render_slot(heading: &str, text: &str) -> String {
    if text.is_empty() {
        return String::new();
    }
    format!("{}\n{}\n", heading, text)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::analysis::ANALYSIS_PROMPT_PREFIX;
    use crate::error::LabError;
    use crate::testing::{article, FakeDecoder, FakeLlm, FakeSearch};

    struct Harness {
        search: Arc<FakeSearch>,
        llm: Arc<FakeLlm>,
        session: LabSession,
    }

    fn harness(search: FakeSearch, decoder: FakeDecoder, llm: FakeLlm) -> Harness {
        let search = Arc::new(search);
        let llm = Arc::new(llm);
        let session = LabSession::new(LabServices {
            search: search.clone(),
            decoder: Arc::new(decoder),
            llm: llm.clone(),
        });
        Harness { search, llm, session }
    }

    fn hello_pages() -> FakeDecoder {
        FakeDecoder::with_pages(vec!["Hello".to_string(), " world".to_string()])
    }

    #[test]
    fn test_view_follows_menu_choice() {
        let mut h = harness(FakeSearch::with_results(vec![]), hello_pages(), FakeLlm::echoing());
        assert_eq!(h.session.view(), View::Idle);
        assert_eq!(h.session.render(), "");

        h.session.select(MenuChoice::PdfAnalysis);
        assert_eq!(h.session.view(), View::ShowingAnalysis);
        h.session.select(MenuChoice::SearchArticles);
        assert_eq!(h.session.view(), View::ShowingSearch);
    }

    #[tokio::test]
    async fn test_search_scenario_three_results() {
        let all: Vec<_> = (1..=5).map(article).collect();
        let mut h = harness(FakeSearch::with_results(all), hello_pages(), FakeLlm::echoing());
        h.session = h.session.with_search_limit(3);
        h.session.select(MenuChoice::SearchArticles);

        h.session.handle(UiEvent::SearchClicked("quantum computing".to_string())).await.unwrap();

        let results = &h.session.state().last_search_results;
        assert_eq!(results.len(), 3);
        assert!(results.iter().all(|r| r.authors.contains(", ") && !r.pdf_url.is_empty()));
        assert_eq!(h.search.queries(), vec![("quantum computing".to_string(), 3)]);
    }

    #[tokio::test]
    async fn test_search_overwrites_and_stays_rendered() {
        let mut h = harness(FakeSearch::with_results(vec![article(1)]), hello_pages(), FakeLlm::echoing());
        h.session.select(MenuChoice::SearchArticles);
        h.session.search("first").await.unwrap();

        // Switching away and back re-renders the cached results without a new call
        h.session.select(MenuChoice::HypotheticalExperiments);
        h.session.select(MenuChoice::SearchArticles);
        let rendered = h.session.render();
        assert!(rendered.contains("**Paper 1**"));
        assert!(rendered.contains("Authors: Author 1a, Author 1b"));
        assert!(rendered.contains("[PDF Link](https://arxiv.org/pdf/2401.00001)"));
        assert_eq!(h.search.queries().len(), 1);
    }

    #[tokio::test]
    async fn test_search_with_zero_results_renders_nothing() {
        let mut h = harness(FakeSearch::with_results(vec![]), hello_pages(), FakeLlm::echoing());
        h.session.select(MenuChoice::SearchArticles);

        h.session.handle(UiEvent::SearchClicked("nothing matches".to_string())).await.unwrap();
        assert!(h.session.state().last_search_results.is_empty());
        assert_eq!(h.session.render(), "");
    }

    #[tokio::test]
    async fn test_failed_search_keeps_previous_results() {
        let mut h = harness(FakeSearch::with_results(vec![article(1)]), hello_pages(), FakeLlm::echoing());
        h.session.search("ok").await.unwrap();

        let mut failing = harness(FakeSearch::failing(), hello_pages(), FakeLlm::echoing());
        failing.session.state = h.session.state().clone();
        failing.session.select(MenuChoice::SearchArticles);
        let err = failing.session.handle(UiEvent::SearchClicked("boom".to_string())).await.unwrap_err();
        assert!(err.is_network());
        assert_eq!(failing.session.state().last_search_results, vec![article(1)]);
    }

    #[tokio::test]
    async fn test_upload_scenario_short_text_not_truncated() {
        let mut h = harness(FakeSearch::with_results(vec![]), hello_pages(), FakeLlm::replying("Findings"));
        h.session.select(MenuChoice::PdfAnalysis);

        h.session.handle(UiEvent::FileUploaded(b"%PDF-1.7".to_vec())).await.unwrap();

        let requests = h.llm.requests();
        assert_eq!(requests.len(), 1);
        assert_eq!(requests[0].prompt, format!("{}Hello world", ANALYSIS_PROMPT_PREFIX));
        assert_eq!(h.session.state().last_pdf_analysis, "Findings");
        assert_eq!(h.session.render(), "PDF Analysis:\nFindings\n");
    }

    #[tokio::test]
    async fn test_cached_analysis_is_not_recomputed() {
        let mut h = harness(FakeSearch::with_results(vec![]), hello_pages(), FakeLlm::replying("Findings"));
        h.session.select(MenuChoice::PdfAnalysis);

        h.session.handle(UiEvent::FileUploaded(b"%PDF-a".to_vec())).await.unwrap();
        h.session.handle(UiEvent::FileUploaded(b"%PDF-a".to_vec())).await.unwrap();
        assert_eq!(h.llm.requests().len(), 1);
    }

    #[tokio::test]
    async fn test_different_document_returns_stale_analysis() {
        let mut h = harness(FakeSearch::with_results(vec![]), hello_pages(), FakeLlm::echoing());
        let first = h.session.analyze_upload(b"%PDF-first").await.unwrap().to_string();

        let second = h.session.analyze_upload(b"%PDF-a-completely-different-file").await.unwrap();
        assert_eq!(second, first);
        assert_eq!(h.llm.requests().len(), 1);

        h.session.reset_analysis();
        h.session.analyze_upload(b"%PDF-after-reset").await.unwrap();
        assert_eq!(h.llm.requests().len(), 2);
    }

    #[tokio::test]
    async fn test_failed_analysis_leaves_slot_empty() {
        let mut h = harness(FakeSearch::with_results(vec![]), FakeDecoder::failing(), FakeLlm::echoing());
        h.session.select(MenuChoice::PdfAnalysis);

        let err = h.session.handle(UiEvent::FileUploaded(b"junk".to_vec())).await.unwrap_err();
        assert!(matches!(err, LabError::Decode(_)));
        assert!(h.session.state().last_pdf_analysis.is_empty());
        assert_eq!(h.session.render(), "");
    }

    #[tokio::test]
    async fn test_experiment_scenario_cold_fusion() {
        let mut h = harness(FakeSearch::with_results(vec![]), hello_pages(), FakeLlm::echoing());
        h.session.select(MenuChoice::HypotheticalExperiments);

        h.session.handle(UiEvent::GenerateClicked("cold fusion".to_string())).await.unwrap();

        let text = &h.session.state().last_experiment;
        assert!(text.contains("cold fusion"));
        assert!(text.contains("hypothesis") && text.contains("methodology") && text.contains("outcomes"));
        assert!(h.session.render().starts_with("Hypothetical Experiment:\n"));
    }

    #[tokio::test]
    async fn test_experiment_topic_change_returns_stale_result() {
        let mut h = harness(FakeSearch::with_results(vec![]), hello_pages(), FakeLlm::echoing());
        h.session.select(MenuChoice::HypotheticalExperiments);

        h.session.handle(UiEvent::GenerateClicked("cold fusion".to_string())).await.unwrap();
        h.session.handle(UiEvent::GenerateClicked("dark matter".to_string())).await.unwrap();

        assert!(h.session.state().last_experiment.contains("cold fusion"));
        assert!(!h.session.state().last_experiment.contains("dark matter"));
        assert_eq!(h.llm.requests().len(), 1);

        h.session.reset_experiment();
        h.session.handle(UiEvent::GenerateClicked("dark matter".to_string())).await.unwrap();
        assert!(h.session.state().last_experiment.contains("dark matter"));
    }

    #[tokio::test]
    async fn test_failure_isolated_to_one_panel() {
        let mut h = harness(FakeSearch::with_results(vec![article(7)]), hello_pages(), FakeLlm::failing());
        h.session.select(MenuChoice::SearchArticles);
        h.session.handle(UiEvent::SearchClicked("ok".to_string())).await.unwrap();

        h.session.select(MenuChoice::HypotheticalExperiments);
        assert!(h.session.handle(UiEvent::GenerateClicked("x".to_string())).await.is_err());
        assert!(h.session.state().last_experiment.is_empty());
        assert_eq!(h.session.state().last_search_results.len(), 1);
    }

    #[tokio::test]
    async fn test_events_for_hidden_panel_are_ignored() {
        let mut h = harness(FakeSearch::with_results(vec![article(1)]), hello_pages(), FakeLlm::echoing());
        h.session.handle(UiEvent::SearchClicked("q".to_string())).await.unwrap();
        assert!(h.search.queries().is_empty());

        h.session.handle(UiEvent::Select(MenuChoice::SearchArticles)).await.unwrap();
        h.session.handle(UiEvent::GenerateClicked("t".to_string())).await.unwrap();
        assert!(h.llm.requests().is_empty());
    }

    #[test]
    fn test_render_truncates_summary_preview() {
        let mut result = article(1);
        result.summary = "s".repeat(500);
        let rendered = render_search_results(&[result], 200);
        assert!(rendered.contains(&format!("Summary: {}...\n", "s".repeat(200))));
        assert!(rendered.ends_with("---\n"));
    }
}
