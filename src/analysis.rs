//! PDF analysis workflow
//!
//! Extracts the text of an uploaded document, keeps the first
//! [`ANALYSIS_CHAR_BUDGET`] characters and asks the fast model for a summary.

use crate::ai_client::{CompletionBackend, CompletionRequest};
use crate::error::LabResult;
use crate::papers::pdf_extractor::DocumentDecoder;
use crate::settings::ModelRole;
use crate::utils::truncate_chars;

pub const ANALYSIS_PROMPT_PREFIX: &str =
    "Analyze the following text and provide a summary of key findings: ";

/// Characters of document text sent to the model
pub const ANALYSIS_CHAR_BUDGET: usize = 4000;

/// Concatenate page texts (no separator) up to `budget` characters.
///
/// Stops pulling pages once the budget is reached; the result is identical to
/// concatenating everything and cutting at `budget`.
pub fn collect_text<I>(pages: I, budget: usize) -> String
where
    I: IntoIterator,
    I::Item: AsRef<str>,
{
    let mut text = String::new();
    let mut collected = 0;

    for page in pages {
        if collected >= budget {
            break;
        }
        let piece = truncate_chars(page.as_ref(), budget - collected);
        collected += piece.chars().count();
        text.push_str(piece);
    }

    text
}

pub fn analysis_prompt(text: &str) -> String {
    format!("{}{}", ANALYSIS_PROMPT_PREFIX, text)
}

/// Run the analysis workflow on raw document bytes
pub async fn analyze(
    decoder: &dyn DocumentDecoder,
    llm: &dyn CompletionBackend,
    document: &[u8],
) -> LabResult<String> {
    let pages = decoder.page_texts(document)?;
    let page_count = pages.len();
    let text = collect_text(pages, ANALYSIS_CHAR_BUDGET);

    tracing::info!(pages = page_count, chars = text.chars().count(), "Analyzing document");

    let completion = llm
        .complete(CompletionRequest {
            role: ModelRole::Fast,
            prompt: analysis_prompt(&text),
            max_tokens: None,
        })
        .await?;

    Ok(completion.text)
}
