//! Hypothetical experiment generation on the deep-reasoning model.

use crate::ai_client::{CompletionBackend, CompletionRequest};
use crate::error::LabResult;
use crate::settings::ModelRole;

/// Output token budget for experiment descriptions
pub const EXPERIMENT_MAX_TOKENS: u32 = 6000;

/// Topic goes in verbatim, empty included
pub fn experiment_prompt(topic: &str) -> String {
    format!(
        "Create a hypothetical experiment on the following topic: {}. Include hypothesis, methodology, and possible outcomes.",
        topic
    )
}

pub async fn generate(llm: &dyn CompletionBackend, topic: &str) -> LabResult<String> {
    tracing::info!(topic, "Generating hypothetical experiment");

    let completion = llm
        .complete(CompletionRequest {
            role: ModelRole::DeepReasoning,
            prompt: experiment_prompt(topic),
            max_tokens: Some(EXPERIMENT_MAX_TOKENS),
        })
        .await?;

    Ok(completion.text)
}
