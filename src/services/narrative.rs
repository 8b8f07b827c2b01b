use crate::core::error::NarrationError;
use crate::core::state::WorkflowState;
use crate::services::llm::{CompletionRequest, LlmClient};
use crate::services::summarize::non_blank;
use crate::services::workflow::GenerationSettings;

pub const NARRATIVE_SYSTEM_PROMPT: &str = "You are an expert assistant that transforms \
summaries into an engaging, human-friendly narrative for non-expert readers. Use clear \
language, logical transitions, and avoid unnecessary jargon.";

/// Fuses the ordered summaries into one narrative.
pub struct NarrativeFuser<'a> {
    llm: &'a dyn LlmClient,
    settings: GenerationSettings,
}

impl<'a> NarrativeFuser<'a> {
    pub fn new(llm: &'a dyn LlmClient, settings: GenerationSettings) -> Self {
        Self { llm, settings }
    }

    pub fn request_for(&self, summaries: &[String]) -> CompletionRequest {
        CompletionRequest {
            system: NARRATIVE_SYSTEM_PROMPT.to_string(),
            user: format!(
                "Create a cohesive narrative from these summaries:\n\n{}",
                summaries.join("\n")
            ),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Fills `state.narrative`. Reads only `state.summaries`.
    pub async fn run(&self, state: &mut WorkflowState) -> Result<(), NarrationError> {
        let request = self.request_for(&state.summaries);
        let narrative = self
            .llm
            .complete(&request)
            .await
            .and_then(non_blank)
            .map_err(NarrationError::Fusion)?;
        state.narrative = Some(narrative);
        Ok(())
    }
}
