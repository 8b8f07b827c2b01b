use crate::core::error::{CompletionError, NarrationError};
use crate::core::state::WorkflowState;
use crate::services::llm::{CompletionRequest, LlmClient};
use crate::services::workflow::GenerationSettings;
use futures_util::StreamExt;
use std::num::NonZeroUsize;

pub const SUMMARY_SYSTEM_PROMPT: &str = "You are an expert assistant who summarizes content \
concisely and clearly for the targeted audience.";

/// Maps every chunk to one summary, in chunk order.
pub struct Summarizer<'a> {
    llm: &'a dyn LlmClient,
    settings: GenerationSettings,
    concurrency: NonZeroUsize,
}

impl<'a> Summarizer<'a> {
    pub fn new(
        llm: &'a dyn LlmClient,
        settings: GenerationSettings,
        concurrency: NonZeroUsize,
    ) -> Self {
        Self {
            llm,
            settings,
            concurrency,
        }
    }

    pub fn request_for(&self, chunk: &str) -> CompletionRequest {
        CompletionRequest {
            system: SUMMARY_SYSTEM_PROMPT.to_string(),
            user: format!("Summarize this content:\n\n{}", chunk),
            max_tokens: self.settings.max_tokens,
            temperature: self.settings.temperature,
        }
    }

    /// Fills `state.summaries`. Reads only `state.chunks`.
    ///
    /// The first failing chunk aborts the step; requests still in flight are
    /// dropped and `summaries` keeps only the contiguous prefix that finished.
    pub async fn run(&self, state: &mut WorkflowState) -> Result<(), NarrationError> {
        let requests: Vec<CompletionRequest> =
            state.chunks.iter().map(|c| self.request_for(c)).collect();
        let llm = self.llm;

        let mut slots: Vec<Option<String>> = vec![None; requests.len()];
        let mut pending = futures_util::stream::iter(requests.iter().enumerate())
            .map(|(i, request)| async move { (i, llm.complete(request).await) })
            .buffer_unordered(self.concurrency.get());

        while let Some((i, result)) = pending.next().await {
            match result.and_then(non_blank) {
                Ok(summary) => slots[i] = Some(summary),
                Err(source) => {
                    state.summaries = slots.into_iter().map_while(|s| s).collect();
                    return Err(NarrationError::Summarization { chunk: i, source });
                }
            }
        }

        state.summaries = slots.into_iter().flatten().collect();
        Ok(())
    }
}

pub(crate) fn non_blank(text: String) -> Result<String, CompletionError> {
    if text.trim().is_empty() {
        Err(CompletionError::Blank)
    } else {
        Ok(text)
    }
}
