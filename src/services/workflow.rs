use crate::core::error::NarrationError;
use crate::core::state::{WorkflowPhase, WorkflowState};
use crate::services::chunker::DEFAULT_CHUNK_SIZE;
use crate::services::llm::LlmClient;
use crate::services::narrative::NarrativeFuser;
use crate::services::summarize::Summarizer;
use serde::{Deserialize, Serialize};
use std::num::NonZeroUsize;

// --- Config ---

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq)]
pub struct GenerationSettings {
    pub max_tokens: u32,
    pub temperature: f32,
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct WorkflowConfig {
    #[serde(default = "default_chunk_size")]
    pub chunk_size: NonZeroUsize,
    #[serde(default = "default_summary_concurrency")]
    pub summary_concurrency: NonZeroUsize,
    #[serde(default = "default_summary_settings")]
    pub summary: GenerationSettings,
    #[serde(default = "default_narrative_settings")]
    pub narrative: GenerationSettings,
}

fn default_chunk_size() -> NonZeroUsize {
    DEFAULT_CHUNK_SIZE
}
fn default_summary_concurrency() -> NonZeroUsize {
    NonZeroUsize::MIN
}
fn default_summary_settings() -> GenerationSettings {
    GenerationSettings {
        max_tokens: 150,
        temperature: 0.7,
    }
}
fn default_narrative_settings() -> GenerationSettings {
    GenerationSettings {
        max_tokens: 500,
        temperature: 0.8,
    }
}

impl Default for WorkflowConfig {
    fn default() -> Self {
        Self {
            chunk_size: default_chunk_size(),
            summary_concurrency: default_summary_concurrency(),
            summary: default_summary_settings(),
            narrative: default_narrative_settings(),
        }
    }
}

// --- Run ---

/// One single-shot pass through the workflow graph.
///
/// ```text
/// Start -> Summarizing -> Fusing -> Done
///               |            |
///               +--> Failed <+
/// ```
#[derive(Debug)]
pub struct WorkflowRun {
    phase: WorkflowPhase,
    state: WorkflowState,
    failure: Option<NarrationError>,
}

impl WorkflowRun {
    /// Validates the chunks before anything talks to the Completion Service.
    pub fn new(chunks: Vec<String>) -> Result<Self, NarrationError> {
        if chunks.is_empty() {
            return Err(NarrationError::Validation(
                "chunks must be a non-empty list of strings".to_string(),
            ));
        }
        if let Some(i) = chunks.iter().position(|c| c.trim().is_empty()) {
            return Err(NarrationError::Validation(format!("chunk {} is blank", i)));
        }

        Ok(Self {
            phase: WorkflowPhase::Start,
            state: WorkflowState {
                chunks,
                ..Default::default()
            },
            failure: None,
        })
    }

    pub fn phase(&self) -> WorkflowPhase {
        self.phase
    }

    pub fn state(&self) -> &WorkflowState {
        &self.state
    }

    pub fn failure(&self) -> Option<&NarrationError> {
        self.failure.as_ref()
    }

    fn fail(&mut self, err: NarrationError) {
        self.failure = Some(err);
        self.phase = WorkflowPhase::Failed;
    }

    /// The narrative of a `Done` run, or the error of a `Failed` one.
    pub fn into_result(self) -> Result<String, NarrationError> {
        match (self.phase, self.failure, self.state.narrative) {
            (WorkflowPhase::Done, _, Some(narrative)) => Ok(narrative),
            (WorkflowPhase::Failed, Some(err), _) => Err(err),
            (phase, _, _) => Err(NarrationError::Validation(format!(
                "workflow run stopped in {:?} phase",
                phase
            ))),
        }
    }
}

// --- Orchestrator ---

pub struct NarrationWorkflow<'a> {
    llm: &'a dyn LlmClient,
    config: &'a WorkflowConfig,
}

impl<'a> NarrationWorkflow<'a> {
    pub fn new(llm: &'a dyn LlmClient, config: &'a WorkflowConfig) -> Self {
        Self { llm, config }
    }

    pub async fn run(&self, chunks: Vec<String>) -> Result<String, NarrationError> {
        let run = WorkflowRun::new(chunks)?;
        self.execute(run).await.into_result()
    }

    /// Drives `run` to a terminal phase. A terminal run is returned as is.
    pub async fn execute(&self, mut run: WorkflowRun) -> WorkflowRun {
        while !run.phase.is_terminal() {
            match run.phase {
                WorkflowPhase::Start => run.phase = WorkflowPhase::Summarizing,
                WorkflowPhase::Summarizing => {
                    let summarizer = Summarizer::new(
                        self.llm,
                        self.config.summary,
                        self.config.summary_concurrency,
                    );
                    match summarizer.run(&mut run.state).await {
                        Ok(()) => run.phase = WorkflowPhase::Fusing,
                        Err(e) => run.fail(e),
                    }
                }
                WorkflowPhase::Fusing => {
                    let fuser = NarrativeFuser::new(self.llm, self.config.narrative);
                    match fuser.run(&mut run.state).await {
                        Ok(()) => run.phase = WorkflowPhase::Done,
                        Err(e) => run.fail(e),
                    }
                }
                WorkflowPhase::Done | WorkflowPhase::Failed => break,
            }
        }
        run
    }
}
