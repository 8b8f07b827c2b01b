use serde::Serialize;

/// Shared record threaded through one workflow run.
///
/// Each step writes only the field it owns: the summarizer fills
/// `summaries`, the fusion step fills `narrative`.
#[derive(Serialize, Default, Clone, Debug, PartialEq)]
pub struct WorkflowState {
    pub chunks: Vec<String>,
    pub summaries: Vec<String>,
    pub narrative: Option<String>,
}

#[derive(Serialize, Clone, Copy, Debug, PartialEq, Eq)]
pub enum WorkflowPhase {
    Start,
    Summarizing,
    Fusing,
    Done,
    Failed,
}

impl WorkflowPhase {
    pub fn is_terminal(self) -> bool {
        matches!(self, WorkflowPhase::Done | WorkflowPhase::Failed)
    }
}
