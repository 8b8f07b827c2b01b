use std::fmt;
use thiserror::Error;

/// Failure of a single Completion Service call.
///
/// The workflow does not distinguish between these causes; they are kept
/// apart so the retry layer and the logs can.
#[derive(Error, Debug)]
pub enum CompletionError {
    #[error("request timed out")]
    Timeout,

    #[error("transport error: {0}")]
    Transport(#[source] reqwest::Error),

    #[error("{provider} API error ({status}): {body}")]
    Api {
        provider: &'static str,
        status: u16,
        body: String,
    },

    #[error("failed to parse {provider} response: {message}")]
    Malformed {
        provider: &'static str,
        message: String,
    },

    #[error("{provider} response empty: {reason}")]
    Empty {
        provider: &'static str,
        reason: String,
    },

    #[error("completion service returned blank text")]
    Blank,
}

impl From<reqwest::Error> for CompletionError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_timeout() {
            CompletionError::Timeout
        } else {
            CompletionError::Transport(err)
        }
    }
}

#[derive(Error, Debug)]
pub enum SynthesisError {
    #[error("narrative contains no speakable text")]
    NothingToSay,

    #[error("segment {segment} timed out after {seconds}s")]
    Timeout { segment: usize, seconds: u64 },

    #[error("segment {segment} failed: {message}")]
    Provider { segment: usize, message: String },

    #[error("failed to merge audio: {0}")]
    Merge(String),

    #[error("failed to store audio: {0}")]
    Storage(String),
}

/// Stage a narration failure is attributed to.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Stage {
    Validation,
    Summarization,
    Fusion,
    Synthesis,
}

impl fmt::Display for Stage {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            Stage::Validation => "validation",
            Stage::Summarization => "summarization",
            Stage::Fusion => "fusion",
            Stage::Synthesis => "synthesis",
        };
        f.write_str(name)
    }
}

#[derive(Error, Debug)]
pub enum NarrationError {
    #[error("invalid input: {0}")]
    Validation(String),

    #[error("summarization failed at chunk {chunk}: {source}")]
    Summarization {
        chunk: usize,
        #[source]
        source: CompletionError,
    },

    #[error("narrative generation failed: {0}")]
    Fusion(#[source] CompletionError),

    #[error("audio synthesis failed: {0}")]
    Synthesis(#[from] SynthesisError),
}

pub const BAD_INPUT_MESSAGE: &str =
    "The document appears to be empty, unreadable, or of an unsupported type.";
pub const PROCESSING_FAILED_MESSAGE: &str =
    "Something went wrong while processing the document. Please try again later.";

impl NarrationError {
    pub fn stage(&self) -> Stage {
        match self {
            NarrationError::Validation(_) => Stage::Validation,
            NarrationError::Summarization { .. } => Stage::Summarization,
            NarrationError::Fusion(_) => Stage::Fusion,
            NarrationError::Synthesis(_) => Stage::Synthesis,
        }
    }

    pub fn is_bad_input(&self) -> bool {
        self.stage() == Stage::Validation
    }

    /// Message safe to show an end user. Never includes collaborator detail.
    pub fn user_message(&self) -> &'static str {
        if self.is_bad_input() {
            BAD_INPUT_MESSAGE
        } else {
            PROCESSING_FAILED_MESSAGE
        }
    }
}
