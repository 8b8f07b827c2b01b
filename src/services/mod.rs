pub mod chunker;
pub mod document;
pub mod llm;
pub mod narrative;
pub mod pipeline;
pub mod setup;
pub mod summarize;
pub mod tts;
pub mod workflow;
