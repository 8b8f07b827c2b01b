use crate::core::config::Config;
use crate::core::error::{NarrationError, Stage, SynthesisError};
use crate::core::io::Storage;
use crate::services::chunker::chunk_text;
use crate::services::document::{extract_text, DocumentKind};
use crate::services::llm::LlmClient;
use crate::services::tts::{AudioSynthesizer, TtsClient};
use crate::services::workflow::NarrationWorkflow;
use log::{error, info, warn};
use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

/// Result of one successful run.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationArtifact {
    pub narrative: String,
    pub audio_filename: String,
}

/// What the end user gets to see. Internal error text never reaches it.
#[derive(Debug, Clone, PartialEq)]
pub enum NarrationOutcome {
    Narrated(NarrationArtifact),
    Rejected { stage: Stage, message: &'static str },
    Failed { stage: Stage, message: &'static str },
}

pub struct Pipeline {
    config: Config,
    llm: Box<dyn LlmClient>,
    tts: Box<dyn TtsClient>,
    storage: Arc<dyn Storage>,
}

impl Pipeline {
    pub fn new(
        config: Config,
        llm: Box<dyn LlmClient>,
        tts: Box<dyn TtsClient>,
        storage: Arc<dyn Storage>,
    ) -> Self {
        Self {
            config,
            llm,
            tts,
            storage,
        }
    }

    /// Narrates the document at `path` and logs any failure with full detail.
    pub async fn handle(&self, path: &str) -> NarrationOutcome {
        match self.process(path).await {
            Ok(artifact) => {
                info!("Narrated {} into {}", path, artifact.audio_filename);
                NarrationOutcome::Narrated(artifact)
            }
            Err(err) if err.is_bad_input() => {
                warn!("Rejected {}: {}", path, err);
                NarrationOutcome::Rejected {
                    stage: err.stage(),
                    message: err.user_message(),
                }
            }
            Err(err) => {
                error!("Narration of {} failed at {} stage: {}", path, err.stage(), err);
                NarrationOutcome::Failed {
                    stage: err.stage(),
                    message: err.user_message(),
                }
            }
        }
    }

    pub async fn process(&self, path: &str) -> Result<NarrationArtifact, NarrationError> {
        let kind = self.validate_upload(path).await?;

        let bytes = self
            .storage
            .read(path)
            .await
            .map_err(|e| NarrationError::Validation(format!("{:#}", e)))?;
        let text = extract_text(kind, &bytes)
            .map_err(|e| NarrationError::Validation(format!("{:#}", e)))?;

        self.narrate_text(&text).await
    }

    /// File checks done before anything is read.
    pub async fn validate_upload(&self, path: &str) -> Result<DocumentKind, NarrationError> {
        let kind = DocumentKind::from_path(path).ok_or_else(|| {
            NarrationError::Validation(format!(
                "Unsupported file type {}; expected one of {:?}",
                path,
                DocumentKind::SUPPORTED_EXTENSIONS
            ))
        })?;

        let size = self
            .storage
            .size(path)
            .await
            .map_err(|e| NarrationError::Validation(format!("{:#}", e)))?;
        if size > self.config.max_file_size_bytes() {
            return Err(NarrationError::Validation(format!(
                "File exceeds the maximum size of {} MB",
                self.config.max_file_size_mb
            )));
        }

        Ok(kind)
    }

    pub async fn narrate_text(&self, text: &str) -> Result<NarrationArtifact, NarrationError> {
        if text.trim().is_empty() {
            return Err(NarrationError::Validation(
                "The document appears to be empty or unreadable".to_string(),
            ));
        }

        let chunks = chunk_text(text, self.config.workflow.chunk_size);
        info!("Summarizing {} chunks...", chunks.len());

        let workflow = NarrationWorkflow::new(self.llm.as_ref(), &self.config.workflow);
        let narrative = workflow.run(chunks).await?;
        info!("Generated narrative ({} chars), synthesizing audio...", narrative.len());

        let synthesizer = AudioSynthesizer::new(
            self.tts.as_ref(),
            self.storage.as_ref(),
            &self.config.output_folder,
            Duration::from_secs(self.config.audio.timeout_seconds),
        );
        let audio = synthesizer.synthesize(&narrative).await?;

        if let Err(err) = self.store_transcript(&audio.filename, &narrative).await {
            let audio_path = Path::new(&self.config.output_folder).join(&audio.filename);
            if let Err(e) = self.storage.remove(&audio_path.to_string_lossy()).await {
                warn!("Could not remove orphaned audio {}: {:#}", audio_path.display(), e);
            }
            return Err(err.into());
        }

        Ok(NarrationArtifact {
            narrative,
            audio_filename: audio.filename,
        })
    }

    async fn store_transcript(&self, audio_filename: &str, narrative: &str) -> Result<(), SynthesisError> {
        let path = Path::new(&self.config.output_folder)
            .join(audio_filename)
            .with_extension("txt");
        self.storage
            .write(&path.to_string_lossy(), narrative.as_bytes())
            .await
            .map_err(|e| SynthesisError::Storage(format!("{:#}", e)))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::core::config::AudioConfig;
    use crate::core::error::{CompletionError, BAD_INPUT_MESSAGE, PROCESSING_FAILED_MESSAGE};
    use crate::core::io::NativeStorage;
    use crate::services::llm::{CompletionRequest, LlmConfig};
    use crate::services::narrative::NARRATIVE_SYSTEM_PROMPT;
    use crate::services::tts::tests::MockTts;
    use crate::services::tts::Voice;
    use crate::services::workflow::tests::ScriptedLlm;
    use crate::services::workflow::WorkflowConfig;
    use anyhow::Result;
    use async_trait::async_trait;
    use std::num::NonZeroUsize;
    use std::path::PathBuf;

    #[async_trait]
    impl LlmClient for Arc<ScriptedLlm> {
        async fn complete(&self, request: &CompletionRequest) -> Result<String, CompletionError> {
            (**self).complete(request).await
        }
    }

    #[async_trait]
    impl TtsClient for Arc<MockTts> {
        async fn list_voices(&self) -> Result<Vec<Voice>> {
            (**self).list_voices().await
        }
        async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
            (**self).synthesize(text).await
        }
        fn max_segment_chars(&self) -> usize {
            (**self).max_segment_chars()
        }
    }

    struct Fixture {
        _dir: tempfile::TempDir,
        input: PathBuf,
        output: PathBuf,
        llm: Arc<ScriptedLlm>,
        tts: Arc<MockTts>,
        pipeline: Pipeline,
    }

    fn fixture(llm: ScriptedLlm, tts: MockTts, workflow: WorkflowConfig) -> Fixture {
        let dir = tempfile::tempdir().unwrap();
        let input = dir.path().join("input");
        let output = dir.path().join("output");
        std::fs::create_dir_all(&input).unwrap();

        let config = Config {
            input_folder: input.to_string_lossy().to_string(),
            output_folder: output.to_string_lossy().to_string(),
            unattended: true,
            max_file_size_mb: 1,
            llm: LlmConfig {
                provider: "mock".to_string(),
                retry_count: 0,
                retry_delay_seconds: 0,
                timeout_seconds: 1,
                gemini: None,
                ollama: None,
                openai: None,
            },
            workflow,
            audio: AudioConfig::default(),
        };

        let llm = Arc::new(llm);
        let tts = Arc::new(tts);
        let pipeline = Pipeline::new(
            config,
            Box::new(llm.clone()),
            Box::new(tts.clone()),
            Arc::new(NativeStorage::new()),
        );
        Fixture {
            _dir: dir,
            input,
            output,
            llm,
            tts,
            pipeline,
        }
    }

    fn write_doc(fx: &Fixture, name: &str, content: &[u8]) -> String {
        let path = fx.input.join(name);
        std::fs::write(&path, content).unwrap();
        path.to_string_lossy().to_string()
    }

    fn words(n: usize) -> String {
        (0..n).map(|i| format!("w{}", i)).collect::<Vec<_>>().join(" ")
    }

    #[tokio::test]
    async fn test_3200_word_document_is_narrated() {
        let fx = fixture(ScriptedLlm::echo(), MockTts::new(), WorkflowConfig::default());
        let path = write_doc(&fx, "report.txt", words(3200).as_bytes());

        let outcome = fx.pipeline.handle(&path).await;

        let artifact = match outcome {
            NarrationOutcome::Narrated(a) => a,
            other => panic!("unexpected outcome: {:?}", other),
        };
        assert_eq!(artifact.narrative, "summary of w3199");
        assert_eq!(fx.llm.calls(), 4);
        assert_eq!(fx.tts.calls.lock().unwrap().len(), 1);

        let audio = std::fs::read(fx.output.join(&artifact.audio_filename)).unwrap();
        assert_eq!(audio, artifact.narrative.as_bytes());
        let transcript = fx
            .output
            .join(&artifact.audio_filename)
            .with_extension("txt");
        assert_eq!(std::fs::read_to_string(transcript).unwrap(), artifact.narrative);
    }

    #[tokio::test]
    async fn test_empty_document_rejected_without_calls() {
        let fx = fixture(ScriptedLlm::echo(), MockTts::new(), WorkflowConfig::default());
        let path = write_doc(&fx, "blank.txt", b"   \n\t ");

        let outcome = fx.pipeline.handle(&path).await;

        assert_eq!(
            outcome,
            NarrationOutcome::Rejected {
                stage: Stage::Validation,
                message: BAD_INPUT_MESSAGE,
            }
        );
        assert_eq!(fx.llm.calls(), 0);
        assert!(fx.tts.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_unsupported_extension_rejected() {
        let fx = fixture(ScriptedLlm::echo(), MockTts::new(), WorkflowConfig::default());
        let path = write_doc(&fx, "slides.pptx", b"PK\x03\x04");

        let err = fx.pipeline.process(&path).await.unwrap_err();
        assert!(err.is_bad_input());
        assert_eq!(fx.llm.calls(), 0);
    }

    #[tokio::test]
    async fn test_oversize_file_rejected() {
        let fx = fixture(ScriptedLlm::echo(), MockTts::new(), WorkflowConfig::default());
        let big = vec![b'a'; 1024 * 1024 + 1];
        let path = write_doc(&fx, "big.txt", &big);

        let err = fx.pipeline.validate_upload(&path).await.unwrap_err();
        assert!(matches!(err, NarrationError::Validation(msg) if msg.contains("1 MB")));
    }

    #[tokio::test]
    async fn test_missing_file_rejected() {
        let fx = fixture(ScriptedLlm::echo(), MockTts::new(), WorkflowConfig::default());
        let path = fx.input.join("ghost.txt");

        let err = fx.pipeline.process(&path.to_string_lossy()).await.unwrap_err();
        assert!(err.is_bad_input());
    }

    #[tokio::test]
    async fn test_summarization_failure_is_generic_processing_error() {
        let workflow = WorkflowConfig {
            chunk_size: NonZeroUsize::MIN,
            ..WorkflowConfig::default()
        };
        let fx = fixture(ScriptedLlm::echo().failing_on("second"), MockTts::new(), workflow);
        let path = write_doc(&fx, "two.txt", b"first second");

        let outcome = fx.pipeline.handle(&path).await;

        assert_eq!(
            outcome,
            NarrationOutcome::Failed {
                stage: Stage::Summarization,
                message: PROCESSING_FAILED_MESSAGE,
            }
        );
        assert_eq!(fx.llm.calls(), 2);
        assert_eq!(fx.llm.calls_with_system(NARRATIVE_SYSTEM_PROMPT), 0);
        assert!(fx.tts.calls.lock().unwrap().is_empty());
    }

    #[tokio::test]
    async fn test_synthesis_failure_is_distinct() {
        let tts = MockTts {
            fail_on: Some("summary".to_string()),
            ..MockTts::new()
        };
        let fx = fixture(ScriptedLlm::echo(), tts, WorkflowConfig::default());
        let path = write_doc(&fx, "short.md", b"a short note");

        let outcome = fx.pipeline.handle(&path).await;

        assert_eq!(
            outcome,
            NarrationOutcome::Failed {
                stage: Stage::Synthesis,
                message: PROCESSING_FAILED_MESSAGE,
            }
        );
        assert!(!fx.output.exists() || std::fs::read_dir(&fx.output).unwrap().next().is_none());
    }

    /// Native storage that refuses to write transcripts.
    struct NoTranscripts(NativeStorage);

    #[async_trait]
    impl Storage for NoTranscripts {
        async fn read(&self, path: &str) -> Result<Vec<u8>> {
            self.0.read(path).await
        }
        async fn write(&self, path: &str, content: &[u8]) -> Result<()> {
            if path.ends_with(".txt") {
                anyhow::bail!("disk full");
            }
            self.0.write(path, content).await
        }
        async fn remove(&self, path: &str) -> Result<()> {
            self.0.remove(path).await
        }
        async fn size(&self, path: &str) -> Result<u64> {
            self.0.size(path).await
        }
        async fn list(&self, prefix: &str) -> Result<Vec<String>> {
            self.0.list(prefix).await
        }
    }

    #[tokio::test]
    async fn test_transcript_failure_leaves_no_audio() {
        let fx = fixture(ScriptedLlm::echo(), MockTts::new(), WorkflowConfig::default());
        let pipeline = Pipeline::new(
            fx.pipeline.config.clone(),
            Box::new(fx.llm.clone()),
            Box::new(fx.tts.clone()),
            Arc::new(NoTranscripts(NativeStorage::new())),
        );
        let path = write_doc(&fx, "note.txt", b"a short note");

        let err = pipeline.process(&path).await.unwrap_err();

        assert!(matches!(
            err,
            NarrationError::Synthesis(SynthesisError::Storage(_))
        ));
        assert_eq!(fx.tts.calls.lock().unwrap().len(), 1);
        let leftover = std::fs::read_dir(&fx.output).unwrap().count();
        assert_eq!(leftover, 0);
    }

    #[tokio::test]
    async fn test_html_document_extracted() {
        let fx = fixture(ScriptedLlm::echo(), MockTts::new(), WorkflowConfig::default());
        let path = write_doc(&fx, "page.html", b"<html><body><p>Hello narrated world</p></body></html>");

        let outcome = fx.pipeline.handle(&path).await;
        assert!(matches!(outcome, NarrationOutcome::Narrated(_)));

        let first = &fx.llm.requests()[0];
        assert!(first.user.contains("Hello narrated world"));
        assert!(!first.user.contains("<p>"));
    }
}
