use crate::core::config::Config;
use crate::core::error::SynthesisError;
use crate::core::io::Storage;
use crate::utils::audio::{merge_binary, random_audio_filename, split_for_speech};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use log::info;
use serde::Deserialize;
use std::path::Path;
use std::time::Duration;

#[derive(Debug, Deserialize, Clone)]
#[serde(rename_all = "PascalCase")]
pub struct Voice {
    pub name: String,
    pub short_name: String,
    pub gender: String,
    pub locale: String,
    pub friendly_name: Option<String>,
}

/// Segment-level text-to-speech provider.
#[async_trait]
pub trait TtsClient: Send + Sync {
    async fn list_voices(&self) -> Result<Vec<Voice>>;
    async fn synthesize(&self, text: &str) -> Result<Vec<u8>>;

    /// Longest text accepted by one `synthesize` call.
    fn max_segment_chars(&self) -> usize {
        1000
    }

    fn file_extension(&self) -> &'static str {
        "mp3"
    }

    fn merge_audio(&self, parts: &[Vec<u8>]) -> Result<Vec<u8>> {
        Ok(merge_binary(parts))
    }
}

pub async fn create_tts_client(config: &Config) -> Result<Box<dyn TtsClient>> {
    info!("Initializing TTS Client for provider: {}", config.audio.provider);
    match config.audio.provider.as_str() {
        "edge-tts" => {
            let edge_config = config.audio.edge_tts.clone().unwrap_or_default();
            let language = config.audio.language.clone();
            Ok(Box::new(edge::EdgeTtsClient::new(edge_config, language)))
        }
        _ => Err(anyhow!("Unknown TTS provider: {}", config.audio.provider)),
    }
}

/// Audio half of a Narration Artifact.
#[derive(Debug, Clone, PartialEq)]
pub struct NarrationAudio {
    pub filename: String,
    pub bytes: Vec<u8>,
}

/// Turns a narrative into one stored audio file.
pub struct AudioSynthesizer<'a> {
    tts: &'a dyn TtsClient,
    storage: &'a dyn Storage,
    output_folder: &'a str,
    timeout: Duration,
}

impl<'a> AudioSynthesizer<'a> {
    pub fn new(
        tts: &'a dyn TtsClient,
        storage: &'a dyn Storage,
        output_folder: &'a str,
        timeout: Duration,
    ) -> Self {
        Self {
            tts,
            storage,
            output_folder,
            timeout,
        }
    }

    pub async fn synthesize(&self, text: &str) -> Result<NarrationAudio, SynthesisError> {
        let segments = split_for_speech(text, self.tts.max_segment_chars());
        if segments.is_empty() {
            return Err(SynthesisError::NothingToSay);
        }

        let mut parts = Vec::with_capacity(segments.len());
        for (i, segment) in segments.iter().enumerate() {
            let audio = tokio::time::timeout(self.timeout, self.tts.synthesize(segment))
                .await
                .map_err(|_| SynthesisError::Timeout {
                    segment: i,
                    seconds: self.timeout.as_secs(),
                })?
                .map_err(|e| SynthesisError::Provider {
                    segment: i,
                    message: format!("{:#}", e),
                })?;
            parts.push(audio);
        }

        let bytes = self
            .tts
            .merge_audio(&parts)
            .map_err(|e| SynthesisError::Merge(format!("{:#}", e)))?;

        let filename = random_audio_filename(self.tts.file_extension());
        let path = Path::new(self.output_folder).join(&filename);
        self.storage
            .write(&path.to_string_lossy(), &bytes)
            .await
            .map_err(|e| SynthesisError::Storage(format!("{:#}", e)))?;

        Ok(NarrationAudio { filename, bytes })
    }
}

pub mod edge;
