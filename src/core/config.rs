use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;

use crate::services::llm::LlmConfig;
use crate::services::tts::edge::EdgeTtsConfig;
use crate::services::workflow::WorkflowConfig;

const CONFIG_PATH: &str = "config.yml";

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct Config {
    #[serde(default = "default_input")]
    pub input_folder: String,

    #[serde(default = "default_output")]
    pub output_folder: String,

    #[serde(default)]
    pub unattended: bool,

    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,

    pub llm: LlmConfig,

    #[serde(default)]
    pub workflow: WorkflowConfig,

    #[serde(default)]
    pub audio: AudioConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct AudioConfig {
    #[serde(default = "default_tts_provider")]
    pub provider: String,
    #[serde(default = "default_language")]
    pub language: String,
    #[serde(default = "default_audio_timeout")]
    pub timeout_seconds: u64,

    #[serde(rename = "edge-tts")]
    pub edge_tts: Option<EdgeTtsConfig>,
}

impl Default for AudioConfig {
    fn default() -> Self {
        Self {
            provider: default_tts_provider(),
            language: default_language(),
            timeout_seconds: default_audio_timeout(),
            edge_tts: None,
        }
    }
}

fn default_input() -> String {
    "input".to_string()
}
fn default_output() -> String {
    "output".to_string()
}
fn default_max_file_size_mb() -> u64 {
    10
}
fn default_language() -> String {
    "en".to_string()
}
fn default_tts_provider() -> String {
    "edge-tts".to_string()
}
fn default_audio_timeout() -> u64 {
    120
}

impl Config {
    pub fn load() -> Result<Self> {
        Self::load_from(Path::new(CONFIG_PATH))
    }

    pub fn load_from(path: &Path) -> Result<Self> {
        if !path.exists() {
            bail!("{} not found. Please create one.", path.display());
        }

        let content = fs::read_to_string(path)
            .with_context(|| format!("Failed to read {}", path.display()))?;
        Self::parse(&content).with_context(|| format!("Failed to parse {}", path.display()))
    }

    pub fn parse(content: &str) -> Result<Self> {
        let config: Config = serde_yaml_ng::from_str(content)?;
        config.validate()?;
        Ok(config)
    }

    pub fn save(&self) -> Result<()> {
        let content = serde_yaml_ng::to_string(self)?;
        fs::write(CONFIG_PATH, content).context("Failed to write config.yml")?;
        Ok(())
    }

    pub fn ensure_directories(&self) -> Result<()> {
        fs::create_dir_all(&self.input_folder)?;
        fs::create_dir_all(&self.output_folder)?;
        Ok(())
    }

    pub fn max_file_size_bytes(&self) -> u64 {
        self.max_file_size_mb.saturating_mul(1024 * 1024)
    }

    /// Checks what serde cannot. `chunk_size` and `summary_concurrency` are
    /// already guaranteed non-zero by their types.
    pub fn validate(&self) -> Result<()> {
        for (name, settings) in [
            ("workflow.summary", &self.workflow.summary),
            ("workflow.narrative", &self.workflow.narrative),
        ] {
            if !settings.temperature.is_finite() || settings.temperature < 0.0 {
                bail!("{}.temperature must be a non-negative number", name);
            }
            if settings.max_tokens == 0 {
                bail!("{}.max_tokens must be positive", name);
            }
        }

        if self.workflow.narrative.temperature <= self.workflow.summary.temperature {
            bail!(
                "workflow.narrative.temperature ({}) must be higher than workflow.summary.temperature ({})",
                self.workflow.narrative.temperature,
                self.workflow.summary.temperature
            );
        }

        if self.max_file_size_mb == 0 {
            bail!("max_file_size_mb must be positive");
        }

        let base_urls = [
            self.llm.openai.as_ref().and_then(|c| c.base_url.as_deref()),
            self.llm.ollama.as_ref().map(|c| c.base_url.as_str()),
        ];
        for base_url in base_urls.into_iter().flatten() {
            url::Url::parse(base_url)
                .with_context(|| format!("Invalid LLM base_url: {}", base_url))?;
        }

        Ok(())
    }
}
