use crate::core::config::Config;
use crate::services::tts::{create_tts_client, TtsClient, Voice};
use anyhow::{anyhow, Result};
use inquire::Select;

/// Interactive first-run questions. Skipped entirely in unattended mode.
pub async fn run_setup(config: &mut Config) -> Result<()> {
    if config.unattended {
        return Ok(());
    }

    let provider = config.audio.provider.clone();
    match provider.as_str() {
        "edge-tts" => {
            let edge_config = config.audio.edge_tts.get_or_insert_with(Default::default);
            if edge_config.voice.is_some() {
                return Ok(());
            }

            println!("Fetching Edge-TTS voices...");
            let voices = create_tts_client(config).await?.list_voices().await?;
            let filtered = filter_voices(voices, &config.audio.language);
            if filtered.is_empty() {
                return Err(anyhow!(
                    "No voices found for language: {}",
                    config.audio.language
                ));
            }

            let voice = select_voice("Select Narrator Voice:", &filtered)?;
            if let Some(edge_config) = config.audio.edge_tts.as_mut() {
                edge_config.voice = Some(voice);
            }

            config.save()?;
            println!("Configuration saved.");
        }
        _ => {
            println!("Setup not implemented for provider: {}", provider);
        }
    }

    Ok(())
}

/// Voices whose locale belongs to `language`, sorted by short name.
pub fn filter_voices(voices: Vec<Voice>, language: &str) -> Vec<Voice> {
    let mut filtered: Vec<Voice> = voices
        .into_iter()
        .filter(|v| v.locale.starts_with(language))
        .collect();
    filtered.sort_by(|a, b| a.short_name.cmp(&b.short_name));
    filtered
}

fn voice_label(voice: &Voice) -> String {
    format!(
        "{} ({}) - {}",
        voice.short_name,
        voice.gender,
        voice.friendly_name.as_deref().unwrap_or(&voice.name)
    )
}

fn select_voice(prompt: &str, voices: &[Voice]) -> Result<String> {
    let options: Vec<String> = voices.iter().map(voice_label).collect();
    let selection = Select::new(prompt, options).prompt()?;

    selection
        .split_whitespace()
        .next()
        .map(str::to_string)
        .ok_or_else(|| anyhow!("Empty voice selection"))
}
