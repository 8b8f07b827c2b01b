use crate::services::tts::{TtsClient, Voice};
use anyhow::{anyhow, Result};
use async_trait::async_trait;
use reqwest::header::{HeaderMap, HeaderValue};
use serde::{Deserialize, Serialize};

const TRUSTED_CLIENT_TOKEN: &str = "6A5AA1D4EAFF4E9FB37E23D68491D6F4";
const CHROMIUM_MAJOR_VERSION: &str = "143";
const LIST_VOICES_URL: &str =
    "https://speech.platform.bing.com/consumer/speech/synthesize/readaloud/voices/list";
const OUTPUT_FORMAT: &str = "audio-24khz-48kbitrate-mono-mp3";
const FALLBACK_VOICE: &str = "en-US-AriaNeural";

fn get_user_agent() -> String {
    format!(
        "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/{}.0.0.0 Safari/537.36 Edg/{}.0.0.0",
        CHROMIUM_MAJOR_VERSION, CHROMIUM_MAJOR_VERSION
    )
}

fn get_sec_ch_ua() -> String {
    format!(
        "\" Not;A Brand\";v=\"99\", \"Microsoft Edge\";v=\"{}\", \"Chromium\";v=\"{}\"",
        CHROMIUM_MAJOR_VERSION, CHROMIUM_MAJOR_VERSION
    )
}

// --- Config ---

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct EdgeTtsConfig {
    pub voice: Option<String>,
    #[serde(default = "default_max_segment_chars")]
    pub max_segment_chars: usize,
}

fn default_max_segment_chars() -> usize {
    1000
}

impl Default for EdgeTtsConfig {
    fn default() -> Self {
        Self {
            voice: None,
            max_segment_chars: default_max_segment_chars(),
        }
    }
}

pub async fn list_voices() -> Result<Vec<Voice>> {
    let url = format!(
        "{}?trustedclienttoken={}",
        LIST_VOICES_URL, TRUSTED_CLIENT_TOKEN
    );
    let client = reqwest::Client::new();
    let mut headers = HeaderMap::new();

    headers.insert(
        "Authority",
        HeaderValue::from_static("speech.platform.bing.com"),
    );
    headers.insert("Sec-CH-UA", HeaderValue::from_str(&get_sec_ch_ua())?);
    headers.insert("Sec-CH-UA-Mobile", HeaderValue::from_static("?0"));
    headers.insert("User-Agent", HeaderValue::from_str(&get_user_agent())?);
    headers.insert(
        "Sec-CH-UA-Platform",
        HeaderValue::from_static("\"Windows\""),
    );
    headers.insert("Accept", HeaderValue::from_static("*/*"));
    headers.insert("Sec-Fetch-Site", HeaderValue::from_static("none"));
    headers.insert("Sec-Fetch-Mode", HeaderValue::from_static("cors"));
    headers.insert("Sec-Fetch-Dest", HeaderValue::from_static("empty"));
    headers.insert(
        "Accept-Language",
        HeaderValue::from_static("en-US,en;q=0.9"),
    );

    let resp = client.get(&url).headers(headers).send().await?;
    if !resp.status().is_success() {
        return Err(anyhow!("Failed to list voices: {}", resp.status()));
    }
    let voices: Vec<Voice> = resp.json().await?;
    Ok(voices)
}

// --- Edge TTS Client ---

pub struct EdgeTtsClient {
    config: EdgeTtsConfig,
    language: String,
}

impl EdgeTtsClient {
    pub fn new(config: EdgeTtsConfig, language: String) -> Self {
        Self { config, language }
    }

    pub fn voice(&self) -> String {
        if let Some(v) = &self.config.voice {
            return v.clone();
        }
        default_voice_for(&self.language).to_string()
    }

    pub fn build_ssml(&self, text: &str) -> String {
        format!(
            "<speak version='1.0' xmlns='http://www.w3.org/2001/10/synthesis' xml:lang='en-US'><voice name='{}'>{}</voice></speak>",
            self.voice(),
            escape_xml(text)
        )
    }
}

fn default_voice_for(language: &str) -> &'static str {
    match language {
        l if l.starts_with("zh") => "zh-TW-HsiaoChenNeural",
        l if l.starts_with("de") => "de-DE-KatjaNeural",
        l if l.starts_with("fr") => "fr-FR-DeniseNeural",
        l if l.starts_with("es") => "es-ES-ElviraNeural",
        l if l.starts_with("ja") => "ja-JP-NanamiNeural",
        _ => FALLBACK_VOICE,
    }
}

fn escape_xml(text: &str) -> String {
    let mut out = String::with_capacity(text.len());
    for c in text.chars() {
        match c {
            '&' => out.push_str("&amp;"),
            '<' => out.push_str("&lt;"),
            '>' => out.push_str("&gt;"),
            '\'' => out.push_str("&apos;"),
            '"' => out.push_str("&quot;"),
            _ => out.push(c),
        }
    }
    out
}

#[async_trait]
impl TtsClient for EdgeTtsClient {
    async fn list_voices(&self) -> Result<Vec<Voice>> {
        list_voices().await
    }

    async fn synthesize(&self, text: &str) -> Result<Vec<u8>> {
        let ssml = self.build_ssml(text);

        tokio::task::spawn_blocking(move || {
            edge_tts::request_audio(&ssml, OUTPUT_FORMAT)
                .map_err(|e| anyhow!("Edge TTS crate error: {:?}", e))
        })
        .await?
    }

    fn max_segment_chars(&self) -> usize {
        self.config.max_segment_chars
    }
}
