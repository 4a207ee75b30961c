use crate::synthesis::{TtsModel, TtsVoice};
use serde::{Deserialize, Serialize};

pub mod middleware;
pub mod speech;
#[cfg(test)]
mod tests;
pub use speech::{generate_speech, router, GeneratedSpeech};

/// Body of `POST /api/speech`, as submitted by the form.
#[derive(Debug, Default, Deserialize, Serialize)]
#[serde(rename_all = "camelCase", default)]
pub struct SpeechForm {
    #[serde(skip_serializing)]
    pub api_key: String,
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub model: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub voice: Option<String>,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechResult {
    pub path: String,
    pub url: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration_ms: u64,
}

#[derive(Debug, Serialize)]
pub struct OptionItem {
    pub id: &'static str,
    pub description: &'static str,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct SpeechOptions {
    pub models: Vec<OptionItem>,
    pub voices: Vec<OptionItem>,
    pub default_model: TtsModel,
    pub default_voice: TtsVoice,
    pub default_text: String,
}
