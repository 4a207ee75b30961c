use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

mod openai;
pub use openai::{OpenAiTtsClient, DEFAULT_ENDPOINT};


#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
pub enum TtsModel {
    #[default]
    #[serde(rename = "tts-1")]
    Tts1,
    #[serde(rename = "tts-1-hd")]
    Tts1Hd,
}

impl TtsModel {
    pub const ALL: [TtsModel; 2] = [TtsModel::Tts1, TtsModel::Tts1Hd];

    pub fn as_str(&self) -> &'static str {
        match self {
            TtsModel::Tts1 => "tts-1",
            TtsModel::Tts1Hd => "tts-1-hd",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TtsModel::Tts1 => "Standard quality model, faster generation",
            TtsModel::Tts1Hd => "Higher quality model, slightly slower generation",
        }
    }
}

impl fmt::Display for TtsModel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TtsModel {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TtsModel::ALL
            .into_iter()
            .find(|m| m.as_str() == s)
            .ok_or_else(|| SpeechError::UnknownModel(s.to_string()))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TtsVoice {
    #[default]
    Alloy,
    Echo,
    Fable,
    Onyx,
    Nova,
    Shimmer,
}

impl TtsVoice {
    pub const ALL: [TtsVoice; 6] = [
        TtsVoice::Alloy,
        TtsVoice::Echo,
        TtsVoice::Fable,
        TtsVoice::Onyx,
        TtsVoice::Nova,
        TtsVoice::Shimmer,
    ];

    pub fn as_str(&self) -> &'static str {
        match self {
            TtsVoice::Alloy => "alloy",
            TtsVoice::Echo => "echo",
            TtsVoice::Fable => "fable",
            TtsVoice::Onyx => "onyx",
            TtsVoice::Nova => "nova",
            TtsVoice::Shimmer => "shimmer",
        }
    }

    pub fn description(&self) -> &'static str {
        match self {
            TtsVoice::Alloy => "Versatile, balanced voice",
            TtsVoice::Echo => "Warm, natural voice",
            TtsVoice::Fable => "Expressive, youthful voice",
            TtsVoice::Onyx => "Deep, authoritative voice",
            TtsVoice::Nova => "Energetic, professional voice",
            TtsVoice::Shimmer => "Clear, gentle voice",
        }
    }
}

impl fmt::Display for TtsVoice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for TtsVoice {
    type Err = SpeechError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        TtsVoice::ALL
            .into_iter()
            .find(|v| v.as_str() == s)
            .ok_or_else(|| SpeechError::UnknownVoice(s.to_string()))
    }
}

/// One synthesis call. The credential is passed through to the provider
/// untouched and never stored.
#[derive(Clone)]
pub struct SpeechRequest {
    pub api_key: String,
    pub text: String,
    pub model: TtsModel,
    pub voice: TtsVoice,
}

impl fmt::Debug for SpeechRequest {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("SpeechRequest")
            .field("api_key", &"<redacted>")
            .field("text_len", &self.text.chars().count())
            .field("model", &self.model)
            .field("voice", &self.voice)
            .finish()
    }
}

impl SpeechRequest {
    pub fn new(
        api_key: impl Into<String>,
        text: impl Into<String>,
        model: TtsModel,
        voice: TtsVoice,
    ) -> Self {
        Self {
            api_key: api_key.into(),
            text: text.into(),
            model,
            voice,
        }
    }

    pub fn validate(&self) -> Result<(), SpeechError> {
        if self.api_key.trim().is_empty() {
            return Err(SpeechError::MissingCredential);
        }
        if self.text.trim().is_empty() {
            return Err(SpeechError::EmptyText);
        }
        Ok(())
    }
}

#[cfg_attr(test, mockall::automock)]
#[async_trait]
pub trait SynthesisClient: Send + Sync {
    /// Returns the provider's MP3 payload for `request`.
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Bytes, SpeechError>;
}
