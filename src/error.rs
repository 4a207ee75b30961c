use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;

/// Every way a speech request can fail, from input checks to writing the
/// output file.
#[derive(Debug, Error)]
pub enum SpeechError {
    #[error("OpenAI API key not provided.")]
    MissingCredential,
    #[error("Text to synthesize is empty.")]
    EmptyText,
    #[error("Unsupported model: {0}")]
    UnknownModel(String),
    #[error("Unsupported voice: {0}")]
    UnknownVoice(String),
    #[error("Invalid form: {0}")]
    InvalidForm(String),
    #[error("Request to TTS provider failed: {0}")]
    Transport(#[from] reqwest::Error),
    #[error("TTS provider returned {status}: {message}")]
    Provider { status: u16, message: String },
    #[error("Could not decode MP3 audio: {0}")]
    Decode(String),
    #[error("Could not encode WAV audio: {0}")]
    Encode(#[from] hound::Error),
    #[error("Could not write audio file: {0}")]
    Io(#[from] std::io::Error),
}

impl SpeechError {
    pub fn user_message(&self) -> String {
        format!("Failed to generate speech: {}", self)
    }

    pub fn status_code(&self) -> StatusCode {
        match self {
            SpeechError::MissingCredential
            | SpeechError::EmptyText
            | SpeechError::UnknownModel(_)
            | SpeechError::UnknownVoice(_)
            | SpeechError::InvalidForm(_) => StatusCode::BAD_REQUEST,
            SpeechError::Transport(_) | SpeechError::Provider { .. } | SpeechError::Decode(_) => {
                StatusCode::BAD_GATEWAY
            }
            SpeechError::Encode(_) | SpeechError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for SpeechError {
    fn into_response(self) -> Response {
        (
            self.status_code(),
            Json(json!({ "error": self.user_message() })),
        )
            .into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_user_message_prefix() {
        let err = SpeechError::MissingCredential;
        assert_eq!(
            err.user_message(),
            "Failed to generate speech: OpenAI API key not provided."
        );
    }

    #[test]
    fn test_status_codes() {
        assert_eq!(
            SpeechError::EmptyText.status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SpeechError::InvalidForm("missing field `text`".to_string()).status_code(),
            StatusCode::BAD_REQUEST
        );
        assert_eq!(
            SpeechError::Provider {
                status: 401,
                message: "bad key".to_string()
            }
            .status_code(),
            StatusCode::BAD_GATEWAY
        );
        assert_eq!(
            SpeechError::Decode("garbage".to_string()).status_code(),
            StatusCode::BAD_GATEWAY
        );
        let io = std::io::Error::new(std::io::ErrorKind::Other, "disk full");
        assert_eq!(
            SpeechError::from(io).status_code(),
            StatusCode::INTERNAL_SERVER_ERROR
        );
    }
}
