use super::{SpeechRequest, SynthesisClient};
use crate::error::SpeechError;
use async_trait::async_trait;
use bytes::Bytes;
use reqwest::{header, Client as HttpClient};
use serde::{Deserialize, Serialize};
use std::time::{Duration, Instant};
use tracing::{debug, info, warn};

pub const DEFAULT_ENDPOINT: &str = "https://api.openai.com/v1";

#[derive(Debug, Serialize)]
struct CreateSpeechBody<'a> {
    model: &'a str,
    input: &'a str,
    voice: &'a str,
    response_format: &'a str,
}

#[derive(Debug, Deserialize)]
struct ErrorEnvelope {
    error: ErrorDetail,
}

#[derive(Debug, Deserialize)]
struct ErrorDetail {
    message: String,
}

/// Client for the OpenAI-compatible `/audio/speech` endpoint.
#[derive(Debug, Clone)]
pub struct OpenAiTtsClient {
    http_client: HttpClient,
    endpoint: String,
}

impl OpenAiTtsClient {
    pub fn new(endpoint: impl Into<String>, timeout: Duration) -> Result<Self, SpeechError> {
        let http_client = HttpClient::builder()
            .timeout(timeout)
            .user_agent(crate::version::get_useragent())
            .build()?;
        Ok(Self {
            http_client,
            endpoint: endpoint.into().trim_end_matches('/').to_string(),
        })
    }

    pub fn endpoint(&self) -> &str {
        &self.endpoint
    }

    fn speech_url(&self) -> String {
        format!("{}/audio/speech", self.endpoint)
    }
}

/// Pulls `error.message` out of an OpenAI style error body, falling back to
/// the raw body text.
fn provider_message(status: reqwest::StatusCode, body: &str) -> String {
    if let Ok(envelope) = serde_json::from_str::<ErrorEnvelope>(body) {
        return envelope.error.message;
    }
    let body = body.trim();
    if body.is_empty() {
        status
            .canonical_reason()
            .unwrap_or("unknown error")
            .to_string()
    } else {
        body.to_string()
    }
}

#[async_trait]
impl SynthesisClient for OpenAiTtsClient {
    async fn synthesize(&self, request: &SpeechRequest) -> Result<Bytes, SpeechError> {
        request.validate()?;

        let body = CreateSpeechBody {
            model: request.model.as_str(),
            input: &request.text,
            voice: request.voice.as_str(),
            response_format: "mp3",
        };

        let url = self.speech_url();
        debug!(url = %url, model = %request.model, voice = %request.voice, "sending speech request");
        let request_start_time = Instant::now();

        let response = self
            .http_client
            .post(&url)
            .header(header::AUTHORIZATION, format!("Bearer {}", request.api_key.trim()))
            .json(&body)
            .send()
            .await?;

        let status = response.status();
        let ttfb = request_start_time.elapsed();
        if !status.is_success() {
            let text = response.text().await?;
            let message = provider_message(status, &text);
            warn!(status = status.as_u16(), ttfb = ?ttfb, "speech request rejected: {}", message);
            return Err(SpeechError::Provider {
                status: status.as_u16(),
                message,
            });
        }

        let audio = response.bytes().await?;
        if audio.is_empty() {
            return Err(SpeechError::Provider {
                status: status.as_u16(),
                message: "empty audio payload".to_string(),
            });
        }
        info!(
            model = %request.model,
            voice = %request.voice,
            bytes = audio.len(),
            ttfb = ?ttfb,
            elapsed = ?request_start_time.elapsed(),
            "speech synthesized"
        );
        Ok(audio)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use reqwest::StatusCode;

    #[test]
    fn test_provider_message_from_json() {
        let body = r#"{"error":{"message":"Incorrect API key provided","type":"invalid_request_error","code":"invalid_api_key"}}"#;
        assert_eq!(
            provider_message(StatusCode::UNAUTHORIZED, body),
            "Incorrect API key provided"
        );
    }

    #[test]
    fn test_provider_message_fallbacks() {
        assert_eq!(
            provider_message(StatusCode::BAD_GATEWAY, "upstream down\n"),
            "upstream down"
        );
        assert_eq!(
            provider_message(StatusCode::TOO_MANY_REQUESTS, ""),
            "Too Many Requests"
        );
    }

    #[test]
    fn test_endpoint_trailing_slash() {
        let client =
            OpenAiTtsClient::new("http://localhost:9000/v1/", Duration::from_secs(5)).unwrap();
        assert_eq!(client.endpoint(), "http://localhost:9000/v1");
        assert_eq!(client.speech_url(), "http://localhost:9000/v1/audio/speech");
    }
}
