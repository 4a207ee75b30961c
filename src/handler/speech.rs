use super::middleware::clientip::ClientIp;
use super::{OptionItem, SpeechForm, SpeechOptions, SpeechResult};
use crate::app::AppState;
use crate::error::SpeechError;
use crate::media::{transcode_mp3_to_wav, TranscodedAudio};
use crate::synthesis::{SpeechRequest, TtsModel, TtsVoice};
use axum::{
    extract::{rejection::JsonRejection, State},
    response::{Html, IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use std::path::{Path, PathBuf};
use std::time::{Duration, SystemTime};
use tower_http::services::ServeDir;
use tracing::{debug, info, warn};
use uuid::Uuid;

const INDEX_HTML: &str = include_str!("../../static/index.html");

#[derive(Debug, Clone)]
pub struct GeneratedSpeech {
    pub path: PathBuf,
    pub file_name: String,
    pub sample_rate: u32,
    pub channels: u16,
    pub duration: Duration,
}

pub fn router(state: AppState) -> Router {
    let audio_files = ServeDir::new(state.output_dir());
    Router::new()
        .route("/", get(index_handler))
        .route("/api/options", get(options_handler))
        .route("/api/speech", post(speech_handler))
        .nest_service("/audio", audio_files)
        .with_state(state)
}

async fn index_handler() -> Html<&'static str> {
    Html(INDEX_HTML)
}

async fn options_handler(State(state): State<AppState>) -> Json<SpeechOptions> {
    Json(SpeechOptions {
        models: TtsModel::ALL
            .iter()
            .map(|m| OptionItem {
                id: m.as_str(),
                description: m.description(),
            })
            .collect(),
        voices: TtsVoice::ALL
            .iter()
            .map(|v| OptionItem {
                id: v.as_str(),
                description: v.description(),
            })
            .collect(),
        default_model: state.config.default_model,
        default_voice: state.config.default_voice,
        default_text: state.config.default_text.clone(),
    })
}

async fn speech_handler(
    client_ip: ClientIp,
    State(state): State<AppState>,
    payload: Result<Json<SpeechForm>, JsonRejection>,
) -> Response {
    let Json(form) = match payload {
        Ok(form) => form,
        Err(rejection) => {
            warn!(client_ip = %client_ip, "invalid speech form: {}", rejection.body_text());
            return SpeechError::InvalidForm(rejection.body_text()).into_response();
        }
    };

    let request = match speech_request(&state, form) {
        Ok(request) => request,
        Err(e) => return e.into_response(),
    };
    info!(client_ip = %client_ip, request = ?request, "speech requested");

    match generate_speech(&state, request).await {
        Ok(speech) => Json(SpeechResult {
            path: speech.path.to_string_lossy().to_string(),
            url: format!("/audio/{}", speech.file_name),
            sample_rate: speech.sample_rate,
            channels: speech.channels,
            duration_ms: speech.duration.as_millis() as u64,
        })
        .into_response(),
        Err(e) => {
            warn!(client_ip = %client_ip, "{}", e.user_message());
            e.into_response()
        }
    }
}

/// Missing model or voice fall back to the configured defaults.
fn speech_request(state: &AppState, form: SpeechForm) -> Result<SpeechRequest, SpeechError> {
    let model = match form.model.as_deref() {
        Some(model) => model.parse()?,
        None => state.config.default_model,
    };
    let voice = match form.voice.as_deref() {
        Some(voice) => voice.parse()?,
        None => state.config.default_voice,
    };
    Ok(SpeechRequest::new(form.api_key, form.text, model, voice))
}

/// Synthesizes `request`, converts the MP3 reply to WAV and stores it in the
/// output directory. Nothing is written unless every step succeeds.
pub async fn generate_speech(
    state: &AppState,
    request: SpeechRequest,
) -> Result<GeneratedSpeech, SpeechError> {
    request.validate()?;

    let mp3 = state.synthesis.synthesize(&request).await?;
    debug!(bytes = mp3.len(), "transcoding speech payload");
    let audio = tokio::task::spawn_blocking(move || transcode_mp3_to_wav(&mp3))
        .await
        .map_err(std::io::Error::other)??;

    let file_id = Uuid::new_v4().to_string();
    let path = state.get_output_file(&file_id)?;
    write_output(&path, &audio).await?;

    if let Some(ttl) = state.config.output_ttl() {
        sweep_expired(state.output_dir(), ttl, &path).await;
    }

    let file_name = path
        .file_name()
        .map(|name| name.to_string_lossy().to_string())
        .unwrap_or_else(|| format!("{}.wav", file_id));
    info!(
        path = %path.display(),
        sample_rate = audio.sample_rate,
        channels = audio.channels,
        duration = ?audio.duration(),
        "speech written"
    );
    Ok(GeneratedSpeech {
        path,
        file_name,
        sample_rate: audio.sample_rate,
        channels: audio.channels,
        duration: audio.duration(),
    })
}

// Written to a sibling temp name first so readers never see a partial file.
async fn write_output(path: &Path, audio: &TranscodedAudio) -> Result<(), SpeechError> {
    let partial = path.with_extension("wav.part");
    if let Err(e) = tokio::fs::write(&partial, &audio.wav).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    if let Err(e) = tokio::fs::rename(&partial, path).await {
        let _ = tokio::fs::remove_file(&partial).await;
        return Err(e.into());
    }
    Ok(())
}

/// Only `<uuid>.wav` and leftover `<uuid>.wav.part` files belong to us.
fn is_generated_output(path: &Path) -> bool {
    let Some(name) = path.file_name().and_then(|n| n.to_str()) else {
        return false;
    };
    let stem = name
        .strip_suffix(".wav.part")
        .or_else(|| name.strip_suffix(".wav"));
    stem.is_some_and(|stem| Uuid::parse_str(stem).is_ok())
}

/// Removes generated files older than `ttl`. Failures are logged only.
pub async fn sweep_expired(dir: &Path, ttl: Duration, keep: &Path) -> usize {
    let mut entries = match tokio::fs::read_dir(dir).await {
        Ok(entries) => entries,
        Err(e) => {
            warn!("failed to read output dir {}: {}", dir.display(), e);
            return 0;
        }
    };
    let now = SystemTime::now();
    let mut removed = 0;
    while let Ok(Some(entry)) = entries.next_entry().await {
        let path = entry.path();
        if path == keep || !is_generated_output(&path) {
            continue;
        }
        let modified = match entry.metadata().await.and_then(|m| m.modified()) {
            Ok(modified) => modified,
            Err(_) => continue,
        };
        let age = now.duration_since(modified).unwrap_or_default();
        if age < ttl {
            continue;
        }
        match tokio::fs::remove_file(&path).await {
            Ok(_) => {
                debug!(path = %path.display(), age = ?age, "removed expired output");
                removed += 1;
            }
            Err(e) => warn!("failed to remove {}: {}", path.display(), e),
        }
    }
    removed
}
