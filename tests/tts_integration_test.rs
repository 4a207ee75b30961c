use anyhow::Result;
use axum::{http::StatusCode, response::IntoResponse, routing::post, Json, Router};
use dotenv::dotenv;
use std::net::SocketAddr;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use std::time::Duration;
use tokio::net::TcpListener;
use ttsweb::{
    app::{create_router, AppStateBuilder},
    config::Config,
    media::transcode_mp3_to_wav,
    synthesis::{OpenAiTtsClient, SpeechRequest, SynthesisClient, TtsModel, TtsVoice},
};

/// MPEG-1 Layer III, 128 kbit/s, 44.1 kHz, mono silence. Same frames as the
/// unit-test fixture in `src/media/tests.rs`.
fn silent_mp3(frames: usize) -> Vec<u8> {
    const FRAME_LEN: usize = 417;
    let mut out = Vec::with_capacity(frames * FRAME_LEN);
    for _ in 0..frames {
        let mut frame = vec![0u8; FRAME_LEN];
        frame[..4].copy_from_slice(&[0xFF, 0xFB, 0x90, 0xC0]);
        out.extend_from_slice(&frame);
    }
    out
}

async fn serve(router: Router) -> SocketAddr {
    let listener = TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(
            listener,
            router.into_make_service_with_connect_info::<SocketAddr>(),
        )
        .await
        .ok();
    });
    addr
}

/// Stand-in for the provider: accepts `sk-good`, rejects anything else.
async fn fake_provider(calls: Arc<AtomicUsize>) -> SocketAddr {
    let router = Router::new().route(
        "/v1/audio/speech",
        post(move |headers: axum::http::HeaderMap| {
            let calls = calls.clone();
            async move {
                calls.fetch_add(1, Ordering::SeqCst);
                let authorized = headers
                    .get("authorization")
                    .and_then(|v| v.to_str().ok())
                    == Some("Bearer sk-good");
                if authorized {
                    ([("content-type", "audio/mpeg")], silent_mp3(30)).into_response()
                } else {
                    (
                        StatusCode::UNAUTHORIZED,
                        Json(serde_json::json!({
                            "error": { "message": "Incorrect API key provided" }
                        })),
                    )
                        .into_response()
                }
            }
        }),
    );
    serve(router).await
}

async fn start_app(provider: SocketAddr, output_dir: &std::path::Path) -> SocketAddr {
    let config = Config {
        http_addr: "127.0.0.1:0".to_string(),
        openai_endpoint: format!("http://{}/v1", provider),
        output_dir: output_dir.to_path_buf(),
        request_timeout_secs: 5,
        ..Default::default()
    };
    let state = AppStateBuilder::new().config(config).build().unwrap();
    serve(create_router(state)).await
}

#[tokio::test]
async fn test_form_submit_end_to_end() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = fake_provider(calls.clone()).await;
    let output = tempfile::tempdir()?;
    let app = start_app(provider, output.path()).await;
    let http = reqwest::Client::new();

    let resp = http
        .post(format!("http://{}/api/speech", app))
        .json(&serde_json::json!({
            "apiKey": "sk-good",
            "text": "Hello! This is a test of OpenAI's text-to-speech.",
            "model": "tts-1",
            "voice": "shimmer",
        }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::OK);
    let result: serde_json::Value = resp.json().await?;

    let path = std::path::PathBuf::from(result["path"].as_str().unwrap());
    assert!(path.exists());
    assert_eq!(path.parent(), Some(output.path()));

    let wav = http
        .get(format!("http://{}{}", app, result["url"].as_str().unwrap()))
        .send()
        .await?
        .bytes()
        .await?;
    assert_eq!(wav.as_ref(), std::fs::read(&path)?.as_slice());
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    Ok(())
}

#[tokio::test]
async fn test_form_submit_rejected_key() -> Result<()> {
    let calls = Arc::new(AtomicUsize::new(0));
    let provider = fake_provider(calls.clone()).await;
    let output = tempfile::tempdir()?;
    let app = start_app(provider, output.path()).await;

    let resp = reqwest::Client::new()
        .post(format!("http://{}/api/speech", app))
        .json(&serde_json::json!({ "apiKey": "sk-bad", "text": "Hello" }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
    let result: serde_json::Value = resp.json().await?;
    assert_eq!(
        result["error"],
        "Failed to generate speech: TTS provider returned 401: Incorrect API key provided"
    );
    assert_eq!(calls.load(Ordering::SeqCst), 1);
    assert_eq!(std::fs::read_dir(output.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
async fn test_unreachable_provider() -> Result<()> {
    let listener = TcpListener::bind("127.0.0.1:0").await?;
    let dead = listener.local_addr()?;
    drop(listener);

    let output = tempfile::tempdir()?;
    let app = start_app(dead, output.path()).await;
    let resp = reqwest::Client::new()
        .post(format!("http://{}/api/speech", app))
        .json(&serde_json::json!({ "apiKey": "sk-good", "text": "Hello" }))
        .send()
        .await?;
    assert_eq!(resp.status(), reqwest::StatusCode::BAD_GATEWAY);
    let result: serde_json::Value = resp.json().await?;
    assert!(result["error"]
        .as_str()
        .unwrap()
        .starts_with("Failed to generate speech: Request to TTS provider failed"));
    assert_eq!(std::fs::read_dir(output.path())?.count(), 0);
    Ok(())
}

#[tokio::test]
#[ignore] // Requires OpenAI API key, run with `cargo test -- --ignored`
async fn test_openai_live_synthesis() -> Result<()> {
    dotenv().ok();
    let api_key = match std::env::var("OPENAI_API_KEY") {
        Ok(key) if !key.is_empty() => key,
        _ => {
            println!("Skipping test as OPENAI_API_KEY is not set");
            return Ok(());
        }
    };
    let endpoint = std::env::var("OPENAI_BASE_URL")
        .unwrap_or_else(|_| ttsweb::synthesis::DEFAULT_ENDPOINT.to_string());
    let client = OpenAiTtsClient::new(endpoint, Duration::from_secs(60))?;
    let request = SpeechRequest::new(api_key, "Hello from Rust.", TtsModel::Tts1, TtsVoice::Nova);
    let mp3 = client.synthesize(&request).await?;
    let audio = transcode_mp3_to_wav(&mp3)?;
    assert!(audio.frames > 0);
    Ok(())
}
