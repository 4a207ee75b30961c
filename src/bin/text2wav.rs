use anyhow::{Context, Result};
use clap::Parser;
use dotenv::dotenv;
use std::path::PathBuf;
use std::time::Duration;
use tracing::{debug, info, level_filters::LevelFilter};
use ttsweb::media::transcode_mp3_to_wav;
use ttsweb::synthesis::{
    OpenAiTtsClient, SpeechRequest, SynthesisClient, TtsModel, TtsVoice, DEFAULT_ENDPOINT,
};

/// Convert text to a WAV file using an OpenAI-compatible TTS endpoint
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Input text to convert to speech
    #[arg(value_name = "TEXT")]
    input_text: String,

    /// Path to output WAV file
    #[arg(value_name = "OUTPUT")]
    output_file: PathBuf,

    /// TTS model (tts-1, tts-1-hd)
    #[arg(short, long, default_value = "tts-1")]
    model: TtsModel,

    /// Voice (alloy, echo, fable, onyx, nova, shimmer)
    #[arg(long, default_value = "alloy")]
    voice: TtsVoice,

    /// API key, falls back to OPENAI_API_KEY
    #[arg(long, env = "OPENAI_API_KEY", hide_env_values = true)]
    api_key: Option<String>,

    /// API base URL, falls back to OPENAI_BASE_URL
    #[arg(long, env = "OPENAI_BASE_URL", default_value = DEFAULT_ENDPOINT)]
    endpoint: String,

    /// Request timeout in seconds
    #[arg(long, default_value = "60")]
    timeout: u64,

    /// Enable verbose logging
    #[arg(short, long)]
    verbose: bool,
}

#[tokio::main]
async fn main() -> Result<()> {
    dotenv().ok();
    let args = Args::parse();

    let level = if args.verbose {
        LevelFilter::DEBUG
    } else {
        LevelFilter::INFO
    };
    tracing_subscriber::fmt().with_max_level(level).init();

    info!("Converting text to speech: '{}'", args.input_text);
    info!("Output file: {}", args.output_file.display());

    let request = SpeechRequest::new(
        args.api_key.unwrap_or_default(),
        args.input_text,
        args.model,
        args.voice,
    );
    debug!("Created speech request {:?}", request);

    let client = OpenAiTtsClient::new(args.endpoint, Duration::from_secs(args.timeout))?;
    let mp3 = client
        .synthesize(&request)
        .await
        .map_err(|e| anyhow::anyhow!(e.user_message()))?;
    debug!("Received {} bytes of mp3 audio", mp3.len());

    let audio = transcode_mp3_to_wav(&mp3).map_err(|e| anyhow::anyhow!(e.user_message()))?;
    std::fs::write(&args.output_file, &audio.wav).with_context(|| {
        format!(
            "Failed to write output WAV file: {}",
            args.output_file.display()
        )
    })?;

    info!(
        "Successfully created WAV file: {} ({} Hz, {} ch, {:.2}s)",
        args.output_file.display(),
        audio.sample_rate,
        audio.channels,
        audio.duration().as_secs_f64()
    );
    Ok(())
}
