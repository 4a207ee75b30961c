use crate::synthesis::{TtsModel, TtsVoice, DEFAULT_ENDPOINT};
use anyhow::Error;
use clap::Parser;
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::time::Duration;
use tracing::level_filters::LevelFilter;

pub const DEFAULT_CONFIG_FILE: &str = "ttsweb.toml";

#[derive(Parser, Debug)]
#[command(version = crate::version::get_short_version(), long_version = crate::version::get_version_info())]
pub struct Cli {
    /// Path to the TOML configuration file
    #[clap(long)]
    pub conf: Option<String>,
    /// Listen address, overrides `http_addr` from the configuration file
    #[clap(long)]
    pub http_addr: Option<String>,
}

#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct Config {
    pub http_addr: String,
    pub log_level: Option<String>,
    pub log_file: Option<String>,
    pub openai_endpoint: String,
    pub request_timeout_secs: u64,
    pub output_dir: PathBuf,
    pub output_ttl_secs: Option<u64>,
    pub default_model: TtsModel,
    pub default_voice: TtsVoice,
    pub default_text: String,
    pub http_access_skip_paths: Vec<String>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            http_addr: "0.0.0.0:7860".to_string(),
            log_level: Some("info".to_string()),
            log_file: None,
            openai_endpoint: std::env::var("OPENAI_BASE_URL")
                .unwrap_or_else(|_| DEFAULT_ENDPOINT.to_string()),
            request_timeout_secs: 60,
            output_dir: std::env::temp_dir().join("ttsweb"),
            output_ttl_secs: Some(3600),
            default_model: TtsModel::default(),
            default_voice: TtsVoice::default(),
            default_text: "Hello! This is a test of OpenAI's text-to-speech.".to_string(),
            http_access_skip_paths: vec!["/audio/*".to_string()],
        }
    }
}

impl Config {
    pub fn load(path: &str) -> Result<Self, Error> {
        let config = toml::from_str(
            &std::fs::read_to_string(path).map_err(|e| anyhow::anyhow!("{}: {}", e, path))?,
        )?;
        Ok(config)
    }

    /// Loads `cli.conf` if given. Without `--conf` the default file is read
    /// when present, otherwise built-in defaults apply.
    pub fn from_cli(cli: &Cli) -> Result<Self, Error> {
        let mut config = match cli.conf.as_deref() {
            Some(path) => Self::load(path)?,
            None if Path::new(DEFAULT_CONFIG_FILE).exists() => Self::load(DEFAULT_CONFIG_FILE)?,
            None => Self::default(),
        };
        if let Some(addr) = cli.http_addr.as_ref() {
            config.http_addr = addr.clone();
        }
        Ok(config)
    }

    /// `log_level` as a filter directive; an unparsable level is an error.
    pub fn log_level_filter(&self) -> Result<Option<LevelFilter>, Error> {
        self.log_level
            .as_deref()
            .map(|level| {
                level
                    .parse::<LevelFilter>()
                    .map_err(|e| anyhow::anyhow!("invalid log_level {:?}: {}", level, e))
            })
            .transpose()
    }

    pub fn request_timeout(&self) -> Duration {
        Duration::from_secs(self.request_timeout_secs)
    }

    pub fn output_ttl(&self) -> Option<Duration> {
        self.output_ttl_secs.map(Duration::from_secs)
    }
}
