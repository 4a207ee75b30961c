use crate::config::Config;
use crate::handler::middleware::request_log::log_requests;
use crate::synthesis::{OpenAiTtsClient, SynthesisClient};
use anyhow::Result;
use axum::{middleware, Router};
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::select;
use tokio_util::sync::CancellationToken;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tracing::{info, warn};

pub struct AppStateInner {
    pub config: Arc<Config>,
    pub synthesis: Arc<dyn SynthesisClient>,
    pub token: CancellationToken,
}

pub type AppState = Arc<AppStateInner>;

pub struct AppStateBuilder {
    pub config: Option<Config>,
    pub synthesis: Option<Arc<dyn SynthesisClient>>,
}

impl AppStateInner {
    pub fn output_dir(&self) -> &PathBuf {
        &self.config.output_dir
    }

    /// Path for a new output file. The directory is created on demand.
    pub fn get_output_file(&self, file_id: &str) -> std::io::Result<PathBuf> {
        let root = self.output_dir();
        if !root.exists() {
            std::fs::create_dir_all(root)?;
            info!("created output root: {}", root.display());
        }
        Ok(root.join(file_id).with_extension("wav"))
    }
}

impl AppStateBuilder {
    pub fn new() -> Self {
        Self {
            config: None,
            synthesis: None,
        }
    }

    pub fn config(mut self, config: Config) -> Self {
        self.config = Some(config);
        self
    }

    pub fn synthesis(mut self, client: Arc<dyn SynthesisClient>) -> Self {
        self.synthesis = Some(client);
        self
    }

    pub fn build(self) -> Result<AppState> {
        let config = Arc::new(self.config.unwrap_or_default());
        let token = CancellationToken::new();

        if let Err(e) = std::fs::create_dir_all(&config.output_dir) {
            warn!(
                "Failed to create output root: {} {}",
                e,
                config.output_dir.display()
            );
        }

        let synthesis: Arc<dyn SynthesisClient> = match self.synthesis {
            Some(client) => client,
            None => Arc::new(OpenAiTtsClient::new(
                config.openai_endpoint.clone(),
                config.request_timeout(),
            )?),
        };

        Ok(Arc::new(AppStateInner {
            config,
            synthesis,
            token,
        }))
    }
}

impl Default for AppStateBuilder {
    fn default() -> Self {
        Self::new()
    }
}

pub async fn run(state: AppState) -> Result<()> {
    let token = state.token.clone();
    let app = create_router(state.clone());
    let addr: SocketAddr = state.config.http_addr.parse()?;
    let listener = match TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            tracing::error!("Failed to bind to {}: {}", addr, e);
            return Err(anyhow::anyhow!("Failed to bind to {}: {}", addr, e));
        }
    };
    info!("listening on http://{}", addr);

    let http_task = axum::serve(
        listener,
        app.into_make_service_with_connect_info::<SocketAddr>(),
    );

    select! {
        http_result = http_task => {
            match http_result {
                Ok(_) => info!("Server shut down gracefully"),
                Err(e) => {
                    tracing::error!("Server error: {}", e);
                    return Err(anyhow::anyhow!("Server error: {}", e));
                }
            }
        }
        _ = token.cancelled() => {
            info!("Application shutting down due to cancellation");
        }
    }
    token.cancel();
    Ok(())
}

pub fn create_router(state: AppState) -> Router {
    let cors = CorsLayer::new()
        .allow_origin(AllowOrigin::any())
        .allow_methods([
            axum::http::Method::GET,
            axum::http::Method::POST,
            axum::http::Method::OPTIONS,
        ])
        .allow_headers([
            axum::http::header::CONTENT_TYPE,
            axum::http::header::ACCEPT,
            axum::http::header::ORIGIN,
        ]);

    let skip_paths = Arc::new(state.config.http_access_skip_paths.clone());

    crate::handler::router(state)
        .layer(middleware::from_fn_with_state(skip_paths, log_requests))
        .layer(cors)
}
