
use crate::app::{AppState, AppStateBuilder};
use crate::config::Config;
use crate::synthesis::MockSynthesisClient;
use axum::response::Response;
use std::path::Path;
use std::sync::Arc;

fn test_state(output_dir: &Path, mock: MockSynthesisClient) -> AppState {
    let config = Config {
        output_dir: output_dir.to_path_buf(),
        output_ttl_secs: None,
        ..Default::default()
    };
    AppStateBuilder::new()
        .config(config)
        .synthesis(Arc::new(mock))
        .build()
        .unwrap()
}

fn list_files(dir: &Path) -> Vec<String> {
    let mut names: Vec<String> = std::fs::read_dir(dir)
        .unwrap()
        .filter_map(|e| e.ok())
        .map(|e| e.file_name().to_string_lossy().to_string())
        .collect();
    names.sort();
    names
}

// Helper function to convert axum response to bytes
async fn response_to_bytes(response: Response) -> Vec<u8> {
    let body = response.into_body();
    let bytes = axum::body::to_bytes(body, usize::MAX).await.unwrap();
    bytes.to_vec()
}
