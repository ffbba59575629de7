//! Axum-based sketch gateway: the three pipeline endpoints over the AI provider.
//! The API key stays in this backend process; clients never receive or send it.

use axum::{
    extract::{Json, Multipart, State},
    http::StatusCode,
    routing::{get, post},
    Router,
};
use serde::Deserialize;
use sketch_provider::{
    with_retry, OpenAiClient, ProviderConfig, ProviderError, RetryPolicy, SketchProvider,
};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::cors::CorsLayer;
use tracing::{error, info};
use tracing_subscriber::{layer::SubscriberExt, util::SubscriberInitExt};

/// Gateway version from Cargo.toml.
pub const GATEWAY_VERSION: &str = env!("CARGO_PKG_VERSION");

/// Default provider storage domain for generated images; embedding clients
/// need this host allowed for rendering.
const DEFAULT_IMAGE_HOST: &str = "oaidalleapiprodscus.blob.core.windows.net";

/// Gateway-level configuration (provider config lives in sketch-provider).
#[derive(Debug, Clone)]
struct GatewayConfig {
    /// HTTP port (env: SKETCH_PORT, default 8000).
    port: u16,
    /// Image hosts embedding clients must allow (env: SKETCH_IMAGE_HOSTS,
    /// comma-separated).
    image_hosts: Vec<String>,
}

impl GatewayConfig {
    fn from_env() -> Self {
        let port = std::env::var("SKETCH_PORT")
            .ok()
            .and_then(|p| p.parse().ok())
            .unwrap_or(8000);
        let image_hosts = std::env::var("SKETCH_IMAGE_HOSTS")
            .unwrap_or_else(|_| DEFAULT_IMAGE_HOST.to_string())
            .split(',')
            .map(|h| h.trim().to_string())
            .filter(|h| !h.is_empty())
            .collect();
        Self { port, image_hosts }
    }
}

#[derive(Clone)]
struct AppState {
    config: Arc<GatewayConfig>,
    provider: Arc<dyn SketchProvider>,
    /// Applied to the transcription path only; chat and image calls are
    /// small JSON round-trips and go out once.
    retry: RetryPolicy,
}

fn router(state: AppState) -> Router {
    Router::new()
        .route("/transcribe", post(transcribe))
        .route("/generate-prompt", post(generate_prompt))
        .route("/generate-image", post(generate_image))
        .route("/api/v1/health", get(health))
        .route("/api/v1/config", get(feature_config))
        .with_state(state)
}

#[tokio::main]
async fn main() {
    // Load .env first: the provider key lives here and nowhere else.
    if let Err(e) = dotenvy::dotenv() {
        eprintln!("[sketch-gateway] .env not loaded: {} (using system environment)", e);
    }

    tracing_subscriber::registry()
        .with(tracing_subscriber::EnvFilter::new(
            std::env::var("RUST_LOG").unwrap_or_else(|_| "info".into()),
        ))
        .with(tracing_subscriber::fmt::layer())
        .init();

    // Fail fast on missing credentials rather than erroring on first call.
    let provider_config = match ProviderConfig::from_env() {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("[sketch-gateway] {}", e);
            eprintln!("[sketch-gateway] Set OPENAI_API_KEY in .env or the environment.");
            std::process::exit(1);
        }
    };
    let provider: Arc<dyn SketchProvider> = match OpenAiClient::new(Arc::clone(&provider_config)) {
        Ok(c) => Arc::new(c),
        Err(e) => {
            eprintln!("[sketch-gateway] provider client init failed: {}", e);
            std::process::exit(1);
        }
    };

    let config = Arc::new(GatewayConfig::from_env());
    let state = AppState {
        config: Arc::clone(&config),
        provider,
        retry: RetryPolicy::default(),
    };

    let cors = CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods(tower_http::cors::Any)
        .allow_headers(tower_http::cors::Any);

    let app = router(state).layer(cors);
    let addr = SocketAddr::from(([0, 0, 0, 0], config.port));
    info!(%addr, stt_model = %provider_config.stt_model, "sketch-gateway listening");

    let listener = match tokio::net::TcpListener::bind(addr).await {
        Ok(l) => l,
        Err(e) => {
            eprintln!("[sketch-gateway] bind {} failed: {}", addr, e);
            std::process::exit(1);
        }
    };
    if let Err(e) = axum::serve(listener, app).await {
        error!(error = %e, "server exited");
    }
}

/// POST /transcribe — multipart with an `audio` file field.
/// 400 when absent, 503 on connectivity failure after retries, 500 otherwise.
async fn transcribe(
    State(state): State<AppState>,
    mut multipart: Multipart,
) -> (StatusCode, Json<serde_json::Value>) {
    let mut audio: Option<(Vec<u8>, String, String)> = None;
    loop {
        match multipart.next_field().await {
            Ok(Some(field)) => {
                if field.name() != Some("audio") {
                    continue;
                }
                let file_name = field
                    .file_name()
                    .unwrap_or("recording.webm")
                    .to_string();
                let mime_type = field
                    .content_type()
                    .unwrap_or("application/octet-stream")
                    .to_string();
                match field.bytes().await {
                    Ok(bytes) => {
                        audio = Some((bytes.to_vec(), mime_type, file_name));
                        break;
                    }
                    Err(e) => {
                        error!(error = %e, "failed to read audio field");
                        return (
                            StatusCode::BAD_REQUEST,
                            Json(serde_json::json!({ "error": "No audio file provided" })),
                        );
                    }
                }
            }
            Ok(None) => break,
            Err(e) => {
                error!(error = %e, "malformed multipart request");
                return (
                    StatusCode::BAD_REQUEST,
                    Json(serde_json::json!({ "error": "No audio file provided" })),
                );
            }
        }
    }

    let (bytes, mime_type, file_name) = match audio {
        Some(a) if !a.0.is_empty() => a,
        _ => {
            return (
                StatusCode::BAD_REQUEST,
                Json(serde_json::json!({ "error": "No audio file provided" })),
            );
        }
    };

    let provider = &state.provider;
    let result = with_retry(&state.retry, || async {
        provider.transcribe(&bytes, &mime_type, &file_name).await
    })
    .await;

    match result {
        Ok(transcript) => (
            StatusCode::OK,
            Json(serde_json::json!({ "transcript": transcript })),
        ),
        Err(e @ ProviderError::Connectivity(_)) => {
            error!(error = %e, "transcription failed after retries");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(serde_json::json!({
                    "error": "Connection error. Please try again later."
                })),
            )
        }
        Err(e) => {
            error!(error = %e, "transcription failed");
            let message = match e {
                ProviderError::Provider { message, .. } => message,
                other => other.to_string(),
            };
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": message })),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct GeneratePromptRequest {
    /// Must be present; may be empty.
    transcript: String,
}

/// POST /generate-prompt — expand a transcript into an image prompt.
async fn generate_prompt(
    State(state): State<AppState>,
    Json(req): Json<GeneratePromptRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.provider.expand_prompt(&req.transcript).await {
        Ok(prompt) => (
            StatusCode::OK,
            Json(serde_json::json!({ "prompt": prompt })),
        ),
        Err(e) => {
            error!(error = %e, "prompt generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Error generating prompt" })),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct GenerateImageRequest {
    prompt: String,
}

/// POST /generate-image — one image at the configured size; returns the
/// provider-hosted URL.
async fn generate_image(
    State(state): State<AppState>,
    Json(req): Json<GenerateImageRequest>,
) -> (StatusCode, Json<serde_json::Value>) {
    match state.provider.generate_image(&req.prompt).await {
        Ok(url) => (
            StatusCode::OK,
            Json(serde_json::json!({ "imageUrl": url })),
        ),
        Err(e) => {
            error!(error = %e, "image generation failed");
            (
                StatusCode::INTERNAL_SERVER_ERROR,
                Json(serde_json::json!({ "error": "Error generating image" })),
            )
        }
    }
}

async fn health() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": GATEWAY_VERSION,
    }))
}

/// Hosts an embedding client must allow to render generated images.
async fn feature_config(State(state): State<AppState>) -> Json<serde_json::Value> {
    Json(serde_json::json!({ "imageHosts": state.config.image_hosts }))
}
