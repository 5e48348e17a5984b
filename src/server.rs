//! HTTP server for capture logging and live identification.
//!
//! This module provides an HTTP server that:
//! - Stores raw capture logs for later dataset building via POST /api/save_log
//! - Computes the feature vector of a live sample via POST /api/features
//! - Identifies the typist of a live sample via POST /api/predict
//!
//! # Architecture
//!
//! ```text
//! Browser capture ──→ POST /api/save_log ──→ raw log store ──→ `keystroke-id extract`
//!                 └─→ POST /api/predict  ──→ online pipeline ──→ scaler ──→ classifier
//! ```

use crate::audit::{
    create_shared_log, create_shared_log_with_persistence, AuditStats, SharedAuditLog,
};
use crate::core::features::{FeatureVector, FEATURE_COUNT, FEATURE_NAMES};
use crate::model::{ModelError, ModelHandle};
use crate::pipeline::{self, PredictError, ValidationError};
use crate::storage::RawLogStore;
use axum::{
    extract::State,
    http::{HeaderValue, StatusCode},
    routing::{get, post},
    Json, Router,
};
use serde::Serialize;
use serde_json::Value;
use std::net::SocketAddr;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::net::TcpListener;
use tokio::sync::oneshot;
use tokio::task::JoinHandle;
use tower_http::cors::{Any, CorsLayer};

/// Server configuration
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Port to bind to (0 for random)
    pub port: u16,
    /// Directory for raw capture logs
    pub raw_log_dir: PathBuf,
    /// Directory holding the model artifacts
    pub model_dir: PathBuf,
    /// Where audit counters are persisted on shutdown
    pub audit_path: Option<PathBuf>,
}

impl ServerConfig {
    pub fn new(port: u16, raw_log_dir: PathBuf, model_dir: PathBuf) -> Self {
        Self {
            port,
            raw_log_dir,
            model_dir,
            audit_path: None,
        }
    }

    pub fn with_audit_path(mut self, path: PathBuf) -> Self {
        self.audit_path = Some(path);
        self
    }
}

/// Shared server state
pub struct ServerState {
    /// Loaded once at startup, read-only afterwards
    model: ModelHandle,
    store: RawLogStore,
    audit: SharedAuditLog,
}

impl ServerState {
    /// Load the model and open the raw log store.
    ///
    /// A missing model is not an error: the server starts and answers
    /// prediction requests with `MODEL_UNAVAILABLE`.
    pub fn new(config: &ServerConfig) -> Result<Self, ModelError> {
        let audit = match &config.audit_path {
            Some(path) => create_shared_log_with_persistence(path.clone()),
            None => create_shared_log(),
        };

        Ok(Self {
            model: ModelHandle::load(&config.model_dir)?,
            store: RawLogStore::new(config.raw_log_dir.clone()),
            audit,
        })
    }
}

/// Response from save_log endpoint
#[derive(Debug, Clone, Serialize)]
pub struct SaveLogResponse {
    pub message: String,
    pub file: String,
}

/// Response from features endpoint
#[derive(Debug, Clone, Serialize)]
pub struct FeaturesResponse {
    pub features: FeatureVector,
    pub names: [&'static str; FEATURE_COUNT],
    pub skipped_events: usize,
}

/// Health check response
#[derive(Serialize)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub model_loaded: bool,
}

/// Error response
#[derive(Serialize)]
pub struct ErrorResponse {
    pub error: String,
    pub code: String,
}

type ApiError = (StatusCode, Json<ErrorResponse>);

fn api_error(status: StatusCode, code: &str, error: impl ToString) -> ApiError {
    (
        status,
        Json(ErrorResponse {
            error: error.to_string(),
            code: code.to_string(),
        }),
    )
}

fn validation_error(e: ValidationError) -> ApiError {
    api_error(StatusCode::BAD_REQUEST, "VALIDATION_ERROR", e)
}

fn model_error(e: ModelError) -> ApiError {
    match e {
        ModelError::Unavailable => {
            api_error(StatusCode::INTERNAL_SERVER_ERROR, "MODEL_UNAVAILABLE", e)
        }
        other => api_error(StatusCode::INTERNAL_SERVER_ERROR, "MODEL_ERROR", other),
    }
}

/// GET /health
async fn health(State(state): State<Arc<ServerState>>) -> Json<HealthResponse> {
    Json(HealthResponse {
        status: "ok".to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        model_loaded: state.model.is_available(),
    })
}

/// POST /api/save_log
///
/// Stores the raw capture as submitted, for the batch pipeline.
async fn save_log(
    State(state): State<Arc<ServerState>>,
    Json(sample): Json<Value>,
) -> Result<Json<SaveLogResponse>, ApiError> {
    if !sample.is_object() {
        return Err(validation_error(ValidationError::NotAnObject));
    }

    let path = state.store.save(&sample).map_err(|e| {
        tracing::error!(error = %e, "failed to save raw log");
        api_error(StatusCode::INTERNAL_SERVER_ERROR, "STORAGE_ERROR", e)
    })?;
    state.audit.record_log_saved();
    tracing::debug!(file = %path.display(), "raw log saved");

    Ok(Json(SaveLogResponse {
        message: "Log saved successfully".to_string(),
        file: path.display().to_string(),
    }))
}

/// POST /api/features
async fn features(
    State(state): State<Arc<ServerState>>,
    Json(sample): Json<Value>,
) -> Result<Json<FeaturesResponse>, ApiError> {
    let extraction = pipeline::extract_online(&sample).map_err(|e| {
        state.audit.record_rejected();
        validation_error(e)
    })?;
    state.audit.record_extracted(extraction.malformed.len());

    Ok(Json(FeaturesResponse {
        features: extraction.features,
        names: FEATURE_NAMES,
        skipped_events: extraction.malformed.len(),
    }))
}

/// POST /api/predict
async fn predict(
    State(state): State<Arc<ServerState>>,
    Json(sample): Json<Value>,
) -> Result<Json<pipeline::Prediction>, ApiError> {
    let prediction = pipeline::predict(&sample, &state.model).map_err(|e| match e {
        PredictError::Validation(e) => {
            state.audit.record_rejected();
            validation_error(e)
        }
        PredictError::Model(e) => {
            tracing::warn!(error = %e, "prediction failed");
            model_error(e)
        }
    })?;

    state.audit.record_extracted(prediction.skipped_events);
    state.audit.record_prediction();

    Ok(Json(prediction))
}

/// GET /api/stats
async fn stats(State(state): State<Arc<ServerState>>) -> Json<AuditStats> {
    Json(state.audit.stats())
}

/// Build the router over an existing state.
pub fn router(state: Arc<ServerState>) -> Router {
    Router::new()
        .route("/health", get(health))
        .route("/api/save_log", post(save_log))
        .route("/api/features", post(features))
        .route("/api/predict", post(predict))
        .route("/api/stats", get(stats))
        .layer(
            CorsLayer::new()
                .allow_origin([
                    HeaderValue::from_static("http://localhost"),
                    HeaderValue::from_static("http://127.0.0.1"),
                ])
                .allow_methods(Any)
                .allow_headers(Any),
        )
        .with_state(state)
}

/// Run the HTTP server
/// Start the server in a background task.
///
/// Returns the bound address, the shutdown trigger and the server task. The
/// task finishes once the server has stopped and the audit counters are saved.
pub async fn run(
    config: ServerConfig,
) -> anyhow::Result<(SocketAddr, oneshot::Sender<()>, JoinHandle<()>)> {
    let state = Arc::new(ServerState::new(&config)?);
    let app = router(state.clone());

    let addr = SocketAddr::from(([127, 0, 0, 1], config.port));
    let listener = TcpListener::bind(addr).await?;
    let actual_addr = listener.local_addr()?;

    tracing::info!("keystroke-id server listening on http://{}", actual_addr);

    let (shutdown_tx, shutdown_rx) = oneshot::channel::<()>();

    let server = tokio::spawn(async move {
        if let Err(e) = axum::serve(listener, app)
            .with_graceful_shutdown(async {
                let _ = shutdown_rx.await;
                tracing::info!("Server shutdown signal received");
            })
            .await
        {
            tracing::error!("Server error: {}", e);
        }

        if let Err(e) = state.audit.save() {
            tracing::warn!(error = %e, "could not save audit stats");
        }
    });

    Ok((actual_addr, shutdown_tx, server))
}
