//! HTTP surface: `POST /analyze` over the request mapper.

use std::sync::Arc;

use axum::extract::State;
use axum::http::{header, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, post};
use axum::{Json, Router};
use serde::Serialize;
use tower_http::cors::{AllowOrigin, CorsLayer};
use tower_http::trace::TraceLayer;

use super::news::{map_all, NewsItem, SentimentResult};
use super::shutdown_signal;
use crate::core::{HttpSettings, Result, SentimentError};
use crate::pipelines::sentiment_analysis_pipeline::SentimentClassifier;

/// Shared by every request. The classifier is never mutated after startup,
/// so handlers read it concurrently without locking.
#[derive(Clone)]
pub struct AppState {
    classifier: Arc<dyn SentimentClassifier>,
}

impl AppState {
    pub fn new(classifier: Arc<dyn SentimentClassifier>) -> Self {
        Self { classifier }
    }
}

pub fn router(classifier: Arc<dyn SentimentClassifier>, allowed_origins: &[String]) -> Router {
    let app = Router::new()
        .route("/analyze", post(analyze_news))
        .route("/health", get(health))
        .with_state(AppState::new(classifier))
        .layer(TraceLayer::new_for_http());

    match cors_layer(allowed_origins) {
        Some(cors) => app.layer(cors),
        None => app,
    }
}

fn cors_layer(allowed_origins: &[String]) -> Option<CorsLayer> {
    let origins: Vec<HeaderValue> = allowed_origins
        .iter()
        .filter_map(|origin| match origin.parse::<HeaderValue>() {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    if origins.is_empty() {
        return None;
    }

    Some(
        CorsLayer::new()
            .allow_origin(AllowOrigin::list(origins))
            .allow_methods([Method::GET, Method::POST])
            .allow_headers([header::CONTENT_TYPE]),
    )
}

async fn analyze_news(
    State(state): State<AppState>,
    Json(items): Json<Vec<NewsItem>>,
) -> std::result::Result<Json<Vec<SentimentResult>>, ApiError> {
    let received = items.len();
    let classifier = Arc::clone(&state.classifier);
    let results = tokio::task::spawn_blocking(move || map_all(&items, classifier.as_ref()))
        .await
        .map_err(|e| ApiError::Internal(format!("analysis task failed: {e}")))?;

    tracing::info!(received, analyzed = results.len(), "analyzed news batch");
    Ok(Json(results))
}

#[derive(Serialize)]
struct Health {
    status: &'static str,
    model: String,
    device: String,
}

async fn health(State(state): State<AppState>) -> Json<Health> {
    let info = state.classifier.info();
    Json(Health {
        status: "ok",
        model: info.model_id,
        device: info.device,
    })
}

#[derive(Debug)]
pub enum ApiError {
    Internal(String),
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match self {
            ApiError::Internal(detail) => {
                tracing::error!("{detail}");
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    Json(serde_json::json!({ "detail": "internal error" })),
                )
                    .into_response()
            }
        }
    }
}

/// Open the listening socket, resolving the host name if it is not an IP.
pub async fn bind(settings: &HttpSettings) -> Result<tokio::net::TcpListener> {
    let (host, port) = settings.bind_addr();
    let listener = tokio::net::TcpListener::bind((host, port))
        .await
        .map_err(|e| SentimentError::Config(format!("Cannot listen on {host}:{port}: {e}")))?;
    tracing::info!(addr = %listener.local_addr()?, "HTTP server listening");
    Ok(listener)
}

/// Serve until Ctrl-C or SIGTERM.
pub async fn serve(classifier: Arc<dyn SentimentClassifier>, settings: &HttpSettings) -> Result<()> {
    let listener = bind(settings).await?;
    let app = router(classifier, &settings.allowed_origins);

    axum::serve(listener, app)
        .with_graceful_shutdown(shutdown_signal())
        .await?;

    tracing::info!("HTTP server stopped");
    Ok(())
}
