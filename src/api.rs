use crate::config::Config;
use crate::detector::MessageAnalyzer;
use crate::export;
use crate::shield::{sha256_hex, truncate_chars};
use crate::store::{NewThreatRecord, ThreatStore};
use axum::extract::{Path, State};
use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::routing::{get, put};
use axum::{Json, Router};
use chrono::Utc;
use serde::Deserialize;
use std::sync::Arc;
use tower_http::cors::CorsLayer;

/// Shared handler state: the store plus one analyzer instance. The analyzer
/// is a stateless value type, so cloning it per request is free.
#[derive(Clone)]
pub struct AppState {
    pub store: Arc<ThreatStore>,
    pub analyzer: MessageAnalyzer,
    pub snippet_max_chars: usize,
}

struct ApiError(StatusCode, String);

impl ApiError {
    fn not_found(what: &str) -> Self {
        ApiError(StatusCode::NOT_FOUND, format!("{what} not found"))
    }
}

impl From<anyhow::Error> for ApiError {
    fn from(err: anyhow::Error) -> Self {
        log::error!("Store error: {err:#}");
        ApiError(StatusCode::INTERNAL_SERVER_ERROR, err.to_string())
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = serde_json::json!({ "error": self.1 });
        (self.0, Json(body)).into_response()
    }
}

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/stats", get(stats))
        .route("/logs", get(list_logs).post(create_log).delete(delete_logs))
        .route("/logs/:id", put(update_log).delete(delete_log))
        .route("/settings/:key", get(get_setting).put(put_setting))
        .route("/export/csv", get(export_csv))
        .layer(CorsLayer::permissive())
        .with_state(state)
}

pub async fn serve(config: &Config, store: Arc<ThreatStore>) -> anyhow::Result<()> {
    let state = AppState {
        store,
        analyzer: MessageAnalyzer::new(config.score_threshold, config.symbol_policy),
        snippet_max_chars: config.snippet_max_chars,
    };

    let app = build_router(state);
    let listener = tokio::net::TcpListener::bind(&config.listen_addr).await?;
    log::info!("Dashboard API listening on {}", config.listen_addr);
    axum::serve(listener, app)
        .with_graceful_shutdown(async {
            let _ = tokio::signal::ctrl_c().await;
            log::info!("Shutting down API server");
        })
        .await?;
    Ok(())
}

async fn stats(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.counts()?))
}

async fn list_logs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    Ok(Json(state.store.list_all()?))
}

#[derive(Debug, Deserialize)]
struct CreateLogRequest {
    app_source: String,
    sender_id: Option<String>,
    message: String,
}

async fn create_log(
    State(state): State<AppState>,
    Json(request): Json<CreateLogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if request.message.is_empty() {
        return Err(ApiError(
            StatusCode::BAD_REQUEST,
            "message must not be empty".to_string(),
        ));
    }

    let result = state.analyzer.analyze(&request.message);
    let category = result.category();
    let snippet = truncate_chars(&request.message, state.snippet_max_chars);
    let record = NewThreatRecord {
        timestamp: Utc::now().timestamp_millis(),
        app_source: request.app_source,
        sender_id: request.sender_id,
        message_snippet: snippet.clone(),
        reason: category.as_str().to_string(),
        score: result.score,
        hash: sha256_hex(&snippet),
        screenshot_path: None,
    };
    let id = state.store.insert(&record)?;

    let body = serde_json::json!({
        "id": id,
        "score": result.score,
        "is_threat": result.is_threat,
        "category": category.as_str(),
        "matched_pattern": result.matched_pattern.as_str(),
        "reasons": result.reasons,
    });
    Ok((StatusCode::CREATED, Json(body)))
}

#[derive(Debug, Deserialize)]
struct UpdateLogRequest {
    is_false_positive: bool,
}

async fn update_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
    Json(request): Json<UpdateLogRequest>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.set_false_positive(id, request.is_false_positive)? {
        return Err(ApiError::not_found("log"));
    }
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn delete_log(
    State(state): State<AppState>,
    Path(id): Path<i64>,
) -> Result<impl IntoResponse, ApiError> {
    if !state.store.delete(id)? {
        return Err(ApiError::not_found("log"));
    }
    Ok(StatusCode::NO_CONTENT)
}

async fn delete_logs(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    state.store.delete_all()?;
    Ok(StatusCode::NO_CONTENT)
}

async fn get_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
) -> Result<impl IntoResponse, ApiError> {
    let value = state.store.get_setting(&key)?;
    Ok(Json(serde_json::json!({ "value": value })))
}

#[derive(Debug, Deserialize)]
struct PutSettingRequest {
    value: String,
}

async fn put_setting(
    State(state): State<AppState>,
    Path(key): Path<String>,
    Json(request): Json<PutSettingRequest>,
) -> Result<impl IntoResponse, ApiError> {
    state.store.set_setting(&key, &request.value)?;
    Ok(Json(serde_json::json!({ "ok": true })))
}

async fn export_csv(State(state): State<AppState>) -> Result<impl IntoResponse, ApiError> {
    let records = state.store.list_all()?;
    let csv = export::render_csv(&records);
    Ok((
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "text/csv"),
            (
                header::CONTENT_DISPOSITION,
                "attachment; filename=\"chat_shield_logs.csv\"",
            ),
        ],
        csv,
    ))
}
