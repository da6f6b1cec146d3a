//! API request handlers

use axum::{
    extract::{Multipart, Query, State},
    http::HeaderMap,
    Json,
};
use serde::{Deserialize, Serialize};
use std::collections::HashMap;
use std::sync::Arc;
use tracing::info;

use crate::dataset::{ColumnStats, Dataset, DatasetSummary, SessionId};
use crate::error::PipelineError;
use crate::metrics::MetricsReport;
use crate::request::TrainingRequest;

use super::error::{Result, ServerError};
use super::state::AppState;
use super::urls::UrlReport;

/// Header carrying the caller's session id
pub const SESSION_HEADER: &str = "x-session-id";

fn session_header(headers: &HeaderMap) -> Option<SessionId> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(SessionId::new)
}

fn session_or_default(headers: &HeaderMap) -> SessionId {
    session_header(headers).unwrap_or_default()
}

async fn run_blocking<T, F>(f: F) -> Result<T>
where
    F: FnOnce() -> crate::error::Result<T> + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(f)
        .await
        .map_err(|e| ServerError::Internal(format!("worker task failed: {}", e)))?
        .map_err(ServerError::from)
}

// ============================================================================
// Data Handlers
// ============================================================================

#[derive(Debug, Serialize)]
pub struct UploadResponse {
    pub session_id: String,
    #[serde(flatten)]
    pub summary: DatasetSummary,
}

pub async fn upload_data(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<UploadResponse>> {
    let session = session_or_default(&headers);

    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        if field.name() != Some("file") {
            continue;
        }
        let file_name = field.file_name().unwrap_or_default().to_string();
        let data = field
            .bytes()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;

        info!(session = %session, file = %file_name, bytes = data.len(), "Received upload");

        let (dataset, summary) = run_blocking(move || {
            let dataset = Dataset::from_bytes(&file_name, &data)?;
            let summary = dataset.summary()?;
            Ok((dataset, summary))
        })
        .await?;

        state.store.put(session.clone(), dataset);
        info!(session = %session, rows = summary.rows, columns = summary.columns.len(), "Dataset stored");

        return Ok(Json(UploadResponse {
            session_id: session.to_string(),
            summary,
        }));
    }

    Err(PipelineError::MissingField("file".to_string()).into())
}

#[derive(Deserialize)]
pub struct StatsQuery {
    col: String,
}

pub async fn target_stats(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Query(query): Query<StatsQuery>,
) -> Result<Json<ColumnStats>> {
    let dataset = state.store.get(&session_or_default(&headers))?;
    let stats = ColumnStats::compute(&dataset, &query.col)?;
    Ok(Json(stats))
}

// ============================================================================
// URL Handlers
// ============================================================================

pub async fn check_urls(
    State(state): State<Arc<AppState>>,
    Json(urls): Json<Vec<String>>,
) -> Result<Json<UrlReport>> {
    let report = state
        .urls
        .check_all(urls)
        .await
        .map_err(|e| ServerError::Internal(format!("failed to build HTTP client: {}", e)))?;
    info!(checked = report.checked, reachable = report.reachable, "Checked URLs");
    Ok(Json(report))
}

// ============================================================================
// Training Handlers
// ============================================================================

pub async fn train_model(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    mut multipart: Multipart,
) -> Result<Json<MetricsReport>> {
    let session = session_or_default(&headers);

    let mut fields = HashMap::new();
    while let Some(field) = multipart
        .next_field()
        .await
        .map_err(|e| ServerError::BadRequest(e.to_string()))?
    {
        let Some(name) = field.name().map(str::to_string) else {
            continue;
        };
        let value = field
            .text()
            .await
            .map_err(|e| ServerError::BadRequest(e.to_string()))?;
        fields.insert(name, value);
    }

    let dataset = state.store.get(&session)?;
    let request = TrainingRequest::from_fields(fields)?;
    info!(
        session = %session,
        target = %request.target,
        features = %request.features,
        model_type = %request.model_type,
        task_type = %request.task_type,
        split_ratio = %request.split_ratio,
        epochs = %request.epochs,
        max_depth = ?request.max_depth,
        "/train called"
    );

    let worker = Arc::clone(&state);
    let report = run_blocking(move || worker.pipeline.run(&dataset, &request)).await?;
    Ok(Json(report))
}

// ============================================================================
// System Handlers
// ============================================================================

pub async fn health_check() -> Json<serde_json::Value> {
    Json(serde_json::json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION"),
    }))
}
