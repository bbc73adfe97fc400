//! HTTP API for the QA metrics service.
//!
//! This module exposes the record service over a small REST API using
//! the [`axum`](https://crates.io/crates/axum) framework.  Clients save
//! and load department months, preview computed fields, take and restore
//! backups and read the dashboard.  Every JSON response carries a
//! `success` flag; failures add a `message`.

use crate::engine::compute_fields;
use crate::error::{QaError, QaResult};
use crate::models::{Backup, RecordKey, SaveRequest};
use crate::service::{backup_filename, validate_key, QaService};
use anyhow::Result;
use axum::{
    extract::{rejection::JsonRejection, Query, State},
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    routing::{get, post},
    Json, Router,
};
use serde::Deserialize;
use serde_json::json;
use std::sync::Arc;

/// Application state shared across requests.
pub struct AppState {
    pub service: QaService,
}

/// Natural key as sent in query strings and delete bodies.  Missing parts
/// deserialise as empty and are rejected by the service.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PeriodParams {
    #[serde(default)]
    pub department_id: String,
    #[serde(default)]
    pub fiscal_year: String,
    #[serde(default)]
    pub month: String,
}

impl PeriodParams {
    fn into_key(self) -> RecordKey {
        RecordKey::new(self.department_id, self.fiscal_year, self.month)
    }
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearParams {
    #[serde(default)]
    pub department_id: String,
    #[serde(default)]
    pub fiscal_year: String,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct YearFilter {
    pub fiscal_year: Option<String>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardParams {
    pub fiscal_year: Option<String>,
    pub month: Option<String>,
}

/// Build the API router around `service`.
pub fn build_router(service: QaService) -> Router {
    let state = Arc::new(AppState { service });
    Router::new()
        .route("/api/qa/save", post(save_handler))
        .route("/api/qa/compute", post(compute_handler))
        .route("/api/qa/by-period", get(by_period_handler))
        .route("/api/qa/by-year", get(by_year_handler))
        .route("/api/qa/delete", post(delete_handler))
        .route("/api/admin/all-data", get(all_data_handler))
        .route("/api/admin/backup", get(backup_handler))
        .route("/api/admin/restore", post(restore_handler))
        .route("/api/admin/dashboard", get(dashboard_handler))
        .with_state(state)
}

fn failure(status: StatusCode, message: impl Into<String>) -> Response {
    let body = Json(json!({"success": false, "message": message.into()}));
    (status, body).into_response()
}

fn error_response(err: QaError) -> Response {
    let status = match err {
        QaError::MissingField(_) | QaError::EmptyBackup => StatusCode::BAD_REQUEST,
        QaError::NotFound { .. } => StatusCode::NOT_FOUND,
        QaError::Io(_) | QaError::Serialization(_) => StatusCode::INTERNAL_SERVER_ERROR,
    };
    if status.is_server_error() {
        tracing::error!(error = %err, "request failed");
    }
    failure(status, err.to_string())
}

fn rejection_response(rejection: JsonRejection) -> Response {
    failure(StatusCode::BAD_REQUEST, rejection.body_text())
}

/// Run a service call on the blocking pool.  The store does whole-file
/// I/O under a mutex and enrichment fans out over rayon, so neither may
/// run on a runtime worker.
async fn blocking<T, F>(state: &AppState, call: F) -> Result<T, Response>
where
    F: FnOnce(&QaService) -> QaResult<T> + Send + 'static,
    T: Send + 'static,
{
    let service = state.service.clone();
    match tokio::task::spawn_blocking(move || call(&service)).await {
        Ok(Ok(value)) => Ok(value),
        Ok(Err(err)) => Err(error_response(err)),
        Err(err) => {
            tracing::error!(error = %err, "service task failed");
            Err(failure(StatusCode::INTERNAL_SERVER_ERROR, "internal error"))
        }
    }
}

/// Handler for POST /api/qa/save
async fn save_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<SaveRequest>, JsonRejection>,
) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    match blocking(&state, move |service| service.save(request)).await {
        Ok(record) => Json(json!({"success": true, "record": record})).into_response(),
        Err(response) => response,
    }
}

/// Handler for POST /api/qa/compute.  Runs the engine without storing.
async fn compute_handler(body: Result<Json<SaveRequest>, JsonRejection>) -> Response {
    let Json(request) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    let key = RecordKey::new(
        request.department_id.as_str(),
        request.fiscal_year.as_str(),
        request.month.as_str(),
    );
    if let Err(err) = validate_key(&key) {
        return error_response(err);
    }
    let raw = request.fields.unwrap_or_default();
    let data = compute_fields(&raw, &key.fiscal_year, &key.month, &key.department_id);
    Json(json!({"success": true, "data": data})).into_response()
}

/// Handler for GET /api/qa/by-period.  `record` is null when nothing is
/// stored for the key.
async fn by_period_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<PeriodParams>,
) -> Response {
    let key = params.into_key();
    match blocking(&state, move |service| service.by_period(&key)).await {
        Ok(record) => Json(json!({"success": true, "record": record})).into_response(),
        Err(response) => response,
    }
}

/// Handler for GET /api/qa/by-year.  `data` maps each filled month name
/// to its record, in fiscal order.
async fn by_year_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<YearParams>,
) -> Response {
    let result = blocking(&state, move |service| {
        service.by_year(&params.department_id, &params.fiscal_year)
    })
    .await;
    match result {
        Ok(view) => Json(json!({
            "success": true,
            "data": view.months,
            "records": view.records,
        }))
        .into_response(),
        Err(response) => response,
    }
}

/// Handler for POST /api/qa/delete
async fn delete_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<PeriodParams>, JsonRejection>,
) -> Response {
    let Json(params) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    let key = params.into_key();
    match blocking(&state, move |service| service.delete(&key)).await {
        Ok(()) => Json(json!({"success": true, "message": "record deleted"})).into_response(),
        Err(response) => response,
    }
}

/// Handler for GET /api/admin/all-data
async fn all_data_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<YearFilter>,
) -> Response {
    let result = blocking(&state, move |service| {
        service.all_data(params.fiscal_year.as_deref())
    })
    .await;
    match result {
        Ok(records) => Json(json!({
            "success": true,
            "totalRecords": records.len(),
            "data": records,
        }))
        .into_response(),
        Err(response) => response,
    }
}

/// Handler for GET /api/admin/backup.  Served as a file download.
async fn backup_handler(State(state): State<Arc<AppState>>) -> Response {
    let result = blocking(&state, |service| {
        let backup = service.backup()?;
        Ok(serde_json::to_vec_pretty(&backup)?)
    })
    .await;
    let bytes = match result {
        Ok(bytes) => bytes,
        Err(response) => return response,
    };
    let disposition = format!(
        "attachment; filename=\"{}\"",
        backup_filename(chrono::Utc::now())
    );
    (
        StatusCode::OK,
        [
            (header::CONTENT_TYPE, "application/json".to_string()),
            (header::CONTENT_DISPOSITION, disposition),
        ],
        bytes,
    )
        .into_response()
}

/// Handler for POST /api/admin/restore.  Partial success is still a
/// success; a restore where every record failed answers 400.
async fn restore_handler(
    State(state): State<Arc<AppState>>,
    body: Result<Json<Backup>, JsonRejection>,
) -> Response {
    let Json(backup) = match body {
        Ok(body) => body,
        Err(rejection) => return rejection_response(rejection),
    };
    let report = match blocking(&state, move |service| service.restore(backup)).await {
        Ok(report) => report,
        Err(response) => return response,
    };
    let (status, success, message) = if report.failed == 0 {
        (
            StatusCode::OK,
            true,
            format!("restored all {} records", report.success),
        )
    } else if report.success > 0 {
        (
            StatusCode::OK,
            true,
            format!("restored {} records, {} failed", report.success, report.failed),
        )
    } else {
        (
            StatusCode::BAD_REQUEST,
            false,
            format!("all {} records failed to restore", report.failed),
        )
    };
    let body = Json(json!({"success": success, "message": message, "results": report}));
    (status, body).into_response()
}

/// Handler for GET /api/admin/dashboard
async fn dashboard_handler(
    State(state): State<Arc<AppState>>,
    Query(params): Query<DashboardParams>,
) -> Response {
    let result = blocking(&state, move |service| {
        service.dashboard(params.fiscal_year.as_deref(), params.month.as_deref())
    })
    .await;
    match result {
        Ok(dashboard) => Json(json!({"success": true, "data": dashboard})).into_response(),
        Err(response) => response,
    }
}

/// Launch the API server on `addr`.  Runs until the listener fails or
/// the process is interrupted.
pub async fn serve(addr: &str, service: QaService) -> Result<()> {
    let router = build_router(service);
    let listener = tokio::net::TcpListener::bind(addr).await?;
    tracing::info!(addr = %listener.local_addr()?, "server listening");
    axum::serve(listener, router).await?;
    Ok(())
}
