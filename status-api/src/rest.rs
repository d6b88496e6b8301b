use crate::auth::require_api_key;
use crate::db;
use crate::errors::{Error, Result};
use crate::metrics::{self, STATUS_CREATED_TOTAL};
use crate::model::{DeviceStatus, DeviceStatusUpdate, NewDeviceStatus, SummaryItem};
use crate::validate::{validate, validate_update};
use axum::{
    extract::{rejection::JsonRejection, Path, State},
    http::StatusCode,
    middleware,
    routing::get,
    Json, Router,
};
use sqlx::SqlitePool;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::{debug, info};

#[derive(Debug, Clone)]
pub struct AppState {
    pub pool: SqlitePool,
    pub api_key: Option<Arc<str>>,
}

pub fn create_router(pool: SqlitePool, api_key: Option<String>) -> Router {
    let state = AppState {
        pool,
        api_key: api_key.map(Arc::from),
    };

    let status_routes = Router::new()
        .route("/status", get(get_all_status).post(create_status))
        .route("/status/", get(get_all_status).post(create_status))
        .route("/status/summary/", get(get_summary))
        .route(
            "/status/:device_id",
            get(get_latest_status)
                .patch(update_status)
                .delete(delete_status),
        )
        .route_layer(middleware::from_fn_with_state(
            state.clone(),
            require_api_key,
        ));

    Router::new()
        .route("/", get(read_root))
        .route("/metrics", get(metrics_handler))
        .merge(status_routes)
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn read_root() -> &'static str {
    "Server is running..."
}

async fn metrics_handler() -> Result<String> {
    Ok(metrics::gather_metrics()?)
}

/// Unwraps a JSON body, reporting any shape problem as a validation error.
fn json_payload<T>(payload: std::result::Result<Json<T>, JsonRejection>) -> Result<T> {
    payload
        .map(|Json(value)| value)
        .map_err(|rejection| Error::Validation(rejection.body_text()))
}

async fn create_status(
    State(state): State<AppState>,
    payload: std::result::Result<Json<NewDeviceStatus>, JsonRejection>,
) -> Result<(StatusCode, Json<DeviceStatus>)> {
    let status = json_payload(payload)?;
    validate(&status)?;

    let stored = db::insert(&state.pool, &status).await?;
    STATUS_CREATED_TOTAL.inc();
    info!("Recorded status {} for device {}", stored.id, stored.device_id);

    Ok((StatusCode::CREATED, Json(stored)))
}

async fn get_all_status(State(state): State<AppState>) -> Result<Json<Vec<DeviceStatus>>> {
    let statuses = db::list_all(&state.pool).await?;
    debug!("Listing {} status records", statuses.len());
    Ok(Json(statuses))
}

async fn get_summary(State(state): State<AppState>) -> Result<Json<Vec<SummaryItem>>> {
    let summary = db::summary(&state.pool).await?;
    Ok(Json(summary))
}

async fn get_latest_status(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<Json<DeviceStatus>> {
    let status = db::latest(&state.pool, &device_id).await?;
    Ok(Json(status))
}

async fn update_status(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
    payload: std::result::Result<Json<DeviceStatusUpdate>, JsonRejection>,
) -> Result<Json<DeviceStatus>> {
    let update = json_payload(payload)?;
    validate_update(&update)?;

    let updated = db::update(&state.pool, &device_id, &update).await?;
    info!("Updated status {} for device {}", updated.id, device_id);
    Ok(Json(updated))
}

async fn delete_status(
    State(state): State<AppState>,
    Path(device_id): Path<String>,
) -> Result<StatusCode> {
    let removed = db::delete(&state.pool, &device_id).await?;
    info!("Deleted status {} for device {}", removed.id, device_id);
    Ok(StatusCode::NO_CONTENT)
}
