use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::net::SocketAddr;
use std::sync::Arc;
use tower_http::trace::TraceLayer;
use tracing::info;

use crate::config::Target;
use crate::engine::Monitor;
use crate::models::{ActionReport, CheckReport, ServiceAction, StatusSummary};

type ApiResult<T> = Result<Json<T>, (StatusCode, String)>;

/// Boundary validation: empty target fields are a caller mistake, rejected
/// before anything is executed.
fn validated(target: Target) -> Result<Target, (StatusCode, String)> {
    target
        .validate()
        .map_err(|e| (StatusCode::BAD_REQUEST, format!("Validation error: {e}")))?;
    Ok(target)
}

async fn probe(State(monitor): State<Arc<Monitor>>, Json(target): Json<Target>) -> ApiResult<CheckReport> {
    let target = validated(target)?;
    Ok(Json(monitor.probe(&target).await))
}

async fn service_status(
    State(monitor): State<Arc<Monitor>>,
    Json(target): Json<Target>,
) -> ApiResult<CheckReport> {
    let target = validated(target)?;
    Ok(Json(monitor.query_service(&target).await))
}

async fn service_action(
    monitor: Arc<Monitor>,
    target: Target,
    action: ServiceAction,
) -> ApiResult<ActionReport> {
    let target = validated(target)?;
    Ok(Json(monitor.apply_service_action(&target, action).await))
}

async fn start_service(
    State(monitor): State<Arc<Monitor>>,
    Json(target): Json<Target>,
) -> ApiResult<ActionReport> {
    service_action(monitor, target, ServiceAction::Started).await
}

async fn stop_service(
    State(monitor): State<Arc<Monitor>>,
    Json(target): Json<Target>,
) -> ApiResult<ActionReport> {
    service_action(monitor, target, ServiceAction::Stopped).await
}

async fn restart_service(
    State(monitor): State<Arc<Monitor>>,
    Json(target): Json<Target>,
) -> ApiResult<ActionReport> {
    service_action(monitor, target, ServiceAction::Restarted).await
}

async fn monitor_status(State(monitor): State<Arc<Monitor>>) -> Json<StatusSummary> {
    Json(monitor.status().await)
}

async fn enable_monitor(State(monitor): State<Arc<Monitor>>) -> Json<Value> {
    monitor.set_enabled(true).await;
    Json(json!({ "monitoring": "enabled" }))
}

async fn disable_monitor(State(monitor): State<Arc<Monitor>>) -> Json<Value> {
    monitor.set_enabled(false).await;
    Json(json!({ "monitoring": "disabled" }))
}

async fn check_now(State(monitor): State<Arc<Monitor>>) -> Json<CheckReport> {
    Json(monitor.check_now().await)
}

async fn update_config(
    State(monitor): State<Arc<Monitor>>,
    Json(target): Json<Target>,
) -> ApiResult<Value> {
    let target = validated(target)?;
    let host = target.host.clone();
    monitor.update_target(target).await;
    Ok(Json(json!({ "monitoring": "target updated", "host": host })))
}

pub fn create_router(monitor: Arc<Monitor>) -> Router {
    Router::new()
        .route("/api/probe", post(probe))
        .route("/api/service/status", post(service_status))
        .route("/api/service/start", post(start_service))
        .route("/api/service/stop", post(stop_service))
        .route("/api/service/restart", post(restart_service))
        .route("/api/monitor/status", get(monitor_status))
        .route("/api/monitor/enable", post(enable_monitor))
        .route("/api/monitor/disable", post(disable_monitor))
        .route("/api/monitor/check-now", post(check_now))
        .route("/api/monitor/config", post(update_config))
        .layer(TraceLayer::new_for_http())
        .with_state(monitor)
}

pub async fn start_server(port: u16, monitor: Arc<Monitor>) {
    let app = create_router(monitor);
    let addr = SocketAddr::from(([0, 0, 0, 0], port));
    info!("Control API: http://localhost:{}", addr.port());
    let listener = tokio::net::TcpListener::bind(addr).await.expect("Failed to bind API port");
    axum::serve(listener, app).await.unwrap();
}
