use axum::extract::State;
use loco_rs::app::AppContext;
use loco_rs::prelude::*;
use std::sync::Arc;

use crate::services::errors::AppError;
use crate::services::orchestration_control::{
    OrchestrationControlRequest, OrchestrationControlResult, OrchestrationControlService, OrchestrationMonitorResult,
    OrchestrationStartRequest, OrchestrationStatusResult,
};
use crate::services::orchestration_runtime::OrchestrationRuntime;
use crate::services::worker_registry::RedisWorkerRegistry;

pub fn routes() -> Routes {
    Routes::new()
        .prefix("orchestration")
        .add("/start", post(start))
        .add("/pause", post(pause))
        .add("/resume", post(resume))
        .add("/stop", post(stop))
        .add("/status", post(status))
        .add("/monitor", get(monitor))
}

async fn service_for(ctx: &AppContext) -> Result<OrchestrationControlService, AppError> {
    let settings = crate::settings::shared();
    let registry = RedisWorkerRegistry::connect(
        &settings.redis.url,
        settings.redis.lock_ttl_seconds,
        settings.redis.heartbeat_ttl_seconds,
    )
    .await?;
    let runtime = OrchestrationRuntime::new(ctx.db.clone(), Arc::new(registry));
    Ok(OrchestrationControlService::new(ctx.db.clone(), runtime))
}

async fn start(State(ctx): State<AppContext>, Json(req): Json<OrchestrationStartRequest>) -> Result<Json<OrchestrationControlResult>, AppError> {
    let service = service_for(&ctx).await?;
    Ok(Json(service.start(req).await?))
}

async fn pause(State(ctx): State<AppContext>, Json(req): Json<OrchestrationControlRequest>) -> Result<Json<OrchestrationControlResult>, AppError> {
    let service = service_for(&ctx).await?;
    Ok(Json(service.pause(req).await?))
}

async fn resume(State(ctx): State<AppContext>, Json(req): Json<OrchestrationControlRequest>) -> Result<Json<OrchestrationControlResult>, AppError> {
    let service = service_for(&ctx).await?;
    Ok(Json(service.resume(req).await?))
}

async fn stop(State(ctx): State<AppContext>, Json(req): Json<OrchestrationControlRequest>) -> Result<Json<OrchestrationControlResult>, AppError> {
    let service = service_for(&ctx).await?;
    Ok(Json(service.stop(req).await?))
}

async fn status(State(ctx): State<AppContext>, Json(req): Json<OrchestrationControlRequest>) -> Result<Json<OrchestrationStatusResult>, AppError> {
    let service = service_for(&ctx).await?;
    Ok(Json(service.status(req.binding_ids).await?))
}

async fn monitor(State(ctx): State<AppContext>) -> Result<Json<OrchestrationMonitorResult>, AppError> {
    let service = service_for(&ctx).await?;
    Ok(Json(service.monitor().await?))
}
