use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use loco_rs::app::AppContext;
use loco_rs::prelude::*;
use serde::Deserialize;

use crate::models::server::{CreateServerRequest, Server, UpdateServerRequest};
use crate::services::errors::AppError;

pub fn routes() -> Routes {
    Routes::new()
        .prefix("servers")
        .add("/", post(create))
        .add("/bulk", post(bulk_create))
        .add("/bulk/dry-run", post(bulk_dry_run))
        .add("/", get(list))
        .add("/:id", get(get_one))
        .add("/:id", patch(update))
        .add("/:id/status", patch(update_status))
        .add("/:id", delete(remove))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    page: Option<u64>,
    per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct StatusRequest {
    is_active: bool,
}

async fn create(State(ctx): State<AppContext>, Json(req): Json<CreateServerRequest>) -> Result<(StatusCode, Json<Server>), AppError> {
    let port = req.port;
    if port < 1 || port > 65535 {
        return Err(AppError::validation("server_invalid_port", "port must be between 1 and 65535"));
    }
    let server = Server::create(&ctx.db, req).await?;
    Ok((StatusCode::CREATED, Json(server)))
}

#[derive(Debug, Deserialize)]
struct BulkServerRequest {
    start_port: i32,
    end_port: i32,
    base_url: String,
}

async fn bulk_create(State(ctx): State<AppContext>, Json(req): Json<BulkServerRequest>) -> Result<Json<Vec<Server>>, AppError> {
    crate::services::binding_service::validate_port_range(req.start_port, req.end_port)?;
    let mut created = Vec::new();
    for port in req.start_port..=req.end_port {
        let server = Server::create(
            &ctx.db,
            CreateServerRequest {
                port,
                base_url: req.base_url.clone(),
                timeout: None,
                retries: None,
                wait_between_retries: None,
                max_requests_queued: None,
                device_id: None,
            },
        )
        .await?;
        created.push(server);
    }
    Ok(Json(created))
}

async fn bulk_dry_run(Json(req): Json<BulkServerRequest>) -> Result<Json<serde_json::Value>, AppError> {
    crate::services::binding_service::validate_port_range(req.start_port, req.end_port)?;
    let count = (req.end_port - req.start_port + 1).max(0);
    Ok(Json(serde_json::json!({ "would_create": count })))
}

async fn list(State(ctx): State<AppContext>, Query(params): Query<ListParams>) -> Result<Json<serde_json::Value>, AppError> {
    let (servers, total_pages) = Server::list(&ctx.db, params.page.unwrap_or(1), params.per_page.unwrap_or(20)).await?;
    Ok(Json(serde_json::json!({ "items": servers, "total_pages": total_pages })))
}

async fn get_one(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<Server>, AppError> {
    let server = Server::find_by_id(&ctx.db, id).await?.ok_or_else(|| AppError::not_found("server_not_found"))?;
    Ok(Json(server))
}

async fn update(State(ctx): State<AppContext>, Path(id): Path<i32>, Json(req): Json<UpdateServerRequest>) -> Result<Json<Server>, AppError> {
    let server = Server::update(&ctx.db, id, req).await?;
    Ok(Json(server))
}

async fn update_status(
    State(ctx): State<AppContext>,
    Path(id): Path<i32>,
    Json(req): Json<StatusRequest>,
) -> Result<Json<Server>, AppError> {
    let server = Server::update(
        &ctx.db,
        id,
        UpdateServerRequest {
            base_url: None,
            timeout: None,
            retries: None,
            wait_between_retries: None,
            max_requests_queued: None,
            is_active: Some(req.is_active),
            device_id: None,
        },
    )
    .await?;
    Ok(Json(server))
}

async fn remove(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<StatusCode, AppError> {
    Server::disable(&ctx.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
