use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::Json;
use loco_rs::app::AppContext;
use loco_rs::prelude::*;
use serde::Deserialize;

use crate::models::enums::AccountStatus;
use crate::models::{Account, Binding, Server};
use crate::services::binding_service::{BindingService, BulkBindingItem};
use crate::services::errors::AppError;

pub fn routes() -> Routes {
    Routes::new()
        .prefix("bindings")
        .add("/", post(create))
        .add("/bulk", post(bulk_create))
        .add("/bulk/dry-run", post(bulk_dry_run))
        .add("/", get(list))
        .add("/view", get(view))
        .add("/:id", get(get_one))
        .add("/:id/logout", post(logout))
        .add("/:id/request-login", post(request_login))
        .add("/:id/verify-login", post(verify_login))
        .add("/:id/check-balance", post(check_balance))
        .add("/:id/refresh-token-location", post(refresh_token_location))
}

#[derive(Debug, Deserialize)]
struct CreateRequest {
    server_id: i32,
    account_id: i32,
    balance_start: Option<i64>,
}

#[derive(Debug, Deserialize)]
struct BulkRequest {
    items: Vec<BulkBindingItem>,
    #[serde(default)]
    stop_on_first_error: bool,
}

#[derive(Debug, Deserialize)]
struct LogoutRequest {
    last_error_code: Option<String>,
    last_error_message: Option<String>,
    account_status: Option<String>,
}

#[derive(Debug, Deserialize)]
struct RequestLoginBody {
    pin: Option<String>,
}

#[derive(Debug, Deserialize)]
struct VerifyLoginBody {
    otp: String,
}

async fn create(State(ctx): State<AppContext>, Json(req): Json<CreateRequest>) -> Result<(StatusCode, Json<Binding>), AppError> {
    let service = BindingService::new(&ctx.db);
    let binding = service.create_binding(req.server_id, req.account_id, req.balance_start).await?;
    Ok((StatusCode::CREATED, Json(binding)))
}

async fn bulk_create(State(ctx): State<AppContext>, Json(req): Json<BulkRequest>) -> Result<Json<serde_json::Value>, AppError> {
    let service = BindingService::new(&ctx.db);
    let summary = service.bulk_create(req.items, false, req.stop_on_first_error).await?;
    Ok(Json(serde_json::to_value(summary).unwrap_or_default()))
}

async fn bulk_dry_run(State(ctx): State<AppContext>, Json(req): Json<BulkRequest>) -> Result<Json<serde_json::Value>, AppError> {
    let service = BindingService::new(&ctx.db);
    let summary = service.bulk_create(req.items, true, req.stop_on_first_error).await?;
    Ok(Json(serde_json::to_value(summary).unwrap_or_default()))
}

async fn list(State(ctx): State<AppContext>) -> Result<Json<Vec<Binding>>, AppError> {
    let bindings = Binding::list_active(&ctx.db).await?;
    Ok(Json(bindings))
}

#[derive(Debug, serde::Serialize)]
struct BindingView {
    binding: Binding,
    account: Account,
    server: Server,
}

async fn view(State(ctx): State<AppContext>) -> Result<Json<Vec<BindingView>>, AppError> {
    let bindings = Binding::list_active(&ctx.db).await?;
    let mut views = Vec::with_capacity(bindings.len());
    for binding in bindings {
        let account = Account::find_by_id(&ctx.db, binding.account_id).await?.ok_or_else(|| AppError::not_found("account_not_found"))?;
        let server = Server::find_by_id(&ctx.db, binding.server_id).await?.ok_or_else(|| AppError::not_found("server_not_found"))?;
        views.push(BindingView { binding, account, server });
    }
    Ok(Json(views))
}

async fn get_one(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<Binding>, AppError> {
    let binding = Binding::find_by_id(&ctx.db, id).await?.ok_or_else(|| AppError::not_found("binding_not_found"))?;
    Ok(Json(binding))
}

async fn logout(State(ctx): State<AppContext>, Path(id): Path<i32>, Json(req): Json<LogoutRequest>) -> Result<Json<Binding>, AppError> {
    let service = BindingService::new(&ctx.db);
    let account_status = req.account_status.as_deref().and_then(AccountStatus::parse);
    let binding = service
        .logout_binding(id, req.last_error_code.as_deref(), req.last_error_message.as_deref(), account_status)
        .await?;
    Ok(Json(binding))
}

async fn request_login(State(ctx): State<AppContext>, Path(id): Path<i32>, Json(req): Json<RequestLoginBody>) -> Result<Json<Binding>, AppError> {
    let service = BindingService::new(&ctx.db);
    let binding = service.request_login(id, req.pin).await?;
    Ok(Json(binding))
}

async fn verify_login(State(ctx): State<AppContext>, Path(id): Path<i32>, Json(req): Json<VerifyLoginBody>) -> Result<Json<Binding>, AppError> {
    let service = BindingService::new(&ctx.db);
    let binding = service.verify_login_and_reseller(id, &req.otp).await?;
    Ok(Json(binding))
}

async fn check_balance(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<Binding>, AppError> {
    let service = BindingService::new(&ctx.db);
    let binding = service.check_balance(id).await?;
    Ok(Json(binding))
}

async fn refresh_token_location(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<Binding>, AppError> {
    let service = BindingService::new(&ctx.db);
    let binding = service.refresh_token_location(id).await?;
    Ok(Json(binding))
}
