use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use loco_rs::app::AppContext;
use loco_rs::prelude::*;
use serde::Deserialize;

use crate::models::enums::TransactionStatus;
use crate::models::transaction::{CreateTransactionRequest, Transaction};
use crate::models::TransactionSnapshot;
use crate::services::errors::AppError;
use crate::services::transaction_service::TransactionService;

pub fn routes() -> Routes {
    Routes::new()
        .prefix("transactions")
        .add("/", post(create))
        .add("/start", post(start))
        .add("/:id/otp", post(submit_otp))
        .add("/:id/continue", post(continue_transaction))
        .add("/:id/stop", post(stop))
        .add("/:id/pause", post(pause))
        .add("/:id/resume", post(resume))
        .add("/:id/check", post(check))
        .add("/", get(list))
        .add("/:id", get(get_one))
        .add("/:id/status", patch(update_status))
        .add("/:id/snapshot", get(get_snapshot))
        .add("/:id/snapshot", patch(update_snapshot))
        .add("/:id", delete(remove))
}

#[derive(Debug, Deserialize)]
struct StartRequest {
    binding_id: i32,
    product_id: String,
    email: String,
    limit_harga: i64,
}

#[derive(Debug, Deserialize)]
struct ReasonBody {
    reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct OtpBody {
    otp: String,
}

#[derive(Debug, Deserialize)]
struct ListParams {
    binding_id: Option<i32>,
}

#[derive(Debug, Deserialize)]
struct CreateTransactionBody {
    #[serde(flatten)]
    request: CreateTransactionRequest,
    balance_start: Option<i64>,
    trx_idv_raw: Option<serde_json::Value>,
}

async fn create(State(ctx): State<AppContext>, Json(req): Json<CreateTransactionBody>) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let service = TransactionService::new(&ctx.db);
    let trx = service.create_transaction(req.request, req.balance_start, req.trx_idv_raw).await?;
    Ok((StatusCode::CREATED, Json(trx)))
}

async fn start(State(ctx): State<AppContext>, Json(req): Json<StartRequest>) -> Result<(StatusCode, Json<Transaction>), AppError> {
    let service = TransactionService::new(&ctx.db);
    let trx = service.start_transaction(req.binding_id, &req.product_id, &req.email, req.limit_harga).await?;
    Ok((StatusCode::CREATED, Json(trx)))
}

async fn submit_otp(State(ctx): State<AppContext>, Path(id): Path<i32>, Json(req): Json<OtpBody>) -> Result<Json<Transaction>, AppError> {
    let service = TransactionService::new(&ctx.db);
    let trx = service.submit_otp(id, &req.otp).await?;
    Ok(Json(trx))
}

async fn continue_transaction(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<Transaction>, AppError> {
    let service = TransactionService::new(&ctx.db);
    let trx = service.continue_transaction(id).await?;
    Ok(Json(trx))
}

async fn stop(State(ctx): State<AppContext>, Path(id): Path<i32>, Json(req): Json<ReasonBody>) -> Result<Json<Transaction>, AppError> {
    let service = TransactionService::new(&ctx.db);
    let trx = service.stop_transaction(id, req.reason).await?;
    Ok(Json(trx))
}

async fn pause(State(ctx): State<AppContext>, Path(id): Path<i32>, Json(req): Json<ReasonBody>) -> Result<Json<Transaction>, AppError> {
    let service = TransactionService::new(&ctx.db);
    let trx = service.pause_transaction(id, req.reason).await?;
    Ok(Json(trx))
}

async fn resume(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<Transaction>, AppError> {
    let service = TransactionService::new(&ctx.db);
    let trx = service.resume_transaction(id).await?;
    Ok(Json(trx))
}

async fn check(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<serde_json::Value>, AppError> {
    let service = TransactionService::new(&ctx.db);
    let (trx, action) = service.check_balance_and_continue_or_stop(id).await?;
    Ok(Json(serde_json::json!({ "transaction": trx, "action": format!("{action:?}") })))
}

async fn list(State(ctx): State<AppContext>, Query(params): Query<ListParams>) -> Result<Json<Vec<Transaction>>, AppError> {
    let service = TransactionService::new(&ctx.db);
    let items = service.list_transactions(params.binding_id).await?;
    Ok(Json(items))
}

async fn get_one(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<Transaction>, AppError> {
    let service = TransactionService::new(&ctx.db);
    let trx = service.get_transaction(id).await?;
    Ok(Json(trx))
}

#[derive(Debug, Deserialize)]
struct UpdateStatusBody {
    status: TransactionStatus,
}

async fn update_status(
    State(ctx): State<AppContext>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateStatusBody>,
) -> Result<Json<Transaction>, AppError> {
    let trx = Transaction::update_status(&ctx.db, id, req.status).await?;
    Ok(Json(trx))
}

async fn get_snapshot(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<TransactionSnapshot>, AppError> {
    let snapshot = TransactionSnapshot::find_by_transaction(&ctx.db, id)
        .await?
        .ok_or_else(|| AppError::not_found("transaction_snapshot_not_found"))?;
    Ok(Json(snapshot))
}

#[derive(Debug, Deserialize)]
struct UpdateSnapshotBody {
    balance_end: Option<i64>,
}

async fn update_snapshot(
    State(ctx): State<AppContext>,
    Path(id): Path<i32>,
    Json(req): Json<UpdateSnapshotBody>,
) -> Result<Json<TransactionSnapshot>, AppError> {
    let snapshot = TransactionSnapshot::update(&ctx.db, id, req.balance_end, None, None).await?;
    Ok(Json(snapshot))
}

async fn remove(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<StatusCode, AppError> {
    Transaction::delete(&ctx.db, id).await?;
    Ok(StatusCode::NO_CONTENT)
}
