//! Ad-hoc provider passthroughs (§6): lets an operator poke the IDV
//! provider directly through a registered server, without a binding.

use axum::extract::State;
use loco_rs::app::AppContext;
use loco_rs::prelude::*;
use serde::Deserialize;
use serde_json::Value;

use crate::models::Server;
use crate::services::errors::AppError;
use crate::services::idv_client::{IdvClient, IdvClientConfig};

pub fn routes() -> Routes {
    Routes::new()
        .prefix("tools")
        .add("/otp", post(otp))
        .add("/balance", post(balance))
        .add("/products", post(products))
        .add("/token", post(token))
        .add("/trx", post(trx))
}

#[derive(Debug, Deserialize)]
struct OtpRequest {
    server_id: i32,
    msisdn: String,
    pin: String,
}

#[derive(Debug, Deserialize)]
struct BalanceRequest {
    server_id: i32,
    msisdn: String,
}

#[derive(Debug, Deserialize)]
struct ProductsRequest {
    server_id: i32,
    msisdn: String,
}

#[derive(Debug, Deserialize)]
struct TokenRequest {
    server_id: i32,
    msisdn: String,
}

#[derive(Debug, Deserialize)]
struct TrxRequest {
    server_id: i32,
    msisdn: String,
    product_id: String,
    email: String,
    limit_harga: i64,
}

async fn client_for(ctx: &AppContext, server_id: i32) -> Result<IdvClient, AppError> {
    let server = Server::find_by_id(&ctx.db, server_id).await?.ok_or_else(|| AppError::not_found("server_not_found"))?;
    IdvClient::new(IdvClientConfig {
        base_url: server.base_url,
        timeout_seconds: server.timeout.max(1) as u64,
        retries: server.retries.max(1) as u32,
        backoff_factor: server.wait_between_retries.max(1) as f64,
    })
}

async fn otp(State(ctx): State<AppContext>, Json(req): Json<OtpRequest>) -> Result<Json<Value>, AppError> {
    let idv = client_for(&ctx, req.server_id).await?;
    Ok(Json(idv.request_otp(&req.msisdn, &req.pin).await?))
}

async fn balance(State(ctx): State<AppContext>, Json(req): Json<BalanceRequest>) -> Result<Json<Value>, AppError> {
    let idv = client_for(&ctx, req.server_id).await?;
    Ok(Json(idv.get_balance_pulsa(&req.msisdn).await?))
}

async fn products(State(ctx): State<AppContext>, Json(req): Json<ProductsRequest>) -> Result<Json<Value>, AppError> {
    let idv = client_for(&ctx, req.server_id).await?;
    Ok(Json(idv.list_produk(&req.msisdn).await?))
}

async fn token(State(ctx): State<AppContext>, Json(req): Json<TokenRequest>) -> Result<Json<Value>, AppError> {
    let idv = client_for(&ctx, req.server_id).await?;
    Ok(Json(idv.get_token_location3(&req.msisdn).await?))
}

async fn trx(State(ctx): State<AppContext>, Json(req): Json<TrxRequest>) -> Result<Json<Value>, AppError> {
    let idv = client_for(&ctx, req.server_id).await?;
    Ok(Json(idv.trx_voucher_idv(&req.msisdn, &req.product_id, &req.email, req.limit_harga).await?))
}
