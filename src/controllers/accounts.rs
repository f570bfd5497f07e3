use axum::extract::{Path, Query, State};
use axum::http::StatusCode;
use axum::Json;
use loco_rs::app::AppContext;
use loco_rs::prelude::*;
use sea_orm::{ColumnTrait, EntityTrait, PaginatorTrait, QueryFilter, QueryOrder};
use serde::Deserialize;

use crate::models::_entities::accounts;
use crate::models::_entities::prelude::Accounts;
use crate::models::account::{Account, CreateAccountRequest, UpdateAccountRequest};
use crate::services::errors::AppError;

pub fn routes() -> Routes {
    Routes::new()
        .prefix("accounts")
        .add("/", post(create))
        .add("/bulk", post(bulk_create))
        .add("/", get(list))
        .add("/:id", get(get_one))
        .add("/:id", patch(update))
        .add("/:id", delete(remove))
        .add("/", delete(remove_by_lookup))
}

#[derive(Debug, Deserialize)]
struct ListParams {
    status: Option<String>,
    is_reseller: Option<bool>,
    batch_id: Option<String>,
    email: Option<String>,
    msisdn: Option<String>,
    page: Option<u64>,
    per_page: Option<u64>,
}

#[derive(Debug, Deserialize)]
struct DeleteByLookup {
    msisdn: String,
    batch_id: String,
}

async fn create(State(ctx): State<AppContext>, Json(req): Json<CreateAccountRequest>) -> Result<(StatusCode, Json<Account>), AppError> {
    let account = Account::create(&ctx.db, req).await?;
    Ok((StatusCode::CREATED, Json(account)))
}

async fn bulk_create(State(ctx): State<AppContext>, Json(reqs): Json<Vec<CreateAccountRequest>>) -> Result<Json<serde_json::Value>, AppError> {
    let (created, skipped) = Account::bulk_create(&ctx.db, reqs).await?;
    Ok(Json(serde_json::json!({ "created": created, "skipped_msisdns": skipped })))
}

async fn list(State(ctx): State<AppContext>, Query(params): Query<ListParams>) -> Result<Json<serde_json::Value>, AppError> {
    let mut query = Accounts::find();
    if let Some(batch_id) = &params.batch_id {
        query = query.filter(accounts::Column::BatchId.eq(batch_id.clone()));
    }
    if let Some(email) = &params.email {
        query = query.filter(accounts::Column::Email.eq(email.clone()));
    }
    if let Some(msisdn) = &params.msisdn {
        query = query.filter(accounts::Column::Msisdn.eq(msisdn.clone()));
    }
    if let Some(is_reseller) = params.is_reseller {
        query = query.filter(accounts::Column::IsReseller.eq(is_reseller));
    }
    if let Some(status) = &params.status {
        if let Some(status) = crate::models::enums::AccountStatus::parse(status) {
            query = query.filter(accounts::Column::Status.eq(status));
        }
    }

    let paginator = query.order_by_desc(accounts::Column::CreatedAt).paginate(&ctx.db, params.per_page.unwrap_or(20));
    let total_pages = paginator.num_pages().await.map_err(AppError::from)?;
    let page = paginator.fetch_page(params.page.unwrap_or(1).saturating_sub(1)).await.map_err(AppError::from)?;
    let items: Vec<Account> = page.into_iter().map(Account::from).collect();
    Ok(Json(serde_json::json!({ "items": items, "total_pages": total_pages })))
}

async fn get_one(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<Json<Account>, AppError> {
    let account = Account::find_by_id(&ctx.db, id).await?.ok_or_else(|| AppError::not_found("account_not_found"))?;
    Ok(Json(account))
}

async fn update(State(ctx): State<AppContext>, Path(id): Path<i32>, Json(req): Json<UpdateAccountRequest>) -> Result<Json<Account>, AppError> {
    let account = Account::update(&ctx.db, id, req).await?;
    Ok(Json(account))
}

async fn remove(State(ctx): State<AppContext>, Path(id): Path<i32>) -> Result<StatusCode, AppError> {
    Accounts::delete_by_id(id).exec(&ctx.db).await.map_err(AppError::from)?;
    Ok(StatusCode::NO_CONTENT)
}

async fn remove_by_lookup(State(ctx): State<AppContext>, Query(params): Query<DeleteByLookup>) -> Result<StatusCode, AppError> {
    let account = Accounts::find()
        .filter(accounts::Column::Msisdn.eq(params.msisdn))
        .filter(accounts::Column::BatchId.eq(params.batch_id))
        .one(&ctx.db)
        .await
        .map_err(AppError::from)?
        .ok_or_else(|| AppError::not_found("account_not_found"))?;
    Accounts::delete_by_id(account.id).exec(&ctx.db).await.map_err(AppError::from)?;
    Ok(StatusCode::NO_CONTENT)
}
