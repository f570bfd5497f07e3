use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::models::_entities::{accounts, prelude::*};
use crate::models::enums::AccountStatus;
use crate::services::errors::{AppError, AppResult};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Account {
    pub id: i32,
    pub msisdn: String,
    pub batch_id: String,
    pub email: String,
    pub status: AccountStatus,
    pub is_reseller: bool,
    pub balance_last: Option<i64>,
    pub used_count: i32,
    pub last_used_at: Option<chrono::NaiveDateTime>,
    pub last_device_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateAccountRequest {
    pub msisdn: String,
    pub batch_id: String,
    pub email: String,
    pub pin: Option<String>,
    pub notes: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UpdateAccountRequest {
    pub email: Option<String>,
    pub status: Option<AccountStatus>,
    pub notes: Option<String>,
}

impl From<accounts::Model> for Account {
    fn from(model: accounts::Model) -> Self {
        Self {
            id: model.id,
            msisdn: model.msisdn,
            batch_id: model.batch_id,
            email: model.email,
            status: model.status,
            is_reseller: model.is_reseller,
            balance_last: model.balance_last,
            used_count: model.used_count,
            last_used_at: model.last_used_at,
            last_device_id: model.last_device_id,
            notes: model.notes,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Account {
    pub async fn create(db: &DatabaseConnection, req: CreateAccountRequest) -> AppResult<Account> {
        let existing = Accounts::find()
            .filter(accounts::Column::Msisdn.eq(req.msisdn.clone()))
            .filter(accounts::Column::BatchId.eq(req.batch_id.clone()))
            .one(db)
            .await?;
        if existing.is_some() {
            return Err(AppError::validation(
                "account_already_exists",
                "Account already exists for this msisdn/batch",
            ));
        }

        let now = chrono::Utc::now().naive_utc();
        let account = accounts::ActiveModel {
            msisdn: Set(req.msisdn),
            batch_id: Set(req.batch_id),
            email: Set(req.email),
            pin: Set(req.pin),
            status: Set(AccountStatus::New),
            is_reseller: Set(false),
            used_count: Set(0),
            notes: Set(req.notes),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = account.insert(db).await?;
        Ok(Account::from(created))
    }

    /// Bulk-create accounts for a batch; returns created accounts and skips duplicates.
    pub async fn bulk_create(
        db: &DatabaseConnection,
        requests: Vec<CreateAccountRequest>,
    ) -> Result<(Vec<Account>, Vec<String>)> {
        let mut created = Vec::new();
        let mut skipped = Vec::new();

        for req in requests {
            let msisdn = req.msisdn.clone();
            match Self::create(db, req).await {
                Ok(account) => created.push(account),
                Err(_) => skipped.push(msisdn),
            }
        }

        Ok((created, skipped))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Account>> {
        let account = Accounts::find_by_id(id).one(db).await?;
        Ok(account.map(Account::from))
    }

    pub async fn find_by_msisdn(db: &DatabaseConnection, msisdn: &str) -> Result<Option<Account>> {
        let account = Accounts::find()
            .filter(accounts::Column::Msisdn.eq(msisdn))
            .one(db)
            .await?;
        Ok(account.map(Account::from))
    }

    pub async fn list_by_batch(db: &DatabaseConnection, batch_id: &str) -> Result<Vec<Account>> {
        let accounts = Accounts::find()
            .filter(accounts::Column::BatchId.eq(batch_id))
            .order_by_asc(accounts::Column::Id)
            .all(db)
            .await?;
        Ok(accounts.into_iter().map(Account::from).collect())
    }

    pub async fn list(db: &DatabaseConnection, page: u64, per_page: u64) -> Result<(Vec<Account>, u64)> {
        let paginator = Accounts::find()
            .order_by_desc(accounts::Column::CreatedAt)
            .paginate(db, per_page);

        let total_pages = paginator.num_pages().await?;
        let accounts = paginator.fetch_page(page - 1).await?;
        Ok((accounts.into_iter().map(Account::from).collect(), total_pages))
    }

    pub async fn update(db: &DatabaseConnection, id: i32, req: UpdateAccountRequest) -> Result<Account> {
        let account = Accounts::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Account not found"))?;

        let mut account: accounts::ActiveModel = account.into();

        if let Some(email) = req.email {
            account.email = Set(email);
        }
        if let Some(status) = req.status {
            account.status = Set(status);
        }
        if let Some(notes) = req.notes {
            account.notes = Set(Some(notes));
        }
        account.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = account.update(db).await?;
        Ok(Account::from(updated))
    }

    /// PIN on file for this account, used by `binding_service::request_login`
    /// when the caller doesn't supply one explicitly.
    pub async fn find_pin(db: &DatabaseConnection, id: i32) -> Result<Option<String>> {
        let account = Accounts::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Account not found"))?;
        Ok(account.pin)
    }

    /// Mirrors provider-observed balance/reseller/device facts captured while
    /// verifying a binding's login.
    pub async fn sync_from_provider(
        db: &DatabaseConnection,
        id: i32,
        balance: Option<i64>,
        is_reseller: bool,
        device_id: Option<String>,
    ) -> Result<Account> {
        let account = Accounts::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Account not found"))?;

        let mut account: accounts::ActiveModel = account.into();
        if let Some(balance) = balance {
            account.balance_last = Set(Some(balance));
        }
        account.is_reseller = Set(is_reseller);
        if let Some(device_id) = device_id {
            account.last_device_id = Set(Some(device_id));
        }
        account.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = account.update(db).await?;
        Ok(Account::from(updated))
    }

    /// Records usage of this account on the given server instance.
    pub async fn mark_used(db: &DatabaseConnection, id: i32, device_id: Option<String>) -> Result<Account> {
        let account = Accounts::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Account not found"))?;

        let used_count = account.used_count + 1;
        let mut account: accounts::ActiveModel = account.into();
        account.used_count = Set(used_count);
        account.last_used_at = Set(Some(chrono::Utc::now().naive_utc()));
        if let Some(device_id) = device_id {
            account.last_device_id = Set(Some(device_id));
        }
        account.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = account.update(db).await?;
        Ok(Account::from(updated))
    }
}
