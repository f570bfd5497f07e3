use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::models::_entities::{bindings, prelude::*};
use crate::models::enums::BindingStep;

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Binding {
    pub id: i32,
    pub server_id: i32,
    pub account_id: i32,
    pub batch_id: String,
    pub step: BindingStep,
    pub is_reseller: bool,
    pub balance_start: Option<i64>,
    pub balance_last: Option<i64>,
    pub token_login: Option<String>,
    pub token_location: Option<String>,
    pub token_location_refreshed_at: Option<chrono::NaiveDateTime>,
    pub device_id: Option<String>,
    pub last_error_code: Option<String>,
    pub last_error_message: Option<String>,
    pub bound_at: chrono::NaiveDateTime,
    pub unbound_at: Option<chrono::NaiveDateTime>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateBindingRequest {
    pub server_id: i32,
    pub account_id: i32,
    pub batch_id: String,
}

impl From<bindings::Model> for Binding {
    fn from(model: bindings::Model) -> Self {
        Self {
            id: model.id,
            server_id: model.server_id,
            account_id: model.account_id,
            batch_id: model.batch_id,
            step: model.step,
            is_reseller: model.is_reseller,
            balance_start: model.balance_start,
            balance_last: model.balance_last,
            token_login: model.token_login,
            token_location: model.token_location,
            token_location_refreshed_at: model.token_location_refreshed_at,
            device_id: model.device_id,
            last_error_code: model.last_error_code,
            last_error_message: model.last_error_message,
            bound_at: model.bound_at,
            unbound_at: model.unbound_at,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Binding {
    /// Create a binding. Relies on the schema's partial unique indexes
    /// (`uq_bindings_active_server`, `uq_bindings_active_account`) to reject a
    /// second active binding on the same server or account; a duplicate
    /// insert surfaces here as a database error.
    pub async fn create(db: &DatabaseConnection, req: CreateBindingRequest) -> Result<Binding> {
        let now = chrono::Utc::now().naive_utc();
        let binding = bindings::ActiveModel {
            server_id: Set(req.server_id),
            account_id: Set(req.account_id),
            batch_id: Set(req.batch_id),
            step: Set(BindingStep::Bound),
            is_reseller: Set(false),
            bound_at: Set(now),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = binding.insert(db).await?;
        Ok(Binding::from(created))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Binding>> {
        let binding = Bindings::find_by_id(id).one(db).await?;
        Ok(binding.map(Binding::from))
    }

    pub async fn find_active_by_server(db: &DatabaseConnection, server_id: i32) -> Result<Option<Binding>> {
        let binding = Bindings::find()
            .filter(bindings::Column::ServerId.eq(server_id))
            .filter(bindings::Column::UnboundAt.is_null())
            .one(db)
            .await?;
        Ok(binding.map(Binding::from))
    }

    pub async fn find_active_by_account(db: &DatabaseConnection, account_id: i32) -> Result<Option<Binding>> {
        let binding = Bindings::find()
            .filter(bindings::Column::AccountId.eq(account_id))
            .filter(bindings::Column::UnboundAt.is_null())
            .one(db)
            .await?;
        Ok(binding.map(Binding::from))
    }

    pub async fn list_active(db: &DatabaseConnection) -> Result<Vec<Binding>> {
        let bindings = Bindings::find()
            .filter(bindings::Column::UnboundAt.is_null())
            .order_by_asc(bindings::Column::Id)
            .all(db)
            .await?;
        Ok(bindings.into_iter().map(Binding::from).collect())
    }

    pub async fn list_by_batch(db: &DatabaseConnection, batch_id: &str) -> Result<Vec<Binding>> {
        let bindings = Bindings::find()
            .filter(bindings::Column::BatchId.eq(batch_id))
            .order_by_asc(bindings::Column::Id)
            .all(db)
            .await?;
        Ok(bindings.into_iter().map(Binding::from).collect())
    }

    pub async fn set_step(db: &DatabaseConnection, id: i32, step: BindingStep) -> Result<Binding> {
        let binding = Bindings::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Binding not found"))?;

        let mut binding: bindings::ActiveModel = binding.into();
        binding.step = Set(step);
        binding.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = binding.update(db).await?;
        Ok(Binding::from(updated))
    }

    pub async fn set_tokens(
        db: &DatabaseConnection,
        id: i32,
        token_login: Option<String>,
        token_location: Option<String>,
    ) -> Result<Binding> {
        let binding = Bindings::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Binding not found"))?;

        let mut binding: bindings::ActiveModel = binding.into();
        if let Some(token_login) = token_login {
            binding.token_login = Set(Some(token_login));
        }
        if let Some(token_location) = token_location {
            binding.token_location = Set(Some(token_location));
            binding.token_location_refreshed_at = Set(Some(chrono::Utc::now().naive_utc()));
        }
        binding.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = binding.update(db).await?;
        Ok(Binding::from(updated))
    }

    pub async fn set_reseller_and_balance(
        db: &DatabaseConnection,
        id: i32,
        is_reseller: bool,
        balance: Option<i64>,
    ) -> Result<Binding> {
        let binding = Bindings::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Binding not found"))?;

        let had_balance_start = binding.balance_start.is_some();
        let mut binding: bindings::ActiveModel = binding.into();
        binding.is_reseller = Set(is_reseller);
        if let Some(balance) = balance {
            binding.balance_last = Set(Some(balance));
            if !had_balance_start {
                binding.balance_start = Set(Some(balance));
            }
        }
        binding.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = binding.update(db).await?;
        Ok(Binding::from(updated))
    }

    pub async fn record_error(
        db: &DatabaseConnection,
        id: i32,
        error_code: &str,
        error_message: &str,
    ) -> Result<Binding> {
        let binding = Bindings::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Binding not found"))?;

        let mut binding: bindings::ActiveModel = binding.into();
        binding.last_error_code = Set(Some(error_code.to_string()));
        binding.last_error_message = Set(Some(error_message.to_string()));
        binding.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = binding.update(db).await?;
        Ok(Binding::from(updated))
    }

    pub async fn set_device_id(db: &DatabaseConnection, id: i32, device_id: String) -> Result<Binding> {
        let binding = Bindings::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Binding not found"))?;

        let mut binding: bindings::ActiveModel = binding.into();
        binding.device_id = Set(Some(device_id));
        binding.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = binding.update(db).await?;
        Ok(Binding::from(updated))
    }

    pub async fn unbind(db: &DatabaseConnection, id: i32) -> Result<Binding> {
        let binding = Bindings::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Binding not found"))?;

        let mut binding: bindings::ActiveModel = binding.into();
        binding.step = Set(BindingStep::LoggedOut);
        binding.unbound_at = Set(Some(chrono::Utc::now().naive_utc()));
        binding.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = binding.update(db).await?;
        Ok(Binding::from(updated))
    }
}
