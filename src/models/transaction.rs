use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};

use crate::models::_entities::{prelude::*, transactions};
use crate::models::enums::{TransactionOtpStatus, TransactionStatus};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Transaction {
    pub id: i32,
    pub trx_id: String,
    pub t_id: Option<String>,
    pub server_id: i32,
    pub account_id: i32,
    pub binding_id: i32,
    pub batch_id: String,
    pub device_id: Option<String>,
    pub product_id: String,
    pub email: String,
    pub limit_harga: i64,
    pub amount: Option<i64>,
    pub voucher_code: Option<String>,
    pub status: TransactionStatus,
    pub is_success: Option<i32>,
    pub error_message: Option<String>,
    pub otp_required: bool,
    pub otp_status: Option<TransactionOtpStatus>,
    pub paused_at: Option<chrono::NaiveDateTime>,
    pub resumed_at: Option<chrono::NaiveDateTime>,
    pub pause_reason: Option<String>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct CreateTransactionRequest {
    pub trx_id: String,
    pub server_id: i32,
    pub account_id: i32,
    pub binding_id: i32,
    pub batch_id: String,
    pub device_id: Option<String>,
    pub product_id: String,
    pub email: String,
    pub limit_harga: i64,
}

impl From<transactions::Model> for Transaction {
    fn from(model: transactions::Model) -> Self {
        Self {
            id: model.id,
            trx_id: model.trx_id,
            t_id: model.t_id,
            server_id: model.server_id,
            account_id: model.account_id,
            binding_id: model.binding_id,
            batch_id: model.batch_id,
            device_id: model.device_id,
            product_id: model.product_id,
            email: model.email,
            limit_harga: model.limit_harga,
            amount: model.amount,
            voucher_code: model.voucher_code,
            status: model.status,
            is_success: model.is_success,
            error_message: model.error_message,
            otp_required: model.otp_required,
            otp_status: model.otp_status,
            paused_at: model.paused_at,
            resumed_at: model.resumed_at,
            pause_reason: model.pause_reason,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl Transaction {
    pub async fn create(db: &DatabaseConnection, req: CreateTransactionRequest) -> Result<Transaction> {
        let now = chrono::Utc::now().naive_utc();
        let transaction = transactions::ActiveModel {
            trx_id: Set(req.trx_id),
            server_id: Set(req.server_id),
            account_id: Set(req.account_id),
            binding_id: Set(req.binding_id),
            batch_id: Set(req.batch_id),
            device_id: Set(req.device_id),
            product_id: Set(req.product_id),
            email: Set(req.email),
            limit_harga: Set(req.limit_harga),
            status: Set(TransactionStatus::Processing),
            otp_required: Set(false),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };

        let created = transaction.insert(db).await?;
        Ok(Transaction::from(created))
    }

    pub async fn find_by_id(db: &DatabaseConnection, id: i32) -> Result<Option<Transaction>> {
        let transaction = Transactions::find_by_id(id).one(db).await?;
        Ok(transaction.map(Transaction::from))
    }

    pub async fn find_by_binding_and_trx_id(
        db: &DatabaseConnection,
        binding_id: i32,
        trx_id: &str,
    ) -> Result<Option<Transaction>> {
        let transaction = Transactions::find()
            .filter(transactions::Column::BindingId.eq(binding_id))
            .filter(transactions::Column::TrxId.eq(trx_id))
            .one(db)
            .await?;
        Ok(transaction.map(Transaction::from))
    }

    pub async fn list_by_binding(db: &DatabaseConnection, binding_id: i32) -> Result<Vec<Transaction>> {
        let transactions = Transactions::find()
            .filter(transactions::Column::BindingId.eq(binding_id))
            .order_by_desc(transactions::Column::CreatedAt)
            .all(db)
            .await?;
        Ok(transactions.into_iter().map(Transaction::from).collect())
    }

    pub async fn list_active(db: &DatabaseConnection) -> Result<Vec<Transaction>> {
        let transactions = Transactions::find()
            .filter(
                transactions::Column::Status
                    .is_in([TransactionStatus::Processing, TransactionStatus::Paused, TransactionStatus::Resumed]),
            )
            .order_by_asc(transactions::Column::Id)
            .all(db)
            .await?;
        Ok(transactions.into_iter().map(Transaction::from).collect())
    }

    pub async fn update_status(
        db: &DatabaseConnection,
        id: i32,
        status: TransactionStatus,
    ) -> Result<Transaction> {
        let transaction = Transactions::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Transaction not found"))?;

        let mut transaction: transactions::ActiveModel = transaction.into();
        transaction.status = Set(status);
        transaction.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = transaction.update(db).await?;
        Ok(Transaction::from(updated))
    }

    pub async fn pause(db: &DatabaseConnection, id: i32, reason: Option<String>) -> Result<Transaction> {
        let transaction = Transactions::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Transaction not found"))?;

        let mut transaction: transactions::ActiveModel = transaction.into();
        transaction.status = Set(TransactionStatus::Paused);
        transaction.paused_at = Set(Some(chrono::Utc::now().naive_utc()));
        transaction.pause_reason = Set(reason);
        transaction.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = transaction.update(db).await?;
        Ok(Transaction::from(updated))
    }

    /// Stops a transaction, forcing `voucher_code` and `otp_status` to NULL
    /// rather than leaving whatever they were set to — `finalize`'s
    /// set-if-`Some` fields can't express "clear this" since `None` there
    /// means "leave unchanged".
    pub async fn stop(db: &DatabaseConnection, id: i32, reason: Option<String>) -> Result<Transaction> {
        let transaction = Transactions::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Transaction not found"))?;

        let mut transaction: transactions::ActiveModel = transaction.into();
        transaction.status = Set(TransactionStatus::Gagal);
        transaction.voucher_code = Set(None);
        transaction.otp_status = Set(None);
        transaction.error_message = Set(reason);
        transaction.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = transaction.update(db).await?;
        Ok(Transaction::from(updated))
    }

    pub async fn resume(db: &DatabaseConnection, id: i32) -> Result<Transaction> {
        let transaction = Transactions::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Transaction not found"))?;

        let mut transaction: transactions::ActiveModel = transaction.into();
        transaction.status = Set(TransactionStatus::Resumed);
        transaction.resumed_at = Set(Some(chrono::Utc::now().naive_utc()));
        transaction.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = transaction.update(db).await?;
        Ok(Transaction::from(updated))
    }

    pub async fn set_otp_required(db: &DatabaseConnection, id: i32, required: bool) -> Result<Transaction> {
        let transaction = Transactions::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Transaction not found"))?;

        let mut transaction: transactions::ActiveModel = transaction.into();
        transaction.otp_required = Set(required);
        transaction.otp_status = Set(Some(TransactionOtpStatus::Pending));
        transaction.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = transaction.update(db).await?;
        Ok(Transaction::from(updated))
    }

    pub async fn set_otp_status(
        db: &DatabaseConnection,
        id: i32,
        otp_status: TransactionOtpStatus,
    ) -> Result<Transaction> {
        let transaction = Transactions::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Transaction not found"))?;

        let mut transaction: transactions::ActiveModel = transaction.into();
        transaction.otp_status = Set(Some(otp_status));
        transaction.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = transaction.update(db).await?;
        Ok(Transaction::from(updated))
    }

    pub async fn delete(db: &DatabaseConnection, id: i32) -> Result<()> {
        Transactions::delete_by_id(id).exec(db).await?;
        Ok(())
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn finalize(
        db: &DatabaseConnection,
        id: i32,
        status: TransactionStatus,
        t_id: Option<String>,
        amount: Option<i64>,
        voucher_code: Option<String>,
        is_success: Option<i32>,
        error_message: Option<String>,
    ) -> Result<Transaction> {
        let transaction = Transactions::find_by_id(id)
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Transaction not found"))?;

        let mut transaction: transactions::ActiveModel = transaction.into();
        transaction.status = Set(status);
        if let Some(t_id) = t_id {
            transaction.t_id = Set(Some(t_id));
        }
        if let Some(amount) = amount {
            transaction.amount = Set(Some(amount));
        }
        if let Some(voucher_code) = voucher_code {
            transaction.voucher_code = Set(Some(voucher_code));
        }
        if let Some(is_success) = is_success {
            transaction.is_success = Set(Some(is_success));
        }
        if let Some(error_message) = error_message {
            transaction.error_message = Set(Some(error_message));
        }
        transaction.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = transaction.update(db).await?;
        Ok(Transaction::from(updated))
    }
}
