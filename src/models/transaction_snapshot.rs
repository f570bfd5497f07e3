use loco_rs::prelude::*;
use sea_orm::*;
use serde::{Deserialize, Serialize};
use serde_json::Value;

use crate::models::_entities::{prelude::*, transaction_snapshots};

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TransactionSnapshot {
    pub id: i32,
    pub transaction_id: i32,
    pub balance_start: Option<i64>,
    pub balance_end: Option<i64>,
    pub trx_idv_raw: Option<Value>,
    pub status_idv_raw: Option<Value>,
    pub created_at: chrono::NaiveDateTime,
    pub updated_at: chrono::NaiveDateTime,
}

impl From<transaction_snapshots::Model> for TransactionSnapshot {
    fn from(model: transaction_snapshots::Model) -> Self {
        Self {
            id: model.id,
            transaction_id: model.transaction_id,
            balance_start: model.balance_start,
            balance_end: model.balance_end,
            trx_idv_raw: model.trx_idv_raw,
            status_idv_raw: model.status_idv_raw,
            created_at: model.created_at,
            updated_at: model.updated_at,
        }
    }
}

impl TransactionSnapshot {
    pub async fn create(
        db: &DatabaseConnection,
        transaction_id: i32,
        balance_start: Option<i64>,
    ) -> Result<TransactionSnapshot> {
        let now = chrono::Utc::now().naive_utc();
        let snapshot = transaction_snapshots::ActiveModel {
            transaction_id: Set(transaction_id),
            balance_start: Set(balance_start),
            created_at: Set(now),
            updated_at: Set(now),
            ..Default::default()
        };
        let created = snapshot.insert(db).await?;
        Ok(TransactionSnapshot::from(created))
    }

    pub async fn find_by_transaction(
        db: &DatabaseConnection,
        transaction_id: i32,
    ) -> Result<Option<TransactionSnapshot>> {
        let snapshot = TransactionSnapshots::find()
            .filter(transaction_snapshots::Column::TransactionId.eq(transaction_id))
            .one(db)
            .await?;
        Ok(snapshot.map(TransactionSnapshot::from))
    }

    #[allow(clippy::too_many_arguments)]
    pub async fn update(
        db: &DatabaseConnection,
        transaction_id: i32,
        balance_end: Option<i64>,
        trx_idv_raw: Option<Value>,
        status_idv_raw: Option<Value>,
    ) -> Result<TransactionSnapshot> {
        let snapshot = TransactionSnapshots::find()
            .filter(transaction_snapshots::Column::TransactionId.eq(transaction_id))
            .one(db)
            .await?
            .ok_or_else(|| Error::string("Transaction snapshot not found"))?;

        let mut snapshot: transaction_snapshots::ActiveModel = snapshot.into();
        if let Some(balance_end) = balance_end {
            snapshot.balance_end = Set(Some(balance_end));
        }
        if let Some(trx_idv_raw) = trx_idv_raw {
            snapshot.trx_idv_raw = Set(Some(trx_idv_raw));
        }
        if let Some(status_idv_raw) = status_idv_raw {
            snapshot.status_idv_raw = Set(Some(status_idv_raw));
        }
        snapshot.updated_at = Set(chrono::Utc::now().naive_utc());

        let updated = snapshot.update(db).await?;
        Ok(TransactionSnapshot::from(updated))
    }
}
