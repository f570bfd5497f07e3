//! `transactions` entity — a single voucher purchase attempt on a binding.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::enums::{TransactionOtpStatus, TransactionStatus};

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "transactions")]
pub struct Model {
    #[sea_orm(primary_key)]
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
    pub paused_at: Option<DateTime>,
    pub resumed_at: Option<DateTime>,
    pub pause_reason: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::bindings::Entity",
        from = "Column::BindingId",
        to = "super::bindings::Column::Id"
    )]
    Binding,
    #[sea_orm(has_one = "super::transaction_snapshots::Entity")]
    Snapshot,
}

impl Related<super::bindings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Binding.def()
    }
}

impl Related<super::transaction_snapshots::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Snapshot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
