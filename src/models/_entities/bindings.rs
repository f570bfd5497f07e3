//! `bindings` entity — exclusive pairing of one account with one server instance.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::enums::BindingStep;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "bindings")]
pub struct Model {
    #[sea_orm(primary_key)]
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
    pub token_location_refreshed_at: Option<DateTime>,
    pub device_id: Option<String>,
    pub last_error_code: Option<String>,
    pub last_error_message: Option<String>,
    pub bound_at: DateTime,
    pub unbound_at: Option<DateTime>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::servers::Entity",
        from = "Column::ServerId",
        to = "super::servers::Column::Id"
    )]
    Server,
    #[sea_orm(
        belongs_to = "super::accounts::Entity",
        from = "Column::AccountId",
        to = "super::accounts::Column::Id"
    )]
    Account,
    #[sea_orm(has_many = "super::transactions::Entity")]
    Transactions,
}

impl Related<super::servers::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Server.def()
    }
}

impl Related<super::accounts::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Account.def()
    }
}

impl Related<super::transactions::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Transactions.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}

impl Model {
    /// At most one non-logged-out binding exists per server/account (enforced by
    /// a partial unique index in the schema); this mirrors that check in Rust.
    pub fn is_active(&self) -> bool {
        self.unbound_at.is_none()
    }
}
