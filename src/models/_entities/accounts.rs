//! `accounts` entity — an MSISDN within a batch.

use sea_orm::entity::prelude::*;
use serde::{Deserialize, Serialize};

use crate::models::enums::AccountStatus;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel, Serialize, Deserialize)]
#[sea_orm(table_name = "accounts")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub msisdn: String,
    pub batch_id: String,
    pub email: String,
    pub pin: Option<String>,
    pub status: AccountStatus,
    pub is_reseller: bool,
    pub balance_last: Option<i64>,
    pub used_count: i32,
    pub last_used_at: Option<DateTime>,
    pub last_device_id: Option<String>,
    pub notes: Option<String>,
    pub created_at: DateTime,
    pub updated_at: DateTime,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::bindings::Entity")]
    Bindings,
}

impl Related<super::bindings::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Bindings.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
