use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_servers::Servers;
use crate::m20240101_000002_create_accounts::Accounts;
use crate::m20240101_000003_create_bindings::Bindings;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Transactions::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Transactions::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Transactions::TrxId).string().not_null())
                    .col(ColumnDef::new(Transactions::TId).string())
                    .col(ColumnDef::new(Transactions::ServerId).integer().not_null())
                    .col(ColumnDef::new(Transactions::AccountId).integer().not_null())
                    .col(ColumnDef::new(Transactions::BindingId).integer().not_null())
                    .col(ColumnDef::new(Transactions::BatchId).string().not_null())
                    .col(ColumnDef::new(Transactions::DeviceId).string())
                    .col(ColumnDef::new(Transactions::ProductId).string().not_null())
                    .col(ColumnDef::new(Transactions::Email).string().not_null())
                    .col(ColumnDef::new(Transactions::LimitHarga).big_integer().not_null())
                    .col(ColumnDef::new(Transactions::Amount).big_integer())
                    .col(ColumnDef::new(Transactions::VoucherCode).string())
                    .col(ColumnDef::new(Transactions::Status).string().not_null().default("PROCESSING"))
                    .col(ColumnDef::new(Transactions::IsSuccess).integer())
                    .col(ColumnDef::new(Transactions::ErrorMessage).text())
                    .col(ColumnDef::new(Transactions::OtpRequired).boolean().not_null().default(false))
                    .col(ColumnDef::new(Transactions::OtpStatus).string())
                    .col(ColumnDef::new(Transactions::PausedAt).timestamp())
                    .col(ColumnDef::new(Transactions::ResumedAt).timestamp())
                    .col(ColumnDef::new(Transactions::PauseReason).text())
                    .col(ColumnDef::new(Transactions::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(Transactions::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_server_id")
                            .from(Transactions::Table, Transactions::ServerId)
                            .to(Servers::Table, Servers::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_account_id")
                            .from(Transactions::Table, Transactions::AccountId)
                            .to(Accounts::Table, Accounts::Id),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transactions_binding_id")
                            .from(Transactions::Table, Transactions::BindingId)
                            .to(Bindings::Table, Bindings::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_trx_id")
                    .table(Transactions::Table)
                    .col(Transactions::TrxId)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_transactions_binding_trx")
                    .table(Transactions::Table)
                    .col(Transactions::BindingId)
                    .col(Transactions::TrxId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_transactions_status")
                    .table(Transactions::Table)
                    .col(Transactions::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Transactions::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Transactions {
    Table,
    Id,
    TrxId,
    TId,
    ServerId,
    AccountId,
    BindingId,
    BatchId,
    DeviceId,
    ProductId,
    Email,
    LimitHarga,
    Amount,
    VoucherCode,
    Status,
    IsSuccess,
    ErrorMessage,
    OtpRequired,
    OtpStatus,
    PausedAt,
    ResumedAt,
    PauseReason,
    CreatedAt,
    UpdatedAt,
}
