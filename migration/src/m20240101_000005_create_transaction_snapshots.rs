use sea_orm_migration::prelude::*;

use crate::m20240101_000004_create_transactions::Transactions;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(TransactionSnapshots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(TransactionSnapshots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(
                        ColumnDef::new(TransactionSnapshots::TransactionId)
                            .integer()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(TransactionSnapshots::BalanceStart).big_integer())
                    .col(ColumnDef::new(TransactionSnapshots::BalanceEnd).big_integer())
                    .col(ColumnDef::new(TransactionSnapshots::TrxIdvRaw).json())
                    .col(ColumnDef::new(TransactionSnapshots::StatusIdvRaw).json())
                    .col(ColumnDef::new(TransactionSnapshots::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(TransactionSnapshots::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_transaction_snapshots_transaction_id")
                            .from(TransactionSnapshots::Table, TransactionSnapshots::TransactionId)
                            .to(Transactions::Table, Transactions::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(TransactionSnapshots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum TransactionSnapshots {
    Table,
    Id,
    TransactionId,
    BalanceStart,
    BalanceEnd,
    TrxIdvRaw,
    StatusIdvRaw,
    CreatedAt,
    UpdatedAt,
}
