use sea_orm_migration::prelude::*;

use crate::m20240101_000001_create_servers::Servers;
use crate::m20240101_000002_create_accounts::Accounts;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Bindings::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Bindings::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Bindings::ServerId).integer().not_null())
                    .col(ColumnDef::new(Bindings::AccountId).integer().not_null())
                    .col(ColumnDef::new(Bindings::BatchId).string().not_null())
                    .col(ColumnDef::new(Bindings::Step).string().not_null().default("bound"))
                    .col(ColumnDef::new(Bindings::IsReseller).boolean().not_null().default(false))
                    .col(ColumnDef::new(Bindings::BalanceStart).big_integer())
                    .col(ColumnDef::new(Bindings::BalanceLast).big_integer())
                    .col(ColumnDef::new(Bindings::TokenLogin).text())
                    .col(ColumnDef::new(Bindings::TokenLocation).text())
                    .col(ColumnDef::new(Bindings::TokenLocationRefreshedAt).timestamp())
                    .col(ColumnDef::new(Bindings::DeviceId).string())
                    .col(ColumnDef::new(Bindings::LastErrorCode).string())
                    .col(ColumnDef::new(Bindings::LastErrorMessage).text())
                    .col(ColumnDef::new(Bindings::BoundAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(Bindings::UnboundAt).timestamp())
                    .col(ColumnDef::new(Bindings::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(Bindings::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bindings_server_id")
                            .from(Bindings::Table, Bindings::ServerId)
                            .to(Servers::Table, Servers::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_bindings_account_id")
                            .from(Bindings::Table, Bindings::AccountId)
                            .to(Accounts::Table, Accounts::Id)
                            .on_delete(ForeignKeyAction::Restrict),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_bindings_batch_id")
                    .table(Bindings::Table)
                    .col(Bindings::BatchId)
                    .to_owned(),
            )
            .await?;

        // Partial uniqueness: at most one non-logged-out binding per server/account.
        // Expressed as raw SQL since sea-query's portable builder has no WHERE-clause
        // index support; both Postgres and SQLite accept this syntax verbatim.
        let db = manager.get_connection();
        db.execute_unprepared(
            "CREATE UNIQUE INDEX uq_bindings_active_server ON bindings (server_id) WHERE unbound_at IS NULL",
        )
        .await?;
        db.execute_unprepared(
            "CREATE UNIQUE INDEX uq_bindings_active_account ON bindings (account_id) WHERE unbound_at IS NULL",
        )
        .await?;

        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Bindings::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Bindings {
    Table,
    Id,
    ServerId,
    AccountId,
    BatchId,
    Step,
    IsReseller,
    BalanceStart,
    BalanceLast,
    TokenLogin,
    TokenLocation,
    TokenLocationRefreshedAt,
    DeviceId,
    LastErrorCode,
    LastErrorMessage,
    BoundAt,
    UnboundAt,
    CreatedAt,
    UpdatedAt,
}
