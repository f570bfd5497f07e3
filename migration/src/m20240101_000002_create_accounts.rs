use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Accounts::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Accounts::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Accounts::Msisdn).string().not_null())
                    .col(ColumnDef::new(Accounts::BatchId).string().not_null())
                    .col(ColumnDef::new(Accounts::Email).string().not_null())
                    .col(ColumnDef::new(Accounts::Pin).string())
                    .col(ColumnDef::new(Accounts::Status).string().not_null().default("new"))
                    .col(ColumnDef::new(Accounts::IsReseller).boolean().not_null().default(false))
                    .col(ColumnDef::new(Accounts::BalanceLast).big_integer())
                    .col(ColumnDef::new(Accounts::UsedCount).integer().not_null().default(0))
                    .col(ColumnDef::new(Accounts::LastUsedAt).timestamp())
                    .col(ColumnDef::new(Accounts::LastDeviceId).string())
                    .col(ColumnDef::new(Accounts::Notes).string())
                    .col(ColumnDef::new(Accounts::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(Accounts::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("uq_accounts_msisdn_batch")
                    .table(Accounts::Table)
                    .col(Accounts::Msisdn)
                    .col(Accounts::BatchId)
                    .unique()
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_accounts_status")
                    .table(Accounts::Table)
                    .col(Accounts::Status)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Accounts::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Accounts {
    Table,
    Id,
    Msisdn,
    BatchId,
    Email,
    Pin,
    Status,
    IsReseller,
    BalanceLast,
    UsedCount,
    LastUsedAt,
    LastDeviceId,
    Notes,
    CreatedAt,
    UpdatedAt,
}
