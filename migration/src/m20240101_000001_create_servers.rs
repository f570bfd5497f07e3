use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Servers::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Servers::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Servers::Port).integer().not_null().unique_key())
                    .col(ColumnDef::new(Servers::BaseUrl).string().not_null().unique_key())
                    .col(ColumnDef::new(Servers::Timeout).integer().not_null().default(10))
                    .col(ColumnDef::new(Servers::Retries).integer().not_null().default(3))
                    .col(ColumnDef::new(Servers::WaitBetweenRetries).integer().not_null().default(1))
                    .col(ColumnDef::new(Servers::MaxRequestsQueued).integer().not_null().default(5))
                    .col(ColumnDef::new(Servers::IsActive).boolean().not_null().default(true))
                    .col(ColumnDef::new(Servers::DeviceId).string())
                    .col(ColumnDef::new(Servers::CreatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .col(ColumnDef::new(Servers::UpdatedAt).timestamp().not_null().extra("DEFAULT CURRENT_TIMESTAMP".to_string()))
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_servers_is_active")
                    .table(Servers::Table)
                    .col(Servers::IsActive)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Servers::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Servers {
    Table,
    Id,
    Port,
    BaseUrl,
    Timeout,
    Retries,
    WaitBetweenRetries,
    MaxRequestsQueued,
    IsActive,
    DeviceId,
    CreatedAt,
    UpdatedAt,
}
