use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Deliberately no foreign keys: usage records outlive the service and
        // identity they reference, only an explicit purge removes them.
        manager
            .create_table(
                Table::create()
                    .table(Usage::Table)
                    .if_not_exists()
                    .col(uuid(Usage::Id).primary_key())
                    .col(uuid(Usage::UserId).not_null())
                    .col(timestamp_with_time_zone(Usage::DateTime).not_null())
                    .col(string_len(Usage::ServiceType, 32).not_null())
                    .col(string_len(Usage::ServiceVersion, 16).not_null())
                    .col(uuid(Usage::ServiceId).not_null())
                    .col(uuid(Usage::EndpointId).not_null())
                    .col(text(Usage::Output).not_null())
                    .col(double(Usage::ExecutionTime).not_null())
                    .col(json_null(Usage::Options))
                    .col(boolean(Usage::IsAdminQuery).not_null().default(false))
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Usage::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Usage {
    Table,
    Id,
    UserId,
    DateTime,
    ServiceType,
    ServiceVersion,
    ServiceId,
    EndpointId,
    Output,
    ExecutionTime,
    Options,
    IsAdminQuery,
}
