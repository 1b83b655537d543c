use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ServiceEndpoint::Table)
                    .if_not_exists()
                    .col(uuid(ServiceEndpoint::Id).primary_key())
                    .col(uuid(ServiceEndpoint::ServiceId).not_null())
                    .col(string_len(ServiceEndpoint::Method, 16).not_null())
                    .col(string_len(ServiceEndpoint::EndpointPath, 256).not_null())
                    .col(string_len(ServiceEndpoint::Task, 128).not_null())
                    .col(boolean(ServiceEndpoint::TextBased).not_null().default(true))
                    .col(json_null(ServiceEndpoint::Options))
                    .col(json_null(ServiceEndpoint::SupportedFormats))
                    .col(timestamp_with_time_zone(ServiceEndpoint::CreatedAt).not_null())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_endpoint_service")
                            .from(ServiceEndpoint::Table, ServiceEndpoint::ServiceId)
                            .to(Service::Table, Service::Id)
                            .on_delete(ForeignKeyAction::Cascade)
                            .on_update(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ServiceEndpoint::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ServiceEndpoint {
    Table,
    Id,
    ServiceId,
    Method,
    EndpointPath,
    Task,
    TextBased,
    Options,
    SupportedFormats,
    CreatedAt,
}

#[derive(DeriveIden)]
enum Service {
    Table,
    Id,
}
