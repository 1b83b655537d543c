use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        // Identity uniqueness
        manager
            .create_index(
                Index::create()
                    .name("uniq_user_username")
                    .table(User::Table)
                    .col(User::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uniq_user_email")
                    .table(User::Table)
                    .col(User::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uniq_admin_username")
                    .table(Admin::Table)
                    .col(Admin::Username)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uniq_admin_email")
                    .table(Admin::Table)
                    .col(Admin::Email)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Service: unique base address and unique (type, version)
        manager
            .create_index(
                Index::create()
                    .name("uniq_service_base_address")
                    .table(Service::Table)
                    .col(Service::BaseAddress)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uniq_service_type_version")
                    .table(Service::Table)
                    .col(Service::Type)
                    .col(Service::Version)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Endpoint: unique (service_id, endpoint_path, method) and (service_id, task)
        manager
            .create_index(
                Index::create()
                    .name("uniq_endpoint_route")
                    .table(ServiceEndpoint::Table)
                    .col(ServiceEndpoint::ServiceId)
                    .col(ServiceEndpoint::EndpointPath)
                    .col(ServiceEndpoint::Method)
                    .unique()
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("uniq_endpoint_task")
                    .table(ServiceEndpoint::Table)
                    .col(ServiceEndpoint::ServiceId)
                    .col(ServiceEndpoint::Task)
                    .unique()
                    .to_owned(),
            )
            .await?;

        // Usage: lookup indexes for ledger filtering
        manager
            .create_index(
                Index::create()
                    .name("idx_usage_user")
                    .table(Usage::Table)
                    .col(Usage::UserId)
                    .to_owned(),
            )
            .await?;
        manager
            .create_index(
                Index::create()
                    .name("idx_usage_date_time")
                    .table(Usage::Table)
                    .col(Usage::DateTime)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_index(Index::drop().name("uniq_user_username").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_user_email").table(User::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_admin_username").table(Admin::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("uniq_admin_email").table(Admin::Table).to_owned())
            .await?;
        manager
            .drop_index(
                Index::drop().name("uniq_service_base_address").table(Service::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop().name("uniq_service_type_version").table(Service::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop().name("uniq_endpoint_route").table(ServiceEndpoint::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(
                Index::drop().name("uniq_endpoint_task").table(ServiceEndpoint::Table).to_owned(),
            )
            .await?;
        manager
            .drop_index(Index::drop().name("idx_usage_user").table(Usage::Table).to_owned())
            .await?;
        manager
            .drop_index(Index::drop().name("idx_usage_date_time").table(Usage::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Username,
    Email,
}

#[derive(DeriveIden)]
enum Admin {
    Table,
    Username,
    Email,
}

#[derive(DeriveIden)]
enum Service {
    Table,
    BaseAddress,
    Type,
    Version,
}

#[derive(DeriveIden)]
enum ServiceEndpoint {
    Table,
    ServiceId,
    EndpointPath,
    Method,
    Task,
}

#[derive(DeriveIden)]
enum Usage {
    Table,
    UserId,
    DateTime,
}
