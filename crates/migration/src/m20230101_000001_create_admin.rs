use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Admin::Table)
                    .if_not_exists()
                    .col(uuid(Admin::Id).primary_key())
                    .col(string_len(Admin::Username, 64).not_null())
                    .col(string_len(Admin::Name, 128).not_null())
                    .col(string_len(Admin::Email, 256).not_null())
                    .col(string(Admin::PasswordHash).not_null())
                    .col(string_len(Admin::Department, 128).not_null())
                    .col(timestamp_with_time_zone(Admin::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(Admin::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum Admin {
    Table,
    Id,
    Username,
    Name,
    Email,
    PasswordHash,
    Department,
    CreatedAt,
}
