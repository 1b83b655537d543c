use sea_orm_migration::{prelude::*, schema::*};

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(User::Table)
                    .if_not_exists()
                    .col(uuid(User::Id).primary_key())
                    .col(string_len(User::Username, 64).not_null())
                    .col(string_len(User::Name, 128).not_null())
                    .col(string_len(User::Email, 256).not_null())
                    .col(string(User::PasswordHash).not_null())
                    .col(string_len(User::Department, 128).not_null())
                    .col(timestamp_with_time_zone(User::SubscriptionExpiryDate).not_null())
                    .col(timestamp_with_time_zone(User::CreatedAt).not_null())
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager.drop_table(Table::drop().table(User::Table).to_owned()).await
    }
}

#[derive(DeriveIden)]
enum User {
    Table,
    Id,
    Username,
    Name,
    Email,
    PasswordHash,
    Department,
    SubscriptionExpiryDate,
    CreatedAt,
}
