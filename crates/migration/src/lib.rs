//! Migrator registering entity-specific migrations in dependency order.
//! Unique indexes are applied last; their names are load-bearing, the models
//! layer classifies duplicate-key errors by them.
pub use sea_orm_migration::prelude::*;

mod m20230101_000001_create_admin;
mod m20230101_000002_create_user;
mod m20230101_000003_create_service;
mod m20230101_000004_create_service_endpoint;
mod m20230101_000005_create_usage;
mod m20230101_000009_add_indexes;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20230101_000001_create_admin::Migration),
            Box::new(m20230101_000002_create_user::Migration),
            Box::new(m20230101_000003_create_service::Migration),
            Box::new(m20230101_000004_create_service_endpoint::Migration),
            Box::new(m20230101_000005_create_usage::Migration),
            // Indexes should always be applied last
            Box::new(m20230101_000009_add_indexes::Migration),
        ]
    }
}
