pub use sea_orm_migration::prelude::*;

mod m20241001_000001_create_roster;
mod m20241006_000002_create_ledger;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20241001_000001_create_roster::Migration),
            Box::new(m20241006_000002_create_ledger::Migration),
        ]
    }
}
