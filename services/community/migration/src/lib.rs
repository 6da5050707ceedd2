use sea_orm_migration::prelude::*;

mod m20250601_000001_create_people;
mod m20250601_000002_create_users;
mod m20250601_000003_create_events;
mod m20250601_000004_create_invites;
mod m20250601_000005_create_claim_tokens;

pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250601_000001_create_people::Migration),
            Box::new(m20250601_000002_create_users::Migration),
            Box::new(m20250601_000003_create_events::Migration),
            Box::new(m20250601_000004_create_invites::Migration),
            Box::new(m20250601_000005_create_claim_tokens::Migration),
        ]
    }
}
