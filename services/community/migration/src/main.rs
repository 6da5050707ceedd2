use sea_orm_migration::prelude::*;

use commons_community_migration::Migrator;

#[tokio::main]
async fn main() {
    cli::run_cli(Migrator).await;
}
