use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(People::Table)
                    .if_not_exists()
                    .col(ColumnDef::new(People::Id).uuid().not_null().primary_key())
                    .col(ColumnDef::new(People::ApiId).string().not_null().unique_key())
                    .col(ColumnDef::new(People::Email).string().not_null().unique_key())
                    .col(ColumnDef::new(People::UserName).string())
                    .col(ColumnDef::new(People::FullName).string())
                    .col(ColumnDef::new(People::OrganizationName).string())
                    .col(ColumnDef::new(People::JobTitle).string())
                    .col(ColumnDef::new(People::AvatarUrl).string())
                    .col(
                        ColumnDef::new(People::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(
                        ColumnDef::new(People::UpdatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(People::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum People {
    Table,
    Id,
    ApiId,
    Email,
    UserName,
    FullName,
    OrganizationName,
    JobTitle,
    AvatarUrl,
    CreatedAt,
    UpdatedAt,
}
