use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ClaimTokens::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ClaimTokens::Id)
                            .uuid()
                            .not_null()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ClaimTokens::Email).string().not_null())
                    .col(ColumnDef::new(ClaimTokens::PersonId).uuid())
                    .col(ColumnDef::new(ClaimTokens::Purpose).string().not_null())
                    .col(
                        ColumnDef::new(ClaimTokens::Token)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(
                        ColumnDef::new(ClaimTokens::ExpiresAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ClaimTokens::UsedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ClaimTokens::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .from(ClaimTokens::Table, ClaimTokens::PersonId)
                            .to(People::Table, People::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .table(ClaimTokens::Table)
                    .col(ClaimTokens::Email)
                    .name("idx_claim_tokens_email")
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ClaimTokens::Table).to_owned())
            .await
    }
}

#[derive(Iden)]
enum ClaimTokens {
    Table,
    Id,
    Email,
    PersonId,
    Purpose,
    Token,
    ExpiresAt,
    UsedAt,
    CreatedAt,
}

#[derive(Iden)]
enum People {
    Table,
    Id,
}
