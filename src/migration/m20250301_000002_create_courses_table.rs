use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[derive(DeriveIden)]
enum Courses {
    Table,
    Id,
    Title,
    Description,
    Category,
    CreatedBy,
    ThumbnailPublicId,
    ThumbnailUrl,
    Lectures,
    NumberOfLectures,
    CreatedAt,
    UpdatedAt,
}

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Courses::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Courses::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Courses::Title).string_len(100).not_null())
                    .col(
                        ColumnDef::new(Courses::Description)
                            .string_len(500)
                            .not_null(),
                    )
                    .col(ColumnDef::new(Courses::Category).string_len(100).not_null())
                    .col(ColumnDef::new(Courses::CreatedBy).integer().not_null())
                    .col(
                        ColumnDef::new(Courses::ThumbnailPublicId)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Courses::ThumbnailUrl)
                            .string_len(500)
                            .null(),
                    )
                    .col(
                        ColumnDef::new(Courses::Lectures)
                            .json_binary()
                            .not_null()
                            .default(Expr::cust("'[]'::jsonb")),
                    )
                    .col(
                        ColumnDef::new(Courses::NumberOfLectures)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(Courses::CreatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Courses::UpdatedAt)
                            .timestamp()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Courses::Table).to_owned())
            .await
    }
}
