// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use super::m20250301_000001_create_scraping_tasks::ScrapingTasks;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapingLogs::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapingLogs::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapingLogs::TaskId).integer().not_null())
                    .col(ColumnDef::new(ScrapingLogs::Platform).string().not_null())
                    .col(ColumnDef::new(ScrapingLogs::Keyword).string())
                    .col(ColumnDef::new(ScrapingLogs::TargetUrl).string())
                    .col(
                        ColumnDef::new(ScrapingLogs::StartedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(ScrapingLogs::FinishedAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ScrapingLogs::Status)
                            .string_len(20)
                            .not_null()
                            .default("running"),
                    )
                    .col(
                        ColumnDef::new(ScrapingLogs::PagesScraped)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingLogs::ProductsFound)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingLogs::ProductsAdded)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingLogs::ProductsUpdated)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(ScrapingLogs::Errors)
                            .integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(ScrapingLogs::ErrorDetails).text())
                    .col(ColumnDef::new(ScrapingLogs::ScreenshotPath).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scraping_logs_task")
                            .from(ScrapingLogs::Table, ScrapingLogs::TaskId)
                            .to(ScrapingTasks::Table, ScrapingTasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scraping_logs_task")
                    .table(ScrapingLogs::Table)
                    .col(ScrapingLogs::TaskId)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapingLogs::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapingLogs {
    Table,
    Id,
    TaskId,
    Platform,
    Keyword,
    TargetUrl,
    StartedAt,
    FinishedAt,
    Status,
    PagesScraped,
    ProductsFound,
    ProductsAdded,
    ProductsUpdated,
    Errors,
    ErrorDetails,
    ScreenshotPath,
}
