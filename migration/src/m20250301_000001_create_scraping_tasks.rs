// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(ScrapingTasks::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapingTasks::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapingTasks::TaskName).string().not_null())
                    .col(
                        ColumnDef::new(ScrapingTasks::TargetPlatform)
                            .string()
                            .not_null()
                            .default("trendyol"),
                    )
                    .col(
                        ColumnDef::new(ScrapingTasks::TargetUrl)
                            .string()
                            .not_null()
                            .unique_key(),
                    )
                    .col(ColumnDef::new(ScrapingTasks::SearchParams).json().not_null())
                    .col(
                        ColumnDef::new(ScrapingTasks::ScrapeIntervalHours)
                            .integer()
                            .not_null()
                            .default(24),
                    )
                    .col(
                        ColumnDef::new(ScrapingTasks::IsActive)
                            .boolean()
                            .not_null()
                            .default(true),
                    )
                    .col(ColumnDef::new(ScrapingTasks::StartTime).string_len(5))
                    .col(ColumnDef::new(ScrapingTasks::EndTime).string_len(5))
                    .col(ColumnDef::new(ScrapingTasks::LastRunAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapingTasks::NextRunAt).timestamp_with_time_zone())
                    .col(
                        ColumnDef::new(ScrapingTasks::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapingTasks::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum ScrapingTasks {
    Table,
    Id,
    TaskName,
    TargetPlatform,
    TargetUrl,
    SearchParams,
    ScrapeIntervalHours,
    IsActive,
    StartTime,
    EndTime,
    LastRunAt,
    NextRunAt,
    CreatedAt,
}
