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
                    .table(ScrapingQueue::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(ScrapingQueue::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(ScrapingQueue::TaskId).integer().not_null())
                    .col(ColumnDef::new(ScrapingQueue::Url).string().not_null())
                    .col(
                        ColumnDef::new(ScrapingQueue::Status)
                            .string_len(20)
                            .not_null()
                            .default("pending"),
                    )
                    .col(ColumnDef::new(ScrapingQueue::ListingRank).integer())
                    .col(
                        ColumnDef::new(ScrapingQueue::DiscoveredAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(ColumnDef::new(ScrapingQueue::ClaimedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapingQueue::ProcessedAt).timestamp_with_time_zone())
                    .col(ColumnDef::new(ScrapingQueue::LockToken).uuid())
                    .col(ColumnDef::new(ScrapingQueue::ErrorMsg).text())
                    .col(ColumnDef::new(ScrapingQueue::DiagnosticRef).string())
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_scraping_queue_task")
                            .from(ScrapingQueue::Table, ScrapingQueue::TaskId)
                            .to(ScrapingTasks::Table, ScrapingTasks::Id)
                            .on_delete(ForeignKeyAction::Cascade),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scraping_queue_task_status")
                    .table(ScrapingQueue::Table)
                    .col(ScrapingQueue::TaskId)
                    .col(ScrapingQueue::Status)
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_scraping_queue_task_url")
                    .table(ScrapingQueue::Table)
                    .col(ScrapingQueue::TaskId)
                    .col(ScrapingQueue::Url)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(ScrapingQueue::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum ScrapingQueue {
    Table,
    Id,
    TaskId,
    Url,
    Status,
    ListingRank,
    DiscoveredAt,
    ClaimedAt,
    ProcessedAt,
    LockToken,
    ErrorMsg,
    DiagnosticRef,
}
