// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 同一任务下同一URL最多只有一条未结束（pending/processing）的队列条目
///
/// 部分唯一索引在 SQLite 和 PostgreSQL 上语法一致
#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared(
                "CREATE UNIQUE INDEX IF NOT EXISTS uq_scraping_queue_open_url \
                 ON scraping_queue (task_id, url) \
                 WHERE status IN ('pending', 'processing')",
            )
            .await?;
        Ok(())
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .get_connection()
            .execute_unprepared("DROP INDEX IF EXISTS uq_scraping_queue_open_url")
            .await?;
        Ok(())
    }
}
