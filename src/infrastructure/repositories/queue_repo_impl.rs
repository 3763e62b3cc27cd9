// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::queue_item::{QueueItem, QueueStats, QueueStatus};
use crate::domain::repositories::queue_repository::QueueRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::scraping_queue as queue_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set, SqlErr,
};
use std::sync::Arc;
use uuid::Uuid;

/// 采集队列仓库实现
///
/// 认领采用“先选最早的 pending 行，再按 `id + status = pending` 条件更新”的方式，
/// 不依赖 `SELECT ... FOR UPDATE SKIP LOCKED`，SQLite 与 PostgreSQL 行为一致。
#[derive(Clone)]
pub struct QueueRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl QueueRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn finish(
        &self,
        item_id: i32,
        status: QueueStatus,
        error: Option<&str>,
        diagnostic_ref: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let now: DateTime<FixedOffset> = Utc::now().into();
        let result = queue_entity::Entity::update_many()
            .col_expr(queue_entity::Column::Status, Expr::value(status.to_string()))
            .col_expr(queue_entity::Column::ProcessedAt, Expr::value(Some(now)))
            .col_expr(
                queue_entity::Column::ErrorMsg,
                Expr::value(error.map(str::to_string)),
            )
            .col_expr(
                queue_entity::Column::DiagnosticRef,
                Expr::value(diagnostic_ref.map(str::to_string)),
            )
            .filter(queue_entity::Column::Id.eq(item_id))
            .filter(queue_entity::Column::Status.eq(QueueStatus::Processing.to_string()))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 1 {
            return Ok(());
        }

        match self.find_by_id(item_id).await? {
            None => Err(RepositoryError::NotFound),
            Some(item) => Err(RepositoryError::Conflict(format!(
                "queue item {} is {}, expected processing",
                item_id, item.status
            ))),
        }
    }
}

impl From<queue_entity::Model> for QueueItem {
    fn from(model: queue_entity::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            url: model.url,
            status: model.status.parse().unwrap_or_default(),
            listing_rank: model.listing_rank,
            discovered_at: model.discovered_at,
            claimed_at: model.claimed_at,
            processed_at: model.processed_at,
            lock_token: model.lock_token,
            error_msg: model.error_msg,
            diagnostic_ref: model.diagnostic_ref,
        }
    }
}

#[async_trait]
impl QueueRepository for QueueRepositoryImpl {
    async fn enqueue(
        &self,
        task_id: i32,
        url: &str,
        listing_rank: Option<i32>,
    ) -> Result<bool, RepositoryError> {
        let open = queue_entity::Entity::find()
            .filter(queue_entity::Column::TaskId.eq(task_id))
            .filter(queue_entity::Column::Url.eq(url))
            .filter(queue_entity::Column::Status.is_in([
                QueueStatus::Pending.to_string(),
                QueueStatus::Processing.to_string(),
            ]))
            .count(self.db.as_ref())
            .await?;

        if open > 0 {
            return Ok(false);
        }

        let inserted = queue_entity::ActiveModel {
            task_id: Set(task_id),
            url: Set(url.to_string()),
            status: Set(QueueStatus::Pending.to_string()),
            listing_rank: Set(listing_rank),
            discovered_at: Set(Utc::now().into()),
            ..Default::default()
        }
        .insert(self.db.as_ref())
        .await;

        match inserted {
            Ok(_) => Ok(true),
            // a concurrent producer inserted the same open URL first
            Err(e) if matches!(e.sql_err(), Some(SqlErr::UniqueConstraintViolation(_))) => Ok(false),
            Err(e) => Err(e.into()),
        }
    }

    async fn dequeue_next(&self, task_id: i32, claimant: Uuid) -> Result<Option<QueueItem>, RepositoryError> {
        loop {
            let candidate = queue_entity::Entity::find()
                .filter(queue_entity::Column::TaskId.eq(task_id))
                .filter(queue_entity::Column::Status.eq(QueueStatus::Pending.to_string()))
                .order_by_asc(queue_entity::Column::DiscoveredAt)
                .order_by_asc(queue_entity::Column::Id)
                .one(self.db.as_ref())
                .await?;

            let Some(candidate) = candidate else {
                return Ok(None);
            };

            let now: DateTime<FixedOffset> = Utc::now().into();
            let claimed = queue_entity::Entity::update_many()
                .col_expr(
                    queue_entity::Column::Status,
                    Expr::value(QueueStatus::Processing.to_string()),
                )
                .col_expr(queue_entity::Column::ClaimedAt, Expr::value(Some(now)))
                .col_expr(queue_entity::Column::LockToken, Expr::value(Some(claimant)))
                .filter(queue_entity::Column::Id.eq(candidate.id))
                .filter(queue_entity::Column::Status.eq(QueueStatus::Pending.to_string()))
                .exec(self.db.as_ref())
                .await?;

            if claimed.rows_affected == 1 {
                return self.find_by_id(candidate.id).await;
            }
            // another claimant took this row out of pending; retry until the select comes back empty
            tokio::task::yield_now().await;
        }
    }

    async fn complete(&self, item_id: i32) -> Result<(), RepositoryError> {
        self.finish(item_id, QueueStatus::Completed, None, None).await
    }

    async fn fail(
        &self,
        item_id: i32,
        error: &str,
        diagnostic_ref: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.finish(item_id, QueueStatus::Failed, Some(error), diagnostic_ref)
            .await
    }

    async fn requeue_stale(&self, cutoff: DateTime<FixedOffset>) -> Result<u64, RepositoryError> {
        let result = queue_entity::Entity::update_many()
            .col_expr(
                queue_entity::Column::Status,
                Expr::value(QueueStatus::Pending.to_string()),
            )
            .col_expr(queue_entity::Column::LockToken, Expr::value(Option::<Uuid>::None))
            .col_expr(
                queue_entity::Column::ClaimedAt,
                Expr::value(Option::<DateTime<FixedOffset>>::None),
            )
            .filter(queue_entity::Column::Status.eq(QueueStatus::Processing.to_string()))
            .filter(queue_entity::Column::ClaimedAt.lt(cutoff))
            .exec(self.db.as_ref())
            .await?;

        Ok(result.rows_affected)
    }

    async fn find_by_id(&self, item_id: i32) -> Result<Option<QueueItem>, RepositoryError> {
        let model = queue_entity::Entity::find_by_id(item_id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn stats(&self, task_id: i32) -> Result<QueueStats, RepositoryError> {
        let mut stats = QueueStats::default();
        for status in [
            QueueStatus::Pending,
            QueueStatus::Processing,
            QueueStatus::Completed,
            QueueStatus::Failed,
        ] {
            let count = queue_entity::Entity::find()
                .filter(queue_entity::Column::TaskId.eq(task_id))
                .filter(queue_entity::Column::Status.eq(status.to_string()))
                .count(self.db.as_ref())
                .await?;
            match status {
                QueueStatus::Pending => stats.pending = count,
                QueueStatus::Processing => stats.processing = count,
                QueueStatus::Completed => stats.completed = count,
                QueueStatus::Failed => stats.failed = count,
            }
        }
        Ok(stats)
    }
}
