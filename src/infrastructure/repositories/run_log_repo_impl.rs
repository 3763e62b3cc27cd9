// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::run_log::{append_error_detail, NewRunLog, RunLog, RunStatus};
use crate::domain::repositories::run_log_repository::RunLogRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::database::entities::scraping_log as log_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Local, Utc};
use sea_orm::{
    sea_query::{Expr, SimpleExpr},
    ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait, QueryFilter,
    QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;

/// 运行日志仓库实现
#[derive(Clone)]
pub struct RunLogRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl RunLogRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn apply<C: ConnectionTrait>(
        conn: &C,
        id: i32,
        updates: Vec<(log_entity::Column, SimpleExpr)>,
    ) -> Result<(), RepositoryError> {
        let mut query = log_entity::Entity::update_many();
        for (column, expr) in updates {
            query = query.col_expr(column, expr);
        }
        let result = query
            .filter(log_entity::Column::Id.eq(id))
            .exec(conn)
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}

fn plus(column: log_entity::Column, amount: i32) -> (log_entity::Column, SimpleExpr) {
    (column, Expr::col(column).add(amount))
}

impl From<log_entity::Model> for RunLog {
    fn from(model: log_entity::Model) -> Self {
        Self {
            id: model.id,
            task_id: model.task_id,
            platform: model.platform,
            keyword: model.keyword,
            target_url: model.target_url,
            started_at: model.started_at,
            finished_at: model.finished_at,
            status: model.status.parse().unwrap_or_default(),
            pages_scraped: model.pages_scraped,
            products_found: model.products_found,
            products_added: model.products_added,
            products_updated: model.products_updated,
            errors: model.errors,
            error_details: model.error_details,
            screenshot_path: model.screenshot_path,
        }
    }
}

#[async_trait]
impl RunLogRepository for RunLogRepositoryImpl {
    async fn open(&self, log: &NewRunLog) -> Result<RunLog, RepositoryError> {
        let model = log_entity::ActiveModel {
            task_id: Set(log.task_id),
            platform: Set(log.platform.clone()),
            keyword: Set(log.keyword.clone()),
            target_url: Set(log.target_url.clone()),
            started_at: Set(Utc::now().into()),
            status: Set(RunStatus::Running.to_string()),
            pages_scraped: Set(0),
            products_found: Set(0),
            products_added: Set(0),
            products_updated: Set(0),
            errors: Set(0),
            ..Default::default()
        };
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<RunLog>, RepositoryError> {
        let model = log_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn latest_for_task(&self, task_id: i32) -> Result<Option<RunLog>, RepositoryError> {
        let model = log_entity::Entity::find()
            .filter(log_entity::Column::TaskId.eq(task_id))
            .order_by_desc(log_entity::Column::Id)
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn record_page(&self, id: i32, links_found: i32) -> Result<(), RepositoryError> {
        Self::apply(
            self.db.as_ref(),
            id,
            vec![
                plus(log_entity::Column::PagesScraped, 1),
                plus(log_entity::Column::ProductsFound, links_found),
            ],
        )
        .await
    }

    async fn record_product(&self, id: i32, created: bool) -> Result<(), RepositoryError> {
        let column = if created {
            log_entity::Column::ProductsAdded
        } else {
            log_entity::Column::ProductsUpdated
        };
        Self::apply(self.db.as_ref(), id, vec![plus(column, 1)]).await
    }

    async fn record_error(
        &self,
        id: i32,
        message: &str,
        diagnostic_ref: Option<&str>,
    ) -> Result<(), RepositoryError> {
        let txn = self.db.begin().await?;

        let current = log_entity::Entity::find_by_id(id)
            .one(&txn)
            .await?
            .ok_or(RepositoryError::NotFound)?;

        let now: DateTime<FixedOffset> = Local::now().fixed_offset();
        let details = append_error_detail(current.error_details.as_deref(), now, message);

        let mut updates = vec![
            plus(log_entity::Column::Errors, 1),
            (log_entity::Column::ErrorDetails, Expr::value(Some(details))),
        ];
        if let Some(reference) = diagnostic_ref {
            updates.push((
                log_entity::Column::ScreenshotPath,
                Expr::value(Some(reference.to_string())),
            ));
        }
        Self::apply(&txn, id, updates).await?;

        txn.commit().await?;
        Ok(())
    }

    async fn close(&self, id: i32, status: RunStatus) -> Result<(), RepositoryError> {
        let finished_at: DateTime<FixedOffset> = Utc::now().into();
        Self::apply(
            self.db.as_ref(),
            id,
            vec![
                (log_entity::Column::Status, Expr::value(status.to_string())),
                (log_entity::Column::FinishedAt, Expr::value(Some(finished_at))),
            ],
        )
        .await
    }
}
