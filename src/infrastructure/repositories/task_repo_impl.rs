// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::domain::models::task::{NewTask, ShiftWindow, Task, DEFAULT_END_TIME, DEFAULT_START_TIME};
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::infrastructure::database::entities::scraping_task as task_entity;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset, Utc};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, DatabaseConnection, EntityTrait,
    PaginatorTrait, QueryFilter, QueryOrder, Set,
};
use std::sync::Arc;

/// 任务仓库实现
///
/// 基于SeaORM实现的任务数据访问层
#[derive(Clone)]
pub struct TaskRepositoryImpl {
    /// 数据库连接
    db: Arc<DatabaseConnection>,
}

impl TaskRepositoryImpl {
    /// 创建新的任务仓库实例
    ///
    /// # 参数
    ///
    /// * `db` - 数据库连接
    ///
    /// # 返回值
    ///
    /// 返回新的任务仓库实例
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }

    async fn ensure_exists(&self, id: i32) -> Result<(), RepositoryError> {
        match task_entity::Entity::find_by_id(id).one(self.db.as_ref()).await? {
            Some(_) => Ok(()),
            None => Err(RepositoryError::NotFound),
        }
    }
}

impl From<task_entity::Model> for Task {
    fn from(model: task_entity::Model) -> Self {
        Self {
            id: model.id,
            name: model.task_name,
            platform: model.target_platform,
            target_url: model.target_url,
            search_params: model.search_params,
            scrape_interval_hours: model.scrape_interval_hours,
            is_active: model.is_active,
            start_time: model.start_time,
            end_time: model.end_time,
            last_run_at: model.last_run_at,
            next_run_at: model.next_run_at,
            created_at: model.created_at,
        }
    }
}

impl From<&NewTask> for task_entity::ActiveModel {
    fn from(task: &NewTask) -> Self {
        Self {
            task_name: Set(task.name.clone()),
            target_platform: Set(task.platform.clone()),
            target_url: Set(task.target_url.clone()),
            search_params: Set(task.search_params.clone()),
            scrape_interval_hours: Set(task.scrape_interval_hours),
            is_active: Set(task.is_active),
            start_time: Set(task.start_time.clone()),
            end_time: Set(task.end_time.clone()),
            last_run_at: Set(None),
            next_run_at: Set(None),
            created_at: Set(Utc::now().into()),
            ..Default::default()
        }
    }
}

#[async_trait]
impl TaskRepository for TaskRepositoryImpl {
    async fn create(&self, task: &NewTask) -> Result<Task, RepositoryError> {
        task.validate()
            .map_err(|e| RepositoryError::InvalidParameter(e.to_string()))?;

        if self.find_by_url(&task.target_url).await?.is_some() {
            return Err(RepositoryError::Conflict(format!(
                "task for {} already exists",
                task.target_url
            )));
        }

        let model: task_entity::ActiveModel = task.into();
        let inserted = model.insert(self.db.as_ref()).await?;
        Ok(inserted.into())
    }

    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, RepositoryError> {
        let model = task_entity::Entity::find_by_id(id)
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Task>, RepositoryError> {
        let model = task_entity::Entity::find()
            .filter(task_entity::Column::TargetUrl.eq(url))
            .one(self.db.as_ref())
            .await?;

        Ok(model.map(Into::into))
    }

    async fn list(&self) -> Result<Vec<Task>, RepositoryError> {
        let models = task_entity::Entity::find()
            .order_by_asc(task_entity::Column::Id)
            .all(self.db.as_ref())
            .await?;

        Ok(models.into_iter().map(Task::from).collect())
    }

    async fn count(&self) -> Result<u64, RepositoryError> {
        Ok(task_entity::Entity::find().count(self.db.as_ref()).await?)
    }

    async fn set_active(&self, id: i32, active: bool) -> Result<(), RepositoryError> {
        self.ensure_exists(id).await?;
        task_entity::Entity::update_many()
            .col_expr(task_entity::Column::IsActive, Expr::value(active))
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn update_window(
        &self,
        id: i32,
        start_time: Option<String>,
        end_time: Option<String>,
    ) -> Result<(), RepositoryError> {
        ShiftWindow::parse(
            start_time.as_deref().unwrap_or(DEFAULT_START_TIME),
            end_time.as_deref().unwrap_or(DEFAULT_END_TIME),
        )
        .map_err(|e| RepositoryError::InvalidParameter(e.to_string()))?;

        self.ensure_exists(id).await?;
        task_entity::Entity::update_many()
            .col_expr(task_entity::Column::StartTime, Expr::value(start_time))
            .col_expr(task_entity::Column::EndTime, Expr::value(end_time))
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;
        Ok(())
    }

    async fn mark_run_started(
        &self,
        id: i32,
        started_at: DateTime<FixedOffset>,
        next_run_at: Option<DateTime<FixedOffset>>,
    ) -> Result<(), RepositoryError> {
        let result = task_entity::Entity::update_many()
            .col_expr(task_entity::Column::LastRunAt, Expr::value(Some(started_at)))
            .col_expr(task_entity::Column::NextRunAt, Expr::value(next_run_at))
            .filter(task_entity::Column::Id.eq(id))
            .exec(self.db.as_ref())
            .await?;

        if result.rows_affected == 0 {
            return Err(RepositoryError::NotFound);
        }
        Ok(())
    }
}
