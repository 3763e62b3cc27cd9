// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::task::{NewTask, Task};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::DbErr;
use thiserror::Error;

/// 仓库错误类型
#[derive(Error, Debug)]
pub enum RepositoryError {
    /// 数据库错误
    #[error("Database error: {0}")]
    Database(#[from] DbErr),
    /// 记录未找到
    #[error("Record not found")]
    NotFound,
    /// 状态冲突，例如重复的URL或非法的状态迁移
    #[error("Conflict: {0}")]
    Conflict(String),
    /// 无效参数
    #[error("Invalid parameter: {0}")]
    InvalidParameter(String),
}

/// 任务仓库特质
///
/// 定义抓取任务配置的数据访问接口
#[async_trait]
pub trait TaskRepository: Send + Sync {
    /// 创建新任务，目标URL重复时返回 `Conflict`
    async fn create(&self, task: &NewTask) -> Result<Task, RepositoryError>;
    /// 根据ID查找任务
    async fn find_by_id(&self, id: i32) -> Result<Option<Task>, RepositoryError>;
    /// 根据目标URL查找任务
    async fn find_by_url(&self, url: &str) -> Result<Option<Task>, RepositoryError>;
    /// 列出全部任务，按ID排序
    async fn list(&self) -> Result<Vec<Task>, RepositoryError>;
    /// 任务总数
    async fn count(&self) -> Result<u64, RepositoryError>;
    /// 启用或停用任务
    async fn set_active(&self, id: i32, active: bool) -> Result<(), RepositoryError>;
    /// 修改班次窗口
    async fn update_window(
        &self,
        id: i32,
        start_time: Option<String>,
        end_time: Option<String>,
    ) -> Result<(), RepositoryError>;
    /// 记录一次运行的开始时间和下一次允许运行的时间
    async fn mark_run_started(
        &self,
        id: i32,
        started_at: DateTime<FixedOffset>,
        next_run_at: Option<DateTime<FixedOffset>>,
    ) -> Result<(), RepositoryError>;
}
