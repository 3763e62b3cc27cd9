// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::storage_repository::StorageError;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::engines::traits::EngineError;
use thiserror::Error;

/// Worker错误类型
///
/// 采集器、详情抓取器和任务运行器共用
#[derive(Error, Debug)]
pub enum WorkerError {
    #[error("仓库错误: {0}")]
    RepositoryError(#[from] RepositoryError),

    #[error("引擎错误: {0}")]
    EngineError(#[from] EngineError),

    #[error("存储错误: {0}")]
    StorageError(#[from] StorageError),

    #[error("页面被拦截: {0}")]
    Blocked(String),

    #[error("解析错误: {0}")]
    ParseError(String),

    #[error("未找到: {0}")]
    NotFound(String),

    #[error("内部错误: {0}")]
    InternalError(String),
}

impl WorkerError {
    /// 是否为致命错误（存储不可用），致命错误会终止任务运行器
    pub fn is_fatal(&self) -> bool {
        matches!(self, WorkerError::RepositoryError(RepositoryError::Database(_)))
    }
}
