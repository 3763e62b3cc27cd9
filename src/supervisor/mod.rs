// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 进程监管模块
///
/// 每个任务对应一个独立的采集进程，通过运行目录中的PID标记文件跟踪其存活状态
pub mod bot_supervisor;
pub mod process_handle;

use crate::domain::repositories::task_repository::RepositoryError;
use async_trait::async_trait;
use thiserror::Error;

pub use bot_supervisor::BotSupervisor;

/// 监管错误类型
#[derive(Error, Debug)]
pub enum SupervisorError {
    /// 标记文件或日志文件IO错误
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    /// 启动进程失败
    #[error("Failed to spawn bot: {0}")]
    Spawn(String),
    /// 任务不存在
    #[error("Task {0} not found")]
    TaskNotFound(i32),
    /// 仓库错误
    #[error("Repository error: {0}")]
    Repository(#[from] RepositoryError),
}

/// 采集进程状态
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BotStatus {
    Running(u32),
    Stopped,
}

impl BotStatus {
    pub fn is_running(&self) -> bool {
        matches!(self, BotStatus::Running(_))
    }
}

/// 启动结果
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum StartOutcome {
    Started(u32),
    AlreadyRunning(u32),
}

impl StartOutcome {
    pub fn pid(&self) -> u32 {
        match self {
            StartOutcome::Started(pid) | StartOutcome::AlreadyRunning(pid) => *pid,
        }
    }
}

/// 采集进程控制接口
///
/// 调度器只通过该接口操作进程，测试中可替换为内存实现
#[async_trait]
pub trait BotControl: Send + Sync {
    /// 查询进程状态，发现失效的标记文件时顺带清理
    async fn status(&self, task_id: i32) -> Result<BotStatus, SupervisorError>;

    /// 启动进程
    ///
    /// # 参数
    ///
    /// * `task_id` - 任务ID
    /// * `target_url` - 采集目标URL
    /// * `force` - 是否写入强制运行标记（允许在班次外运行）
    async fn start(&self, task_id: i32, target_url: &str, force: bool) -> Result<StartOutcome, SupervisorError>;

    /// 停止进程及其子进程，返回是否有进程被停止
    async fn stop(&self, task_id: i32) -> Result<bool, SupervisorError>;

    /// 是否存在强制运行标记
    async fn is_forced(&self, task_id: i32) -> Result<bool, SupervisorError>;
}
