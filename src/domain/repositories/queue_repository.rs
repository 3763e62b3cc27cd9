// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task_repository::RepositoryError;
use crate::domain::models::queue_item::{QueueItem, QueueStats};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use uuid::Uuid;

/// 采集队列仓库特质
///
/// 按任务划分、按URL去重的持久化队列。队列本身是唯一的去重依据，
/// 进程重启后可以从中断处继续。
#[async_trait]
pub trait QueueRepository: Send + Sync {
    /// 入队
    ///
    /// 同一 (task_id, url) 已存在 pending/processing 行时返回 `false` 且不产生副作用
    async fn enqueue(
        &self,
        task_id: i32,
        url: &str,
        listing_rank: Option<i32>,
    ) -> Result<bool, RepositoryError>;

    /// 认领该任务最早的 pending 条目并置为 processing
    ///
    /// 多个认领者并发调用时每行只会被一个认领者拿到
    async fn dequeue_next(&self, task_id: i32, claimant: Uuid) -> Result<Option<QueueItem>, RepositoryError>;

    /// processing → completed
    async fn complete(&self, item_id: i32) -> Result<(), RepositoryError>;

    /// processing → failed，记录错误信息和诊断快照引用
    async fn fail(
        &self,
        item_id: i32,
        error: &str,
        diagnostic_ref: Option<&str>,
    ) -> Result<(), RepositoryError>;

    /// 把认领时间早于 `cutoff` 的 processing 条目放回 pending
    async fn requeue_stale(&self, cutoff: DateTime<FixedOffset>) -> Result<u64, RepositoryError>;

    /// 根据ID查找条目
    async fn find_by_id(&self, item_id: i32) -> Result<Option<QueueItem>, RepositoryError>;

    /// 各状态条目数量
    async fn stats(&self, task_id: i32) -> Result<QueueStats, RepositoryError>;
}
