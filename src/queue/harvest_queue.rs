// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::queue_item::{QueueItem, QueueStats};
use crate::domain::repositories::queue_repository::QueueRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::infrastructure::metrics as names;
use chrono::{Duration, Utc};
use metrics::counter;
use std::sync::Arc;
use tracing::{debug, info, warn};
use uuid::Uuid;

/// 链接采集队列
///
/// 生产者（链接采集器）和消费者（详情工作器）之间的持久化队列，
/// 在仓库之上补充日志和指标
#[derive(Clone)]
pub struct HarvestQueue {
    repository: Arc<dyn QueueRepository>,
}

impl HarvestQueue {
    pub fn new(repository: Arc<dyn QueueRepository>) -> Self {
        Self { repository }
    }

    /// 入队商品链接
    ///
    /// # 参数
    ///
    /// * `task_id` - 所属任务
    /// * `url` - 商品URL
    /// * `listing_rank` - 在列表中的位置
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 新入队
    /// * `Ok(false)` - 已有未完成的同URL条目，未做任何改动
    pub async fn enqueue(
        &self,
        task_id: i32,
        url: &str,
        listing_rank: Option<i32>,
    ) -> Result<bool, RepositoryError> {
        let inserted = self.repository.enqueue(task_id, url, listing_rank).await?;
        if inserted {
            counter!(names::QUEUE_ENQUEUED).increment(1);
        } else {
            counter!(names::QUEUE_DUPLICATES).increment(1);
            debug!("Skipped duplicate queue url {} for task {}", url, task_id);
        }
        Ok(inserted)
    }

    /// 认领下一个待处理条目
    pub async fn claim(&self, task_id: i32, claimant: Uuid) -> Result<Option<QueueItem>, RepositoryError> {
        let item = self.repository.dequeue_next(task_id, claimant).await?;
        if let Some(item) = &item {
            counter!(names::QUEUE_CLAIMED).increment(1);
            debug!("Claimant {} took queue item {} ({})", claimant, item.id, item.url);
        }
        Ok(item)
    }

    pub async fn complete(&self, item_id: i32) -> Result<(), RepositoryError> {
        self.repository.complete(item_id).await?;
        counter!(names::QUEUE_COMPLETED).increment(1);
        Ok(())
    }

    pub async fn fail(
        &self,
        item_id: i32,
        error: &str,
        diagnostic_ref: Option<&str>,
    ) -> Result<(), RepositoryError> {
        self.repository.fail(item_id, error, diagnostic_ref).await?;
        counter!(names::QUEUE_FAILED).increment(1);
        warn!("Queue item {} failed: {}", item_id, error);
        Ok(())
    }

    /// 回收超时未完成的认领
    ///
    /// 认领时间早于 `now - timeout` 的 processing 条目重新变为 pending
    pub async fn reap_stale(&self, timeout: Duration) -> Result<u64, RepositoryError> {
        let cutoff = (Utc::now() - timeout).fixed_offset();
        let count = self.repository.requeue_stale(cutoff).await?;
        if count > 0 {
            counter!(names::QUEUE_REQUEUED).increment(count);
            info!("Requeued {} stale queue items", count);
        }
        Ok(count)
    }

    pub async fn stats(&self, task_id: i32) -> Result<QueueStats, RepositoryError> {
        self.repository.stats(task_id).await
    }
}
