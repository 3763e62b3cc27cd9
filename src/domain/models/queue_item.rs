// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// 采集队列条目
///
/// 链接采集器发现的一个商品URL，等待详情抓取器认领。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct QueueItem {
    pub id: i32,
    pub task_id: i32,
    pub url: String,
    pub status: QueueStatus,
    /// 在列表中的位置（跨页累计，从1开始）
    pub listing_rank: Option<i32>,
    pub discovered_at: DateTime<FixedOffset>,
    /// 被认领的时间，用于回收卡死条目
    pub claimed_at: Option<DateTime<FixedOffset>>,
    pub processed_at: Option<DateTime<FixedOffset>>,
    /// 认领者写入的令牌
    pub lock_token: Option<Uuid>,
    pub error_msg: Option<String>,
    /// 失败时的诊断快照引用
    pub diagnostic_ref: Option<String>,
}

/// 队列条目状态
///
/// pending → processing → completed/failed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum QueueStatus {
    #[default]
    Pending,
    Processing,
    Completed,
    Failed,
}

impl QueueStatus {
    /// 是否为终止状态
    pub fn is_terminal(&self) -> bool {
        matches!(self, QueueStatus::Completed | QueueStatus::Failed)
    }
}

impl fmt::Display for QueueStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            QueueStatus::Pending => write!(f, "pending"),
            QueueStatus::Processing => write!(f, "processing"),
            QueueStatus::Completed => write!(f, "completed"),
            QueueStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for QueueStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(QueueStatus::Pending),
            "processing" => Ok(QueueStatus::Processing),
            "completed" => Ok(QueueStatus::Completed),
            "failed" => Ok(QueueStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 单个任务的队列统计
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct QueueStats {
    pub pending: u64,
    pub processing: u64,
    pub completed: u64,
    pub failed: u64,
}

impl QueueStats {
    pub fn total(&self) -> u64 {
        self.pending + self.processing + self.completed + self.failed
    }
}
