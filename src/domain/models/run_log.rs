// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, FixedOffset};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// 错误详情保留的最大字符数
pub const MAX_ERROR_DETAILS_CHARS: usize = 4000;

/// 运行日志
///
/// 每次调度触发的运行对应一行，运行过程中增量更新计数，便于实时观察。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RunLog {
    pub id: i32,
    pub task_id: i32,
    pub platform: String,
    pub keyword: Option<String>,
    pub target_url: Option<String>,
    pub started_at: DateTime<FixedOffset>,
    pub finished_at: Option<DateTime<FixedOffset>>,
    pub status: RunStatus,
    pub pages_scraped: i32,
    pub products_found: i32,
    pub products_added: i32,
    pub products_updated: i32,
    pub errors: i32,
    pub error_details: Option<String>,
    /// 最近一次诊断快照引用
    pub screenshot_path: Option<String>,
}

/// 新运行日志参数
#[derive(Debug, Clone)]
pub struct NewRunLog {
    pub task_id: i32,
    pub platform: String,
    pub keyword: Option<String>,
    pub target_url: Option<String>,
}

/// 运行状态
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "snake_case")]
pub enum RunStatus {
    #[default]
    Running,
    Completed,
    Failed,
}

impl fmt::Display for RunStatus {
    fn fmt(&self, f: &mut fmt::Formatter) -> fmt::Result {
        match self {
            RunStatus::Running => write!(f, "running"),
            RunStatus::Completed => write!(f, "completed"),
            RunStatus::Failed => write!(f, "failed"),
        }
    }
}

impl FromStr for RunStatus {
    type Err = ();

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "running" => Ok(RunStatus::Running),
            "completed" => Ok(RunStatus::Completed),
            "failed" => Ok(RunStatus::Failed),
            _ => Err(()),
        }
    }
}

/// 向错误详情追加一行 `[HH:MM:SS] message`
///
/// 超过上限时只保留末尾部分，并以 `...` 开头。
pub fn append_error_detail(existing: Option<&str>, at: DateTime<FixedOffset>, message: &str) -> String {
    let mut details = existing.unwrap_or_default().to_string();
    details.push_str(&format!("[{}] {}\n", at.format("%H:%M:%S"), message));

    let char_count = details.chars().count();
    if char_count <= MAX_ERROR_DETAILS_CHARS {
        return details;
    }

    let tail: String = details
        .chars()
        .skip(char_count - MAX_ERROR_DETAILS_CHARS)
        .collect();
    format!("...{}", tail)
}
