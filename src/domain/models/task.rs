// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use chrono::{DateTime, Duration, FixedOffset, NaiveTime, Timelike};
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 默认班次开始时间
pub const DEFAULT_START_TIME: &str = "09:00";
/// 默认班次结束时间
pub const DEFAULT_END_TIME: &str = "18:00";

/// 抓取任务实体
///
/// 一个任务对应一个目标平台上的列表/搜索URL，由调度器在班次窗口内
/// 启动独立的机器人进程执行。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Task {
    /// 任务唯一标识符
    pub id: i32,
    /// 任务名称
    pub name: String,
    /// 目标平台，例如 trendyol
    pub platform: String,
    /// 目标URL，全局唯一
    pub target_url: String,
    /// 自由格式的搜索参数，例如 `{"max_pages": 10}`
    pub search_params: serde_json::Value,
    /// 预期的重新采集间隔（小时），只用于记录 `next_run_at`，0 表示不记录
    pub scrape_interval_hours: i32,
    /// 是否启用，只有运营操作才会修改
    pub is_active: bool,
    /// 班次开始时间 (HH:MM)
    pub start_time: Option<String>,
    /// 班次结束时间 (HH:MM)
    pub end_time: Option<String>,
    /// 最近一次运行开始时间
    pub last_run_at: Option<DateTime<FixedOffset>>,
    /// 预计下一次运行的时间
    pub next_run_at: Option<DateTime<FixedOffset>>,
    /// 创建时间
    pub created_at: DateTime<FixedOffset>,
}

impl Task {
    /// 解析任务的班次窗口，未配置的一端使用给定默认值
    pub fn shift_window(&self, default_start: &str, default_end: &str) -> Result<ShiftWindow, WindowError> {
        ShiftWindow::parse(
            self.start_time.as_deref().unwrap_or(default_start),
            self.end_time.as_deref().unwrap_or(default_end),
        )
    }

    /// 单次运行最多采集的列表页数
    pub fn max_pages(&self, default: u32) -> u32 {
        self.search_params
            .get("max_pages")
            .and_then(|v| v.as_u64())
            .and_then(|v| u32::try_from(v).ok())
            .filter(|v| *v > 0)
            .unwrap_or(default)
    }

    /// 根据本次开始时间计算预计的下一次运行时间
    pub fn next_run_after(&self, started_at: DateTime<FixedOffset>) -> Option<DateTime<FixedOffset>> {
        if self.scrape_interval_hours <= 0 {
            return None;
        }
        Some(started_at + Duration::hours(i64::from(self.scrape_interval_hours)))
    }
}

/// 新建任务参数
#[derive(Debug, Clone)]
pub struct NewTask {
    pub name: String,
    pub platform: String,
    pub target_url: String,
    pub search_params: serde_json::Value,
    pub scrape_interval_hours: i32,
    pub is_active: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
}

impl NewTask {
    /// 使用默认值创建新任务
    pub fn new(name: impl Into<String>, platform: impl Into<String>, target_url: impl Into<String>) -> Self {
        Self {
            name: name.into(),
            platform: platform.into(),
            target_url: target_url.into(),
            search_params: serde_json::json!({}),
            scrape_interval_hours: 24,
            is_active: true,
            start_time: Some(DEFAULT_START_TIME.to_string()),
            end_time: Some(DEFAULT_END_TIME.to_string()),
        }
    }

    /// 校验班次时间格式
    pub fn validate(&self) -> Result<(), WindowError> {
        ShiftWindow::parse(
            self.start_time.as_deref().unwrap_or(DEFAULT_START_TIME),
            self.end_time.as_deref().unwrap_or(DEFAULT_END_TIME),
        )
        .map(|_| ())
    }
}

/// 班次时间解析错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum WindowError {
    #[error("无效的时间格式 (期望 HH:MM): {0}")]
    InvalidTime(String),
}

/// 班次窗口
///
/// 以本地时间的分钟精度比较，两端均为闭区间。`start > end` 表示跨越午夜。
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ShiftWindow {
    pub start: NaiveTime,
    pub end: NaiveTime,
}

impl ShiftWindow {
    /// 从两个 HH:MM 字符串解析班次窗口
    pub fn parse(start: &str, end: &str) -> Result<Self, WindowError> {
        Ok(Self {
            start: parse_hhmm(start)?,
            end: parse_hhmm(end)?,
        })
    }

    /// 判断给定时刻是否处于窗口内
    pub fn is_active(&self, now: NaiveTime) -> bool {
        let now = truncate_to_minute(now);
        if self.start < self.end {
            self.start <= now && now <= self.end
        } else {
            now >= self.start || now <= self.end
        }
    }
}

fn parse_hhmm(value: &str) -> Result<NaiveTime, WindowError> {
    let trimmed = value.trim();
    if trimmed.len() != 5 {
        return Err(WindowError::InvalidTime(value.to_string()));
    }
    NaiveTime::parse_from_str(trimmed, "%H:%M").map_err(|_| WindowError::InvalidTime(value.to_string()))
}

fn truncate_to_minute(time: NaiveTime) -> NaiveTime {
    NaiveTime::from_hms_opt(time.hour(), time.minute(), 0).unwrap_or(time)
}
