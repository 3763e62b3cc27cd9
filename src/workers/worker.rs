// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::repositories::storage_repository::StorageRepository;
use crate::engines::traits::PageFetcher;
use crate::utils::errors::WorkerError;
use async_trait::async_trait;
use chrono::Local;
use tracing::warn;

/// Worker trait定义
///
/// 链接采集器和详情抓取器都实现此trait，由任务运行器并发驱动
#[async_trait]
pub trait Worker: Send {
    /// 运行工作器直到工作完成
    async fn run(&mut self) -> Result<(), WorkerError>;

    /// 获取工作器名称
    fn name(&self) -> &str;
}

/// 一次运行的上下文
#[derive(Debug, Clone)]
pub struct RunContext {
    pub task_id: i32,
    pub run_log_id: i32,
    pub platform: String,
}

/// 保存当前页面的诊断快照
///
/// 键格式为 `{label}_{run_log_id}_{HHMMSS}.{ext}`，失败只记日志
///
/// # 返回值
///
/// 存储返回的引用，无法获取或保存时为 `None`
pub async fn save_diagnostic(
    fetcher: &mut dyn PageFetcher,
    storage: &dyn StorageRepository,
    label: &str,
    run_log_id: i32,
) -> Option<String> {
    let capture = fetcher.capture().await?;
    let key = format!(
        "{}_{}_{}.{}",
        label,
        run_log_id,
        Local::now().format("%H%M%S"),
        capture.extension
    );
    match storage.save(&key, &capture.bytes).await {
        Ok(reference) => Some(reference),
        Err(e) => {
            warn!("Failed to save diagnostic {}: {}", key, e);
            None
        }
    }
}
