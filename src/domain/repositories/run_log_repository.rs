// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task_repository::RepositoryError;
use crate::domain::models::run_log::{NewRunLog, RunLog, RunStatus};
use async_trait::async_trait;

/// 运行日志仓库特质
///
/// 计数字段以数据库内自增方式更新，采集器与详情抓取器并发写入时互不覆盖
#[async_trait]
pub trait RunLogRepository: Send + Sync {
    /// 打开一条状态为 running 的运行日志
    async fn open(&self, log: &NewRunLog) -> Result<RunLog, RepositoryError>;
    /// 根据ID查找
    async fn find_by_id(&self, id: i32) -> Result<Option<RunLog>, RepositoryError>;
    /// 任务最近一次运行
    async fn latest_for_task(&self, task_id: i32) -> Result<Option<RunLog>, RepositoryError>;
    /// 记录一页采集结果
    async fn record_page(&self, id: i32, links_found: i32) -> Result<(), RepositoryError>;
    /// 记录一个商品写入，`created` 区分新增和更新
    async fn record_product(&self, id: i32, created: bool) -> Result<(), RepositoryError>;
    /// 记录一条错误，附带可选的诊断快照引用
    async fn record_error(
        &self,
        id: i32,
        message: &str,
        diagnostic_ref: Option<&str>,
    ) -> Result<(), RepositoryError>;
    /// 关闭运行日志
    async fn close(&self, id: i32, status: RunStatus) -> Result<(), RepositoryError>;
}
