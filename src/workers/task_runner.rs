// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::Settings;
use crate::domain::models::run_log::{NewRunLog, RunStatus};
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::run_log_repository::RunLogRepository;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::repositories::task_repository::TaskRepository;
use crate::domain::services::metrics_service::VelocityWeights;
use crate::engines::parser::PageParser;
use crate::engines::traits::{FetcherFactory, PageFetcher};
use crate::queue::harvest_queue::HarvestQueue;
use crate::utils::errors::WorkerError;
use crate::utils::url_utils::{extract_keyword, is_product_url};
use crate::workers::detail_worker::{DetailSummary, DetailWorker, DetailWorkerOptions};
use crate::workers::link_harvester::{HarvestSummary, HarvesterOptions, LinkHarvester};
use crate::workers::worker::{RunContext, Worker};
use chrono::Utc;
use std::sync::Arc;
use tracing::{error, info, instrument, warn};

/// 任务运行器依赖的仓库和服务
#[derive(Clone)]
pub struct RunnerDeps {
    pub tasks: Arc<dyn TaskRepository>,
    pub products: Arc<dyn ProductRepository>,
    pub run_logs: Arc<dyn RunLogRepository>,
    pub storage: Arc<dyn StorageRepository>,
    pub queue: HarvestQueue,
    pub parser: Arc<PageParser>,
    pub fetchers: Arc<dyn FetcherFactory>,
}

/// 一次运行的结果
#[derive(Debug, Clone)]
pub struct RunOutcome {
    pub run_log_id: i32,
    pub status: RunStatus,
    /// 单商品模式下没有采集阶段
    pub harvest: Option<HarvestSummary>,
    pub detail: DetailSummary,
}

/// 任务运行器
///
/// 采集进程的入口：打开运行日志，并发运行链接采集器和详情抓取器，最后关闭运行日志
pub struct TaskRunner {
    deps: RunnerDeps,
    settings: Settings,
}

impl TaskRunner {
    pub fn new(deps: RunnerDeps, settings: Settings) -> Self {
        Self { deps, settings }
    }

    /// 执行一次任务运行
    ///
    /// # 参数
    ///
    /// * `task_id` - 任务ID
    /// * `url_override` - 覆盖任务的目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(RunOutcome)` - 运行结束（包括记录了错误的运行）
    /// * `Err(WorkerError)` - 任务不存在或存储不可用
    #[instrument(skip(self, url_override))]
    pub async fn run(&self, task_id: i32, url_override: Option<&str>) -> Result<RunOutcome, WorkerError> {
        let deps = &self.deps;
        let task = deps
            .tasks
            .find_by_id(task_id)
            .await?
            .ok_or_else(|| WorkerError::NotFound(format!("task {}", task_id)))?;
        let target_url = url_override.unwrap_or(&task.target_url).to_string();

        let log = deps
            .run_logs
            .open(&NewRunLog {
                task_id,
                platform: task.platform.clone(),
                keyword: Some(extract_keyword(&target_url)),
                target_url: Some(target_url.clone()),
            })
            .await?;
        let now = Utc::now().fixed_offset();
        deps.tasks
            .mark_run_started(task_id, now, task.next_run_after(now))
            .await?;
        info!("Run {} started for task {} ({})", log.id, task.name, target_url);

        let context = RunContext {
            task_id,
            run_log_id: log.id,
            platform: task.platform.clone(),
        };

        let result = if is_product_url(&target_url, deps.parser.link_marker()) {
            self.run_single(&context, &target_url).await
        } else {
            let max_pages = task.max_pages(self.settings.harvester.default_max_pages);
            self.run_listing(&context, &target_url, max_pages).await
        };

        let (status, outcome) = match result {
            Ok((harvest, detail)) => (RunStatus::Completed, Ok((harvest, detail))),
            Err(e) => {
                error!("Run {} failed: {}", log.id, e);
                if !e.is_fatal() {
                    if let Err(record_err) = deps
                        .run_logs
                        .record_error(log.id, &format!("Run failed: {}", e), None)
                        .await
                    {
                        warn!("Failed to record error on run log {}: {}", log.id, record_err);
                    }
                }
                (RunStatus::Failed, Err(e))
            }
        };

        if let Err(e) = deps.run_logs.close(log.id, status).await {
            warn!("Failed to close run log {}: {}", log.id, e);
        }
        info!("Run {} finished with status {}", log.id, status);

        let (harvest, detail) = outcome?;
        Ok(RunOutcome {
            run_log_id: log.id,
            status,
            harvest,
            detail,
        })
    }

    fn detail_worker(&self, context: &RunContext, fetcher: Box<dyn PageFetcher>) -> DetailWorker {
        let deps = &self.deps;
        DetailWorker::new(
            context.clone(),
            fetcher,
            deps.parser.clone(),
            deps.queue.clone(),
            deps.products.clone(),
            deps.run_logs.clone(),
            deps.storage.clone(),
            DetailWorkerOptions::from_settings(
                &self.settings.worker,
                VelocityWeights::from(&self.settings.scoring),
            ),
        )
    }

    /// 单商品模式：直接入队目标URL，只运行详情抓取器
    async fn run_single(
        &self,
        context: &RunContext,
        url: &str,
    ) -> Result<(Option<HarvestSummary>, DetailSummary), WorkerError> {
        self.deps.queue.enqueue(context.task_id, url, None).await?;
        let fetcher = self.deps.fetchers.create().await?;
        let mut worker = self.detail_worker(context, fetcher);
        worker.run().await?;
        Ok((None, worker.summary().clone()))
    }

    async fn run_listing(
        &self,
        context: &RunContext,
        url: &str,
        max_pages: u32,
    ) -> Result<(Option<HarvestSummary>, DetailSummary), WorkerError> {
        let deps = &self.deps;
        let harvester_fetcher = deps.fetchers.create().await?;
        let worker_fetcher = deps.fetchers.create().await?;

        let mut harvester = LinkHarvester::new(
            context.clone(),
            url,
            harvester_fetcher,
            deps.parser.clone(),
            deps.queue.clone(),
            deps.run_logs.clone(),
            deps.storage.clone(),
            HarvesterOptions::from_settings(&self.settings.harvester, max_pages),
        );
        let mut worker = self.detail_worker(context, worker_fetcher);

        let (harvest_result, detail_result) = tokio::join!(harvester.run(), worker.run());

        // a non-fatal harvester error leaves the worker's results intact
        for (name, result) in [("link_harvester", &harvest_result), ("detail_worker", &detail_result)] {
            if let Err(e) = result {
                error!("{} stopped: {}", name, e);
            }
        }
        if let Err(e) = harvest_result {
            if e.is_fatal() || detail_result.is_err() {
                return Err(e);
            }
            self.deps
                .run_logs
                .record_error(context.run_log_id, &format!("Harvester stopped: {}", e), None)
                .await?;
        }
        detail_result?;

        Ok((Some(harvester.summary().clone()), worker.summary().clone()))
    }
}
