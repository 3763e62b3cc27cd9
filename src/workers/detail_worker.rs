// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::WorkerSettings;
use crate::domain::models::product::ScrapedProduct;
use crate::domain::models::queue_item::QueueItem;
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::run_log_repository::RunLogRepository;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::domain::services::metrics_service::VelocityWeights;
use crate::engines::detection::find_block_marker;
use crate::engines::parser::PageParser;
use crate::engines::traits::PageFetcher;
use crate::queue::harvest_queue::HarvestQueue;
use crate::utils::errors::WorkerError;
use crate::workers::worker::{save_diagnostic, RunContext, Worker};
use async_trait::async_trait;
use chrono::Utc;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};
use uuid::Uuid;

/// 详情抓取参数
#[derive(Debug, Clone)]
pub struct DetailWorkerOptions {
    /// 连续空轮询多少次后退出
    pub max_empty_polls: u32,
    pub poll_interval: Duration,
    pub request_delay: Duration,
    pub weights: VelocityWeights,
}

impl DetailWorkerOptions {
    pub fn from_settings(settings: &WorkerSettings, weights: VelocityWeights) -> Self {
        Self {
            max_empty_polls: settings.max_empty_polls.max(1),
            poll_interval: Duration::from_millis(settings.poll_interval_ms),
            request_delay: Duration::from_millis(settings.request_delay_ms),
            weights,
        }
    }
}

/// 详情抓取结果汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct DetailSummary {
    pub completed: u32,
    pub created: u32,
    pub failed: u32,
}

/// 详情抓取器（消费者）
///
/// 从采集队列认领商品URL，抓取详情页，写入商品和指标快照。单个商品失败不会中断循环。
pub struct DetailWorker {
    context: RunContext,
    claimant: Uuid,
    fetcher: Box<dyn PageFetcher>,
    parser: Arc<PageParser>,
    queue: HarvestQueue,
    products: Arc<dyn ProductRepository>,
    run_logs: Arc<dyn RunLogRepository>,
    storage: Arc<dyn StorageRepository>,
    options: DetailWorkerOptions,
    summary: DetailSummary,
}

impl DetailWorker {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: RunContext,
        fetcher: Box<dyn PageFetcher>,
        parser: Arc<PageParser>,
        queue: HarvestQueue,
        products: Arc<dyn ProductRepository>,
        run_logs: Arc<dyn RunLogRepository>,
        storage: Arc<dyn StorageRepository>,
        options: DetailWorkerOptions,
    ) -> Self {
        Self {
            context,
            claimant: Uuid::new_v4(),
            fetcher,
            parser,
            queue,
            products,
            run_logs,
            storage,
            options,
            summary: DetailSummary::default(),
        }
    }

    pub fn summary(&self) -> &DetailSummary {
        &self.summary
    }

    /// 抓取并写入一个商品
    ///
    /// # 返回值
    ///
    /// * `Ok(true)` - 新建商品
    /// * `Ok(false)` - 更新已有商品
    async fn scrape_item(&mut self, item: &QueueItem) -> Result<bool, WorkerError> {
        let page = self.fetcher.fetch(&item.url).await?;
        if page.status >= 400 {
            return Err(WorkerError::Blocked(format!("http status {}", page.status)));
        }
        if let Some(marker) = find_block_marker(&page.text, self.parser.block_markers()) {
            return Err(WorkerError::Blocked(marker.to_string()));
        }

        let raw = self.parser.parse_product(&page.html);
        let scraped = ScrapedProduct::from_raw(&item.url, raw, self.parser.product_id_pattern())
            .map_err(|e| WorkerError::ParseError(e.to_string()))?;

        let recorded = self
            .products
            .record_scrape(
                &scraped,
                &self.context.platform,
                item.listing_rank,
                Utc::now().fixed_offset(),
                &self.options.weights,
            )
            .await?;
        let snapshot = &recorded.snapshot;

        debug!(
            "Stored {} (velocity {:.2}, engagement {:.2})",
            scraped.name, snapshot.velocity_score, snapshot.engagement_score
        );
        Ok(recorded.created)
    }

    #[instrument(skip(self, item), fields(item_id = item.id, url = %item.url))]
    async fn process_item(&mut self, item: QueueItem) -> Result<(), WorkerError> {
        match self.scrape_item(&item).await {
            Ok(created) => {
                if let Err(e) = self.queue.complete(item.id).await {
                    let e = WorkerError::from(e);
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!("Could not complete item {}: {}", item.id, e);
                }
                self.run_logs
                    .record_product(self.context.run_log_id, created)
                    .await?;
                self.summary.completed += 1;
                if created {
                    self.summary.created += 1;
                }
            }
            Err(e) if e.is_fatal() => return Err(e),
            Err(e) => {
                error!("Item failed: {}", e);
                let reference = save_diagnostic(
                    self.fetcher.as_mut(),
                    self.storage.as_ref(),
                    "detail",
                    self.context.run_log_id,
                )
                .await;
                let message = e.to_string();
                if let Err(e) = self.queue.fail(item.id, &message, reference.as_deref()).await {
                    let e = WorkerError::from(e);
                    if e.is_fatal() {
                        return Err(e);
                    }
                    warn!("Could not mark item {} failed: {}", item.id, e);
                }
                self.run_logs
                    .record_error(
                        self.context.run_log_id,
                        &format!("{}: {}", item.url, message),
                        reference.as_deref(),
                    )
                    .await?;
                self.summary.failed += 1;
            }
        }
        Ok(())
    }
}

#[async_trait]
impl Worker for DetailWorker {
    async fn run(&mut self) -> Result<(), WorkerError> {
        info!("Detail worker {} started for task {}", self.claimant, self.context.task_id);
        let mut empty_polls = 0;

        loop {
            match self.queue.claim(self.context.task_id, self.claimant).await? {
                Some(item) => {
                    empty_polls = 0;
                    self.process_item(item).await?;
                    if !self.options.request_delay.is_zero() {
                        sleep(self.options.request_delay).await;
                    }
                }
                None => {
                    empty_polls += 1;
                    if empty_polls >= self.options.max_empty_polls {
                        break;
                    }
                    sleep(self.options.poll_interval).await;
                }
            }
        }

        info!(
            "Detail worker finished: {} completed ({} new), {} failed",
            self.summary.completed, self.summary.created, self.summary.failed
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "detail_worker"
    }
}
