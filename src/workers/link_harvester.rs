// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::HarvesterSettings;
use crate::domain::repositories::run_log_repository::RunLogRepository;
use crate::domain::repositories::storage_repository::StorageRepository;
use crate::engines::detection::inspect;
use crate::engines::parser::PageParser;
use crate::engines::traits::PageFetcher;
use crate::infrastructure::metrics as names;
use crate::queue::harvest_queue::HarvestQueue;
use crate::utils::errors::WorkerError;
use crate::utils::url_utils::build_page_url;
use crate::workers::worker::{save_diagnostic, RunContext, Worker};
use async_trait::async_trait;
use metrics::counter;
use rand::Rng;
use std::collections::HashSet;
use std::sync::Arc;
use std::time::Duration;
use tokio::time::sleep;
use tracing::{debug, error, info, instrument, warn};

/// 链接采集参数
#[derive(Debug, Clone)]
pub struct HarvesterOptions {
    pub max_pages: u32,
    /// 每隔多少页重建一次会话，0 表示不重建
    pub session_refresh_pages: u32,
    pub page_delay_min: Duration,
    pub page_delay_max: Duration,
    pub stale_retry_delay: Duration,
}

impl HarvesterOptions {
    pub fn from_settings(settings: &HarvesterSettings, max_pages: u32) -> Self {
        Self {
            max_pages,
            session_refresh_pages: settings.session_refresh_pages,
            page_delay_min: Duration::from_millis(settings.page_delay_min_ms),
            page_delay_max: Duration::from_millis(settings.page_delay_max_ms),
            stale_retry_delay: Duration::from_millis(settings.stale_retry_delay_ms),
        }
    }

    fn page_delay(&self) -> Duration {
        if self.page_delay_max <= self.page_delay_min {
            return self.page_delay_min;
        }
        rand::rng().random_range(self.page_delay_min..=self.page_delay_max)
    }
}

/// 采集结果汇总
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct HarvestSummary {
    pub pages: u32,
    pub links_found: u32,
    pub enqueued: u32,
    pub errors_recorded: u32,
}

enum PageOutcome {
    Links(Vec<String>),
    /// 抓取失败，已记录错误，继续下一页
    Skip,
    /// 空页面，分页结束
    End,
    /// 重试后仍被拦截或重复，已记录错误
    Abort,
}

/// 链接采集器（生产者）
///
/// 逐页抓取列表/搜索页，把商品链接写入采集队列。检测到拦截页或重复页时重建会话重试一次。
pub struct LinkHarvester {
    context: RunContext,
    target_url: String,
    fetcher: Box<dyn PageFetcher>,
    parser: Arc<PageParser>,
    queue: HarvestQueue,
    run_logs: Arc<dyn RunLogRepository>,
    storage: Arc<dyn StorageRepository>,
    options: HarvesterOptions,
    summary: HarvestSummary,
}

impl LinkHarvester {
    #[allow(clippy::too_many_arguments)]
    pub fn new(
        context: RunContext,
        target_url: impl Into<String>,
        fetcher: Box<dyn PageFetcher>,
        parser: Arc<PageParser>,
        queue: HarvestQueue,
        run_logs: Arc<dyn RunLogRepository>,
        storage: Arc<dyn StorageRepository>,
        options: HarvesterOptions,
    ) -> Self {
        Self {
            context,
            target_url: target_url.into(),
            fetcher,
            parser,
            queue,
            run_logs,
            storage,
            options,
            summary: HarvestSummary::default(),
        }
    }

    pub fn summary(&self) -> &HarvestSummary {
        &self.summary
    }

    async fn reset_session(&mut self, reason: &str) -> Result<(), WorkerError> {
        info!("Resetting {} session: {}", self.fetcher.name(), reason);
        counter!(names::HARVESTER_SESSION_RESETS).increment(1);
        self.fetcher.reset_session().await?;
        Ok(())
    }

    async fn record_error(&mut self, message: &str, with_capture: bool) -> Result<(), WorkerError> {
        let reference = if with_capture {
            save_diagnostic(
                self.fetcher.as_mut(),
                self.storage.as_ref(),
                "linker",
                self.context.run_log_id,
            )
            .await
        } else {
            None
        };
        error!("{}", message);
        self.run_logs
            .record_error(self.context.run_log_id, message, reference.as_deref())
            .await?;
        self.summary.errors_recorded += 1;
        Ok(())
    }

    #[instrument(skip(self, seen), fields(task_id = self.context.task_id))]
    async fn harvest_page(
        &mut self,
        page: u32,
        url: &str,
        seen: &HashSet<String>,
    ) -> Result<PageOutcome, WorkerError> {
        let mut retried = false;

        loop {
            let fetched = match self.fetcher.fetch(url).await {
                Ok(fetched) => fetched,
                Err(e) => {
                    self.record_error(&format!("Page {} fetch failed: {}", page, e), false)
                        .await?;
                    return Ok(PageOutcome::Skip);
                }
            };

            let verdict = inspect(&fetched, self.parser.block_markers());
            if !verdict.is_usable() {
                if !retried {
                    retried = true;
                    warn!("Page {} unusable ({}), retrying with a new session", page, verdict.describe());
                    self.reset_session("unusable page").await?;
                    continue;
                }
                self.record_error(&format!("Page {} unusable after retry: {}", page, verdict.describe()), true)
                    .await?;
                return Ok(PageOutcome::Abort);
            }

            let links = self.parser.extract_links(&fetched.html);
            if links.is_empty() {
                info!("Page {} has no product links, pagination finished", page);
                return Ok(PageOutcome::End);
            }

            if links.iter().all(|link| seen.contains(link)) {
                if !retried {
                    retried = true;
                    warn!("Page {} repeated earlier results, retrying with a new session", page);
                    self.reset_session("stale page").await?;
                    sleep(self.options.stale_retry_delay).await;
                    continue;
                }
                self.record_error(&format!("Page {} kept serving already seen products", page), true)
                    .await?;
                return Ok(PageOutcome::Abort);
            }

            return Ok(PageOutcome::Links(links));
        }
    }
}

#[async_trait]
impl Worker for LinkHarvester {
    async fn run(&mut self) -> Result<(), WorkerError> {
        info!(
            "Harvesting up to {} pages from {}",
            self.options.max_pages, self.target_url
        );

        let mut seen = HashSet::new();
        let mut rank: i32 = 0;

        for page in 1..=self.options.max_pages {
            let refresh = self.options.session_refresh_pages;
            if page > 1 && refresh > 0 && (page - 1) % refresh == 0 {
                self.reset_session("periodic refresh").await?;
            }

            let url = match build_page_url(&self.target_url, page) {
                Ok(url) => url,
                Err(e) => {
                    self.record_error(&format!("Invalid target url {}: {}", self.target_url, e), false)
                        .await?;
                    break;
                }
            };

            let links = match self.harvest_page(page, &url, &seen).await? {
                PageOutcome::Links(links) => links,
                PageOutcome::Skip => continue,
                PageOutcome::End | PageOutcome::Abort => break,
            };

            for link in &links {
                rank += 1;
                if self.queue.enqueue(self.context.task_id, link, Some(rank)).await? {
                    self.summary.enqueued += 1;
                }
                seen.insert(link.clone());
            }

            let found = links.len() as u32;
            self.run_logs
                .record_page(self.context.run_log_id, found as i32)
                .await?;
            self.summary.pages += 1;
            self.summary.links_found += found;
            counter!(names::HARVESTER_PAGES).increment(1);
            debug!("Page {}: {} links, {} enqueued so far", page, found, self.summary.enqueued);

            if page < self.options.max_pages {
                sleep(self.options.page_delay()).await;
            }
        }

        if self.summary.links_found == 0 && self.summary.errors_recorded == 0 {
            self.record_error("No product links found on any page", true).await?;
        }

        info!(
            "Harvest finished: {} pages, {} links, {} new",
            self.summary.pages, self.summary.links_found, self.summary.enqueued
        );
        Ok(())
    }

    fn name(&self) -> &str {
        "link_harvester"
    }
}
