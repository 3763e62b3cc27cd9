// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::task_repository::RepositoryError;
use crate::domain::models::product::{MetricSnapshot, Product, RecordedScrape, ScrapedProduct};
use crate::domain::services::metrics_service::VelocityWeights;
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};

/// 商品仓库特质
///
/// 商品按URL自然键更新插入，指标快照只追加
#[async_trait]
pub trait ProductRepository: Send + Sync {
    /// 记录一次详情抓取
    ///
    /// 在同一事务内按URL更新插入商品、基于上一条快照计算并追加新快照、写回汇总值。
    /// 任一步失败时整次写入回滚，不会留下孤立的快照。
    ///
    /// # 参数
    ///
    /// * `scraped` - 解析后的商品数据
    /// * `platform` - 平台名称（仅新建时写入）
    /// * `listing_rank` - 列表中的排名
    /// * `scraped_at` - 抓取时间
    /// * `weights` - 销售速度评分权重
    async fn record_scrape(
        &self,
        scraped: &ScrapedProduct,
        platform: &str,
        listing_rank: Option<i32>,
        scraped_at: DateTime<FixedOffset>,
        weights: &VelocityWeights,
    ) -> Result<RecordedScrape, RepositoryError>;

    /// 根据URL查找商品
    async fn find_by_url(&self, url: &str) -> Result<Option<Product>, RepositoryError>;

    /// 商品最近的一条快照
    async fn latest_snapshot(&self, product_id: i32) -> Result<Option<MetricSnapshot>, RepositoryError>;

    /// 按时间顺序列出商品的全部快照
    async fn snapshots(&self, product_id: i32) -> Result<Vec<MetricSnapshot>, RepositoryError>;
}
