// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::services::metrics_service::{parse_count, parse_price, parse_rating};
use crate::utils::url_utils::extract_product_code;
use chrono::{DateTime, FixedOffset};
use regex::Regex;
use serde::{Deserialize, Serialize};
use thiserror::Error;

/// 商品实体
///
/// 以URL为自然键，无论被重复抓取多少次都只有一行，每次抓取就地更新。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Product {
    pub id: i32,
    pub url: String,
    pub platform: String,
    /// 平台商品编号
    pub product_code: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// 最近一次成交价（折后价，缺失时为标价）
    pub last_price: Option<f64>,
    pub last_discount_rate: Option<f64>,
    pub last_engagement_score: Option<f64>,
    /// 销售速度的滑动平均
    pub avg_sales_velocity: Option<f64>,
    pub created_at: DateTime<FixedOffset>,
    pub last_scraped_at: DateTime<FixedOffset>,
}

/// 指标快照
///
/// 只追加不修改，按 `recorded_at` 排序构成时间序列。
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MetricSnapshot {
    pub id: i32,
    pub product_id: i32,
    pub recorded_at: DateTime<FixedOffset>,
    /// 标价
    pub price: Option<f64>,
    /// 折后价
    pub discounted_price: Option<f64>,
    pub discount_rate: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: i64,
    pub question_count: i64,
    pub favorites: i64,
    pub cart_count: i64,
    pub views: i64,
    pub listing_rank: Option<i32>,
    pub velocity_score: f64,
    pub engagement_score: f64,
    pub trend_score: f64,
    /// 每小时加购增量，首个快照为空
    pub sales_velocity: Option<f64>,
    pub demand_acceleration: Option<f64>,
    /// -1 下降，0 持平，1 上升
    pub trend_direction: i16,
}

/// 待追加的指标快照
#[derive(Debug, Clone, PartialEq)]
pub struct NewMetricSnapshot {
    pub product_id: i32,
    pub recorded_at: DateTime<FixedOffset>,
    pub price: Option<f64>,
    pub discounted_price: Option<f64>,
    pub discount_rate: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: i64,
    pub question_count: i64,
    pub favorites: i64,
    pub cart_count: i64,
    pub views: i64,
    pub listing_rank: Option<i32>,
    pub velocity_score: f64,
    pub engagement_score: f64,
    pub trend_score: f64,
    pub sales_velocity: Option<f64>,
    pub demand_acceleration: Option<f64>,
    pub trend_direction: i16,
}

/// 每次快照后写回商品行的汇总值
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct ProductRollup {
    pub last_price: Option<f64>,
    pub last_discount_rate: Option<f64>,
    pub last_engagement_score: Option<f64>,
    pub avg_sales_velocity: Option<f64>,
}

/// 一次详情抓取写入后的结果
#[derive(Debug, Clone)]
pub struct RecordedScrape {
    /// 写入汇总值之前的商品行
    pub product: Product,
    pub snapshot: MetricSnapshot,
    /// 本次是否新建商品
    pub created: bool,
}

/// 详情页解析得到的原始文本字段
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RawProductFields {
    pub name: Option<String>,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// 售价文本（折后）
    pub price_text: Option<String>,
    /// 原价文本
    pub original_price_text: Option<String>,
    pub rating_text: Option<String>,
    pub review_count_text: Option<String>,
    pub question_count_text: Option<String>,
    pub favorites_text: Option<String>,
    pub cart_text: Option<String>,
    pub views_text: Option<String>,
}

/// 原始字段映射错误
#[derive(Error, Debug, PartialEq, Eq)]
pub enum ProductParseError {
    #[error("商品名称缺失，页面数据无法读取")]
    MissingName,
}

/// 规范化后的商品抓取结果
#[derive(Debug, Clone, PartialEq)]
pub struct ScrapedProduct {
    pub url: String,
    pub product_code: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    /// 标价
    pub price: Option<f64>,
    /// 折后价
    pub discounted_price: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: i64,
    pub question_count: i64,
    pub favorites: i64,
    pub cart_count: i64,
    pub views: i64,
}

impl ScrapedProduct {
    /// 将原始文本字段映射为规范化结构
    ///
    /// 名称为必填；数值字段解析失败时取 0 或空。原价缺失或低于售价时按售价处理。
    pub fn from_raw(url: &str, raw: RawProductFields, product_id_pattern: &Regex) -> Result<Self, ProductParseError> {
        let name = non_empty(raw.name).ok_or(ProductParseError::MissingName)?;

        let discounted_price = raw.price_text.as_deref().and_then(parse_price);
        let mut price = raw
            .original_price_text
            .as_deref()
            .and_then(parse_price)
            .or(discounted_price);
        if let (Some(original), Some(selling)) = (price, discounted_price) {
            if original < selling {
                price = Some(selling);
            }
        }

        let count = |text: &Option<String>| text.as_deref().map(parse_count).unwrap_or(0);

        Ok(Self {
            url: url.to_string(),
            product_code: extract_product_code(url, product_id_pattern),
            name,
            brand: non_empty(raw.brand),
            image_url: non_empty(raw.image_url).filter(|src| !src.starts_with("data:")),
            price,
            discounted_price,
            rating: raw.rating_text.as_deref().and_then(parse_rating),
            rating_count: count(&raw.review_count_text),
            question_count: count(&raw.question_count_text),
            favorites: count(&raw.favorites_text),
            cart_count: count(&raw.cart_text),
            views: count(&raw.views_text),
        })
    }

    /// 当前成交价
    pub fn effective_price(&self) -> Option<f64> {
        self.discounted_price.or(self.price)
    }
}

fn non_empty(value: Option<String>) -> Option<String> {
    value
        .map(|v| v.trim().to_string())
        .filter(|v| !v.is_empty())
}
