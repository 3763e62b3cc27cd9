// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

//! 指标引擎
//!
//! 纯函数：把本地化的噪声文本解析为数字，并计算可比较的评分与时间序列指标。
//! 解析失败一律返回 0 或 `None`，不会中断一次抓取。

use crate::config::settings::ScoringSettings;
use crate::domain::models::product::{MetricSnapshot, NewMetricSnapshot, Product, ProductRollup, ScrapedProduct};
use chrono::{DateTime, FixedOffset};
use once_cell::sync::Lazy;
use regex::Regex;

// "son 3 saatte", "son 24 saat", "son 2 günde"
static RECENT_WINDOW: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"son\s+\d+\s+(saat|gün|dakika|hafta|ay)[tdea]*").unwrap());
// "3 saatte", "5 dakikada"
static DURATION: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"[\d.,]+\s+(saat|gün|dakika)(te|de|ta|da)*").unwrap());
static PEOPLE: Lazy<Regex> = Lazy::new(|| Regex::new(r"kişi\w*").unwrap());
static COUNT: Lazy<Regex> =
    Lazy::new(|| Regex::new(r"(\d[\d.,]*)\s*(?:(bin|mn|b|m|k)\b)?").unwrap());
static NUMBER: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d[\d.,]*").unwrap());
static DECIMAL: Lazy<Regex> = Lazy::new(|| Regex::new(r"\d+[.,]\d+|\d+").unwrap());

/// 解析带量级后缀的计数文本
///
/// 先剔除 "son 3 saatte"、"kişi" 之类的噪声短语，再取第一个数字及可选后缀。
/// 带后缀时逗号是小数点（"6,4B" = 6400）；不带后缀时点是千位分隔符（"3.500" = 3500）。
///
/// # 参数
///
/// * `text` - 页面上的原始文本
///
/// # 返回值
///
/// 四舍五入后的整数，无法解析时为 0
pub fn parse_count(text: &str) -> i64 {
    if text.trim().is_empty() {
        return 0;
    }

    let lowered = text.to_lowercase();
    let cleaned = RECENT_WINDOW.replace_all(&lowered, "");
    let cleaned = DURATION.replace_all(&cleaned, "");
    let cleaned = PEOPLE.replace_all(&cleaned, "");

    let Some(caps) = COUNT.captures(&cleaned) else {
        return 0;
    };
    let digits = &caps[1];
    let unit = caps.get(2).map(|m| m.as_str());

    let normalized = match unit {
        Some(_) => digits.replace(',', "."),
        None => digits.replace('.', "").replace(',', "."),
    };
    let Ok(mut value) = normalized.trim_end_matches('.').parse::<f64>() else {
        return 0;
    };

    match unit {
        Some("bin") | Some("b") | Some("k") => value *= 1_000.0,
        Some("mn") | Some("m") => value *= 1_000_000.0,
        _ => {}
    }

    value.round() as i64
}

/// 解析价格文本，例如 "1.299,90 TL"
pub fn parse_price(text: &str) -> Option<f64> {
    let stripped = text.replace("TL", "").replace('₺', "");
    let number = NUMBER.find(&stripped)?.as_str();
    let normalized = number.replace('.', "").replace(',', ".");
    normalized.trim_end_matches('.').parse::<f64>().ok()
}

/// 解析评分文本，例如 "4,6"
pub fn parse_rating(text: &str) -> Option<f64> {
    let found = DECIMAL.find(text)?.as_str();
    found.replace(',', ".").parse::<f64>().ok()
}

/// 折扣率（百分比）
///
/// 任一价格缺失或原价不为正时为 `None`；折后价不低于原价时为 0。
pub fn discount_rate(original: Option<f64>, discounted: Option<f64>) -> Option<f64> {
    let (original, discounted) = (original?, discounted?);
    if original <= 0.0 {
        return None;
    }
    if discounted >= original {
        return Some(0.0);
    }
    Some((original - discounted) / original * 100.0)
}

/// 价格变化百分比
pub fn price_change(old: Option<f64>, new: Option<f64>) -> Option<f64> {
    let (old, new) = (old?, new?);
    if old <= 0.0 {
        return None;
    }
    Some((new - old) / old * 100.0)
}

/// 速度评分权重
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct VelocityWeights {
    pub cart: f64,
    pub favorites: f64,
    pub views: f64,
    /// 使用 ln(x+1) 缩放原始计数
    pub log_scale: bool,
}

impl Default for VelocityWeights {
    fn default() -> Self {
        Self {
            cart: 3.0,
            favorites: 2.0,
            views: 1.0,
            log_scale: true,
        }
    }
}

impl From<&ScoringSettings> for VelocityWeights {
    fn from(settings: &ScoringSettings) -> Self {
        Self {
            cart: settings.cart_weight,
            favorites: settings.favorite_weight,
            views: settings.view_weight,
            log_scale: settings.log_scale,
        }
    }
}

fn ln1p_count(value: i64) -> f64 {
    (value.max(0) as f64 + 1.0).ln()
}

/// 速度评分：加购、收藏、浏览的加权和
pub fn velocity_score(cart: i64, favorites: i64, views: i64, weights: &VelocityWeights) -> f64 {
    let scale = |value: i64| {
        if weights.log_scale {
            ln1p_count(value)
        } else {
            value.max(0) as f64
        }
    };
    scale(cart) * weights.cart + scale(favorites) * weights.favorites + scale(views) * weights.views
}

/// 互动评分
pub fn engagement_score(rating: Option<f64>, reviews: i64, questions: i64, favorites: i64) -> f64 {
    rating.unwrap_or(0.0) * 20.0
        + ln1p_count(reviews) * 10.0
        + ln1p_count(questions) * 5.0
        + ln1p_count(favorites) * 5.0
}

/// 趋势评分
///
/// `growth` 为速度评分相对上一快照的百分比变化
pub fn trend_score(velocity_score: f64, rating: Option<f64>, growth: f64) -> f64 {
    let velocity_part = ((velocity_score.max(0.0) + 1.0).ln() * 5.0).min(100.0);
    let rating_part = (rating.unwrap_or(3.0) - 1.0) * 25.0;
    velocity_part * 0.4 + rating_part * 0.3 + growth.min(100.0) * 0.3
}

/// 基于上一快照的时间序列指标
#[derive(Debug, Clone, Copy, PartialEq, Default)]
pub struct TimeSeriesMetrics {
    pub sales_velocity: Option<f64>,
    pub demand_acceleration: Option<f64>,
    pub trend_direction: i16,
}

/// 计算销售速度、需求加速度和趋势方向
///
/// 没有上一快照或时间差不为正时视为首个快照。趋势方向以上一速度的 ±10% 为死区。
pub fn time_series_metrics(
    previous: Option<&MetricSnapshot>,
    recorded_at: DateTime<FixedOffset>,
    cart_count: i64,
) -> TimeSeriesMetrics {
    let Some(previous) = previous else {
        return TimeSeriesMetrics::default();
    };

    let hours = (recorded_at - previous.recorded_at).num_milliseconds() as f64 / 3_600_000.0;
    if hours <= 0.0 {
        return TimeSeriesMetrics::default();
    }

    let velocity = (cart_count - previous.cart_count) as f64 / hours;
    let previous_velocity = previous.sales_velocity.unwrap_or(0.0);

    let trend_direction = if velocity > previous_velocity * 1.1 {
        1
    } else if velocity < previous_velocity * 0.9 {
        -1
    } else {
        0
    };

    TimeSeriesMetrics {
        sales_velocity: Some(velocity),
        demand_acceleration: Some(velocity - previous_velocity),
        trend_direction,
    }
}

/// 组装一次抓取对应的新快照
pub fn build_snapshot(
    product_id: i32,
    scraped: &ScrapedProduct,
    previous: Option<&MetricSnapshot>,
    listing_rank: Option<i32>,
    recorded_at: DateTime<FixedOffset>,
    weights: &VelocityWeights,
) -> NewMetricSnapshot {
    let velocity = velocity_score(scraped.cart_count, scraped.favorites, scraped.views, weights);
    let growth = previous
        .and_then(|prev| price_change(Some(prev.velocity_score), Some(velocity)))
        .unwrap_or(0.0);
    let series = time_series_metrics(previous, recorded_at, scraped.cart_count);

    NewMetricSnapshot {
        product_id,
        recorded_at,
        price: scraped.price,
        discounted_price: scraped.discounted_price,
        discount_rate: discount_rate(scraped.price, scraped.discounted_price),
        rating: scraped.rating,
        rating_count: scraped.rating_count,
        question_count: scraped.question_count,
        favorites: scraped.favorites,
        cart_count: scraped.cart_count,
        views: scraped.views,
        listing_rank,
        velocity_score: velocity,
        engagement_score: engagement_score(
            scraped.rating,
            scraped.rating_count,
            scraped.question_count,
            scraped.favorites,
        ),
        trend_score: trend_score(velocity, scraped.rating, growth),
        sales_velocity: series.sales_velocity,
        demand_acceleration: series.demand_acceleration,
        trend_direction: series.trend_direction,
    }
}

/// 计算写回商品行的汇总值
///
/// 平均销售速度取 `(旧值 + 新值) / 2`，首个值直接采用
pub fn rollup(product: &Product, snapshot: &NewMetricSnapshot) -> ProductRollup {
    let avg_sales_velocity = match (product.avg_sales_velocity, snapshot.sales_velocity) {
        (Some(old), Some(new)) => Some((old + new) / 2.0),
        (None, Some(new)) => Some(new),
        (old, None) => old,
    };

    ProductRollup {
        last_price: snapshot.discounted_price.or(snapshot.price),
        last_discount_rate: snapshot.discount_rate,
        last_engagement_score: Some(snapshot.engagement_score),
        avg_sales_velocity,
    }
}

#[cfg(test)]
#[path = "metrics_service_test.rs"]
mod tests;
