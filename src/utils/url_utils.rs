// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use once_cell::sync::Lazy;
use regex::Regex;
use url::{ParseError, Url};

/// 列表页分页参数名
pub const PAGE_PARAM: &str = "pi";

static CATEGORY_SUFFIX: Lazy<Regex> = Lazy::new(|| Regex::new(r"-x-c.*$").unwrap());

/// 构造指定页码的列表页URL
///
/// 去掉目标URL中已有的分页参数，再追加 `pi={page}`
///
/// # 参数
///
/// * `target_url` - 任务的列表/搜索URL
/// * `page` - 页码（从1开始）
pub fn build_page_url(target_url: &str, page: u32) -> Result<String, ParseError> {
    let mut url = Url::parse(target_url)?;
    let kept: Vec<(String, String)> = url
        .query_pairs()
        .filter(|(key, _)| key != PAGE_PARAM)
        .map(|(key, value)| (key.into_owned(), value.into_owned()))
        .collect();

    url.query_pairs_mut()
        .clear()
        .extend_pairs(kept)
        .append_pair(PAGE_PARAM, &page.to_string());

    Ok(url.to_string())
}

/// 读取URL中的分页参数
pub fn page_param(url: &Url) -> Option<String> {
    url.query_pairs()
        .find(|(key, _)| key == PAGE_PARAM)
        .map(|(_, value)| value.into_owned())
}

/// 从目标URL中提取关键词
///
/// 优先取 `q`（搜索）或 `k` 参数；否则取路径最后一段，去掉 `-x-c…` 类目后缀并把 `-` 换成空格。
/// 无法解析时原样返回。
pub fn extract_keyword(target_url: &str) -> String {
    let Ok(url) = Url::parse(target_url) else {
        return target_url.to_string();
    };

    for wanted in ["q", "k"] {
        if let Some((_, value)) = url.query_pairs().find(|(key, _)| key == wanted) {
            return value.replace('+', " ").trim().to_string();
        }
    }

    match url
        .path_segments()
        .and_then(|segments| segments.filter(|s| !s.is_empty()).last())
    {
        Some(last) => CATEGORY_SUFFIX.replace(last, "").replace('-', " "),
        None => target_url.to_string(),
    }
}

/// 判断URL是否为单个商品详情页
pub fn is_product_url(url: &str, product_marker: &str) -> bool {
    url.contains(product_marker)
}

/// 按平台ID模式从商品URL中提取商品编号
pub fn extract_product_code(url: &str, pattern: &Regex) -> Option<String> {
    pattern
        .captures(url)
        .and_then(|caps| caps.get(1))
        .map(|m| m.as_str().to_string())
}
