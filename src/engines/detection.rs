// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::engines::traits::FetchedPage;
use crate::utils::url_utils::page_param;
use url::Url;

/// 页面检查结果
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum PageVerdict {
    /// 页面可用
    Usable,
    /// 命中拦截标记
    Blocked(String),
    /// 被重定向到其他页面
    Redirected { requested: String, landed: String },
    /// HTTP错误状态
    HttpError(u16),
}

impl PageVerdict {
    pub fn is_usable(&self) -> bool {
        matches!(self, PageVerdict::Usable)
    }

    /// 用于日志和运行记录的简短描述
    pub fn describe(&self) -> String {
        match self {
            PageVerdict::Usable => "usable".to_string(),
            PageVerdict::Blocked(marker) => format!("blocked page: {}", marker),
            PageVerdict::Redirected { requested, landed } => {
                format!("redirected from {} to {}", requested, landed)
            }
            PageVerdict::HttpError(status) => format!("http status {}", status),
        }
    }
}

/// 查找页面文本中的拦截标记
pub fn find_block_marker<'a>(text: &str, markers: &'a [String]) -> Option<&'a str> {
    markers
        .iter()
        .map(String::as_str)
        .find(|marker| text.contains(marker))
}

/// 判断最终URL是否偏离了请求的URL
///
/// 主机、路径或分页参数任一不同即视为重定向；无法解析的URL按字符串比较
pub fn is_redirected(requested: &str, landed: &str) -> bool {
    match (Url::parse(requested), Url::parse(landed)) {
        (Ok(requested), Ok(landed)) => {
            requested.host_str() != landed.host_str()
                || requested.path().trim_end_matches('/') != landed.path().trim_end_matches('/')
                || page_param(&requested) != page_param(&landed)
        }
        _ => requested != landed,
    }
}

/// 检查抓取结果是否可用
///
/// # 参数
///
/// * `page` - 抓取结果
/// * `markers` - 拦截页面标记
///
/// # 返回值
///
/// 页面检查结果，依次检查状态码、拦截标记和重定向
pub fn inspect(page: &FetchedPage, markers: &[String]) -> PageVerdict {
    if page.status >= 400 {
        return PageVerdict::HttpError(page.status);
    }
    if let Some(marker) = find_block_marker(&page.text, markers) {
        return PageVerdict::Blocked(marker.to_string());
    }
    if is_redirected(&page.requested_url, &page.final_url) {
        return PageVerdict::Redirected {
            requested: page.requested_url.clone(),
            landed: page.final_url.clone(),
        };
    }
    PageVerdict::Usable
}
