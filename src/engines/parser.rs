// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::RawProductFields;
use regex::Regex;
use scraper::{ElementRef, Html, Selector};
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::path::Path;
use thiserror::Error;
use tracing::{debug, warn};
use url::Url;

/// 页面解析错误
#[derive(Error, Debug)]
pub enum ParserError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Invalid selector file: {0}")]
    Yaml(#[from] serde_yaml::Error),
    #[error("Invalid selector `{0}`")]
    Selector(String),
    #[error("Invalid pattern: {0}")]
    Pattern(#[from] regex::Error),
    #[error("Invalid base url: {0}")]
    BaseUrl(#[from] url::ParseError),
}

/// 平台选择器配置
///
/// 可从YAML文件加载，缺省字段使用内置默认值
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SelectorConfig {
    /// 站点根地址，用于补全相对链接
    pub base_url: String,
    /// 从商品URL中提取商品编号的正则（第一个捕获组）
    pub product_id_pattern: String,
    /// 拦截页面标记文本
    pub block_markers: Vec<String>,
    pub listing: ListingSelectors,
    pub product: ProductSelectors,
    pub social_proof: SocialProofSelectors,
}

/// 列表页选择器
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ListingSelectors {
    /// 商品卡片链接选择器，按顺序尝试，命中即停止
    pub product_card: Vec<String>,
    /// 商品链接必须包含的标记
    pub product_link_contains: String,
}

/// 价格选择器对
#[derive(Debug, Clone, Deserialize, Serialize)]
pub struct PriceSelector {
    /// 售价（折后）
    pub price: String,
    /// 原价
    #[serde(default)]
    pub original: Option<String>,
}

/// 详情页选择器
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct ProductSelectors {
    pub name: Vec<String>,
    pub brand: Vec<String>,
    pub prices: Vec<PriceSelector>,
    pub rating: Vec<String>,
    pub review_count: Vec<String>,
    pub question_count: Vec<String>,
    pub image: Vec<String>,
    /// 推荐区块等容器，其中的价格和计数不属于当前商品
    pub excluded_containers: Vec<String>,
}

/// 社交证明（收藏、加购、浏览）选择器
#[derive(Debug, Clone, Deserialize, Serialize)]
#[serde(default)]
pub struct SocialProofSelectors {
    pub container: String,
    pub focused_text: String,
    pub favorites_keywords: Vec<String>,
    pub cart_keywords: Vec<String>,
    pub views_keywords: Vec<String>,
}

fn strings(items: &[&str]) -> Vec<String> {
    items.iter().map(|s| s.to_string()).collect()
}

impl Default for SelectorConfig {
    fn default() -> Self {
        Self {
            base_url: "https://www.trendyol.com".to_string(),
            product_id_pattern: r"-p-(\d+)".to_string(),
            block_markers: strings(&[
                "İlgili Sonuç Bulunamadı",
                "Aradığınız sayfayı bulamadık",
                "Robot olmadığını doğrula",
            ]),
            listing: ListingSelectors::default(),
            product: ProductSelectors::default(),
            social_proof: SocialProofSelectors::default(),
        }
    }
}

impl Default for ListingSelectors {
    fn default() -> Self {
        Self {
            product_card: strings(&[
                "div.p-card-wrppr a",
                "div.prdct-cntnr-wrppr a",
                "a.product-card",
            ]),
            product_link_contains: "-p-".to_string(),
        }
    }
}

impl Default for ProductSelectors {
    fn default() -> Self {
        let pair = |price: &str, original: Option<&str>| PriceSelector {
            price: price.to_string(),
            original: original.map(str::to_string),
        };
        Self {
            name: strings(&["h1.pr-new-br span", "h1.product-title span", "h1.pr-new-br", "h1"]),
            brand: strings(&["h1.pr-new-br a", "h1.product-title a", ".product-brand-name-with-link"]),
            prices: vec![
                pair(".price-view .discounted", Some(".price-view .original")),
                pair(".ty-plus-price-discounted-price", Some(".ty-plus-price-original-price")),
                pair(".prc-dsc", Some(".prc-org")),
                pair(".discounted", Some(".original")),
                pair(".product-price", None),
            ],
            rating: strings(&[".rating-line-count", ".product-rating-score .value", ".rating-score"]),
            review_count: strings(&[".total-review-count", ".rvw-cnt-tx", ".reviews-summary-reviews-detail"]),
            question_count: strings(&[".answered-questions-count", ".questions-count"]),
            image: strings(&[".product-slide img", ".gallery-container img", ".base-product-image img"]),
            excluded_containers: strings(&[
                ".p-card-wrppr",
                ".product-card",
                ".widget-product",
                ".recommendation-box",
                ".carousel",
                ".reco-slider",
            ]),
        }
    }
}

impl Default for SocialProofSelectors {
    fn default() -> Self {
        Self {
            container: ".social-proof-content".to_string(),
            focused_text: ".social-proof-item-focused-text".to_string(),
            favorites_keywords: strings(&["favori"]),
            cart_keywords: strings(&["sepet"]),
            views_keywords: strings(&["görüntü", "baktı"]),
        }
    }
}

impl SelectorConfig {
    /// 从YAML文本加载
    pub fn from_yaml_str(yaml: &str) -> Result<Self, ParserError> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// 从YAML文件加载
    pub fn load(path: impl AsRef<Path>) -> Result<Self, ParserError> {
        let content = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&content)
    }

    /// 有路径时从文件加载，否则使用默认值
    pub fn load_or_default(path: Option<&str>) -> Result<Self, ParserError> {
        match path {
            Some(path) => Self::load(path),
            None => Ok(Self::default()),
        }
    }
}

struct CompiledPrice {
    price: Selector,
    original: Option<Selector>,
}

/// 页面解析器
///
/// 持有预编译的选择器。`scraper::Html` 不能跨 await 持有，所以解析全部是同步的。
pub struct PageParser {
    base_url: Url,
    product_id_pattern: Regex,
    block_markers: Vec<String>,
    link_marker: String,
    cards: Vec<Selector>,
    name: Vec<Selector>,
    brand: Vec<Selector>,
    prices: Vec<CompiledPrice>,
    rating: Vec<Selector>,
    review_count: Vec<Selector>,
    question_count: Vec<Selector>,
    image: Vec<Selector>,
    excluded: Vec<Selector>,
    proof_container: Selector,
    proof_focused: Selector,
    favorites_keywords: Vec<String>,
    cart_keywords: Vec<String>,
    views_keywords: Vec<String>,
}

fn compile(selector: &str) -> Result<Selector, ParserError> {
    Selector::parse(selector).map_err(|_| ParserError::Selector(selector.to_string()))
}

fn compile_all(selectors: &[String]) -> Result<Vec<Selector>, ParserError> {
    selectors.iter().map(|s| compile(s)).collect()
}

fn element_text(element: ElementRef<'_>) -> String {
    element
        .text()
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .collect::<Vec<_>>()
        .join(" ")
}

impl PageParser {
    /// 编译选择器配置
    ///
    /// # 参数
    ///
    /// * `config` - 选择器配置
    ///
    /// # 返回值
    ///
    /// * `Ok(PageParser)` - 解析器
    /// * `Err(ParserError)` - 选择器、正则或根地址无效
    pub fn new(config: &SelectorConfig) -> Result<Self, ParserError> {
        let prices = config
            .product
            .prices
            .iter()
            .map(|pair| {
                Ok(CompiledPrice {
                    price: compile(&pair.price)?,
                    original: pair.original.as_deref().map(compile).transpose()?,
                })
            })
            .collect::<Result<Vec<_>, ParserError>>()?;

        Ok(Self {
            base_url: Url::parse(&config.base_url)?,
            product_id_pattern: Regex::new(&config.product_id_pattern)?,
            block_markers: config.block_markers.clone(),
            link_marker: config.listing.product_link_contains.clone(),
            cards: compile_all(&config.listing.product_card)?,
            name: compile_all(&config.product.name)?,
            brand: compile_all(&config.product.brand)?,
            prices,
            rating: compile_all(&config.product.rating)?,
            review_count: compile_all(&config.product.review_count)?,
            question_count: compile_all(&config.product.question_count)?,
            image: compile_all(&config.product.image)?,
            excluded: compile_all(&config.product.excluded_containers)?,
            proof_container: compile(&config.social_proof.container)?,
            proof_focused: compile(&config.social_proof.focused_text)?,
            favorites_keywords: config.social_proof.favorites_keywords.clone(),
            cart_keywords: config.social_proof.cart_keywords.clone(),
            views_keywords: config.social_proof.views_keywords.clone(),
        })
    }

    pub fn product_id_pattern(&self) -> &Regex {
        &self.product_id_pattern
    }

    pub fn block_markers(&self) -> &[String] {
        &self.block_markers
    }

    /// 商品链接标记（同时用于识别单商品目标URL）
    pub fn link_marker(&self) -> &str {
        &self.link_marker
    }

    /// 从列表页提取商品链接
    ///
    /// 按卡片选择器顺序尝试，第一个命中的选择器决定结果；链接按出现顺序去重并补全为绝对地址
    pub fn extract_links(&self, html: &str) -> Vec<String> {
        let document = Html::parse_document(html);
        let mut seen = HashSet::new();
        let mut links = Vec::new();

        for selector in &self.cards {
            for element in document.select(selector) {
                let Some(href) = element.value().attr("href") else {
                    continue;
                };
                if !href.contains(&self.link_marker) {
                    continue;
                }
                match self.base_url.join(href) {
                    Ok(url) => {
                        let url = url.to_string();
                        if seen.insert(url.clone()) {
                            links.push(url);
                        }
                    }
                    Err(e) => debug!("Skipping unparsable link {}: {}", href, e),
                }
            }
            if !links.is_empty() {
                break;
            }
        }

        links
    }

    fn is_excluded(&self, element: &ElementRef<'_>) -> bool {
        element
            .ancestors()
            .filter_map(ElementRef::wrap)
            .any(|ancestor| self.excluded.iter().any(|s| s.matches(&ancestor)))
    }

    fn first_text(&self, document: &Html, selectors: &[Selector]) -> Option<String> {
        selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    fn first_visible_text(&self, document: &Html, selectors: &[Selector]) -> Option<String> {
        selectors.iter().find_map(|selector| {
            document
                .select(selector)
                .filter(|el| !self.is_excluded(el))
                .map(element_text)
                .find(|text| !text.is_empty())
        })
    }

    /// 从详情页提取原始字段
    ///
    /// 只做文本定位，数值解析由领域层完成
    pub fn parse_product(&self, html: &str) -> RawProductFields {
        let document = Html::parse_document(html);
        let mut raw = RawProductFields {
            name: self.first_text(&document, &self.name),
            brand: self.first_text(&document, &self.brand),
            rating_text: self.first_visible_text(&document, &self.rating),
            review_count_text: self.first_visible_text(&document, &self.review_count),
            question_count_text: self.first_visible_text(&document, &self.question_count),
            ..Default::default()
        };

        for pair in &self.prices {
            let price = document
                .select(&pair.price)
                .filter(|el| !self.is_excluded(el))
                .map(element_text)
                .find(|text| !text.is_empty());
            if let Some(price) = price {
                raw.price_text = Some(price);
                raw.original_price_text = pair.original.as_ref().and_then(|original| {
                    document
                        .select(original)
                        .filter(|el| !self.is_excluded(el))
                        .map(element_text)
                        .find(|text| !text.is_empty())
                });
                break;
            }
        }

        for container in document.select(&self.proof_container) {
            if self.is_excluded(&container) {
                continue;
            }
            let full_text = element_text(container);
            let value = container
                .select(&self.proof_focused)
                .next()
                .map(element_text)
                .unwrap_or_else(|| full_text.clone());
            let lower = full_text.to_lowercase();
            let has = |keywords: &[String]| keywords.iter().any(|k| lower.contains(k.as_str()));

            if has(&self.favorites_keywords) {
                raw.favorites_text = Some(value);
            } else if has(&self.cart_keywords) {
                raw.cart_text = Some(value);
            } else if has(&self.views_keywords) {
                raw.views_text = Some(value);
            } else {
                warn!("Unrecognized social proof text: {}", full_text);
            }
        }

        raw.image_url = self.image.iter().find_map(|selector| {
            document.select(selector).find_map(|img| {
                let value = img.value();
                value
                    .attr("src")
                    .filter(|src| !src.starts_with("data:"))
                    .or_else(|| value.attr("data-src"))
                    .map(str::to_string)
            })
        });

        raw
    }
}

/// 提取页面可见文本（忽略 script/style/noscript）
pub fn visible_text(html: &str) -> String {
    let document = Html::parse_document(html);
    let mut out = String::new();

    for node in document.root_element().descendants() {
        let Some(text) = node.value().as_text() else {
            continue;
        };
        let hidden = node
            .parent()
            .and_then(|parent| {
                parent
                    .value()
                    .as_element()
                    .map(|el| matches!(el.name(), "script" | "style" | "noscript"))
            })
            .unwrap_or(false);
        if hidden {
            continue;
        }
        let text = text.trim();
        if !text.is_empty() {
            if !out.is_empty() {
                out.push(' ');
            }
            out.push_str(text);
        }
    }

    out
}

#[cfg(test)]
#[path = "parser_test.rs"]
mod tests;
