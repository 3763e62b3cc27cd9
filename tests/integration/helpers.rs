// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use async_trait::async_trait;
use pricepulse::config::settings::DatabaseSettings;
use pricepulse::domain::models::task::{NewTask, Task};
use pricepulse::domain::repositories::task_repository::TaskRepository;
use pricepulse::engines::parser::visible_text;
use pricepulse::engines::traits::{Capture, EngineError, FetchedPage, FetcherFactory, PageFetcher};
use pricepulse::infrastructure::database::connection;
use pricepulse::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use sea_orm::DatabaseConnection;
use std::collections::HashMap;
use std::sync::{Arc, Mutex};

/// 单连接的内存SQLite，已执行全部迁移
pub async fn setup_db() -> Arc<DatabaseConnection> {
    let settings = DatabaseSettings {
        url: "sqlite::memory:".to_string(),
        max_connections: Some(1),
        min_connections: Some(1),
        connect_timeout: Some(10),
        idle_timeout: None,
        sqlx_logging: false,
    };
    Arc::new(
        connection::connect_and_migrate(&settings)
            .await
            .expect("Failed to set up test database"),
    )
}

pub async fn create_task(db: &Arc<DatabaseConnection>, name: &str, url: &str) -> Task {
    TaskRepositoryImpl::new(db.clone())
        .create(&NewTask::new(name, "trendyol", url))
        .await
        .expect("Failed to create task")
}

#[derive(Default)]
struct SiteState {
    /// URL -> 依次返回的页面，最后一个重复返回
    pages: HashMap<String, Vec<String>>,
    served: HashMap<String, usize>,
    requests: Vec<String>,
    resets: u32,
    /// 为 true 时无法创建新会话
    offline: bool,
}

/// 脚本化站点
///
/// 所有由它创建的会话共享同一份状态，便于断言请求次数和会话重建次数
#[derive(Clone, Default)]
pub struct ScriptedSite {
    state: Arc<Mutex<SiteState>>,
}

impl ScriptedSite {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn page(&self, url: &str, html: impl Into<String>) {
        self.state
            .lock()
            .unwrap()
            .pages
            .entry(url.to_string())
            .or_default()
            .push(html.into());
    }

    pub fn go_offline(&self) {
        self.state.lock().unwrap().offline = true;
    }

    pub fn requests_for(&self, url: &str) -> usize {
        self.state
            .lock()
            .unwrap()
            .requests
            .iter()
            .filter(|u| *u == url)
            .count()
    }

    pub fn resets(&self) -> u32 {
        self.state.lock().unwrap().resets
    }

    fn serve(&self, url: &str) -> Option<String> {
        let mut state = self.state.lock().unwrap();
        state.requests.push(url.to_string());
        let responses = state.pages.get(url)?.clone();
        let served = state.served.entry(url.to_string()).or_insert(0);
        let html = responses[(*served).min(responses.len() - 1)].clone();
        *served += 1;
        Some(html)
    }
}

pub struct ScriptedFetcher {
    site: ScriptedSite,
    last_html: Option<String>,
}

#[async_trait]
impl PageFetcher for ScriptedFetcher {
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, EngineError> {
        let html = self
            .site
            .serve(url)
            .ok_or_else(|| EngineError::Other(format!("no page for {}", url)))?;
        self.last_html = Some(html.clone());
        Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url: url.to_string(),
            status: 200,
            text: visible_text(&html),
            html,
        })
    }

    async fn reset_session(&mut self) -> Result<(), EngineError> {
        self.site.state.lock().unwrap().resets += 1;
        self.last_html = None;
        Ok(())
    }

    async fn capture(&mut self) -> Option<Capture> {
        self.last_html.as_ref().map(|html| Capture {
            bytes: html.as_bytes().to_vec(),
            extension: "html",
        })
    }

    fn name(&self) -> &'static str {
        "scripted"
    }
}

#[async_trait]
impl FetcherFactory for ScriptedSite {
    async fn create(&self) -> Result<Box<dyn PageFetcher>, EngineError> {
        if self.state.lock().unwrap().offline {
            return Err(EngineError::Browser("browser could not be launched".to_string()));
        }
        Ok(Box::new(ScriptedFetcher {
            site: self.clone(),
            last_html: None,
        }))
    }
}

/// 列表页，每个链接一张商品卡片
pub fn listing_html(links: &[String]) -> String {
    let cards: String = links
        .iter()
        .map(|link| format!(r#"<div class="p-card-wrppr"><a href="{}">urun</a></div>"#, link))
        .collect();
    format!("<html><body><div class=\"prdct-cntnr\">{}</div></body></html>", cards)
}

/// 详情页
pub fn product_html(name: &str, price: &str, cart: &str) -> String {
    format!(
        r#"<html><body>
            <h1 class="pr-new-br"><a>Marka</a> <span>{}</span></h1>
            <span class="prc-dsc">{}</span>
            <div class="rating-line-count">4,5</div>
            <div class="total-review-count">120 Değerlendirme</div>
            <div class="social-proof-content">
                <span class="social-proof-item-focused-text">{}</span> kişinin sepetinde
            </div>
        </body></html>"#,
        name, price, cart
    )
}

/// 某个平台上的商品URL
pub fn product_url(id: u32) -> String {
    format!("https://www.trendyol.com/marka/kulaklik-p-{}", id)
}
