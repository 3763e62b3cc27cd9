// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::FetcherSettings;
use crate::engines::parser::visible_text;
use crate::engines::traits::{Capture, EngineError, FetchedPage, FetcherFactory, PageFetcher};
use async_trait::async_trait;
use chromiumoxide::cdp::browser_protocol::page::CaptureScreenshotFormat;
use chromiumoxide::page::ScreenshotParams;
use chromiumoxide::{Browser, BrowserConfig, Page};
use futures::StreamExt;
use std::time::Duration;
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

/// 浏览器启动参数
#[derive(Debug, Clone)]
pub struct BrowserOptions {
    pub headless: bool,
    pub user_agent: String,
    pub timeout: Duration,
    pub chrome_executable: Option<String>,
}

impl From<&FetcherSettings> for BrowserOptions {
    fn from(settings: &FetcherSettings) -> Self {
        Self {
            headless: settings.headless,
            user_agent: settings.user_agent.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
            chrome_executable: settings.chrome_executable.clone(),
        }
    }
}

struct Session {
    browser: Browser,
    handler: JoinHandle<()>,
    page: Page,
}

impl Session {
    async fn launch(options: &BrowserOptions) -> Result<Self, EngineError> {
        let mut builder = BrowserConfig::builder()
            .no_sandbox()
            .request_timeout(options.timeout)
            .arg("--disable-gpu")
            .arg("--disable-dev-shm-usage")
            .arg("--disable-blink-features=AutomationControlled");

        if !options.headless {
            builder = builder.with_head();
        }
        if let Some(path) = &options.chrome_executable {
            builder = builder.chrome_executable(path);
        }

        let config = builder.build().map_err(EngineError::Browser)?;
        let (browser, mut handler) = Browser::launch(config)
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        // Spawn a handler to process browser events
        let handler = tokio::spawn(async move {
            while let Some(event) = handler.next().await {
                if event.is_err() {
                    break;
                }
            }
        });

        let page = browser
            .new_page("about:blank")
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;
        page.set_user_agent(options.user_agent.as_str())
            .await
            .map_err(|e| EngineError::Browser(e.to_string()))?;

        info!("Browser session launched");
        Ok(Self {
            browser,
            handler,
            page,
        })
    }

    async fn close(mut self) {
        if let Err(e) = self.browser.close().await {
            warn!("Failed to close browser: {}", e);
        }
        let _ = self.browser.wait().await;
        self.handler.abort();
    }
}

/// 浏览器抓取会话
///
/// 每个实例拥有独立的无头Chromium进程，重置会话时重启浏览器
pub struct BrowserFetcher {
    options: BrowserOptions,
    session: Option<Session>,
}

impl BrowserFetcher {
    /// 启动浏览器并创建抓取会话
    pub async fn launch(options: BrowserOptions) -> Result<Self, EngineError> {
        let session = Session::launch(&options).await?;
        Ok(Self {
            options,
            session: Some(session),
        })
    }

    async fn session(&mut self) -> Result<&Session, EngineError> {
        if self.session.is_none() {
            self.session = Some(Session::launch(&self.options).await?);
        }
        self.session
            .as_ref()
            .ok_or_else(|| EngineError::Browser("browser session unavailable".to_string()))
    }
}

#[async_trait]
impl PageFetcher for BrowserFetcher {
    /// 导航到目标页面并读取渲染后的HTML
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchedPage)` - 抓取结果，状态码固定为200
    /// * `Err(EngineError)` - 浏览器错误或超时
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, EngineError> {
        let timeout = self.options.timeout;
        let page = self.session().await?.page.clone();

        tokio::time::timeout(timeout, async {
            page.goto(url)
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;

            // Nudge lazy-loaded content
            if let Err(e) = page.evaluate("window.scrollBy(0, 500);").await {
                debug!("Scroll failed on {}: {}", url, e);
            }

            let final_url = page
                .url()
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?
                .unwrap_or_else(|| url.to_string());
            let html = page
                .content()
                .await
                .map_err(|e| EngineError::Browser(e.to_string()))?;
            let text = visible_text(&html);

            Ok(FetchedPage {
                requested_url: url.to_string(),
                final_url,
                status: 200, // chromiumoxide does not expose the navigation response here
                html,
                text,
            })
        })
        .await
        .map_err(|_| EngineError::Timeout)?
    }

    async fn reset_session(&mut self) -> Result<(), EngineError> {
        if let Some(session) = self.session.take() {
            session.close().await;
        }
        self.session = Some(Session::launch(&self.options).await?);
        Ok(())
    }

    async fn capture(&mut self) -> Option<Capture> {
        let session = self.session.as_ref()?;
        let params = ScreenshotParams::builder()
            .format(CaptureScreenshotFormat::Png)
            .full_page(true)
            .build();

        match session.page.screenshot(params).await {
            Ok(bytes) => Some(Capture {
                bytes,
                extension: "png",
            }),
            Err(e) => {
                warn!("Page screenshot failed: {}", e);
                None
            }
        }
    }

    fn name(&self) -> &'static str {
        "browser"
    }
}

impl Drop for BrowserFetcher {
    fn drop(&mut self) {
        if let Some(session) = &self.session {
            session.handler.abort();
        }
    }
}

/// 浏览器抓取会话工厂
pub struct BrowserFetcherFactory {
    options: BrowserOptions,
}

impl BrowserFetcherFactory {
    pub fn new(settings: &FetcherSettings) -> Self {
        Self {
            options: BrowserOptions::from(settings),
        }
    }
}

#[async_trait]
impl FetcherFactory for BrowserFetcherFactory {
    async fn create(&self) -> Result<Box<dyn PageFetcher>, EngineError> {
        Ok(Box::new(BrowserFetcher::launch(self.options.clone()).await?))
    }
}
