// Copyright 2025 Kirky.X
//
// Licensed under the Apache License, Version 2.0 (the "License");
// you may not use this file except in compliance with the License.
// You may obtain a copy of the License at
//
//     http://www.apache.org/licenses/LICENSE-2.0
//
// Unless required by applicable law or agreed to in writing, software
// distributed under the License is distributed on an "AS IS" BASIS,
// WITHOUT WARRANTIES OR CONDITIONS OF ANY KIND, either express or implied.
// See the License for the specific language governing permissions and
// limitations under the License.

use crate::config::settings::FetcherSettings;
use crate::engines::parser::visible_text;
use crate::engines::traits::{Capture, EngineError, FetchedPage, FetcherFactory, PageFetcher};
use async_trait::async_trait;
use std::time::Duration;
use tracing::debug;

/// HTTP抓取会话
///
/// 基于reqwest实现，启用cookie存储；重置会话时重建客户端以丢弃cookie
pub struct ReqwestFetcher {
    client: reqwest::Client,
    user_agent: String,
    timeout: Duration,
    last_html: Option<String>,
}

impl ReqwestFetcher {
    /// 创建抓取会话
    ///
    /// # 参数
    ///
    /// * `user_agent` - 请求使用的User-Agent
    /// * `timeout` - 单次请求超时
    pub fn new(user_agent: impl Into<String>, timeout: Duration) -> Result<Self, EngineError> {
        let user_agent = user_agent.into();
        let client = Self::build_client(&user_agent, timeout)?;
        Ok(Self {
            client,
            user_agent,
            timeout,
            last_html: None,
        })
    }

    fn build_client(user_agent: &str, timeout: Duration) -> Result<reqwest::Client, EngineError> {
        Ok(reqwest::Client::builder()
            .user_agent(user_agent)
            .timeout(timeout)
            .cookie_store(true)
            .build()?)
    }
}

#[async_trait]
impl PageFetcher for ReqwestFetcher {
    /// 执行HTTP抓取
    ///
    /// 4xx/5xx 不视为错误，状态码交给页面检查处理
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, EngineError> {
        let response = self.client.get(url).send().await.map_err(|e| {
            if e.is_timeout() {
                EngineError::Timeout
            } else {
                EngineError::RequestFailed(e)
            }
        })?;

        let status = response.status().as_u16();
        let final_url = response.url().to_string();
        let html = response.text().await?;
        let text = visible_text(&html);

        debug!("Fetched {} -> {} ({})", url, final_url, status);
        self.last_html = Some(html.clone());

        Ok(FetchedPage {
            requested_url: url.to_string(),
            final_url,
            status,
            html,
            text,
        })
    }

    async fn reset_session(&mut self) -> Result<(), EngineError> {
        self.client = Self::build_client(&self.user_agent, self.timeout)?;
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
        "reqwest"
    }
}

/// HTTP抓取会话工厂
pub struct ReqwestFetcherFactory {
    user_agent: String,
    timeout: Duration,
}

impl ReqwestFetcherFactory {
    pub fn new(settings: &FetcherSettings) -> Self {
        Self {
            user_agent: settings.user_agent.clone(),
            timeout: Duration::from_secs(settings.request_timeout_secs),
        }
    }
}

#[async_trait]
impl FetcherFactory for ReqwestFetcherFactory {
    async fn create(&self) -> Result<Box<dyn PageFetcher>, EngineError> {
        Ok(Box::new(ReqwestFetcher::new(
            self.user_agent.clone(),
            self.timeout,
        )?))
    }
}

#[cfg(test)]
#[path = "reqwest_engine_test.rs"]
mod tests;
