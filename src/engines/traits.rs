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

use async_trait::async_trait;
use thiserror::Error;

/// 引擎错误类型
#[derive(Error, Debug)]
pub enum EngineError {
    /// 请求失败
    #[error("Request failed: {0}")]
    RequestFailed(#[from] reqwest::Error),
    /// 浏览器操作失败
    #[error("Browser error: {0}")]
    Browser(String),
    /// 超时
    #[error("Timeout")]
    Timeout,
    /// 其他错误
    #[error("Other error: {0}")]
    Other(String),
}

impl EngineError {
    /// 判断错误是否可重试
    ///
    /// # 返回值
    ///
    /// 如果错误是可重试的则返回true，否则返回false
    pub fn is_retryable(&self) -> bool {
        match self {
            EngineError::RequestFailed(e) => {
                e.is_timeout() || e.is_connect() || e.status().is_some_and(|s| s.is_server_error())
            }
            EngineError::Timeout => true,
            EngineError::Browser(_) => true,
            EngineError::Other(_) => false,
        }
    }
}

/// 一次页面抓取的结果
#[derive(Debug, Clone)]
pub struct FetchedPage {
    /// 请求的URL
    pub requested_url: String,
    /// 跟随重定向后的最终URL
    pub final_url: String,
    /// HTTP状态码（浏览器引擎无法获取时为200）
    pub status: u16,
    /// 页面HTML
    pub html: String,
    /// 页面可见文本
    pub text: String,
}

/// 诊断快照
#[derive(Debug, Clone)]
pub struct Capture {
    /// 快照内容
    pub bytes: Vec<u8>,
    /// 文件扩展名（png、html）
    pub extension: &'static str,
}

/// 页面抓取会话
///
/// 每个实例拥有自己的会话（cookie、浏览器进程），链接采集器和详情工作器各持有一个
#[async_trait]
pub trait PageFetcher: Send {
    /// 抓取页面
    ///
    /// # 参数
    ///
    /// * `url` - 目标URL
    ///
    /// # 返回值
    ///
    /// * `Ok(FetchedPage)` - 抓取结果，包含最终URL和状态码
    /// * `Err(EngineError)` - 网络或浏览器错误
    async fn fetch(&mut self, url: &str) -> Result<FetchedPage, EngineError>;

    /// 丢弃当前会话并建立新会话
    async fn reset_session(&mut self) -> Result<(), EngineError>;

    /// 获取当前页面的诊断快照
    async fn capture(&mut self) -> Option<Capture>;

    /// 引擎名称
    fn name(&self) -> &'static str;
}

/// 抓取会话工厂
#[async_trait]
pub trait FetcherFactory: Send + Sync {
    /// 创建新的抓取会话
    async fn create(&self) -> Result<Box<dyn PageFetcher>, EngineError>;
}
