// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub mod browser_engine;
pub mod detection;
pub mod parser;
pub mod reqwest_engine;
pub mod traits;

use crate::config::settings::FetcherSettings;
use std::sync::Arc;
use traits::{EngineError, FetcherFactory};

/// 根据配置创建抓取会话工厂
///
/// 支持 `browser`（chromiumoxide）和 `http`（reqwest）
pub fn create_fetcher_factory(
    settings: &FetcherSettings,
) -> Result<Arc<dyn FetcherFactory>, EngineError> {
    match settings.engine.as_str() {
        "browser" => Ok(Arc::new(browser_engine::BrowserFetcherFactory::new(settings))),
        "http" | "reqwest" => Ok(Arc::new(reqwest_engine::ReqwestFetcherFactory::new(settings))),
        other => Err(EngineError::Other(format!("Unsupported fetch engine: {}", other))),
    }
}
