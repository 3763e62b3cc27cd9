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

use config::builder::DefaultState;
use config::{Config, ConfigBuilder, ConfigError, Environment, File};
use serde::Deserialize;

/// 应用程序配置设置
///
/// 包含数据库、调度器、进程监管、链接采集、详情抓取、页面获取、评分、存储和指标等配置项
#[derive(Debug, Clone, Deserialize)]
pub struct Settings {
    /// 数据库配置
    pub database: DatabaseSettings,
    /// 班次调度器配置
    pub scheduler: SchedulerSettings,
    /// 进程监管配置
    pub supervisor: SupervisorSettings,
    /// 链接采集配置
    pub harvester: HarvesterSettings,
    /// 详情抓取配置
    pub worker: WorkerSettings,
    /// 页面获取配置
    pub fetcher: FetcherSettings,
    /// 评分权重配置
    pub scoring: ScoringSettings,
    /// 存储配置
    pub storage: StorageSettings,
    /// 指标导出配置
    pub metrics: MetricsSettings,
}

/// 数据库配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseSettings {
    /// 数据库连接URL
    pub url: String,
    /// 最大连接数
    pub max_connections: Option<u32>,
    /// 最小连接数
    pub min_connections: Option<u32>,
    /// 连接超时时间（秒）
    pub connect_timeout: Option<u64>,
    /// 空闲连接超时时间（秒）
    pub idle_timeout: Option<u64>,
    /// 是否输出 SQL 日志
    pub sqlx_logging: bool,
}

/// 班次调度器配置
#[derive(Debug, Clone, Deserialize)]
pub struct SchedulerSettings {
    /// 轮询间隔（秒）
    pub poll_interval_secs: u64,
    /// processing 状态条目被视为卡死的时长（秒）
    pub stale_claim_timeout_secs: u64,
    /// 任务未配置时的默认班次开始时间 (HH:MM)
    pub default_start_time: String,
    /// 任务未配置时的默认班次结束时间 (HH:MM)
    pub default_end_time: String,
}

/// 进程监管配置
#[derive(Debug, Clone, Deserialize)]
pub struct SupervisorSettings {
    /// PID 标记、强制标记和日志文件所在目录
    pub run_dir: String,
    /// 机器人可执行文件，缺省为当前可执行文件
    pub program: Option<String>,
    /// 用于识别机器人进程的进程名，缺省取可执行文件名
    pub process_name: Option<String>,
}

/// 链接采集配置
#[derive(Debug, Clone, Deserialize)]
pub struct HarvesterSettings {
    /// 任务未指定 max_pages 时的默认页数上限
    pub default_max_pages: u32,
    /// 每隔多少页刷新一次会话，0 表示不刷新
    pub session_refresh_pages: u32,
    /// 翻页最小间隔（毫秒）
    pub page_delay_min_ms: u64,
    /// 翻页最大间隔（毫秒）
    pub page_delay_max_ms: u64,
    /// 陈旧页重试前的等待（毫秒）
    pub stale_retry_delay_ms: u64,
}

/// 详情抓取配置
#[derive(Debug, Clone, Deserialize)]
pub struct WorkerSettings {
    /// 连续空轮询次数上限，达到后退出
    pub max_empty_polls: u32,
    /// 空轮询间隔（毫秒）
    pub poll_interval_ms: u64,
    /// 每个条目之间的等待（毫秒）
    pub request_delay_ms: u64,
}

/// 页面获取配置
#[derive(Debug, Clone, Deserialize)]
pub struct FetcherSettings {
    /// 引擎类型 (browser, http)
    pub engine: String,
    /// 浏览器是否无头运行
    pub headless: bool,
    /// 请求使用的 User-Agent
    pub user_agent: String,
    /// 单次请求超时（秒）
    pub request_timeout_secs: u64,
    /// 选择器配置文件 (YAML)，缺省使用内置选择器
    pub selectors_path: Option<String>,
    /// Chromium 可执行文件路径
    pub chrome_executable: Option<String>,
}

/// 评分权重配置
#[derive(Debug, Clone, Deserialize)]
pub struct ScoringSettings {
    /// 加购权重
    pub cart_weight: f64,
    /// 收藏权重
    pub favorite_weight: f64,
    /// 浏览权重
    pub view_weight: f64,
    /// 是否使用 ln(x+1) 缩放
    pub log_scale: bool,
}

/// 存储配置设置
#[derive(Debug, Clone, Deserialize)]
pub struct StorageSettings {
    /// 存储类型 (local, memory)
    pub storage_type: String,
    /// 本地存储路径 (当 type=local 时使用)
    pub local_path: Option<String>,
}

/// 指标导出配置
#[derive(Debug, Clone, Deserialize)]
pub struct MetricsSettings {
    /// 是否启动 Prometheus 导出器
    pub enabled: bool,
    /// 导出器监听地址
    pub listen_addr: String,
}

impl Settings {
    /// 创建新的配置实例
    ///
    /// 依次叠加内置默认值、`config/default`、`config/{APP_ENVIRONMENT}` 和
    /// `PRICEPULSE__` 前缀的环境变量
    ///
    /// # Returns
    ///
    /// * `Ok(Settings)` - 成功加载的配置
    /// * `Err(ConfigError)` - 配置加载失败
    pub fn new() -> Result<Self, ConfigError> {
        let env = std::env::var("APP_ENVIRONMENT").unwrap_or_else(|_| "default".to_string());
        Self::builder()?
            .add_source(File::with_name("config/default").required(false))
            .add_source(File::with_name(&format!("config/{}", env)).required(false))
            .add_source(Environment::with_prefix("PRICEPULSE").separator("__"))
            .build()?
            .try_deserialize()
    }

    /// 仅包含内置默认值的配置构建器
    pub fn builder() -> Result<ConfigBuilder<DefaultState>, ConfigError> {
        Config::builder()
            // Database
            .set_default("database.url", "sqlite://pricepulse.db?mode=rwc")?
            .set_default("database.max_connections", 10)?
            .set_default("database.min_connections", 1)?
            .set_default("database.connect_timeout", 10)?
            .set_default("database.idle_timeout", 300)?
            .set_default("database.sqlx_logging", false)?
            // Scheduler
            .set_default("scheduler.poll_interval_secs", 30)?
            .set_default("scheduler.stale_claim_timeout_secs", 1800)?
            .set_default("scheduler.default_start_time", "09:00")?
            .set_default("scheduler.default_end_time", "18:00")?
            // Supervisor
            .set_default("supervisor.run_dir", "./run")?
            // Harvester
            .set_default("harvester.default_max_pages", 5)?
            .set_default("harvester.session_refresh_pages", 20)?
            .set_default("harvester.page_delay_min_ms", 1200)?
            .set_default("harvester.page_delay_max_ms", 2400)?
            .set_default("harvester.stale_retry_delay_ms", 2000)?
            // Worker
            .set_default("worker.max_empty_polls", 10)?
            .set_default("worker.poll_interval_ms", 2000)?
            .set_default("worker.request_delay_ms", 2000)?
            // Fetcher
            .set_default("fetcher.engine", "browser")?
            .set_default("fetcher.headless", true)?
            .set_default(
                "fetcher.user_agent",
                "Mozilla/5.0 (Windows NT 10.0; Win64; x64) AppleWebKit/537.36 (KHTML, like Gecko) Chrome/124.0 Safari/537.36",
            )?
            .set_default("fetcher.request_timeout_secs", 60)?
            // Scoring
            .set_default("scoring.cart_weight", 3.0)?
            .set_default("scoring.favorite_weight", 2.0)?
            .set_default("scoring.view_weight", 1.0)?
            .set_default("scoring.log_scale", true)?
            // Storage
            .set_default("storage.storage_type", "local")?
            .set_default("storage.local_path", "./diagnostics")?
            // Metrics
            .set_default("metrics.enabled", false)?
            .set_default("metrics.listen_addr", "0.0.0.0:9000")
    }
}

#[cfg(test)]
#[path = "settings_test.rs"]
mod tests;
