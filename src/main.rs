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

use anyhow::Context;
use clap::{Parser, Subcommand};
use pricepulse::config::settings::Settings;
use pricepulse::domain::models::task::NewTask;
use pricepulse::domain::repositories::task_repository::TaskRepository;
use pricepulse::engines::create_fetcher_factory;
use pricepulse::engines::parser::{PageParser, SelectorConfig};
use pricepulse::infrastructure::database::connection;
use pricepulse::infrastructure::metrics;
use pricepulse::infrastructure::repositories::product_repo_impl::ProductRepositoryImpl;
use pricepulse::infrastructure::repositories::queue_repo_impl::QueueRepositoryImpl;
use pricepulse::infrastructure::repositories::run_log_repo_impl::RunLogRepositoryImpl;
use pricepulse::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
use pricepulse::infrastructure::storage::create_storage_repository;
use pricepulse::queue::harvest_queue::HarvestQueue;
use pricepulse::queue::scheduler::ShiftScheduler;
use pricepulse::supervisor::{BotControl, BotStatus, BotSupervisor, StartOutcome};
use pricepulse::utils::telemetry;
use pricepulse::workers::task_runner::{RunnerDeps, TaskRunner};
use sea_orm::DatabaseConnection;
use std::sync::Arc;
use tracing::info;

const SEED_TASK_NAME: &str = "Kablosuz Kulaklık";
const SEED_TASK_URL: &str = "https://www.trendyol.com/sr?q=kablosuz%20kulakl%C4%B1k";

/// 商品价格与热度采集系统
#[derive(Parser)]
#[command(name = "pricepulse", version, about = "Shift-scheduled product harvesting and metric tracking")]
struct Cli {
    /// 输出JSON格式日志
    #[arg(long, global = true)]
    json_logs: bool,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// 运行班次调度器（前台常驻）
    Scheduler,

    /// 执行一次任务运行（由调度器在子进程中调用）
    Run {
        #[arg(long)]
        task_id: i32,
        /// 覆盖任务的目标URL
        #[arg(long)]
        url: Option<String>,
    },

    /// 启动任务的采集进程
    Start {
        #[arg(long)]
        task_id: i32,
        /// 允许在班次外运行
        #[arg(long)]
        force: bool,
    },

    /// 停止任务的采集进程
    Stop {
        #[arg(long)]
        task_id: i32,
    },

    /// 查看任务的采集进程状态
    Status {
        #[arg(long)]
        task_id: i32,
    },

    /// 新建任务
    AddTask {
        #[arg(long)]
        name: String,
        #[arg(long)]
        url: String,
        #[arg(long, default_value = "trendyol")]
        platform: String,
        /// 班次开始时间 HH:MM
        #[arg(long)]
        start: Option<String>,
        /// 班次结束时间 HH:MM
        #[arg(long)]
        end: Option<String>,
        /// 两次运行的最小间隔（小时），0 表示不限制
        #[arg(long, default_value_t = 24)]
        interval_hours: i32,
        #[arg(long)]
        max_pages: Option<u32>,
        /// 创建为停用状态
        #[arg(long)]
        inactive: bool,
    },

    /// 任务表为空时写入一个默认任务
    Seed,

    /// 启用或停用任务
    SetActive {
        #[arg(long)]
        task_id: i32,
        #[arg(long, action = clap::ArgAction::Set)]
        active: bool,
    },

    /// 修改任务的班次窗口
    SetWindow {
        #[arg(long)]
        task_id: i32,
        #[arg(long)]
        start: Option<String>,
        #[arg(long)]
        end: Option<String>,
    },

    /// 列出全部任务
    Tasks,
}

/// 主函数
///
/// 应用程序入口点，解析命令行并分发到各子命令
#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let cli = Cli::parse();

    // 1. Initialize logging
    telemetry::init_telemetry(cli.json_logs);

    // 2. Load configuration
    let settings = Settings::new().context("failed to load configuration")?;
    metrics::init_metrics(&settings.metrics);

    // 3. Connect to database
    let db = Arc::new(
        connection::connect_and_migrate(&settings.database)
            .await
            .context("failed to open database")?,
    );
    let tasks: Arc<dyn TaskRepository> = Arc::new(TaskRepositoryImpl::new(db.clone()));

    match cli.command {
        Commands::Scheduler => run_scheduler(db, tasks, settings).await,
        Commands::Run { task_id, url } => run_task(db, tasks, settings, task_id, url).await,
        Commands::Start { task_id, force } => {
            let supervisor = BotSupervisor::new(&settings.supervisor);
            match supervisor.start_task(tasks.as_ref(), task_id, force).await? {
                StartOutcome::Started(pid) => println!("task {} started (pid {})", task_id, pid),
                StartOutcome::AlreadyRunning(pid) => println!("task {} already running (pid {})", task_id, pid),
            }
            Ok(())
        }
        Commands::Stop { task_id } => {
            let supervisor = BotSupervisor::new(&settings.supervisor);
            if supervisor.stop(task_id).await? {
                println!("task {} stopped", task_id);
            } else {
                println!("task {} was not running", task_id);
            }
            Ok(())
        }
        Commands::Status { task_id } => {
            let supervisor = BotSupervisor::new(&settings.supervisor);
            match supervisor.status(task_id).await? {
                BotStatus::Running(pid) => {
                    let forced = supervisor.is_forced(task_id).await?;
                    println!("task {} running (pid {}, force={})", task_id, pid, forced);
                }
                BotStatus::Stopped => println!("task {} stopped", task_id),
            }
            Ok(())
        }
        Commands::AddTask {
            name,
            url,
            platform,
            start,
            end,
            interval_hours,
            max_pages,
            inactive,
        } => {
            let mut task = NewTask::new(name, platform, url);
            if start.is_some() {
                task.start_time = start;
            }
            if end.is_some() {
                task.end_time = end;
            }
            task.scrape_interval_hours = interval_hours;
            task.is_active = !inactive;
            if let Some(max_pages) = max_pages {
                task.search_params = serde_json::json!({ "max_pages": max_pages });
            }
            let created = tasks.create(&task).await?;
            println!("created task {} ({})", created.id, created.name);
            Ok(())
        }
        Commands::Seed => {
            if tasks.count().await? > 0 {
                println!("tasks already present, nothing to seed");
                return Ok(());
            }
            let created = tasks
                .create(&NewTask::new(SEED_TASK_NAME, "trendyol", SEED_TASK_URL))
                .await?;
            println!("seeded task {} ({})", created.id, created.name);
            Ok(())
        }
        Commands::SetActive { task_id, active } => {
            tasks.set_active(task_id, active).await?;
            println!("task {} active={}", task_id, active);
            Ok(())
        }
        Commands::SetWindow { task_id, start, end } => {
            tasks.update_window(task_id, start, end).await?;
            println!("task {} window updated", task_id);
            Ok(())
        }
        Commands::Tasks => {
            for task in tasks.list().await? {
                println!(
                    "{:>4}  {:<24} active={:<5} {}-{}  {}",
                    task.id,
                    task.name,
                    task.is_active,
                    task.start_time.as_deref().unwrap_or(&settings.scheduler.default_start_time),
                    task.end_time.as_deref().unwrap_or(&settings.scheduler.default_end_time),
                    task.target_url
                );
            }
            Ok(())
        }
    }
}

async fn run_scheduler(
    db: Arc<DatabaseConnection>,
    tasks: Arc<dyn TaskRepository>,
    settings: Settings,
) -> anyhow::Result<()> {
    let queue = HarvestQueue::new(Arc::new(QueueRepositoryImpl::new(db)));
    let supervisor = Arc::new(BotSupervisor::new(&settings.supervisor));
    let scheduler = Arc::new(ShiftScheduler::new(
        tasks,
        supervisor,
        queue,
        settings.scheduler.clone(),
    ));

    info!("Scheduler started, polling every {}s", settings.scheduler.poll_interval_secs);
    let handle = scheduler.start();

    tokio::select! {
        result = handle => {
            result.context("scheduler loop panicked")?;
        }
        _ = tokio::signal::ctrl_c() => {
            info!("Shutdown signal received, bots keep running until their shift ends");
        }
    }
    Ok(())
}

async fn run_task(
    db: Arc<DatabaseConnection>,
    tasks: Arc<dyn TaskRepository>,
    settings: Settings,
    task_id: i32,
    url: Option<String>,
) -> anyhow::Result<()> {
    let selectors = SelectorConfig::load_or_default(settings.fetcher.selectors_path.as_deref())
        .context("failed to load selectors")?;
    let deps = RunnerDeps {
        tasks,
        products: Arc::new(ProductRepositoryImpl::new(db.clone())),
        run_logs: Arc::new(RunLogRepositoryImpl::new(db.clone())),
        storage: create_storage_repository(&settings.storage)?,
        queue: HarvestQueue::new(Arc::new(QueueRepositoryImpl::new(db))),
        parser: Arc::new(PageParser::new(&selectors)?),
        fetchers: create_fetcher_factory(&settings.fetcher)?,
    };

    let runner = TaskRunner::new(deps, settings);
    let outcome = runner.run(task_id, url.as_deref()).await?;
    info!(
        "Run {} {}: {:?} / {:?}",
        outcome.run_log_id, outcome.status, outcome.harvest, outcome.detail
    );
    Ok(())
}
