// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::config::settings::SchedulerSettings;
use crate::domain::models::task::{Task, WindowError};
use crate::domain::repositories::task_repository::{RepositoryError, TaskRepository};
use crate::infrastructure::metrics as names;
use crate::queue::harvest_queue::HarvestQueue;
use crate::supervisor::{BotControl, SupervisorError};
use chrono::{Local, NaiveTime};
use metrics::{counter, gauge};
use std::sync::Arc;
use thiserror::Error;
use tokio::task::JoinHandle;
use tokio::time::{interval, Duration as TokioDuration};
use tracing::{debug, error, info, warn};

/// 单个任务调度失败的原因
#[derive(Error, Debug)]
pub enum SchedulerError {
    #[error("Invalid shift window: {0}")]
    Window(#[from] WindowError),
    #[error("Supervisor error: {0}")]
    Supervisor(#[from] SupervisorError),
}

/// 对单个任务做出的决定
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Decision {
    Start,
    Stop,
    Keep,
}

/// 一次调度的结果汇总
#[derive(Debug, Default, Clone, PartialEq, Eq)]
pub struct TickReport {
    pub started: Vec<i32>,
    pub stopped: Vec<i32>,
    pub running: usize,
    pub failed: Vec<i32>,
    pub requeued: u64,
}

/// 根据任务状态和班次决定启停
///
/// 已停止的任务在班次内会被重新拉起；运行中的任务只会因班次结束（无强制标记）或被禁用而停止
pub fn decide(running: bool, enabled: bool, window_active: bool, forced: bool) -> Decision {
    let allowed = enabled && (window_active || forced);
    match (running, allowed) {
        (false, true) => Decision::Start,
        (true, false) => Decision::Stop,
        _ => Decision::Keep,
    }
}

/// 班次调度器
///
/// 每个周期检查所有任务，通过进程监管器启动或停止采集进程，并回收超时的队列认领
pub struct ShiftScheduler {
    tasks: Arc<dyn TaskRepository>,
    bots: Arc<dyn BotControl>,
    queue: HarvestQueue,
    settings: SchedulerSettings,
}

impl ShiftScheduler {
    /// 创建新的班次调度器
    ///
    /// # 参数
    ///
    /// * `tasks` - 任务仓库
    /// * `bots` - 采集进程控制
    /// * `queue` - 链接采集队列（用于回收超时认领）
    /// * `settings` - 调度配置
    pub fn new(
        tasks: Arc<dyn TaskRepository>,
        bots: Arc<dyn BotControl>,
        queue: HarvestQueue,
        settings: SchedulerSettings,
    ) -> Self {
        Self {
            tasks,
            bots,
            queue,
            settings,
        }
    }

    /// 启动调度循环
    ///
    /// # 返回值
    ///
    /// 返回后台任务的句柄
    pub fn start(self: Arc<Self>) -> JoinHandle<()> {
        tokio::spawn(async move {
            let mut interval = interval(TokioDuration::from_secs(self.settings.poll_interval_secs.max(1)));

            loop {
                interval.tick().await;

                match self.tick(Local::now().time()).await {
                    Ok(report) => debug!("Scheduler tick: {:?}", report),
                    Err(e) => error!("Scheduler tick failed: {}", e),
                }
            }
        })
    }

    /// 执行一次调度
    ///
    /// # 参数
    ///
    /// * `now_local` - 本地时间（用于班次判断）
    ///
    /// # 返回值
    ///
    /// * `Ok(TickReport)` - 本次调度结果
    /// * `Err(RepositoryError)` - 无法读取任务列表
    pub async fn tick(&self, now_local: NaiveTime) -> Result<TickReport, RepositoryError> {
        let mut report = TickReport::default();

        let timeout = chrono::Duration::seconds(self.settings.stale_claim_timeout_secs as i64);
        match self.queue.reap_stale(timeout).await {
            Ok(count) => report.requeued = count,
            Err(e) => error!("Failed to requeue stale queue items: {}", e),
        }

        for task in self.tasks.list().await? {
            match self.schedule_task(&task, now_local).await {
                Ok((decision, running)) => {
                    match decision {
                        Decision::Start => report.started.push(task.id),
                        Decision::Stop => report.stopped.push(task.id),
                        Decision::Keep => {}
                    }
                    if running {
                        report.running += 1;
                    }
                }
                Err(e) => {
                    warn!("Scheduling task {} ({}) failed: {}", task.id, task.name, e);
                    report.failed.push(task.id);
                }
            }
        }

        gauge!(names::SCHEDULER_RUNNING).set(report.running as f64);

        Ok(report)
    }

    async fn schedule_task(&self, task: &Task, now_local: NaiveTime) -> Result<(Decision, bool), SchedulerError> {
        let window = task.shift_window(&self.settings.default_start_time, &self.settings.default_end_time)?;
        let window_active = window.is_active(now_local);
        let status = self.bots.status(task.id).await?;
        let forced = status.is_running() && self.bots.is_forced(task.id).await?;

        let decision = decide(status.is_running(), task.is_active, window_active, forced);
        match decision {
            Decision::Start => {
                let outcome = self.bots.start(task.id, &task.target_url, false).await?;
                counter!(names::SCHEDULER_STARTS).increment(1);
                info!("Task {} ({}) entered its shift, bot pid {}", task.id, task.name, outcome.pid());
            }
            Decision::Stop => {
                self.bots.stop(task.id).await?;
                counter!(names::SCHEDULER_STOPS).increment(1);
                info!(
                    "Task {} ({}) stopped (enabled={}, window_active={})",
                    task.id, task.name, task.is_active, window_active
                );
            }
            Decision::Keep => return Ok((decision, status.is_running())),
        }
        Ok((decision, decision == Decision::Start))
    }
}
