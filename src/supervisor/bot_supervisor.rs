// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use super::process_handle::{ProcessHandle, SysinfoProcess};
use super::{BotControl, BotStatus, StartOutcome, SupervisorError};
use crate::config::settings::SupervisorSettings;
use crate::domain::repositories::task_repository::TaskRepository;
use async_trait::async_trait;
use dashmap::DashMap;
use std::fs::OpenOptions;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::Arc;
use tokio::fs;
use tokio::process::Command;
use tokio::sync::Mutex;
use tracing::{info, warn};

/// 采集进程监管器
///
/// 运行目录中每个任务有三个文件：`bot_{id}.pid`、`bot_{id}.force` 和追加写入的 `bot_{id}.log`。
/// 同一任务的 status/start/stop 由任务级互斥锁串行化。
pub struct BotSupervisor {
    run_dir: PathBuf,
    program: Option<PathBuf>,
    process_name: Option<String>,
    locks: DashMap<i32, Arc<Mutex<()>>>,
}

async fn remove_if_exists(path: &Path) -> Result<(), SupervisorError> {
    match fs::remove_file(path).await {
        Ok(()) => Ok(()),
        Err(e) if e.kind() == ErrorKind::NotFound => Ok(()),
        Err(e) => Err(e.into()),
    }
}

impl BotSupervisor {
    pub fn new(settings: &SupervisorSettings) -> Self {
        Self {
            run_dir: PathBuf::from(&settings.run_dir),
            program: settings.program.as_ref().map(PathBuf::from),
            process_name: settings.process_name.clone(),
            locks: DashMap::new(),
        }
    }

    pub fn pid_path(&self, task_id: i32) -> PathBuf {
        self.run_dir.join(format!("bot_{}.pid", task_id))
    }

    pub fn force_path(&self, task_id: i32) -> PathBuf {
        self.run_dir.join(format!("bot_{}.force", task_id))
    }

    pub fn log_path(&self, task_id: i32) -> PathBuf {
        self.run_dir.join(format!("bot_{}.log", task_id))
    }

    fn task_lock(&self, task_id: i32) -> Arc<Mutex<()>> {
        self.locks.entry(task_id).or_default().clone()
    }

    fn program(&self) -> Result<PathBuf, SupervisorError> {
        match &self.program {
            Some(program) => Ok(program.clone()),
            None => Ok(std::env::current_exe()?),
        }
    }

    /// 进程名称匹配规则：显式配置优先，否则取可执行文件名
    fn expected_name(&self) -> String {
        if let Some(name) = &self.process_name {
            return name.clone();
        }
        self.program()
            .ok()
            .and_then(|p| p.file_name().map(|n| n.to_string_lossy().into_owned()))
            .unwrap_or_default()
    }

    fn handle(&self, pid: u32) -> SysinfoProcess {
        SysinfoProcess::new(pid, self.expected_name())
    }

    async fn clear_markers(&self, task_id: i32) -> Result<(), SupervisorError> {
        remove_if_exists(&self.pid_path(task_id)).await?;
        remove_if_exists(&self.force_path(task_id)).await
    }

    async fn status_locked(&self, task_id: i32) -> Result<BotStatus, SupervisorError> {
        let pid_path = self.pid_path(task_id);
        let content = match fs::read_to_string(&pid_path).await {
            Ok(content) => content,
            Err(e) if e.kind() == ErrorKind::NotFound => return Ok(BotStatus::Stopped),
            Err(e) => return Err(e.into()),
        };

        let Ok(pid) = content.trim().parse::<u32>() else {
            warn!("Removing unreadable pid marker for task {}: {:?}", task_id, content);
            remove_if_exists(&pid_path).await?;
            return Ok(BotStatus::Stopped);
        };

        if self.handle(pid).is_alive() {
            return Ok(BotStatus::Running(pid));
        }

        info!("Bot for task {} (pid {}) is gone, clearing markers", task_id, pid);
        self.clear_markers(task_id).await?;
        Ok(BotStatus::Stopped)
    }

    /// 按任务ID启动，目标URL从任务表读取
    pub async fn start_task(
        &self,
        tasks: &dyn TaskRepository,
        task_id: i32,
        force: bool,
    ) -> Result<StartOutcome, SupervisorError> {
        let task = tasks
            .find_by_id(task_id)
            .await?
            .ok_or(SupervisorError::TaskNotFound(task_id))?;
        self.start(task.id, &task.target_url, force).await
    }
}

#[async_trait]
impl BotControl for BotSupervisor {
    async fn status(&self, task_id: i32) -> Result<BotStatus, SupervisorError> {
        let lock = self.task_lock(task_id);
        let _guard = lock.lock().await;
        self.status_locked(task_id).await
    }

    async fn start(&self, task_id: i32, target_url: &str, force: bool) -> Result<StartOutcome, SupervisorError> {
        let lock = self.task_lock(task_id);
        let _guard = lock.lock().await;

        if let BotStatus::Running(pid) = self.status_locked(task_id).await? {
            return Ok(StartOutcome::AlreadyRunning(pid));
        }

        fs::create_dir_all(&self.run_dir).await?;
        let log = OpenOptions::new()
            .create(true)
            .append(true)
            .open(self.log_path(task_id))?;
        let log_err = log.try_clone()?;

        let mut cmd = Command::new(self.program()?);
        cmd.arg("run")
            .arg("--task-id")
            .arg(task_id.to_string())
            .arg("--url")
            .arg(target_url)
            .stdin(Stdio::null())
            .stdout(Stdio::from(log))
            .stderr(Stdio::from(log_err));
        #[cfg(unix)]
        cmd.process_group(0);

        let child = cmd
            .spawn()
            .map_err(|e| SupervisorError::Spawn(e.to_string()))?;
        let pid = child
            .id()
            .ok_or_else(|| SupervisorError::Spawn("process exited before reporting a pid".to_string()))?;

        fs::write(self.pid_path(task_id), pid.to_string()).await?;
        if force {
            fs::write(self.force_path(task_id), b"1").await?;
        } else {
            remove_if_exists(&self.force_path(task_id)).await?;
        }

        info!("Started bot for task {} (pid {}, force={})", task_id, pid, force);
        Ok(StartOutcome::Started(pid))
    }

    async fn stop(&self, task_id: i32) -> Result<bool, SupervisorError> {
        let lock = self.task_lock(task_id);
        let _guard = lock.lock().await;

        let stopped = match self.status_locked(task_id).await? {
            BotStatus::Running(pid) => {
                let killed = self.handle(pid).terminate_tree();
                info!("Stopped bot for task {} (pid {}, {} processes)", task_id, pid, killed);
                true
            }
            BotStatus::Stopped => false,
        };

        self.clear_markers(task_id).await?;
        Ok(stopped)
    }

    async fn is_forced(&self, task_id: i32) -> Result<bool, SupervisorError> {
        Ok(fs::try_exists(self.force_path(task_id)).await?)
    }
}
