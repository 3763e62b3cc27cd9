// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sysinfo::{Pid, ProcessStatus, ProcessesToUpdate, System};
use tracing::{debug, warn};

/// 操作系统进程句柄
pub trait ProcessHandle: Send + Sync {
    fn pid(&self) -> u32;

    /// 进程存在、不是僵尸进程且名称匹配
    fn is_alive(&self) -> bool;

    /// 先深度优先终止所有子进程，再终止自身，返回被终止的进程数
    fn terminate_tree(&self) -> usize;
}

/// 基于 sysinfo 的进程句柄
///
/// `expected_name` 用于识别PID被其他程序复用的情况
pub struct SysinfoProcess {
    pid: u32,
    expected_name: String,
}

impl SysinfoProcess {
    pub fn new(pid: u32, expected_name: impl Into<String>) -> Self {
        Self {
            pid,
            expected_name: expected_name.into(),
        }
    }

    fn name_matches(&self, process: &sysinfo::Process) -> bool {
        if self.expected_name.is_empty() {
            return true;
        }
        let name = process.name().to_string_lossy();
        // linux truncates the kernel process name to 15 bytes
        if name.contains(&self.expected_name)
            || (name.len() >= 15 && self.expected_name.starts_with(&*name))
        {
            return true;
        }
        process
            .cmd()
            .first()
            .is_some_and(|arg0| arg0.to_string_lossy().contains(&self.expected_name))
    }
}

fn collect_descendants(system: &System, root: Pid, out: &mut Vec<Pid>) {
    for (pid, process) in system.processes() {
        if process.parent() == Some(root) && *pid != root {
            collect_descendants(system, *pid, out);
            out.push(*pid);
        }
    }
}

impl ProcessHandle for SysinfoProcess {
    fn pid(&self) -> u32 {
        self.pid
    }

    fn is_alive(&self) -> bool {
        let pid = Pid::from_u32(self.pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::Some(&[pid]), true);

        match system.process(pid) {
            Some(process) => {
                if process.status() == ProcessStatus::Zombie {
                    debug!("Process {} is a zombie", self.pid);
                    return false;
                }
                self.name_matches(process)
            }
            None => false,
        }
    }

    fn terminate_tree(&self) -> usize {
        let root = Pid::from_u32(self.pid);
        let mut system = System::new();
        system.refresh_processes(ProcessesToUpdate::All, true);

        let mut targets = Vec::new();
        collect_descendants(&system, root, &mut targets);
        targets.push(root);

        let mut killed = 0;
        for pid in targets {
            match system.process(pid) {
                Some(process) if process.kill() => killed += 1,
                Some(_) => warn!("Failed to kill process {}", pid),
                None => {}
            }
        }
        killed
    }
}
