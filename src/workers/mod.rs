// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 工作器模块
///
/// 采集进程内运行的工作器：链接采集器（生产者）、详情抓取器（消费者）
/// 以及把二者组合起来的任务运行器
pub mod detail_worker;
pub mod link_harvester;
pub mod task_runner;
pub mod worker;

pub use worker::Worker;
