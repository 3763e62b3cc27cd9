// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 队列模块
///
/// 提供链接采集队列和班次调度功能
/// 采集队列连接链接采集器与详情工作器，调度器负责按班次启停采集进程
pub mod harvest_queue;
pub mod scheduler;
