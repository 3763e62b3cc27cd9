// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域模型模块
///
/// 该模块定义了系统的核心业务实体，包括：
/// - 抓取任务（task）：目标URL、班次窗口和运行间隔
/// - 队列条目（queue_item）：采集器与详情抓取器之间的持久化信箱
/// - 商品（product）：商品行、指标快照和原始字段映射
/// - 运行日志（run_log）：每次运行的计数与错误详情
pub mod product;
pub mod queue_item;
pub mod run_log;
pub mod task;
