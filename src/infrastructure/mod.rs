// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 基础设施层模块
///
/// 该模块包含系统的技术实现细节：
/// - 数据库（database）：连接池和实体映射
/// - 指标（metrics）：Prometheus 导出和指标名称
/// - 仓库实现（repositories）：领域仓库接口的SeaORM实现
/// - 存储（storage）：诊断快照的文件与内存存储
///
/// 基础设施层依赖于领域层的抽象接口。
pub mod database;
pub mod metrics;
pub mod repositories;
pub mod storage;
