// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 仓库接口模块
///
/// 定义领域层的数据访问抽象，由基础设施层实现
pub mod product_repository;
pub mod queue_repository;
pub mod run_log_repository;
pub mod storage_repository;
pub mod task_repository;
