// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 数据库模块
///
/// 连接池创建、启动时迁移，以及任务、队列、商品、快照和运行日志五张表的实体
pub mod connection;
pub mod entities;
