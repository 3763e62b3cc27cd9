// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 配置模块
///
/// 处理应用程序的配置设置和环境变量
pub mod config;

/// 领域模块
///
/// 包含核心业务实体、指标计算和仓库接口
pub mod domain;

/// 引擎模块
///
/// 页面抓取会话（HTTP与无头浏览器）、拦截检测和HTML解析
pub mod engines;

/// 基础设施模块
///
/// 提供数据库、仓库实现、诊断快照存储和指标导出
pub mod infrastructure;

/// 队列模块
///
/// 链接采集队列和班次调度器
pub mod queue;

/// 进程监管模块
///
/// 通过PID标记文件管理每个任务的采集进程
pub mod supervisor;

/// 工具模块
///
/// 提供通用的工具函数和辅助功能
pub mod utils;

/// 工作器模块
///
/// 链接采集器、详情抓取器和任务运行器
pub mod workers;
