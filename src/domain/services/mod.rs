// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

/// 领域服务模块
///
/// 指标引擎：文本解析、评分公式和时间序列指标
pub mod metrics_service;
