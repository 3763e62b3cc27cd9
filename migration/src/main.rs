// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

/// 迁移命令行入口
///
/// 连接串取自 `DATABASE_URL`，例如 `DATABASE_URL=sqlite://pricepulse.db?mode=rwc cargo run -p migration -- up`。
/// 正常运行时 `pricepulse` 启动时会自动执行迁移，这里用于回滚和查看状态。
#[async_std::main]
async fn main() {
    cli::run_cli(migration::Migrator).await;
}
