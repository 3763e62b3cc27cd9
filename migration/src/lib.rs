// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

pub use sea_orm_migration::prelude::*;

mod m20250301_000001_create_scraping_tasks;
mod m20250301_000002_create_scraping_queue;
mod m20250301_000003_create_products;
mod m20250301_000004_create_metric_snapshots;
mod m20250301_000005_create_scraping_logs;
mod m20250302_000006_unique_open_queue_items;

/// 数据库迁移器
pub struct Migrator;

#[async_trait::async_trait]
impl MigratorTrait for Migrator {
    /// 获取所有迁移
    ///
    /// # 返回值
    ///
    /// 返回迁移列表，按表依赖顺序排列
    fn migrations() -> Vec<Box<dyn MigrationTrait>> {
        vec![
            Box::new(m20250301_000001_create_scraping_tasks::Migration),
            Box::new(m20250301_000002_create_scraping_queue::Migration),
            Box::new(m20250301_000003_create_products::Migration),
            Box::new(m20250301_000004_create_metric_snapshots::Migration),
            Box::new(m20250301_000005_create_scraping_logs::Migration),
            Box::new(m20250302_000006_unique_open_queue_items::Migration),
        ]
    }
}
