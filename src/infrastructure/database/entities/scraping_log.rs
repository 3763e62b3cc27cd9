// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scraping_logs")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub task_id: i32,
    pub platform: String,
    pub keyword: Option<String>,
    pub target_url: Option<String>,
    pub started_at: ChronoDateTimeWithTimeZone,
    pub finished_at: Option<ChronoDateTimeWithTimeZone>,
    pub status: String,
    pub pages_scraped: i32,
    pub products_found: i32,
    pub products_added: i32,
    pub products_updated: i32,
    pub errors: i32,
    #[sea_orm(column_type = "Text", nullable)]
    pub error_details: Option<String>,
    pub screenshot_path: Option<String>,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
