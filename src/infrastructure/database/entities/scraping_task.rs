// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "scraping_tasks")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub task_name: String,
    pub target_platform: String,
    #[sea_orm(unique)]
    pub target_url: String,
    pub search_params: Json,
    pub scrape_interval_hours: i32,
    pub is_active: bool,
    pub start_time: Option<String>,
    pub end_time: Option<String>,
    pub last_run_at: Option<ChronoDateTimeWithTimeZone>,
    pub next_run_at: Option<ChronoDateTimeWithTimeZone>,
    pub created_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {}

impl ActiveModelBehavior for ActiveModel {}
