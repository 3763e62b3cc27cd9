// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "products")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    #[sea_orm(unique)]
    pub url: String,
    pub platform: String,
    pub product_code: Option<String>,
    pub name: String,
    pub brand: Option<String>,
    pub image_url: Option<String>,
    pub last_price: Option<f64>,
    pub last_discount_rate: Option<f64>,
    pub last_engagement_score: Option<f64>,
    pub avg_sales_velocity: Option<f64>,
    pub created_at: ChronoDateTimeWithTimeZone,
    pub last_scraped_at: ChronoDateTimeWithTimeZone,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(has_many = "super::metric_snapshot::Entity")]
    MetricSnapshot,
}

impl Related<super::metric_snapshot::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::MetricSnapshot.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
