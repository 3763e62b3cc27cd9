// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm::entity::prelude::*;

#[derive(Clone, Debug, PartialEq, DeriveEntityModel)]
#[sea_orm(table_name = "metric_snapshots")]
pub struct Model {
    #[sea_orm(primary_key)]
    pub id: i32,
    pub product_id: i32,
    pub recorded_at: ChronoDateTimeWithTimeZone,
    pub price: Option<f64>,
    pub discounted_price: Option<f64>,
    pub discount_rate: Option<f64>,
    pub rating: Option<f64>,
    pub rating_count: i64,
    pub question_count: i64,
    pub favorites: i64,
    pub cart_count: i64,
    pub views: i64,
    pub listing_rank: Option<i32>,
    pub velocity_score: f64,
    pub engagement_score: f64,
    pub trend_score: f64,
    pub sales_velocity: Option<f64>,
    pub demand_acceleration: Option<f64>,
    pub trend_direction: i16,
}

#[derive(Copy, Clone, Debug, EnumIter, DeriveRelation)]
pub enum Relation {
    #[sea_orm(
        belongs_to = "super::product::Entity",
        from = "Column::ProductId",
        to = "super::product::Column::Id"
    )]
    Product,
}

impl Related<super::product::Entity> for Entity {
    fn to() -> RelationDef {
        Relation::Product.def()
    }
}

impl ActiveModelBehavior for ActiveModel {}
