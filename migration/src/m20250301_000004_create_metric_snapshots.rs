// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

use super::m20250301_000003_create_products::Products;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(MetricSnapshots::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(MetricSnapshots::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(MetricSnapshots::ProductId).integer().not_null())
                    .col(
                        ColumnDef::new(MetricSnapshots::RecordedAt)
                            .timestamp_with_time_zone()
                            .not_null(),
                    )
                    .col(ColumnDef::new(MetricSnapshots::Price).double())
                    .col(ColumnDef::new(MetricSnapshots::DiscountedPrice).double())
                    .col(ColumnDef::new(MetricSnapshots::DiscountRate).double())
                    .col(ColumnDef::new(MetricSnapshots::Rating).double())
                    .col(
                        ColumnDef::new(MetricSnapshots::RatingCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MetricSnapshots::QuestionCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MetricSnapshots::Favorites)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MetricSnapshots::CartCount)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(
                        ColumnDef::new(MetricSnapshots::Views)
                            .big_integer()
                            .not_null()
                            .default(0),
                    )
                    .col(ColumnDef::new(MetricSnapshots::ListingRank).integer())
                    .col(ColumnDef::new(MetricSnapshots::VelocityScore).double().not_null())
                    .col(ColumnDef::new(MetricSnapshots::EngagementScore).double().not_null())
                    .col(ColumnDef::new(MetricSnapshots::TrendScore).double().not_null())
                    .col(ColumnDef::new(MetricSnapshots::SalesVelocity).double())
                    .col(ColumnDef::new(MetricSnapshots::DemandAcceleration).double())
                    .col(
                        ColumnDef::new(MetricSnapshots::TrendDirection)
                            .small_integer()
                            .not_null()
                            .default(0),
                    )
                    .foreign_key(
                        ForeignKey::create()
                            .name("fk_metric_snapshots_product")
                            .from(MetricSnapshots::Table, MetricSnapshots::ProductId)
                            .to(Products::Table, Products::Id),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_metric_snapshots_product_recorded")
                    .table(MetricSnapshots::Table)
                    .col(MetricSnapshots::ProductId)
                    .col(MetricSnapshots::RecordedAt)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(MetricSnapshots::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
enum MetricSnapshots {
    Table,
    Id,
    ProductId,
    RecordedAt,
    Price,
    DiscountedPrice,
    DiscountRate,
    Rating,
    RatingCount,
    QuestionCount,
    Favorites,
    CartCount,
    Views,
    ListingRank,
    VelocityScore,
    EngagementScore,
    TrendScore,
    SalesVelocity,
    DemandAcceleration,
    TrendDirection,
}
