// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use sea_orm_migration::prelude::*;

#[derive(DeriveMigrationName)]
pub struct Migration;

#[async_trait::async_trait]
impl MigrationTrait for Migration {
    async fn up(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .create_table(
                Table::create()
                    .table(Products::Table)
                    .if_not_exists()
                    .col(
                        ColumnDef::new(Products::Id)
                            .integer()
                            .not_null()
                            .auto_increment()
                            .primary_key(),
                    )
                    .col(ColumnDef::new(Products::Url).string().not_null().unique_key())
                    .col(ColumnDef::new(Products::Platform).string().not_null())
                    .col(ColumnDef::new(Products::ProductCode).string())
                    .col(ColumnDef::new(Products::Name).string().not_null())
                    .col(ColumnDef::new(Products::Brand).string())
                    .col(ColumnDef::new(Products::ImageUrl).string())
                    .col(ColumnDef::new(Products::LastPrice).double())
                    .col(ColumnDef::new(Products::LastDiscountRate).double())
                    .col(ColumnDef::new(Products::LastEngagementScore).double())
                    .col(ColumnDef::new(Products::AvgSalesVelocity).double())
                    .col(
                        ColumnDef::new(Products::CreatedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .col(
                        ColumnDef::new(Products::LastScrapedAt)
                            .timestamp_with_time_zone()
                            .not_null()
                            .default(Expr::current_timestamp()),
                    )
                    .to_owned(),
            )
            .await?;

        manager
            .create_index(
                Index::create()
                    .name("idx_products_product_code")
                    .table(Products::Table)
                    .col(Products::ProductCode)
                    .to_owned(),
            )
            .await
    }

    async fn down(&self, manager: &SchemaManager) -> Result<(), DbErr> {
        manager
            .drop_table(Table::drop().table(Products::Table).to_owned())
            .await
    }
}

#[derive(DeriveIden)]
pub enum Products {
    Table,
    Id,
    Url,
    Platform,
    ProductCode,
    Name,
    Brand,
    ImageUrl,
    LastPrice,
    LastDiscountRate,
    LastEngagementScore,
    AvgSalesVelocity,
    CreatedAt,
    LastScrapedAt,
}
