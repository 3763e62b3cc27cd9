// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

use crate::domain::models::product::{
    MetricSnapshot, NewMetricSnapshot, Product, ProductRollup, RecordedScrape, ScrapedProduct,
};
use crate::domain::repositories::product_repository::ProductRepository;
use crate::domain::repositories::task_repository::RepositoryError;
use crate::domain::services::metrics_service::{build_snapshot, rollup, VelocityWeights};
use crate::infrastructure::database::entities::{metric_snapshot, product};
use async_trait::async_trait;
use chrono::{DateTime, FixedOffset};
use sea_orm::{
    sea_query::Expr, ActiveModelTrait, ColumnTrait, ConnectionTrait, DatabaseConnection, EntityTrait,
    QueryFilter, QueryOrder, Set, TransactionTrait,
};
use std::sync::Arc;

/// 商品仓库实现
#[derive(Clone)]
pub struct ProductRepositoryImpl {
    db: Arc<DatabaseConnection>,
}

impl ProductRepositoryImpl {
    pub fn new(db: Arc<DatabaseConnection>) -> Self {
        Self { db }
    }
}

impl From<product::Model> for Product {
    fn from(model: product::Model) -> Self {
        Self {
            id: model.id,
            url: model.url,
            platform: model.platform,
            product_code: model.product_code,
            name: model.name,
            brand: model.brand,
            image_url: model.image_url,
            last_price: model.last_price,
            last_discount_rate: model.last_discount_rate,
            last_engagement_score: model.last_engagement_score,
            avg_sales_velocity: model.avg_sales_velocity,
            created_at: model.created_at,
            last_scraped_at: model.last_scraped_at,
        }
    }
}

impl From<metric_snapshot::Model> for MetricSnapshot {
    fn from(model: metric_snapshot::Model) -> Self {
        Self {
            id: model.id,
            product_id: model.product_id,
            recorded_at: model.recorded_at,
            price: model.price,
            discounted_price: model.discounted_price,
            discount_rate: model.discount_rate,
            rating: model.rating,
            rating_count: model.rating_count,
            question_count: model.question_count,
            favorites: model.favorites,
            cart_count: model.cart_count,
            views: model.views,
            listing_rank: model.listing_rank,
            velocity_score: model.velocity_score,
            engagement_score: model.engagement_score,
            trend_score: model.trend_score,
            sales_velocity: model.sales_velocity,
            demand_acceleration: model.demand_acceleration,
            trend_direction: model.trend_direction,
        }
    }
}

impl From<&NewMetricSnapshot> for metric_snapshot::ActiveModel {
    fn from(snapshot: &NewMetricSnapshot) -> Self {
        Self {
            product_id: Set(snapshot.product_id),
            recorded_at: Set(snapshot.recorded_at),
            price: Set(snapshot.price),
            discounted_price: Set(snapshot.discounted_price),
            discount_rate: Set(snapshot.discount_rate),
            rating: Set(snapshot.rating),
            rating_count: Set(snapshot.rating_count),
            question_count: Set(snapshot.question_count),
            favorites: Set(snapshot.favorites),
            cart_count: Set(snapshot.cart_count),
            views: Set(snapshot.views),
            listing_rank: Set(snapshot.listing_rank),
            velocity_score: Set(snapshot.velocity_score),
            engagement_score: Set(snapshot.engagement_score),
            trend_score: Set(snapshot.trend_score),
            sales_velocity: Set(snapshot.sales_velocity),
            demand_acceleration: Set(snapshot.demand_acceleration),
            trend_direction: Set(snapshot.trend_direction),
            ..Default::default()
        }
    }
}

async fn upsert_product<C: ConnectionTrait>(
    conn: &C,
    scraped: &ScrapedProduct,
    platform: &str,
    scraped_at: DateTime<FixedOffset>,
) -> Result<(product::Model, bool), RepositoryError> {
    let existing = product::Entity::find()
        .filter(product::Column::Url.eq(scraped.url.as_str()))
        .one(conn)
        .await?;

    match existing {
        Some(existing) => {
            let mut active: product::ActiveModel = existing.into();
            active.name = Set(scraped.name.clone());
            if scraped.brand.is_some() {
                active.brand = Set(scraped.brand.clone());
            }
            if scraped.image_url.is_some() {
                active.image_url = Set(scraped.image_url.clone());
            }
            if scraped.product_code.is_some() {
                active.product_code = Set(scraped.product_code.clone());
            }
            active.last_scraped_at = Set(scraped_at);
            Ok((active.update(conn).await?, false))
        }
        None => {
            let active = product::ActiveModel {
                url: Set(scraped.url.clone()),
                platform: Set(platform.to_string()),
                product_code: Set(scraped.product_code.clone()),
                name: Set(scraped.name.clone()),
                brand: Set(scraped.brand.clone()),
                image_url: Set(scraped.image_url.clone()),
                created_at: Set(scraped_at),
                last_scraped_at: Set(scraped_at),
                ..Default::default()
            };
            Ok((active.insert(conn).await?, true))
        }
    }
}

async fn latest_snapshot_on<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
) -> Result<Option<MetricSnapshot>, RepositoryError> {
    let model = metric_snapshot::Entity::find()
        .filter(metric_snapshot::Column::ProductId.eq(product_id))
        .order_by_desc(metric_snapshot::Column::RecordedAt)
        .order_by_desc(metric_snapshot::Column::Id)
        .one(conn)
        .await?;
    Ok(model.map(Into::into))
}

async fn update_rollup<C: ConnectionTrait>(
    conn: &C,
    product_id: i32,
    rollup: &ProductRollup,
) -> Result<(), RepositoryError> {
    let result = product::Entity::update_many()
        .col_expr(product::Column::LastPrice, Expr::value(rollup.last_price))
        .col_expr(
            product::Column::LastDiscountRate,
            Expr::value(rollup.last_discount_rate),
        )
        .col_expr(
            product::Column::LastEngagementScore,
            Expr::value(rollup.last_engagement_score),
        )
        .col_expr(
            product::Column::AvgSalesVelocity,
            Expr::value(rollup.avg_sales_velocity),
        )
        .filter(product::Column::Id.eq(product_id))
        .exec(conn)
        .await?;

    if result.rows_affected == 0 {
        return Err(RepositoryError::NotFound);
    }
    Ok(())
}

#[async_trait]
impl ProductRepository for ProductRepositoryImpl {
    async fn record_scrape(
        &self,
        scraped: &ScrapedProduct,
        platform: &str,
        listing_rank: Option<i32>,
        scraped_at: DateTime<FixedOffset>,
        weights: &VelocityWeights,
    ) -> Result<RecordedScrape, RepositoryError> {
        let txn = self.db.begin().await?;

        let (model, created) = upsert_product(&txn, scraped, platform, scraped_at).await?;
        let product = Product::from(model);

        let previous = latest_snapshot_on(&txn, product.id).await?;
        let snapshot = build_snapshot(
            product.id,
            scraped,
            previous.as_ref(),
            listing_rank,
            scraped_at,
            weights,
        );
        let active: metric_snapshot::ActiveModel = (&snapshot).into();
        let stored = active.insert(&txn).await?;

        update_rollup(&txn, product.id, &rollup(&product, &snapshot)).await?;

        txn.commit().await?;
        Ok(RecordedScrape {
            product,
            snapshot: stored.into(),
            created,
        })
    }

    async fn find_by_url(&self, url: &str) -> Result<Option<Product>, RepositoryError> {
        let model = product::Entity::find()
            .filter(product::Column::Url.eq(url))
            .one(self.db.as_ref())
            .await?;
        Ok(model.map(Into::into))
    }

    async fn latest_snapshot(&self, product_id: i32) -> Result<Option<MetricSnapshot>, RepositoryError> {
        latest_snapshot_on(self.db.as_ref(), product_id).await
    }

    async fn snapshots(&self, product_id: i32) -> Result<Vec<MetricSnapshot>, RepositoryError> {
        let models = metric_snapshot::Entity::find()
            .filter(metric_snapshot::Column::ProductId.eq(product_id))
            .order_by_asc(metric_snapshot::Column::RecordedAt)
            .order_by_asc(metric_snapshot::Column::Id)
            .all(self.db.as_ref())
            .await?;
        Ok(models.into_iter().map(MetricSnapshot::from).collect())
    }
}
