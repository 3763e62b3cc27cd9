// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::integration::helpers::{product_url, setup_db};
    use chrono::{Duration, Utc};
    use pricepulse::domain::models::product::ScrapedProduct;
    use pricepulse::domain::repositories::product_repository::ProductRepository;
    use pricepulse::domain::repositories::task_repository::RepositoryError;
    use pricepulse::domain::services::metrics_service::VelocityWeights;
    use pricepulse::infrastructure::database::entities::metric_snapshot;
    use pricepulse::infrastructure::repositories::product_repo_impl::ProductRepositoryImpl;
    use sea_orm::{ConnectionTrait, EntityTrait};

    fn scraped(price: f64, cart: i64) -> ScrapedProduct {
        ScrapedProduct {
            url: product_url(42),
            product_code: Some("42".to_string()),
            name: "Kablosuz Kulaklık".to_string(),
            brand: Some("Marka".to_string()),
            image_url: None,
            price: Some(price),
            discounted_price: Some(price * 0.8),
            rating: Some(4.4),
            rating_count: 120,
            question_count: 8,
            favorites: 900,
            cart_count: cart,
            views: 0,
        }
    }

    #[tokio::test]
    async fn test_record_scrape_creates_then_updates_by_url() {
        let db = setup_db().await;
        let repo = ProductRepositoryImpl::new(db.clone());
        let weights = VelocityWeights::default();
        let now = Utc::now().fixed_offset();

        let first = repo
            .record_scrape(&scraped(1000.0, 50), "trendyol", Some(3), now, &weights)
            .await
            .unwrap();
        assert!(first.created);
        assert_eq!(first.product.name, "Kablosuz Kulaklık");
        assert_eq!(first.product.product_code.as_deref(), Some("42"));

        let mut renamed = scraped(900.0, 60);
        renamed.name = "Kablosuz Kulaklık Pro".to_string();
        let later = now + Duration::hours(1);
        let second = repo
            .record_scrape(&renamed, "trendyol", Some(1), later, &weights)
            .await
            .unwrap();
        assert!(!second.created);
        assert_eq!(second.product.id, first.product.id);
        assert_eq!(second.product.name, "Kablosuz Kulaklık Pro");

        let found = repo.find_by_url(&product_url(42)).await.unwrap().unwrap();
        assert_eq!(found.id, first.product.id);
        assert!(repo.find_by_url(&product_url(43)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_snapshots_are_append_only_and_drive_rollup() {
        let db = setup_db().await;
        let repo = ProductRepositoryImpl::new(db.clone());
        let weights = VelocityWeights::default();
        let start = Utc::now().fixed_offset() - Duration::hours(2);

        let first = repo
            .record_scrape(&scraped(1000.0, 50), "trendyol", Some(3), start, &weights)
            .await
            .unwrap();
        assert_eq!(first.snapshot.listing_rank, Some(3));
        assert_eq!(first.snapshot.trend_direction, 0);
        assert!(first.snapshot.sales_velocity.is_none());

        let later = start + Duration::hours(1);
        let second = repo
            .record_scrape(&scraped(900.0, 80), "trendyol", Some(1), later, &weights)
            .await
            .unwrap();
        assert!((second.snapshot.sales_velocity.unwrap() - 30.0).abs() < 1e-9);
        assert_eq!(second.snapshot.trend_direction, 1);

        let product_id = first.product.id;
        let history = repo.snapshots(product_id).await.unwrap();
        assert_eq!(history.len(), 2);
        assert_eq!(history[0].cart_count, 50);
        assert_eq!(history[1].cart_count, 80);
        let latest = repo.latest_snapshot(product_id).await.unwrap().unwrap();
        assert_eq!(latest.id, second.snapshot.id);

        let updated = repo.find_by_url(&product_url(42)).await.unwrap().unwrap();
        assert!((updated.last_price.unwrap() - 720.0).abs() < 1e-9);
        assert!((updated.last_discount_rate.unwrap() - 20.0).abs() < 1e-9);
        assert!((updated.avg_sales_velocity.unwrap() - 30.0).abs() < 1e-9);
        assert!(updated.last_engagement_score.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_failed_rollup_leaves_no_snapshot_behind() {
        let db = setup_db().await;
        let repo = ProductRepositoryImpl::new(db.clone());
        let weights = VelocityWeights::default();
        let now = Utc::now().fixed_offset();

        db.execute_unprepared(
            "CREATE TRIGGER reject_rollup BEFORE UPDATE OF last_price ON products \
             BEGIN SELECT RAISE(ABORT, 'rollup rejected'); END;",
        )
        .await
        .unwrap();

        let result = repo
            .record_scrape(&scraped(1000.0, 50), "trendyol", Some(1), now, &weights)
            .await;
        assert!(matches!(result, Err(RepositoryError::Database(_))));

        assert!(repo.find_by_url(&product_url(42)).await.unwrap().is_none());
        let orphans = metric_snapshot::Entity::find().all(db.as_ref()).await.unwrap();
        assert!(orphans.is_empty());
    }
}
