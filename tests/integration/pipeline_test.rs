// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::integration::helpers::{
        create_task, listing_html, product_html, product_url, setup_db, ScriptedSite,
    };
    use pricepulse::config::settings::Settings;
    use pricepulse::domain::models::run_log::RunStatus;
    use pricepulse::domain::repositories::product_repository::ProductRepository;
    use pricepulse::domain::repositories::run_log_repository::RunLogRepository;
    use pricepulse::engines::parser::{PageParser, SelectorConfig};
    use pricepulse::infrastructure::repositories::product_repo_impl::ProductRepositoryImpl;
    use pricepulse::infrastructure::repositories::queue_repo_impl::QueueRepositoryImpl;
    use pricepulse::infrastructure::repositories::run_log_repo_impl::RunLogRepositoryImpl;
    use pricepulse::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
    use pricepulse::infrastructure::storage::InMemoryStorage;
    use pricepulse::queue::harvest_queue::HarvestQueue;
    use pricepulse::utils::errors::WorkerError;
    use pricepulse::utils::url_utils::build_page_url;
    use pricepulse::workers::task_runner::{RunnerDeps, TaskRunner};
    use sea_orm::DatabaseConnection;
    use std::sync::Arc;

    const LISTING: &str = "https://www.trendyol.com/sr?q=kablosuz+kulaklik";

    struct Harness {
        runner: TaskRunner,
        site: ScriptedSite,
        storage: InMemoryStorage,
        queue: HarvestQueue,
        products: Arc<ProductRepositoryImpl>,
        run_logs: Arc<RunLogRepositoryImpl>,
    }

    fn fast_settings(max_pages: u32) -> Settings {
        let mut settings: Settings = Settings::builder()
            .unwrap()
            .build()
            .unwrap()
            .try_deserialize()
            .unwrap();
        settings.harvester.default_max_pages = max_pages;
        settings.harvester.page_delay_min_ms = 0;
        settings.harvester.page_delay_max_ms = 0;
        settings.harvester.stale_retry_delay_ms = 0;
        settings.worker.request_delay_ms = 0;
        settings.worker.poll_interval_ms = 20;
        settings.worker.max_empty_polls = 25;
        settings
    }

    fn harness(db: &Arc<DatabaseConnection>, max_pages: u32) -> Harness {
        let site = ScriptedSite::new();
        let storage = InMemoryStorage::new();
        let queue = HarvestQueue::new(Arc::new(QueueRepositoryImpl::new(db.clone())));
        let products = Arc::new(ProductRepositoryImpl::new(db.clone()));
        let run_logs = Arc::new(RunLogRepositoryImpl::new(db.clone()));
        let deps = RunnerDeps {
            tasks: Arc::new(TaskRepositoryImpl::new(db.clone())),
            products: products.clone(),
            run_logs: run_logs.clone(),
            storage: Arc::new(storage.clone()),
            queue: queue.clone(),
            parser: Arc::new(PageParser::new(&SelectorConfig::default()).unwrap()),
            fetchers: Arc::new(site.clone()),
        };
        Harness {
            runner: TaskRunner::new(deps, fast_settings(max_pages)),
            site,
            storage,
            queue,
            products,
            run_logs,
        }
    }

    fn page_url(page: u32) -> String {
        build_page_url(LISTING, page).unwrap()
    }

    fn serve_products(site: &ScriptedSite, ids: impl Iterator<Item = u32>) {
        for id in ids {
            site.page(
                &product_url(id),
                product_html(&format!("Kulaklık {}", id), "1.299,90 TL", "1,2B"),
            );
        }
    }

    #[tokio::test]
    async fn test_repeated_second_page_ends_pagination_with_one_error() {
        let db = setup_db().await;
        let task = create_task(&db, "Kulaklık", LISTING).await;
        let h = harness(&db, 2);

        let links: Vec<String> = (1..=20).map(product_url).collect();
        h.site.page(&page_url(1), listing_html(&links));
        h.site.page(&page_url(2), listing_html(&links));
        serve_products(&h.site, 1..=20);

        let outcome = h.runner.run(task.id, None).await.unwrap();
        assert_eq!(outcome.status, RunStatus::Completed);

        let harvest = outcome.harvest.unwrap();
        assert_eq!(harvest.pages, 1);
        assert_eq!(harvest.links_found, 20);
        assert_eq!(harvest.enqueued, 20);
        assert_eq!(harvest.errors_recorded, 1);
        // page 2 is fetched once more after the session reset
        assert_eq!(h.site.requests_for(&page_url(2)), 2);
        assert_eq!(h.site.resets(), 1);

        assert_eq!(outcome.detail.completed, 20);
        assert_eq!(outcome.detail.created, 20);
        assert_eq!(outcome.detail.failed, 0);

        let stats = h.queue.stats(task.id).await.unwrap();
        assert_eq!(stats.completed, 20);
        assert_eq!(stats.pending + stats.processing + stats.failed, 0);

        let log = h.run_logs.find_by_id(outcome.run_log_id).await.unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Completed);
        assert_eq!(log.errors, 1);
        assert_eq!(log.pages_scraped, 1);
        assert_eq!(log.products_found, 20);
        assert_eq!(log.products_added, 20);
        assert_eq!(log.keyword.as_deref(), Some("kablosuz kulaklik"));
        assert!(log.finished_at.is_some());
        assert!(log.screenshot_path.unwrap().starts_with("memory://linker_"));
        assert_eq!(h.storage.keys().await.len(), 1);

        let product = h.products.find_by_url(&product_url(7)).await.unwrap().unwrap();
        assert_eq!(product.name, "Kulaklık 7");
        assert_eq!(product.product_code.as_deref(), Some("7"));
        assert_eq!(product.last_price, Some(1299.9));
        let snapshots = h.products.snapshots(product.id).await.unwrap();
        assert_eq!(snapshots.len(), 1);
        assert_eq!(snapshots[0].cart_count, 1200);
        assert_eq!(snapshots[0].listing_rank, Some(7));
    }

    #[tokio::test]
    async fn test_empty_page_ends_pagination_without_error() {
        let db = setup_db().await;
        let task = create_task(&db, "Kulaklık", LISTING).await;
        let h = harness(&db, 5);

        let first: Vec<String> = (1..=3).map(product_url).collect();
        let second: Vec<String> = (4..=5).map(product_url).collect();
        h.site.page(&page_url(1), listing_html(&first));
        h.site.page(&page_url(2), listing_html(&second));
        h.site.page(&page_url(3), "<html><body><p>Sonuç yok</p></body></html>");
        serve_products(&h.site, 1..=5);

        let outcome = h.runner.run(task.id, None).await.unwrap();
        let harvest = outcome.harvest.unwrap();
        assert_eq!(harvest.pages, 2);
        assert_eq!(harvest.errors_recorded, 0);
        assert_eq!(h.site.requests_for(&page_url(4)), 0);
        assert_eq!(outcome.detail.completed, 5);

        let log = h.run_logs.find_by_id(outcome.run_log_id).await.unwrap().unwrap();
        assert_eq!(log.errors, 0);
        assert_eq!(log.products_found, 5);

        // ranks continue across pages
        let product = h.products.find_by_url(&product_url(5)).await.unwrap().unwrap();
        let snapshots = h.products.snapshots(product.id).await.unwrap();
        assert_eq!(snapshots[0].listing_rank, Some(5));
    }

    #[tokio::test]
    async fn test_blocked_listing_is_retried_once_then_recorded() {
        let db = setup_db().await;
        let task = create_task(&db, "Kulaklık", LISTING).await;
        let h = harness(&db, 3);
        h.site.page(
            &page_url(1),
            "<html><body><h2>Robot olmadığını doğrula</h2></body></html>",
        );

        let outcome = h.runner.run(task.id, None).await.unwrap();
        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(h.site.requests_for(&page_url(1)), 2);
        assert_eq!(h.site.requests_for(&page_url(2)), 0);

        let log = h.run_logs.find_by_id(outcome.run_log_id).await.unwrap().unwrap();
        assert_eq!(log.errors, 1);
        assert_eq!(log.pages_scraped, 0);
        assert!(log.error_details.unwrap().contains("Robot olmadığını doğrula"));
    }

    #[tokio::test]
    async fn test_failed_product_does_not_stop_the_run() {
        let db = setup_db().await;
        let task = create_task(&db, "Kulaklık", LISTING).await;
        let h = harness(&db, 1);

        let links: Vec<String> = (1..=3).map(product_url).collect();
        h.site.page(&page_url(1), listing_html(&links));
        serve_products(&h.site, [1, 3].into_iter());
        h.site.page(
            &product_url(2),
            "<html><body><h1>Aradığınız sayfayı bulamadık</h1></body></html>",
        );

        let outcome = h.runner.run(task.id, None).await.unwrap();
        assert_eq!(outcome.status, RunStatus::Completed);
        assert_eq!(outcome.detail.completed, 2);
        assert_eq!(outcome.detail.failed, 1);

        let stats = h.queue.stats(task.id).await.unwrap();
        assert_eq!(stats.completed, 2);
        assert_eq!(stats.failed, 1);

        let log = h.run_logs.find_by_id(outcome.run_log_id).await.unwrap().unwrap();
        assert_eq!(log.errors, 1);
        assert_eq!(log.products_added, 2);
        assert!(log.error_details.unwrap().contains(&product_url(2)));
        assert!(h.storage.keys().await.iter().any(|k| k.starts_with("detail_")));
        assert!(h.products.find_by_url(&product_url(2)).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_single_product_mode_updates_on_second_run() {
        let db = setup_db().await;
        let task = create_task(&db, "Kulaklık", LISTING).await;
        let h = harness(&db, 5);
        let url = product_url(99);
        h.site.page(&url, product_html("Tekli", "499 TL", "100"));
        h.site.page(&url, product_html("Tekli", "449 TL", "160"));

        let first = h.runner.run(task.id, Some(&url)).await.unwrap();
        assert!(first.harvest.is_none());
        assert_eq!(first.detail.created, 1);

        let second = h.runner.run(task.id, Some(&url)).await.unwrap();
        assert_eq!(second.detail.completed, 1);
        assert_eq!(second.detail.created, 0);

        let log = h.run_logs.find_by_id(second.run_log_id).await.unwrap().unwrap();
        assert_eq!(log.products_updated, 1);
        assert_eq!(log.target_url.as_deref(), Some(url.as_str()));

        let product = h.products.find_by_url(&url).await.unwrap().unwrap();
        assert_eq!(product.last_price, Some(449.0));
        let snapshots = h.products.snapshots(product.id).await.unwrap();
        assert_eq!(snapshots.len(), 2);
        assert_eq!(snapshots[1].cart_count, 160);
        assert!(snapshots[1].sales_velocity.unwrap() > 0.0);
    }

    #[tokio::test]
    async fn test_session_launch_failure_closes_run_as_failed() {
        let db = setup_db().await;
        let task = create_task(&db, "Kulaklık", LISTING).await;
        let h = harness(&db, 1);
        h.site.go_offline();

        let result = h.runner.run(task.id, None).await;
        assert!(matches!(result, Err(WorkerError::EngineError(_))));

        let log = h.run_logs.latest_for_task(task.id).await.unwrap().unwrap();
        assert_eq!(log.status, RunStatus::Failed);
        assert_eq!(log.errors, 1);
        assert!(log.error_details.unwrap().contains("browser could not be launched"));
        assert!(log.finished_at.is_some());
    }

    #[tokio::test]
    async fn test_unknown_task_is_an_error() {
        let db = setup_db().await;
        let h = harness(&db, 1);

        let result = h.runner.run(404, None).await;
        assert!(matches!(result, Err(WorkerError::NotFound(_))));
    }
}
