// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::integration::helpers::{create_task, product_url, setup_db};
    use chrono::{Duration, Utc};
    use pricepulse::domain::models::queue_item::QueueStatus;
    use pricepulse::domain::repositories::queue_repository::QueueRepository;
    use pricepulse::domain::repositories::task_repository::RepositoryError;
    use pricepulse::infrastructure::database::entities::scraping_queue;
    use pricepulse::infrastructure::repositories::queue_repo_impl::QueueRepositoryImpl;
    use pricepulse::queue::harvest_queue::HarvestQueue;
    use sea_orm::{ActiveModelTrait, Set, SqlErr};
    use std::collections::HashSet;
    use std::sync::Arc;
    use uuid::Uuid;

    const LISTING: &str = "https://www.trendyol.com/sr?q=kulaklik";

    #[tokio::test]
    async fn test_enqueue_deduplicates_open_items() {
        let db = setup_db().await;
        let task = create_task(&db, "kulaklik", LISTING).await;
        let repo = QueueRepositoryImpl::new(db.clone());
        let url = product_url(1);

        assert!(repo.enqueue(task.id, &url, Some(1)).await.unwrap());
        assert!(!repo.enqueue(task.id, &url, Some(7)).await.unwrap());

        // still open while processing
        let item = repo.dequeue_next(task.id, Uuid::new_v4()).await.unwrap().unwrap();
        assert!(!repo.enqueue(task.id, &url, None).await.unwrap());

        // terminal rows do not block a new discovery
        repo.complete(item.id).await.unwrap();
        assert!(repo.enqueue(task.id, &url, Some(3)).await.unwrap());

        let stats = repo.stats(task.id).await.unwrap();
        assert_eq!(stats.pending, 1);
        assert_eq!(stats.completed, 1);
        assert_eq!(stats.total(), 2);
    }

    #[tokio::test]
    async fn test_same_url_for_different_tasks_is_independent() {
        let db = setup_db().await;
        let first = create_task(&db, "a", LISTING).await;
        let second = create_task(&db, "b", "https://www.trendyol.com/sr?q=mouse").await;
        let repo = QueueRepositoryImpl::new(db.clone());

        assert!(repo.enqueue(first.id, &product_url(5), None).await.unwrap());
        assert!(repo.enqueue(second.id, &product_url(5), None).await.unwrap());
    }

    #[tokio::test]
    async fn test_dequeue_claims_oldest_pending_item() {
        let db = setup_db().await;
        let task = create_task(&db, "kulaklik", LISTING).await;
        let repo = QueueRepositoryImpl::new(db.clone());
        for id in 1..=3 {
            repo.enqueue(task.id, &product_url(id), Some(id as i32)).await.unwrap();
        }

        let claimant = Uuid::new_v4();
        let item = repo.dequeue_next(task.id, claimant).await.unwrap().unwrap();
        assert_eq!(item.url, product_url(1));
        assert_eq!(item.status, QueueStatus::Processing);
        assert_eq!(item.lock_token, Some(claimant));
        assert!(item.claimed_at.is_some());
        assert_eq!(item.listing_rank, Some(1));
    }

    #[tokio::test]
    async fn test_concurrent_claims_are_exclusive() {
        let db = setup_db().await;
        let task = create_task(&db, "kulaklik", LISTING).await;
        let repo = Arc::new(QueueRepositoryImpl::new(db.clone()));
        for id in 1..=10 {
            repo.enqueue(task.id, &product_url(id), None).await.unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..4 {
            let repo = repo.clone();
            let task_id = task.id;
            handles.push(tokio::spawn(async move {
                let claimant = Uuid::new_v4();
                let mut claimed = Vec::new();
                while let Some(item) = repo.dequeue_next(task_id, claimant).await.unwrap() {
                    claimed.push(item.id);
                }
                claimed
            }));
        }

        let mut all = Vec::new();
        for handle in handles {
            all.extend(handle.await.unwrap());
        }
        let unique: HashSet<i32> = all.iter().copied().collect();
        assert_eq!(all.len(), 10);
        assert_eq!(unique.len(), 10);
    }

    #[tokio::test]
    async fn test_claimants_only_give_up_when_nothing_is_pending() {
        let db = setup_db().await;
        let task = create_task(&db, "kulaklik", LISTING).await;
        let repo = Arc::new(QueueRepositoryImpl::new(db.clone()));
        for id in 1..=64 {
            repo.enqueue(task.id, &product_url(id), None).await.unwrap();
        }

        let mut handles = Vec::new();
        for _ in 0..16 {
            let repo = repo.clone();
            let task_id = task.id;
            handles.push(tokio::spawn(async move {
                let claimant = Uuid::new_v4();
                let mut claimed = 0;
                while repo.dequeue_next(task_id, claimant).await.unwrap().is_some() {
                    claimed += 1;
                }
                // nothing is produced meanwhile, so an empty claim means an empty queue
                assert_eq!(repo.stats(task_id).await.unwrap().pending, 0);
                claimed
            }));
        }

        let mut total = 0;
        for handle in handles {
            total += handle.await.unwrap();
        }
        assert_eq!(total, 64);
    }

    #[tokio::test]
    async fn test_database_rejects_second_open_row_for_url() {
        let db = setup_db().await;
        let task = create_task(&db, "kulaklik", LISTING).await;
        let row = |status: QueueStatus| scraping_queue::ActiveModel {
            task_id: Set(task.id),
            url: Set(product_url(1)),
            status: Set(status.to_string()),
            discovered_at: Set(Utc::now().into()),
            ..Default::default()
        };

        row(QueueStatus::Completed).insert(db.as_ref()).await.unwrap();
        row(QueueStatus::Pending).insert(db.as_ref()).await.unwrap();

        let duplicate = row(QueueStatus::Pending).insert(db.as_ref()).await.unwrap_err();
        assert!(matches!(
            duplicate.sql_err(),
            Some(SqlErr::UniqueConstraintViolation(_))
        ));

        // enqueue reports the existing open row as a duplicate
        let repo = QueueRepositoryImpl::new(db.clone());
        assert!(!repo.enqueue(task.id, &product_url(1), None).await.unwrap());
        assert_eq!(repo.stats(task.id).await.unwrap().total(), 2);
    }

    #[tokio::test]
    async fn test_terminal_transitions_require_processing() {
        let db = setup_db().await;
        let task = create_task(&db, "kulaklik", LISTING).await;
        let repo = QueueRepositoryImpl::new(db.clone());
        repo.enqueue(task.id, &product_url(1), None).await.unwrap();
        repo.enqueue(task.id, &product_url(2), None).await.unwrap();

        let pending = repo.find_by_id(1).await.unwrap().unwrap();
        assert!(matches!(
            repo.complete(pending.id).await,
            Err(RepositoryError::Conflict(_))
        ));

        let item = repo.dequeue_next(task.id, Uuid::new_v4()).await.unwrap().unwrap();
        repo.fail(item.id, "Blocked", Some("memory://detail_1.png"))
            .await
            .unwrap();
        let failed = repo.find_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(failed.status, QueueStatus::Failed);
        assert_eq!(failed.error_msg.as_deref(), Some("Blocked"));
        assert_eq!(failed.diagnostic_ref.as_deref(), Some("memory://detail_1.png"));
        assert!(failed.processed_at.is_some());

        // failed is terminal
        assert!(matches!(
            repo.complete(item.id).await,
            Err(RepositoryError::Conflict(_))
        ));
        assert!(matches!(repo.complete(9999).await, Err(RepositoryError::NotFound)));
    }

    #[tokio::test]
    async fn test_requeue_stale_returns_items_to_pending() {
        let db = setup_db().await;
        let task = create_task(&db, "kulaklik", LISTING).await;
        let repo = QueueRepositoryImpl::new(db.clone());
        repo.enqueue(task.id, &product_url(1), None).await.unwrap();
        let item = repo.dequeue_next(task.id, Uuid::new_v4()).await.unwrap().unwrap();

        let past = (Utc::now() - Duration::hours(1)).fixed_offset();
        assert_eq!(repo.requeue_stale(past).await.unwrap(), 0);

        let future = (Utc::now() + Duration::minutes(1)).fixed_offset();
        assert_eq!(repo.requeue_stale(future).await.unwrap(), 1);

        let requeued = repo.find_by_id(item.id).await.unwrap().unwrap();
        assert_eq!(requeued.status, QueueStatus::Pending);
        assert!(requeued.lock_token.is_none());
        assert!(repo.dequeue_next(task.id, Uuid::new_v4()).await.unwrap().is_some());
    }

    #[tokio::test]
    async fn test_harvest_queue_reaps_with_timeout() {
        let db = setup_db().await;
        let task = create_task(&db, "kulaklik", LISTING).await;
        let queue = HarvestQueue::new(Arc::new(QueueRepositoryImpl::new(db.clone())));

        assert!(queue.enqueue(task.id, &product_url(1), Some(1)).await.unwrap());
        assert!(!queue.enqueue(task.id, &product_url(1), Some(1)).await.unwrap());
        queue.claim(task.id, Uuid::new_v4()).await.unwrap().unwrap();

        assert_eq!(queue.reap_stale(Duration::minutes(30)).await.unwrap(), 0);
        assert_eq!(queue.reap_stale(Duration::seconds(-5)).await.unwrap(), 1);
        assert_eq!(queue.stats(task.id).await.unwrap().pending, 1);
    }
}
