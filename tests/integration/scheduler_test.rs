// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use crate::integration::helpers::{create_task, product_url, setup_db};
    use async_trait::async_trait;
    use chrono::{NaiveTime, Utc};
    use pricepulse::config::settings::SchedulerSettings;
    use pricepulse::domain::repositories::task_repository::TaskRepository;
    use pricepulse::infrastructure::database::entities::scraping_task;
    use pricepulse::infrastructure::repositories::queue_repo_impl::QueueRepositoryImpl;
    use pricepulse::infrastructure::repositories::task_repo_impl::TaskRepositoryImpl;
    use pricepulse::queue::harvest_queue::HarvestQueue;
    use pricepulse::queue::scheduler::ShiftScheduler;
    use pricepulse::supervisor::{BotControl, BotStatus, StartOutcome, SupervisorError};
    use sea_orm::sea_query::Expr;
    use sea_orm::{ColumnTrait, DatabaseConnection, EntityTrait, QueryFilter};
    use std::collections::HashMap;
    use std::sync::{Arc, Mutex};
    use uuid::Uuid;

    /// 内存中的进程表
    #[derive(Default)]
    struct FakeBots {
        running: Mutex<HashMap<i32, (u32, bool)>>,
        next_pid: Mutex<u32>,
    }

    impl FakeBots {
        fn is_running(&self, task_id: i32) -> bool {
            self.running.lock().unwrap().contains_key(&task_id)
        }
    }

    #[async_trait]
    impl BotControl for FakeBots {
        async fn status(&self, task_id: i32) -> Result<BotStatus, SupervisorError> {
            Ok(match self.running.lock().unwrap().get(&task_id) {
                Some((pid, _)) => BotStatus::Running(*pid),
                None => BotStatus::Stopped,
            })
        }

        async fn start(&self, task_id: i32, _target_url: &str, force: bool) -> Result<StartOutcome, SupervisorError> {
            let mut next = self.next_pid.lock().unwrap();
            *next += 1;
            let pid = 1000 + *next;
            self.running.lock().unwrap().insert(task_id, (pid, force));
            Ok(StartOutcome::Started(pid))
        }

        async fn stop(&self, task_id: i32) -> Result<bool, SupervisorError> {
            Ok(self.running.lock().unwrap().remove(&task_id).is_some())
        }

        async fn is_forced(&self, task_id: i32) -> Result<bool, SupervisorError> {
            Ok(self
                .running
                .lock()
                .unwrap()
                .get(&task_id)
                .is_some_and(|(_, forced)| *forced))
        }
    }

    fn settings() -> SchedulerSettings {
        SchedulerSettings {
            poll_interval_secs: 30,
            stale_claim_timeout_secs: 1800,
            default_start_time: "09:00".to_string(),
            default_end_time: "18:00".to_string(),
        }
    }

    fn at(h: u32, m: u32) -> NaiveTime {
        NaiveTime::from_hms_opt(h, m, 0).unwrap()
    }

    struct Fixture {
        tasks: Arc<TaskRepositoryImpl>,
        bots: Arc<FakeBots>,
        queue: HarvestQueue,
        scheduler: ShiftScheduler,
    }

    async fn fixture() -> (Fixture, Arc<DatabaseConnection>) {
        let db = setup_db().await;
        let tasks = Arc::new(TaskRepositoryImpl::new(db.clone()));
        let bots = Arc::new(FakeBots::default());
        let queue = HarvestQueue::new(Arc::new(QueueRepositoryImpl::new(db.clone())));
        let scheduler = ShiftScheduler::new(tasks.clone(), bots.clone(), queue.clone(), settings());
        (
            Fixture {
                tasks,
                bots,
                queue,
                scheduler,
            },
            db,
        )
    }

    #[tokio::test]
    async fn test_starts_inside_window_and_stops_after_it() {
        let (fx, db) = fixture().await;
        let task = create_task(&db, "gunduz", "https://www.trendyol.com/sr?q=a").await;

        let report = fx.scheduler.tick(at(10, 0)).await.unwrap();
        assert_eq!(report.started, vec![task.id]);
        assert_eq!(report.running, 1);
        assert!(fx.bots.is_running(task.id));

        // nothing changes on the next tick inside the window
        let report = fx.scheduler.tick(at(12, 0)).await.unwrap();
        assert!(report.started.is_empty());
        assert!(report.stopped.is_empty());
        assert_eq!(report.running, 1);

        let report = fx.scheduler.tick(at(18, 1)).await.unwrap();
        assert_eq!(report.stopped, vec![task.id]);
        assert_eq!(report.running, 0);
        assert!(!fx.bots.is_running(task.id));
    }

    #[tokio::test]
    async fn test_forced_run_survives_window_end_but_not_disable() {
        let (fx, db) = fixture().await;
        let task = create_task(&db, "zorla", "https://www.trendyol.com/sr?q=b").await;
        fx.bots.start(task.id, &task.target_url, true).await.unwrap();

        let report = fx.scheduler.tick(at(23, 0)).await.unwrap();
        assert!(report.stopped.is_empty());
        assert_eq!(report.running, 1);

        fx.tasks.set_active(task.id, false).await.unwrap();
        let report = fx.scheduler.tick(at(23, 1)).await.unwrap();
        assert_eq!(report.stopped, vec![task.id]);
        assert!(!fx.bots.is_running(task.id));
    }

    #[tokio::test]
    async fn test_disabled_and_overnight_tasks() {
        let (fx, db) = fixture().await;
        let disabled = create_task(&db, "kapali", "https://www.trendyol.com/sr?q=c").await;
        fx.tasks.set_active(disabled.id, false).await.unwrap();
        let night = create_task(&db, "gece", "https://www.trendyol.com/sr?q=d").await;
        fx.tasks
            .update_window(night.id, Some("22:00".to_string()), Some("06:00".to_string()))
            .await
            .unwrap();

        let report = fx.scheduler.tick(at(2, 30)).await.unwrap();
        assert_eq!(report.started, vec![night.id]);
        assert!(!fx.bots.is_running(disabled.id));
    }

    #[tokio::test]
    async fn test_finished_bot_is_restarted_inside_window() {
        let (fx, db) = fixture().await;
        let task = create_task(&db, "yeniden", "https://www.trendyol.com/sr?q=e").await;
        let now = Utc::now().fixed_offset();

        let report = fx.scheduler.tick(at(10, 0)).await.unwrap();
        assert_eq!(report.started, vec![task.id]);

        // the bot records its run and exits on its own
        fx.tasks
            .mark_run_started(task.id, now, task.next_run_after(now))
            .await
            .unwrap();
        fx.bots.stop(task.id).await.unwrap();

        let report = fx.scheduler.tick(at(10, 1)).await.unwrap();
        assert_eq!(report.started, vec![task.id]);
        assert!(fx.bots.is_running(task.id));
    }

    #[tokio::test]
    async fn test_bad_window_is_isolated_to_its_task() {
        let (fx, db) = fixture().await;
        let broken = create_task(&db, "bozuk", "https://www.trendyol.com/sr?q=f").await;
        let healthy = create_task(&db, "saglam", "https://www.trendyol.com/sr?q=g").await;

        // bypass repository validation to simulate a hand-edited row
        scraping_task::Entity::update_many()
            .col_expr(scraping_task::Column::StartTime, Expr::value("9 sabah"))
            .filter(scraping_task::Column::Id.eq(broken.id))
            .exec(db.as_ref())
            .await
            .unwrap();

        let report = fx.scheduler.tick(at(10, 0)).await.unwrap();
        assert_eq!(report.failed, vec![broken.id]);
        assert_eq!(report.started, vec![healthy.id]);
    }

    #[tokio::test]
    async fn test_tick_requeues_stale_claims() {
        let (fx, db) = fixture().await;
        let task = create_task(&db, "kapali", "https://www.trendyol.com/sr?q=h").await;
        fx.tasks.set_active(task.id, false).await.unwrap();
        fx.queue.enqueue(task.id, &product_url(1), Some(1)).await.unwrap();
        fx.queue.claim(task.id, Uuid::new_v4()).await.unwrap().unwrap();

        let mut settings = settings();
        settings.stale_claim_timeout_secs = 0;
        let eager = ShiftScheduler::new(fx.tasks.clone(), fx.bots.clone(), fx.queue.clone(), settings);
        tokio::time::sleep(std::time::Duration::from_millis(20)).await;

        let report = eager.tick(at(10, 0)).await.unwrap();
        assert_eq!(report.requeued, 1);
        assert_eq!(fx.queue.stats(task.id).await.unwrap().pending, 1);
    }
}
