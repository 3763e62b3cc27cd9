// Copyright (c) 2025 Kirky.X
//
// Licensed under the MIT License
// See LICENSE file in the project root for full license information.

#[cfg(test)]
mod tests {
    use pricepulse::config::settings::SupervisorSettings;
    use pricepulse::supervisor::{BotControl, BotStatus, BotSupervisor, StartOutcome};
    use std::path::Path;
    use std::time::Duration;
    use tempfile::TempDir;

    fn supervisor(run_dir: &Path, program: Option<String>, process_name: Option<&str>) -> BotSupervisor {
        BotSupervisor::new(&SupervisorSettings {
            run_dir: run_dir.to_string_lossy().into_owned(),
            program,
            process_name: process_name.map(str::to_string),
        })
    }

    /// 一个已经退出并被回收的进程的PID
    fn dead_pid() -> u32 {
        let mut child = std::process::Command::new("true").spawn().unwrap();
        let pid = child.id();
        child.wait().unwrap();
        pid
    }

    #[tokio::test]
    async fn test_missing_marker_means_stopped() {
        let dir = TempDir::new().unwrap();
        let bots = supervisor(dir.path(), None, Some("pricepulse-bot"));

        assert_eq!(bots.status(3).await.unwrap(), BotStatus::Stopped);
        assert!(!bots.stop(3).await.unwrap());
        assert!(!bots.is_forced(3).await.unwrap());
    }

    #[tokio::test]
    async fn test_dead_pid_marker_self_heals() {
        let dir = TempDir::new().unwrap();
        let bots = supervisor(dir.path(), None, Some("pricepulse-bot"));
        std::fs::write(bots.pid_path(7), dead_pid().to_string()).unwrap();
        std::fs::write(bots.force_path(7), "1").unwrap();

        assert_eq!(bots.status(7).await.unwrap(), BotStatus::Stopped);
        assert!(!bots.pid_path(7).exists());
        assert!(!bots.force_path(7).exists());
    }

    #[tokio::test]
    async fn test_pid_reused_by_other_program_is_not_running() {
        let dir = TempDir::new().unwrap();
        let bots = supervisor(dir.path(), None, Some("pricepulse-bot-that-never-runs"));
        // the test binary is alive but does not carry the bot's name
        std::fs::write(bots.pid_path(4), std::process::id().to_string()).unwrap();

        assert_eq!(bots.status(4).await.unwrap(), BotStatus::Stopped);
        assert!(!bots.pid_path(4).exists());
    }

    #[tokio::test]
    async fn test_unreadable_marker_is_removed() {
        let dir = TempDir::new().unwrap();
        let bots = supervisor(dir.path(), None, Some("pricepulse-bot"));
        std::fs::write(bots.pid_path(2), "not-a-pid\n").unwrap();

        assert_eq!(bots.status(2).await.unwrap(), BotStatus::Stopped);
        assert!(!bots.pid_path(2).exists());
    }

    #[tokio::test]
    async fn test_live_marker_reports_running() {
        let dir = TempDir::new().unwrap();
        let bots = supervisor(dir.path(), None, Some(""));
        let pid = std::process::id();
        std::fs::write(bots.pid_path(5), format!("{}\n", pid)).unwrap();

        assert_eq!(bots.status(5).await.unwrap(), BotStatus::Running(pid));
        assert!(bots.pid_path(5).exists());
        // starting again reports the existing process instead of spawning
        assert_eq!(
            bots.start(5, "https://www.trendyol.com/sr?q=x", false).await.unwrap(),
            StartOutcome::AlreadyRunning(pid)
        );
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn test_start_and_stop_real_process() {
        use std::os::unix::fs::PermissionsExt;

        let dir = TempDir::new().unwrap();
        let script = dir.path().join("fakebot.sh");
        std::fs::write(&script, "#!/bin/sh\necho \"bot $@\"\nsleep 30\n").unwrap();
        std::fs::set_permissions(&script, std::fs::Permissions::from_mode(0o755)).unwrap();

        let run_dir = dir.path().join("run");
        let bots = supervisor(&run_dir, Some(script.to_string_lossy().into_owned()), None);

        let outcome = bots
            .start(11, "https://www.trendyol.com/sr?q=kulaklik", true)
            .await
            .unwrap();
        let StartOutcome::Started(pid) = outcome else {
            panic!("expected a new process, got {:?}", outcome);
        };
        assert_eq!(
            std::fs::read_to_string(bots.pid_path(11)).unwrap().trim(),
            pid.to_string()
        );
        assert!(bots.is_forced(11).await.unwrap());

        let expected_args = "bot run --task-id 11 --url https://www.trendyol.com/sr?q=kulaklik";
        let mut started = false;
        for _ in 0..50 {
            let log = std::fs::read_to_string(bots.log_path(11)).unwrap_or_default();
            if log.contains(expected_args) {
                started = true;
                break;
            }
            tokio::time::sleep(Duration::from_millis(50)).await;
        }
        assert!(started, "bot process never wrote its arguments");
        assert_eq!(bots.status(11).await.unwrap(), BotStatus::Running(pid));

        assert!(bots.stop(11).await.unwrap());
        assert!(!bots.pid_path(11).exists());
        assert!(!bots.force_path(11).exists());
        assert_eq!(bots.status(11).await.unwrap(), BotStatus::Stopped);
    }
}
