//! End-to-end runs with real scripts and a real filesystem subscription.
#![cfg(unix)]

use std::os::unix::fs::PermissionsExt;
use std::path::{Path, PathBuf};
use std::time::Duration;

use pretty_assertions::assert_eq;
use serial_test::serial;
use tempfile::TempDir;
use tokio_util::sync::CancellationToken;
use watchmod_directory_watcher::{Orchestrator, RunMode, WatchConfig};

/// Write a script that appends `tag` to `log` each time it runs.
fn counting_script(dir: &Path, name: &str, log: &Path, tag: &str) -> PathBuf {
    let path = dir.join(name);
    let body = format!("#!/bin/sh\necho {tag} >> '{}'\n", log.display());
    std::fs::write(&path, body).unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();
    path
}

fn lines(log: &Path) -> Vec<String> {
    std::fs::read_to_string(log)
        .map(|text| text.lines().map(String::from).collect())
        .unwrap_or_default()
}

#[tokio::test]
#[serial]
async fn one_shot_runs_every_command_once_and_returns() {
    let scripts = TempDir::new().unwrap();
    let log = scripts.path().join("runs.log");
    let run1 = counting_script(scripts.path(), "run1.sh", &log, "run1");
    let run2 = counting_script(scripts.path(), "run2.sh", &log, "run2");

    // The watched directories never exist; one-shot mode must not register them.
    let config = WatchConfig::new()
        .with_target("/nonexistent/watchmod/a", run1.to_string_lossy())
        .with_target("/nonexistent/watchmod/b", run2.to_string_lossy());

    let report = Orchestrator::new(&config)
        .unwrap()
        .start(RunMode::OneShot, CancellationToken::new())
        .await
        .unwrap();

    assert_eq!(report.startup_runs, 2);
    let mut runs = lines(&log);
    runs.sort();
    assert_eq!(runs, vec!["run1", "run2"]);
}

#[tokio::test]
#[serial]
async fn daemon_runs_on_start_and_reacts_to_changes() {
    let watched = TempDir::new().unwrap();
    let scripts = TempDir::new().unwrap();
    let log = scripts.path().join("runs.log");
    let build = counting_script(scripts.path(), "build.sh", &log, "build");

    let config = WatchConfig::new()
        .with_target(watched.path().to_string_lossy(), build.to_string_lossy())
        .exclude_file_name("ignore.txt")
        .run_on_start(true)
        .print_stdout(false);

    let orchestrator = Orchestrator::new(&config).unwrap();
    let cancel = CancellationToken::new();
    let daemon = {
        let cancel = cancel.clone();
        tokio::spawn(async move { orchestrator.start(RunMode::Daemon, cancel).await })
    };

    // Keep touching a file until the watcher is subscribed and has run the
    // command for it at least once.
    let changed = watched.path().join("main.go");
    let mut reacted = false;
    for i in 0..100 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if lines(&log).len() >= 2 {
            reacted = true;
            break;
        }
        std::fs::write(&changed, format!("// {i}\n")).unwrap();
    }
    assert!(reacted, "no run after changing {}", changed.display());
    assert!(!daemon.is_finished(), "daemon exited while watching");

    cancel.cancel();
    let report = tokio::time::timeout(Duration::from_secs(10), daemon)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
    assert_eq!(report.startup_runs, 1);
}

#[tokio::test]
#[serial]
async fn failing_command_keeps_daemon_alive() {
    let watched = TempDir::new().unwrap();
    let scripts = TempDir::new().unwrap();
    let log = scripts.path().join("runs.log");
    let path = scripts.path().join("fail.sh");
    std::fs::write(
        &path,
        format!("#!/bin/sh\necho fail >> '{}'\nexit 1\n", log.display()),
    )
    .unwrap();
    std::fs::set_permissions(&path, std::fs::Permissions::from_mode(0o755)).unwrap();

    let config =
        WatchConfig::new().with_target(watched.path().to_string_lossy(), path.to_string_lossy());
    let orchestrator = Orchestrator::new(&config).unwrap();
    let cancel = CancellationToken::new();
    let daemon = {
        let cancel = cancel.clone();
        tokio::spawn(async move { orchestrator.start(RunMode::Daemon, cancel).await })
    };

    let changed = watched.path().join("main.go");
    for i in 0..100 {
        tokio::time::sleep(Duration::from_millis(100)).await;
        if lines(&log).len() >= 2 {
            break;
        }
        std::fs::write(&changed, format!("// {i}\n")).unwrap();
    }
    assert!(lines(&log).len() >= 2, "second change did not run the command");
    assert!(!daemon.is_finished());

    cancel.cancel();
    tokio::time::timeout(Duration::from_secs(10), daemon)
        .await
        .unwrap()
        .unwrap()
        .unwrap();
}
