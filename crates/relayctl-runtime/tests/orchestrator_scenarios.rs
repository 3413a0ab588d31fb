//! End-to-end orchestrator scenarios with a mocked process launcher.
//!
//! The launcher spawns `sleep` in place of the relay and the transcoders, and
//! fails for any source whose path contains `broken`.

#![cfg(unix)]

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use mockall::mock;
use relayctl_core::{
    CommandSpec, OrchestratorError, OutputHandler, Settings, SpawnError, StreamStartCause,
    SupervisionMode,
};
use relayctl_runtime::{
    LogSink, ProcessHandle, ProcessLauncher, StartOutcome, StreamOrchestrator, pidfile,
};
use tempfile::TempDir;

mock! {
    pub Launcher {}

    impl ProcessLauncher for Launcher {
        fn launch(
            &self,
            label: &str,
            command: &CommandSpec,
            output: Arc<dyn OutputHandler>,
        ) -> Result<ProcessHandle, SpawnError>;
    }
}

fn is_broken(command: &CommandSpec) -> bool {
    command.get_args().iter().any(|a| a.contains("broken"))
}

fn launcher() -> MockLauncher {
    let mut launcher = MockLauncher::new();
    launcher
        .expect_launch()
        .withf(|_, command, _| is_broken(command))
        .returning(|_, command, _| {
            Err(SpawnError::NotFound {
                program: command.program().to_path_buf(),
            })
        });
    launcher
        .expect_launch()
        .withf(|_, command, _| !is_broken(command))
        .returning(|label, _, output| {
            ProcessHandle::start(label, &CommandSpec::new("sleep").arg("30"), output)
        });
    launcher
}

fn settings() -> Settings {
    let mut settings = Settings::with_defaults();
    settings.relay_warmup_ms = 50;
    settings.stop_grace_ms = 2000;
    settings
}

async fn orchestrator_with(dir: &TempDir, files: &[&str]) -> StreamOrchestrator {
    orchestrator_from(dir, settings(), files).await
}

async fn orchestrator_from(
    dir: &TempDir,
    settings: Settings,
    files: &[&str],
) -> StreamOrchestrator {
    let orchestrator = StreamOrchestrator::new(
        settings,
        dir.path().join("mediamtx.yml"),
        Arc::new(launcher()),
        LogSink::new(),
    )
    .with_relay_pidfile(dir.path().join("relay.pid"));

    for name in files {
        let path = dir.path().join(name);
        std::fs::write(&path, b"media").unwrap();
        assert!(orchestrator.add_source(&path).await.unwrap());
    }
    orchestrator
}

fn file_name(path: &Path) -> String {
    path.file_name().unwrap().to_string_lossy().into_owned()
}

#[tokio::test]
async fn start_all_records_single_spawn_failure() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_with(&dir, &["a.mp4", "b.mp4", "broken.mp4"]).await;

    let report = orchestrator.start_all().await.unwrap();

    assert_eq!(report.started, vec![0, 1]);
    assert!(report.already_running.is_empty());
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].index, 2);
    assert!(matches!(
        report.failures[0].source,
        StreamStartCause::Spawn(SpawnError::NotFound { .. })
    ));

    let slots = orchestrator.slots().await;
    assert!(slots[0].running && slots[1].running);
    assert!(!slots[2].running);
    assert!(slots[2].pid.is_none());
    assert!(orchestrator.relay_alive().await);

    orchestrator.shutdown_all().await;
}

#[tokio::test]
async fn stop_all_keeps_slots_and_stops_relay() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_with(&dir, &["a.mp4", "b.mp4"]).await;
    orchestrator.start_all().await.unwrap();

    let pids: Vec<u32> = orchestrator
        .slots()
        .await
        .iter()
        .map(|s| s.pid.unwrap())
        .collect();
    assert!(dir.path().join("relay.pid").exists());

    orchestrator.stop_all().await;

    let slots = orchestrator.slots().await;
    assert_eq!(slots.len(), 2);
    assert!(slots.iter().all(|s| !s.running && s.pid.is_none()));
    for pid in pids {
        assert!(!pidfile::pid_exists(pid));
    }
    assert!(!orchestrator.relay_alive().await);
    assert!(!dir.path().join("relay.pid").exists());
    assert!(orchestrator.stream_urls().await.is_empty());
}

#[tokio::test]
async fn remove_first_of_three_renames_next() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_with(&dir, &["a.mp4", "b.mp4", "c.mp4"]).await;

    let removed = orchestrator.delete_one(0).await.unwrap();
    assert_eq!(file_name(removed.path()), "a.mp4");

    let slots = orchestrator.slots().await;
    assert_eq!(slots.len(), 2);
    assert_eq!(file_name(slots[0].source.path()), "b.mp4");
    assert_eq!(slots[0].name, "stream1");
    assert_eq!(slots[1].name, "stream2");
}

#[tokio::test]
async fn delete_running_slot_kills_worker_and_shifts() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_with(&dir, &["a.mp4", "b.mp4"]).await;
    orchestrator.start_one(0).await.unwrap();
    let pid = orchestrator.slots().await[0].pid.unwrap();

    orchestrator.delete_one(0).await.unwrap();

    assert!(!pidfile::pid_exists(pid));
    let slots = orchestrator.slots().await;
    assert_eq!(file_name(slots[0].source.path()), "b.mp4");
    assert!(!slots[0].running);
    // Nothing left running, relay stopped
    assert!(!orchestrator.relay_alive().await);
}

#[tokio::test]
async fn single_start_failure_surfaces_and_leaves_slot_stopped() {
    let dir = tempfile::tempdir().unwrap();
    let orchestrator = orchestrator_with(&dir, &["broken.mp4"]).await;

    let err = orchestrator.start_one(0).await.unwrap_err();
    match err {
        OrchestratorError::StreamStart(e) => {
            assert_eq!(e.index, 0);
            assert!(e.is_spawn_failure());
        }
        other => panic!("unexpected error: {other}"),
    }
    assert_eq!(orchestrator.running_count().await, 0);
    assert!(!orchestrator.relay_alive().await);
}

#[tokio::test]
async fn repeated_start_does_not_spawn_twice() {
    let dir = tempfile::tempdir().unwrap();

    let mut launcher = MockLauncher::new();
    // One relay and one worker, no more
    launcher
        .expect_launch()
        .times(2)
        .returning(|label, _, output| {
            ProcessHandle::start(label, &CommandSpec::new("sleep").arg("30"), output)
        });

    let path = dir.path().join("a.mp4");
    std::fs::write(&path, b"media").unwrap();
    let orchestrator = StreamOrchestrator::new(
        settings(),
        dir.path().join("mediamtx.yml"),
        Arc::new(launcher),
        LogSink::new(),
    );
    orchestrator.add_source(&path).await.unwrap();

    assert!(matches!(
        orchestrator.start_one(0).await.unwrap(),
        StartOutcome::Started { pid: Some(_) }
    ));
    for _ in 0..3 {
        assert_eq!(
            orchestrator.start_one(0).await.unwrap(),
            StartOutcome::AlreadyRunning
        );
    }
    let report = orchestrator.start_all().await.unwrap();
    assert_eq!(report.already_running, vec![0]);

    orchestrator.shutdown_all().await;
}

#[tokio::test]
async fn concurrent_stop_waits_for_start() {
    let dir = tempfile::tempdir().unwrap();
    // Long enough warm-up that the stop arrives while the start holds the lock
    let mut slow = settings();
    slow.relay_warmup_ms = 300;
    let orchestrator = Arc::new(orchestrator_from(&dir, slow, &["a.mp4"]).await);

    let starter = {
        let orchestrator = Arc::clone(&orchestrator);
        tokio::spawn(async move { orchestrator.start_one(0).await })
    };
    tokio::time::sleep(Duration::from_millis(50)).await;
    orchestrator.stop_one(0).await.unwrap();

    let outcome = starter.await.unwrap().unwrap();
    let StartOutcome::Started { pid: Some(pid) } = outcome else {
        panic!("start did not complete first: {outcome:?}");
    };

    let slots = orchestrator.slots().await;
    assert!(!slots[0].running);
    assert!(slots[0].pid.is_none());
    assert!(!pidfile::pid_exists(pid));
    assert!(!orchestrator.relay_alive().await);
}

#[tokio::test]
async fn config_preview_tracks_running_slots() {
    let dir = tempfile::tempdir().unwrap();
    let mut declarative = settings();
    declarative.mode = SupervisionMode::Declarative;
    let orchestrator = orchestrator_from(&dir, declarative, &["a.mp4", "b.mp4"]).await;

    let idle: serde_yaml::Value =
        serde_yaml::from_str(&orchestrator.config_preview().await.unwrap()).unwrap();
    assert!(idle["paths"].get("all").is_some());

    orchestrator.start_one(1).await.unwrap();
    let preview = orchestrator.config_preview().await.unwrap();
    let running: serde_yaml::Value = serde_yaml::from_str(&preview).unwrap();
    assert!(running["paths"].get("stream1").is_none());
    assert!(running["paths"]["stream2"]["runOnInit"].as_str().unwrap().contains("b.mp4"));
    assert_eq!(
        std::fs::read_to_string(dir.path().join("mediamtx.yml")).unwrap(),
        preview
    );

    orchestrator.shutdown_all().await;
}
