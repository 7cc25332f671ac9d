// tests/watcher_notify.rs
//
// End-to-end through a real `notify` watcher on a temp directory.

mod common;
use crate::common::fakes::{call_log, RecordingStage};
use crate::common::{init_tracing, with_timeout};

use std::error::Error;
use std::sync::Arc;
use std::time::Duration;

use tokio::sync::mpsc;

use pipewatch::engine::{event_queue, DispatchReport, Runtime, Trigger, WatchRule};
use pipewatch::fs::RealFileSystem;
use pipewatch::session::WatchSession;
use pipewatch::watch::spawn_watcher;

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn test_saving_a_watched_file_runs_its_pipeline() -> TestResult {
    with_timeout(async {
        init_tracing();
        let dir = tempfile::tempdir()?;
        let root = std::fs::canonicalize(dir.path())?;
        std::fs::write(root.join("other.txt"), "x")?;

        let log = call_log();
        let mut session = WatchSession::new();
        session.set_ignored_globs(["*.tmp"])?;
        session.register_watch_rule(
            WatchRule::new("styles", ["*.css"])?.stage(RecordingStage::new("compile", &log)),
        );

        let filter = Arc::new(session.event_filter(&root));
        let (tx, rx) = event_queue();
        let dispatcher = session.into_dispatcher(&root)?;
        let _watcher = spawn_watcher(&root, Arc::new(RealFileSystem), filter, tx)?;

        let (report_tx, mut report_rx) = mpsc::unbounded_channel::<DispatchReport>();
        let runtime = Runtime::new(dispatcher, rx).on_report(move |report| {
            let _ = report_tx.send(report);
        });
        let (stop_tx, stop_rx) = tokio::sync::oneshot::channel::<()>();
        let handle = tokio::spawn(runtime.run_until(async {
            let _ = stop_rx.await;
        }));

        // Give the backend a moment to register the watch.
        tokio::time::sleep(Duration::from_millis(200)).await;
        std::fs::write(root.join("scratch.tmp"), "ignored")?;
        std::fs::write(root.join("a.css"), "body {}")?;

        let mut direct = None;
        while let Some(report) = report_rx.recv().await {
            assert_ne!(report.relative.as_deref(), Some("scratch.tmp"));
            if let Some(run) = report.run_for("styles") {
                direct = Some((run.trigger, run.inputs.clone()));
                break;
            }
        }

        let _ = stop_tx.send(());
        handle.await??;

        let (trigger, inputs) = direct.ok_or("no pipeline run observed")?;
        assert!(matches!(trigger, Trigger::Direct | Trigger::AdditionalFile));
        assert_eq!(inputs, vec!["a.css"]);
        assert!(!log.lock().unwrap().is_empty());
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn test_watching_a_missing_root_fails() -> TestResult {
    let dir = tempfile::tempdir()?;
    let missing = dir.path().join("nope");
    let result = WatchSession::new().start_watching(&missing).await;
    assert!(result.is_err());
    Ok(())
}
