// tests/runtime_queue.rs

mod common;
use crate::common::fakes::RecordingStage;
use crate::common::{changed, init_tracing, with_timeout, Fixture};

use std::error::Error;
use std::sync::{Arc, Mutex};

use pipewatch::engine::{event_queue, Runtime, WatchRule};

type TestResult = Result<(), Box<dyn Error>>;

#[tokio::test]
async fn test_events_are_dispatched_in_fifo_order() -> TestResult {
    with_timeout(async {
        init_tracing();
        let fx = Fixture::new(&["a.css", "b.css", "c.css"]);
        let mut session = fx.session();
        session.register_watch_rule(
            WatchRule::new("styles", ["*.css"])?.stage(RecordingStage::new("compile", &fx.log)),
        );
        let dispatcher = fx.dispatcher(session);

        let (tx, rx) = event_queue();
        for name in ["b.css", "a.css", "c.css"] {
            assert!(tx.enqueue(changed(name)));
        }
        drop(tx);

        let seen = Arc::new(Mutex::new(Vec::new()));
        let sink = Arc::clone(&seen);
        Runtime::new(dispatcher, rx)
            .on_report(move |report| sink.lock().unwrap().push(report.relative.clone()))
            .run()
            .await?;

        let seen = seen.lock().unwrap().clone();
        assert_eq!(
            seen,
            vec![
                Some("b.css".to_string()),
                Some("a.css".to_string()),
                Some("c.css".to_string())
            ]
        );
        let streams: Vec<Vec<String>> = fx
            .log
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.streams.clone())
            .collect();
        assert_eq!(streams, vec![vec!["b.css"], vec!["a.css"], vec!["c.css"]]);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn test_shutdown_stops_before_the_next_event() -> TestResult {
    with_timeout(async {
        let fx = Fixture::new(&["a.css"]);
        let mut session = fx.session();
        session.register_watch_rule(
            WatchRule::new("styles", ["*.css"])?.stage(RecordingStage::new("compile", &fx.log)),
        );
        let dispatcher = fx.dispatcher(session);

        let (tx, rx) = event_queue();
        tx.enqueue(changed("a.css"));

        Runtime::new(dispatcher, rx).run_until(async {}).await?;

        assert!(fx.log.lock().unwrap().is_empty());
        drop(tx);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[tokio::test]
async fn test_events_queued_while_a_pipeline_runs_are_processed_afterwards() -> TestResult {
    with_timeout(async {
        let fx = Fixture::new(&["a.css", "b.css"]);
        let (tx, rx) = event_queue();

        // The first pipeline enqueues another event while it is running.
        let producer = tx.clone();
        let mut session = fx.session();
        session.register_watch_rule(
            WatchRule::new("styles", ["*.css"])?
                .stage(RecordingStage::new("compile", &fx.log))
                .stage_fn("requeue", move |state| {
                    if state.names() == vec!["a.css"] {
                        producer.enqueue(changed("b.css"));
                    }
                    Ok(())
                }),
        );
        let dispatcher = fx.dispatcher(session);

        tx.enqueue(changed("a.css"));
        drop(tx);

        let count = Arc::new(Mutex::new(0usize));
        let counter = Arc::clone(&count);
        let runtime = Runtime::new(dispatcher, rx).on_report(move |_| {
            *counter.lock().unwrap() += 1;
        });

        // The requeue stage keeps a sender alive inside the dispatcher, so
        // stop once both events were seen.
        let done = {
            let count = Arc::clone(&count);
            async move {
                while *count.lock().unwrap() < 2 {
                    tokio::time::sleep(std::time::Duration::from_millis(5)).await;
                }
            }
        };
        runtime.run_until(done).await?;

        let order: Vec<Vec<String>> = fx
            .log
            .lock()
            .unwrap()
            .iter()
            .map(|c| c.streams.clone())
            .collect();
        assert_eq!(order, vec![vec!["a.css"], vec!["b.css"]]);
        Ok::<(), Box<dyn Error>>(())
    })
    .await
}

#[test]
fn test_queue_is_fifo_and_reports_a_closed_consumer() {
    let (tx, mut rx) = event_queue();
    assert!(rx.is_empty());

    tx.enqueue(changed("one"));
    tx.enqueue(changed("two"));
    assert_eq!(rx.len(), 2);

    assert_eq!(rx.try_dequeue().unwrap().path, common::abs("one"));
    assert_eq!(rx.try_dequeue().unwrap().path, common::abs("two"));
    assert!(rx.try_dequeue().is_none());

    drop(rx);
    assert!(!tx.enqueue(changed("three")));
}
