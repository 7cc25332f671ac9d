// tests/stage_failures.rs

mod common;
use crate::common::fakes::{stage_order, FailingStage, PanickingStage, RecordingStage, Reported};
use crate::common::{changed, init_tracing, Fixture};

use pipewatch::engine::{PipeStream, StageOutcome, WatchRule};
use pipewatch::types::{DispatchOptions, FailurePolicy};

fn with_policy(fx: &Fixture, policy: FailurePolicy) -> pipewatch::session::WatchSession {
    fx.session().with_options(DispatchOptions {
        failure_policy: policy,
        ..DispatchOptions::default()
    })
}

#[test]
fn continue_policy_runs_the_stages_after_a_failure() {
    init_tracing();
    let fx = Fixture::new(&["a.css"]);
    let mut session = with_policy(&fx, FailurePolicy::Continue);
    session.register_watch_rule(
        WatchRule::new("styles", ["*.css"])
            .unwrap()
            .stage(RecordingStage::new("one", &fx.log))
            .stage(FailingStage::new("two", &fx.log))
            .stage(RecordingStage::new("three", &fx.log)),
    );
    let dispatcher = fx.dispatcher(session);

    let report = dispatcher.dispatch(&changed("a.css"));

    assert_eq!(stage_order(&fx.log), vec!["one", "two", "three"]);
    let run = report.run_for("styles").unwrap();
    assert_eq!(run.stages[0].outcome, StageOutcome::Succeeded);
    assert!(matches!(&run.stages[1].outcome, StageOutcome::Failed(cause) if cause.contains("two blew up")));
    assert_eq!(run.stages[2].outcome, StageOutcome::Succeeded);
    assert_eq!(
        fx.reporter.stage_failures(),
        vec![("styles".to_string(), "two".to_string())]
    );
    assert_eq!(fx.reporter.finished_count(), 1);
}

#[test]
fn abort_policy_skips_the_remaining_stages() {
    init_tracing();
    let fx = Fixture::new(&["a.css"]);
    let mut session = with_policy(&fx, FailurePolicy::Abort);
    session.register_watch_rule(
        WatchRule::new("styles", ["*.css"])
            .unwrap()
            .stage(RecordingStage::new("one", &fx.log))
            .stage(FailingStage::new("two", &fx.log))
            .stage(RecordingStage::new("three", &fx.log)),
    );
    let dispatcher = fx.dispatcher(session);

    let report = dispatcher.dispatch(&changed("a.css"));

    assert_eq!(stage_order(&fx.log), vec!["one", "two"]);
    let run = report.run_for("styles").unwrap();
    assert_eq!(run.stages.len(), 3);
    assert_eq!(run.stages[2].outcome, StageOutcome::Skipped);
    assert_eq!(run.failed_stages().count(), 1);
    assert_eq!(fx.reporter.finished_count(), 1);
}

#[test]
fn a_failing_rule_does_not_stop_later_rules() {
    for policy in [FailurePolicy::Continue, FailurePolicy::Abort] {
        let fx = Fixture::new(&["a.css"]);
        let mut session = with_policy(&fx, policy);
        session.register_watch_rule(
            WatchRule::new("broken", ["*.css"])
                .unwrap()
                .stage(FailingStage::new("broken-1", &fx.log)),
        );
        session.register_watch_rule(
            WatchRule::new("healthy", ["*.css"])
                .unwrap()
                .stage(RecordingStage::new("healthy-1", &fx.log)),
        );
        let dispatcher = fx.dispatcher(session);

        let report = dispatcher.dispatch(&changed("a.css"));

        assert_eq!(report.triggered(), vec!["broken", "healthy"]);
        assert_eq!(stage_order(&fx.log), vec!["broken-1", "healthy-1"]);
        assert_eq!(report.run_for("healthy").unwrap().failed_stages().count(), 0);
    }
}

#[test]
fn a_panicking_stage_is_contained() {
    init_tracing();
    let fx = Fixture::new(&["a.css"]);
    let mut session = fx.session();
    session.register_watch_rule(
        WatchRule::new("styles", ["*.css"])
            .unwrap()
            .stage(PanickingStage::new("boom", &fx.log))
            .stage(RecordingStage::new("after", &fx.log)),
    );
    session.register_watch_rule(
        WatchRule::new("other", ["*.css"])
            .unwrap()
            .stage(RecordingStage::new("other-1", &fx.log)),
    );
    let dispatcher = fx.dispatcher(session);

    let report = dispatcher.dispatch(&changed("a.css"));

    let run = report.run_for("styles").unwrap();
    assert!(matches!(&run.stages[0].outcome, StageOutcome::Failed(cause) if cause.contains("boom panicked")));
    assert_eq!(stage_order(&fx.log), vec!["boom", "after", "other-1"]);
    assert!(fx.reporter.events().iter().any(|e| matches!(
        e,
        Reported::StageFailed { stage, .. } if stage == "boom"
    )));
}

#[test]
fn a_panic_inside_retain_still_releases_every_stream() {
    let fx = Fixture::new(&["a.css", "b.css", "c.css", "vars.less"]);
    let mut session = fx.session();
    session.register_watch_rule(
        WatchRule::new("styles", ["*.css"])
            .unwrap()
            .with_additional_files(["vars.less"])
            .unwrap()
            .stage_fn("picky", |state| {
                state.retain(|s| {
                    if s.name() == "b.css" {
                        panic!("cannot judge b.css");
                    }
                    s.name() != "a.css"
                });
                Ok(())
            }),
    );
    let dispatcher = fx.dispatcher(session);

    let report = dispatcher.dispatch(&changed("vars.less"));

    let run = report.run_for("styles").unwrap();
    assert!(matches!(&run.stages[0].outcome, StageOutcome::Failed(cause) if cause.contains("cannot judge b.css")));
    assert_eq!(fx.loader.opened().len(), 3);
    assert!(fx.loader.leaked().is_empty());
    assert_eq!(run.released, 3);
}

#[test]
fn later_stages_see_what_a_failed_stage_left_behind() {
    let fx = Fixture::new(&["a.css"]);
    let mut session = fx.session();
    session.register_watch_rule(
        WatchRule::new("styles", ["*.css"])
            .unwrap()
            .stage_fn("half-done", |state| {
                state.push(PipeStream::new("partial.css", "x"));
                anyhow::bail!("gave up halfway")
            })
            .stage(RecordingStage::new("next", &fx.log)),
    );
    let dispatcher = fx.dispatcher(session);

    dispatcher.dispatch(&changed("a.css"));

    assert_eq!(fx.log.lock().unwrap()[0].streams, vec!["a.css", "partial.css"]);
}

#[test]
fn failure_policy_parses_from_text() {
    assert_eq!("continue".parse::<FailurePolicy>().unwrap(), FailurePolicy::Continue);
    assert_eq!(" Abort ".parse::<FailurePolicy>().unwrap(), FailurePolicy::Abort);
    assert!("sometimes".parse::<FailurePolicy>().is_err());
    assert_eq!(FailurePolicy::default(), FailurePolicy::Continue);
}
