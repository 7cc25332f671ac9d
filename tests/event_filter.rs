// tests/event_filter.rs

mod common;
use crate::common::{abs, ROOT};

use std::path::Path;
use std::time::{Duration, Instant};

use pipewatch::fs::mock::MockFileSystem;
use pipewatch::types::DEFAULT_THROTTLE_WINDOW;
use pipewatch::watch::{ChangeEvent, ChangeKind, EventFilter, IgnoreFilter, Throttle};

fn ms(n: u64) -> Duration {
    Duration::from_millis(n)
}

#[test]
fn second_event_within_the_window_is_dropped() {
    let throttle = Throttle::new(DEFAULT_THROTTLE_WINDOW);
    let p = Path::new("/site/a.css");
    let t0 = Instant::now();

    assert!(throttle.should_accept_at(p, t0));
    assert!(!throttle.should_accept_at(p, t0 + ms(10)));
}

#[test]
fn window_boundary_is_inclusive() {
    let throttle = Throttle::new(ms(30));
    let p = Path::new("/site/a.css");
    let t0 = Instant::now();

    assert!(throttle.should_accept_at(p, t0));
    assert!(!throttle.should_accept_at(p, t0 + ms(30)));
    assert!(throttle.should_accept_at(p, t0 + ms(31)));
}

#[test]
fn dropped_events_do_not_extend_the_window() {
    let throttle = Throttle::new(ms(30));
    let p = Path::new("/site/a.css");
    let t0 = Instant::now();

    assert!(throttle.should_accept_at(p, t0));
    assert!(!throttle.should_accept_at(p, t0 + ms(20)));
    assert!(throttle.should_accept_at(p, t0 + ms(35)));
}

#[test]
fn paths_are_throttled_independently() {
    let throttle = Throttle::new(ms(30));
    let t0 = Instant::now();

    assert!(throttle.should_accept_at(Path::new("/site/a.css"), t0));
    assert!(throttle.should_accept_at(Path::new("/site/b.css"), t0 + ms(1)));
    assert_eq!(throttle.tracked(), 2);
}

#[test]
fn expired_entries_are_swept() {
    let throttle = Throttle::new(ms(30));
    let t0 = Instant::now();
    for name in ["a", "b", "c"] {
        assert!(throttle.should_accept_at(&abs(name), t0));
    }
    assert_eq!(throttle.tracked(), 3);

    throttle.sweep(t0 + Duration::from_secs(1));
    assert_eq!(throttle.tracked(), 0);
}

#[test]
fn table_is_swept_while_accepting_new_paths() {
    let throttle = Throttle::new(ms(30));
    let t0 = Instant::now();

    assert!(throttle.should_accept_at(&abs("old"), t0));
    assert!(throttle.should_accept_at(&abs("new"), t0 + Duration::from_secs(6)));

    assert_eq!(throttle.tracked(), 1);
}

#[test]
fn ignore_globs_match_relative_and_absolute_paths() {
    let ignore = IgnoreFilter::new(["**/*.tmp", "/site/cache/**"]).unwrap();

    assert!(ignore.is_ignored(Path::new("/site/x/y.tmp"), Some("x/y.tmp")));
    assert!(ignore.is_ignored(Path::new("/site/cache/v1"), Some("cache/v1")));
    assert!(!ignore.is_ignored(Path::new("/site/x/y.css"), Some("x/y.css")));
}

#[test]
fn ignore_entries_also_match_as_literal_prefixes() {
    let ignore = IgnoreFilter::new(["dist", ".git"]).unwrap();

    assert!(ignore.is_ignored(Path::new("/site/dist/app.js"), Some("dist/app.js")));
    assert!(ignore.is_ignored(Path::new("/site/.git/HEAD"), Some(".git/HEAD")));
    assert!(!ignore.is_ignored(Path::new("/site/src/dist.rs"), Some("src/dist.rs")));
    assert!(ignore.is_ignored(Path::new("/site/dist"), Some("dist")));

    // Only whole path components count.
    assert!(!ignore.is_ignored(Path::new("/site/distribution.css"), Some("distribution.css")));
    assert!(!ignore.is_ignored(Path::new("/site/dist-old/a.js"), Some("dist-old/a.js")));
    assert!(!ignore.is_ignored(Path::new("/site/.gitignore"), Some(".gitignore")));
    assert!(!ignore.is_ignored(
        Path::new("/site/.github/workflows/ci.yml"),
        Some(".github/workflows/ci.yml")
    ));
}

#[test]
fn absolute_ignore_entries_match_on_component_boundaries() {
    let ignore = IgnoreFilter::new(["/site/build/"]).unwrap();
    assert!(ignore.is_ignored(Path::new("/site/build/out.css"), None));
    assert!(!ignore.is_ignored(Path::new("/site/builder.css"), None));
}

#[test]
fn empty_ignore_list_ignores_nothing() {
    let ignore = IgnoreFilter::default();
    assert!(!ignore.is_ignored(Path::new("/site/a.css"), Some("a.css")));
}

#[test]
fn ignored_events_never_reach_the_throttle() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("dist/app.css"), "x");
    fs.add_file(abs("a.css"), "x");
    let filter = EventFilter::new(ROOT, IgnoreFilter::new(["dist"]).unwrap(), ms(30));

    let ignored = ChangeEvent::new(abs("dist/app.css"), ChangeKind::Changed);
    let kept = ChangeEvent::new(abs("a.css"), ChangeKind::Changed);

    assert!(!filter.should_accept(&fs, &ignored));
    assert_eq!(filter.throttle().tracked(), 0);
    assert!(filter.should_accept(&fs, &kept));
    assert_eq!(filter.throttle().tracked(), 1);
}

#[test]
fn filter_throttles_on_the_event_timestamp() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("a.css"), "x");
    let filter = EventFilter::new(ROOT, IgnoreFilter::default(), ms(30));
    let t0 = Instant::now();

    let first = ChangeEvent::at(abs("a.css"), ChangeKind::Changed, t0);
    let burst = ChangeEvent::at(abs("a.css"), ChangeKind::Changed, t0 + ms(5));
    let later = ChangeEvent::at(abs("a.css"), ChangeKind::Changed, t0 + ms(100));

    assert!(filter.should_accept(&fs, &first));
    assert!(!filter.should_accept(&fs, &burst));
    assert!(filter.should_accept(&fs, &later));
}

#[test]
fn deleted_files_are_still_filtered_by_relative_path() {
    let fs = MockFileSystem::new();
    fs.add_file(abs("keep.css"), "x");
    let filter = EventFilter::new(ROOT, IgnoreFilter::new(["*.bak"]).unwrap(), ms(30));

    let gone = ChangeEvent::new(abs("old.bak"), ChangeKind::Deleted);
    assert!(!filter.should_accept(&fs, &gone));
}
