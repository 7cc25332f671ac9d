// src/session.rs

//! Registration and control API.
//!
//! A [`WatchSession`] is built during startup: rules are registered, the
//! ignore list is set, then [`WatchSession::start_watching`] hands everything
//! to the watcher and the dispatch loop. Sessions are independent of each
//! other, so several can coexist in one process.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use tracing::{info, warn};

use crate::config::model::ConfigFile;
use crate::engine::{
    event_queue, ConsoleReporter, Dispatcher, FsStreamLoader, Reporter, Runtime, StreamLoader,
    WatchRegistry, WatchRule,
};
use crate::errors::{PipewatchError, Result};
use crate::fs::{FileSystem, RealFileSystem};
use crate::stages::build_stage;
use crate::types::DispatchOptions;
use crate::watch::{spawn_watcher, EventFilter, IgnoreFilter};

pub struct WatchSession {
    registry: WatchRegistry,
    ignore: IgnoreFilter,
    options: DispatchOptions,
    fs: Arc<dyn FileSystem>,
    loader: Option<Arc<dyn StreamLoader>>,
    reporter: Arc<dyn Reporter>,
}

impl std::fmt::Debug for WatchSession {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("WatchSession")
            .field("registry", &self.registry)
            .field("ignore", &self.ignore)
            .field("options", &self.options)
            .finish_non_exhaustive()
    }
}

impl Default for WatchSession {
    fn default() -> Self {
        Self::new()
    }
}

impl WatchSession {
    /// A session on the real filesystem with the console reporter.
    pub fn new() -> Self {
        Self {
            registry: WatchRegistry::new(),
            ignore: IgnoreFilter::default(),
            options: DispatchOptions::default(),
            fs: Arc::new(RealFileSystem),
            loader: None,
            reporter: Arc::new(ConsoleReporter),
        }
    }

    /// Build a session from a validated config file.
    ///
    /// `root` is the watch root; built-in stages resolve their paths
    /// against it.
    pub fn from_config(cfg: &ConfigFile, root: &Path) -> Result<Self> {
        Self::new().apply_config(cfg, root)
    }

    /// Take options, the ignore list and rules from `cfg`.
    ///
    /// Built-in stages are bound to this session's filesystem, so set it
    /// with [`with_filesystem`](Self::with_filesystem) first.
    pub fn apply_config(mut self, cfg: &ConfigFile, root: &Path) -> Result<Self> {
        self.options = cfg.dispatch_options()?;
        self.set_ignored_globs(&cfg.watch.ignore)?;

        for rule_cfg in &cfg.rule {
            let mut rule = WatchRule::new(&rule_cfg.name, &rule_cfg.globs)?
                .with_additional_files(&rule_cfg.additional_files)?;
            for stage_cfg in &rule_cfg.pipeline {
                rule = rule.shared_stage(build_stage(stage_cfg, root, Arc::clone(&self.fs))?);
            }
            self.register_watch_rule(rule);
        }

        Ok(self)
    }

    pub fn with_options(mut self, options: DispatchOptions) -> Self {
        self.options = options;
        self
    }

    /// Use another filesystem for matching and (unless a loader is set)
    /// stream loading.
    pub fn with_filesystem(mut self, fs: Arc<dyn FileSystem>) -> Self {
        self.fs = fs;
        self
    }

    pub fn with_stream_loader(mut self, loader: Arc<dyn StreamLoader>) -> Self {
        self.loader = Some(loader);
        self
    }

    pub fn with_reporter(mut self, reporter: Arc<dyn Reporter>) -> Self {
        self.reporter = reporter;
        self
    }

    /// Append a rule; rules are evaluated in registration order.
    pub fn register_watch_rule(&mut self, rule: WatchRule) {
        info!(rule = %rule.name(), stages = rule.pipeline().len(), "registered watch rule");
        self.registry.register(rule);
    }

    /// Replace the ignore list. Fails on a malformed glob.
    pub fn set_ignored_globs<I, S>(&mut self, patterns: I) -> Result<()>
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        self.ignore = IgnoreFilter::new(patterns)?;
        Ok(())
    }

    pub fn registry(&self) -> &WatchRegistry {
        &self.registry
    }

    pub fn options(&self) -> DispatchOptions {
        self.options
    }

    /// Pre-queue filter for events under `root`.
    pub fn event_filter(&self, root: impl Into<PathBuf>) -> EventFilter {
        EventFilter::new(root, self.ignore.clone(), self.options.throttle_window)
    }

    /// Freeze the session into a dispatcher for `root`.
    ///
    /// Fails if the root cannot be resolved.
    pub fn into_dispatcher(self, root: impl AsRef<Path>) -> Result<Dispatcher> {
        let root = self.resolve_root(root.as_ref())?;
        if self.registry.is_empty() {
            warn!("no watch rules registered; changes will be ignored");
        }

        let loader = self
            .loader
            .unwrap_or_else(|| Arc::new(FsStreamLoader::new(Arc::clone(&self.fs))));

        Ok(Dispatcher::new(
            root,
            self.fs,
            Arc::new(self.registry),
            Arc::new(self.ignore),
            loader,
            self.reporter,
            self.options.failure_policy,
        ))
    }

    /// Watch `root` and dispatch changes until Ctrl-C.
    ///
    /// Returns an error if the root cannot be resolved or watched.
    pub async fn start_watching(self, root: impl AsRef<Path>) -> Result<()> {
        let root = self.resolve_root(root.as_ref())?;
        let fs = Arc::clone(&self.fs);
        let filter = Arc::new(self.event_filter(&root));
        let (tx, rx) = event_queue();

        let dispatcher = self.into_dispatcher(&root)?;
        let _watcher = spawn_watcher(&root, fs, filter, tx)?;

        let shutdown = async {
            if let Err(e) = tokio::signal::ctrl_c().await {
                warn!("failed to listen for Ctrl+C: {e}");
                std::future::pending::<()>().await;
            }
        };

        Runtime::new(dispatcher, rx).run_until(shutdown).await
    }

    fn resolve_root(&self, root: &Path) -> Result<PathBuf> {
        if !self.fs.is_dir(root) {
            return Err(PipewatchError::ConfigError(format!(
                "watch root {:?} is not a directory",
                root
            )));
        }
        Ok(self.fs.canonicalize(root)?)
    }
}
