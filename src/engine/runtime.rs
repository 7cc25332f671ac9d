// src/engine/runtime.rs

use std::fmt;
use std::future::Future;
use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::errors::Result;

use super::dispatch::{DispatchReport, Dispatcher};
use super::queue::EventReceiver;

/// Async shell around the [`Dispatcher`].
///
/// Waits on the event queue and hands each event to the dispatcher on a
/// blocking worker. The next event is only taken once the previous dispatch
/// has finished, so pipelines never run concurrently.
pub struct Runtime {
    dispatcher: Arc<Dispatcher>,
    events: EventReceiver,
    on_report: Option<Box<dyn FnMut(DispatchReport) + Send>>,
}

impl fmt::Debug for Runtime {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Runtime")
            .field("dispatcher", &self.dispatcher)
            .finish_non_exhaustive()
    }
}

impl Runtime {
    pub fn new(dispatcher: Dispatcher, events: EventReceiver) -> Self {
        Self {
            dispatcher: Arc::new(dispatcher),
            events,
            on_report: None,
        }
    }

    /// Observe every dispatch report (used by embedders and tests).
    pub fn on_report<F>(mut self, f: F) -> Self
    where
        F: FnMut(DispatchReport) + Send + 'static,
    {
        self.on_report = Some(Box::new(f));
        self
    }

    /// Run until every event sender is dropped and the queue is drained.
    pub async fn run(self) -> Result<()> {
        self.run_until(std::future::pending::<()>()).await
    }

    /// Run until `shutdown` resolves or the queue closes.
    ///
    /// Shutdown is only observed between events; an in-flight dispatch always
    /// runs to completion.
    pub async fn run_until<F>(mut self, shutdown: F) -> Result<()>
    where
        F: Future<Output = ()>,
    {
        info!("pipewatch dispatch loop started");
        tokio::pin!(shutdown);

        let mut processed: u64 = 0;

        loop {
            let event = tokio::select! {
                biased;
                _ = &mut shutdown => {
                    info!("shutdown requested; stopping dispatch loop");
                    break;
                }
                next = self.events.next() => match next {
                    Some(e) => e,
                    None => {
                        info!("event queue closed; exiting");
                        break;
                    }
                },
            };

            debug!(path = ?event.path, kind = %event.kind, queued = self.events.len(), "dequeued change event");

            let dispatcher = Arc::clone(&self.dispatcher);
            let result = tokio::task::spawn_blocking(move || dispatcher.dispatch(&event)).await;
            processed += 1;

            match result {
                Ok(report) => {
                    debug!(triggered = ?report.triggered(), "dispatch finished");
                    if let Some(cb) = self.on_report.as_mut() {
                        cb(report);
                    }
                }
                Err(err) => {
                    warn!(error = %err, "dispatch worker failed; continuing with next event");
                }
            }
        }

        info!(processed, "dispatch loop exiting");
        Ok(())
    }
}
