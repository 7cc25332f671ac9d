// src/engine/mod.rs

//! Dispatch engine for pipewatch.
//!
//! This module ties together:
//! - the event queue between watcher callbacks and the consumer
//! - the rule registry
//! - the pipeline carrier and its collaborators (stages, stream loader,
//!   progress reporter)
//! - the dispatch loop
//!
//! The synchronous matching/execution core lives in [`dispatch`]; the async
//! shell that waits on the queue is [`runtime`].

pub mod dispatch;
pub mod pipeline;
pub mod queue;
pub mod registry;
pub mod report;
pub mod runtime;

pub use dispatch::{DispatchReport, Dispatcher, RuleRun, Trigger};
pub use pipeline::{
    FnStage, FsStreamLoader, PipeStream, PipelineState, Stage, StageOutcome, StageReport,
    StreamEdit, StreamLoader,
};
pub use queue::{event_queue, EventReceiver, EventSender};
pub use registry::{WatchRegistry, WatchRule};
pub use report::{ConsoleReporter, Reporter};
pub use runtime::Runtime;
pub use crate::types::FailurePolicy;
