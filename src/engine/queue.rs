// src/engine/queue.rs

use tokio::sync::mpsc;

use crate::watch::event::ChangeEvent;

/// Create a connected producer/consumer pair for accepted change events.
///
/// The queue is an unbounded FIFO: producers (watcher callback threads)
/// never block and get no backpressure signal; the single consumer receives
/// events in the order they were accepted.
pub fn event_queue() -> (EventSender, EventReceiver) {
    let (tx, rx) = mpsc::unbounded_channel();
    (EventSender { tx }, EventReceiver { rx })
}

/// Producer side. Cheap to clone; safe to use from any thread.
#[derive(Debug, Clone)]
pub struct EventSender {
    tx: mpsc::UnboundedSender<ChangeEvent>,
}

impl EventSender {
    /// Push an event. Returns `false` if the consumer has gone away.
    pub fn enqueue(&self, event: ChangeEvent) -> bool {
        self.tx.send(event).is_ok()
    }
}

/// Consumer side, owned by the dispatch loop.
#[derive(Debug)]
pub struct EventReceiver {
    rx: mpsc::UnboundedReceiver<ChangeEvent>,
}

impl EventReceiver {
    /// Take the next event if one is queued, without waiting.
    pub fn try_dequeue(&mut self) -> Option<ChangeEvent> {
        self.rx.try_recv().ok()
    }

    /// Wait for the next event. Returns `None` once every sender is dropped
    /// and the queue is drained.
    pub async fn next(&mut self) -> Option<ChangeEvent> {
        self.rx.recv().await
    }

    /// Number of events waiting.
    pub fn len(&self) -> usize {
        self.rx.len()
    }

    pub fn is_empty(&self) -> bool {
        self.rx.is_empty()
    }
}
