//! Subscription abstraction
//!
//! An [`EventSource`] opens one subscription per [`ConnectionHandle`] and
//! reports its lifecycle as tagged [`SubscriptionEvent`]s over a channel, so
//! the state machine never touches a transport directly.

use tokio::sync::mpsc;
use tokio::task::JoinHandle;
use tokio_util::sync::{CancellationToken, WaitForCancellationFuture};
use tracing::debug;
use url::Url;

/// Lifecycle events reported by a subscription
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SubscriptionEvent {
    /// The subscription is established
    Opened,
    /// One complete event's data field
    Data(String),
    /// The subscription failed or the server ended it
    Failed(String),
}

/// A subscription event tagged with the handle generation that produced it
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceEvent {
    pub generation: u64,
    pub event: SubscriptionEvent,
}

/// Write side given to a source for one subscription
///
/// Sends are dropped once the owning handle has been closed.
#[derive(Debug, Clone)]
pub struct EventSink {
    generation: u64,
    tx: mpsc::UnboundedSender<SourceEvent>,
    cancel: CancellationToken,
}

impl EventSink {
    pub fn new(
        generation: u64,
        tx: mpsc::UnboundedSender<SourceEvent>,
        cancel: CancellationToken,
    ) -> Self {
        Self {
            generation,
            tx,
            cancel,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Whether the owning handle has been closed
    pub fn is_cancelled(&self) -> bool {
        self.cancel.is_cancelled()
    }

    /// Resolves when the owning handle is closed
    pub fn cancelled(&self) -> WaitForCancellationFuture<'_> {
        self.cancel.cancelled()
    }

    /// Deliver an event. Returns false if it was dropped.
    pub fn send(&self, event: SubscriptionEvent) -> bool {
        if self.cancel.is_cancelled() {
            debug!(generation = self.generation, "Dropping event from closed subscription");
            return false;
        }
        self.tx
            .send(SourceEvent {
                generation: self.generation,
                event,
            })
            .is_ok()
    }

    pub fn opened(&self) -> bool {
        self.send(SubscriptionEvent::Opened)
    }

    pub fn data(&self, data: impl Into<String>) -> bool {
        self.send(SubscriptionEvent::Data(data.into()))
    }

    pub fn failed(&self, reason: impl Into<String>) -> bool {
        self.send(SubscriptionEvent::Failed(reason.into()))
    }
}

/// Owned resource for one open subscription
///
/// Closing or dropping the handle cancels its sink and aborts the transport
/// task, if there is one.
#[derive(Debug)]
pub struct ConnectionHandle {
    generation: u64,
    cancel: CancellationToken,
    task: Option<JoinHandle<()>>,
}

impl ConnectionHandle {
    /// Handle whose transport runs in a spawned task
    pub fn attached(sink: &EventSink, task: JoinHandle<()>) -> Self {
        Self {
            generation: sink.generation,
            cancel: sink.cancel.clone(),
            task: Some(task),
        }
    }

    /// Handle for a source that drives the sink itself
    pub fn detached(sink: &EventSink) -> Self {
        Self {
            generation: sink.generation,
            cancel: sink.cancel.clone(),
            task: None,
        }
    }

    pub fn generation(&self) -> u64 {
        self.generation
    }

    /// Release the subscription
    pub fn close(self) {
        drop(self);
    }
}

impl Drop for ConnectionHandle {
    fn drop(&mut self) {
        self.cancel.cancel();
        if let Some(task) = self.task.take() {
            task.abort();
        }
        debug!(generation = self.generation, "Connection handle closed");
    }
}

/// Something that can open a subscription to an endpoint
pub trait EventSource {
    /// Start a subscription that reports through `sink`
    ///
    /// Must not block; the returned handle owns whatever was started.
    fn open(&self, endpoint: &Url, sink: EventSink) -> ConnectionHandle;
}

impl<S: EventSource + ?Sized> EventSource for std::sync::Arc<S> {
    fn open(&self, endpoint: &Url, sink: EventSink) -> ConnectionHandle {
        (**self).open(endpoint, sink)
    }
}
