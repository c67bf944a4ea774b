//! Test support
//!
//! [`ScriptedSource`] opens subscriptions without any transport and keeps
//! every sink it hands out, so tests can inject
//! lifecycle events by hand.

use std::sync::Arc;

use parking_lot::Mutex;
use url::Url;

use crate::stream::{ConnectionHandle, EventSink, EventSource};

/// An [`EventSource`] driven entirely by the caller
///
/// Clones share state, so a test can keep one clone while the client owns
/// another.
#[derive(Debug, Clone, Default)]
pub struct ScriptedSource {
    opened: Arc<Mutex<Vec<(Url, EventSink)>>>,
}

impl ScriptedSource {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total subscriptions opened so far
    pub fn open_count(&self) -> usize {
        self.opened.lock().len()
    }

    /// Subscriptions whose handle has not been closed
    pub fn live_count(&self) -> usize {
        self.opened
            .lock()
            .iter()
            .filter(|(_, sink)| !sink.is_cancelled())
            .count()
    }

    /// Sink of the subscription opened `index`-th (0-based)
    pub fn sink(&self, index: usize) -> Option<EventSink> {
        self.opened.lock().get(index).map(|(_, sink)| sink.clone())
    }

    /// Sink of the most recent subscription
    pub fn latest(&self) -> Option<EventSink> {
        self.opened.lock().last().map(|(_, sink)| sink.clone())
    }

    /// Endpoint the most recent subscription was opened against
    pub fn latest_endpoint(&self) -> Option<Url> {
        self.opened.lock().last().map(|(url, _)| url.clone())
    }
}

impl EventSource for ScriptedSource {
    fn open(&self, endpoint: &Url, sink: EventSink) -> ConnectionHandle {
        let handle = ConnectionHandle::detached(&sink);
        self.opened.lock().push((endpoint.clone(), sink));
        handle
    }
}
