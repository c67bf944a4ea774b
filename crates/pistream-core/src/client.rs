//! Stream client
//!
//! Owns the state machine and at most one [`ConnectionHandle`]. Sources write
//! tagged events into the client's channel; the host drains it with
//! [`StreamClient::next_event`] or [`StreamClient::poll`] and feeds each
//! event back through [`StreamClient::dispatch`] on its own loop.

use std::time::Instant;

use tokio::sync::mpsc;
use tokio_util::sync::CancellationToken;
use tracing::{debug, info};

use crate::config::StreamConfig;
use crate::state::{FailureClass, HandleAction, StreamError, StreamMachine, StreamState};
use crate::stream::{
    ConnectionHandle, EventSink, EventSource, HttpEventSource, SourceEvent, SubscriptionEvent,
};

/// Client for one π event stream
pub struct StreamClient<S: EventSource = HttpEventSource> {
    config: StreamConfig,
    source: S,
    machine: StreamMachine,
    handle: Option<ConnectionHandle>,
    /// Generation of the most recently opened handle
    generation: u64,
    tx: mpsc::UnboundedSender<SourceEvent>,
    rx: mpsc::UnboundedReceiver<SourceEvent>,
}

impl StreamClient<HttpEventSource> {
    /// Client backed by the HTTP transport
    pub fn http(config: StreamConfig) -> Result<Self, reqwest::Error> {
        let source = HttpEventSource::new(&config)?;
        Ok(Self::new(config, source))
    }
}

impl<S: EventSource> StreamClient<S> {
    pub fn new(config: StreamConfig, source: S) -> Self {
        let (tx, rx) = mpsc::unbounded_channel();
        let machine = StreamMachine::new(config.target_precision, config.liveness_window);
        Self {
            config,
            source,
            machine,
            handle: None,
            generation: 0,
            tx,
            rx,
        }
    }

    /// Lifecycle hook: the host is mounting
    pub fn start(&mut self) {
        self.connect();
    }

    /// Lifecycle hook: the host is unmounting
    pub fn stop(&mut self) {
        self.disconnect();
    }

    /// Close any current subscription and open a fresh one
    pub fn connect(&mut self) {
        self.release_handle();
        self.generation += 1;
        self.machine.begin_connect();

        let sink = EventSink::new(self.generation, self.tx.clone(), CancellationToken::new());
        info!(
            endpoint = %self.config.endpoint,
            generation = self.generation,
            "Opening stream subscription"
        );
        self.handle = Some(self.source.open(&self.config.endpoint, sink));
    }

    /// Close any open subscription and return to Idle. Safe to call anytime.
    pub fn disconnect(&mut self) {
        if self.handle.is_some() {
            info!(generation = self.generation, "Disconnecting stream");
        }
        self.release_handle();
        self.machine.reset();
    }

    /// Apply one event. Returns whether anything visible changed.
    pub fn dispatch(&mut self, event: SourceEvent) -> bool {
        self.dispatch_at(event, Instant::now())
    }

    /// Apply one event as if it arrived at `now`
    pub fn dispatch_at(&mut self, event: SourceEvent, now: Instant) -> bool {
        let current = self.handle.as_ref().map(ConnectionHandle::generation);
        if current != Some(event.generation) {
            debug!(
                event_generation = event.generation,
                current = ?current,
                "Discarding stale subscription event"
            );
            return false;
        }

        match event.event {
            SubscriptionEvent::Opened => self.machine.opened(),
            SubscriptionEvent::Data(data) => {
                if self.machine.message(&data, now) == HandleAction::Close {
                    self.release_handle();
                }
                true
            }
            SubscriptionEvent::Failed(reason) => {
                let class = self.machine.failed(&reason, now);
                self.release_handle();
                debug!(?class, "Subscription failure handled");
                class != FailureClass::Ignored
            }
        }
    }

    /// Drain every queued event without waiting. Returns whether anything changed.
    pub fn poll(&mut self) -> bool {
        let mut changed = false;
        while let Ok(event) = self.rx.try_recv() {
            changed |= self.dispatch(event);
        }
        changed
    }

    /// Wait for the next event from any subscription
    ///
    /// The client keeps its own sender, so this only returns None if the
    /// channel is closed from outside.
    pub async fn next_event(&mut self) -> Option<SourceEvent> {
        self.rx.recv().await
    }

    fn release_handle(&mut self) {
        if let Some(handle) = self.handle.take() {
            handle.close();
        }
    }

    pub fn state(&self) -> StreamState {
        self.machine.state()
    }

    pub fn pi(&self) -> &str {
        self.machine.pi()
    }

    pub fn circumference(&self) -> &str {
        self.machine.circumference()
    }

    pub fn error(&self) -> Option<&StreamError> {
        self.machine.error()
    }

    pub fn machine(&self) -> &StreamMachine {
        &self.machine
    }

    pub fn config(&self) -> &StreamConfig {
        &self.config
    }

    /// Whether a subscription handle is currently held
    pub fn is_connected(&self) -> bool {
        self.handle.is_some()
    }

    /// Generation of the most recently opened subscription
    pub fn generation(&self) -> u64 {
        self.generation
    }
}

#[cfg(test)]
mod tests {
    use std::time::Duration;

    use super::*;
    use crate::state::{ErrorKind, DECODE_ERROR_MESSAGE};
    use crate::testing::ScriptedSource;

    fn client() -> (StreamClient<ScriptedSource>, ScriptedSource) {
        let source = ScriptedSource::new();
        (
            StreamClient::new(StreamConfig::default(), source.clone()),
            source,
        )
    }

    fn digits(n: usize) -> String {
        format!(
            r#"{{"pi":"3.{}","circumference":"12345.6"}}"#,
            "1".repeat(n)
        )
    }

    fn active() -> (StreamClient<ScriptedSource>, ScriptedSource) {
        let (mut c, source) = client();
        c.start();
        source.latest().unwrap().opened();
        c.poll();
        (c, source)
    }

    #[test]
    fn test_start_opens_one_subscription() {
        let (mut c, source) = client();
        c.start();
        assert_eq!(c.state(), StreamState::Connecting);
        assert!(c.is_connected());
        assert_eq!(source.open_count(), 1);
        assert_eq!(source.live_count(), 1);

        source.latest().unwrap().opened();
        assert!(c.poll());
        assert_eq!(c.state(), StreamState::Active);
    }

    #[test]
    fn test_scenario_five_digits() {
        let (mut c, source) = active();
        source
            .latest()
            .unwrap()
            .data(r#"{"pi":"3.14159","circumference":"12345.6"}"#);
        c.poll();

        assert_eq!(c.state(), StreamState::Active);
        assert_eq!(c.pi(), "3.14159");
        assert_eq!(c.machine().precision(), 5);
        assert!(c.is_connected());
        assert_eq!(source.live_count(), 1);
    }

    #[test]
    fn test_reaching_target_closes_handle_and_stops_processing() {
        let (mut c, source) = active();
        let sink = source.latest().unwrap();

        sink.data(digits(100));
        c.poll();
        assert_eq!(c.state(), StreamState::Complete);
        assert!(!c.is_connected());
        assert_eq!(source.live_count(), 0);

        // The closed sink drops further sends
        assert!(!sink.data(digits(3)));
        c.poll();
        assert_eq!(c.machine().precision(), 100);
    }

    #[test]
    fn test_queued_events_after_completion_are_discarded() {
        let (mut c, source) = active();
        let sink = source.latest().unwrap();

        // Both queued before the client processes either
        sink.data(digits(100));
        sink.data(digits(2));
        c.poll();

        assert_eq!(c.state(), StreamState::Complete);
        assert_eq!(c.machine().precision(), 100);
    }

    #[test]
    fn test_reconnect_from_every_state_leaves_one_handle() {
        let prepare: [fn(&mut StreamClient<ScriptedSource>, &ScriptedSource); 4] = [
            |_, _| {},
            |c, s| {
                c.start();
                s.latest().unwrap().opened();
                c.poll();
            },
            |c, s| {
                c.start();
                s.latest().unwrap().failed("refused");
                c.poll();
            },
            |c, s| {
                c.start();
                s.latest().unwrap().opened();
                s.latest().unwrap().data(digits(100));
                c.poll();
            },
        ];
        let expected = [
            StreamState::Idle,
            StreamState::Active,
            StreamState::Error,
            StreamState::Complete,
        ];

        for (setup, before) in prepare.iter().zip(expected) {
            let (mut c, source) = client();
            setup(&mut c, &source);
            assert_eq!(c.state(), before);

            c.connect();
            assert_eq!(c.state(), StreamState::Connecting);
            assert_eq!(source.live_count(), 1, "from {:?}", before);
            assert!(c.error().is_none());

            source.latest().unwrap().opened();
            c.poll();
            assert_eq!(c.state(), StreamState::Active, "from {:?}", before);
        }
    }

    #[test]
    fn test_stale_events_ignored_after_reconnect() {
        let (mut c, source) = active();
        let old = source.latest().unwrap();
        old.data(digits(4));

        c.connect();
        // Queued before reconnect, tagged with the old generation
        assert!(!c.poll());
        assert_eq!(c.state(), StreamState::Connecting);
        assert_eq!(c.pi(), "3");

        let stale = SourceEvent {
            generation: old.generation(),
            event: SubscriptionEvent::Failed("late".into()),
        };
        assert!(!c.dispatch(stale));
        assert_eq!(c.state(), StreamState::Connecting);
    }

    #[test]
    fn test_benign_error_drops_handle_silently() {
        let (mut c, source) = active();
        let generation = c.generation();
        let t0 = Instant::now();

        c.dispatch_at(
            SourceEvent {
                generation,
                event: SubscriptionEvent::Data(digits(7)),
            },
            t0,
        );
        c.dispatch_at(
            SourceEvent {
                generation,
                event: SubscriptionEvent::Failed("blip".into()),
            },
            t0 + Duration::from_millis(5000),
        );

        assert_eq!(c.state(), StreamState::Active);
        assert!(c.error().is_none());
        assert!(!c.is_connected());
        assert_eq!(source.live_count(), 0);
    }

    #[test]
    fn test_real_error_surfaces_message() {
        let (mut c, source) = active();
        let generation = c.generation();
        let t0 = Instant::now();

        c.dispatch_at(
            SourceEvent {
                generation,
                event: SubscriptionEvent::Data(digits(7)),
            },
            t0,
        );
        c.dispatch_at(
            SourceEvent {
                generation,
                event: SubscriptionEvent::Failed("reset".into()),
            },
            t0 + Duration::from_millis(5001),
        );

        assert_eq!(c.state(), StreamState::Error);
        let error = c.error().unwrap();
        assert_eq!(error.kind, ErrorKind::Connectivity);
        assert!(!error.message.is_empty());
        assert_eq!(source.live_count(), 0);
    }

    #[test]
    fn test_decode_failure_leaves_connection_open() {
        let (mut c, source) = active();
        let sink = source.latest().unwrap();
        sink.data(digits(3));
        sink.data("{\"pi\": 3}");
        c.poll();

        assert_eq!(c.state(), StreamState::Error);
        assert_eq!(c.error().unwrap().message, DECODE_ERROR_MESSAGE);
        assert_eq!(c.machine().precision(), 3);
        assert!(c.is_connected());

        sink.data(digits(4));
        c.poll();
        assert_eq!(c.state(), StreamState::Active);
        assert!(c.error().is_none());
    }

    #[test]
    fn test_disconnect_is_safe_without_handle() {
        let (mut c, source) = client();
        c.disconnect();
        c.stop();
        assert_eq!(c.state(), StreamState::Idle);
        assert_eq!(source.open_count(), 0);
    }

    #[test]
    fn test_stop_closes_handle_and_suppresses_callbacks() {
        let (mut c, source) = active();
        let sink = source.latest().unwrap();

        c.stop();
        assert_eq!(c.state(), StreamState::Idle);
        assert_eq!(source.live_count(), 0);

        assert!(!sink.data(digits(9)));
        assert!(!c.poll());
        assert_eq!(c.pi(), "3");
    }

    #[tokio::test]
    async fn test_next_event_delivers_in_order() {
        let (mut c, source) = client();
        c.start();
        let sink = source.latest().unwrap();
        sink.opened();
        sink.data(digits(2));

        let first = c.next_event().await.unwrap();
        assert_eq!(first.event, SubscriptionEvent::Opened);
        assert!(c.dispatch(first));

        let second = c.next_event().await.unwrap();
        assert!(c.dispatch(second));
        assert_eq!(c.machine().precision(), 2);
    }
}
