//! Application loop
//!
//! One task drives everything: terminal input, subscription events, the
//! reconnect timer and an animation tick all meet in a single `select!`.

use std::time::Duration;

use anyhow::Result;
use crossterm::event::{Event, EventStream, KeyCode, KeyEvent, KeyEventKind, KeyModifiers};
use futures::StreamExt;
use pistream_core::{EventSource, HttpEventSource, StreamClient, StreamState};
use ratatui::{backend::Backend, Frame, Terminal};
use tokio::time::{sleep_until, Instant, MissedTickBehavior};

use super::render::{self, ViewModel};
use super::themes::Theme;
use crate::reconnect::AutoReconnect;

/// Spinner and countdown refresh rate
const TICK_RATE: Duration = Duration::from_millis(120);

pub struct App<S: EventSource = HttpEventSource> {
    client: StreamClient<S>,
    theme: Theme,
    reconnect: AutoReconnect,
    endpoint: String,
    tick: usize,
    should_quit: bool,
}

impl<S: EventSource> App<S> {
    pub fn new(client: StreamClient<S>, theme: Theme, reconnect: AutoReconnect) -> Self {
        let endpoint = client.config().endpoint.to_string();
        Self {
            client,
            theme,
            reconnect,
            endpoint,
            tick: 0,
            should_quit: false,
        }
    }

    /// Run until quit. The subscription is opened on entry and closed on exit.
    pub async fn run<B: Backend>(&mut self, terminal: &mut Terminal<B>) -> Result<()> {
        let mut events = EventStream::new();
        let mut tick = tokio::time::interval(TICK_RATE);
        tick.set_missed_tick_behavior(MissedTickBehavior::Skip);

        tracing::info!(endpoint = %self.endpoint, "Starting stream");
        self.client.start();

        let result = loop {
            if self.should_quit {
                break Ok(());
            }
            if let Err(e) = terminal.draw(|f| self.render_frame(f)) {
                break Err(e.into());
            }

            let reconnect_at = self.reconnect.deadline();
            tokio::select! {
                biased;

                maybe_event = events.next() => match maybe_event {
                    Some(Ok(event)) => self.handle_event(event),
                    Some(Err(e)) => break Err(e.into()),
                    None => self.should_quit = true,
                },

                Some(event) = self.client.next_event() => {
                    let before = self.client.state();
                    let mut changed = self.client.dispatch(event);
                    changed |= self.client.poll();
                    if changed {
                        self.after_change(before);
                    }
                }

                _ = sleep_until(reconnect_at.unwrap_or_else(Instant::now)), if reconnect_at.is_some() => {
                    if self.reconnect.take_due(Instant::now()) {
                        tracing::info!(attempt = self.reconnect.attempts(), "Reconnecting");
                        self.client.connect();
                        self.observe();
                    }
                }

                _ = tick.tick() => {
                    self.tick = self.tick.wrapping_add(1);
                    self.process_pending();
                }
            }
        };

        self.client.stop();
        tracing::info!("Stream stopped");
        result
    }

    fn render_frame(&self, f: &mut Frame) {
        let view = ViewModel {
            machine: self.client.machine(),
            theme: &self.theme,
            endpoint: &self.endpoint,
            reconnect_in: self.reconnect.remaining(Instant::now()),
            reconnect_exhausted: self.reconnect.is_exhausted(),
            connected: self.client.is_connected(),
            tick: self.tick,
        };
        render::draw(f, &view);
    }

    fn handle_event(&mut self, event: Event) {
        if let Event::Key(key) = event {
            self.handle_key(key);
        }
    }

    pub fn handle_key(&mut self, key: KeyEvent) {
        if key.kind != KeyEventKind::Press {
            return;
        }
        match key.code {
            KeyCode::Char('c') if key.modifiers.contains(KeyModifiers::CONTROL) => {
                self.should_quit = true;
            }
            KeyCode::Char('q') | KeyCode::Esc => self.should_quit = true,
            KeyCode::Char('r') | KeyCode::Char('R') => {
                tracing::info!("Manual reconnect");
                self.reconnect.reset();
                self.client.connect();
                self.observe();
            }
            _ => {}
        }
    }

    /// Apply every queued subscription event without waiting
    pub fn process_pending(&mut self) {
        let before = self.client.state();
        if self.client.poll() {
            self.after_change(before);
        }
    }

    fn after_change(&mut self, before: StreamState) {
        let after = self.client.state();
        if before != after {
            match self.client.error() {
                Some(error) if after == StreamState::Error => {
                    tracing::warn!(from = %before, error = %error.message, "Stream error");
                }
                _ => tracing::info!(from = %before, to = %after, "Stream state changed"),
            }
        }
        self.observe();
    }

    fn observe(&mut self) {
        self.reconnect
            .observe(self.client.machine(), self.client.is_connected(), Instant::now());
    }
}

#[cfg(test)]
mod tests {
    use crossterm::event::KeyEventState;
    use pistream_core::testing::ScriptedSource;
    use pistream_core::{ReconnectPolicy, StreamConfig};

    use super::*;
    use crate::tui::themes::THEME_REGISTRY;

    fn app(policy: ReconnectPolicy) -> (App<ScriptedSource>, ScriptedSource) {
        let source = ScriptedSource::new();
        let client = StreamClient::new(StreamConfig::default(), source.clone());
        let theme = THEME_REGISTRY.get_or_default(None).clone();
        (App::new(client, theme, AutoReconnect::new(policy)), source)
    }

    fn press(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    #[test]
    fn test_quit_keys() {
        for key in [
            press(KeyCode::Char('q')),
            press(KeyCode::Esc),
            KeyEvent::new(KeyCode::Char('c'), KeyModifiers::CONTROL),
        ] {
            let (mut app, _) = app(ReconnectPolicy::default());
            app.handle_key(key);
            assert!(app.should_quit);
        }
    }

    #[test]
    fn test_plain_c_does_not_quit() {
        let (mut app, _) = app(ReconnectPolicy::default());
        app.handle_key(press(KeyCode::Char('c')));
        assert!(!app.should_quit);
    }

    #[test]
    fn test_key_release_ignored() {
        let (mut app, _) = app(ReconnectPolicy::default());
        let release = KeyEvent {
            code: KeyCode::Char('q'),
            modifiers: KeyModifiers::NONE,
            kind: KeyEventKind::Release,
            state: KeyEventState::NONE,
        };
        app.handle_key(release);
        assert!(!app.should_quit);
    }

    #[tokio::test]
    async fn test_reconnect_key_replaces_subscription() {
        let (mut app, source) = app(ReconnectPolicy::default());
        app.client.start();
        source.latest().unwrap().failed("refused");
        app.process_pending();
        assert_eq!(app.client.state(), StreamState::Error);

        app.handle_key(press(KeyCode::Char('r')));

        assert_eq!(source.open_count(), 2);
        assert_eq!(app.client.generation(), 2);
        assert_eq!(app.client.state(), StreamState::Connecting);
    }

    #[tokio::test]
    async fn test_connectivity_error_schedules_retry() {
        let policy = ReconnectPolicy {
            jitter: 0.0,
            ..ReconnectPolicy::enabled()
        };
        let (mut app, source) = app(policy);
        app.client.start();
        source.latest().unwrap().failed("refused");
        app.process_pending();

        assert!(app.reconnect.deadline().is_some());

        // A manual reconnect clears the pending retry
        app.handle_key(press(KeyCode::Char('r')));
        assert!(app.reconnect.deadline().is_none());
        assert_eq!(app.reconnect.attempts(), 0);
    }

    #[tokio::test]
    async fn test_retry_not_scheduled_when_disabled() {
        let (mut app, source) = app(ReconnectPolicy::default());
        app.client.start();
        source.latest().unwrap().failed("refused");
        app.process_pending();
        assert!(app.reconnect.deadline().is_none());
    }
}
