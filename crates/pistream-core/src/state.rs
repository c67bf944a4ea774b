//! Stream state machine
//!
//! All client state lives here and changes only through the transition
//! methods, which makes every path testable without a transport. Methods
//! that may release the connection return a [`HandleAction`] for the owner
//! to apply.

use std::fmt;
use std::time::{Duration, Instant};

use tracing::{debug, info, warn};

use crate::payload::{fractional_len, DigitPayload, INITIAL_CIRCUMFERENCE, INITIAL_PI};

/// Message shown when a frame cannot be decoded
pub const DECODE_ERROR_MESSAGE: &str = "Failed to parse incoming data.";

/// Message shown when the producer is unreachable
pub const CONNECTION_LOST_MESSAGE: &str = "Connection lost. Please ensure the worker is running.";

/// Connection status as presented to the user
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default)]
pub enum StreamState {
    #[default]
    Idle,
    Connecting,
    Active,
    Complete,
    Error,
}

impl StreamState {
    /// Status indicator text
    pub fn label(self) -> &'static str {
        match self {
            StreamState::Idle => "Idle",
            StreamState::Connecting => "Connecting...",
            StreamState::Active => "Calculating",
            StreamState::Complete => "Complete",
            StreamState::Error => "Error",
        }
    }
}

impl fmt::Display for StreamState {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

/// Which recovery path an error state belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    /// The producer could not be reached; eligible for auto-reconnect
    Connectivity,
    /// A frame was malformed; the subscription is left open
    Decode,
}

/// What the owner must do with the current connection handle
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum HandleAction {
    Keep,
    Close,
}

/// How a subscription failure was classified
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum FailureClass {
    /// Data arrived recently; dropped silently
    Benign,
    /// The stream already reached the target; its end is expected
    ExpectedClose,
    /// Genuine connectivity failure; state is now Error
    Connectivity,
    /// No subscription was active
    Ignored,
}

/// The error currently surfaced to the user
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct StreamError {
    pub kind: ErrorKind,
    pub message: String,
}

/// Explicit state machine behind a [`StreamClient`](crate::client::StreamClient)
#[derive(Debug, Clone)]
pub struct StreamMachine {
    state: StreamState,
    pi: String,
    circumference: String,
    error: Option<StreamError>,
    last_message: Option<Instant>,
    last_failure: Option<String>,
    target_precision: usize,
    liveness_window: Duration,
}

impl StreamMachine {
    pub fn new(target_precision: usize, liveness_window: Duration) -> Self {
        Self {
            state: StreamState::Idle,
            pi: INITIAL_PI.to_string(),
            circumference: INITIAL_CIRCUMFERENCE.to_string(),
            error: None,
            last_message: None,
            last_failure: None,
            target_precision,
            liveness_window,
        }
    }

    /// A new subscription is being opened
    pub fn begin_connect(&mut self) {
        debug!(from = %self.state, "Entering Connecting");
        self.state = StreamState::Connecting;
        self.error = None;
        self.last_message = None;
    }

    /// The subscription reported open. Returns whether state changed.
    pub fn opened(&mut self) -> bool {
        if self.state == StreamState::Connecting {
            self.state = StreamState::Active;
            true
        } else {
            false
        }
    }

    /// Apply one frame's data
    pub fn message(&mut self, data: &str, now: Instant) -> HandleAction {
        if matches!(self.state, StreamState::Idle | StreamState::Complete) {
            debug!(state = %self.state, "Ignoring message outside a live subscription");
            return HandleAction::Keep;
        }

        let payload = match DigitPayload::decode(data) {
            Ok(payload) => payload,
            Err(e) => {
                warn!(error = %e, "Error parsing stream data");
                self.state = StreamState::Error;
                self.error = Some(StreamError {
                    kind: ErrorKind::Decode,
                    message: DECODE_ERROR_MESSAGE.to_string(),
                });
                return HandleAction::Keep;
            }
        };

        let digits = payload.digit_count();
        self.pi = payload.pi;
        self.circumference = payload.circumference;
        self.last_message = Some(now);

        if digits >= self.target_precision {
            info!(digits, target = self.target_precision, "Target precision reached");
            self.state = StreamState::Complete;
            self.error = None;
            HandleAction::Close
        } else {
            debug!(digits, "Digits updated");
            self.state = StreamState::Active;
            self.error = None;
            HandleAction::Keep
        }
    }

    /// Classify a subscription failure. The handle is always released.
    pub fn failed(&mut self, reason: &str, now: Instant) -> FailureClass {
        self.last_failure = Some(reason.to_string());

        if self.state == StreamState::Idle {
            return FailureClass::Ignored;
        }

        let recent = self
            .last_message
            .is_some_and(|at| now.saturating_duration_since(at) <= self.liveness_window);

        if recent {
            info!(reason, "Recent data received, treating error as transient");
            FailureClass::Benign
        } else if self.state == StreamState::Complete {
            info!("Stream closed: calculation complete");
            FailureClass::ExpectedClose
        } else {
            warn!(reason, "No recent data, reporting connection failure");
            self.state = StreamState::Error;
            self.error = Some(StreamError {
                kind: ErrorKind::Connectivity,
                message: CONNECTION_LOST_MESSAGE.to_string(),
            });
            FailureClass::Connectivity
        }
    }

    /// Back to Idle; the last received values stay on display
    pub fn reset(&mut self) {
        self.state = StreamState::Idle;
        self.error = None;
    }

    pub fn state(&self) -> StreamState {
        self.state
    }

    pub fn pi(&self) -> &str {
        &self.pi
    }

    pub fn circumference(&self) -> &str {
        &self.circumference
    }

    pub fn error(&self) -> Option<&StreamError> {
        self.error.as_ref()
    }

    /// Transport reason behind the most recent failure, for diagnostics
    pub fn last_failure(&self) -> Option<&str> {
        self.last_failure.as_deref()
    }

    pub fn last_message(&self) -> Option<Instant> {
        self.last_message
    }

    pub fn target_precision(&self) -> usize {
        self.target_precision
    }

    /// Fractional digits currently held
    pub fn precision(&self) -> usize {
        fractional_len(&self.pi)
    }

    /// Completion ratio in `[0, 1]`
    pub fn progress(&self) -> f64 {
        if self.target_precision == 0 {
            return 1.0;
        }
        (self.precision().min(self.target_precision) as f64) / self.target_precision as f64
    }
}
