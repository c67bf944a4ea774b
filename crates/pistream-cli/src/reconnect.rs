//! Auto-reconnect scheduling
//!
//! Tracks consecutive connectivity failures and decides when the host should
//! call `connect()` again. A retry is due after a connectivity error, or when
//! the server dropped a live stream and left no subscription behind. Decode
//! errors and user-driven states never schedule anything.

use std::time::Duration;

use pistream_core::{ErrorKind, ReconnectPolicy, StreamMachine, StreamState};
use tokio::time::Instant;

/// Reconnect timer driven by observed client state
#[derive(Debug)]
pub struct AutoReconnect {
    policy: ReconnectPolicy,
    /// Consecutive retries since the last accepted payload
    attempts: u32,
    deadline: Option<Instant>,
    /// Policy refused further retries for the current failure
    exhausted: bool,
}

impl AutoReconnect {
    pub fn new(policy: ReconnectPolicy) -> Self {
        Self {
            policy,
            attempts: 0,
            deadline: None,
            exhausted: false,
        }
    }

    pub fn is_enabled(&self) -> bool {
        self.policy.enabled
    }

    /// Update the schedule after the client changed
    ///
    /// `connected` is whether the client still holds a subscription handle.
    pub fn observe(&mut self, machine: &StreamMachine, connected: bool, now: Instant) {
        if machine.last_message().is_some() {
            self.attempts = 0;
            self.exhausted = false;
        }

        if !needs_retry(machine, connected) {
            self.deadline = None;
            return;
        }

        if self.deadline.is_some() || self.exhausted {
            return;
        }

        match self
            .policy
            .delay_for_attempt(self.attempts)
            .and_then(|delay| now.checked_add(delay).map(|at| (delay, at)))
        {
            Some((delay, at)) => {
                tracing::info!(
                    attempt = self.attempts + 1,
                    delay_ms = delay.as_millis() as u64,
                    "Scheduling reconnect"
                );
                self.attempts += 1;
                self.deadline = Some(at);
            }
            None => {
                if self.policy.enabled {
                    tracing::warn!(attempts = self.attempts, "Giving up on automatic reconnect");
                }
                self.exhausted = true;
            }
        }
    }

    /// Consume the pending reconnect if its time has come
    pub fn take_due(&mut self, now: Instant) -> bool {
        match self.deadline {
            Some(deadline) if deadline <= now => {
                self.deadline = None;
                true
            }
            _ => false,
        }
    }

    pub fn deadline(&self) -> Option<Instant> {
        self.deadline
    }

    /// Time left until the pending reconnect
    pub fn remaining(&self, now: Instant) -> Option<Duration> {
        self.deadline.map(|d| d.saturating_duration_since(now))
    }

    pub fn attempts(&self) -> u32 {
        self.attempts
    }

    pub fn is_exhausted(&self) -> bool {
        self.exhausted
    }

    /// Forget failures; called when the user reconnects by hand
    pub fn reset(&mut self) {
        self.attempts = 0;
        self.deadline = None;
        self.exhausted = false;
    }
}

/// Whether the client is stuck without a subscription it should have
pub fn needs_retry(machine: &StreamMachine, connected: bool) -> bool {
    match machine.state() {
        StreamState::Error => machine
            .error()
            .is_some_and(|e| e.kind == ErrorKind::Connectivity),
        StreamState::Active | StreamState::Connecting => !connected,
        StreamState::Idle | StreamState::Complete => false,
    }
}
