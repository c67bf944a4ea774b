//! Commands that run without a terminal UI

use anyhow::{bail, Context, Result};
use pistream_core::display::{format_circumference, progress_label};
use pistream_core::stream::fetch_status;
use pistream_core::{EventSource, HttpEventSource, StreamClient, StreamConfig, StreamState};
use tokio::time::{sleep_until, Instant};

use crate::reconnect::AutoReconnect;

/// Follow the stream and print one line per state or precision change
///
/// Returns once the stream completes. The run fails once the subscription is
/// gone and automatic reconnect has nothing scheduled, whether that followed
/// a connectivity error or a server that dropped a live stream. Decode errors
/// keep the subscription open and wait for the next payload.
pub async fn watch<S: EventSource>(
    mut client: StreamClient<S>,
    mut reconnect: AutoReconnect,
) -> Result<()> {
    client.start();
    let mut last = Snapshot::of(&client);
    println!("{}", last.line());

    loop {
        let reconnect_at = reconnect.deadline();
        tokio::select! {
            event = client.next_event() => {
                let Some(event) = event else {
                    bail!("subscription channel closed");
                };
                client.dispatch(event);
                client.poll();
                reconnect.observe(client.machine(), client.is_connected(), Instant::now());
            }
            _ = sleep_until(reconnect_at.unwrap_or_else(Instant::now)), if reconnect_at.is_some() => {
                if reconnect.take_due(Instant::now()) {
                    tracing::info!(attempt = reconnect.attempts(), "Reconnecting");
                    client.connect();
                    reconnect.observe(client.machine(), client.is_connected(), Instant::now());
                }
            }
            _ = tokio::signal::ctrl_c() => {
                client.stop();
                bail!("interrupted");
            }
        }

        let now = Snapshot::of(&client);
        if now != last {
            println!("{}", now.line());
            if let Some(remaining) = reconnect.remaining(Instant::now()) {
                eprintln!("retrying in {:.1}s", remaining.as_secs_f32());
            }
            last = now;
        }

        match client.state() {
            StreamState::Complete => {
                client.stop();
                return Ok(());
            }
            _ if client.is_connected() || reconnect.deadline().is_some() => {}
            StreamState::Error => {
                let message = client
                    .error()
                    .map(|e| e.message.clone())
                    .unwrap_or_default();
                client.stop();
                bail!(message);
            }
            StreamState::Active | StreamState::Connecting => {
                let reason = client
                    .machine()
                    .last_failure()
                    .unwrap_or("subscription closed")
                    .to_string();
                let digits = client.machine().precision();
                let hint = if reconnect.is_enabled() {
                    "automatic retries exhausted"
                } else {
                    "run again or pass --auto-reconnect"
                };
                client.stop();
                bail!(
                    "stream ended before completion after {} digits ({}); {}",
                    digits,
                    reason,
                    hint
                );
            }
            StreamState::Idle => {}
        }
    }
}

/// What `watch` prints; a new line is emitted whenever this changes
#[derive(Debug, PartialEq, Eq)]
struct Snapshot {
    state: StreamState,
    precision: usize,
    target: usize,
    pi: String,
    circumference: String,
}

impl Snapshot {
    fn of<S: EventSource>(client: &StreamClient<S>) -> Self {
        let machine = client.machine();
        Self {
            state: machine.state(),
            precision: machine.precision(),
            target: machine.target_precision(),
            pi: machine.pi().to_string(),
            circumference: machine.circumference().to_string(),
        }
    }

    fn line(&self) -> String {
        format!(
            "[{}] {} pi={} circumference={} km",
            self.state,
            progress_label(self.precision, self.target),
            self.pi,
            format_circumference(&self.circumference)
        )
    }
}

/// Print the server's current snapshot
pub async fn status(config: &StreamConfig) -> Result<()> {
    let source = HttpEventSource::new(config).context("Failed to build HTTP client")?;
    let payload = fetch_status(source.client(), &config.endpoint)
        .await
        .with_context(|| format!("Failed to fetch status for {}", config.endpoint))?;

    println!("pi:            {}", payload.pi);
    println!(
        "digits:        {}",
        progress_label(payload.digit_count(), config.target_precision)
    );
    println!(
        "circumference: {} km",
        format_circumference(&payload.circumference)
    );
    Ok(())
}
