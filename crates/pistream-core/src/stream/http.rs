//! HTTP transport
//!
//! Streams `text/event-stream` responses with reqwest and reports them to an
//! [`EventSink`]. Also provides the one-shot `/status` snapshot query.

use futures::StreamExt;
use reqwest::header::{ACCEPT, CACHE_CONTROL};
use reqwest::Client;
use tracing::{debug, info, warn};
use url::Url;

use super::sse::SseStreamProcessor;
use super::subscription::{ConnectionHandle, EventSink, EventSource};
use crate::config::StreamConfig;
use crate::error::StatusError;
use crate::payload::DigitPayload;

/// [`EventSource`] backed by a real HTTP connection
///
/// `open` spawns onto the current tokio runtime.
#[derive(Debug, Clone)]
pub struct HttpEventSource {
    http: Client,
}

impl HttpEventSource {
    /// Build a source with the configured connect timeout
    pub fn new(config: &StreamConfig) -> Result<Self, reqwest::Error> {
        let http = Client::builder()
            .connect_timeout(config.connect_timeout)
            .build()?;
        Ok(Self { http })
    }

    /// Use an existing client
    pub fn with_client(http: Client) -> Self {
        Self { http }
    }

    pub fn client(&self) -> &Client {
        &self.http
    }
}

impl EventSource for HttpEventSource {
    fn open(&self, endpoint: &Url, sink: EventSink) -> ConnectionHandle {
        let http = self.http.clone();
        let url = endpoint.clone();
        let guard = sink.clone();
        let handle_sink = sink.clone();

        let task = tokio::spawn(async move {
            let generation = guard.generation();
            tokio::select! {
                _ = guard.cancelled() => {
                    debug!(generation, "Subscription task cancelled");
                }
                _ = run_subscription(http, url, sink) => {
                    debug!(generation, "Subscription task finished");
                }
            }
        });

        ConnectionHandle::attached(&handle_sink, task)
    }
}

async fn run_subscription(http: Client, url: Url, sink: EventSink) {
    info!(%url, generation = sink.generation(), "Connecting to SSE stream");

    let response = match http
        .get(url)
        .header(ACCEPT, "text/event-stream")
        .header(CACHE_CONTROL, "no-cache")
        .send()
        .await
    {
        Ok(response) => response,
        Err(e) => {
            warn!(error = %e, "SSE connection failed");
            sink.failed(format!("connection failed: {}", e));
            return;
        }
    };

    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        warn!(status = status.as_u16(), body = %body.trim(), "SSE endpoint rejected request");
        sink.failed(format!("HTTP {}: {}", status.as_u16(), body.trim()));
        return;
    }

    info!("SSE connection opened");
    if !sink.opened() {
        return;
    }

    let mut processor = SseStreamProcessor::new();
    let mut body = response.bytes_stream();

    while let Some(chunk) = body.next().await {
        match chunk {
            Ok(bytes) => {
                for data in processor.process_chunk(&bytes) {
                    if !sink.data(data) {
                        return;
                    }
                }
            }
            Err(e) => {
                warn!(error = %e, "SSE stream error");
                sink.failed(format!("stream error: {}", e));
                return;
            }
        }
    }

    processor.finish();
    sink.failed("stream closed by server");
}

/// Snapshot URL that sits beside the stream endpoint
///
/// `http://host/pi-stream` becomes `http://host/status`.
pub fn status_url(endpoint: &Url) -> Result<Url, StatusError> {
    endpoint
        .join("status")
        .map_err(|_| StatusError::Url(endpoint.to_string()))
}

/// Fetch the producer's current value once
pub async fn fetch_status(http: &Client, endpoint: &Url) -> Result<DigitPayload, StatusError> {
    let url = status_url(endpoint)?;
    debug!(%url, "Fetching status snapshot");

    let response = http.get(url).send().await?;
    let status = response.status();
    if !status.is_success() {
        let body = response.text().await.unwrap_or_default();
        return Err(StatusError::Server {
            status: status.as_u16(),
            body,
        });
    }

    let text = response.text().await?;
    Ok(DigitPayload::decode(&text)?)
}
