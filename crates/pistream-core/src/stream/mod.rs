//! Event stream plumbing
//!
//! SSE parsing, the subscription abstraction, and the HTTP transport.

pub mod http;
pub mod sse;
pub mod subscription;

pub use http::{fetch_status, status_url, HttpEventSource};
pub use sse::SseStreamProcessor;
pub use subscription::{ConnectionHandle, EventSink, EventSource, SourceEvent, SubscriptionEvent};
