//! Core library for pistream
//!
//! A client for a server-sent-event stream of incrementally computed digits
//! of π. [`StreamClient`] manages one subscription through an explicit
//! [`StreamMachine`]; renderers read its state and use [`display`] to lay it
//! out.

pub mod client;
pub mod config;
pub mod display;
pub mod error;
pub mod payload;
pub mod reconnect;
pub mod state;
pub mod stream;
#[cfg(any(test, feature = "testing"))]
pub mod testing;

pub use client::StreamClient;
pub use config::StreamConfig;
pub use error::{ConfigError, PayloadError, StatusError};
pub use payload::DigitPayload;
pub use reconnect::ReconnectPolicy;
pub use state::{ErrorKind, FailureClass, StreamError, StreamMachine, StreamState};
pub use stream::{EventSource, HttpEventSource, SourceEvent, SubscriptionEvent};
