//! Digit payload codec
//!
//! Each stream frame is a JSON object carrying the current π string and the
//! circumference derived from it server-side.

use serde::{Deserialize, Serialize};

use crate::error::PayloadError;

/// π value shown before the first payload arrives
pub const INITIAL_PI: &str = "3";

/// Circumference shown before the first payload arrives
pub const INITIAL_CIRCUMFERENCE: &str = "0";

/// One update from the producer
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DigitPayload {
    /// Decimal string such as `3.14159`
    pub pi: String,
    /// Decimal string, or scientific notation passed through verbatim
    pub circumference: String,
}

impl DigitPayload {
    /// Decode a frame's data field
    pub fn decode(data: &str) -> Result<Self, PayloadError> {
        Ok(serde_json::from_str(data)?)
    }

    /// Number of fractional digits carried by `pi`
    pub fn digit_count(&self) -> usize {
        fractional_len(&self.pi)
    }
}

/// Count the characters after the first decimal point (0 if there is none)
pub fn fractional_len(pi: &str) -> usize {
    pi.split_once('.')
        .map(|(_, frac)| frac.chars().count())
        .unwrap_or(0)
}
