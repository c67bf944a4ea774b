//! Theme system for the pistream TUI
//!
//! A theme is a flat palette; views pick colors by role, never by value.

use pistream_core::StreamState;
use ratatui::style::Color;

pub mod definitions;
mod registry;

use once_cell::sync::Lazy;
pub use registry::ThemeRegistry;

/// Global theme registry with all built-in themes
pub static THEME_REGISTRY: Lazy<ThemeRegistry> = Lazy::new(ThemeRegistry::new);

/// A complete theme definition
#[derive(Debug, Clone)]
pub struct Theme {
    pub name: String,
    pub display_name: String,

    // Core colors
    pub bg_color: Color,
    pub border_color: Color,
    pub title_color: Color,
    pub accent_color: Color,
    pub text_color: Color,
    pub dim_color: Color,

    // Status colors
    pub idle_color: Color,
    pub connecting_color: Color,
    pub active_color: Color,
    pub complete_color: Color,
    pub error_color: Color,
    pub error_bg_color: Color,

    // Card & panel colors
    pub card_bg_color: Color,
    pub code_bg_color: Color,
    pub status_bar_bg_color: Color,
    pub progress_color: Color,
    pub progress_track_color: Color,

    // Digit display
    pub pi_integer_color: Color,
    pub pi_computed_color: Color,
    pub pi_padding_color: Color,
    pub circumference_color: Color,

    // Branding & Logo
    pub logo_primary_color: Color,
    pub logo_secondary_color: Color,
}

impl Theme {
    /// Badge color for a connection status
    pub fn status_color(&self, state: StreamState) -> Color {
        match state {
            StreamState::Idle => self.idle_color,
            StreamState::Connecting => self.connecting_color,
            StreamState::Active => self.active_color,
            StreamState::Complete => self.complete_color,
            StreamState::Error => self.error_color,
        }
    }
}
