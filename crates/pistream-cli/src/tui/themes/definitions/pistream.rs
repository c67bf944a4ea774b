use super::super::Theme;
use ratatui::style::Color;

/// Default pistream theme - dark slate with purple and pink accents
pub fn pistream() -> Theme {
    Theme {
        name: "pistream".to_string(),
        display_name: "Pi Streamer".to_string(),
        // Main colors
        bg_color: Color::Rgb(17, 24, 39), // Near-black slate background
        border_color: Color::Rgb(55, 65, 81), // Muted gray borders
        title_color: Color::Rgb(192, 132, 252), // Purple card titles
        accent_color: Color::Rgb(147, 51, 234), // Deep purple accent
        text_color: Color::Rgb(229, 231, 235), // Light gray text
        dim_color: Color::Rgb(156, 163, 175), // Secondary text
        // Status colors
        idle_color: Color::Rgb(107, 114, 128),      // Gray
        connecting_color: Color::Rgb(234, 179, 8),  // Yellow
        active_color: Color::Rgb(22, 163, 74),      // Green
        complete_color: Color::Rgb(37, 99, 235),    // Blue
        error_color: Color::Rgb(220, 38, 38),       // Red
        error_bg_color: Color::Rgb(153, 27, 27),    // Dark red banner
        // Card & panel colors
        card_bg_color: Color::Rgb(31, 41, 55), // Slightly lighter than bg
        code_bg_color: Color::Rgb(17, 24, 39), // Inset value wells
        status_bar_bg_color: Color::Rgb(31, 41, 55),
        progress_color: Color::Rgb(168, 85, 247), // Purple bar
        progress_track_color: Color::Rgb(55, 65, 81),
        // Digit display
        pi_integer_color: Color::Rgb(244, 114, 182), // Pink integer part
        pi_computed_color: Color::Rgb(134, 239, 172), // Green new digits
        pi_padding_color: Color::Rgb(107, 114, 128), // Gray placeholders
        circumference_color: Color::Rgb(255, 255, 255),
        // Branding & Logo
        logo_primary_color: Color::Rgb(192, 132, 252), // Purple
        logo_secondary_color: Color::Rgb(219, 39, 119), // Pink
    }
}
