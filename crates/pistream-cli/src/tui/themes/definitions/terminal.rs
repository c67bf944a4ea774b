use super::super::Theme;
use ratatui::style::Color;

/// Terminal theme - uses native terminal colors (ANSI 0-15)
/// This theme inherits your terminal's colorscheme, so it follows
/// whatever palette the terminal is configured with.
///
/// ANSI color mapping:
/// 0: Black, 1: Red, 2: Green, 3: Yellow, 4: Blue, 5: Magenta, 6: Cyan, 7: White
/// 8-15: Bright variants of the above
pub fn terminal() -> Theme {
    let red = Color::Indexed(1);
    let green = Color::Indexed(2);
    let yellow = Color::Indexed(3);
    let blue = Color::Indexed(4);
    let magenta = Color::Indexed(5);
    let white = Color::Indexed(7);
    let bright_black = Color::Indexed(8); // Gray
    let bright_green = Color::Indexed(10);
    let bright_magenta = Color::Indexed(13);
    let bright_white = Color::Indexed(15);

    // Reset = terminal's default background
    let bg = Color::Reset;

    Theme {
        name: "terminal".to_string(),
        display_name: "Terminal".to_string(),

        // Core colors
        bg_color: bg,
        border_color: bright_black,
        title_color: bright_magenta,
        accent_color: magenta,
        text_color: white,
        dim_color: bright_black,

        // Status colors
        idle_color: bright_black,
        connecting_color: yellow,
        active_color: green,
        complete_color: blue,
        error_color: red,
        error_bg_color: bg,

        // Card & panel colors - transparent
        card_bg_color: bg,
        code_bg_color: bg,
        status_bar_bg_color: bg,
        progress_color: magenta,
        progress_track_color: bright_black,

        // Digit display
        pi_integer_color: bright_magenta,
        pi_computed_color: bright_green,
        pi_padding_color: bright_black,
        circumference_color: bright_white,

        // Branding & Logo
        logo_primary_color: bright_magenta,
        logo_secondary_color: magenta,
    }
}
