//! Terminal UI
//!
//! Owns the terminal for the lifetime of [`run`] and restores it on exit or
//! panic.

mod app;
pub mod render;
pub mod themes;

use std::io::{self, IsTerminal};
use std::panic;

use anyhow::{bail, Result};
use crossterm::{
    execute,
    terminal::{disable_raw_mode, enable_raw_mode, EnterAlternateScreen, LeaveAlternateScreen},
};
use pistream_core::StreamClient;
use ratatui::{backend::CrosstermBackend, Terminal};

pub use app::App;

use crate::reconnect::AutoReconnect;
use themes::Theme;

/// Run the interactive display until the user quits
pub async fn run(client: StreamClient, theme: Theme, reconnect: AutoReconnect) -> Result<()> {
    if !io::stdin().is_terminal() || !io::stdout().is_terminal() {
        bail!("the interactive display requires a terminal; use `pistream watch` instead");
    }

    let original_hook = panic::take_hook();
    panic::set_hook(Box::new(move |panic_info| {
        let _ = disable_raw_mode();
        let _ = execute!(io::stdout(), LeaveAlternateScreen);
        original_hook(panic_info);
    }));

    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen)?;
    let backend = CrosstermBackend::new(stdout);
    let mut terminal = Terminal::new(backend)?;
    terminal.clear()?;

    let mut app = App::new(client, theme, reconnect);
    let result = app.run(&mut terminal).await;

    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen)?;
    terminal.show_cursor()?;

    result
}
