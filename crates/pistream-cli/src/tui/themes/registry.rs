//! Built-in theme lookup

use super::definitions::{pistream, terminal};
use super::Theme;

/// Name of the theme used when none is requested
pub const DEFAULT_THEME: &str = "pistream";

/// Ordered collection of built-in themes
#[derive(Debug)]
pub struct ThemeRegistry {
    themes: Vec<Theme>,
}

impl Default for ThemeRegistry {
    fn default() -> Self {
        Self::new()
    }
}

impl ThemeRegistry {
    pub fn new() -> Self {
        Self {
            themes: vec![pistream(), terminal()],
        }
    }

    /// Look up a theme by name
    pub fn get(&self, name: &str) -> Option<&Theme> {
        self.themes.iter().find(|t| t.name == name)
    }

    /// Look up a theme, falling back to the default
    pub fn get_or_default(&self, name: Option<&str>) -> &Theme {
        name.and_then(|n| self.get(n))
            .or_else(|| self.get(DEFAULT_THEME))
            .unwrap_or(&self.themes[0])
    }

    /// (name, display name) pairs in registry order
    pub fn list(&self) -> Vec<(&str, &str)> {
        self.themes
            .iter()
            .map(|t| (t.name.as_str(), t.display_name.as_str()))
            .collect()
    }
}
