//! Built-in theme definitions

mod pistream;
mod terminal;

pub use pistream::pistream;
pub use terminal::terminal;
