//! Plain-text rendering of backend data for the terminal.

pub mod render;
