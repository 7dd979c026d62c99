//! Terminal UI. Only the `login` command is interactive.

pub mod tui;
