//! CLI module - command-line chat front-end
//!
//! Contains the chat UI abstraction, the REPL and command parsing.

pub mod commands;
pub mod repl;
pub mod ui;

pub use repl::Repl;
pub use ui::{ChatRole, ChatUi, TerminalUi};
