//! Chat front-end abstraction
//!
//! The REPL talks to the user only through [`ChatUi`], so the terminal can
//! be swapped for another front-end or a scripted one in tests.

use std::io::{self, BufRead, Write};

use crate::llm::StreamCallback;

/// Who a rendered message belongs to
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ChatRole {
    User,
    Assistant,
    /// Banners, command output and notices
    System,
}

/// A chat transcript the tutor can write to and read questions from
pub trait ChatUi {
    /// Render a message
    fn display(&mut self, role: ChatRole, text: &str);

    /// Block until the user submits the next line. `None` ends the session.
    fn await_user_input(&mut self) -> Option<String>;

    /// Show that an answer is being worked on
    fn thinking(&mut self) {}

    /// Sink for the model's reasoning tokens while streaming
    fn token_sink(&self) -> Option<StreamCallback> {
        None
    }
}

/// Line-based terminal chat on stdin/stdout
#[derive(Debug, Default)]
pub struct TerminalUi;

impl TerminalUi {
    pub fn new() -> Self {
        Self
    }
}

impl ChatUi for TerminalUi {
    fn display(&mut self, role: ChatRole, text: &str) {
        match role {
            // Already echoed by the terminal
            ChatRole::User => {}
            ChatRole::Assistant => println!("\nTutor:\n{}\n", text),
            ChatRole::System => println!("{}", text),
        }
    }

    fn await_user_input(&mut self) -> Option<String> {
        print!("You: ");
        let _ = io::stdout().flush();

        let mut input = String::new();
        match io::stdin().lock().read_line(&mut input) {
            // EOF (Ctrl+D)
            Ok(0) => None,
            Ok(_) => Some(input),
            Err(e) => {
                eprintln!("Error reading input: {}", e);
                None
            }
        }
    }

    fn thinking(&mut self) {
        println!("Tutor is thinking...");
    }

    fn token_sink(&self) -> Option<StreamCallback> {
        // Reasoning goes to stderr so stdout holds only the transcript
        Some(Box::new(|token| {
            eprint!("{}", token);
            let _ = io::stderr().flush();
        }))
    }
}
