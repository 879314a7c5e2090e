//! Mathtutor - ReAct Math Tutoring Agent
//!
//! A chat tutor that answers math questions by letting a language model
//! reason step by step and call out to a calculator, a Python interpreter,
//! Wikipedia and web search.
//!
//! # Architecture
//!
//! - **Core**: Shared types, configuration, and error handling
//! - **LLM**: Completion provider abstraction with Ollama and OpenAI backends
//! - **Tools**: Tool registry with math and lookup tools
//! - **Agent**: Prompt assembly, output parsing and the reasoning loop
//! - **CLI**: Chat front-end and REPL
//!
//! # Usage
//!
//! ```rust,no_run
//! use mathtutor::agent::Agent;
//!
//! #[tokio::main]
//! async fn main() {
//!     let mut agent = Agent::new();
//!     agent.initialize().await.unwrap();
//!
//!     let answer = agent.process("What is 123 + 456 * 7?").await.unwrap();
//!     println!("{}", answer);
//! }
//! ```

pub mod agent;
pub mod cli;
pub mod core;
pub mod llm;
pub mod tools;

// Re-export commonly used items
pub use agent::Agent;
pub use cli::Repl;
pub use core::{Config, Result, TutorError};
