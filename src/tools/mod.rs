//! Tools module - capabilities the agent can call by name
//!
//! Every tool takes text and returns text. Failures are returned as errors
//! and turned into observations by the agent.

pub mod lookup;
pub mod math;
pub mod registry;

use async_trait::async_trait;

use crate::core::{Result, ToolCategory, ToolDescriptor};

pub use lookup::{SearchTool, WikipediaTool};
pub use math::{CalculatorTool, PythonTool};
pub use registry::ToolRegistry;

/// A named capability the model can invoke
#[async_trait]
pub trait Tool: Send + Sync {
    /// Name the model uses in `Action:` lines
    fn name(&self) -> &str;

    /// Description shown to the model
    fn description(&self) -> &str;

    /// Category, for listings
    fn category(&self) -> ToolCategory;

    /// Run the tool on the model's input
    async fn run(&self, input: &str) -> Result<String>;

    /// Descriptor rendered into the prompt
    fn descriptor(&self) -> ToolDescriptor {
        ToolDescriptor::new(self.name(), self.description())
    }
}

/// Truncate `text` to at most `max_chars` characters
pub fn truncate_chars(text: &str, max_chars: usize) -> String {
    match text.char_indices().nth(max_chars) {
        Some((idx, _)) => format!("{}...", &text[..idx]),
        None => text.to_string(),
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_truncate_chars() {
        assert_eq!(truncate_chars("hello", 10), "hello");
        assert_eq!(truncate_chars("hello", 5), "hello");
        assert_eq!(truncate_chars("hello world", 5), "hello...");
        assert_eq!(truncate_chars("πππ", 2), "ππ...");
    }
}
