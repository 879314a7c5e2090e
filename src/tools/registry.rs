//! Tool registry - manages and dispatches tool calls
//!
//! Central hub for registering tools and routing tool calls by name. Tools
//! keep their registration order, which is the order the prompt lists them.

use std::collections::HashMap;
use std::sync::Arc;

use crate::core::{Config, Result, ToolCategory, ToolDescriptor, TutorError};
use crate::tools::lookup::{SearchTool, WikipediaTool};
use crate::tools::math::{CalculatorTool, PythonTool};
use crate::tools::Tool;

/// Registry of available tools
#[derive(Clone, Default)]
pub struct ToolRegistry {
    /// Tools in registration order
    tools: Vec<Arc<dyn Tool>>,
    /// Position of each tool by name
    index: HashMap<String, usize>,
}

impl ToolRegistry {
    /// Create an empty registry
    pub fn new() -> Self {
        Self::default()
    }

    /// Create a registry with the tutor's default tools
    pub fn with_defaults(config: &Config) -> Self {
        let mut registry = Self::new();

        registry.register(Arc::new(CalculatorTool::new()));
        registry.register(Arc::new(PythonTool::from_config(config)));
        registry.register(Arc::new(WikipediaTool::from_config(config)));
        registry.register(Arc::new(SearchTool::from_config(config)));

        registry
    }

    /// Register a tool. A tool with the same name is replaced in place.
    pub fn register(&mut self, tool: Arc<dyn Tool>) {
        let name = tool.name().to_string();
        match self.index.get(&name) {
            Some(&pos) => self.tools[pos] = tool,
            None => {
                self.index.insert(name, self.tools.len());
                self.tools.push(tool);
            }
        }
    }

    /// Look up a tool by exact name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn Tool>> {
        self.index.get(name).map(|&pos| &self.tools[pos])
    }

    /// Check if a tool is registered
    pub fn contains(&self, name: &str) -> bool {
        self.index.contains_key(name)
    }

    /// Descriptors in registration order
    pub fn descriptors(&self) -> Vec<ToolDescriptor> {
        self.tools.iter().map(|t| t.descriptor()).collect()
    }

    /// Tool names in registration order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.iter().map(|t| t.name()).collect()
    }

    /// Tools of one category
    pub fn by_category(&self, category: ToolCategory) -> Vec<&Arc<dyn Tool>> {
        self.tools
            .iter()
            .filter(|t| t.category() == category)
            .collect()
    }

    /// Run a tool by name
    pub async fn execute(&self, name: &str, input: &str) -> Result<String> {
        match self.get(name) {
            Some(tool) => tool.run(input).await,
            None => Err(TutorError::UnknownTool {
                name: name.to_string(),
                available: self.tool_names().join(", "),
            }),
        }
    }

    /// Number of registered tools
    pub fn len(&self) -> usize {
        self.tools.len()
    }

    /// Check if no tools are registered
    pub fn is_empty(&self) -> bool {
        self.tools.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct Echo(&'static str);

    #[async_trait]
    impl Tool for Echo {
        fn name(&self) -> &str {
            "Echo"
        }

        fn description(&self) -> &str {
            self.0
        }

        fn category(&self) -> ToolCategory {
            ToolCategory::Lookup
        }

        async fn run(&self, input: &str) -> Result<String> {
            Ok(format!("{}: {}", self.0, input))
        }
    }

    #[test]
    fn test_default_tools_in_order() {
        let registry = ToolRegistry::with_defaults(&Config::default());
        assert_eq!(
            registry.tool_names(),
            vec!["Calculator", "Python", "Wikipedia", "Search"]
        );
        assert_eq!(registry.by_category(ToolCategory::Math).len(), 2);
        assert_eq!(registry.by_category(ToolCategory::Lookup).len(), 2);
    }

    #[test]
    fn test_register_replaces_same_name() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("first")));
        registry.register(Arc::new(Echo("second")));

        assert_eq!(registry.len(), 1);
        assert_eq!(registry.descriptors()[0].description, "second");
    }

    #[tokio::test]
    async fn test_execute_known_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("echo")));

        let out = registry.execute("Echo", "hi").await.unwrap();
        assert_eq!(out, "echo: hi");
    }

    #[tokio::test]
    async fn test_execute_unknown_tool() {
        let mut registry = ToolRegistry::new();
        registry.register(Arc::new(Echo("echo")));

        let err = registry.execute("echo", "hi").await.unwrap_err();
        assert!(matches!(err, TutorError::UnknownTool { .. }));
        assert_eq!(err.to_string(), "echo is not a valid tool, try one of [Echo].");
    }
}
