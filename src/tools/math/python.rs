//! Python tool
//!
//! Runs a snippet through the local Python interpreter. The value of a
//! trailing expression is printed, like an interactive session would.

use async_trait::async_trait;
use regex::Regex;
use std::process::Stdio;
use std::sync::OnceLock;
use std::time::Duration;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::debug;

use crate::core::{Config, Result, ToolCategory, TutorError};
use crate::tools::Tool;

/// Reads the snippet from stdin, execs it and echoes a trailing expression
const DRIVER: &str = r#"
import ast, sys
source = sys.stdin.read()
tree = ast.parse(source)
last = None
if tree.body and isinstance(tree.body[-1], ast.Expr):
    last = tree.body.pop()
namespace = {"__name__": "__main__"}
exec(compile(tree, "<snippet>", "exec"), namespace)
if last is not None:
    value = eval(compile(ast.Expression(last.value), "<snippet>", "eval"), namespace)
    if value is not None:
        print(repr(value))
"#;

/// Tool for executing Python code
pub struct PythonTool {
    /// Interpreter binary
    command: String,
    /// Kill the interpreter after this long
    timeout: Duration,
}

impl PythonTool {
    /// Create a Python tool using the given interpreter
    pub fn new(command: impl Into<String>, timeout: Duration) -> Self {
        Self {
            command: command.into(),
            timeout,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(
            config.tools.python_command.clone(),
            Duration::from_secs(config.tools.python_timeout_secs),
        )
    }

    /// Check if the interpreter can be started
    pub async fn is_available(&self) -> bool {
        Command::new(&self.command)
            .arg("--version")
            .stdout(Stdio::null())
            .stderr(Stdio::null())
            .status()
            .await
            .map(|s| s.success())
            .unwrap_or(false)
    }

    async fn execute(&self, code: &str) -> Result<String> {
        let mut child = Command::new(&self.command)
            .args(["-c", DRIVER])
            .stdin(Stdio::piped())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .kill_on_drop(true)
            .spawn()
            .map_err(|e| {
                TutorError::with_context(format!("Failed to start '{}'", self.command), e)
            })?;

        if let Some(mut stdin) = child.stdin.take() {
            stdin.write_all(code.as_bytes()).await?;
        }

        let output = tokio::time::timeout(self.timeout, child.wait_with_output())
            .await
            .map_err(|_| {
                TutorError::tool(format!(
                    "Python timed out after {} seconds",
                    self.timeout.as_secs()
                ))
            })??;

        if output.status.success() {
            let stdout = String::from_utf8_lossy(&output.stdout).trim().to_string();
            if stdout.is_empty() {
                Ok("(no output)".to_string())
            } else {
                Ok(stdout)
            }
        } else {
            let stderr = String::from_utf8_lossy(&output.stderr);
            Err(TutorError::tool(last_error_line(&stderr)))
        }
    }
}

/// Strip markdown fences and a leading `python` tag the model tends to add
pub fn sanitize_code(input: &str) -> String {
    static FENCE: OnceLock<Regex> = OnceLock::new();
    let fence = FENCE.get_or_init(|| Regex::new(r"(?m)^\s*```[a-zA-Z]*\s*$").expect("valid fence regex"));

    let code = fence.replace_all(input.trim(), "");
    let code = code.trim();
    let code = code.strip_prefix("python\n").unwrap_or(code);
    code.trim_matches('`').trim().to_string()
}

/// The exception line of a Python traceback, or the whole text
fn last_error_line(stderr: &str) -> String {
    stderr
        .lines()
        .rev()
        .find(|l| !l.trim().is_empty())
        .map(|l| l.trim().to_string())
        .unwrap_or_else(|| "Python exited with an error".to_string())
}

#[async_trait]
impl Tool for PythonTool {
    fn name(&self) -> &str {
        "Python"
    }

    fn description(&self) -> &str {
        "useful for when you need to write python code to answer more complex questions about math. The input is Python source; the value of the last expression is printed."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Math
    }

    async fn run(&self, input: &str) -> Result<String> {
        let code = sanitize_code(input);
        if code.is_empty() {
            return Err(TutorError::tool("No Python code provided"));
        }

        debug!(lines = code.lines().count(), "running python snippet");
        self.execute(&code).await
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_sanitize_fenced_code() {
        let input = "```python\ndef f(n):\n    return n * 2\n\nf(21)\n```";
        assert_eq!(sanitize_code(input), "def f(n):\n    return n * 2\n\nf(21)");
    }

    #[test]
    fn test_sanitize_inline_backticks() {
        assert_eq!(sanitize_code("`print(1)`"), "print(1)");
        assert_eq!(sanitize_code("  2 ** 10  "), "2 ** 10");
    }

    #[test]
    fn test_last_error_line() {
        let stderr = "Traceback (most recent call last):\n  File \"<snippet>\", line 1\nZeroDivisionError: division by zero\n";
        assert_eq!(last_error_line(stderr), "ZeroDivisionError: division by zero");
    }

    #[tokio::test]
    #[ignore] // Requires python3 on PATH
    async fn test_trailing_expression_is_printed() {
        let tool = PythonTool::new("python3", Duration::from_secs(10));
        let code = "def is_prime(n):\n    return n > 1 and all(n % i for i in range(2, int(n**0.5) + 1))\n\nis_prime(11)";
        assert_eq!(tool.run(code).await.unwrap(), "True");
        assert!(tool.run("1 / 0").await.is_err());
    }

    #[tokio::test]
    async fn test_missing_interpreter_is_an_error() {
        let tool = PythonTool::new("definitely-not-a-python-binary", Duration::from_secs(1));
        assert!(!tool.is_available().await);
        assert!(tool.run("print(1)").await.is_err());
    }
}
