//! Agent loop state management
//!
//! Tracks the state of the ReAct reasoning loop for one question, including
//! the intermediate steps produced by tool calls.

use serde::{Deserialize, Serialize};

/// Tool name recorded for model output that could not be parsed
pub const EXCEPTION_TOOL: &str = "_Exception";

/// Answer returned when the cap is hit before any observation exists
pub const STOPPED_MESSAGE: &str = "Agent stopped due to iteration limit or time limit.";

/// State of the agent reasoning loop
#[derive(Debug, Clone)]
pub struct AgentLoopState {
    /// Model calls made so far
    pub iteration: usize,
    /// Maximum allowed model calls
    pub max_iterations: usize,
    /// Steps taken while resolving the current question
    pub steps: Vec<IntermediateStep>,
    /// Final answer if the agent has completed reasoning
    pub final_answer: Option<String>,
}

impl AgentLoopState {
    /// Create a new loop state with the given iteration cap
    pub fn new(max_iterations: usize) -> Self {
        Self {
            iteration: 0,
            max_iterations,
            steps: Vec::new(),
            final_answer: None,
        }
    }

    /// Check if the loop should continue
    pub fn should_continue(&self) -> bool {
        self.iteration < self.max_iterations && self.final_answer.is_none()
    }

    /// Record a step
    pub fn push_step(&mut self, step: IntermediateStep) {
        self.steps.push(step);
    }

    /// Increment the iteration counter
    pub fn next_iteration(&mut self) {
        self.iteration += 1;
    }

    /// Best-effort answer when the cap is reached without a final answer.
    ///
    /// After a malformed completion the model's own text is the best answer
    /// available, not the format complaint sent back to it.
    pub fn forced_answer(&self) -> String {
        let text = match self.steps.last() {
            Some(step) if step.tool == EXCEPTION_TOOL => step.tool_input.as_str(),
            Some(step) => step.observation.as_str(),
            None => "",
        };

        if text.trim().is_empty() {
            STOPPED_MESSAGE.to_string()
        } else {
            text.to_string()
        }
    }
}

/// One action/observation pair within a single question's tool loop
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IntermediateStep {
    /// Tool the model asked for
    pub tool: String,
    /// Input passed to the tool
    pub tool_input: String,
    /// Text fed back to the model
    pub observation: String,
    /// Whether the tool produced a real result
    pub success: bool,
}

impl IntermediateStep {
    /// Create a successful step
    pub fn success(
        tool: impl Into<String>,
        tool_input: impl Into<String>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            tool_input: tool_input.into(),
            observation: observation.into(),
            success: true,
        }
    }

    /// Create a step whose observation describes a failure
    pub fn error(
        tool: impl Into<String>,
        tool_input: impl Into<String>,
        observation: impl Into<String>,
    ) -> Self {
        Self {
            tool: tool.into(),
            tool_input: tool_input.into(),
            observation: observation.into(),
            success: false,
        }
    }

    /// Step recorded when the model output did not follow the format
    pub fn malformed(raw_output: &str) -> Self {
        Self::error(
            EXCEPTION_TOOL,
            raw_output.trim(),
            "Invalid Format: Missing 'Action:' and 'Action Input:' lines or a 'Final Answer:' line.",
        )
    }
}
