//! Agent orchestrator
//!
//! Main agent that coordinates between the model, tools, and conversation.
//! Implements a ReAct-style reasoning loop (Thought → Action → Observation)
//! over plain-text completions.

use std::sync::Arc;

use tracing::{debug, info, warn};

use crate::agent::conversation::Conversation;
use crate::agent::loop_state::{AgentLoopState, IntermediateStep};
use crate::agent::parser::{self, ParsedAction, STOP_SEQUENCE};
use crate::agent::prompt::PromptAssembler;
use crate::core::{Config, Message, Result, TutorError};
use crate::llm::{create_provider, GenerateOptions, LLMProvider, StreamCallback};
use crate::tools::{truncate_chars, ToolRegistry};

/// Main agent that orchestrates the model and tools for one chat session
pub struct Agent {
    /// Configuration
    config: Config,
    /// Model backend
    llm: Arc<dyn LLMProvider>,
    /// Tool registry
    tools: Arc<ToolRegistry>,
    /// Prompt builder over the registered tools
    assembler: PromptAssembler,
    /// Recent exchanges shown to the model
    conversation: Conversation,
    /// Receives reasoning tokens while streaming
    on_token: Option<StreamCallback>,
}

impl Agent {
    /// Create a new agent with configuration from file and environment
    pub fn new() -> Self {
        Self::with_config(Config::load())
    }

    /// Create an agent with custom configuration and the default tools
    pub fn with_config(config: Config) -> Self {
        let llm = create_provider(&config);
        let tools = ToolRegistry::with_defaults(&config);
        Self::with_parts(config, llm, tools)
    }

    /// Create an agent from explicit parts
    pub fn with_parts(config: Config, llm: Arc<dyn LLMProvider>, tools: ToolRegistry) -> Self {
        let assembler = PromptAssembler::new(tools.descriptors());
        let conversation = Conversation::new(config.agent.memory_window);

        Self {
            config,
            llm,
            tools: Arc::new(tools),
            assembler,
            conversation,
            on_token: None,
        }
    }

    /// Check the provider is reachable and serves the configured model
    pub async fn initialize(&mut self) -> Result<()> {
        let models = self.llm.list_models().await?;
        debug!(provider = self.llm.name(), ?models, "available models");

        if !self.llm.is_model_available(&self.config.model.name).await? {
            return Err(TutorError::ModelNotFound(self.config.model.name.clone()));
        }

        Ok(())
    }

    /// Answer one question using the ReAct loop
    ///
    /// The loop continues until:
    /// 1. The model produces a final answer
    /// 2. The iteration cap is reached, in which case the last observation
    ///    is returned instead
    pub async fn process(&mut self, question: &str) -> Result<String> {
        // The prompt shows earlier exchanges only, not the question itself.
        // A failed question leaves the history untouched.
        let history = self.conversation.snapshot();
        let answer = self.resolve(&history, question).await?;

        self.conversation.add_exchange(question, &answer);
        Ok(answer)
    }

    async fn resolve(&self, history: &[Message], question: &str) -> Result<String> {
        let mut state = AgentLoopState::new(self.config.agent.max_iterations);

        info!(max_iterations = state.max_iterations, "starting reasoning loop");

        while state.should_continue() {
            state.next_iteration();
            info!(iteration = state.iteration, "calling model");

            let prompt = self.assembler.assemble(history, question, &state.steps);
            if self.config.agent.debug {
                info!(target: "mathtutor::prompt", "\n{}", prompt);
            }

            let output = self.call_model(&prompt).await?;
            if self.config.agent.debug {
                info!(target: "mathtutor::completion", "\n{}", output);
            }

            match parser::parse(&output) {
                Ok(ParsedAction::FinalAnswer { text }) => {
                    info!(iteration = state.iteration, "final answer received");
                    state.final_answer = Some(text);
                }
                Ok(ParsedAction::ToolInvocation {
                    tool_name,
                    tool_input,
                }) => {
                    let step = self.run_tool(&tool_name, &tool_input).await;
                    state.push_step(step);
                }
                Err(e) => {
                    warn!(error = %e, "model output did not follow the format");
                    state.push_step(IntermediateStep::malformed(&output));
                }
            }
        }

        let answer = match state.final_answer.take() {
            Some(answer) => answer,
            None => {
                warn!(
                    iterations = state.iteration,
                    "iteration cap reached without a final answer"
                );
                state.forced_answer()
            }
        };

        info!(
            iterations = state.iteration,
            steps = state.steps.len(),
            "reasoning loop complete"
        );

        Ok(answer)
    }

    /// Run one completion with the observation stop sequence
    async fn call_model(&self, prompt: &str) -> Result<String> {
        let options = GenerateOptions {
            temperature: Some(self.config.model.temperature),
            stop: Some(vec![STOP_SEQUENCE.to_string()]),
            ..Default::default()
        };

        let response = match self.on_token {
            Some(ref on_token) if self.config.streaming.enabled => {
                let response = self
                    .llm
                    .complete_stream(&self.config.model.name, prompt, Some(options), &**on_token)
                    .await?;
                on_token("\n");
                response
            }
            _ => {
                self.llm
                    .complete(&self.config.model.name, prompt, Some(options))
                    .await?
            }
        };

        if let Some(ref usage) = response.usage {
            debug!(
                prompt_tokens = usage.prompt_tokens,
                completion_tokens = usage.completion_tokens,
                "model usage"
            );
        }

        Ok(response.content)
    }

    /// Run a tool and turn its outcome into a step. Never fails.
    async fn run_tool(&self, tool_name: &str, tool_input: &str) -> IntermediateStep {
        if !self.tools.contains(tool_name) {
            let err = TutorError::UnknownTool {
                name: tool_name.to_string(),
                available: self.tools.tool_names().join(", "),
            };
            warn!(tool = tool_name, "model asked for an unknown tool");
            return IntermediateStep::error(tool_name, tool_input, err.to_string());
        }

        info!(tool = tool_name, input = tool_input, "running tool");

        match self.tools.execute(tool_name, tool_input).await {
            Ok(output) => {
                let observation = truncate_chars(output.trim(), self.config.tools.max_chars);
                IntermediateStep::success(tool_name, tool_input, observation)
            }
            Err(e) => {
                warn!(tool = tool_name, error = %e, "tool failed");
                IntermediateStep::error(tool_name, tool_input, format!("Tool error: {}", e))
            }
        }
    }

    /// Receive reasoning tokens as they stream in
    pub fn set_token_sink(&mut self, on_token: StreamCallback) {
        self.on_token = Some(on_token);
    }

    /// Clear conversation history
    pub fn clear_history(&mut self) {
        self.conversation.clear();
    }

    /// Messages currently in the history window
    pub fn history(&self) -> Vec<Message> {
        self.conversation.snapshot()
    }

    /// Get conversation length
    pub fn conversation_length(&self) -> usize {
        self.conversation.len()
    }

    /// Registered tools
    pub fn tools(&self) -> &ToolRegistry {
        &self.tools
    }

    /// Names of the registered tools, in prompt order
    pub fn tool_names(&self) -> Vec<&str> {
        self.tools.tool_names()
    }

    /// Name of the model backend
    pub fn provider_name(&self) -> &str {
        self.llm.name()
    }

    /// Get current configuration
    pub fn config(&self) -> &Config {
        &self.config
    }

    /// Set the model used for reasoning
    pub fn set_model(&mut self, model: impl Into<String>) {
        self.config.model.name = model.into();
    }

    /// Set the sampling temperature
    pub fn set_temperature(&mut self, temperature: f32) {
        self.config.model.temperature = temperature;
    }

    /// Check if streaming is enabled
    pub fn is_streaming(&self) -> bool {
        self.config.streaming.enabled
    }

    /// Enable or disable streaming
    pub fn set_streaming(&mut self, enabled: bool) {
        self.config.streaming.enabled = enabled;
    }

    /// Enable or disable prompt logging
    pub fn set_debug(&mut self, debug: bool) {
        self.config.agent.debug = debug;
    }

    /// List models served by the provider
    pub async fn list_models(&self) -> Result<Vec<String>> {
        self.llm.list_models().await
    }

    /// Save current configuration to file
    pub fn save_config(&self) -> Result<std::path::PathBuf> {
        self.config.save_and_get_path()
    }
}

impl Default for Agent {
    fn default() -> Self {
        Self::new()
    }
}
