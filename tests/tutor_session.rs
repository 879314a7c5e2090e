//! Tutor session integration tests
//!
//! Drives the agent and the REPL against a scripted model so the whole
//! reasoning loop runs offline.

use async_trait::async_trait;
use mathtutor::agent::Agent;
use mathtutor::cli::{ChatRole, ChatUi, Repl};
use mathtutor::core::{Config, Result, TutorError};
use mathtutor::llm::{GenerateOptions, LLMProvider, LLMResponse, StreamCallback};
use mathtutor::tools::ToolRegistry;
use std::collections::VecDeque;
use std::sync::{Arc, Mutex};

/// Replays canned completions and records every prompt it receives
struct ScriptedModel {
    outputs: Mutex<VecDeque<String>>,
    prompts: Mutex<Vec<String>>,
}

impl ScriptedModel {
    fn new(outputs: &[&str]) -> Arc<Self> {
        Arc::new(Self {
            outputs: Mutex::new(outputs.iter().map(|s| s.to_string()).collect()),
            prompts: Mutex::new(Vec::new()),
        })
    }

    fn prompts(&self) -> Vec<String> {
        self.prompts.lock().unwrap().clone()
    }
}

#[async_trait]
impl LLMProvider for ScriptedModel {
    async fn complete(
        &self,
        model: &str,
        prompt: &str,
        _options: Option<GenerateOptions>,
    ) -> Result<LLMResponse> {
        self.prompts.lock().unwrap().push(prompt.to_string());
        let output = self
            .outputs
            .lock()
            .unwrap()
            .pop_front()
            .ok_or_else(|| TutorError::provider("no more scripted output"))?;
        Ok(LLMResponse::text(model, output))
    }

    async fn list_models(&self) -> Result<Vec<String>> {
        Ok(vec!["tutor-test".to_string()])
    }

    fn name(&self) -> &str {
        "scripted"
    }
}

fn test_config() -> Config {
    let mut config = Config::default();
    config.model.name = "tutor-test".to_string();
    config.streaming.enabled = false;
    config
}

fn tutor(model: Arc<ScriptedModel>, config: Config) -> Agent {
    let tools = ToolRegistry::with_defaults(&config);
    Agent::with_parts(config, model, tools)
}

#[tokio::test]
async fn test_arithmetic_question_uses_calculator() {
    let model = ScriptedModel::new(&[
        "Thought: I should compute this with the calculator.\n\
         Action: Calculator\n\
         Action Input: 123 + 456 * 7",
        "Thought: I now know the final answer.\n\
         Final Answer: 123 + 456 * 7 = 3315, because multiplication comes first.",
    ]);
    let mut agent = tutor(model.clone(), test_config());

    let answer = agent.process("What is 123 + 456 * 7?").await.unwrap();
    assert!(answer.contains("3315"));

    let prompts = model.prompts();
    assert_eq!(prompts.len(), 2);

    // First prompt carries the question and every tool description
    assert!(prompts[0].contains("New question: What is 123 + 456 * 7?"));
    for tool in agent.tools().descriptors() {
        assert!(prompts[0].contains(&tool.description), "missing {}", tool.name);
    }

    // Second prompt carries the calculator result back to the model
    assert!(prompts[1].ends_with(
        "New question: What is 123 + 456 * 7?\n\
         Action: Calculator\nAction Input: 123 + 456 * 7\nObservation: 3315\nThought:"
    ));
    assert_eq!(
        prompts[1].matches("Observation: 3315").count(),
        prompts[0].matches("Observation: 3315").count() + 1
    );

    assert_eq!(agent.conversation_length(), 2);
}

#[tokio::test]
async fn test_unknown_tool_is_reported_to_the_model() {
    let model = ScriptedModel::new(&[
        "Action: Abacus\nAction Input: 2 + 2",
        "Final Answer: 4",
    ]);
    let mut agent = tutor(model.clone(), test_config());

    let answer = agent.process("What is 2 + 2?").await.unwrap();
    assert_eq!(answer, "4");

    let prompts = model.prompts();
    assert!(prompts[1].contains(
        "Observation: Abacus is not a valid tool, try one of [Calculator, Python, Wikipedia, Search]."
    ));
}

#[tokio::test]
async fn test_malformed_output_gets_a_second_chance() {
    let model = ScriptedModel::new(&[
        "Hmm, I think the answer is probably five.",
        "Final Answer: 5",
    ]);
    let mut agent = tutor(model.clone(), test_config());

    let answer = agent.process("What is 10 / 2?").await.unwrap();
    assert_eq!(answer, "5");

    let prompts = model.prompts();
    assert!(prompts[1].contains("Action: _Exception\n"));
    assert!(prompts[1].contains("Observation: Invalid Format"));
}

#[tokio::test]
async fn test_iteration_cap_returns_last_observation() {
    let model = ScriptedModel::new(&[
        "Action: Calculator\nAction Input: 1 + 1",
        "Action: Calculator\nAction Input: 2 + 2",
        "Final Answer: never reached",
    ]);
    let mut config = test_config();
    config.agent.max_iterations = 2;
    let mut agent = tutor(model.clone(), config);

    let answer = agent.process("Keep adding").await.unwrap();
    assert_eq!(answer, "4");
    assert_eq!(model.prompts().len(), 2);
}

#[tokio::test]
async fn test_iteration_cap_on_malformed_output_returns_model_text() {
    let model = ScriptedModel::new(&[
        "Action: Calculator\nAction Input: 6 * 7",
        "The product of 6 and 7 is 42.",
    ]);
    let mut config = test_config();
    config.agent.max_iterations = 2;
    let mut agent = tutor(model, config);

    let answer = agent.process("What is 6 times 7?").await.unwrap();
    assert_eq!(answer, "The product of 6 and 7 is 42.");
}

#[tokio::test]
async fn test_history_window_keeps_last_exchange() {
    let model = ScriptedModel::new(&[
        "Final Answer: 2",
        "Final Answer: 9",
        "Final Answer: 16",
    ]);
    let mut agent = tutor(model.clone(), test_config());

    agent.process("What is 1 + 1?").await.unwrap();
    agent.process("What is 3 squared?").await.unwrap();
    agent.process("And 4 squared?").await.unwrap();

    let prompts = model.prompts();
    assert!(!prompts[0].contains("Human:"));
    assert!(prompts[1].contains("Human: What is 1 + 1?\nAI: 2"));
    assert!(prompts[2].contains("Human: What is 3 squared?\nAI: 9"));
    assert!(!prompts[2].contains("What is 1 + 1?"));

    assert_eq!(agent.conversation_length(), 2);
}

#[tokio::test]
async fn test_streaming_forwards_reasoning_tokens() {
    let model = ScriptedModel::new(&["Final Answer: 7"]);
    let mut config = test_config();
    config.streaming.enabled = true;
    let mut agent = tutor(model, config);

    let seen = Arc::new(Mutex::new(String::new()));
    let sink = seen.clone();
    agent.set_token_sink(Box::new(move |token| sink.lock().unwrap().push_str(token)));

    let answer = agent.process("What is 3 + 4?").await.unwrap();
    assert_eq!(answer, "7");
    assert_eq!(seen.lock().unwrap().as_str(), "Final Answer: 7\n");
}

/// Front-end that feeds fixed input lines and records the transcript
struct ScriptedUi {
    inputs: VecDeque<String>,
    transcript: Vec<(ChatRole, String)>,
    thinking: usize,
}

impl ScriptedUi {
    fn new(inputs: &[&str]) -> Self {
        Self {
            inputs: inputs.iter().map(|s| s.to_string()).collect(),
            transcript: Vec::new(),
            thinking: 0,
        }
    }

    fn said_by(&self, role: ChatRole) -> Vec<&str> {
        self.transcript
            .iter()
            .filter(|(r, _)| *r == role)
            .map(|(_, text)| text.as_str())
            .collect()
    }
}

impl ChatUi for ScriptedUi {
    fn display(&mut self, role: ChatRole, text: &str) {
        self.transcript.push((role, text.to_string()));
    }

    fn await_user_input(&mut self) -> Option<String> {
        self.inputs.pop_front()
    }

    fn thinking(&mut self) {
        self.thinking += 1;
    }

    fn token_sink(&self) -> Option<StreamCallback> {
        None
    }
}

#[tokio::test]
async fn test_repl_answers_questions_and_commands() {
    let model = ScriptedModel::new(&[
        "Action: Calculator\nAction Input: 6 * 7",
        "Final Answer: 42",
    ]);
    let agent = tutor(model, test_config());
    let ui = ScriptedUi::new(&["", "What is 6 times 7?", "history", "quit", "never read"]);

    let mut repl = Repl::with_ui(agent, ui);
    repl.run().await.unwrap();

    let ui = repl.ui();
    assert_eq!(ui.said_by(ChatRole::User), vec!["What is 6 times 7?"]);
    assert_eq!(ui.said_by(ChatRole::Assistant), vec!["42"]);
    assert_eq!(ui.thinking, 1);

    let notices = ui.said_by(ChatRole::System);
    assert!(notices.iter().any(|n| n.contains("You: What is 6 times 7?")));
    assert!(notices.last().unwrap().contains("Goodbye"));

    assert_eq!(repl.agent().conversation_length(), 2);
}

#[tokio::test]
async fn test_repl_reports_model_errors_in_the_chat() {
    let model = ScriptedModel::new(&[]);
    let agent = tutor(model, test_config());
    let ui = ScriptedUi::new(&["What is 1 + 1?"]);

    let mut repl = Repl::with_ui(agent, ui);
    repl.run().await.unwrap();

    let replies = repl.ui().said_by(ChatRole::Assistant);
    assert_eq!(replies.len(), 1);
    assert!(replies[0].contains("no more scripted output"));
    assert_eq!(repl.agent().conversation_length(), 0);
}

#[tokio::test]
async fn test_repl_stops_when_model_is_missing() {
    let model = ScriptedModel::new(&["Final Answer: unused"]);
    let mut config = test_config();
    config.model.name = "not-installed".to_string();
    let agent = tutor(model.clone(), config);
    let ui = ScriptedUi::new(&["What is 1 + 1?"]);

    let mut repl = Repl::with_ui(agent, ui);
    repl.run().await.unwrap();

    let notices = repl.ui().said_by(ChatRole::System);
    assert!(notices.iter().any(|n| n.contains("Initialization Error")));
    assert!(repl.ui().said_by(ChatRole::User).is_empty());
    assert!(model.prompts().is_empty());
}
