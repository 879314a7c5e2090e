//! Agent module - orchestration and conversation management
//!
//! Contains the prompt assembler, the response parser and the agent loop
//! that ties them to the model and the tools.

pub mod conversation;
pub mod loop_state;
pub mod orchestrator;
pub mod parser;
pub mod prompt;

pub use conversation::Conversation;
pub use loop_state::{AgentLoopState, IntermediateStep};
pub use orchestrator::Agent;
pub use parser::{parse, OutputParseError, ParsedAction};
pub use prompt::PromptAssembler;
