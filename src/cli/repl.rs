//! Interactive REPL for the tutor
//!
//! Provides the main user interaction loop.

use crate::agent::Agent;
use crate::cli::commands::{handle_command, CommandResult};
use crate::cli::ui::{ChatRole, ChatUi, TerminalUi};
use crate::core::{Config, Result};

/// Interactive REPL (Read-Eval-Print Loop)
pub struct Repl<U: ChatUi = TerminalUi> {
    agent: Agent,
    ui: U,
}

impl Repl<TerminalUi> {
    /// Create a new terminal REPL with default configuration
    pub fn new() -> Self {
        Self::with_config(Config::load())
    }

    /// Create a terminal REPL with custom configuration
    pub fn with_config(config: Config) -> Self {
        Self::with_ui(Agent::with_config(config), TerminalUi::new())
    }
}

impl<U: ChatUi> Repl<U> {
    /// Create a REPL over any front-end
    pub fn with_ui(mut agent: Agent, ui: U) -> Self {
        if let Some(sink) = ui.token_sink() {
            agent.set_token_sink(sink);
        }
        Self { agent, ui }
    }

    /// Run the REPL
    pub async fn run(&mut self) -> Result<()> {
        let banner = self.banner();
        self.ui.display(ChatRole::System, &banner);
        self.ui.display(ChatRole::System, "Initializing...");

        if let Err(e) = self.agent.initialize().await {
            self.ui
                .display(ChatRole::System, &format!("Initialization Error: {}", e));
            return Ok(());
        }
        self.ui
            .display(ChatRole::System, "Ready! Ask me a math question.\n");

        loop {
            let Some(input) = self.ui.await_user_input() else {
                self.ui.display(ChatRole::System, "\nGoodbye!");
                break;
            };

            let input = input.trim();
            if input.is_empty() {
                continue;
            }

            match handle_command(input, &mut self.agent).await {
                Ok(CommandResult::Exit) => {
                    self.ui.display(ChatRole::System, "\nGoodbye!");
                    break;
                }
                Ok(CommandResult::Clear) => {
                    self.ui.display(ChatRole::System, "Conversation cleared.\n");
                }
                Ok(CommandResult::Handled(output)) => {
                    self.ui.display(ChatRole::System, &format!("{}\n", output));
                }
                Ok(CommandResult::None) => {}
                Ok(CommandResult::Continue(question)) => self.ask(&question).await,
                Err(e) => {
                    self.ui
                        .display(ChatRole::System, &format!("Command error: {}\n", e));
                }
            }
        }

        Ok(())
    }

    /// Put one question to the agent. The transcript always gets a reply.
    async fn ask(&mut self, question: &str) {
        self.ui.display(ChatRole::User, question);
        self.ui.thinking();

        let reply = match self.agent.process(question).await {
            Ok(answer) => answer,
            Err(e) => format!("Sorry, I couldn't answer that: {}", e),
        };

        self.ui.display(ChatRole::Assistant, &reply);
    }

    /// The agent behind this REPL
    pub fn agent(&self) -> &Agent {
        &self.agent
    }

    /// The front-end behind this REPL
    pub fn ui(&self) -> &U {
        &self.ui
    }

    /// Startup banner
    fn banner(&self) -> String {
        let config = self.agent.config();
        format!(
            "╔═══════════════════════════════════╗\n\
             ║          AI Math Tutor            ║\n\
             ╚═══════════════════════════════════╝\n\
             Provider:   {} ({})\n\
             Model:      {}\n\
             Tools:      {}\n\
             Memory:     last {} exchange(s)\n\
             \n\
             Commands: help, clear, tools, status, exit\n\
             ───────────────────────────────────────",
            self.agent.provider_name(),
            config.provider_url(),
            config.model.name,
            self.agent.tool_names().join(", "),
            config.agent.memory_window,
        )
    }
}

impl Default for Repl<TerminalUi> {
    fn default() -> Self {
        Self::new()
    }
}
