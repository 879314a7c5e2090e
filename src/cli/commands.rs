//! CLI commands
//!
//! Special commands that can be executed in the REPL.

use crate::agent::Agent;
use crate::core::Result;

/// Result of parsing a command
#[derive(Debug, PartialEq)]
pub enum CommandResult {
    /// Continue processing as a question
    Continue(String),
    /// Command was handled, show output
    Handled(String),
    /// Exit the REPL
    Exit,
    /// Clear history
    Clear,
    /// No output needed
    None,
}

/// Parse and handle special commands
pub async fn handle_command(input: &str, agent: &mut Agent) -> Result<CommandResult> {
    let input = input.trim();
    let parts: Vec<&str> = input.splitn(2, ' ').collect();
    let cmd = parts[0].trim_start_matches('/').to_lowercase();
    let args = parts.get(1).map(|s| s.trim()).unwrap_or("");

    // Commands are single words; longer text is always a question
    if !args.is_empty() && cmd != "set" {
        return Ok(CommandResult::Continue(input.to_string()));
    }

    match cmd.as_str() {
        "exit" | "quit" | "q" => Ok(CommandResult::Exit),

        "clear" | "reset" => {
            agent.clear_history();
            Ok(CommandResult::Clear)
        }

        "help" | "?" => Ok(CommandResult::Handled(help_text())),

        "tools" => {
            let listing = agent
                .tools()
                .descriptors()
                .iter()
                .map(|t| format!("  {}: {}", t.name, t.description))
                .collect::<Vec<_>>()
                .join("\n");
            Ok(CommandResult::Handled(format!("Tools:\n{}", listing)))
        }

        "history" => {
            let history = agent.history();
            if history.is_empty() {
                return Ok(CommandResult::Handled("History is empty.".to_string()));
            }
            let lines = history
                .iter()
                .map(|m| {
                    let who = if m.is_user() { "You" } else { "Tutor" };
                    format!("  {}: {}", who, m.content)
                })
                .collect::<Vec<_>>()
                .join("\n");
            Ok(CommandResult::Handled(lines))
        }

        "models" => {
            let models = agent.list_models().await?;
            let output = format!(
                "Available models:\n{}\n\nCurrent: {}",
                models
                    .iter()
                    .map(|m| format!("  - {}", m))
                    .collect::<Vec<_>>()
                    .join("\n"),
                agent.config().model.name
            );
            Ok(CommandResult::Handled(output))
        }

        "set" => handle_set_command(input, args, agent),

        "status" => {
            let config = agent.config();
            let status = format!(
                "Tutor Status:\n\
                 ─────────────────────────────\n\
                 Provider:     {} ({})\n\
                 Model:        {}\n\
                 Temperature:  {}\n\
                 Iterations:   {} max\n\
                 History:      {} messages\n\
                 Streaming:    {}\n\
                 Debug:        {}",
                agent.provider_name(),
                config.provider_url(),
                config.model.name,
                config.model.temperature,
                config.agent.max_iterations,
                agent.conversation_length(),
                on_off(config.streaming.enabled),
                on_off(config.agent.debug),
            );
            Ok(CommandResult::Handled(status))
        }

        "debug" => {
            let new_state = !agent.config().agent.debug;
            agent.set_debug(new_state);
            Ok(CommandResult::Handled(format!(
                "Debug mode: {}",
                on_off(new_state).to_uppercase()
            )))
        }

        "save" => {
            let path = agent.save_config()?;
            Ok(CommandResult::Handled(format!(
                "Configuration saved to {}",
                path.display()
            )))
        }

        _ => {
            if input.starts_with('/') {
                Ok(CommandResult::Handled(format!(
                    "Unknown command: {}. Type 'help' for available commands.",
                    cmd
                )))
            } else {
                Ok(CommandResult::Continue(input.to_string()))
            }
        }
    }
}

/// Handle 'set' subcommands. Text that names no known setting is a question.
fn handle_set_command(input: &str, args: &str, agent: &mut Agent) -> Result<CommandResult> {
    let parts: Vec<&str> = args.splitn(2, ' ').collect();

    if parts[0].is_empty() {
        return Ok(CommandResult::Handled(
            "Usage: set <model|temperature|streaming|debug> <value>\n\
             Examples:\n\
               set model gpt-3.5-turbo\n\
               set temperature 0\n\
               set streaming off"
                .to_string(),
        ));
    }

    let key = parts[0].to_lowercase();
    let value = parts.get(1).map(|s| s.trim()).unwrap_or("");

    match key.as_str() {
        "model" => {
            if value.is_empty() {
                return Ok(CommandResult::Handled(format!(
                    "Current model: {}",
                    agent.config().model.name
                )));
            }
            if value.contains(char::is_whitespace) {
                return Ok(CommandResult::Continue(input.to_string()));
            }
            agent.set_model(value);
            Ok(CommandResult::Handled(format!("Model set to: {}", value)))
        }

        "temperature" | "temp" => match value.parse::<f32>() {
            Ok(t) if (0.0..=2.0).contains(&t) => {
                agent.set_temperature(t);
                Ok(CommandResult::Handled(format!("Temperature set to: {}", t)))
            }
            _ => Ok(CommandResult::Handled(
                "Temperature must be a number between 0 and 2".to_string(),
            )),
        },

        "streaming" | "stream" => {
            let enabled = parse_flag(value);
            agent.set_streaming(enabled);
            Ok(CommandResult::Handled(format!(
                "Streaming: {}",
                on_off(enabled).to_uppercase()
            )))
        }

        "debug" => {
            let enabled = parse_flag(value);
            agent.set_debug(enabled);
            Ok(CommandResult::Handled(format!(
                "Debug mode: {}",
                on_off(enabled).to_uppercase()
            )))
        }

        _ => Ok(CommandResult::Continue(input.to_string())),
    }
}

fn parse_flag(value: &str) -> bool {
    matches!(value.to_lowercase().as_str(), "on" | "true" | "1" | "yes")
}

fn on_off(enabled: bool) -> &'static str {
    if enabled {
        "on"
    } else {
        "off"
    }
}

/// Generate help text
fn help_text() -> String {
    r#"Tutor Commands:
─────────────────────────────────────────────
  help, ?          Show this help message
  exit, quit, q    Exit the tutor
  clear, reset     Clear conversation history
  status           Show current configuration
  tools            List the tools the tutor can use
  history          Show the remembered exchanges
  models           List models served by the provider
  debug            Toggle prompt logging
  save             Save the configuration file

  set model <name>           Switch the reasoning model
  set temperature <0-2>      Set the sampling temperature
  set streaming <on|off>     Show reasoning as it is generated
  set debug <on|off>         Enable/disable prompt logging

Anything else is sent to the tutor as a question.
─────────────────────────────────────────────"#
        .to_string()
}
