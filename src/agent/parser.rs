//! Response parsing for the ReAct loop
//!
//! Classifies one raw model completion as a final answer or a tool
//! invocation. The parser never runs tools itself.

use regex::Regex;
use std::sync::OnceLock;
use thiserror::Error;

/// Marks the model's concluding answer
pub const FINAL_ANSWER_MARKER: &str = "Final Answer:";

/// Marks the start of a tool result; also the generation stop sequence
pub const OBSERVATION_MARKER: &str = "Observation:";

/// Stop sequence passed to the model so it never writes its own observation
pub const STOP_SEQUENCE: &str = "\nObservation:";

/// What the model asked for in one completion
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ParsedAction {
    /// The model concluded and this is the answer for the user
    FinalAnswer { text: String },
    /// The model wants `tool_name` run on `tool_input`
    ToolInvocation {
        tool_name: String,
        tool_input: String,
    },
}

impl ParsedAction {
    pub fn final_answer(text: impl Into<String>) -> Self {
        Self::FinalAnswer { text: text.into() }
    }

    pub fn tool(tool_name: impl Into<String>, tool_input: impl Into<String>) -> Self {
        Self::ToolInvocation {
            tool_name: tool_name.into(),
            tool_input: tool_input.into(),
        }
    }

    pub fn is_final(&self) -> bool {
        matches!(self, Self::FinalAnswer { .. })
    }
}

/// Model output that follows neither the answer nor the action format
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum OutputParseError {
    #[error("Could not parse LLM output: `{raw}`")]
    MalformedOutput { raw: String },
}

fn action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // "Action:" or numbered "Action 1:", but never "Action Input:"
    RE.get_or_init(|| Regex::new(r"Action\s*\d*\s*:[ \t]*([^\n]*)\n").expect("valid action regex"))
}

fn action_input_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| {
        Regex::new(r"(?s)Action\s*\d*\s*Input\s*\d*\s*:(.*)").expect("valid action input regex")
    })
}

fn trailing_action_regex() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    // An "Action:" line only counts when an "Action Input:" line follows it
    RE.get_or_init(|| {
        Regex::new(r"\n[ \t]*Action\s*\d*\s*:[^\n]*\n[ \t]*Action\s*\d*\s*Input\s*\d*\s*:")
            .expect("valid trailing action regex")
    })
}

/// Parse one raw completion.
///
/// A final-answer marker wins over any action markers in the same text,
/// and the answer is whatever follows the last such marker. An action
/// block trailing the answer is cut off.
pub fn parse(raw: &str) -> Result<ParsedAction, OutputParseError> {
    if let Some(pos) = raw.rfind(FINAL_ANSWER_MARKER) {
        let answer = &raw[pos + FINAL_ANSWER_MARKER.len()..];
        let answer = match trailing_action_regex().find(answer) {
            Some(m) => &answer[..m.start()],
            None => answer,
        };
        return Ok(ParsedAction::final_answer(answer.trim()));
    }

    parse_action(raw).ok_or_else(|| OutputParseError::MalformedOutput {
        raw: raw.to_string(),
    })
}

fn parse_action(raw: &str) -> Option<ParsedAction> {
    let name_match = action_regex().captures(raw)?;
    let tool_name = name_match.get(1)?.as_str().trim();
    if tool_name.is_empty() {
        return None;
    }

    let after_name = &raw[name_match.get(0)?.end()..];
    let input = action_input_regex().captures(after_name)?.get(1)?.as_str();
    let input = match input.find(OBSERVATION_MARKER) {
        Some(pos) => &input[..pos],
        None => input,
    };

    Some(ParsedAction::tool(tool_name, clean_input(input)))
}

/// Trim whitespace and one pair of surrounding double quotes
fn clean_input(input: &str) -> String {
    let trimmed = input.trim();
    trimmed
        .strip_prefix('"')
        .and_then(|s| s.strip_suffix('"'))
        .unwrap_or(trimmed)
        .to_string()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_simple_action() {
        let parsed = parse("Action: Calculator\nAction Input: 2+2\n").unwrap();
        assert_eq!(parsed, ParsedAction::tool("Calculator", "2+2"));
    }

    #[test]
    fn test_action_with_thought() {
        let raw = "Thought: This needs the calculator.\nAction: Calculator\nAction Input: 123 + 456 * 7";
        assert_eq!(
            parse(raw).unwrap(),
            ParsedAction::tool("Calculator", "123 + 456 * 7")
        );
    }

    #[test]
    fn test_final_answer() {
        let raw = "Thought: I now know the final answer\nFinal Answer: 42";
        assert_eq!(parse(raw).unwrap(), ParsedAction::final_answer("42"));
    }

    #[test]
    fn test_final_answer_wins_over_action() {
        let raw = "Thought: done\nFinal Answer: 42\nAction: Calculator\nAction Input: 1+1";
        assert_eq!(parse(raw).unwrap(), ParsedAction::final_answer("42"));

        let raw = "Action: Calculator\nAction Input: 1+1\nFinal Answer: 42";
        assert_eq!(parse(raw).unwrap(), ParsedAction::final_answer("42"));
    }

    #[test]
    fn test_last_final_answer_marker_wins() {
        let raw = "Final Answer: draft\nThought: revise\nFinal Answer: 42";
        assert_eq!(parse(raw).unwrap(), ParsedAction::final_answer("42"));
    }

    #[test]
    fn test_answer_may_quote_action_lines() {
        let raw = "Final Answer: 3315.\nAction: I used the calculator on 123 + 456 * 7.\nThat gave 3315.";
        assert_eq!(
            parse(raw).unwrap(),
            ParsedAction::final_answer(
                "3315.\nAction: I used the calculator on 123 + 456 * 7.\nThat gave 3315."
            )
        );
    }

    #[test]
    fn test_multiline_final_answer() {
        let raw = "Final Answer: 24.\nFirst, 2.5 * 8 = 20.\nThen 4 + 20 = 24.";
        assert_eq!(
            parse(raw).unwrap(),
            ParsedAction::final_answer("24.\nFirst, 2.5 * 8 = 20.\nThen 4 + 20 = 24.")
        );
    }

    #[test]
    fn test_input_stops_at_observation() {
        let raw = "Action: Calculator\nAction Input: 2+2\nObservation: 5\nThought: hmm";
        assert_eq!(parse(raw).unwrap(), ParsedAction::tool("Calculator", "2+2"));
    }

    #[test]
    fn test_multiline_code_input() {
        let raw = "Action: Python\nAction Input:\n```\nprint(2 ** 10)\n```\n";
        assert_eq!(
            parse(raw).unwrap(),
            ParsedAction::tool("Python", "```\nprint(2 ** 10)\n```")
        );
    }

    #[test]
    fn test_quoted_input() {
        let raw = "Action: Wikipedia\nAction Input: \"Pythagorean theorem\"";
        assert_eq!(
            parse(raw).unwrap(),
            ParsedAction::tool("Wikipedia", "Pythagorean theorem")
        );
    }

    #[test]
    fn test_numbered_markers() {
        let raw = "Action 1: Search\nAction 1 Input: golden ratio";
        assert_eq!(parse(raw).unwrap(), ParsedAction::tool("Search", "golden ratio"));
    }

    #[test]
    fn test_no_marker_is_malformed() {
        let err = parse("The answer is probably 4.").unwrap_err();
        assert_eq!(
            err,
            OutputParseError::MalformedOutput {
                raw: "The answer is probably 4.".to_string()
            }
        );
    }

    #[test]
    fn test_action_without_input_is_malformed() {
        assert!(parse("Action: Calculator\nThought: wait").is_err());
        assert!(parse("Action: Calculator").is_err());
    }

    #[test]
    fn test_input_before_action_is_malformed() {
        assert!(parse("Action Input: 2+2\nAction: Calculator").is_err());
    }

    #[test]
    fn test_empty_action_name_is_malformed() {
        assert!(parse("Action: \nAction Input: 2+2").is_err());
    }
}
