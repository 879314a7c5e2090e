//! Web search tool
//!
//! Queries the DuckDuckGo instant-answer API.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::{Config, Result, ToolCategory, TutorError};
use crate::tools::{truncate_chars, Tool};

const NO_RESULT: &str = "No good DuckDuckGo Search Result was found";

/// Related topics included when there is no direct answer
const MAX_TOPICS: usize = 3;

/// Tool for searching the web
pub struct SearchTool {
    client: Client,
    endpoint: String,
    max_chars: usize,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct InstantAnswer {
    #[serde(default)]
    answer: String,
    #[serde(default)]
    abstract_text: String,
    #[serde(default, rename = "AbstractURL")]
    abstract_url: String,
    #[serde(default)]
    definition: String,
    #[serde(default)]
    related_topics: Vec<RelatedTopic>,
}

/// Either a topic or a named group of topics
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum RelatedTopic {
    Topic {
        #[serde(rename = "Text")]
        text: String,
    },
    Group {
        #[serde(rename = "Topics")]
        topics: Vec<RelatedTopic>,
    },
}

impl RelatedTopic {
    fn collect_texts<'a>(&'a self, out: &mut Vec<&'a str>) {
        match self {
            RelatedTopic::Topic { text } => out.push(text),
            RelatedTopic::Group { topics } => {
                for topic in topics {
                    topic.collect_texts(out);
                }
            }
        }
    }
}

impl SearchTool {
    pub fn new(endpoint: impl Into<String>, max_chars: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("mathtutor/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            endpoint: endpoint.into(),
            max_chars,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tools.search_url.clone(), config.tools.max_chars)
    }

    fn query_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.endpoint,
            &[
                ("q", query),
                ("format", "json"),
                ("no_html", "1"),
                ("skip_disambig", "1"),
            ],
        )
        .map_err(|e| TutorError::with_context("Invalid search URL", e))
    }
}

/// Best text from an instant answer, most direct first
fn summarize(answer: &InstantAnswer) -> Option<String> {
    let mut parts = Vec::new();

    if !answer.answer.trim().is_empty() {
        parts.push(answer.answer.trim().to_string());
    }
    if !answer.abstract_text.trim().is_empty() {
        let mut text = answer.abstract_text.trim().to_string();
        if !answer.abstract_url.is_empty() {
            text.push_str(&format!(" ({})", answer.abstract_url));
        }
        parts.push(text);
    }
    if !answer.definition.trim().is_empty() {
        parts.push(answer.definition.trim().to_string());
    }

    if parts.is_empty() {
        let mut texts = Vec::new();
        for topic in &answer.related_topics {
            topic.collect_texts(&mut texts);
        }
        parts.extend(
            texts
                .into_iter()
                .filter(|t| !t.trim().is_empty())
                .take(MAX_TOPICS)
                .map(|t| t.trim().to_string()),
        );
    }

    if parts.is_empty() {
        None
    } else {
        Some(parts.join("\n"))
    }
}

#[async_trait]
impl Tool for SearchTool {
    fn name(&self) -> &str {
        "Search"
    }

    fn description(&self) -> &str {
        "useful for when you need to do a search on the internet to answer questions that the other tools are unable to give a correct answer. Be specific with your input."
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Lookup
    }

    async fn run(&self, input: &str) -> Result<String> {
        let query = input.trim();
        if query.is_empty() {
            return Err(TutorError::tool("Empty search query"));
        }

        let response = self.client.get(self.query_url(query)?).send().await?;
        if !response.status().is_success() {
            return Err(TutorError::tool(format!(
                "Search returned {}",
                response.status()
            )));
        }

        // The API answers with a JS content type, so parse the text
        let body = response.text().await?;
        let answer: InstantAnswer = serde_json::from_str(&body)?;
        debug!(query, topics = answer.related_topics.len(), "search");

        Ok(summarize(&answer)
            .map(|s| truncate_chars(&s, self.max_chars))
            .unwrap_or_else(|| NO_RESULT.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_direct_answer_first() {
        let body = r#"{
            "Answer": "",
            "AbstractText": "The golden ratio is approximately 1.618.",
            "AbstractURL": "https://en.wikipedia.org/wiki/Golden_ratio",
            "Definition": "",
            "RelatedTopics": [{"Text": "Fibonacci number", "FirstURL": "x"}]
        }"#;
        let answer: InstantAnswer = serde_json::from_str(body).unwrap();
        assert_eq!(
            summarize(&answer).unwrap(),
            "The golden ratio is approximately 1.618. (https://en.wikipedia.org/wiki/Golden_ratio)"
        );
    }

    #[test]
    fn test_related_topics_fallback() {
        let body = r#"{
            "AbstractText": "",
            "RelatedTopics": [
                {"Text": "Euler's number, a constant", "FirstURL": "a"},
                {"Name": "Math", "Topics": [{"Text": "Euler's identity", "FirstURL": "b"}]}
            ]
        }"#;
        let answer: InstantAnswer = serde_json::from_str(body).unwrap();
        assert_eq!(
            summarize(&answer).unwrap(),
            "Euler's number, a constant\nEuler's identity"
        );
    }

    #[test]
    fn test_empty_answer() {
        assert!(summarize(&InstantAnswer::default()).is_none());
    }

    #[test]
    fn test_query_url() {
        let tool = SearchTool::new("https://api.duckduckgo.com/", 1000);
        let url = tool.query_url("golden ratio").unwrap();
        assert!(url.query_pairs().any(|(k, v)| k == "q" && v == "golden ratio"));
    }
}
