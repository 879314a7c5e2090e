//! Wikipedia tool
//!
//! Searches the MediaWiki API and returns the intro of the best matches.

use async_trait::async_trait;
use reqwest::Client;
use serde::Deserialize;
use std::collections::HashMap;
use std::time::Duration;
use tracing::debug;
use url::Url;

use crate::core::{Config, Result, ToolCategory, TutorError};
use crate::tools::{truncate_chars, Tool};

/// Number of pages summarized per lookup
const TOP_K: usize = 2;

/// Tool for looking up definitions on Wikipedia
pub struct WikipediaTool {
    client: Client,
    api_url: String,
    max_chars: usize,
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    query: SearchQuery,
}

#[derive(Debug, Deserialize)]
struct SearchQuery {
    search: Vec<SearchHit>,
}

#[derive(Debug, Deserialize)]
struct SearchHit {
    title: String,
}

#[derive(Debug, Deserialize)]
struct ExtractResponse {
    query: ExtractQuery,
}

#[derive(Debug, Deserialize)]
struct ExtractQuery {
    pages: HashMap<String, Page>,
}

#[derive(Debug, Deserialize)]
struct Page {
    title: String,
    #[serde(default)]
    extract: Option<String>,
}

impl WikipediaTool {
    pub fn new(api_url: impl Into<String>, max_chars: usize) -> Self {
        let client = Client::builder()
            .timeout(Duration::from_secs(20))
            .user_agent(concat!("mathtutor/", env!("CARGO_PKG_VERSION")))
            .build()
            .unwrap_or_else(|_| Client::new());

        Self {
            client,
            api_url: api_url.into(),
            max_chars,
        }
    }

    pub fn from_config(config: &Config) -> Self {
        Self::new(config.tools.wikipedia_url.clone(), config.tools.max_chars)
    }

    fn search_url(&self, query: &str) -> Result<Url> {
        Url::parse_with_params(
            &self.api_url,
            &[
                ("action", "query"),
                ("list", "search"),
                ("srsearch", query),
                ("srlimit", "3"),
                ("format", "json"),
            ],
        )
        .map_err(|e| TutorError::with_context("Invalid Wikipedia URL", e))
    }

    fn extract_url(&self, titles: &[String]) -> Result<Url> {
        let titles = titles.join("|");
        Url::parse_with_params(
            &self.api_url,
            &[
                ("action", "query"),
                ("prop", "extracts"),
                ("exintro", "1"),
                ("explaintext", "1"),
                ("redirects", "1"),
                ("titles", titles.as_str()),
                ("format", "json"),
            ],
        )
        .map_err(|e| TutorError::with_context("Invalid Wikipedia URL", e))
    }

    async fn get_json<T: for<'de> Deserialize<'de>>(&self, url: Url) -> Result<T> {
        let response = self.client.get(url).send().await?;
        if !response.status().is_success() {
            return Err(TutorError::tool(format!(
                "Wikipedia returned {}",
                response.status()
            )));
        }
        Ok(response.json().await?)
    }
}

/// Render pages in search order as `Page:` / `Summary:` blocks
fn render_pages(order: &[String], pages: Vec<Page>) -> String {
    let mut by_title: HashMap<String, String> = pages
        .into_iter()
        .filter_map(|p| p.extract.map(|e| (p.title, e)))
        .collect();

    order
        .iter()
        .filter_map(|title| {
            by_title
                .remove(title)
                .filter(|e| !e.trim().is_empty())
                .map(|summary| format!("Page: {}\nSummary: {}", title, summary.trim()))
        })
        .collect::<Vec<_>>()
        .join("\n\n")
}

#[async_trait]
impl Tool for WikipediaTool {
    fn name(&self) -> &str {
        "Wikipedia"
    }

    fn description(&self) -> &str {
        "to look up definitions of math theorems and concepts"
    }

    fn category(&self) -> ToolCategory {
        ToolCategory::Lookup
    }

    async fn run(&self, input: &str) -> Result<String> {
        let query = input.trim();
        if query.is_empty() {
            return Err(TutorError::tool("Empty Wikipedia query"));
        }

        let search: SearchResponse = self.get_json(self.search_url(query)?).await?;
        let titles: Vec<String> = search
            .query
            .search
            .into_iter()
            .take(TOP_K)
            .map(|hit| hit.title)
            .collect();
        debug!(query, ?titles, "wikipedia search");

        if titles.is_empty() {
            return Ok("No good Wikipedia Search Result was found".to_string());
        }

        let extracts: ExtractResponse = self.get_json(self.extract_url(&titles)?).await?;
        let pages = extracts.query.pages.into_values().collect();
        let rendered = render_pages(&titles, pages);

        if rendered.is_empty() {
            Ok("No good Wikipedia Search Result was found".to_string())
        } else {
            Ok(truncate_chars(&rendered, self.max_chars))
        }
    }
}
