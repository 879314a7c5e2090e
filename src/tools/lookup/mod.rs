//! Lookup tools module
//!
//! Tools that fetch text from Wikipedia and the web.

mod search;
mod wikipedia;

pub use search::SearchTool;
pub use wikipedia::WikipediaTool;
