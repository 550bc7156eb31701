//! Tools the hosted responder may invoke
//!
//! A tool is a single-step collaborator: the model asks for it once per
//! turn, its result is folded into one follow-up completion, and that is
//! the end of the round-trip.

mod search;

use async_trait::async_trait;

pub use search::{SearchProvider, SearchResult, WebSearchTool};

/// Name the web-search tool is declared under
pub const WEB_SEARCH_TOOL: &str = "web_search";

/// A lookup tool that never fails
///
/// Failures are reported as an explanatory string the model (and therefore
/// the user) can read, never as an error.
#[async_trait(?Send)]
pub trait SearchTool {
    /// Run a query and return a short, readable summary of the results
    async fn lookup(&self, query: &str) -> String;
}
