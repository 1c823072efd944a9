//! # callscout - Call-Site Example Harvester
//!
//! Finds real-world usage examples of a named function or class by querying
//! a code-hosting search index, downloading candidate repository archives
//! concurrently, and scanning the unpacked sources for call-site patterns.
//!
//! ## Usage
//!
//! ```rust,no_run
//! use callscout::Callscout;
//!
//! #[tokio::main]
//! async fn main() -> anyhow::Result<()> {
//!     // Find up to 10 snippets showing how requests.get is called
//!     let outcome = Callscout::function("python", "requests", "get")
//!         .context_lines(5)
//!         .limit(10)
//!         .run()
//!         .await?;
//!
//!     println!("Found {} occurrences", outcome.total_found);
//!     print!("{}", outcome.report);
//!
//!     Ok(())
//! }
//! ```

use std::path::PathBuf;

pub mod error;
pub mod harvest;

pub use error::{CallscoutError, Result};
pub use harvest::UsageSearch;

/// Main entry point for call-site example searches
pub struct Callscout;

impl Callscout {
    /// Search for call-sites of a function from the given module
    pub fn function(language: &str, module: &str, name: &str) -> UsageSearch {
        UsageSearch::new(language, module).function(name)
    }

    /// Search for usages of a class from the given module
    pub fn class(language: &str, module: &str, name: &str) -> UsageSearch {
        UsageSearch::new(language, module).class(name)
    }
}

/// Result of a harvest run
#[derive(Debug, Clone)]
pub struct HarvestOutcome {
    /// Total number of occurrences collected across all repositories
    pub total_found: usize,
    /// Formatted report text, fragments in task completion order
    pub report: String,
}

/// One matched call-site with its surrounding lines
#[derive(Debug, Clone)]
pub struct Occurrence {
    /// File the match was found in (inside the extracted tree)
    pub file_path: PathBuf,
    /// 1-based line number of the matched line
    pub line_number: usize,
    /// Context window, clipped to the file bounds, in ascending line order
    pub snippet: Vec<SnippetLine>,
}

/// A single line of a snippet, keeping its original line number
#[derive(Debug, Clone)]
pub struct SnippetLine {
    /// 1-based line number in the source file
    pub number: usize,
    /// Line text with triple-quote and block-comment-open markers stripped
    pub text: String,
}
