//! Concurrent harvesting of call-site examples across repositories

use std::path::PathBuf;
use std::sync::Arc;

use crate::{HarvestOutcome, Result};

mod aggregator;
mod discovery;
pub mod languages;
mod orchestrator;
mod scanner;
mod task;
mod workspace;

pub use aggregator::{ReportSink, ResultAggregator};
pub use discovery::{GitHubSearch, RepositoryRef};
pub use orchestrator::Harvester;
pub use scanner::{CallPattern, LineMatcher, UsageScanner};
pub use task::{ArchiveFetcher, HttpFetcher};
pub use workspace::Workspace;

/// The symbol whose call-sites are being searched for
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum TargetSymbol {
    /// A function, matched as `<boundary>name(`
    Function(String),
    /// A class, matched as `<boundary>name` followed by `.` or `(`
    Class(String),
}

impl TargetSymbol {
    /// The bare symbol name
    pub fn name(&self) -> &str {
        match self {
            TargetSymbol::Function(name) | TargetSymbol::Class(name) => name,
        }
    }
}

/// Immutable, validated parameters for one harvest run
#[derive(Debug, Clone)]
pub struct SearchQuery {
    /// Programming language of the sources to scan
    pub language: String,
    /// Module whose repositories are discovered via the search index
    pub module: String,
    /// The function or class to locate
    pub target: TargetSymbol,
    /// Context-window half-width around each match
    pub lines_around: usize,
    /// Global example quota for the whole run
    pub limit: usize,
    /// File extensions eligible for scanning, resolved from the language
    pub extensions: Vec<String>,
}

impl SearchQuery {
    /// Validate run parameters and resolve the language's file extensions.
    ///
    /// Rejects configurations where neither or both of class/function are
    /// supplied, where the quota is zero, or where the language has no
    /// registered extensions. All of these are caught before any repository
    /// task is launched.
    pub fn new(
        language: &str,
        module: &str,
        class_name: Option<&str>,
        function_name: Option<&str>,
        lines_around: usize,
        limit: usize,
    ) -> Result<Self> {
        let target = match (class_name, function_name) {
            (Some(class), None) => TargetSymbol::Class(class.to_string()),
            (None, Some(function)) => TargetSymbol::Function(function.to_string()),
            _ => return Err(crate::CallscoutError::InvalidTarget),
        };

        if limit == 0 {
            return Err(crate::CallscoutError::Other(
                "examples limit must be greater than zero".to_string(),
            ));
        }

        let extensions = languages::extensions_for(language)
            .ok_or_else(|| crate::CallscoutError::UnknownLanguage(language.to_string()))?
            .iter()
            .map(|ext| ext.to_string())
            .collect();

        Ok(Self {
            language: language.to_string(),
            module: module.to_string(),
            target,
            lines_around,
            limit,
            extensions,
        })
    }
}

/// Builder for a call-site example search
pub struct UsageSearch {
    language: String,
    module: String,
    class_name: Option<String>,
    function_name: Option<String>,
    lines_around: usize,
    limit: usize,
    report_path: Option<PathBuf>,
}

impl UsageSearch {
    /// Create a new search for the given language and module
    pub fn new(language: &str, module: &str) -> Self {
        Self {
            language: language.to_string(),
            module: module.to_string(),
            class_name: None,
            function_name: None,
            lines_around: 5,
            limit: 10,
            report_path: None,
        }
    }

    /// Target a function call-site
    pub fn function(mut self, name: &str) -> Self {
        self.function_name = Some(name.to_string());
        self
    }

    /// Target a class usage
    pub fn class(mut self, name: &str) -> Self {
        self.class_name = Some(name.to_string());
        self
    }

    /// Number of lines shown around each match (default 5)
    pub fn context_lines(mut self, lines: usize) -> Self {
        self.lines_around = lines;
        self
    }

    /// Maximum total number of occurrences to collect (default 10)
    pub fn limit(mut self, limit: usize) -> Self {
        self.limit = limit;
        self
    }

    /// Append report fragments to the given file as tasks complete
    pub fn report_to(mut self, path: impl Into<PathBuf>) -> Self {
        self.report_path = Some(path.into());
        self
    }

    /// Execute the search
    pub async fn run(self) -> Result<HarvestOutcome> {
        // 1. Validate parameters before anything is launched
        let query = SearchQuery::new(
            &self.language,
            &self.module,
            self.class_name.as_deref(),
            self.function_name.as_deref(),
            self.lines_around,
            self.limit,
        )?;

        // 2. Discover candidate repositories; a failure here is fatal
        let repos = GitHubSearch::new()?.search(&query.module).await?;

        // 3. Drive one task per repository until the quota is met
        let fetcher = Arc::new(HttpFetcher::new()?);
        let sink = self.report_path.map(ReportSink::new);
        Harvester::new(fetcher).run(&query, repos, sink).await
    }
}
