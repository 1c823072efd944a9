//! Drives the per-repository tasks to completion or early cancellation

use std::path::PathBuf;
use std::sync::Arc;
use std::time::{SystemTime, UNIX_EPOCH};

use tokio::task::JoinSet;
use tokio_util::sync::CancellationToken;

use super::aggregator::{ReportSink, ResultAggregator};
use super::discovery::RepositoryRef;
use super::task::{run_repo_task, ArchiveFetcher};
use super::SearchQuery;
use crate::{HarvestOutcome, Result};

/// Runs the harvest: one concurrent task per candidate repository, results
/// folded as they complete, the whole run cancelled once the quota is met.
pub struct Harvester {
    fetcher: Arc<dyn ArchiveFetcher>,
    workspace_root: PathBuf,
}

impl Harvester {
    /// Create a harvester using the given archive fetcher.
    ///
    /// Workspaces live under a unique directory in the system temp dir
    /// unless overridden with [`Harvester::with_workspace_root`].
    pub fn new(fetcher: Arc<dyn ArchiveFetcher>) -> Self {
        let nanos = SystemTime::now()
            .duration_since(UNIX_EPOCH)
            .unwrap_or_default()
            .as_nanos();
        let workspace_root = std::env::temp_dir().join(format!(
            "callscout-{}-{nanos}",
            std::process::id()
        ));
        Self {
            fetcher,
            workspace_root,
        }
    }

    /// Override where per-task workspaces are created.
    ///
    /// The directory is shared across tasks only as a namespace; each task
    /// gets its own exclusive subdirectory. The whole root is removed when
    /// the run finishes.
    pub fn with_workspace_root(mut self, root: impl Into<PathBuf>) -> Self {
        self.workspace_root = root.into();
        self
    }

    /// Execute the run over the discovered candidates.
    ///
    /// Tasks complete in any order; report fragments are appended in
    /// completion order. Per-task failures are tolerated and contribute
    /// nothing. Once the quota is reached the cancellation token is set:
    /// tasks check it before download and before extraction, while a task
    /// already scanning finishes and its result is folded by the aggregator
    /// (which drops contributions past the quota).
    pub async fn run(
        &self,
        query: &SearchQuery,
        repos: Vec<RepositoryRef>,
        sink: Option<ReportSink>,
    ) -> Result<HarvestOutcome> {
        std::fs::create_dir_all(&self.workspace_root)?;

        let query = Arc::new(query.clone());
        let aggregator = Arc::new(ResultAggregator::new(query.limit).with_sink(sink));
        let token = CancellationToken::new();

        let mut tasks = JoinSet::new();
        for repo in repos {
            tasks.spawn(run_repo_task(
                repo,
                Arc::clone(&query),
                Arc::clone(&self.fetcher),
                Arc::clone(&aggregator),
                token.clone(),
                self.workspace_root.clone(),
            ));
        }

        while let Some(joined) = tasks.join_next().await {
            match joined {
                Ok((found, fragment)) => {
                    let reached = aggregator.fold(found, &fragment);
                    if reached && !token.is_cancelled() {
                        tracing::info!("Example quota reached, cancelling remaining tasks");
                        token.cancel();
                    }
                }
                // Tasks contain their own failures; a join error means a panic
                Err(e) => tracing::warn!(error = %e, "Repository task aborted"),
            }
        }

        if let Err(e) = std::fs::remove_dir_all(&self.workspace_root) {
            tracing::warn!(
                path = %self.workspace_root.display(),
                error = %e,
                "Failed to remove workspace root"
            );
        }

        let (total_found, report) = aggregator.snapshot();
        Ok(HarvestOutcome {
            total_found,
            report,
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use async_trait::async_trait;

    struct NoFetch;

    #[async_trait]
    impl ArchiveFetcher for NoFetch {
        async fn fetch(&self, _url: &str) -> Result<Vec<u8>> {
            Err(crate::CallscoutError::Other("offline".to_string()))
        }
    }

    #[tokio::test]
    async fn empty_candidate_list_yields_empty_outcome() {
        let query =
            SearchQuery::new("python", "requests", None, Some("get"), 5, 10).unwrap();
        let root = std::env::temp_dir().join(format!("callscout-test-{}", std::process::id()));

        let harvester = Harvester::new(Arc::new(NoFetch)).with_workspace_root(&root);
        let outcome = harvester.run(&query, Vec::new(), None).await.unwrap();

        assert_eq!(outcome.total_found, 0);
        assert_eq!(outcome.report, "");
        assert!(!root.exists());
    }

    #[tokio::test]
    async fn fetch_failures_are_tolerated() {
        let query =
            SearchQuery::new("python", "requests", None, Some("get"), 5, 10).unwrap();
        let repos = vec![
            RepositoryRef {
                full_name: "a/one".to_string(),
                stars: 1,
            },
            RepositoryRef {
                full_name: "b/two".to_string(),
                stars: 2,
            },
        ];

        let harvester = Harvester::new(Arc::new(NoFetch));
        let outcome = harvester.run(&query, repos, None).await.unwrap();

        assert_eq!(outcome.total_found, 0);
        assert_eq!(outcome.report, "");
    }
}
