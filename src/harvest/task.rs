//! One retrieve-extract-scan task per candidate repository

use std::path::Path;
use std::sync::Arc;
use std::time::Duration;

use async_trait::async_trait;
use flate2::read::GzDecoder;
use tar::Archive;
use tokio_util::sync::CancellationToken;

use super::aggregator::ResultAggregator;
use super::discovery::RepositoryRef;
use super::scanner::{CallPattern, UsageScanner};
use super::workspace::Workspace;
use super::SearchQuery;
use crate::{CallscoutError, Result};

/// Hard ceiling on one archive download
const DOWNLOAD_TIMEOUT: Duration = Duration::from_secs(60);

/// Retrieves raw archive bytes for a repository.
///
/// Seam between the pipeline and the network, so the whole harvest can run
/// against in-memory archives in tests.
#[async_trait]
pub trait ArchiveFetcher: Send + Sync {
    /// Fetch the archive at the given URL
    async fn fetch(&self, url: &str) -> Result<Vec<u8>>;
}

/// Fetches archives over HTTP with the per-task download timeout
pub struct HttpFetcher {
    client: reqwest::Client,
}

impl HttpFetcher {
    /// Create a fetcher with the 60 second download ceiling
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(concat!("callscout/", env!("CARGO_PKG_VERSION")))
            .timeout(DOWNLOAD_TIMEOUT)
            .build()?;
        Ok(Self { client })
    }
}

#[async_trait]
impl ArchiveFetcher for HttpFetcher {
    async fn fetch(&self, url: &str) -> Result<Vec<u8>> {
        let response = self.client.get(url).send().await?.error_for_status()?;
        Ok(response.bytes().await?.to_vec())
    }
}

/// Turn one repository into a contribution to the run.
///
/// Every failure mode is contained here: network errors, corrupt archives
/// and unreadable files all degrade to a `(0, "")` contribution without
/// touching the rest of the run. The workspace is released on every path,
/// including cancellation, via `Drop`.
pub async fn run_repo_task(
    repo: RepositoryRef,
    query: Arc<SearchQuery>,
    fetcher: Arc<dyn ArchiveFetcher>,
    aggregator: Arc<ResultAggregator>,
    token: CancellationToken,
    workspace_root: std::path::PathBuf,
) -> (usize, String) {
    // Safe boundary: don't start a download once the run is stopping
    if token.is_cancelled() {
        return (0, String::new());
    }

    let bytes = match fetcher.fetch(&repo.archive_url()).await {
        Ok(bytes) => bytes,
        Err(e) => {
            tracing::warn!(repo = %repo.full_name, error = %e, "Archive download failed");
            return (0, String::new());
        }
    };

    let workspace = match Workspace::create(&workspace_root) {
        Ok(workspace) => workspace,
        Err(e) => {
            tracing::warn!(repo = %repo.full_name, error = %e, "Workspace creation failed");
            return (0, String::new());
        }
    };

    if let Err(e) = tokio::fs::write(workspace.archive_path(), &bytes).await {
        tracing::warn!(repo = %repo.full_name, error = %e, "Failed to persist archive");
        return (0, String::new());
    }

    // Safe boundary: never cancel mid-write, only between stages
    if token.is_cancelled() {
        return (0, String::new());
    }

    // A corrupt or oversized archive is tolerated; the scan proceeds over
    // whatever was extracted, possibly nothing.
    let archive_path = workspace.archive_path();
    let extract_dir = workspace.extract_dir();
    let extracted = tokio::task::spawn_blocking(move || extract_archive(&archive_path, &extract_dir)).await;
    match extracted {
        Ok(Ok(())) => {}
        Ok(Err(e)) => {
            tracing::warn!(repo = %repo.full_name, error = %e, "Archive extraction failed")
        }
        Err(e) => {
            tracing::warn!(repo = %repo.full_name, error = %e, "Extraction task failed");
            return (0, String::new());
        }
    }

    // Cap this scan at what the run still needs, read at scan start
    let cap = aggregator.remaining();
    if cap == 0 {
        return (0, String::new());
    }

    let scan_root = workspace.extract_dir();
    let full_name = repo.full_name.clone();
    let scanned = tokio::task::spawn_blocking(move || {
        let scanner = UsageScanner::new(
            scan_root,
            &full_name,
            Box::new(CallPattern::new(&query.target)),
            query.extensions.clone(),
            query.lines_around,
        );
        scanner.scan_tree(cap)
    })
    .await;

    let (found, report) = match scanned {
        Ok(result) => result,
        Err(e) => {
            tracing::warn!(repo = %repo.full_name, error = %e, "Scan task failed");
            return (0, String::new());
        }
    };

    tracing::info!(repo = %repo.full_name, found, "Repository scanned");
    (found, report)
}

/// Unpack a gzipped tarball into the destination directory
fn extract_archive(archive: &Path, destination: &Path) -> Result<()> {
    let file = std::fs::File::open(archive)?;
    let mut tarball = Archive::new(GzDecoder::new(file));
    tarball
        .unpack(destination)
        .map_err(|e| CallscoutError::Extraction(e.to_string()))
}
