//! Repository discovery via the GitHub search index

use serde::Deserialize;

use crate::{CallscoutError, Result};

const SEARCH_URL: &str = "https://api.github.com/search/repositories";
const HOST_URL: &str = "https://github.com";
const USER_AGENT: &str = concat!("callscout/", env!("CARGO_PKG_VERSION"));

/// One candidate repository returned by discovery
#[derive(Debug, Clone)]
pub struct RepositoryRef {
    /// Repository identifier in `owner/name` form
    pub full_name: String,
    /// Popularity metadata reported by the search index
    pub stars: u64,
}

impl RepositoryRef {
    /// Source archive URL by the fixed naming convention.
    ///
    /// The tarball form of the archive endpoint is used so extraction can
    /// stream through a gzip decoder.
    pub fn archive_url(&self) -> String {
        format!("{HOST_URL}/{}/archive/master.tar.gz", self.full_name)
    }
}

#[derive(Debug, Deserialize)]
struct SearchResponse {
    items: Vec<SearchItem>,
}

#[derive(Debug, Deserialize)]
struct SearchItem {
    full_name: String,
    #[serde(default)]
    stargazers_count: u64,
}

/// Client for the repository search index
pub struct GitHubSearch {
    client: reqwest::Client,
}

impl GitHubSearch {
    /// Create a search client
    pub fn new() -> Result<Self> {
        let client = reqwest::Client::builder()
            .user_agent(USER_AGENT)
            .build()?;
        Ok(Self { client })
    }

    /// Discover candidate repositories for the given module name.
    ///
    /// Unreachable index or malformed payloads are fatal to the run; there
    /// is nothing to harvest without candidates.
    pub async fn search(&self, module: &str) -> Result<Vec<RepositoryRef>> {
        let response = self
            .client
            .get(SEARCH_URL)
            .query(&[("q", module)])
            .send()
            .await?;

        if !response.status().is_success() {
            return Err(CallscoutError::Discovery(format!(
                "search index returned HTTP {}",
                response.status()
            )));
        }

        let payload: SearchResponse = response
            .json()
            .await
            .map_err(|e| CallscoutError::Discovery(format!("malformed search payload: {e}")))?;

        let repos: Vec<RepositoryRef> = payload
            .items
            .into_iter()
            .map(|item| RepositoryRef {
                full_name: item.full_name,
                stars: item.stargazers_count,
            })
            .collect();

        tracing::info!(module, candidates = repos.len(), "Discovery completed");
        Ok(repos)
    }
}
