//! End-to-end harvest runs over in-memory repository archives

use std::collections::HashMap;
use std::sync::Arc;

use async_trait::async_trait;
use flate2::write::GzEncoder;
use flate2::Compression;
use tempfile::TempDir;

use callscout::harvest::{ArchiveFetcher, Harvester, ReportSink, RepositoryRef, SearchQuery};
use callscout::CallscoutError;

/// Serves prebuilt archive bytes by URL, standing in for the network
struct MapFetcher {
    archives: HashMap<String, Vec<u8>>,
}

#[async_trait]
impl ArchiveFetcher for MapFetcher {
    async fn fetch(&self, url: &str) -> callscout::Result<Vec<u8>> {
        self.archives
            .get(url)
            .cloned()
            .ok_or_else(|| CallscoutError::Other(format!("no archive for {url}")))
    }
}

/// Build a gzipped tarball with the usual `<repo>-master/` wrapper directory
fn tarball(repo_name: &str, files: &[(&str, &str)]) -> Vec<u8> {
    let encoder = GzEncoder::new(Vec::new(), Compression::default());
    let mut builder = tar::Builder::new(encoder);

    for (path, contents) in files {
        let mut header = tar::Header::new_gnu();
        header.set_size(contents.len() as u64);
        header.set_mode(0o644);
        header.set_cksum();
        builder
            .append_data(
                &mut header,
                format!("{repo_name}-master/{path}"),
                contents.as_bytes(),
            )
            .unwrap();
    }

    builder.into_inner().unwrap().finish().unwrap()
}

fn repo(full_name: &str) -> RepositoryRef {
    RepositoryRef {
        full_name: full_name.to_string(),
        stars: 0,
    }
}

fn fetcher_for(archives: Vec<(RepositoryRef, Vec<u8>)>) -> Arc<MapFetcher> {
    Arc::new(MapFetcher {
        archives: archives
            .into_iter()
            .map(|(repo, bytes)| (repo.archive_url(), bytes))
            .collect(),
    })
}

fn function_query(limit: usize) -> SearchQuery {
    SearchQuery::new("python", "requests", None, Some("foo"), 5, limit).unwrap()
}

/// One file with a single call-site spaced inside filler lines
fn single_match_source() -> String {
    let mut source = String::new();
    for n in 1..=20 {
        if n == 10 {
            source.push_str("result = foo(42)\n");
        } else {
            source.push_str(&format!("filler {n}\n"));
        }
    }
    source
}

#[tokio::test]
async fn harvests_examples_end_to_end() {
    let candidate = repo("alice/demo");
    let archive = tarball("demo", &[("src/app.py", &single_match_source())]);
    let fetcher = fetcher_for(vec![(candidate.clone(), archive)]);

    let workspace = TempDir::new().unwrap();
    let root = workspace.path().join("run");
    let harvester = Harvester::new(fetcher).with_workspace_root(&root);

    let outcome = harvester
        .run(&function_query(10), vec![candidate], None)
        .await
        .unwrap();

    assert_eq!(outcome.total_found, 1);
    assert!(outcome.report.contains("result = foo(42)  <----------------"));
    assert!(outcome
        .report
        .contains("Original file: https://github.com/alice/demo/blob/master/src/app.py"));
    assert!(!root.exists(), "workspace root must be removed after the run");
}

#[tokio::test]
async fn corrupt_archive_contributes_nothing_and_run_continues() {
    let bad = repo("bob/broken");
    let good = repo("carol/fine");
    let fetcher = fetcher_for(vec![
        (bad.clone(), b"this is not a tarball at all".to_vec()),
        (
            good.clone(),
            tarball("fine", &[("app.py", &single_match_source())]),
        ),
    ]);

    let harvester = Harvester::new(fetcher);
    let outcome = harvester
        .run(&function_query(10), vec![bad, good], None)
        .await
        .unwrap();

    assert_eq!(outcome.total_found, 1);
    assert!(outcome.report.contains("carol/fine"));
    assert!(!outcome.report.contains("bob/broken"));
}

#[tokio::test]
async fn download_failure_is_a_tolerated_per_task_failure() {
    let missing = repo("dave/gone");
    let good = repo("erin/here");
    // Only the good repository has an archive registered
    let fetcher = fetcher_for(vec![(
        good.clone(),
        tarball("here", &[("app.py", &single_match_source())]),
    )]);

    let harvester = Harvester::new(fetcher);
    let outcome = harvester
        .run(&function_query(10), vec![missing, good], None)
        .await
        .unwrap();

    assert_eq!(outcome.total_found, 1);
}

#[tokio::test]
async fn quota_bounds_the_total_across_repositories() {
    let candidates: Vec<RepositoryRef> = (0..4).map(|n| repo(&format!("org/repo{n}"))).collect();
    let archives = candidates
        .iter()
        .map(|candidate| {
            let name = candidate.full_name.split('/').next_back().unwrap();
            (
                candidate.clone(),
                tarball(name, &[("app.py", &single_match_source())]),
            )
        })
        .collect();

    let harvester = Harvester::new(fetcher_for(archives));
    let outcome = harvester
        .run(&function_query(1), candidates, None)
        .await
        .unwrap();

    // The first folded result fills the quota; later contributions are dropped
    assert_eq!(outcome.total_found, 1);
    assert_eq!(outcome.report.matches("Original file:").count(), 1);
}

#[tokio::test]
async fn single_scan_caps_at_remaining_quota() {
    // Ten call-sites in one repository, spaced outside each other's windows
    let mut source = String::new();
    for block in 0..10 {
        source.push_str(&format!("value = foo({block})\n"));
        for filler in 0..12 {
            source.push_str(&format!("filler {block}_{filler}\n"));
        }
    }

    let candidate = repo("frank/dense");
    let fetcher = fetcher_for(vec![(
        candidate.clone(),
        tarball("dense", &[("app.py", &source)]),
    )]);

    let harvester = Harvester::new(fetcher);
    let outcome = harvester
        .run(&function_query(3), vec![candidate], None)
        .await
        .unwrap();

    assert_eq!(outcome.total_found, 3);
}

#[tokio::test]
async fn report_sink_mirrors_the_outcome() {
    let candidate = repo("grace/app");
    let fetcher = fetcher_for(vec![(
        candidate.clone(),
        tarball("app", &[("app.py", &single_match_source())]),
    )]);

    let dir = TempDir::new().unwrap();
    let report_path = dir.path().join("result.py");

    let harvester = Harvester::new(fetcher);
    let outcome = harvester
        .run(
            &function_query(10),
            vec![candidate],
            Some(ReportSink::new(&report_path)),
        )
        .await
        .unwrap();

    let written = std::fs::read_to_string(&report_path).unwrap();
    assert_eq!(written, outcome.report);
    assert!(outcome.total_found > 0);
}

#[tokio::test]
async fn class_target_matches_instantiation_and_attribute_use() {
    let source = "\
from requests import Session

def main():
    s = Session()
    s.get('https://example.com')
    token = Session.default_token
";
    let candidate = repo("henry/client");
    let fetcher = fetcher_for(vec![(
        candidate.clone(),
        tarball("client", &[("client.py", source)]),
    )]);

    let query = SearchQuery::new("python", "requests", Some("Session"), None, 0, 10).unwrap();
    let harvester = Harvester::new(fetcher);
    let outcome = harvester.run(&query, vec![candidate], None).await.unwrap();

    assert_eq!(outcome.total_found, 2);
}
