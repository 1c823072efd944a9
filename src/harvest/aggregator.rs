//! Serialized accumulation of per-task results into the run state

use std::path::PathBuf;
use std::sync::Mutex;

/// Process-wide counters shared across concurrently executing tasks
#[derive(Debug, Default)]
struct RunState {
    total_found: usize,
    report: String,
}

/// The single point through which all task results are folded into the run.
///
/// Every update goes through one mutex, keeping `total_found` and the report
/// text consistent under concurrent completions. Once the quota is reached,
/// later contributions are dropped, so the total never exceeds the quota by
/// more than the contribution of the task that pushed it over.
pub struct ResultAggregator {
    quota: usize,
    state: Mutex<RunState>,
    sink: Option<ReportSink>,
}

impl ResultAggregator {
    /// Create an aggregator for a run with the given example quota
    pub fn new(quota: usize) -> Self {
        Self {
            quota,
            state: Mutex::new(RunState::default()),
            sink: None,
        }
    }

    /// Mirror accepted report fragments to a file as they arrive
    pub fn with_sink(mut self, sink: Option<ReportSink>) -> Self {
        self.sink = sink;
        self
    }

    /// Fold one task's result into the run state.
    ///
    /// Returns true once the quota has been reached. Contributions arriving
    /// after that point are not counted.
    pub fn fold(&self, found: usize, fragment: &str) -> bool {
        let mut state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        if state.total_found >= self.quota {
            return true;
        }

        state.total_found += found;
        state.report.push_str(fragment);

        if let Some(sink) = &self.sink {
            if !fragment.is_empty() {
                if let Err(e) = sink.append(fragment) {
                    tracing::warn!(error = %e, "Failed to append report fragment");
                }
            }
        }

        state.total_found >= self.quota
    }

    /// How many examples the run still needs; tasks cap their scans with this
    pub fn remaining(&self) -> usize {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        self.quota.saturating_sub(state.total_found)
    }

    /// True once the quota has been reached
    pub fn quota_reached(&self) -> bool {
        self.remaining() == 0
    }

    /// Current totals: occurrences found and accumulated report text
    pub fn snapshot(&self) -> (usize, String) {
        let state = self.state.lock().unwrap_or_else(|e| e.into_inner());
        (state.total_found, state.report.clone())
    }
}

/// Append-only destination for report text
pub struct ReportSink {
    path: PathBuf,
}

impl ReportSink {
    /// Create a sink writing to the given file
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// Append a report fragment to the destination file
    pub fn append(&self, text: &str) -> std::io::Result<()> {
        use std::io::Write;

        let mut file = std::fs::OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)?;
        file.write_all(text.as_bytes())
    }
}
