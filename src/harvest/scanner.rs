//! Line-oriented call-site scanning over an extracted source tree

use std::path::{Path, PathBuf};

use regex::Regex;
use walkdir::WalkDir;

use super::TargetSymbol;
use crate::{Occurrence, SnippetLine};

/// Marker appended to the matched line when the window is wide enough to
/// need it (half-width > 3)
const MATCH_MARKER: &str = "<----------------";

/// Width of the visual separator between report fragments
const SEPARATOR_WIDTH: usize = 130;

/// Pluggable predicate deciding whether a line contains a call-site.
///
/// The default implementation is [`CallPattern`], a regex over single lines;
/// alternative strategies (e.g. real parsing) can be substituted without
/// touching the orchestrator.
pub trait LineMatcher: Send + Sync {
    /// True iff the line contains a use of the target symbol
    fn matches(&self, line: &str) -> bool;
}

/// Regex-based, syntax-unaware call-site predicate.
///
/// A line matches iff it carries no `#` comment marker and contains the
/// symbol preceded by a space, `(` or `.` boundary: `name(` for functions,
/// `name` followed by `.` or `(` for classes. Identifiers sharing a suffix
/// with the symbol can still over-match; that is an accepted limitation of
/// line-local matching.
pub struct CallPattern {
    pattern: Regex,
}

impl CallPattern {
    /// Build the pattern for the given target symbol
    pub fn new(target: &TargetSymbol) -> Self {
        let pattern = match target {
            TargetSymbol::Function(name) => {
                format!(r"[ (.]{}\(", regex::escape(name))
            }
            TargetSymbol::Class(name) => {
                format!(r"[ (.]{}[.(]", regex::escape(name))
            }
        };
        let pattern =
            Regex::new(&pattern).expect("escaped symbol name always forms a valid pattern");
        Self { pattern }
    }
}

impl LineMatcher for CallPattern {
    fn matches(&self, line: &str) -> bool {
        !line.contains('#') && self.pattern.is_match(line)
    }
}

/// Scans one extracted repository tree for call-sites of a target symbol
/// and renders the matches as an annotated report.
pub struct UsageScanner {
    root: PathBuf,
    repo_full_name: String,
    matcher: Box<dyn LineMatcher>,
    extensions: Vec<String>,
    lines_around: usize,
}

impl UsageScanner {
    /// Create a scanner rooted at the given extraction directory
    pub fn new(
        root: impl Into<PathBuf>,
        repo_full_name: &str,
        matcher: Box<dyn LineMatcher>,
        extensions: Vec<String>,
        lines_around: usize,
    ) -> Self {
        Self {
            root: root.into(),
            repo_full_name: repo_full_name.to_string(),
            matcher,
            extensions,
            lines_around,
        }
    }

    /// True iff the file name ends with one of the configured extensions
    pub fn has_eligible_extension(&self, file_name: &str) -> bool {
        self.extensions.iter().any(|ext| file_name.ends_with(ext))
    }

    /// Find occurrences in a single file, at most `cap` of them.
    ///
    /// Lines are 1-indexed. After a match, the scan position advances past
    /// the lines already shown in its window before resuming. Files that
    /// cannot be decoded as text are skipped silently.
    pub fn scan_file(&self, path: &Path, cap: usize) -> Vec<Occurrence> {
        let Ok(content) = std::fs::read_to_string(path) else {
            tracing::debug!(path = %path.display(), "Skipping undecodable file");
            return Vec::new();
        };

        let lines: Vec<&str> = content.lines().collect();
        let total = lines.len();
        let mut occurrences = Vec::new();
        let mut current = 1usize;

        while current <= total && occurrences.len() < cap {
            if self.matcher.matches(lines[current - 1]) {
                let start = current.saturating_sub(self.lines_around).max(1);
                let end = (current + self.lines_around).min(total);

                let snippet = (start..=end)
                    .map(|number| SnippetLine {
                        number,
                        text: strip_comment_openers(lines[number - 1]),
                    })
                    .collect();

                occurrences.push(Occurrence {
                    file_path: path.to_path_buf(),
                    line_number: current,
                    snippet,
                });

                // Skip the lines already covered by this window
                current += self.lines_around;
            }
            current += 1;
        }

        occurrences
    }

    /// Walk the tree, scan every eligible file, and render the results.
    ///
    /// Traversal is deterministic (entries sorted by name) and short-circuits
    /// as soon as `cap` occurrences have been collected. Returns the number
    /// of occurrences found and the concatenated report text.
    pub fn scan_tree(&self, cap: usize) -> (usize, String) {
        let mut found = 0usize;
        let mut report = String::new();
        if cap == 0 {
            return (found, report);
        }

        for entry in WalkDir::new(&self.root)
            .sort_by_file_name()
            .into_iter()
            .filter_map(|entry| entry.ok())
        {
            if !entry.file_type().is_file() {
                continue;
            }
            if !self.has_eligible_extension(&entry.file_name().to_string_lossy()) {
                continue;
            }

            for occurrence in self.scan_file(entry.path(), cap - found) {
                report.push_str(&self.render(&occurrence));
                found += 1;
            }

            if found >= cap {
                break;
            }
        }

        (found, report)
    }

    /// Render one occurrence as a numbered snippet block with footer
    fn render(&self, occurrence: &Occurrence) -> String {
        let mut fragment = String::from("\n\n");

        for line in &occurrence.snippet {
            let marker = if line.number == occurrence.line_number && self.lines_around > 3 {
                MATCH_MARKER
            } else {
                ""
            };
            fragment.push_str(&format!("{:<4}{}  {}\n", line.number, line.text, marker));
        }

        fragment.push_str(&format!(
            "\nOriginal file: {}\n\n{}",
            self.file_url(&occurrence.file_path),
            "_".repeat(SEPARATOR_WIDTH)
        ));
        fragment
    }

    /// Reconstruct the source URL for a file inside the extracted tree.
    ///
    /// The archive-root wrapper directory (`<repo>-master`) is stripped so
    /// the path maps back onto the repository layout.
    fn file_url(&self, path: &Path) -> String {
        let relative = path.strip_prefix(&self.root).unwrap_or(path);
        let chunks: Vec<String> = relative
            .components()
            .map(|component| component.as_os_str().to_string_lossy().into_owned())
            .filter(|chunk| !chunk.contains("-master"))
            .collect();
        format!(
            "https://github.com/{}/blob/master/{}",
            self.repo_full_name,
            chunks.join("/")
        )
    }
}

/// Strip triple-quote and block-comment-open markers for readability
fn strip_comment_openers(line: &str) -> String {
    line.replace("\"\"\"", "").replace("'''", "").replace("/*", "")
}
