//! Legacy randomness scanner
//!
//! Walks a source tree and records every line containing one of the
//! disallowed patterns. A hit is legitimate when the line is a comment or
//! mentions a fallback; everything else is a violation.

use std::fs;
use std::path::{Path, PathBuf};
use thiserror::Error;
use tracing::{debug, warn};
use walkdir::{DirEntry, WalkDir};

pub const DEFAULT_EXTENSIONS: [&str; 4] = ["ts", "tsx", "js", "jsx"];
pub const DEFAULT_EXCLUDES: [&str; 5] = ["node_modules", ".next", "dist", "build", ".git"];
pub const DEFAULT_PATTERN: &str = "Math.random()";

#[derive(Debug, Error)]
pub enum ScanError {
    #[error("Path not found: {0}")]
    PathNotFound(PathBuf),

    #[error("Not a directory: {0}")]
    NotADirectory(PathBuf),

    #[error("None of the include directories exist under {0}")]
    NoIncludeDirs(PathBuf),

    #[error("I/O error at {0}: {1}")]
    Io(PathBuf, String),
}

/// One pattern hit
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Usage {
    pub line_number: usize,
    pub content: String,
    pub legitimate: bool,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileFindings {
    /// Relative to the scan root
    pub path: PathBuf,
    pub usages: Vec<Usage>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ScanReport {
    pub files_scanned: usize,
    pub files_clean: usize,
    pub findings: Vec<FileFindings>,
}

impl ScanReport {
    pub fn violations(&self) -> usize {
        self.findings
            .iter()
            .flat_map(|f| &f.usages)
            .filter(|u| !u.legitimate)
            .count()
    }

    pub fn passed(&self) -> bool {
        self.violations() == 0
    }

    /// Plain-text report for stdout
    pub fn render(&self, patterns: &[String]) -> String {
        let mut out = String::new();
        let rule = "=".repeat(72);
        out.push_str(&format!("{}\nLEGACY RANDOMNESS VERIFICATION\n{}\n", rule, rule));
        out.push_str(&format!("Patterns:       {}\n", patterns.join(", ")));
        out.push_str(&format!("Files scanned:  {}\n", self.files_scanned));
        out.push_str(&format!("Files clean:    {}\n", self.files_clean));
        out.push_str(&format!("Files with hits: {}\n", self.findings.len()));
        out.push_str(&format!("Violations:     {}\n", self.violations()));

        for finding in &self.findings {
            out.push_str(&format!("\n{}\n", finding.path.display()));
            for usage in &finding.usages {
                let status = if usage.legitimate { "ok" } else { "VIOLATION" };
                out.push_str(&format!("  {:>5}  [{}]  {}\n", usage.line_number, status, usage.content));
            }
        }

        out.push_str(&format!("\n{}\n", rule));
        out.push_str(if self.passed() { "RESULT: PASS\n" } else { "RESULT: FAIL\n" });
        out
    }
}

pub struct Scanner {
    include_dirs: Vec<PathBuf>,
    excludes: Vec<String>,
    extensions: Vec<String>,
    patterns: Vec<String>,
}

impl Default for Scanner {
    fn default() -> Self {
        Self {
            include_dirs: Vec::new(),
            excludes: DEFAULT_EXCLUDES.iter().map(|s| s.to_string()).collect(),
            extensions: DEFAULT_EXTENSIONS.iter().map(|s| s.to_string()).collect(),
            patterns: vec![DEFAULT_PATTERN.to_string()],
        }
    }
}

impl Scanner {
    pub fn new() -> Self {
        Self::default()
    }

    /// Restrict the scan to these directories under the root
    ///
    /// Missing ones are skipped; the scan fails if none exist.
    pub fn with_include_dirs(mut self, dirs: Vec<PathBuf>) -> Self {
        self.include_dirs = dirs;
        self
    }

    /// Extra entry names to skip, on top of the defaults
    pub fn with_excludes(mut self, names: Vec<String>) -> Self {
        self.excludes.extend(names);
        self
    }

    /// Replace the extension list; empty keeps the defaults
    pub fn with_extensions(mut self, extensions: Vec<String>) -> Self {
        if !extensions.is_empty() {
            self.extensions = extensions
                .into_iter()
                .map(|e| e.trim_start_matches('.').to_ascii_lowercase())
                .collect();
        }
        self
    }

    /// Replace the pattern list; empty keeps the default
    pub fn with_patterns(mut self, patterns: Vec<String>) -> Self {
        if !patterns.is_empty() {
            self.patterns = patterns;
        }
        self
    }

    pub fn patterns(&self) -> &[String] {
        &self.patterns
    }

    pub fn scan(&self, root: &Path) -> Result<ScanReport, ScanError> {
        if !root.exists() {
            return Err(ScanError::PathNotFound(root.to_path_buf()));
        }
        if !root.is_dir() {
            return Err(ScanError::NotADirectory(root.to_path_buf()));
        }

        let starts: Vec<PathBuf> = if self.include_dirs.is_empty() {
            vec![root.to_path_buf()]
        } else {
            self.include_dirs
                .iter()
                .map(|d| root.join(d))
                .filter(|d| {
                    let present = d.is_dir();
                    if !present {
                        debug!(dir = %d.display(), "Include directory absent, skipping");
                    }
                    present
                })
                .collect()
        };
        if starts.is_empty() {
            return Err(ScanError::NoIncludeDirs(root.to_path_buf()));
        }

        let mut report = ScanReport::default();
        for start in starts {
            let walker = WalkDir::new(&start)
                .follow_links(false)
                .sort_by_file_name()
                .into_iter()
                .filter_entry(|e| !self.is_excluded(e));

            for entry in walker {
                let entry = entry.map_err(|e| {
                    let path = e.path().map(Path::to_path_buf).unwrap_or_else(|| start.clone());
                    ScanError::Io(path, e.to_string())
                })?;
                if !entry.file_type().is_file() || !self.has_source_extension(entry.path()) {
                    continue;
                }

                let usages = self.scan_file(entry.path())?;
                report.files_scanned += 1;
                if usages.is_empty() {
                    report.files_clean += 1;
                } else {
                    let path = entry.path().strip_prefix(root).unwrap_or(entry.path()).to_path_buf();
                    if usages.iter().any(|u| !u.legitimate) {
                        warn!(file = %path.display(), "Disallowed randomness usage");
                    }
                    report.findings.push(FileFindings { path, usages });
                }
            }
        }

        if report.files_scanned == 0 {
            warn!(root = %root.display(), "No source files matched the scan");
        }
        debug!(
            files_scanned = report.files_scanned,
            violations = report.violations(),
            "Scan complete"
        );
        Ok(report)
    }

    fn scan_file(&self, path: &Path) -> Result<Vec<Usage>, ScanError> {
        let bytes = fs::read(path).map_err(|e| ScanError::Io(path.to_path_buf(), e.to_string()))?;
        Ok(self.scan_text(&String::from_utf8_lossy(&bytes)))
    }

    pub fn scan_text(&self, text: &str) -> Vec<Usage> {
        text.lines()
            .enumerate()
            .filter(|(_, line)| self.patterns.iter().any(|p| line.contains(p.as_str())))
            .map(|(index, line)| Usage {
                line_number: index + 1,
                content: line.trim().to_string(),
                legitimate: is_legitimate(line),
            })
            .collect()
    }

    fn is_excluded(&self, entry: &DirEntry) -> bool {
        // depth 0 is the walk start and is never filtered
        entry.depth() > 0 && {
            let name = entry.file_name().to_string_lossy();
            self.excludes.iter().any(|ex| name == ex.as_str())
        }
    }

    fn has_source_extension(&self, path: &Path) -> bool {
        path.extension()
            .map(|ext| ext.to_string_lossy().to_ascii_lowercase())
            .is_some_and(|ext| self.extensions.iter().any(|e| *e == ext))
    }
}

/// Comment lines and lines mentioning a fallback are allowed
pub fn is_legitimate(line: &str) -> bool {
    let trimmed = line.trim_start();
    trimmed.starts_with("//") || trimmed.starts_with('*') || line.to_lowercase().contains("fallback")
}
