//! The scan pipeline shared by the CLI and the web front end.
//!
//! resolve -> enumerate -> analyze each file in order. Files are analyzed one
//! at a time; each request completes before the next one starts.

use serde::Serialize;
use std::path::{Path, PathBuf};
use thiserror::Error;

use crate::analyzer::{failure_text, Analyzer};
use crate::config::Config;
use crate::resolve::{resolve, ResolveError, ResolvedPath};
use crate::scan::{enumerate, ScanError, DEFAULT_EXTENSIONS};

/// Reasons a scan stops before any file is analyzed.
#[derive(Error, Debug)]
pub enum RunError {
    #[error(transparent)]
    Resolve(#[from] ResolveError),
    #[error(transparent)]
    Scan(#[from] ScanError),
    #[error("No matching files found in: {}", path.display())]
    NoFiles { path: PathBuf },
}

/// How a verdict was produced.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum VerdictStatus {
    Analyzed,
    ReadFailed,
    AnalysisFailed,
}

impl VerdictStatus {
    pub fn is_failure(self) -> bool {
        !matches!(self, VerdictStatus::Analyzed)
    }
}

/// The analysis text recorded for one file.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct FileVerdict {
    pub path: PathBuf,
    pub text: String,
    pub status: VerdictStatus,
}

/// Results of a scan, one verdict per enumerated file, in enumeration order.
#[derive(Debug, Clone, Default)]
pub struct ScanResults {
    pub entries: Vec<FileVerdict>,
}

impl ScanResults {
    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    pub fn failures(&self) -> usize {
        self.entries.iter().filter(|e| e.status.is_failure()).count()
    }

    pub fn iter(&self) -> impl Iterator<Item = &FileVerdict> {
        self.entries.iter()
    }
}

/// A resolved project and the files selected for analysis.
#[derive(Debug, Clone)]
pub struct ScanPlan {
    pub root: ResolvedPath,
    pub files: Vec<PathBuf>,
}

/// Runs the scan pipeline.
#[derive(Clone)]
pub struct Runner {
    analyzer: Analyzer,
    extensions: Vec<String>,
    projects_root: Option<PathBuf>,
}

impl Runner {
    /// Create a runner with the default extensions and no projects root.
    pub fn new(analyzer: Analyzer) -> Self {
        Self {
            analyzer,
            extensions: DEFAULT_EXTENSIONS.iter().map(|e| e.to_string()).collect(),
            projects_root: None,
        }
    }

    /// Create a runner using the extensions and projects root from `config`.
    pub fn from_config(analyzer: Analyzer, config: &Config) -> Self {
        Self::new(analyzer)
            .extensions(config.extensions.clone())
            .projects_root(config.projects_root.clone())
    }

    pub fn extensions(mut self, extensions: Vec<String>) -> Self {
        self.extensions = extensions;
        self
    }

    pub fn projects_root(mut self, root: Option<PathBuf>) -> Self {
        self.projects_root = root;
        self
    }

    /// Resolve `input` and enumerate the files to analyze.
    ///
    /// Fails with [`RunError::NoFiles`] when nothing matches, before any
    /// analysis request is made.
    pub fn plan(&self, input: &str) -> Result<ScanPlan, RunError> {
        let root = resolve(input, self.projects_root.as_deref())?;
        tracing::info!(path = %root, "scanning project");

        let files = enumerate(&root, &self.extensions)?;
        if files.is_empty() {
            return Err(RunError::NoFiles {
                path: root.into_path_buf(),
            });
        }
        tracing::info!(count = files.len(), "found files");

        Ok(ScanPlan { root, files })
    }

    /// Analyze `files` in order. `on_file` is called before each file.
    pub async fn analyze_files<F>(&self, files: &[PathBuf], mut on_file: F) -> ScanResults
    where
        F: FnMut(usize, &Path),
    {
        let mut results = ScanResults {
            entries: Vec::with_capacity(files.len()),
        };

        for (index, path) in files.iter().enumerate() {
            on_file(index, path);
            tracing::debug!(path = %path.display(), "analyzing");
            results.entries.push(self.analyze_file(path).await);
        }

        results
    }

    async fn analyze_file(&self, path: &Path) -> FileVerdict {
        let label = path.display().to_string();

        let content = match tokio::fs::read(path).await {
            Ok(bytes) => String::from_utf8_lossy(&bytes).into_owned(),
            Err(e) => {
                tracing::warn!(path = %label, error = %e, "failed to read file");
                return FileVerdict {
                    path: path.to_path_buf(),
                    text: format!("Error reading file: {}", e),
                    status: VerdictStatus::ReadFailed,
                };
            }
        };

        let (text, status) = match self.analyzer.try_analyze(&content, &label).await {
            Ok(reply) => (reply, VerdictStatus::Analyzed),
            Err(e) => {
                tracing::warn!(path = %label, error = %e, "analysis failed");
                (failure_text(&label, &e), VerdictStatus::AnalysisFailed)
            }
        };

        FileVerdict {
            path: path.to_path_buf(),
            text,
            status,
        }
    }

    /// Run the whole pipeline for `input`.
    pub async fn run(&self, input: &str) -> Result<(ScanPlan, ScanResults), RunError> {
        let plan = self.plan(input)?;
        let results = self.analyze_files(&plan.files, |_, _| {}).await;
        Ok((plan, results))
    }
}
