//! Critical Agent - LLM-assisted AppSec review for small web projects.
//!
//! Walks a project for PHP, HTML, CSS and JavaScript files, sends each file to
//! a language model with a fixed security-review prompt and collects the
//! answers into a Markdown (or HTML/JSON) report.
//!
//! # Architecture
//!
//! - `resolve`: project identifier to an existing path
//! - `scan`: recursive, extension-filtered file enumeration
//! - `analyzer`: review prompt and the `TextGenerator` capability (Groq backend)
//! - `runner`: the sequential resolve/enumerate/analyze pipeline
//! - `report`: Markdown assembly, HTML/JSON rendering, terminal summary
//! - `config`: settings file plus environment, loaded once at startup
//! - `cli`, `web`: front ends

pub mod analyzer;
pub mod cli;
pub mod config;
pub mod report;
pub mod resolve;
pub mod runner;
pub mod scan;
pub mod web;

pub use analyzer::{Analyzer, GroqClient, ServiceError, TextGenerator};
pub use config::{Config, ConfigError, Settings};
pub use resolve::{resolve, ResolveError, ResolvedPath};
pub use runner::{FileVerdict, RunError, Runner, ScanPlan, ScanResults, VerdictStatus};
pub use scan::{enumerate, DEFAULT_EXTENSIONS};

use tracing_subscriber::EnvFilter;

/// Initialize logging to stderr.
///
/// `RUST_LOG` takes precedence over `default_filter`. Call this once at startup.
pub fn init_tracing(default_filter: &str) {
    let filter =
        EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(default_filter));

    // A subscriber may already be installed (tests); keep the existing one.
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .try_init();
}
