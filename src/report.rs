//! Report assembly and output.
//!
//! Supports three output formats:
//! - Markdown: the canonical report, one section per analyzed file
//! - HTML: the Markdown rendered with pulldown-cmark (also used by the web form)
//! - JSON: structured output for programmatic consumption

use colored::*;
use pulldown_cmark::{html, Event, Options, Parser};
use serde::Serialize;
use std::fmt;
use std::path::{Path, PathBuf};
use std::str::FromStr;

use crate::runner::{ScanResults, VerdictStatus};

pub const REPORT_TITLE: &str = "Security Analysis Report";

/// Output format for the scan report.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum Format {
    #[default]
    Markdown,
    Html,
    Json,
}

impl Format {
    pub fn as_str(&self) -> &'static str {
        match self {
            Format::Markdown => "markdown",
            Format::Html => "html",
            Format::Json => "json",
        }
    }

    /// Report file written when no output path is given.
    pub fn default_output(&self) -> PathBuf {
        PathBuf::from(match self {
            Format::Markdown => "security_report.md",
            Format::Html => "security_report.html",
            Format::Json => "security_report.json",
        })
    }
}

impl fmt::Display for Format {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for Format {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "markdown" | "md" => Ok(Format::Markdown),
            "html" => Ok(Format::Html),
            "json" => Ok(Format::Json),
            other => Err(format!(
                "invalid format {:?}, must be 'markdown', 'html', or 'json'",
                other
            )),
        }
    }
}

// =============================================================================
// Markdown / HTML
// =============================================================================

/// Assemble the Markdown report.
pub fn assemble(results: &ScanResults) -> String {
    let mut md = format!("# {}\n\n", REPORT_TITLE);
    for entry in results.iter() {
        md.push_str("## File: `");
        md.push_str(&entry.path.display().to_string());
        md.push_str("`\n\n");
        md.push_str(&entry.text);
        md.push_str("\n\n---\n\n");
    }
    md
}

/// Render Markdown to an HTML fragment.
///
/// Raw HTML in the Markdown is emitted as escaped text: model replies quote
/// payloads such as `<script>` and the fragment is embedded in a live page.
pub fn render_html(markdown: &str) -> String {
    let mut options = Options::empty();
    options.insert(Options::ENABLE_TABLES);
    options.insert(Options::ENABLE_STRIKETHROUGH);

    let parser = Parser::new_ext(markdown, options).map(|event| match event {
        Event::Html(raw) | Event::InlineHtml(raw) => Event::Text(raw),
        other => other,
    });
    let mut out = String::with_capacity(markdown.len() * 3 / 2);
    html::push_html(&mut out, parser);
    out
}

/// Wrap rendered report HTML in a standalone document.
pub fn html_document(body: &str) -> String {
    format!(
        "<!DOCTYPE html>\n<html lang=\"pt-BR\">\n<head>\n<meta charset=\"utf-8\">\n<title>{}</title>\n</head>\n<body>\n{}</body>\n</html>\n",
        REPORT_TITLE, body
    )
}

// =============================================================================
// JSON
// =============================================================================

#[derive(Serialize)]
pub struct JsonReport {
    pub version: String,
    pub project: String,
    pub path: String,
    pub files_scanned: usize,
    pub failures: usize,
    pub entries: Vec<JsonEntry>,
}

#[derive(Serialize)]
pub struct JsonEntry {
    pub file: String,
    pub status: VerdictStatus,
    pub analysis: String,
}

/// Render the results as pretty-printed JSON.
pub fn render_json(project: &str, root: &Path, results: &ScanResults) -> anyhow::Result<String> {
    let report = JsonReport {
        version: env!("CARGO_PKG_VERSION").to_string(),
        project: project.to_string(),
        path: root.display().to_string(),
        files_scanned: results.len(),
        failures: results.failures(),
        entries: results
            .iter()
            .map(|e| JsonEntry {
                file: e.path.display().to_string(),
                status: e.status,
                analysis: e.text.clone(),
            })
            .collect(),
    };
    Ok(serde_json::to_string_pretty(&report)?)
}

/// Render the report in `format`.
pub fn render(
    format: Format,
    project: &str,
    root: &Path,
    results: &ScanResults,
) -> anyhow::Result<String> {
    Ok(match format {
        Format::Markdown => assemble(results),
        Format::Html => html_document(&render_html(&assemble(results))),
        Format::Json => render_json(project, root, results)?,
    })
}

/// Write `contents` to `path`, replacing any previous report.
pub fn write_report(path: &Path, contents: &str) -> anyhow::Result<()> {
    std::fs::write(path, contents)
        .map_err(|e| anyhow::anyhow!("writing report {}: {}", path.display(), e))
}

// =============================================================================
// Terminal summary
// =============================================================================

/// Print a short colored summary after a scan.
pub fn write_summary(results: &ScanResults, output: &Path) {
    let failures = results.failures();
    let analyzed = results.len() - failures;

    println!();
    print!("  {}", "critical-agent".cyan().bold());
    println!(" v{}", env!("CARGO_PKG_VERSION"));
    println!();
    print!("  {}", "Analyzed: ".dimmed());
    println!("{}", analyzed.to_string().green());
    print!("  {}", "Failed:   ".dimmed());
    if failures > 0 {
        println!("{}", failures.to_string().red());
        for entry in results.iter().filter(|e| e.status.is_failure()) {
            let tag = match entry.status {
                VerdictStatus::ReadFailed => "READ ",
                _ => "LLM  ",
            };
            println!("    {} {}", tag.red(), entry.path.display().to_string().blue());
        }
    } else {
        println!("{}", "0".green());
    }
    println!();
    println!("Report generated: {}", output.display());
}
