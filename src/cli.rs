//! Command-line interface for critical-agent.

use clap::Parser;
use colored::*;
use std::io::{self, BufRead, Write};
use std::net::SocketAddr;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use crate::analyzer::{Analyzer, GroqClient, SNIPPET_LABEL};
use crate::config::{Config, ConfigError, Settings, DEFAULT_SETTINGS_NAMES};
use crate::report::{self, Format};
use crate::runner::{RunError, Runner};
use crate::web;

/// Exit codes.
pub const EXIT_SUCCESS: i32 = 0;
pub const EXIT_FAILED: i32 = 1;
pub const EXIT_ERROR: i32 = 2;

/// Input that ends interactive mode.
pub const EXIT_SENTINEL: &str = "x";

/// AppSec scanner for PHP, HTML, CSS and JavaScript projects.
///
/// Every matching file is sent to a language model with a fixed security
/// review prompt and the answers are collected into a Markdown report.
/// Without arguments, starts interactive mode.
#[derive(Parser, Debug)]
#[command(name = "critical-agent")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Path to the project directory to scan (or project name if in PROJECTS_ROOT)
    #[arg(long, value_name = "PATH_OR_NAME", conflicts_with_all = ["interactive", "serve", "init"])]
    pub scan: Option<String>,

    /// Run in interactive mode
    #[arg(long, conflicts_with_all = ["serve", "init"])]
    pub interactive: bool,

    /// Serve the web form (optionally on ADDR, e.g. 0.0.0.0:8080)
    #[arg(long, value_name = "ADDR", num_args = 0..=1, default_missing_value = "", conflicts_with = "init")]
    pub serve: Option<String>,

    /// Write a settings template to critical-agent.yaml (or --config)
    #[arg(long)]
    pub init: bool,

    /// Report format for --scan: markdown, html, or json
    #[arg(short, long, default_value = "markdown")]
    pub format: String,

    /// Report file for --scan (default: security_report.<ext>)
    #[arg(short, long)]
    pub output: Option<PathBuf>,

    /// Path to a settings file (default: auto-discover)
    #[arg(short, long)]
    pub config: Option<PathBuf>,
}

/// What the invocation asks for.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Mode {
    Scan(String),
    Interactive,
    Serve(Option<String>),
    Init,
}

impl Cli {
    pub fn mode(&self) -> Mode {
        if self.init {
            Mode::Init
        } else if let Some(target) = &self.scan {
            Mode::Scan(target.clone())
        } else if let Some(addr) = &self.serve {
            Mode::Serve(Some(addr.clone()).filter(|a| !a.trim().is_empty()))
        } else {
            Mode::Interactive
        }
    }
}

/// Log filter used when RUST_LOG is not set.
pub fn default_log_filter(mode: &Mode) -> &'static str {
    match mode {
        Mode::Serve(_) => "critical_agent=info,tower_http=info",
        _ => "critical_agent=warn",
    }
}

/// Run the command selected by `cli`.
pub fn run(cli: &Cli) -> anyhow::Result<i32> {
    let mode = cli.mode();
    if mode == Mode::Init {
        return run_init(cli.config.as_deref());
    }

    let config = match load_config(cli.config.as_deref()) {
        Ok(c) => c,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };
    tracing::debug!(?config, "configuration loaded");

    match mode {
        Mode::Scan(target) => run_scan(cli, &config, &target),
        Mode::Serve(addr) => run_serve(&config, addr.as_deref()),
        Mode::Interactive | Mode::Init => run_interactive(&config),
    }
}

/// Build the configuration from the settings file (if any) and the environment.
pub fn load_config(settings_path: Option<&Path>) -> Result<Config, ConfigError> {
    let settings = match settings_path {
        Some(p) => Settings::parse_file(p)?,
        None => match Settings::discover() {
            Some(p) => {
                tracing::debug!(path = %p.display(), "using discovered settings file");
                Settings::parse_file(p)?
            }
            None => Settings::default(),
        },
    };
    Config::from_env(settings)
}

fn build_analyzer(config: &Config) -> anyhow::Result<Analyzer> {
    let client = GroqClient::new(config)?;
    tracing::debug!(model = client.model(), "text generation client ready");
    Ok(Analyzer::new(Arc::new(client)))
}

/// Terminal output for a resolved project with no matching files.
fn no_files_message(root: &Path) -> String {
    format!(
        "Scanning project at: {}\nNo matching files found.",
        root.display()
    )
}

/// Run a one-shot scan and write the report.
pub fn run_scan(cli: &Cli, config: &Config, target: &str) -> anyhow::Result<i32> {
    let format: Format = match cli.format.parse() {
        Ok(f) => f,
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_ERROR);
        }
    };

    let runner = Runner::from_config(build_analyzer(config)?, config);

    let plan = match runner.plan(target) {
        Ok(plan) => plan,
        Err(RunError::NoFiles { path }) => {
            tracing::debug!(path = %path.display(), "nothing to scan");
            println!("{}", no_files_message(&path));
            return Ok(EXIT_FAILED);
        }
        Err(e) => {
            eprintln!("Error: {}", e);
            return Ok(EXIT_FAILED);
        }
    };

    println!("Scanning project at: {}", plan.root);
    println!("Found {} files. Starting analysis...", plan.files.len());

    let runtime = tokio::runtime::Runtime::new()?;
    let results = runtime.block_on(runner.analyze_files(&plan.files, |_, path| {
        println!("Analyzing {}...", path.display());
    }));

    let contents = report::render(format, target, plan.root.as_path(), &results)?;
    let output = cli
        .output
        .clone()
        .or_else(|| config.output.clone())
        .unwrap_or_else(|| format.default_output());
    report::write_report(&output, &contents)?;

    report::write_summary(&results, &output);
    Ok(EXIT_SUCCESS)
}

/// Run the interactive question loop on stdin/stdout.
pub fn run_interactive(config: &Config) -> anyhow::Result<i32> {
    let analyzer = build_analyzer(config)?;
    let runtime = tokio::runtime::Runtime::new()?;

    let stdin = io::stdin();
    let stdout = io::stdout();
    run_session(&analyzer, &runtime, stdin.lock(), stdout.lock())?;
    Ok(EXIT_SUCCESS)
}

/// Read lines from `input` and answer each one until the sentinel or EOF.
///
/// Each line is analyzed as a free-form snippet or question. Blank lines are
/// skipped.
pub fn run_session<R: BufRead, W: Write>(
    analyzer: &Analyzer,
    runtime: &tokio::runtime::Runtime,
    mut input: R,
    mut out: W,
) -> io::Result<()> {
    writeln!(
        out,
        "{}",
        "CRITICAL AGENT: Interactive Mode (Type 'x' to exit)".bold()
    )?;

    let mut line = String::new();
    loop {
        write!(out, "You: ")?;
        out.flush()?;

        line.clear();
        if input.read_line(&mut line)? == 0 {
            writeln!(out)?;
            break;
        }

        let query = line.trim();
        if query.eq_ignore_ascii_case(EXIT_SENTINEL) {
            break;
        }
        if query.is_empty() {
            continue;
        }

        let reply = runtime.block_on(analyzer.analyze(query, SNIPPET_LABEL));
        writeln!(out, "Agent:\n{}\n", reply)?;
    }

    Ok(())
}

/// Serve the web form.
pub fn run_serve(config: &Config, addr: Option<&str>) -> anyhow::Result<i32> {
    let addr_str = addr.unwrap_or(&config.listen);
    let addr: SocketAddr = match addr_str.parse() {
        Ok(a) => a,
        Err(e) => {
            eprintln!("Error: invalid listen address {:?}: {}", addr_str, e);
            return Ok(EXIT_ERROR);
        }
    };

    let runner = Runner::from_config(build_analyzer(config)?, config);
    let state = web::AppState::new(runner)?;

    let runtime = tokio::runtime::Runtime::new()?;
    runtime.block_on(web::serve(state, addr))?;
    Ok(EXIT_SUCCESS)
}

/// Write a settings template.
pub fn run_init(path: Option<&Path>) -> anyhow::Result<i32> {
    let output = path
        .map(Path::to_path_buf)
        .unwrap_or_else(|| PathBuf::from(DEFAULT_SETTINGS_NAMES[0]));

    if output.exists() {
        eprintln!("Error: file already exists: {}", output.display());
        eprintln!("Remove it or use --config to specify a different path");
        return Ok(EXIT_ERROR);
    }

    if let Some(parent) = output.parent() {
        if !parent.as_os_str().is_empty() && parent != Path::new(".") {
            if let Err(e) = std::fs::create_dir_all(parent) {
                eprintln!("Error: failed to create directory: {}", e);
                return Ok(EXIT_ERROR);
            }
        }
    }

    if let Err(e) = std::fs::write(&output, SETTINGS_TEMPLATE) {
        eprintln!("Error: failed to write settings: {}", e);
        return Ok(EXIT_ERROR);
    }

    println!("Created {}", output.display());
    println!();
    println!("Next steps:");
    println!("  1. export GROQ_API_KEY=<your key>");
    println!("  2. Run: critical-agent --config {} --scan <project>", output.display());

    Ok(EXIT_SUCCESS)
}

const SETTINGS_TEMPLATE: &str = include_str!("templates/critical-agent.yaml");
