//! Critical Agent CLI entry point.

use clap::Parser;
use critical_agent::cli::{self, Cli, EXIT_ERROR};

fn main() {
    let cli = Cli::parse();
    critical_agent::init_tracing(cli::default_log_filter(&cli.mode()));

    let exit_code = match cli::run(&cli) {
        Ok(code) => code,
        Err(e) => {
            eprintln!("Error: {:#}", e);
            EXIT_ERROR
        }
    };

    std::process::exit(exit_code);
}
