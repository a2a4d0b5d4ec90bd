//! Monodoc CLI - documentation builds for monorepos
//!
//! Entry point for the monodoc command-line application.

use clap::Parser;
use std::io::IsTerminal;

use monodoc::cli::output::{display_error, OutputConfig};
use monodoc::cli::{exit_code, Cli};

#[tokio::main]
async fn main() {
    let cli = Cli::parse();

    // Apply output configuration globally
    let output_config = OutputConfig::new(cli.quiet, cli.json, cli.verbose);
    output_config.apply_global();

    // Logs go to stderr so JSON on stdout stays parseable
    let filter = tracing_subscriber::EnvFilter::try_from_default_env().unwrap_or_else(|_| {
        tracing_subscriber::EnvFilter::new(output_config.log_level().to_string())
    });
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_ansi(std::io::stderr().is_terminal())
        .with_target(false)
        .init();

    // Run the command and handle errors
    match cli.run().await {
        Ok(code) => std::process::exit(code),
        Err(e) => {
            display_error(&e);
            std::process::exit(exit_code(&e));
        }
    }
}
