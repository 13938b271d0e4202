//! CLI command definitions and dispatch for the `rpaflow` binary.
//!
//! Uses clap derive macros for argument parsing.

pub mod run;
pub mod validate;

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// Run and serve automation workflows.
#[derive(Parser)]
#[command(name = "rpaflow", version, about, long_about = None)]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output machine-readable JSON instead of styled text.
    #[arg(long, global = true)]
    pub json: bool,

    /// Suppress all output except errors.
    #[arg(long, global = true)]
    pub quiet: bool,

    /// Detailed output (-v for verbose, -vv for debug/trace).
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    pub verbose: u8,

    /// Export tracing spans through OpenTelemetry (stdout exporter).
    #[arg(long, global = true, env = "RPAFLOW_OTEL")]
    pub otel: bool,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Execute a workflow file (JSON or YAML) and stream its progress.
    Run {
        /// Path to the workflow file.
        file: PathBuf,

        /// Override a workflow variable (repeatable). Values parse as JSON,
        /// falling back to a plain string.
        #[arg(long = "var", value_name = "NAME=VALUE")]
        vars: Vec<String>,
    },

    /// Check a workflow file and list its steps without running it.
    Validate {
        /// Path to the workflow file.
        file: PathBuf,
    },

    /// Start the HTTP API and WebSocket event channel.
    Serve {
        /// Port to listen on.
        #[arg(short, long, default_value = "3000")]
        port: u16,

        /// Host to bind to.
        #[arg(long, default_value = "127.0.0.1")]
        host: String,
    },
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn cli_definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn run_collects_repeated_vars() {
        let cli = Cli::parse_from(["rpaflow", "-v", "run", "flow.json", "--var", "n=5", "--var", "name=bob"]);
        assert_eq!(cli.verbose, 1);
        match cli.command {
            Commands::Run { file, vars } => {
                assert_eq!(file, PathBuf::from("flow.json"));
                assert_eq!(vars, vec!["n=5", "name=bob"]);
            }
            _ => panic!("expected run"),
        }
    }

    #[test]
    fn serve_defaults() {
        let cli = Cli::parse_from(["rpaflow", "serve"]);
        assert!(matches!(cli.command, Commands::Serve { port: 3000, ref host } if host == "127.0.0.1"));
    }
}
