//! CLI argument parsing.

use std::path::PathBuf;

use clap::{Parser, Subcommand};

/// director: repository metrics, memoized predictions and workflow scheduling.
#[derive(Parser, Debug)]
#[command(name = "director-server", version, about)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Command>,
}

#[derive(Subcommand, Debug, Clone, PartialEq, Eq)]
pub enum Command {
    /// Compile the workflow schedule and start the HTTP server (default).
    Serve {
        /// Workflow definition file (defaults to DIRECTOR_WORKFLOWS_FILE).
        #[arg(long)]
        workflows: Option<PathBuf>,
    },
    /// Compile the workflow schedule and print it as JSON.
    Schedule {
        #[arg(long)]
        workflows: Option<PathBuf>,
    },
}

impl Cli {
    /// The subcommand to run; `serve` when none was given.
    pub fn command(self) -> Command {
        self.command.unwrap_or(Command::Serve { workflows: None })
    }
}
