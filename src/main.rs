//! # TaskFlow Board
//!
//! A terminal client for a TaskFlow task service. It keeps an in-memory
//! snapshot of the server's tasks, lets you filter, create, edit, complete and
//! delete them, and reloads the full list after every change.
//!
//! ## Key Features
//!
//! - **Server is the source of truth**: every successful change is followed by a
//!   full reload; nothing is patched locally.
//! - **Responsive UI**: requests run on worker threads while the board keeps drawing.
//! - **Filters**: status and priority, applied both in the list request and on screen.
//! - **Safe deletes**: a confirmation step that always acts on the task it was opened for.
//!
//! ## Quick Start
//!
//! ```bash
//! # Board against a local service on port 8000
//! taskflow
//!
//! # Another service, starting on high priority tasks
//! taskflow --api-url http://tasks.lan:8080 --priority high
//! ```
//!
//! Settings are read from `<config dir>/taskflow/config.toml` (or `--config`),
//! then `TASKFLOW_API_URL`, then the flags above. Logs go to a file because
//! the terminal belongs to the board; set `RUST_LOG` or pass `-v` for more detail.

use std::process::ExitCode;
use std::sync::Arc;

use anyhow::Context;
use clap::Parser;
use tracing::{error, info};

pub mod api;
pub mod cli;
pub mod config;
pub mod dates;
pub mod error;
pub mod fields;
pub mod logging;
pub mod orchestrator;
pub mod render;
pub mod store;
pub mod task;
#[cfg(test)]
mod testing;
pub mod tui {
    pub mod app;
    pub mod colors;
    pub mod enums;
    pub mod input;
    pub mod modal;
    pub mod notify;
    pub mod run;
    pub mod task_form;
    pub mod utils;
}

use api::ApiClient;
use cli::Cli;
use config::{Config, API_URL_ENV};

fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(e) => {
            eprintln!("Error: {e:#}");
            ExitCode::FAILURE
        }
    }
}

/// Errors are logged here, while the log writer's guard is still alive.
fn run(cli: &Cli) -> anyhow::Result<()> {
    let config = Config::load(cli, std::env::var(API_URL_ENV).ok())?;
    let _guard = logging::init_tracing(&config.log_file, cli.verbose)?;
    info!(
        api_url = %config.api_url,
        page_size = config.page_size,
        config = ?config.source,
        "starting taskflow"
    );

    match start_board(cli, &config) {
        Ok(()) => {
            info!("taskflow finished");
            Ok(())
        }
        Err(e) => {
            error!(error = %format!("{e:#}"), "taskflow exited with an error");
            Err(e)
        }
    }
}

fn start_board(cli: &Cli, config: &Config) -> anyhow::Result<()> {
    let client = ApiClient::new(&config.api_url)
        .with_context(|| format!("failed to set up a client for {}", config.api_url))?;

    tui::run::run_board(
        config,
        Arc::new(client),
        cli.status_filter(),
        cli.priority_filter(),
    )
    .context("terminal error")
}
