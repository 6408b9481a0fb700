//! kidgate: command-line front end for the kids' learning app.
//!
//! ## Subcommands
//!
//! - `status` / `remaining`: report the session gate
//! - `unlock`: solve the name puzzle, then start a one-hour session
//! - `lock`: end the session now
//! - `watch`: block until the session expires, then lock
//! - `categories` / `cards`: manage the flash-card catalog

mod catalog_cmd;
mod gate_cmd;
mod logging;

use std::path::PathBuf;

use clap::{Parser, Subcommand};
use gate_core::{load_config, StorageConfig};

use catalog_cmd::{CardCommand, CategoryCommand};

#[derive(Parser)]
#[command(name = "kidgate")]
#[command(about = "Session gate and flash-card catalog for the kids' learning app")]
#[command(version)]
struct Cli {
    /// Data directory (default: ~/.kidgate)
    #[arg(long, global = true, value_name = "DIR")]
    root: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Show whether the app is locked
    Status,

    /// Solve the lock puzzle and start a session
    Unlock {
        /// Skip the puzzle (grown-ups only)
        #[arg(long)]
        force: bool,
    },

    /// End the current session
    Lock,

    /// Print the time left in the current session (mm:ss)
    Remaining,

    /// Wait for the current session to expire, then lock
    Watch,

    /// Create the catalog database and seed default categories
    InitDb,

    /// Manage flash-card categories
    Categories {
        #[command(subcommand)]
        command: CategoryCommand,
    },

    /// Manage flash cards
    Cards {
        #[command(subcommand)]
        command: CardCommand,
    },
}

fn main() {
    let cli = Cli::parse();

    let storage = match cli.root {
        Some(root) => StorageConfig::with_root(root),
        None => match StorageConfig::from_home() {
            Ok(storage) => storage,
            Err(err) => {
                eprintln!("kidgate: {err}");
                std::process::exit(1);
            }
        },
    };
    let _logging_guard = logging::init(&storage.logs_dir());

    let result = match cli.command {
        Commands::Status => {
            gate_cmd::status(&storage);
            Ok(())
        }
        Commands::Remaining => {
            gate_cmd::remaining(&storage);
            Ok(())
        }
        Commands::Unlock { force } => load_config(&storage.config_file())
            .and_then(|config| gate_cmd::unlock(&storage, &config, force)),
        Commands::Lock => gate_cmd::lock(&storage),
        Commands::Watch => gate_cmd::watch(&storage),
        Commands::InitDb => catalog_cmd::init_db(&storage),
        Commands::Categories { command } => catalog_cmd::run_category(&storage, command),
        Commands::Cards { command } => catalog_cmd::run_card(&storage, command),
    };

    if let Err(err) = result {
        tracing::error!(error = %err, "kidgate command failed");
        std::process::exit(1);
    }
}
