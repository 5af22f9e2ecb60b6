use std::process::ExitCode;

use anyhow::{Context, Result};
use clap::Parser;
use tracing::{debug, error};

use basekeeper::cli::{handle_backup_command, BackupArgs};

#[derive(Parser)]
#[command(
    name = "basekeeper",
    author = "Kaylee Beyene",
    version,
    about = "Create and maintain PostgreSQL base backups",
    long_about = "basekeeper takes a PostgreSQL base backup with pg_basebackup, keeps \
                  the newest base backups and WAL backup history files, and runs \
                  pg_archivecleanup to drop WAL segments older than the oldest kept \
                  backup. It is meant to be run as root from a timer and switches to \
                  the database service account before touching any backup."
)]
struct Cli {
    #[command(flatten)]
    backup: BackupArgs,

    /// Enable verbose output
    #[arg(short, long)]
    verbose: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();
    basekeeper::logging::init(cli.verbose);

    match run(&cli) {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            error!("Unhandled error occurred ({:#})", err);
            ExitCode::FAILURE
        }
    }
}

fn run(cli: &Cli) -> Result<()> {
    let report = handle_backup_command(&cli.backup).context("backup cycle failed")?;
    debug!(
        "Cycle report: {}",
        serde_json::to_string(&report).context("failed to serialize cycle report")?
    );
    Ok(())
}
