// SPDX-FileCopyrightText: 2025 Caspar Water Company
//
// SPDX-License-Identifier: Apache-2.0

use std::path::PathBuf;

use anyhow::Result;
use blobstage::{ReadMode, StagedReader};
use clap::{Parser, Subcommand};
use cmd::commands::{DEFAULT_STATUSES, ItemsArgs, items_command, schema_command};
use cmd::config::{ConfigOverrides, load_config_or_default, validate_config};
use diagnostics::*;
use tokio_util::sync::CancellationToken;

#[derive(Parser)]
#[command(author, version, about, long_about = None)]
#[command(name = "blobstage")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Configuration file (defaults to ./blobstage.yaml when present)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Object store URL (file:///dir, s3://, az://) or Azure connection string
    #[arg(long, global = true)]
    connection: Option<String>,

    /// Container or bucket name
    #[arg(long, global = true)]
    container: Option<String>,

    /// Object path inside the container
    #[arg(long, global = true)]
    path: Option<String>,

    /// Objects larger than this many MiB are staged in a temp file
    #[arg(long = "threshold-mb", global = true)]
    threshold_mb: Option<u64>,

    /// Print progress messages to stderr
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// List items filtered by status
    Items {
        /// Status to keep (repeatable or comma separated; default 1,2,3)
        #[arg(long = "status", value_delimiter = ',')]
        statuses: Vec<i32>,

        /// Read mode: partitioned (one row group at a time) or all
        #[arg(long, default_value = "partitioned")]
        mode: ReadMode,

        /// Print one JSON object per line
        #[arg(long)]
        json: bool,
    },
    /// Show the physical columns, row groups and row count
    Schema,
}

#[allow(clippy::print_stdout)]
fn print_line(line: &str) {
    println!("{line}");
}

#[allow(clippy::print_stderr)]
fn progress_to_stderr(message: &str) {
    eprintln!("{message}");
}

#[tokio::main]
async fn main() -> Result<()> {
    diagnostics::init_diagnostics();

    let cli = Cli::parse();

    let mut config = load_config_or_default(cli.config.as_deref())?;
    config.apply_env(|key| std::env::var(key).ok());
    config.apply_overrides(ConfigOverrides {
        connection: cli.connection,
        container: cli.container,
        path: cli.path,
        threshold_megabytes: cli.threshold_mb,
    });
    validate_config(&config)?;

    let mut options = config.reader_options();
    if cli.verbose {
        options = options.with_progress(progress_to_stderr);
    }

    let mut reader = StagedReader::connect(
        &config.connection,
        &config.container,
        &config.path,
        &config.options,
        options,
    )?;

    let cancel = CancellationToken::new();
    let interrupt = cancel.clone();
    let _signal = tokio::spawn(async move {
        if tokio::signal::ctrl_c().await.is_ok() {
            warn!("Interrupted, cancelling");
            interrupt.cancel();
        }
    });

    match cli.command {
        Commands::Items {
            statuses,
            mode,
            json,
        } => {
            let args = ItemsArgs {
                statuses: if statuses.is_empty() {
                    DEFAULT_STATUSES.to_vec()
                } else {
                    statuses
                },
                mode,
                json,
            };
            let count = items_command(&mut reader, &args, &cancel, print_line).await?;
            info!("Listed {count} items", count);
        }
        Commands::Schema => schema_command(&mut reader, &cancel, print_line).await?,
    }

    Ok(())
}
