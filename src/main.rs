use std::path::PathBuf;

use anyhow::Result;
use clap::Parser;
use tracing::error;

use tgetl::cli::{Cli, Commands};
use tgetl::commands;
use tgetl::config::{DEFAULT_LOG_DIR, Settings};
use tgetl::logging;

fn main() {
    let cli = Cli::parse();
    let settings = Settings::load();

    let log_dir = settings
        .as_ref()
        .map(|settings| settings.log_dir.clone())
        .unwrap_or_else(|_| PathBuf::from(DEFAULT_LOG_DIR));
    logging::init_tracing(&log_dir);

    let result = settings
        .map_err(anyhow::Error::from)
        .and_then(|settings| run(cli, &settings));

    if let Err(err) = result {
        error!(error = %err, "command failed");
        for cause in err.chain().skip(1) {
            error!(cause = %cause, "caused by");
        }
        std::process::exit(1);
    }
}

fn run(cli: Cli, settings: &Settings) -> Result<()> {
    match cli.command {
        Commands::Clean(args) => commands::clean::run(args),
        Commands::Load(args) => commands::load::run(args, settings),
        Commands::Pipeline(args) => commands::pipeline::run(args, settings),
        Commands::Detect(args) => commands::detect::run(args, settings),
        Commands::Status(args) => commands::status::run(args, settings),
    }
}
