use std::path::PathBuf;

use clap::{Args, Parser, Subcommand};

use crate::detection::DEFAULT_CONF_THRESHOLD;

#[derive(Parser, Debug)]
#[command(
    name = "tgetl",
    version,
    about = "Clean scraped Telegram channel exports and load them into SQLite"
)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    Clean(CleanArgs),
    Load(LoadArgs),
    Pipeline(PipelineArgs),
    Detect(DetectArgs),
    Status(StatusArgs),
}

#[derive(Args, Debug, Clone)]
pub struct CleanArgs {
    /// Raw scraper export; repeat to merge several files.
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long)]
    pub output: PathBuf,

    #[arg(long, default_value_t = false)]
    pub strip_message: bool,
}

#[derive(Args, Debug, Clone)]
pub struct LoadArgs {
    /// Cleaned csv with canonical column names.
    #[arg(long)]
    pub input: PathBuf,

    #[arg(long)]
    pub db_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct PipelineArgs {
    #[arg(long = "input", required = true)]
    pub inputs: Vec<PathBuf>,

    #[arg(long)]
    pub output: Option<PathBuf>,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = false)]
    pub strip_message: bool,

    #[arg(long)]
    pub summary_path: Option<PathBuf>,
}

#[derive(Args, Debug, Clone)]
pub struct DetectArgs {
    /// JSON file of model results keyed by image path.
    #[arg(long)]
    pub detections: PathBuf,

    #[arg(long, conflicts_with = "from_messages", required_unless_present = "from_messages")]
    pub media_dir: Option<PathBuf>,

    /// Use the media paths stored with loaded messages.
    #[arg(long, default_value_t = false)]
    pub from_messages: bool,

    #[arg(long)]
    pub db_path: Option<PathBuf>,

    #[arg(long, default_value_t = DEFAULT_CONF_THRESHOLD)]
    pub conf_threshold: f64,
}

#[derive(Args, Debug, Clone)]
pub struct StatusArgs {
    #[arg(long)]
    pub db_path: Option<PathBuf>,
}
