use clap::{Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser, Debug)]
#[command(name = "diaglog")]
#[command(about = "diaglog CLI", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Feed stdin lines through the pipeline into a file-backed host
    Pipe(PipeArgs),
}

#[derive(clap::Args, Debug)]
pub struct PipeArgs {
    /// Configuration file (overrides DIAGLOG_CONFIG)
    #[arg(long)]
    pub config: Option<PathBuf>,

    /// Log directory (overrides host.log_dir)
    #[arg(long)]
    pub dir: Option<PathBuf>,

    /// Component name attached to every line
    #[arg(long, default_value = "stdin")]
    pub component: String,

    /// Write a transcript export before exiting
    #[arg(long)]
    pub export: bool,
}
