use clap::{Args, Parser, Subcommand};
use std::path::PathBuf;

#[derive(Parser)]
#[command(name = "audiosqueeze")]
#[command(author, version, about = "Convert audio files and shrink them below a size limit")]
pub struct Cli {
    /// Path to config file
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    pub verbose: bool,

    #[command(subcommand)]
    pub command: Commands,
}

/// Overrides for the directory and ceiling from the config file.
#[derive(Args, Debug, Clone, Default)]
pub struct TargetArgs {
    /// Directory containing the audio files
    #[arg(short, long)]
    pub dir: Option<PathBuf>,

    /// Maximum file size in MiB
    #[arg(long)]
    pub ceiling_mib: Option<u64>,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Convert legacy files, then shrink every file above the size limit
    Run {
        #[command(flatten)]
        target: TargetArgs,

        /// Skip the conversion pass
        #[arg(long)]
        skip_convert: bool,

        /// Skip the compaction pass
        #[arg(long)]
        skip_compact: bool,

        /// Show what would be done without encoding anything
        #[arg(long)]
        dry_run: bool,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Convert legacy-format files to the target format
    Convert {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Re-encode files above the size limit
    Compact {
        #[command(flatten)]
        target: TargetArgs,

        /// Print the final report as JSON
        #[arg(long)]
        json: bool,
    },

    /// Check that required external tools are available
    CheckTools,

    /// Validate configuration file
    Validate {
        /// Config file to validate (uses default if not specified)
        config: Option<PathBuf>,
    },

    /// Display version information
    Version,
}
