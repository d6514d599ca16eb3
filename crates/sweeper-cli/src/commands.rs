use clap::{Args, Parser, Subcommand, ValueEnum};
use std::path::PathBuf;
use sweeper_core::config::Policy;

#[derive(Debug, Parser)]
#[command(name = "sweeper")]
#[command(about = "Repository file lifecycle classifier", long_about = None)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Option<Commands>,
}

#[derive(Debug, Subcommand)]
pub enum Commands {
    /// Scan the configured paths and write the repository index
    Scan {
        /// Scan and print a summary without writing the index
        #[arg(long)]
        check: bool,
    },
    /// Classify every indexed file as keep, archive, delete or review
    Classify(ClassifyArgs),
    /// Print metrics and files needing attention from a recommendations file
    Inspect {
        /// Also list files marked for archive or delete
        #[arg(long, short)]
        verbose: bool,

        /// Recommendations file to read
        #[arg(long)]
        input: Option<PathBuf>,
    },
    /// Print configuration values
    PrintConfig,
}

#[derive(Debug, Args)]
pub struct ClassifyArgs {
    /// Print the summary without writing recommendations
    #[arg(long)]
    pub preview: bool,

    /// Consult the local generation provider
    #[arg(long)]
    pub generator: bool,

    #[arg(long, value_enum)]
    pub policy: Option<PolicyArg>,

    /// Maximum generator calls (selective policy)
    #[arg(long)]
    pub limit: Option<usize>,

    #[arg(long)]
    pub deprecation_days: Option<u32>,

    /// Repository index to read
    #[arg(long)]
    pub index: Option<PathBuf>,

    /// Where to write the recommendations
    #[arg(long)]
    pub output: Option<PathBuf>,
}

#[derive(Debug, Clone, Copy, ValueEnum)]
pub enum PolicyArg {
    Exhaustive,
    Selective,
}

impl From<PolicyArg> for Policy {
    fn from(arg: PolicyArg) -> Self {
        match arg {
            PolicyArg::Exhaustive => Policy::Exhaustive,
            PolicyArg::Selective => Policy::Selective,
        }
    }
}
