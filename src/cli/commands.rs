//! CLI commands and argument parsing

use clap::{Parser, Subcommand};
use std::path::PathBuf;

/// Zoho CRM tap
#[derive(Parser, Debug)]
#[command(name = "zoho-crm-tap")]
#[command(author, version, about, long_about = None)]
pub struct Cli {
    /// Configuration file (JSON)
    #[arg(short, long, global = true)]
    pub config: Option<PathBuf>,

    /// State file (JSON), rewritten at every checkpoint
    #[arg(short, long, global = true)]
    pub state: Option<PathBuf>,

    /// Inline state JSON, used instead of a state file
    #[arg(long, global = true, conflicts_with = "state")]
    pub state_json: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

/// CLI subcommands
#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Print the catalog of available streams
    Discover,

    /// Replicate the streams selected in a catalog
    Sync {
        /// Catalog file (JSON) with stream and field selections
        #[arg(long)]
        catalog: PathBuf,
    },
}
