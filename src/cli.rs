// CLI module for handling command-line interface

use clap::{Parser, Subcommand};

#[derive(Parser)]
#[command(name = "aim")]
#[command(about = "AppImage package manager for Linux")]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Install an app from a GitHub repository (owner/repo[@tag])
    Install {
        spec: String,
        /// Name to install under (defaults to the repository name)
        #[arg(long)]
        name: Option<String>,
    },
    /// Update installed apps to their latest release
    Update {
        /// Apps to update (all installed apps when empty)
        names: Vec<String>,
    },
    /// Remove an installed app
    Remove { name: String },
    /// List installed apps
    List,
    /// Inspect or clean the release cache
    Cache {
        #[command(subcommand)]
        command: CacheCommands,
    },
    /// Check install directory health
    Doctor {
        /// Emit machine-readable JSON
        #[arg(long)]
        json: bool,
    },
}

#[derive(Subcommand)]
pub enum CacheCommands {
    /// Show cache entry counts by freshness
    Stats,
    /// Remove entries older than the given age
    Clean {
        #[arg(long, default_value_t = 7)]
        days: u64,
    },
    /// Delete cache entries for one repository (owner/repo), or all
    Clear { target: Option<String> },
}
