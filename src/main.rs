mod cache;
mod cli;
mod commands;
mod config;
mod constants;
mod github;
mod http;
mod release;
mod state;
mod ui;
mod verify;

use clap::Parser;
use cli::{CacheCommands, Cli, Commands};

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    env_logger::init();
    let cli = Cli::parse();

    let exit_code = match cli.command {
        Commands::Install { spec, name } => {
            commands::install::install(spec, name).await?;
            0
        }
        Commands::Update { names } => {
            commands::update::update(names).await?;
            0
        }
        Commands::Remove { name } => {
            commands::remove::remove(name)?;
            0
        }
        Commands::List => {
            commands::list::list()?;
            0
        }
        Commands::Cache { command } => {
            match command {
                CacheCommands::Stats => commands::cache::stats().await?,
                CacheCommands::Clean { days } => commands::cache::clean(days).await?,
                CacheCommands::Clear { target } => commands::cache::clear(target).await?,
            }
            0
        }
        Commands::Doctor { json } => commands::doctor::doctor(json).await?,
    };

    if exit_code != 0 {
        std::process::exit(exit_code);
    }
    Ok(())
}
