use clap::{Parser, Subcommand};
use std::path::PathBuf;

use signage_server::config::load_config;
use signage_server::purge;
use signage_server::serve::serve;

#[derive(Parser, Debug)]
#[command(
    author,
    version,
    about = "Digital-signage server: media library, active playlist, player presence"
)]
struct Args {
    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Run the signage server
    Serve {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,
    },
    /// Run a single expiry purge pass and exit
    Purge {
        /// Path to config file (TOML format)
        #[arg(short, long)]
        config: PathBuf,
    },
}

fn main() -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
    env_logger::init();

    let args = Args::parse();

    match args.command {
        Command::Serve { config } => {
            let config = load_config(&config)?;
            serve(config)?;
        }
        Command::Purge { config } => {
            let config = load_config(&config)?;
            purge::run_once_blocking(&config)?;
        }
    }

    Ok(())
}
