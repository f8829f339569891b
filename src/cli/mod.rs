mod auth;
mod connection;
mod schedule;
mod setup;
mod show;
mod sync;

use crate::error::Result;
use clap::{Parser, Subcommand};

pub use auth::AuthProvider;
pub use show::ShowResource;

#[derive(Parser, Debug)]
#[command(name = "affiliate-sync")]
#[command(about = "Sync affiliate program data to Google Sheets", long_about = None)]
#[command(version)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Commands,
}

impl Cli {
    pub async fn run(&self) -> Result<()> {
        match &self.command {
            Commands::Sync => sync::execute().await,
            Commands::TestConnection => connection::execute().await,
            Commands::Setup => setup::execute().await,
            Commands::Schedule { hour } => schedule::schedule(*hour),
            Commands::Unschedule => schedule::unschedule(),
            Commands::Auth { reset, provider } => provider.execute(*reset).await,
            Commands::Show { resource } => resource.execute().await,
        }
    }
}

#[derive(Subcommand, Debug)]
pub enum Commands {
    /// Pull every configured resource into the spreadsheet
    Sync,
    /// Check the API key against the first configured resource
    TestConnection,
    /// Store the API key and test the connection
    Setup,
    /// Run sync every day at the given hour via crontab
    Schedule {
        /// Hour of day, 0-23
        #[arg(long, value_parser = clap::value_parser!(u8).range(0..=23))]
        hour: u8,
    },
    /// Remove the daily sync from crontab
    Unschedule,
    Auth {
        /// Discard stored credentials first
        #[arg(long, global = true)]
        reset: bool,

        #[command(subcommand)]
        provider: AuthProvider,
    },
    Show {
        #[command(subcommand)]
        resource: ShowResource,
    },
}
