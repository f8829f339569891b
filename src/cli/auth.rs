use crate::config::Config;
use crate::error::Result;
use crate::secrets::{API_KEY, FileSecretStore, SecretStore, resolve_credential};
use crate::sheets::{SheetsClient, clear_sheets_tokens};
use clap::Subcommand;
use tracing::{info, warn};

#[derive(Subcommand, Debug)]
pub enum AuthProvider {
    /// Authenticate with Google Sheets
    Google,
    /// Check or remove the stored affiliate API key
    ApiKey,
}

impl AuthProvider {
    pub async fn execute(&self, reset: bool) -> Result<()> {
        match self {
            AuthProvider::Google => authenticate_google(reset).await,
            AuthProvider::ApiKey => check_api_key(reset),
        }
    }
}

async fn authenticate_google(reset: bool) -> Result<()> {
    if reset {
        clear_sheets_tokens()?;
    }

    let config = Config::load()?;
    let client = SheetsClient::new(&config.google, &config.sync.spreadsheet_name).await?;

    info!(url = client.spreadsheet_url(), "Google Sheets authentication verified");

    Ok(())
}

fn check_api_key(reset: bool) -> Result<()> {
    let secrets = FileSecretStore::open()?;

    if reset {
        secrets.delete(API_KEY)?;
        info!("Stored API key removed, run `affiliate-sync setup` to add a new one");
        return Ok(());
    }

    match resolve_credential(&secrets)? {
        Some(_) => info!("API key is configured"),
        None => warn!("No API key configured, run `affiliate-sync setup`"),
    }

    Ok(())
}
