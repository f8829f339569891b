use crate::config::Config;
use crate::error::{AppError, Result};
use crate::secrets::{API_KEY, FileSecretStore, SecretStore};
use crate::sync::test_connection;
use dialoguer::Input;
use tracing::info;

/// Interactive one-time setup: capture the API key, then test it.
pub async fn execute() -> Result<()> {
    let config = Config::load()?;
    let secrets = FileSecretStore::open()?;

    let api_key: String = Input::new()
        .with_prompt("Affiliate API key")
        .interact_text()
        .map_err(|e| AppError::Other(e.into()))?;
    let api_key = api_key.trim();
    if api_key.is_empty() {
        return Err(AppError::Config("API key must not be empty".to_string()));
    }

    secrets.set(API_KEY, api_key)?;
    info!(path = ?secrets.path(), "API key stored");

    if !test_connection(&config, &secrets).await? {
        return Err(AppError::Config(
            "API key stored but the connection test failed".to_string(),
        ));
    }

    info!("Setup complete, run `affiliate-sync sync` or `affiliate-sync schedule --hour <H>`");
    Ok(())
}
