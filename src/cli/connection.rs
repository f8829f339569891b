use crate::config::Config;
use crate::error::{AppError, Result};
use crate::secrets::FileSecretStore;
use crate::sync::test_connection;
use tracing::info;

pub async fn execute() -> Result<()> {
    let config = Config::load()?;
    let secrets = FileSecretStore::open()?;

    if !test_connection(&config, &secrets).await? {
        return Err(AppError::Config(
            "Connection test failed, check the API key and api.base_url".to_string(),
        ));
    }

    info!("Connection test passed");
    Ok(())
}
