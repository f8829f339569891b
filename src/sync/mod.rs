mod engine;

pub use engine::SyncEngine;

use crate::api::{ApiClient, ApiOperations};
use crate::config::{ApiConfig, Config};
use crate::error::{AppError, Result};
use crate::models::{ResourceDescriptor, RunReport};
use crate::report::log_error;
use crate::secrets::{SecretStore, resolve_credential};
use crate::sheets::SheetsClient;
use crate::validation::validate;
use serde_json::json;
use tracing::{info, instrument};

/// Configured resources in sync order.
pub fn resources(config: &ApiConfig) -> Vec<ResourceDescriptor> {
    config
        .endpoints
        .configured()
        .into_iter()
        .map(|(kind, path)| ResourceDescriptor::new(kind, path))
        .collect()
}

/// Full pull of every configured resource into the spreadsheet.
///
/// Configuration and credential problems fail before any request is made.
#[instrument(name = "Running sync", skip_all)]
pub async fn run_sync(config: &Config, secrets: &dyn SecretStore) -> Result<RunReport> {
    let credential = resolve_credential(secrets)?;
    validate(config, credential.as_ref())?;

    let api_client = ApiClient::new(&config.api, credential)?;
    let sheets_client = SheetsClient::new(&config.google, &config.sync.spreadsheet_name).await?;
    let url = sheets_client.spreadsheet_url();

    let engine = SyncEngine::new(resources(&config.api), api_client, sheets_client);
    let report = engine.run().await?;

    info!(url = url, "Sync completed");

    Ok(report)
}

/// Probe the first configured resource with the stored credential.
pub async fn test_connection(config: &Config, secrets: &dyn SecretStore) -> Result<bool> {
    let credential = resolve_credential(secrets)?;
    validate(config, credential.as_ref())?;

    let api_client = ApiClient::new(&config.api, credential)?;
    check_connection(&api_client, &resources(&config.api)).await
}

async fn check_connection<AC>(api_client: &AC, resources: &[ResourceDescriptor]) -> Result<bool>
where
    AC: ApiOperations + Sync,
{
    let Some(resource) = resources.first() else {
        return Err(AppError::MissingConfig {
            fields: vec!["api.endpoints".to_string()],
        });
    };

    match api_client.probe(&resource.path).await {
        Ok(records) => {
            info!(resource = resource.name(), records, "Connection OK");
            Ok(true)
        }
        Err(e) => {
            log_error("test connection", &e, json!({ "resource": resource.name() }));
            Ok(false)
        }
    }
}
