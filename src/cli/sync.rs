use crate::config::Config;
use crate::error::Result;
use crate::secrets::FileSecretStore;
use crate::sync::run_sync;
use tracing::{info, warn};

pub async fn execute() -> Result<()> {
    let config = Config::load()?;
    let secrets = FileSecretStore::open()?;

    let report = run_sync(&config, &secrets).await?;

    for (resource, rows) in report.summary.iter() {
        info!(resource, rows, "Rows written");
    }
    info!(
        total = report.summary.total(),
        secs = report.duration.as_secs_f64(),
        "Run complete"
    );
    if !report.failures.is_empty() {
        warn!(failed = ?report.failures, "Some resources failed, see errors above");
    }

    Ok(())
}
