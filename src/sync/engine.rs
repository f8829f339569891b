use crate::api::ApiOperations;
use crate::error::{AppError, Result};
use crate::models::{DisplayRow, ResourceDescriptor, RunReport, RunSummary};
use crate::report::log_error;
use crate::sheets::{SheetOperations, SheetWriter};
use indicatif::ProgressStyle;
use serde_json::json;
use std::time::Instant;
use tracing::{Span, debug, info, instrument};
use tracing_indicatif::span_ext::IndicatifSpanExt;

pub struct SyncEngine<AC, SC> {
    resources: Vec<ResourceDescriptor>,
    api_client: AC,
    writer: SheetWriter<SC>,
}

impl<AC, SC> SyncEngine<AC, SC>
where
    AC: ApiOperations + Sync,
    SC: SheetOperations + Sync,
{
    pub fn new(resources: Vec<ResourceDescriptor>, api_client: AC, sheets_client: SC) -> Self {
        Self {
            resources,
            api_client,
            writer: SheetWriter::new(sheets_client),
        }
    }

    /// Pull and write every resource, then the summary.
    ///
    /// A resource that fails is logged and counted as zero rows; the remaining
    /// resources are still attempted.
    #[instrument(name = "Sync", skip_all)]
    pub async fn run(&self) -> Result<RunReport> {
        let started = Instant::now();

        let span = Span::current();
        span.pb_set_style(
            &ProgressStyle::with_template(
                "[{elapsed_precise}] {bar:40.cyan/blue} {pos:>7}/{len:7} {msg}",
            )
            .map_err(|e| AppError::Other(e.into()))?,
        );
        span.pb_set_message("Syncing resources");
        span.pb_set_length(self.resources.len() as u64);

        let mut summary = RunSummary::new();
        let mut failures = Vec::new();

        for resource in &self.resources {
            match self.sync_resource(resource).await {
                Ok(rows) => summary.record(resource.sheet_name(), rows),
                Err(e) => {
                    log_error(
                        "sync resource",
                        &e,
                        json!({ "resource": resource.name(), "path": resource.path }),
                    );
                    summary.record(resource.sheet_name(), 0);
                    failures.push(resource.name().to_string());
                }
            }
            span.pb_inc(1);
        }

        if let Err(e) = self.writer.write_summary(&summary, started.elapsed()).await {
            log_error("write summary", &e, json!({ "resources": summary.len() }));
            return Err(e);
        }

        let duration = started.elapsed();
        info!(
            total = summary.total(),
            failed = failures.len(),
            secs = duration.as_secs_f64(),
            "Sync finished"
        );

        Ok(RunReport {
            summary,
            duration,
            failures,
        })
    }

    #[instrument(name = "Syncing resource", skip_all, fields(resource = %resource.name()))]
    async fn sync_resource(&self, resource: &ResourceDescriptor) -> Result<usize> {
        let fetched = self.api_client.fetch(&resource.path, &[]).await?;
        if fetched.is_empty() {
            info!("No records returned");
        } else {
            debug!(records = fetched.len(), "Projecting records");
        }

        let rows: Vec<DisplayRow> = fetched
            .data
            .iter()
            .map(|record| resource.project(record))
            .collect();

        self.writer
            .write(resource.sheet_name(), resource.headers(), &rows)
            .await?;

        info!(rows = rows.len(), "Resource synced");

        Ok(rows.len())
    }
}


#[cfg(test)]
mod tests {
    use super::mocks::MockApiClient;
    use super::*;
    use crate::models::ResourceKind;
    use crate::sheets::SUMMARY_SHEET;
    use crate::sheets::mocks::MockSheetsClient;
    use serde_json::{Value, json};

    fn standard_resources() -> Vec<ResourceDescriptor> {
        vec![
            ResourceDescriptor::new(ResourceKind::Affiliates, "/affiliates"),
            ResourceDescriptor::new(ResourceKind::Referrals, "/referrals"),
            ResourceDescriptor::new(ResourceKind::Coupons, "/coupons"),
        ]
    }

    fn summary_row(sheets: &MockSheetsClient, name: &str) -> Option<Vec<Value>> {
        sheets
            .table(SUMMARY_SHEET)
            .unwrap()
            .into_iter()
            .find(|row| row.first() == Some(&json!(name)))
    }

    #[tokio::test]
    async fn test_failing_resource_does_not_abort_run() {
        let api = MockApiClient::default()
            .respond("/affiliates", vec![json!({"id": 1}), json!({"id": 2})])
            .respond("/referrals", vec![json!({"id": 3})]);
        let sheets = MockSheetsClient::default();

        let engine = SyncEngine::new(standard_resources(), api.clone(), sheets.clone());
        let report = engine.run().await.unwrap();

        assert_eq!(report.summary.get("Affiliates"), Some(2));
        assert_eq!(report.summary.get("Referrals"), Some(1));
        assert_eq!(report.summary.get("Coupons"), Some(0));
        assert_eq!(report.failures, vec!["coupons".to_string()]);

        assert_eq!(
            *api.fetched.lock().unwrap(),
            vec!["/affiliates", "/referrals", "/coupons"],
            "resources should be fetched in order"
        );
        assert_eq!(summary_row(&sheets, "Coupons"), Some(vec![json!("Coupons"), json!(0)]));
        assert_eq!(summary_row(&sheets, "Affiliates"), Some(vec![json!("Affiliates"), json!(2)]));
        assert!(sheets.table("Coupons").is_none(), "failed resource is not written");
    }

    #[tokio::test]
    async fn test_empty_resource_writes_header_only() {
        let api = MockApiClient::default()
            .respond("/affiliates", vec![])
            .respond("/referrals", vec![])
            .respond("/coupons", vec![]);
        let sheets = MockSheetsClient::default();

        let engine = SyncEngine::new(standard_resources(), api, sheets.clone());
        let report = engine.run().await.unwrap();

        assert_eq!(report.summary.total(), 0);
        assert!(report.failures.is_empty());

        let table = sheets.table("Affiliates").unwrap();
        assert_eq!(table.len(), 1);
        assert_eq!(table[0].len(), ResourceKind::Affiliates.headers().len());
    }

    #[tokio::test]
    async fn test_write_failure_is_scoped_to_resource() {
        let api = MockApiClient::default()
            .respond("/affiliates", vec![json!({"id": 1})])
            .respond("/referrals", vec![json!({"id": 2})])
            .respond("/coupons", vec![json!({"id": 3})]);
        let sheets = MockSheetsClient::default();
        sheets.fail_writes_to("Referrals");

        let engine = SyncEngine::new(standard_resources(), api, sheets.clone());
        let report = engine.run().await.unwrap();

        assert_eq!(report.summary.get("Referrals"), Some(0));
        assert_eq!(report.summary.get("Coupons"), Some(1));
        assert_eq!(report.failures, vec!["referrals".to_string()]);
    }

    #[tokio::test]
    async fn test_bad_resource_url_is_scoped_to_resource() {
        let api = MockApiClient::default()
            .respond("/affiliates", vec![json!({"id": 1})])
            .misconfigure("/referrals")
            .respond("/coupons", vec![json!({"id": 2}), json!({"id": 3})]);
        let sheets = MockSheetsClient::default();

        let engine = SyncEngine::new(standard_resources(), api.clone(), sheets.clone());
        let report = engine.run().await.unwrap();

        assert_eq!(
            *api.fetched.lock().unwrap(),
            vec!["/affiliates", "/referrals", "/coupons"]
        );
        assert_eq!(report.failures, vec!["referrals".to_string()]);
        assert_eq!(summary_row(&sheets, "Referrals"), Some(vec![json!("Referrals"), json!(0)]));
        assert_eq!(summary_row(&sheets, "Coupons"), Some(vec![json!("Coupons"), json!(2)]));
    }

    #[tokio::test]
    async fn test_summary_write_failure_is_returned() {
        let api = MockApiClient::default().respond("/affiliates", vec![]);
        let sheets = MockSheetsClient::default();
        sheets.fail_writes_to(SUMMARY_SHEET);

        let engine = SyncEngine::new(
            vec![ResourceDescriptor::new(ResourceKind::Affiliates, "/affiliates")],
            api,
            sheets,
        );

        assert!(matches!(engine.run().await, Err(AppError::Sheets(_))));
    }
}
