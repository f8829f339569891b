use super::SheetOperations;
use super::formatting::{
    auto_resize_rule, banding_rules, bold_row_rule, freeze_header_rule, sheet_id,
};
use crate::error::Result;
use crate::models::{DisplayRow, RunSummary};
use chrono::{DateTime, Utc};
use serde_json::Value;
use std::time::Duration;
use tracing::{debug, instrument};

pub const SUMMARY_SHEET: &str = "Summary";
const SUMMARY_TITLE: &str = "Affiliate Sync Summary";
const SUMMARY_HEADER_ROW: i32 = 3;

/// Writes whole tables. Every write replaces the tab's previous content.
pub struct SheetWriter<S> {
    sheets: S,
}

impl<S> SheetWriter<S>
where
    S: SheetOperations + Sync,
{
    pub fn new(sheets: S) -> Self {
        Self { sheets }
    }

    #[instrument(name = "Writing sheet", skip(self, headers, rows), fields(rows = rows.len()))]
    pub async fn write(&self, sheet_name: &str, headers: &[&str], rows: &[DisplayRow]) -> Result<()> {
        let sheet = self.sheets.ensure_sheet(sheet_name).await?;
        let sheet_id = sheet_id(&sheet)?;

        self.sheets.clear_values(sheet_name).await?;
        self.sheets
            .update_values(sheet_name, table_rows(headers, rows))
            .await?;

        let mut requests = vec![
            bold_row_rule(sheet_id, 0),
            freeze_header_rule(sheet_id),
            auto_resize_rule(sheet_id, headers.len()),
        ];
        requests.extend(banding_rules(sheet_id, &sheet, rows.len() + 1, headers.len()));
        self.sheets.batch_update(requests).await?;

        debug!("Sheet written");
        Ok(())
    }

    #[instrument(name = "Writing summary", skip_all)]
    pub async fn write_summary(&self, summary: &RunSummary, duration: Duration) -> Result<()> {
        let sheet = self.sheets.ensure_sheet(SUMMARY_SHEET).await?;
        let sheet_id = sheet_id(&sheet)?;

        self.sheets.clear_values(SUMMARY_SHEET).await?;
        self.sheets
            .update_values(SUMMARY_SHEET, summary_rows(summary, duration, Utc::now()))
            .await?;

        let requests = vec![
            bold_row_rule(sheet_id, 0),
            bold_row_rule(sheet_id, SUMMARY_HEADER_ROW),
            auto_resize_rule(sheet_id, 2),
        ];
        self.sheets.batch_update(requests).await?;

        Ok(())
    }
}

/// Header row followed by data rows.
fn table_rows(headers: &[&str], rows: &[DisplayRow]) -> Vec<Vec<Value>> {
    let header = headers.iter().map(|h| Value::String(h.to_string())).collect();
    std::iter::once(header)
        .chain(rows.iter().map(|row| row.iter().map(|cell| cell.to_value()).collect()))
        .collect()
}

fn summary_rows(summary: &RunSummary, duration: Duration, updated_at: DateTime<Utc>) -> Vec<Vec<Value>> {
    let mut rows = vec![
        vec![Value::from(SUMMARY_TITLE)],
        vec![
            Value::from("Last Updated"),
            Value::from(updated_at.format("%Y-%m-%d %H:%M:%S UTC").to_string()),
        ],
        Vec::new(),
        vec![Value::from("Resource"), Value::from("Records")],
    ];

    rows.extend(
        summary
            .iter()
            .map(|(name, count)| vec![Value::from(name), Value::from(count)]),
    );

    let seconds = (duration.as_secs_f64() * 10.0).round() / 10.0;
    rows.push(vec![Value::from("Total"), Value::from(summary.total())]);
    rows.push(vec![Value::from("Duration (s)"), Value::from(seconds)]);

    rows
}

#[cfg(test)]
pub(crate) mod mocks {
    use super::*;
    use async_trait::async_trait;
    use google_sheets4::api::{Request, Sheet, SheetProperties};
    use std::collections::BTreeMap;
    use std::sync::{Arc, Mutex};

    #[derive(Debug, Clone, PartialEq)]
    pub(crate) enum Call {
        Ensure(String),
        Clear(String),
        Update(String),
        Batch(usize),
    }

    /// In-memory grid store. Each tab holds the rows last written to it.
    #[derive(Clone, Default)]
    pub(crate) struct MockSheetsClient {
        pub tables: Arc<Mutex<BTreeMap<String, Vec<Vec<Value>>>>>,
        pub calls: Arc<Mutex<Vec<Call>>>,
        pub requests: Arc<Mutex<Vec<Request>>>,
        /// Tabs whose writes fail.
        pub failing: Arc<Mutex<Vec<String>>>,
    }

    impl MockSheetsClient {
        pub(crate) fn table(&self, name: &str) -> Option<Vec<Vec<Value>>> {
            self.tables.lock().unwrap().get(name).cloned()
        }

        pub(crate) fn fail_writes_to(&self, name: &str) {
            self.failing.lock().unwrap().push(name.to_string());
        }
    }

    #[async_trait]
    impl SheetOperations for MockSheetsClient {
        async fn ensure_sheet(&self, sheet_name: &str) -> Result<Sheet> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Ensure(sheet_name.to_string()));
            Ok(Sheet {
                properties: Some(SheetProperties {
                    sheet_id: Some(42),
                    title: Some(sheet_name.to_string()),
                    ..Default::default()
                }),
                ..Default::default()
            })
        }

        async fn clear_values(&self, sheet_name: &str) -> Result<()> {
            self.calls
                .lock()
                .unwrap()
                .push(Call::Clear(sheet_name.to_string()));
            self.tables.lock().unwrap().remove(sheet_name);
            Ok(())
        }

        async fn update_values(&self, sheet_name: &str, rows: Vec<Vec<Value>>) -> Result<()> {
            if self.failing.lock().unwrap().iter().any(|n| n == sheet_name) {
                return Err(crate::error::AppError::Sheets(format!(
                    "Failed to write '{}'",
                    sheet_name
                )));
            }
            self.calls
                .lock()
                .unwrap()
                .push(Call::Update(sheet_name.to_string()));
            self.tables
                .lock()
                .unwrap()
                .insert(sheet_name.to_string(), rows);
            Ok(())
        }

        async fn batch_update(&self, requests: Vec<Request>) -> Result<()> {
            self.calls.lock().unwrap().push(Call::Batch(requests.len()));
            self.requests.lock().unwrap().extend(requests);
            Ok(())
        }
    }
}

#[cfg(test)]
mod tests {
    use super::mocks::{Call, MockSheetsClient};
    use super::*;
    use crate::models::Cell;
    use serde_json::json;

    const HEADERS: &[&str] = &["ID", "Email", "Visitors"];

    #[tokio::test]
    async fn test_write_replaces_table_in_order() {
        let sheets = MockSheetsClient::default();
        let writer = SheetWriter::new(sheets.clone());
        let rows = vec![vec![
            Cell::from("aff_1"),
            Cell::from("jane@example.com"),
            Cell::from(12.0),
        ]];

        writer.write("Affiliates", HEADERS, &rows).await.unwrap();

        assert_eq!(
            sheets.table("Affiliates").unwrap(),
            vec![
                vec![json!("ID"), json!("Email"), json!("Visitors")],
                vec![json!("aff_1"), json!("jane@example.com"), json!(12.0)],
            ]
        );
        assert_eq!(
            *sheets.calls.lock().unwrap(),
            vec![
                Call::Ensure("Affiliates".to_string()),
                Call::Clear("Affiliates".to_string()),
                Call::Update("Affiliates".to_string()),
                Call::Batch(4),
            ]
        );
        let requests = sheets.requests.lock().unwrap();
        assert!(requests[3].add_banding.is_some(), "data rows should be banded");
    }

    #[tokio::test]
    async fn test_write_with_no_rows_keeps_header() {
        let sheets = MockSheetsClient::default();
        let writer = SheetWriter::new(sheets.clone());

        writer.write("Coupons", HEADERS, &[]).await.unwrap();

        assert_eq!(
            sheets.table("Coupons").unwrap(),
            vec![vec![json!("ID"), json!("Email"), json!("Visitors")]]
        );
        let requests = sheets.requests.lock().unwrap();
        assert!(requests.iter().all(|r| r.add_banding.is_none()));
        assert!(requests.iter().any(|r| r.update_sheet_properties.is_some()));
    }

    #[tokio::test]
    async fn test_rewrite_drops_previous_rows() {
        let sheets = MockSheetsClient::default();
        let writer = SheetWriter::new(sheets.clone());
        let rows: Vec<DisplayRow> = (0..3)
            .map(|i| vec![Cell::from(format!("id_{i}")), Cell::from(""), Cell::from(0.0)])
            .collect();

        writer.write("Referrals", HEADERS, &rows).await.unwrap();
        writer.write("Referrals", HEADERS, &rows[..1]).await.unwrap();

        assert_eq!(sheets.table("Referrals").unwrap().len(), 2);
    }

    #[tokio::test]
    async fn test_write_summary_layout() {
        let sheets = MockSheetsClient::default();
        let writer = SheetWriter::new(sheets.clone());
        let mut summary = RunSummary::new();
        summary.record("Affiliates", 12);
        summary.record("Coupons", 0);

        writer
            .write_summary(&summary, Duration::from_millis(2_340))
            .await
            .unwrap();

        let table = sheets.table(SUMMARY_SHEET).unwrap();
        assert_eq!(table[0], vec![json!(SUMMARY_TITLE)]);
        assert_eq!(table[1][0], json!("Last Updated"));
        assert!(table[2].is_empty());
        assert_eq!(table[3], vec![json!("Resource"), json!("Records")]);
        assert_eq!(table[4], vec![json!("Affiliates"), json!(12)]);
        assert_eq!(table[5], vec![json!("Coupons"), json!(0)]);
        assert_eq!(table[6], vec![json!("Total"), json!(12)]);
        assert_eq!(table[7], vec![json!("Duration (s)"), json!(2.3)]);
    }

    #[test]
    fn test_summary_rows_timestamp() {
        let updated_at = DateTime::parse_from_rfc3339("2025-01-01T06:00:00Z")
            .unwrap()
            .with_timezone(&Utc);

        let rows = summary_rows(&RunSummary::new(), Duration::ZERO, updated_at);

        assert_eq!(rows[1][1], json!("2025-01-01 06:00:00 UTC"));
        assert_eq!(rows.len(), 6);
    }
}
