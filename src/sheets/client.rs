use super::SheetOperations;
use crate::config::GoogleConfig;
use crate::error::{AppError, Result};
use crate::sheets::auth::create_and_verify_authenticator;
use crate::validation::validate_google;
use async_trait::async_trait;
use google_drive3::api::DriveHub;
use google_sheets4::api::{
    AddSheetRequest, BatchUpdateSpreadsheetRequest, ClearValuesRequest, Request, Scope, Sheet,
    SheetProperties, Sheets, Spreadsheet, SpreadsheetProperties, ValueRange,
};
use hyper_rustls::HttpsConnector;
use hyper_util::client::legacy::Client;
use hyper_util::client::legacy::connect::HttpConnector;
use serde_json::Value;
use tracing::{debug, instrument};

// Access to files created or opened by the app
pub(crate) const AUTH_SCOPE: Scope = Scope::DriveFile;

type Connector = HttpsConnector<HttpConnector>;

pub struct SheetsClient {
    hub: Sheets<Connector>,
    spreadsheet_id: String,
    spreadsheet_url: String,
}

impl SheetsClient {
    /// Authenticate and open the named spreadsheet, creating it on first use
    #[instrument(name = "Authenticating to Google Sheets", skip(config))]
    pub async fn new(config: &GoogleConfig, spreadsheet_name: &str) -> Result<Self> {
        validate_google(config)?;
        let auth = create_and_verify_authenticator(config).await?;

        let connector = hyper_rustls::HttpsConnectorBuilder::new()
            .with_native_roots()
            .map_err(|e| AppError::Sheets(format!("Failed to load native TLS roots: {}", e)))?
            .https_or_http()
            .enable_http1()
            .build();

        let client = Client::builder(hyper_util::rt::TokioExecutor::new()).build(connector);

        let sheets_hub = Sheets::new(client.clone(), auth.clone());
        let drive_hub = DriveHub::new(client, auth);

        let (spreadsheet_id, spreadsheet_url) =
            match Self::find_spreadsheet(&drive_hub, spreadsheet_name).await? {
                Some(id) => {
                    let url = format!("https://docs.google.com/spreadsheets/d/{}", id);
                    (id, url)
                }
                None => Self::create_spreadsheet(&sheets_hub, spreadsheet_name).await?,
            };
        debug!(spreadsheet_id, "Using spreadsheet");

        Ok(Self {
            hub: sheets_hub,
            spreadsheet_id,
            spreadsheet_url,
        })
    }

    pub fn spreadsheet_url(&self) -> String {
        self.spreadsheet_url.to_string()
    }

    #[instrument(name = "Finding existing spreadsheet", skip(drive))]
    async fn find_spreadsheet(drive: &DriveHub<Connector>, name: &str) -> Result<Option<String>> {
        let query = format!(
            "name='{}' and mimeType='application/vnd.google-apps.spreadsheet' and trashed=false",
            name.replace('\'', "\\'")
        );

        let (_, file_list) = drive
            .files()
            .list()
            .q(&query)
            .spaces("drive")
            .page_size(1)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to search spreadsheet: {}", e)))?;

        Ok(file_list
            .files
            .and_then(|files| files.into_iter().next())
            .and_then(|file| file.id))
    }

    #[instrument(name = "Creating new spreadsheet", skip(sheets))]
    async fn create_spreadsheet(sheets: &Sheets<Connector>, name: &str) -> Result<(String, String)> {
        let spreadsheet = Spreadsheet {
            properties: Some(SpreadsheetProperties {
                title: Some(name.to_string()),
                time_zone: Some("UTC".to_string()),
                ..Default::default()
            }),
            ..Default::default()
        };

        let (_, created) = sheets
            .spreadsheets()
            .create(spreadsheet)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to create spreadsheet: {}", e)))?;

        let id = created
            .spreadsheet_id
            .ok_or_else(|| AppError::Sheets("Created spreadsheet has empty ID".to_string()))?;
        let url = created
            .spreadsheet_url
            .ok_or_else(|| AppError::Sheets("Created spreadsheet has empty URL".to_string()))?;

        Ok((id, url))
    }

    async fn find_sheet(&self, sheet_name: &str) -> Result<Option<Sheet>> {
        let (_, spreadsheet) = self
            .hub
            .spreadsheets()
            .get(&self.spreadsheet_id)
            .include_grid_data(false)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to get spreadsheet: {}", e)))?;

        Ok(spreadsheet.sheets.unwrap_or_default().into_iter().find(|sheet| {
            sheet
                .properties
                .as_ref()
                .is_some_and(|props| props.title.as_deref() == Some(sheet_name))
        }))
    }

    async fn add_sheet(&self, sheet_name: &str) -> Result<Sheet> {
        let request = Request {
            add_sheet: Some(AddSheetRequest {
                properties: Some(SheetProperties {
                    title: Some(sheet_name.to_string()),
                    sheet_type: Some("GRID".to_string()),
                    ..Default::default()
                }),
            }),
            ..Default::default()
        };

        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(vec![request]),
            include_spreadsheet_in_response: Some(false),
            ..Default::default()
        };

        let (_, response) = self
            .hub
            .spreadsheets()
            .batch_update(batch_update, &self.spreadsheet_id)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to create sheet '{}': {}", sheet_name, e)))?;

        let properties = response
            .replies
            .and_then(|replies| replies.into_iter().next())
            .and_then(|reply| reply.add_sheet)
            .and_then(|add_sheet| add_sheet.properties)
            .ok_or_else(|| {
                AppError::Sheets("Failed to get sheet properties from create response".to_string())
            })?;

        Ok(Sheet {
            properties: Some(properties),
            ..Default::default()
        })
    }
}

/// A1 range covering a whole tab. Titles are quoted so spaces are allowed.
fn tab_range(sheet_name: &str, cells: &str) -> String {
    format!("'{}'!{}", sheet_name.replace('\'', "''"), cells)
}

#[async_trait]
impl SheetOperations for SheetsClient {
    #[instrument(name = "Ensuring sheet exists", skip(self))]
    async fn ensure_sheet(&self, sheet_name: &str) -> Result<Sheet> {
        let (sheet, created) = match self.find_sheet(sheet_name).await? {
            Some(sheet) => (sheet, false),
            None => (self.add_sheet(sheet_name).await?, true),
        };
        let sheet_id = sheet.properties.as_ref().and_then(|p| p.sheet_id);
        match created {
            true => debug!(?sheet_id, "Created sheet"),
            false => debug!(?sheet_id, "Found existing sheet"),
        }

        Ok(sheet)
    }

    async fn clear_values(&self, sheet_name: &str) -> Result<()> {
        let range = tab_range(sheet_name, "A:ZZ");

        self.hub
            .spreadsheets()
            .values_clear(ClearValuesRequest::default(), &self.spreadsheet_id, &range)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to clear sheet '{}': {}", sheet_name, e)))?;

        Ok(())
    }

    async fn update_values(&self, sheet_name: &str, rows: Vec<Vec<Value>>) -> Result<()> {
        let range = tab_range(sheet_name, "A1");
        let value_range = ValueRange {
            major_dimension: Some("ROWS".to_string()),
            range: Some(range.clone()),
            values: Some(rows),
        };

        self.hub
            .spreadsheets()
            .values_update(value_range, &self.spreadsheet_id, &range)
            .value_input_option("RAW")
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to write sheet '{}': {}", sheet_name, e)))?;

        Ok(())
    }

    async fn batch_update(&self, requests: Vec<Request>) -> Result<()> {
        if requests.is_empty() {
            return Ok(());
        }

        let batch_update = BatchUpdateSpreadsheetRequest {
            requests: Some(requests),
            ..Default::default()
        };

        self.hub
            .spreadsheets()
            .batch_update(batch_update, &self.spreadsheet_id)
            .add_scope(AUTH_SCOPE)
            .doit()
            .await
            .map_err(|e| AppError::Sheets(format!("Failed to apply formatting: {}", e)))?;

        Ok(())
    }
}
