mod auth;
mod client;
mod formatting;
mod writer;

pub use client::SheetsClient;
pub use writer::{SUMMARY_SHEET, SheetWriter};

// Re-export clear_tokens for CLI usage
pub use auth::clear_tokens as clear_sheets_tokens;

#[cfg(test)]
pub(crate) use writer::mocks;

use crate::error::Result;
use async_trait::async_trait;
use google_sheets4::api::{Request, Sheet};
use serde_json::Value;

/// Grid storage backing the output tables.
#[async_trait]
pub trait SheetOperations {
    /// Find the tab by title, creating it when missing.
    async fn ensure_sheet(&self, sheet_name: &str) -> Result<Sheet>;

    async fn clear_values(&self, sheet_name: &str) -> Result<()>;

    /// Write rows starting at `A1`.
    async fn update_values(&self, sheet_name: &str, rows: Vec<Vec<Value>>) -> Result<()>;

    async fn batch_update(&self, requests: Vec<Request>) -> Result<()>;
}
