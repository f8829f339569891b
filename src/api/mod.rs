mod client;
pub mod retry;
pub mod types;

pub use client::ApiClient;
pub use types::FetchResult;

use crate::error::Result;
use async_trait::async_trait;

#[async_trait]
pub trait ApiOperations {
    /// Fetch every page of a list endpoint.
    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<FetchResult>;

    /// Request a single record to check the credential and connectivity.
    async fn probe(&self, path: &str) -> Result<usize>;
}
