use super::ApiOperations;
use super::retry::{Delay, RetryPolicy, TokioDelay};
use super::types::{FetchResult, PageResponse};
use crate::config::ApiConfig;
use crate::error::{AppError, Result};
use crate::secrets::Credential;
use async_trait::async_trait;
use reqwest::header::ACCEPT;
use reqwest::{Client, StatusCode};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::time::Duration;
use tracing::{debug, info, instrument, warn};
use url::Url;

/// Records requested per page.
pub const PAGE_SIZE: usize = 100;

/// Maximum length of response body to log
const MAX_LOG_BODY_LENGTH: usize = 200;

/// Outcome of a single HTTP attempt that may be retried.
enum Attempt {
    Page(PageResponse),
    RateLimited,
    TimedOut,
}

/// Client for the affiliate API. Built once per run.
pub struct ApiClient<D = TokioDelay> {
    client: Client,
    base_url: String,
    credential: Credential,
    policy: RetryPolicy,
    delay: D,
    requests: AtomicUsize,
}

impl ApiClient<TokioDelay> {
    pub fn new(config: &ApiConfig, credential: Option<Credential>) -> Result<Self> {
        let credential = credential.ok_or_else(|| AppError::MissingConfig {
            fields: vec!["api_key".to_string()],
        })?;

        Self::build(
            &config.base_url,
            credential,
            config.timeout(),
            RetryPolicy::with_max_retries(config.max_retries),
        )
    }

    fn build(
        base_url: &str,
        credential: Credential,
        timeout: Duration,
        policy: RetryPolicy,
    ) -> Result<Self> {
        let client = Client::builder()
            .user_agent(concat!("affiliate-sync/", env!("CARGO_PKG_VERSION")))
            .timeout(timeout)
            .build()?;

        Ok(Self {
            client,
            base_url: base_url.trim().trim_end_matches('/').to_string(),
            credential,
            policy,
            delay: TokioDelay,
            requests: AtomicUsize::new(0),
        })
    }
}

impl<D: Delay> ApiClient<D> {
    pub fn with_delay<T: Delay>(self, delay: T) -> ApiClient<T> {
        ApiClient {
            client: self.client,
            base_url: self.base_url,
            credential: self.credential,
            policy: self.policy,
            delay,
            requests: self.requests,
        }
    }

    /// HTTP requests issued so far, retries included.
    pub fn request_count(&self) -> usize {
        self.requests.load(Ordering::Relaxed)
    }

    fn resource_url(&self, path: &str) -> Result<Url> {
        let raw = format!("{}/{}", self.base_url, path.trim_start_matches('/'));
        Url::parse(&raw).map_err(|e| AppError::Config(format!("Invalid API URL '{}': {}", raw, e)))
    }

    /// Fetch one page, retrying on 429 and transport timeouts.
    async fn get_page(
        &self,
        url: &Url,
        params: &[(&str, &str)],
        page: u32,
        limit: usize,
    ) -> Result<PageResponse> {
        let query = page_query(params, limit, page);
        let mut rate_limit_retries = 0;
        let mut timeout_retries = 0;

        loop {
            match self.request_page(url, &query).await? {
                Attempt::Page(response) => return Ok(response),
                Attempt::RateLimited => {
                    if rate_limit_retries >= self.policy.max_retries {
                        return Err(AppError::RateLimitExceeded {
                            retries: rate_limit_retries,
                        });
                    }
                    let wait = self.policy.rate_limit_delay(rate_limit_retries);
                    rate_limit_retries += 1;
                    warn!(
                        page,
                        retry = rate_limit_retries,
                        wait_secs = wait.as_secs_f64(),
                        "Rate limited, backing off"
                    );
                    self.delay.sleep(wait).await;
                }
                Attempt::TimedOut => {
                    if timeout_retries >= self.policy.max_retries {
                        return Err(AppError::TimeoutExceeded {
                            retries: timeout_retries,
                        });
                    }
                    timeout_retries += 1;
                    warn!(page, retry = timeout_retries, "Request timed out, retrying");
                    self.delay.sleep(self.policy.timeout_delay).await;
                }
            }
        }
    }

    async fn request_page(&self, url: &Url, query: &[(String, String)]) -> Result<Attempt> {
        self.requests.fetch_add(1, Ordering::Relaxed);

        let sent = self
            .client
            .get(url.clone())
            .query(query)
            .bearer_auth(self.credential.expose())
            .header(ACCEPT, "application/json")
            .send()
            .await;

        let response = match sent {
            Ok(response) => response,
            Err(e) if e.is_timeout() => return Ok(Attempt::TimedOut),
            Err(e) => return Err(e.into()),
        };

        let status = response.status();
        if status == StatusCode::TOO_MANY_REQUESTS {
            return Ok(Attempt::RateLimited);
        }

        let body = match response.text().await {
            Ok(body) => body,
            Err(e) if e.is_timeout() => return Ok(Attempt::TimedOut),
            Err(e) => return Err(e.into()),
        };

        if !status.is_success() {
            warn!(
                status = status.as_u16(),
                body = %truncate_for_log(&body),
                "API request failed"
            );
            return Err(AppError::Api {
                status: status.as_u16(),
                body,
            });
        }

        Ok(Attempt::Page(PageResponse::parse(&body)?))
    }
}

#[async_trait]
impl<D: Delay> ApiOperations for ApiClient<D> {
    #[instrument(name = "Fetching resource", skip(self, params))]
    async fn fetch(&self, path: &str, params: &[(&str, &str)]) -> Result<FetchResult> {
        let url = self.resource_url(path)?;
        let mut records = Vec::new();
        let mut page = 1;

        loop {
            let response = self.get_page(&url, params, page, PAGE_SIZE).await?;
            if response.is_empty() {
                debug!(page, "Empty page, stopping");
                break;
            }

            let has_more = response.has_more(PAGE_SIZE);
            let count = response.len();
            records.extend(response.data.unwrap_or_default());
            debug!(page, count, total = records.len(), has_more, "Fetched page");

            if !has_more {
                break;
            }
            self.delay.sleep(self.policy.page_delay).await;
            page += 1;
        }

        info!(
            records = records.len(),
            pages = page,
            requests = self.request_count(),
            "Fetched resource"
        );

        Ok(FetchResult { data: records })
    }

    #[instrument(name = "Probing resource", skip(self))]
    async fn probe(&self, path: &str) -> Result<usize> {
        let url = self.resource_url(path)?;
        let response = self.get_page(&url, &[], 1, 1).await?;
        Ok(response.len())
    }
}

/// Caller params first, then the pagination params, which always win.
fn page_query(params: &[(&str, &str)], limit: usize, page: u32) -> Vec<(String, String)> {
    params
        .iter()
        .filter(|(key, _)| *key != "limit" && *key != "page")
        .map(|(key, value)| (key.to_string(), value.to_string()))
        .chain([
            ("limit".to_string(), limit.to_string()),
            ("page".to_string(), page.to_string()),
        ])
        .collect()
}

fn truncate_for_log(body: &str) -> String {
    let char_count = body.chars().count();
    if char_count <= MAX_LOG_BODY_LENGTH {
        return body.to_string();
    }
    let truncated: String = body.chars().take(MAX_LOG_BODY_LENGTH).collect();
    format!("{}... [truncated, {} chars total]", truncated, char_count)
}
