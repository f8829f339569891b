use crate::error::{AppError, Result};
use crate::models::ResourceKind;
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;
use std::time::Duration;

const CONFIG_DIR_PREFIX: &str = "affiliate-sync";

const DEFAULT_TIMEOUT_SECS: u64 = 30;
const DEFAULT_MAX_RETRIES: u32 = 3;
const DEFAULT_SPREADSHEET_NAME: &str = "Affiliate Data (affiliate-sync)";

#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct Config {
    #[serde(default)]
    pub api: ApiConfig,
    #[serde(default)]
    pub google: GoogleConfig,
    #[serde(default)]
    pub sync: SyncConfig,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct ApiConfig {
    #[serde(default)]
    pub base_url: String,
    #[serde(default = "Endpoints::standard")]
    pub endpoints: Endpoints,
    #[serde(default = "default_timeout_secs")]
    pub timeout_secs: u64,
    #[serde(default = "default_max_retries")]
    pub max_retries: u32,
}

fn default_timeout_secs() -> u64 {
    DEFAULT_TIMEOUT_SECS
}

fn default_max_retries() -> u32 {
    DEFAULT_MAX_RETRIES
}

impl Default for ApiConfig {
    fn default() -> Self {
        Self {
            base_url: String::new(),
            endpoints: Endpoints::standard(),
            timeout_secs: DEFAULT_TIMEOUT_SECS,
            max_retries: DEFAULT_MAX_RETRIES,
        }
    }
}

impl ApiConfig {
    pub fn timeout(&self) -> Duration {
        Duration::from_secs(self.timeout_secs)
    }
}

/// URL path per resource. A resource without a path is not synced.
#[derive(Debug, Serialize, Deserialize, Clone, Default, PartialEq)]
pub struct Endpoints {
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub affiliates: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub referrals: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub coupons: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub payments: Option<String>,
}

impl Endpoints {
    /// Used when the config file has no `[api.endpoints]` table.
    pub fn standard() -> Self {
        Self {
            affiliates: Some("/affiliates".to_string()),
            referrals: Some("/referrals".to_string()),
            coupons: Some("/coupons".to_string()),
            payments: None,
        }
    }

    pub fn path(&self, kind: ResourceKind) -> Option<&str> {
        let path = match kind {
            ResourceKind::Affiliates => &self.affiliates,
            ResourceKind::Referrals => &self.referrals,
            ResourceKind::Coupons => &self.coupons,
            ResourceKind::Payments => &self.payments,
        };
        path.as_deref().map(str::trim).filter(|p| !p.is_empty())
    }

    /// Configured resources in sync order.
    pub fn configured(&self) -> Vec<(ResourceKind, &str)> {
        ResourceKind::ALL
            .into_iter()
            .filter_map(|kind| self.path(kind).map(|path| (kind, path)))
            .collect()
    }
}

/// OAuth client for Google Sheets. Only needed by commands that write sheets.
#[derive(Debug, Serialize, Deserialize, Clone, Default)]
pub struct GoogleConfig {
    #[serde(default)]
    pub client_id: String,
    #[serde(default)]
    pub client_secret: String,
}

#[derive(Debug, Serialize, Deserialize, Clone)]
pub struct SyncConfig {
    #[serde(default = "default_spreadsheet_name")]
    pub spreadsheet_name: String,
}

fn default_spreadsheet_name() -> String {
    DEFAULT_SPREADSHEET_NAME.to_string()
}

impl Default for SyncConfig {
    fn default() -> Self {
        Self {
            spreadsheet_name: default_spreadsheet_name(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let config_path = Self::config_file()?;

        if !config_path.exists() {
            return Err(AppError::Config(format!(
                "Config file not found at {:?}. Please create one.",
                config_path
            )));
        }

        let contents = fs::read_to_string(&config_path)?;
        Self::parse(&contents)
    }

    pub fn parse(contents: &str) -> Result<Self> {
        toml::from_str(contents)
            .map_err(|e| AppError::Config(format!("Failed to parse config: {}", e)))
    }

    fn xdg_dirs() -> xdg::BaseDirectories {
        xdg::BaseDirectories::with_prefix(CONFIG_DIR_PREFIX)
    }

    /// Get the config file path
    pub fn config_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("config.toml")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the secrets file path, kept next to the config file
    pub fn secrets_file() -> Result<PathBuf> {
        let xdg_dirs = Self::xdg_dirs();
        xdg_dirs
            .place_config_file("secrets.json")
            .map_err(|e| AppError::Config(format!("Failed to create config directory: {}", e)))
    }

    /// Get the cache directory path
    pub fn cache_dir() -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.get_cache_home()
            .ok_or_else(|| AppError::Config("Failed to determine cache directory".to_string()))
    }

    /// Get a cache file path
    pub fn cache_file(filename: &str) -> Result<PathBuf> {
        let xdg = Self::xdg_dirs();
        xdg.place_cache_file(filename)
            .map_err(|e| AppError::Config(format!("Failed to create cache file path: {}", e)))
    }
}
