use crate::config::Config;
use crate::error::{AppError, Result};
use std::collections::BTreeMap;
use std::fmt;
use std::fs::{self, OpenOptions};
use std::io::Write;
use std::os::unix::fs::OpenOptionsExt;
use std::path::PathBuf;
use tracing::debug;

/// Secret store key holding the affiliate API key.
pub const API_KEY: &str = "API_KEY";

/// Environment variable that takes precedence over the stored key.
pub const API_KEY_ENV: &str = "AFFILIATE_SYNC_API_KEY";

/// The affiliate API key. Never printed.
#[derive(Clone, PartialEq, Eq)]
pub struct Credential(String);

impl Credential {
    pub fn new(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    pub fn expose(&self) -> &str {
        &self.0
    }
}

impl fmt::Debug for Credential {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("Credential(***)")
    }
}

pub trait SecretStore {
    fn get(&self, key: &str) -> Result<Option<String>>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn delete(&self, key: &str) -> Result<()>;
}

/// Look up the API key, preferring the environment over the store.
pub fn resolve_credential(store: &dyn SecretStore) -> Result<Option<Credential>> {
    let from_env = std::env::var(API_KEY_ENV)
        .ok()
        .filter(|value| !value.trim().is_empty());
    if let Some(value) = from_env {
        debug!(source = API_KEY_ENV, "Using API key from environment");
        return Ok(Some(Credential::new(value.trim())));
    }

    let stored = store
        .get(API_KEY)?
        .map(|value| value.trim().to_string())
        .filter(|value| !value.is_empty())
        .map(Credential::new);
    Ok(stored)
}

/// JSON object on disk, readable only by the owner.
pub struct FileSecretStore {
    path: PathBuf,
}

impl FileSecretStore {
    pub fn open() -> Result<Self> {
        Ok(Self::at(Config::secrets_file()?))
    }

    pub fn at(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &PathBuf {
        &self.path
    }

    fn load(&self) -> Result<BTreeMap<String, String>> {
        if !self.path.exists() {
            return Ok(BTreeMap::new());
        }

        let contents = fs::read_to_string(&self.path)
            .map_err(|e| AppError::Secrets(format!("Failed to read secrets file: {}", e)))?;

        serde_json::from_str(&contents)
            .map_err(|e| AppError::Secrets(format!("Failed to parse secrets file: {}", e)))
    }

    fn save(&self, secrets: &BTreeMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent).map_err(|e| {
                AppError::Secrets(format!("Failed to create secrets directory: {}", e))
            })?;
        }

        let contents = serde_json::to_string_pretty(secrets)
            .map_err(|e| AppError::Secrets(format!("Failed to serialize secrets: {}", e)))?;

        // Create file with owner-only permissions from the start to avoid race condition
        let mut file = OpenOptions::new()
            .create(true)
            .write(true)
            .truncate(true)
            .mode(0o600)
            .open(&self.path)
            .map_err(|e| AppError::Secrets(format!("Failed to create secrets file: {}", e)))?;

        file.write_all(contents.as_bytes())
            .map_err(|e| AppError::Secrets(format!("Failed to write secrets file: {}", e)))?;

        Ok(())
    }
}

impl SecretStore for FileSecretStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.load()?.remove(key))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut secrets = self.load()?;
        secrets.insert(key.to_string(), value.to_string());
        self.save(&secrets)?;
        debug!(key, "Stored secret");
        Ok(())
    }

    fn delete(&self, key: &str) -> Result<()> {
        let mut secrets = self.load()?;
        if secrets.remove(key).is_none() {
            debug!(key, "No secret to delete");
            return Ok(());
        }

        if secrets.is_empty() {
            fs::remove_file(&self.path)
                .map_err(|e| AppError::Secrets(format!("Failed to delete secrets file: {}", e)))?;
        } else {
            self.save(&secrets)?;
        }
        debug!(key, "Deleted secret");
        Ok(())
    }
}

#[cfg(test)]
pub(crate) mod test_helpers {
    use super::*;
    use std::sync::Mutex;

    #[derive(Default)]
    pub(crate) struct MemorySecretStore {
        values: Mutex<BTreeMap<String, String>>,
    }

    impl MemorySecretStore {
        pub(crate) fn with_api_key(value: &str) -> Self {
            let store = Self::default();
            store.set(API_KEY, value).unwrap();
            store
        }
    }

    impl SecretStore for MemorySecretStore {
        fn get(&self, key: &str) -> Result<Option<String>> {
            Ok(self.values.lock().unwrap().get(key).cloned())
        }

        fn set(&self, key: &str, value: &str) -> Result<()> {
            self.values
                .lock()
                .unwrap()
                .insert(key.to_string(), value.to_string());
            Ok(())
        }

        fn delete(&self, key: &str) -> Result<()> {
            self.values.lock().unwrap().remove(key);
            Ok(())
        }
    }
}
