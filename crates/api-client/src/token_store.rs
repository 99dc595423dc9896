//! Client-side storage for the bearer token.

use std::collections::HashMap;
use std::fs;
use std::path::{Path, PathBuf};
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use log::{debug, warn};
use storefront_core::constants::AUTH_TOKEN_KEY;

use crate::error::{ApiClientError, Result};

/// Key-value storage for client secrets.
pub trait TokenStore: Send + Sync {
    fn get(&self, key: &str) -> Option<String>;

    fn set(&self, key: &str, value: &str) -> Result<()>;

    fn remove(&self, key: &str) -> Result<()>;

    /// The stored bearer token, ignoring empty values.
    fn auth_token(&self) -> Option<String> {
        self.get(AUTH_TOKEN_KEY).filter(|t| !t.trim().is_empty())
    }
}

fn read_guard<'a>(
    lock: &'a RwLock<HashMap<String, String>>,
) -> RwLockReadGuard<'a, HashMap<String, String>> {
    lock.read().unwrap_or_else(|poisoned| {
        warn!("Token store lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

fn write_guard<'a>(
    lock: &'a RwLock<HashMap<String, String>>,
) -> RwLockWriteGuard<'a, HashMap<String, String>> {
    lock.write().unwrap_or_else(|poisoned| {
        warn!("Token store lock was poisoned, recovering");
        poisoned.into_inner()
    })
}

/// Process-local store; forgotten on exit.
#[derive(Debug, Default)]
pub struct InMemoryTokenStore {
    values: RwLock<HashMap<String, String>>,
}

impl InMemoryTokenStore {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_token(token: &str) -> Self {
        let store = Self::new();
        write_guard(&store.values).insert(AUTH_TOKEN_KEY.to_string(), token.to_string());
        store
    }
}

impl TokenStore for InMemoryTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        read_guard(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        write_guard(&self.values).insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        write_guard(&self.values).remove(key);
        Ok(())
    }
}

/// Store persisted as a JSON object in a single file.
///
/// The file is read once on open and rewritten on every change.
#[derive(Debug)]
pub struct FileTokenStore {
    path: PathBuf,
    values: RwLock<HashMap<String, String>>,
}

impl FileTokenStore {
    pub fn open(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = if path.exists() {
            let contents = fs::read_to_string(&path).map_err(|e| {
                ApiClientError::token_store(format!("Failed to read {}: {}", path.display(), e))
            })?;
            if contents.trim().is_empty() {
                HashMap::new()
            } else {
                serde_json::from_str(&contents)?
            }
        } else {
            HashMap::new()
        };
        debug!(
            "Opened token store at {} ({} keys)",
            path.display(),
            values.len()
        );
        Ok(Self {
            path,
            values: RwLock::new(values),
        })
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn persist(&self, values: &HashMap<String, String>) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            if !parent.as_os_str().is_empty() {
                fs::create_dir_all(parent).map_err(|e| {
                    ApiClientError::token_store(format!(
                        "Failed to create {}: {}",
                        parent.display(),
                        e
                    ))
                })?;
            }
        }
        let tmp = self.path.with_extension("tmp");
        fs::write(&tmp, serde_json::to_vec_pretty(values)?).map_err(|e| {
            ApiClientError::token_store(format!("Failed to write {}: {}", tmp.display(), e))
        })?;
        fs::rename(&tmp, &self.path).map_err(|e| {
            ApiClientError::token_store(format!(
                "Failed to replace {}: {}",
                self.path.display(),
                e
            ))
        })
    }
}

impl TokenStore for FileTokenStore {
    fn get(&self, key: &str) -> Option<String> {
        read_guard(&self.values).get(key).cloned()
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        let mut values = write_guard(&self.values);
        values.insert(key.to_string(), value.to_string());
        self.persist(&values)
    }

    fn remove(&self, key: &str) -> Result<()> {
        let mut values = write_guard(&self.values);
        if values.remove(key).is_some() {
            self.persist(&values)?;
        }
        Ok(())
    }
}
