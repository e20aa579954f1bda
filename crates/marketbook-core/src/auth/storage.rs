//! Local persistence for the signed-in seller and bearer token.
//!
//! Storage is a plain key-value store (one file per key on disk). The
//! `SessionStorage` wrapper keeps the seller and token as a pair: both are
//! written together, cleared together, and a lone entry is discarded.

use std::collections::HashMap;
use std::path::PathBuf;
use std::sync::{Arc, Mutex};

use anyhow::{anyhow, Context, Result};
use tracing::{debug, warn};

use crate::models::Seller;

/// Storage key for the serialized seller record
pub const SELLER_KEY: &str = "seller.json";

/// Storage key for the bearer token
pub const TOKEN_KEY: &str = "token";

/// Minimal string key-value storage
pub trait KeyValueStore: Send + Sync {
    fn get(&self, key: &str) -> Result<Option<String>>;
    fn set(&self, key: &str, value: &str) -> Result<()>;
    fn remove(&self, key: &str) -> Result<()>;
}

/// Stores each key as a file in a directory
pub struct FileStore {
    dir: PathBuf,
}

impl FileStore {
    pub fn new(dir: PathBuf) -> Self {
        Self { dir }
    }

    fn path(&self, key: &str) -> PathBuf {
        self.dir.join(key)
    }
}

impl KeyValueStore for FileStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        let path = self.path(key);
        if !path.exists() {
            return Ok(None);
        }
        let contents = std::fs::read_to_string(&path)
            .with_context(|| format!("Failed to read storage file: {}", key))?;
        Ok(Some(contents))
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        std::fs::create_dir_all(&self.dir).context("Failed to create storage directory")?;

        // Write then rename so a crash never leaves a half-written entry
        let path = self.path(key);
        let tmp = self.path(&format!("{}.tmp", key));
        std::fs::write(&tmp, value)
            .with_context(|| format!("Failed to write storage file: {}", key))?;
        std::fs::rename(&tmp, &path)
            .with_context(|| format!("Failed to replace storage file: {}", key))?;
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        let path = self.path(key);
        if path.exists() {
            std::fs::remove_file(path)
                .with_context(|| format!("Failed to remove storage file: {}", key))?;
        }
        Ok(())
    }
}

/// In-process store, used when nothing should touch the disk
#[derive(Default)]
pub struct MemoryStore {
    entries: Mutex<HashMap<String, String>>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn entries(&self) -> Result<std::sync::MutexGuard<'_, HashMap<String, String>>> {
        self.entries
            .lock()
            .map_err(|_| anyhow!("Memory store lock poisoned"))
    }
}

impl KeyValueStore for MemoryStore {
    fn get(&self, key: &str) -> Result<Option<String>> {
        Ok(self.entries()?.get(key).cloned())
    }

    fn set(&self, key: &str, value: &str) -> Result<()> {
        self.entries()?.insert(key.to_string(), value.to_string());
        Ok(())
    }

    fn remove(&self, key: &str) -> Result<()> {
        self.entries()?.remove(key);
        Ok(())
    }
}

/// Seller and token persistence on top of a key-value store
#[derive(Clone)]
pub struct SessionStorage {
    store: Arc<dyn KeyValueStore>,
}

impl SessionStorage {
    pub fn new(store: Arc<dyn KeyValueStore>) -> Self {
        Self { store }
    }

    /// Load the persisted pair. A seller without a token (or the reverse) is
    /// treated as no session and the stray entry is removed.
    pub fn load(&self) -> Result<Option<(Seller, String)>> {
        let seller = self.store.get(SELLER_KEY)?;
        let token = self.store.get(TOKEN_KEY)?.filter(|t| !t.trim().is_empty());

        match (seller, token) {
            (Some(seller), Some(token)) => {
                let seller: Seller = serde_json::from_str(&seller)
                    .context("Failed to parse persisted seller")?;
                Ok(Some((seller, token.trim().to_string())))
            }
            (None, None) => Ok(None),
            (seller, token) => {
                warn!(
                    has_seller = seller.is_some(),
                    has_token = token.is_some(),
                    "Incomplete persisted session, discarding"
                );
                self.clear()?;
                Ok(None)
            }
        }
    }

    /// Persist both entries. If the second write fails the first is rolled back.
    pub fn save(&self, seller: &Seller, token: &str) -> Result<()> {
        let seller_json = serde_json::to_string(seller)?;

        self.store.set(TOKEN_KEY, token)?;
        if let Err(e) = self.store.set(SELLER_KEY, &seller_json) {
            if let Err(rollback) = self.store.remove(TOKEN_KEY) {
                warn!(error = %rollback, "Failed to roll back persisted token");
            }
            return Err(e);
        }

        debug!(seller_id = %seller.id, "Session persisted");
        Ok(())
    }

    /// Re-persist the seller record, leaving the token untouched
    pub fn save_seller(&self, seller: &Seller) -> Result<()> {
        let seller_json = serde_json::to_string(seller)?;
        self.store.set(SELLER_KEY, &seller_json)
    }

    /// Remove both entries, attempting each even if the other fails
    pub fn clear(&self) -> Result<()> {
        let seller = self.store.remove(SELLER_KEY);
        let token = self.store.remove(TOKEN_KEY);
        seller.and(token)
    }
}
