mod local;

pub use local::LocalStore;

use std::path::PathBuf;
use std::sync::Arc;

use async_trait::async_trait;
use bytes::Bytes;

#[derive(Debug, thiserror::Error)]
pub enum StoreError {
    #[error("not found: {0}")]
    NotFound(String),

    #[error("invalid key: {0}")]
    InvalidKey(String),

    #[error("store error: {0}")]
    Internal(String),
}

/// A store for opaque blobs keyed by `/`-separated relative paths.
#[async_trait]
pub trait ObjectStore: Send + Sync {
    /// Write (create or overwrite) an object.
    async fn put(&self, key: &str, data: Bytes) -> Result<(), StoreError>;

    /// Read an object. Returns `StoreError::NotFound` if absent.
    async fn get(&self, key: &str) -> Result<Bytes, StoreError>;

    /// Delete an object. No-op if absent.
    async fn delete(&self, key: &str) -> Result<(), StoreError>;

    /// Check if an object exists.
    async fn exists(&self, key: &str) -> Result<bool, StoreError> {
        match self.get(key).await {
            Ok(_) => Ok(true),
            Err(StoreError::NotFound(_)) => Ok(false),
            Err(e) => Err(e),
        }
    }
}

// -- Key helpers --

/// Prefix under which task submissions are kept.
pub const ATTACHMENTS_PREFIX: &str = "attachments";

/// Build a fresh attachment path (`{token}/{safe name}`) for an upload.
///
/// The token keeps uploads of the same filename apart; the original name is
/// only kept in sanitised form so the path can never leave the store root.
pub fn new_attachment_path(filename: &str) -> String {
    let token = uuid::Uuid::new_v4().simple().to_string();
    format!("{token}/{}", sanitize_filename(filename))
}

/// Store key for an attachment path as saved on a task.
pub fn attachment_key(attachment_path: &str) -> String {
    format!("{ATTACHMENTS_PREFIX}/{attachment_path}")
}

/// Reduce a caller-supplied filename to a single safe path segment.
///
/// Directory components are dropped, anything outside `[A-Za-z0-9._-]`
/// becomes `_`, and leading dots are stripped.
pub fn sanitize_filename(filename: &str) -> String {
    let base = filename
        .rsplit(['/', '\\'])
        .next()
        .unwrap_or_default();
    let cleaned: String = base
        .chars()
        .map(|c| {
            if c.is_ascii_alphanumeric() || matches!(c, '.' | '-' | '_') {
                c
            } else {
                '_'
            }
        })
        .collect();
    let trimmed = cleaned.trim_start_matches('.');
    if trimmed.is_empty() {
        "attachment".to_string()
    } else {
        trimmed.to_string()
    }
}

/// Check that a key is a relative path made of plain segments.
pub fn validate_key(key: &str) -> Result<(), StoreError> {
    if key.is_empty() || key.starts_with('/') || key.contains('\\') {
        return Err(StoreError::InvalidKey(key.to_string()));
    }
    for segment in key.split('/') {
        if segment.is_empty() || segment == "." || segment == ".." || segment.contains(':') {
            return Err(StoreError::InvalidKey(key.to_string()));
        }
    }
    Ok(())
}

// -- Configuration --

/// Configuration for the attachment store.
pub struct StoreConfig {
    /// Base directory. Attachments live under `<dir>/attachments/`.
    pub local_data_dir: Option<String>,
}

impl StoreConfig {
    /// Build from `TUSK_DATA_DIR`.
    pub fn from_env() -> Self {
        Self {
            local_data_dir: std::env::var("TUSK_DATA_DIR").ok(),
        }
    }
}

// -- Factory --

/// Create an `ObjectStore` from configuration.
pub fn create_store(config: &StoreConfig) -> Result<Arc<dyn ObjectStore>, StoreError> {
    Ok(Arc::new(LocalStore::new(config)))
}

/// Mirrors `tusk_db::data_dir()` (`$XDG_DATA_HOME/tusk`, else
/// `~/.local/share/tusk`) so attachments sit beside `tusk.db` by default.
/// tusk-store does not depend on tusk-db; keep the two in sync.
pub(crate) fn default_data_dir() -> PathBuf {
    let base = if let Ok(xdg) = std::env::var("XDG_DATA_HOME") {
        PathBuf::from(xdg)
    } else if let Some(home) = std::env::var_os("HOME") {
        PathBuf::from(home).join(".local/share")
    } else {
        PathBuf::from(".")
    };
    base.join("tusk")
}
