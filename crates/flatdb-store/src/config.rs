//! Table configuration.
//!
//! A [`TableConfig`] names the table file and the text layout used inside
//! it. It can be built in code or loaded from TOML:
//!
//! ```toml
//! path = "data/book.tsv"
//! separator = "\t"
//! null_token = "\\N"
//! sync_writes = true
//! ```

use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::error::{StoreError, StoreResult};

/// Configuration for one table file.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TableConfig {
    /// Path of the table file.
    pub path: PathBuf,

    /// Column separator. Default: horizontal tab.
    #[serde(default = "default_separator")]
    pub separator: char,

    /// Text stored for NULL values. Default: `\N`.
    #[serde(default = "default_null_token")]
    pub null_token: String,

    /// Whether to fsync after every write.
    #[serde(default = "default_sync_writes")]
    pub sync_writes: bool,
}

fn default_separator() -> char {
    '\t'
}

fn default_null_token() -> String {
    "\\N".to_string()
}

fn default_sync_writes() -> bool {
    true
}

impl TableConfig {
    /// Creates a configuration for `path` with default layout settings.
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self {
            path: path.into(),
            separator: default_separator(),
            null_token: default_null_token(),
            sync_writes: default_sync_writes(),
        }
    }

    /// Sets the column separator.
    #[must_use]
    pub fn with_separator(mut self, separator: char) -> Self {
        self.separator = separator;
        self
    }

    /// Sets the null token.
    #[must_use]
    pub fn with_null_token(mut self, null_token: impl Into<String>) -> Self {
        self.null_token = null_token.into();
        self
    }

    /// Sets whether writes are synced to disk.
    #[must_use]
    pub fn with_sync_writes(mut self, sync_writes: bool) -> Self {
        self.sync_writes = sync_writes;
        self
    }

    /// Parses a configuration from a TOML string.
    pub fn from_toml_str(content: &str) -> StoreResult<Self> {
        let config: Self = toml::from_str(content)
            .map_err(|e| StoreError::config(format!("invalid table config: {}", e)))?;
        config.validate()?;
        Ok(config)
    }

    /// Loads a configuration from a TOML file.
    pub fn from_file(path: &Path) -> StoreResult<Self> {
        let content = std::fs::read_to_string(path).map_err(|e| StoreError::io(path, e))?;
        Self::from_toml_str(&content)
    }

    /// Serializes the configuration to TOML.
    pub fn to_toml(&self) -> StoreResult<String> {
        toml::to_string_pretty(self)
            .map_err(|e| StoreError::config(format!("cannot serialize table config: {}", e)))
    }

    /// Saves the configuration to a TOML file.
    pub fn save(&self, path: &Path) -> StoreResult<()> {
        let content = self.to_toml()?;
        std::fs::write(path, content).map_err(|e| StoreError::io(path, e))
    }

    /// Validates the layout settings.
    pub fn validate(&self) -> StoreResult<()> {
        if self.separator == '\n' || self.separator == '\r' {
            return Err(StoreError::config("separator cannot be a line break"));
        }
        if self.null_token.contains(self.separator) {
            return Err(StoreError::config("null token cannot contain the separator"));
        }
        if self.null_token.contains('\n') || self.null_token.contains('\r') {
            return Err(StoreError::config("null token cannot contain a line break"));
        }
        if self.path.as_os_str().is_empty() {
            return Err(StoreError::config("table path is empty"));
        }
        Ok(())
    }
}
