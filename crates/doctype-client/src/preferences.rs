//! Persisted user preferences
//!
//! A small JSON key-value file. The only key the application reads is
//! `salesPurchaseType`, which selects the sales, purchase or legal view.

use std::path::{Path, PathBuf};
use std::str::FromStr;

use indexmap::IndexMap;
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;

use crate::config::ClientConfig;
use crate::error::{ClientError, Result};

/// Key of the sales/purchase/legal selector
pub const SALES_PURCHASE_TYPE_KEY: &str = "salesPurchaseType";

/// Which side of the business the user is working on
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SalesPurchaseType {
    /// Sales view
    #[default]
    Sales,
    /// Purchase view
    Purchase,
    /// Legal case view
    Legal,
}

impl SalesPurchaseType {
    /// Stored value
    #[inline]
    #[must_use]
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Sales => "sales",
            Self::Purchase => "purchase",
            Self::Legal => "legal",
        }
    }
}

impl FromStr for SalesPurchaseType {
    type Err = ClientError;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "sales" => Ok(Self::Sales),
            "purchase" => Ok(Self::Purchase),
            "legal" => Ok(Self::Legal),
            other => Err(ClientError::Config(format!("unknown sales/purchase type '{other}'"))),
        }
    }
}

/// Key-value preferences backed by a JSON file
#[derive(Debug, Clone, Default)]
pub struct Preferences {
    path: Option<PathBuf>,
    values: IndexMap<String, JsonValue>,
}

impl Preferences {
    /// In-memory preferences that are never written
    #[inline]
    #[must_use]
    pub fn in_memory() -> Self {
        Self::default()
    }

    /// Load from a file; a missing file yields empty preferences
    ///
    /// # Errors
    /// - `ClientError::Io` if the file exists but cannot be read
    /// - `ClientError::Decode` if it is not a JSON object
    pub fn load(path: impl Into<PathBuf>) -> Result<Self> {
        let path = path.into();
        let values = match std::fs::read_to_string(&path) {
            Ok(content) if content.trim().is_empty() => IndexMap::new(),
            Ok(content) => serde_json::from_str(&content)?,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => IndexMap::new(),
            Err(e) => return Err(e.into()),
        };
        Ok(Self {
            path: Some(path),
            values,
        })
    }

    /// Preferences at the configured `preferences_path`, in memory when unset
    ///
    /// # Errors
    /// As [`load`](Self::load).
    pub fn from_config(config: &ClientConfig) -> Result<Self> {
        match &config.preferences_path {
            Some(path) => Self::load(path.clone()),
            None => Ok(Self::in_memory()),
        }
    }

    /// Backing file
    #[inline]
    #[must_use]
    pub fn path(&self) -> Option<&Path> {
        self.path.as_deref()
    }

    /// Raw value of a key
    #[inline]
    #[must_use]
    pub fn get(&self, key: &str) -> Option<&JsonValue> {
        self.values.get(key)
    }

    /// Set a key (call [`save`](Self::save) to persist)
    pub fn set(&mut self, key: impl Into<String>, value: JsonValue) {
        self.values.insert(key.into(), value);
    }

    /// Remove a key
    pub fn remove(&mut self, key: &str) -> Option<JsonValue> {
        self.values.shift_remove(key)
    }

    /// Write to the backing file, if any
    ///
    /// # Errors
    /// `ClientError::Io` if the file cannot be written.
    pub fn save(&self) -> Result<()> {
        let Some(path) = &self.path else {
            return Ok(());
        };
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }
        let content = serde_json::to_string_pretty(&self.values)?;
        std::fs::write(path, content)?;
        tracing::debug!("Saved preferences to {}", path.display());
        Ok(())
    }

    /// Selected view; unknown or missing values fall back to sales
    #[must_use]
    pub fn sales_purchase_type(&self) -> SalesPurchaseType {
        self.get(SALES_PURCHASE_TYPE_KEY)
            .and_then(JsonValue::as_str)
            .and_then(|s| s.parse().ok())
            .unwrap_or_default()
    }

    /// Select a view
    pub fn set_sales_purchase_type(&mut self, kind: SalesPurchaseType) {
        self.set(SALES_PURCHASE_TYPE_KEY, JsonValue::String(kind.as_str().to_string()));
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn config_selects_backing_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs").join("user.json");
        let mut config = ClientConfig::default();
        assert_eq!(Preferences::from_config(&config).unwrap().path(), None);

        config.preferences_path = Some(path.clone());
        let mut prefs = Preferences::from_config(&config).unwrap();
        assert_eq!(prefs.path(), Some(path.as_path()));
        prefs.set_sales_purchase_type(SalesPurchaseType::Legal);
        prefs.save().unwrap();
        assert_eq!(
            Preferences::from_config(&config).unwrap().sales_purchase_type(),
            SalesPurchaseType::Legal
        );
    }

    #[test]
    fn defaults_to_sales() {
        let mut prefs = Preferences::in_memory();
        assert_eq!(prefs.sales_purchase_type(), SalesPurchaseType::Sales);
        prefs.set(SALES_PURCHASE_TYPE_KEY, json!("bogus"));
        assert_eq!(prefs.sales_purchase_type(), SalesPurchaseType::Sales);
        assert!(prefs.save().is_ok());
    }

    #[test]
    fn persists_between_loads() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("nested").join("prefs.json");

        let mut prefs = Preferences::load(&path).unwrap();
        assert_eq!(prefs.sales_purchase_type(), SalesPurchaseType::Sales);
        prefs.set_sales_purchase_type(SalesPurchaseType::Legal);
        prefs.save().unwrap();

        let reloaded = Preferences::load(&path).unwrap();
        assert_eq!(reloaded.sales_purchase_type(), SalesPurchaseType::Legal);
        assert_eq!(reloaded.get(SALES_PURCHASE_TYPE_KEY), Some(&json!("legal")));
    }

    #[test]
    fn rejects_non_object_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("prefs.json");
        std::fs::write(&path, "[1, 2]").unwrap();
        assert!(matches!(Preferences::load(&path), Err(ClientError::Decode(_))));
    }
}
