//! File-backed key-path store
//!
//! Parses YAML/JSON documents into `serde_json::Value` trees, one per index.

use super::{lookup, SourceFormat, SourceUrl};
use crate::domain::ports::ConfStore;
use crate::error::{Error, Result};
use dashmap::DashMap;
use serde_json::Value;
use tracing::{debug, info};

/// Config store holding parsed documents keyed by index
#[derive(Debug, Default)]
pub struct FileConfStore {
    indices: DashMap<String, Value>,
}

impl FileConfStore {
    /// Create an empty store
    pub fn new() -> Self {
        Self::default()
    }

    /// Indices currently loaded
    pub fn indices(&self) -> Vec<String> {
        self.indices.iter().map(|e| e.key().clone()).collect()
    }

    fn read_document(index: &str, url: &str) -> Result<Value> {
        let source = SourceUrl::parse(url)?;
        let load_error = |reason: String| Error::ConfigLoad {
            index: index.to_string(),
            url: url.to_string(),
            reason,
        };

        let text = std::fs::read_to_string(&source.path).map_err(|e| load_error(e.to_string()))?;

        let doc = match source.format {
            SourceFormat::Yaml => {
                serde_yaml::from_str::<Value>(&text).map_err(|e| load_error(e.to_string()))?
            }
            SourceFormat::Json => {
                serde_json::from_str::<Value>(&text).map_err(|e| load_error(e.to_string()))?
            }
        };

        debug!(
            "Parsed {} document {} for index {}",
            source.format,
            source.path.display(),
            index
        );
        Ok(doc)
    }
}

impl ConfStore for FileConfStore {
    fn load(&self, index: &str, url: &str) -> Result<()> {
        if self.indices.contains_key(index) {
            return Err(Error::IndexAlreadyLoaded {
                index: index.to_string(),
            });
        }

        let doc = Self::read_document(index, url)?;

        match self.indices.entry(index.to_string()) {
            dashmap::mapref::entry::Entry::Occupied(_) => Err(Error::IndexAlreadyLoaded {
                index: index.to_string(),
            }),
            dashmap::mapref::entry::Entry::Vacant(slot) => {
                slot.insert(doc);
                info!("Loaded config index {} from {}", index, url);
                Ok(())
            }
        }
    }

    fn get(&self, index: &str, key: &str) -> Result<Value> {
        let doc = self.indices.get(index).ok_or_else(|| Error::IndexNotLoaded {
            index: index.to_string(),
        })?;

        match lookup(doc.value(), key) {
            Some(Value::Null) | None => Err(Error::KeyNotFound {
                index: index.to_string(),
                key: key.to_string(),
            }),
            Some(value) => Ok(value.clone()),
        }
    }
}
