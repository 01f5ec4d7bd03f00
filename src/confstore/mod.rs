//! Key-Path Config Store
//!
//! File-backed structured configuration addressed by `>`-delimited key
//! paths. Sources are named by URL: `yaml:///etc/ha/ha.conf`,
//! `json:///etc/ha/alert_filter_rules.json`.
//!
//! Key paths walk nested maps segment by segment; a segment may carry one
//! or more array indices (`nodes[0]>hostname`).

mod file;

pub use file::FileConfStore;

use crate::consts::KEY_DELIM;
use crate::error::{Error, Result};
use serde_json::Value;
use std::path::PathBuf;

// =============================================================================
// Source URL
// =============================================================================

/// Document format of a config source
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SourceFormat {
    Yaml,
    Json,
}

impl std::fmt::Display for SourceFormat {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            SourceFormat::Yaml => write!(f, "yaml"),
            SourceFormat::Json => write!(f, "json"),
        }
    }
}

/// Parsed `scheme://path` location of a config source
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SourceUrl {
    pub format: SourceFormat,
    pub path: PathBuf,
}

impl SourceUrl {
    pub fn parse(url: &str) -> Result<Self> {
        let (scheme, path) = url
            .split_once("://")
            .ok_or_else(|| Error::UnsupportedScheme { url: url.to_string() })?;

        let format = match scheme.to_lowercase().as_str() {
            "yaml" | "yml" => SourceFormat::Yaml,
            "json" => SourceFormat::Json,
            _ => return Err(Error::UnsupportedScheme { url: url.to_string() }),
        };

        if path.is_empty() {
            return Err(Error::UnsupportedScheme { url: url.to_string() });
        }

        Ok(Self {
            format,
            path: PathBuf::from(path),
        })
    }
}

// =============================================================================
// Key Paths
// =============================================================================

/// Resolve `key` against a parsed document
pub fn lookup<'a>(root: &'a Value, key: &str) -> Option<&'a Value> {
    let mut node = root;
    for segment in key.split(KEY_DELIM) {
        let (field, indices) = split_segment(segment)?;
        if !field.is_empty() {
            node = node.get(field)?;
        }
        for index in indices {
            node = node.get(index)?;
        }
    }
    Some(node)
}

/// Split `name[1][2]` into `("name", [1, 2])`
fn split_segment(segment: &str) -> Option<(&str, Vec<usize>)> {
    let Some(open) = segment.find('[') else {
        return Some((segment, Vec::new()));
    };

    let (field, mut rest) = segment.split_at(open);
    let mut indices = Vec::new();
    while !rest.is_empty() {
        let inner = rest.strip_prefix('[')?;
        let close = inner.find(']')?;
        indices.push(inner[..close].trim().parse().ok()?);
        rest = &inner[close + 1..];
    }
    Some((field, indices))
}

/// Render a scalar config value as a string
///
/// Numbers and booleans are stringified, so `version: 10.3` reads as `"10.3"`.
pub fn scalar_to_string(key: &str, value: &Value) -> Result<String> {
    match value {
        Value::String(s) => Ok(s.clone()),
        Value::Number(n) => Ok(n.to_string()),
        Value::Bool(b) => Ok(b.to_string()),
        Value::Null => Err(Error::InvalidValue {
            key: key.to_string(),
            reason: "value is null".into(),
        }),
        Value::Array(_) | Value::Object(_) => Err(Error::InvalidValue {
            key: key.to_string(),
            reason: "expected a scalar, found a collection".into(),
        }),
    }
}
