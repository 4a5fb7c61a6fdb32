//! Compiler configuration.

use serde::{Deserialize, Serialize};

use crate::error::{CompileError, Result};

/// Tunables of a [`Compiler`](crate::Compiler).
///
/// Every key is optional when loading from YAML or JSON:
///
/// ```yaml
/// max_page_size: 10000
/// default_page: 1
/// default_size: 10
/// inner_hits_size: 100
/// descending_sentinel: 2
/// ```
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct CompileOptions {
    /// Upper bound applied by [`SearchBody::set_size`](crate::SearchBody::set_size).
    pub max_page_size: u32,
    /// Page used when a search selection leaves it unset.
    pub default_page: u32,
    /// Page size used when a search selection leaves it unset.
    pub default_size: u32,
    /// Inner-hits page size used when a nested selection leaves it unset.
    pub inner_hits_size: u32,
    /// Sort value meaning "descending"; any other value sorts ascending.
    pub descending_sentinel: i64,
}

impl Default for CompileOptions {
    fn default() -> Self {
        CompileOptions {
            max_page_size: 10_000,
            default_page: 1,
            default_size: 10,
            inner_hits_size: 100,
            descending_sentinel: 2,
        }
    }
}

impl CompileOptions {
    pub fn from_yaml_str(text: &str) -> Result<Self> {
        serde_yaml::from_str(text).map_err(|e| CompileError::InvalidOptions(e.to_string()))
    }

    pub fn from_json_str(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| CompileError::InvalidOptions(e.to_string()))
    }
}
