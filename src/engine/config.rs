use std::path::Path;

use serde::{Deserialize, Serialize};

use crate::catalog::registry::RegistryOptions;
use crate::error::SearchError;
use crate::search::limits::SearchLimits;

/// Engine-wide settings. Every field has a default, so a config file only needs the keys it
/// changes, e.g. `{"limits": {"max_depth": 12}, "workers": 4}`.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct EngineConfig {
    pub registry: RegistryOptions,
    pub limits: SearchLimits,
    /// Worker threads for pooled strategies; 0 picks the available parallelism.
    pub workers: usize,
}

impl EngineConfig {
    pub fn from_json_file(path: &Path) -> Result<Self, SearchError> {
        let bytes = std::fs::read(path).map_err(|e| SearchError::Io {
            stage: "config_read",
            path: path.display().to_string(),
            error: e.to_string(),
        })?;
        Self::from_json_slice(&bytes)
    }

    pub fn from_json_slice(bytes: &[u8]) -> Result<Self, SearchError> {
        let config: EngineConfig = serde_json::from_slice(bytes).map_err(|e| SearchError::Json {
            stage: "config_parse",
            error: e.to_string(),
        })?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), SearchError> {
        if self.registry.primitives.is_empty() {
            return Err(SearchError::invalid_request(
                "config lists no primitive elements",
            ));
        }
        if self.limits.max_queue_size == 0 {
            return Err(SearchError::invalid_request("max_queue_size must be positive"));
        }
        Ok(())
    }
}
