//! Byte loader configuration
//!
//! ```toml
//! resource_match = "suffix"       # suffix, exact
//! missing_resource = "fail"       # fail, skip
//! recheck_after_all_loaded = false
//! thread_name = "byte-loader"
//! ```

use std::path::Path;

use serde::Deserialize;

use crate::error::Result;

/// How a loader's bytes file name is matched against resource names
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ResourceMatch {
    /// Resource name must end with the bytes file name
    #[default]
    Suffix,
    /// Resource name must equal the bytes file name
    Exact,
}

impl ResourceMatch {
    /// Check whether a resource name matches a bytes file name
    pub fn matches(&self, resource: &str, file: &str) -> bool {
        match self {
            Self::Suffix => resource.ends_with(file),
            Self::Exact => resource == file,
        }
    }
}

/// What happens to a loader whose bytes could not be acquired
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MissingResourcePolicy {
    /// Mark the loader failed so the load sequence can still finish
    #[default]
    Fail,
    /// Leave the loader pending. It is never dispatched and the
    /// scheduler never reports all loaded while it exists.
    Skip,
}

/// Configuration shared by the registry and the scheduler
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct ByteLoadConfig {
    /// Resource name matching strategy
    pub resource_match: ResourceMatch,
    /// Policy for loaders without bytes
    pub missing_resource: MissingResourcePolicy,
    /// Keep scanning the registry after everything has loaded
    pub recheck_after_all_loaded: bool,
    /// Name given to background load threads
    pub thread_name: String,
}

impl Default for ByteLoadConfig {
    fn default() -> Self {
        Self {
            resource_match: ResourceMatch::Suffix,
            missing_resource: MissingResourcePolicy::Fail,
            recheck_after_all_loaded: false,
            thread_name: "byte-loader".to_string(),
        }
    }
}

impl ByteLoadConfig {
    /// Parse configuration from TOML text
    pub fn from_toml_str(content: &str) -> Result<Self> {
        Ok(toml::from_str(content)?)
    }

    /// Load configuration from a TOML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let content = std::fs::read_to_string(path.as_ref())?;
        let config = Self::from_toml_str(&content)?;
        log::debug!("Loaded byte loader config from {:?}", path.as_ref());
        Ok(config)
    }
}
