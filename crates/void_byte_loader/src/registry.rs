//! Loader registry - the ordered set of loaders the scheduler walks

use std::sync::Arc;

use crate::config::{ByteLoadConfig, MissingResourcePolicy, ResourceMatch};
use crate::error::{ByteLoaderError, Result};
use crate::loader::ByteLoad;
use crate::source::ResourceSource;
use crate::state::LoadState;

/// Registered loaders in registration order
pub struct LoaderRegistry {
    config: ByteLoadConfig,
    entries: Vec<Arc<dyn ByteLoad>>,
}

impl LoaderRegistry {
    /// Create an empty registry
    pub fn new(config: ByteLoadConfig) -> Self {
        Self {
            config,
            entries: Vec::new(),
        }
    }

    /// Get the configuration
    pub fn config(&self) -> &ByteLoadConfig {
        &self.config
    }

    /// Register a loader
    ///
    /// Names must be unique. Under suffix matching no bytes file name may be
    /// a suffix of another, since both loaders would match the same resource.
    pub fn register(&mut self, loader: Arc<dyn ByteLoad>) -> Result<()> {
        for existing in &self.entries {
            if existing.name() == loader.name() {
                return Err(ByteLoaderError::DuplicateLoader(loader.name().to_string()));
            }

            if self.config.resource_match == ResourceMatch::Suffix {
                let a = loader.bytes_file_name();
                let b = existing.bytes_file_name();
                if a.ends_with(b) || b.ends_with(a) {
                    return Err(ByteLoaderError::SuffixCollision {
                        loader: loader.name().to_string(),
                        file: a.to_string(),
                        other: existing.name().to_string(),
                        other_file: b.to_string(),
                    });
                }
            }
        }

        log::debug!("Registered byte loader {} ({})", loader.name(), loader.bytes_file_name());
        self.entries.push(loader);
        Ok(())
    }

    /// Acquire bytes for every pending loader that has none.
    /// Returns the number of loaders that became eligible.
    pub fn acquire_all(&self, source: &dyn ResourceSource) -> usize {
        let mut acquired = 0;

        for loader in &self.entries {
            if loader.state() != LoadState::Pending || loader.has_bytes() {
                continue;
            }

            match loader.acquire_bytes(source, self.config.resource_match) {
                Ok(_) => acquired += 1,
                Err(e) if e.is_acquisition_failure() => {
                    log::warn!(
                        "{}: {}. Did you forget to include it as a resource?",
                        loader.name(),
                        e
                    );
                    if self.config.missing_resource == MissingResourcePolicy::Fail {
                        loader.fail(e.to_string());
                    }
                }
                Err(e) => {
                    log::error!("{} could not acquire bytes: {}", loader.name(), e);
                    loader.fail(e.to_string());
                }
            }
        }

        acquired
    }

    /// All loaders in registration order
    pub fn entries(&self) -> &[Arc<dyn ByteLoad>] {
        &self.entries
    }

    /// Look up a loader by name
    pub fn get(&self, name: &str) -> Option<&Arc<dyn ByteLoad>> {
        self.entries.iter().find(|e| e.name() == name)
    }

    /// First loader that is not loaded yet and holds bytes
    pub fn next_eligible(&self) -> Option<&Arc<dyn ByteLoad>> {
        self.entries
            .iter()
            .find(|e| e.state() == LoadState::Pending && e.has_bytes())
    }

    /// Number of loaders not in a terminal state
    pub fn pending_count(&self) -> usize {
        self.entries.iter().filter(|e| !e.is_loaded()).count()
    }

    /// Check if every loader reached a terminal state
    pub fn all_loaded(&self) -> bool {
        self.entries.iter().all(|e| e.is_loaded())
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl Default for LoaderRegistry {
    fn default() -> Self {
        Self::new(ByteLoadConfig::default())
    }
}
