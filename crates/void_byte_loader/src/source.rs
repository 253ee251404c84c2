//! Resource sources - where loader bytes come from
//!
//! A source exposes an ordered list of named resources for one module and
//! opens a byte stream by name. Packaging systems implement this trait;
//! [`MemoryResources`] and [`DirectoryResources`] cover tests and tooling.

use std::fs;
use std::io::{self, Cursor, Read};
use std::path::{Path, PathBuf};

use crate::config::ResourceMatch;
use crate::error::{ByteLoaderError, Result};

/// Named resources exposed by one module
pub trait ResourceSource: Send + Sync {
    /// Name of the owning module (used in diagnostics)
    fn module_name(&self) -> &str;

    /// Resource names in enumeration order
    fn resource_names(&self) -> Vec<String>;

    /// Open a resource for reading
    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>>;
}

/// Find the single resource matching `file`
///
/// Suffix lookups with more than one candidate are rejected instead of
/// picking whichever name the source happens to enumerate first.
pub fn find_resource(
    source: &dyn ResourceSource,
    file: &str,
    matching: ResourceMatch,
) -> Result<String> {
    let mut candidates: Vec<String> = source
        .resource_names()
        .into_iter()
        .filter(|name| matching.matches(name, file))
        .collect();

    match candidates.len() {
        0 => Err(ByteLoaderError::not_found(source.module_name(), file)),
        1 => Ok(candidates.remove(0)),
        _ => Err(ByteLoaderError::AmbiguousResource {
            module: source.module_name().to_string(),
            file: file.to_string(),
            candidates,
        }),
    }
}

/// Read a resource fully, rejecting empty content
pub fn read_resource(source: &dyn ResourceSource, name: &str) -> Result<Vec<u8>> {
    let mut data = Vec::new();
    source.open(name)?.read_to_end(&mut data)?;

    if data.is_empty() {
        return Err(ByteLoaderError::EmptyResource(name.to_string()));
    }

    Ok(data)
}

/// In-memory resource set, enumerated in insertion order
#[derive(Debug, Clone, Default)]
pub struct MemoryResources {
    module: String,
    resources: Vec<(String, Vec<u8>)>,
}

impl MemoryResources {
    /// Create an empty resource set
    pub fn new(module: impl Into<String>) -> Self {
        Self {
            module: module.into(),
            resources: Vec::new(),
        }
    }

    /// Add a resource
    pub fn with_resource(mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) -> Self {
        self.insert(name, data);
        self
    }

    /// Add or replace a resource
    pub fn insert(&mut self, name: impl Into<String>, data: impl Into<Vec<u8>>) {
        let name = name.into();
        let data = data.into();
        match self.resources.iter_mut().find(|(n, _)| *n == name) {
            Some(entry) => entry.1 = data,
            None => self.resources.push((name, data)),
        }
    }

    /// Number of resources
    pub fn len(&self) -> usize {
        self.resources.len()
    }

    /// Check if empty
    pub fn is_empty(&self) -> bool {
        self.resources.is_empty()
    }
}

impl ResourceSource for MemoryResources {
    fn module_name(&self) -> &str {
        &self.module
    }

    fn resource_names(&self) -> Vec<String> {
        self.resources.iter().map(|(name, _)| name.clone()).collect()
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        self.resources
            .iter()
            .find(|(n, _)| n == name)
            .map(|(_, data)| Box::new(Cursor::new(data.as_slice())) as Box<dyn Read + '_>)
            .ok_or_else(|| io::Error::new(io::ErrorKind::NotFound, format!("No resource named {}", name)))
    }
}

/// Resources stored as files under a directory
///
/// Names are paths relative to the root joined with `/`, in sorted order.
#[derive(Debug, Clone)]
pub struct DirectoryResources {
    module: String,
    root: PathBuf,
}

impl DirectoryResources {
    /// Create a directory-backed source
    pub fn new(module: impl Into<String>, root: impl Into<PathBuf>) -> Self {
        Self {
            module: module.into(),
            root: root.into(),
        }
    }

    /// Root directory
    pub fn root(&self) -> &Path {
        &self.root
    }

    fn collect(&self, dir: &Path, prefix: &str, names: &mut Vec<String>) {
        let entries = match fs::read_dir(dir) {
            Ok(entries) => entries,
            Err(e) => {
                log::warn!("Failed to read resource directory {:?}: {}", dir, e);
                return;
            }
        };

        for entry in entries.flatten() {
            let path = entry.path();
            let file_name = entry.file_name().to_string_lossy().to_string();
            let name = if prefix.is_empty() {
                file_name
            } else {
                format!("{}/{}", prefix, file_name)
            };

            if path.is_dir() {
                self.collect(&path, &name, names);
            } else if path.is_file() {
                names.push(name);
            }
        }
    }
}

impl ResourceSource for DirectoryResources {
    fn module_name(&self) -> &str {
        &self.module
    }

    fn resource_names(&self) -> Vec<String> {
        let mut names = Vec::new();
        self.collect(&self.root, "", &mut names);
        names.sort();
        names
    }

    fn open(&self, name: &str) -> io::Result<Box<dyn Read + '_>> {
        let path = name.split('/').fold(self.root.clone(), |path, part| path.join(part));
        Ok(Box::new(fs::File::open(path)?))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sample() -> MemoryResources {
        MemoryResources::new("MyMod")
            .with_resource("MyMod.Resources.GameModel.bytes", vec![1, 2, 3])
            .with_resource("MyMod.Resources.Empty.bytes", Vec::new())
            .with_resource("MyMod.Resources.Other.txt", b"text".to_vec())
    }

    #[test]
    fn test_find_by_suffix() {
        let source = sample();
        let name = find_resource(&source, "GameModel.bytes", ResourceMatch::Suffix).unwrap();
        assert_eq!(name, "MyMod.Resources.GameModel.bytes");
    }

    #[test]
    fn test_find_missing() {
        let source = sample();
        let err = find_resource(&source, "Missing.bytes", ResourceMatch::Suffix).unwrap_err();
        assert!(matches!(err, ByteLoaderError::ResourceNotFound { .. }));
    }

    #[test]
    fn test_find_ambiguous_suffix() {
        let source = sample().with_resource("Other.GameModel.bytes", vec![9]);
        let err = find_resource(&source, "GameModel.bytes", ResourceMatch::Suffix).unwrap_err();

        match err {
            ByteLoaderError::AmbiguousResource { candidates, .. } => assert_eq!(candidates.len(), 2),
            other => panic!("unexpected error: {other}"),
        }
    }

    #[test]
    fn test_exact_match_ignores_suffix() {
        let source = sample();
        assert!(find_resource(&source, "GameModel.bytes", ResourceMatch::Exact).is_err());
        assert!(find_resource(&source, "MyMod.Resources.GameModel.bytes", ResourceMatch::Exact).is_ok());
    }

    #[test]
    fn test_read_empty_resource() {
        let source = sample();
        let err = read_resource(&source, "MyMod.Resources.Empty.bytes").unwrap_err();
        assert!(matches!(err, ByteLoaderError::EmptyResource(_)));
        assert_eq!(read_resource(&source, "MyMod.Resources.GameModel.bytes").unwrap(), vec![1, 2, 3]);
    }

    #[test]
    fn test_memory_insert_replaces() {
        let mut source = MemoryResources::new("m");
        source.insert("a", vec![1]);
        source.insert("a", vec![2]);
        assert_eq!(source.len(), 1);
        assert_eq!(read_resource(&source, "a").unwrap(), vec![2]);
    }

    #[test]
    fn test_directory_resources() {
        let dir = tempfile::tempdir().unwrap();
        fs::create_dir(dir.path().join("models")).unwrap();
        fs::write(dir.path().join("models").join("Game.bytes"), [7u8, 8]).unwrap();
        fs::write(dir.path().join("a.txt"), b"x").unwrap();

        let source = DirectoryResources::new("disk", dir.path());
        assert_eq!(source.resource_names(), vec!["a.txt".to_string(), "models/Game.bytes".to_string()]);

        let name = find_resource(&source, "Game.bytes", ResourceMatch::Suffix).unwrap();
        assert_eq!(read_resource(&source, &name).unwrap(), vec![7, 8]);
    }
}
