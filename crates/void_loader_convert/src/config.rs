//! Conversion config - TOML to ConvertConfig
//!
//! # Config Format
//!
//! ```toml
//! [loader]
//! payload_type = "Il2CppAssets.Scripts.Models.GameModel"
//! class_name = "MyGameModelLoader"
//! bytes_file = "GameModel.bytes"
//! namespace = "MyMod.Loaders"        # optional
//! input = "GameModelLoader.cs"       # relative to this file
//! output = "MyGameModelLoader.cs"
//!
//! [types]                             # optional, overrides defaults
//! enums = ["Il2CppAssets.Scripts.Models.Map.AreaType"]
//! ```

use std::path::{Path, PathBuf};

use serde::Deserialize;

use crate::error::{ConvertError, Result};
use crate::pipeline::LoaderTarget;
use crate::tables::TypeTables;

/// Raw TOML structure for the loader section
#[derive(Debug, Deserialize)]
struct LoaderToml {
    payload_type: String,
    class_name: String,
    bytes_file: String,
    namespace: Option<String>,
    input: Option<PathBuf>,
    output: Option<PathBuf>,
}

/// Root TOML structure
#[derive(Debug, Deserialize)]
struct ConvertToml {
    loader: LoaderToml,
    #[serde(default)]
    types: TypeTables,
}

/// One conversion job
#[derive(Debug, Clone)]
pub struct ConvertConfig {
    pub target: LoaderTarget,
    pub tables: TypeTables,
    pub input: PathBuf,
    pub output: PathBuf,
}

impl ConvertConfig {
    /// Parse a conversion config, resolving relative paths against `base_dir`
    pub fn parse(content: &str, base_dir: &Path) -> Result<Self> {
        let raw: ConvertToml = toml::from_str(content)?;
        let loader = raw.loader;

        let mut target = LoaderTarget::new(loader.payload_type, loader.class_name, loader.bytes_file);
        if let Some(namespace) = loader.namespace {
            target = target.with_namespace(namespace);
        }
        target.validate()?;

        let input = loader
            .input
            .ok_or_else(|| ConvertError::MissingField("loader.input".to_string()))?;
        let output = loader
            .output
            .ok_or_else(|| ConvertError::MissingField("loader.output".to_string()))?;

        Ok(Self {
            target,
            tables: raw.types,
            input: base_dir.join(input),
            output: base_dir.join(output),
        })
    }

    /// Load a conversion config from a file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path).map_err(|e| ConvertError::io(path, e))?;
        let base_dir = path.parent().unwrap_or_else(|| Path::new(""));
        Self::parse(&content, base_dir)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    const MINIMAL: &str = r#"
        [loader]
        payload_type = "Il2CppAssets.Scripts.Models.GameModel"
        class_name = "MyGameModelLoader"
        bytes_file = "GameModel.bytes"
        input = "in/GameModelLoader.cs"
        output = "/abs/MyGameModelLoader.cs"
    "#;

    #[test]
    fn test_parse_minimal() {
        let config = ConvertConfig::parse(MINIMAL, Path::new("/work")).unwrap();
        assert_eq!(config.target.short_name(), "GameModel");
        assert_eq!(config.target.namespace, None);
        assert_eq!(config.input, PathBuf::from("/work/in/GameModelLoader.cs"));
        assert_eq!(config.output, PathBuf::from("/abs/MyGameModelLoader.cs"));
        assert_eq!(config.tables, TypeTables::default());
    }

    #[test]
    fn test_parse_types_override() {
        let content = format!(
            "{}\n[types]\nasset_refs = [\"SpriteReference\"]\n",
            MINIMAL.replace("bytes_file", "namespace = \"MyMod\"\n        bytes_file")
        );
        let config = ConvertConfig::parse(&content, Path::new("")).unwrap();
        assert_eq!(config.target.namespace.as_deref(), Some("MyMod"));
        assert_eq!(config.tables.asset_refs, vec!["SpriteReference".to_string()]);
        assert_eq!(config.tables.enums.len(), 3);
    }

    #[test]
    fn test_missing_output() {
        let content = MINIMAL.replace("output = \"/abs/MyGameModelLoader.cs\"", "");
        let err = ConvertConfig::parse(&content, Path::new("")).unwrap_err();
        assert!(matches!(err, ConvertError::MissingField(ref f) if f == "loader.output"));
    }

    #[test]
    fn test_missing_loader_table() {
        let err = ConvertConfig::parse("[types]\n", Path::new("")).unwrap_err();
        assert!(matches!(err, ConvertError::Config(_)));
    }

    #[test]
    fn test_load_from_file() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("convert.toml");
        std::fs::write(&path, MINIMAL).unwrap();

        let config = ConvertConfig::load(&path).unwrap();
        assert_eq!(config.input, dir.path().join("in/GameModelLoader.cs"));

        let err = ConvertConfig::load(dir.path().join("absent.toml")).unwrap_err();
        assert!(matches!(err, ConvertError::Io { .. }));
    }
}
