//! Type tables
//!
//! Allow-lists of domain types that need special array handling, plus the
//! interop vocabulary the rewritten loader is expressed in. Every field can
//! be overridden from the `[types]` table of a conversion config.

use serde::Deserialize;

/// Type names and interop vocabulary used when building rules
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct TypeTables {
    /// Reference types whose arrays become reference arrays
    pub references: Vec<String>,
    /// Value types whose arrays become struct arrays
    pub structs: Vec<String>,
    /// Enum types that must keep native arrays
    pub enums: Vec<String>,
    /// Asset reference types built through the content factory
    pub asset_refs: Vec<String>,
    /// Namespace holding the asset reference types
    pub asset_ref_namespace: String,
    /// Factory method prefix, joined with the asset reference name
    pub asset_factory: String,
    /// Interop array of references
    pub reference_array: String,
    /// Interop array of value types
    pub struct_array: String,
    /// Interop array of strings
    pub string_array: String,
    /// Constraint placed on generic reader methods
    pub object_base: String,
    /// Base class of converted loaders
    pub base_loader: String,
    /// Interface the generator declares on its loaders
    pub generator_interface: String,
}

impl Default for TypeTables {
    fn default() -> Self {
        Self {
            references: vec!["Il2CppAssets.Scripts.Models.Towers.TargetType".to_string()],
            structs: vec!["Il2CppAssets.Scripts.Simulation.SMath.Vector3".to_string()],
            enums: vec![
                "Il2CppAssets.Scripts.Models.Towers.TowerModel.TowerSize".to_string(),
                "Il2CppAssets.Scripts.Models.Map.AreaType".to_string(),
                "Il2CppAssets.Scripts.Models.TowerSets.TowerSet".to_string(),
            ],
            asset_refs: vec![
                "SpriteReference".to_string(),
                "PrefabReference".to_string(),
                "AudioSourceReference".to_string(),
            ],
            asset_ref_namespace: "Il2CppAssets.Scripts.Utils".to_string(),
            asset_factory: "ModContent.Create".to_string(),
            reference_array: "Il2CppReferenceArray".to_string(),
            struct_array: "Il2CppStructArray".to_string(),
            string_array: "Il2CppStringArray".to_string(),
            object_base: "Il2CppObjectBase".to_string(),
            base_loader: "ModByteLoader".to_string(),
            generator_interface: "IGameModelLoader".to_string(),
        }
    }
}

impl TypeTables {
    /// `Wrapper<element>`
    pub fn reference_array_of(&self, element: &str) -> String {
        format!("{}<{}>", self.reference_array, element)
    }

    /// `Wrapper<element>`
    pub fn struct_array_of(&self, element: &str) -> String {
        format!("{}<{}>", self.struct_array, element)
    }

    /// Fully qualified asset reference type
    pub fn asset_ref_path(&self, name: &str) -> String {
        format!("{}.{}", self.asset_ref_namespace, name)
    }

    /// Check whether a type is in the enum allow-list
    pub fn is_enum(&self, name: &str) -> bool {
        self.enums.iter().any(|e| e == name)
    }
}
