//! # void_loader_convert - Generated Loader Conversion
//!
//! Rewrites model loaders produced by the flat-file code generator so they
//! run against interop array types:
//! - Ordered, staged rewrite rules over plain source text
//! - Type tables for reference, struct, enum and asset-reference types
//! - Per-rule match report for spotting rules that silently missed
//!
//! ## Example
//!
//! ```ignore
//! use void_loader_convert::prelude::*;
//!
//! let target = LoaderTarget::new(
//!     "Il2CppAssets.Scripts.Models.GameModel",
//!     "MyGameModelLoader",
//!     "GameModel.bytes",
//! )
//! .with_namespace("MyMod.Loaders");
//!
//! let converted = transform(&generated, &target, &TypeTables::default())?;
//! ```

pub mod config;
pub mod error;
pub mod pipeline;
pub mod rule;
pub mod tables;

pub use config::ConvertConfig;
pub use error::{ConvertError, Result};
pub use pipeline::{
    build_rules, convert_file, transform, transform_with_report, ConvertReport, LoaderTarget,
    PREAMBLE,
};
pub use rule::{Rewrite, RewriteRule, RuleHit, RuleKind, RuleSet, Stage};
pub use tables::TypeTables;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::error::{ConvertError, Result};
    pub use crate::pipeline::{convert_file, transform, transform_with_report, LoaderTarget};
    pub use crate::rule::{RuleSet, Stage};
    pub use crate::tables::TypeTables;
}
