//! # void_byte_loader - Background Model Loading
//!
//! Loads large byte-encoded models without stalling the main loop:
//! - One loader decoded at a time, in registration order
//! - Each load runs on its own background thread
//! - Raw bytes released as soon as a load finishes
//! - Failed loads end in a terminal state instead of blocking the queue
//! - Blocking result access for consumers that need the model now
//!
//! ## Example
//!
//! ```ignore
//! use void_byte_loader::prelude::*;
//!
//! let game_model = ByteLoader::shared("GameModel", "GameModel.bytes", GameModelDecoder);
//!
//! let mut registry = LoaderRegistry::new(ByteLoadConfig::default());
//! registry.register(game_model.clone())?;
//! registry.acquire_all(&resources);
//!
//! let mut scheduler = ByteLoadScheduler::new(registry.config().clone());
//!
//! // Each frame:
//! scheduler.advance(&registry);
//!
//! // When the model is needed (blocks if still loading):
//! if let Some(model) = game_model.load_result() {
//!     // ...
//! }
//! ```

pub mod config;
pub mod decoder;
pub mod error;
pub mod loader;
pub mod reader;
pub mod registry;
pub mod scheduler;
pub mod source;
pub mod state;
pub mod task;

pub use config::{ByteLoadConfig, MissingResourcePolicy, ResourceMatch};
pub use decoder::{DecodeContext, FnDecoder, ModelDecoder};
pub use error::{ByteLoaderError, DecodeError, DecodeResult, Result};
pub use loader::{ByteLoad, ByteLoader};
pub use reader::ByteReader;
pub use registry::LoaderRegistry;
pub use scheduler::{ByteLoadScheduler, Tick};
pub use source::{DirectoryResources, MemoryResources, ResourceSource};
pub use state::LoadState;
pub use task::LoadTask;

/// Prelude - commonly used types
pub mod prelude {
    pub use crate::config::{ByteLoadConfig, MissingResourcePolicy, ResourceMatch};
    pub use crate::decoder::{DecodeContext, FnDecoder, ModelDecoder};
    pub use crate::error::{DecodeError, DecodeResult};
    pub use crate::loader::{ByteLoad, ByteLoader};
    pub use crate::registry::LoaderRegistry;
    pub use crate::scheduler::{ByteLoadScheduler, Tick};
    pub use crate::source::ResourceSource;
    pub use crate::state::LoadState;
}
