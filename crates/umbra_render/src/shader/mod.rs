//! Effect, technique and program resolution.
//!
//! - [`ShaderManager`]: the two-level effect/program cache
//! - [`build_pipeline_state`]: per-pass state overrides
//! - [`HotloadTracker`]: file → program dependencies for in-place reload
//! - [`FileWatcher`]: disk change notifications (`watch` feature)

pub mod cache_key;
pub mod capabilities;
mod effect_loader;
pub mod hotload;
pub mod manager;
pub mod pass_state;
pub mod preprocessor;
pub mod program;
mod program_loader;
pub mod schema;
pub mod technique;
#[cfg(feature = "watch")]
pub mod watcher;

pub use cache_key::{EffectCacheKey, ProgramCacheKey};
pub use capabilities::{ProgramFlavor, RenderCapabilities, StaticCapabilities};
pub use hotload::HotloadTracker;
pub use manager::ShaderManager;
pub use pass_state::build_pipeline_state;
pub use preprocessor::Preprocessor;
pub use program::{
    ProgramDesc, ProgramFactory, ProgramPtr, ShaderProgram, SourceProgram, SourceProgramFactory,
    StreamFlags, TextureKind, attrib_location,
};
pub use schema::{ElementRule, Schema};
pub use technique::{ShaderPass, ShaderTechnique, TechniquePtr};
#[cfg(feature = "watch")]
pub use watcher::FileWatcher;
