//! # Umbra Render
//!
//! Resolves declarative effect and program documents into cached techniques,
//! passes and shader programs, and keeps programs in sync with their source
//! files.
//!
//! ```rust,ignore
//! use std::sync::Arc;
//! use umbra_core::DiskVfs;
//! use umbra_render::{ShaderManager, ShaderSettings, StaticCapabilities};
//! use umbra_resources::DefineSet;
//!
//! let mut shaders = ShaderManager::new(
//!     Arc::new(DiskVfs::new("data")),
//!     Arc::new(StaticCapabilities::default()),
//!     ShaderSettings::default(),
//! );
//! let technique = shaders.load_effect("model", &DefineSet::from([("USE_SHADOW", "1")]))?;
//! for pass in technique.passes() {
//!     // bind pass.pipeline_state and pass.program()
//! }
//! ```

pub mod settings;
pub mod shader;

pub use settings::ShaderSettings;
pub use shader::{
    ProgramFlavor, ProgramPtr, RenderCapabilities, ShaderManager, ShaderPass, ShaderProgram,
    ShaderTechnique, StaticCapabilities, TechniquePtr,
};
#[cfg(feature = "watch")]
pub use shader::FileWatcher;
