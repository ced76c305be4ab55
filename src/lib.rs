//! # Umbra
//!
//! Declarative shader effects resolved into cached techniques and programs,
//! kept in sync with their source files at runtime.
//!
//! - [`core`]: interning, errors and the virtual filesystem
//! - [`resources`]: define sets, pipeline state and markup documents
//! - [`render`]: the [`ShaderManager`] and everything it resolves

pub use umbra_core as core;
pub use umbra_render as render;
pub use umbra_resources as resources;

pub use umbra_core::{DiskVfs, MemoryVfs, Result, ShaderError, Vfs, VfsPath};
pub use umbra_render::{
    ProgramFlavor, ProgramPtr, RenderCapabilities, ShaderManager, ShaderPass, ShaderProgram,
    ShaderSettings, ShaderTechnique, StaticCapabilities, TechniquePtr,
};
#[cfg(feature = "watch")]
pub use umbra_render::FileWatcher;
pub use umbra_resources::{
    DefineSet, Element, GraphicsPipelineStateDesc, default_pipeline_state,
    set_default_pipeline_state,
};
