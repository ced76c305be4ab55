//! # Umbra Core
//!
//! Foundational types shared by every Umbra crate:
//!
//! - [`interner`]: global string interning ([`Symbol`])
//! - [`errors`]: the [`ShaderError`] type and [`Result`] alias
//! - [`vfs`]: the virtual filesystem abstraction ([`Vfs`], [`VfsPath`])

pub mod errors;
pub mod interner;
pub mod vfs;

pub use errors::{Result, ShaderError};
pub use interner::Symbol;
pub use vfs::{DiskVfs, MemoryVfs, Vfs, VfsPath};
