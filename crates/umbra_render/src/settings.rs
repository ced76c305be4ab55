//! Shader Manager Settings
//!
//! Where documents live in the virtual filesystem and how strictly program
//! documents are checked.
//!
//! # Quick Start
//!
//! ```rust,ignore
//! use umbra::render::ShaderSettings;
//!
//! // Default layout: `shaders/*.json` programs, `shaders/effects/*.json` effects
//! let settings = ShaderSettings::default();
//!
//! // Project-specific layout, no grammar check
//! let settings = ShaderSettings {
//!     shader_root: "data/shaders".to_string(),
//!     validate_programs: false,
//!     ..Default::default()
//! };
//! ```

use serde::{Deserialize, Serialize};
use umbra_core::errors::{Result, ShaderError};
use umbra_core::vfs::VfsPath;

/// Configuration of a [`ShaderManager`](crate::shader::ShaderManager).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShaderSettings {
    /// VFS directory holding program documents and stage sources.
    pub shader_root: String,
    /// Sub-directory of `shader_root` holding effect documents.
    pub effects_dir: String,
    /// Extension of effect and program documents, without the dot.
    pub document_extension: String,
    /// Check program documents against the program grammar before use.
    pub validate_programs: bool,
    /// Grammar replacing the built-in program grammar.
    ///
    /// When the file is missing or malformed the built-in grammar is used.
    pub program_schema: Option<String>,
}

impl Default for ShaderSettings {
    fn default() -> Self {
        Self {
            shader_root: "shaders".to_string(),
            effects_dir: "effects".to_string(),
            document_extension: "json".to_string(),
            validate_programs: true,
            program_schema: Some("shaders/program.schema.json".to_string()),
        }
    }
}

impl ShaderSettings {
    /// Parses settings from JSON. Missing fields keep their defaults.
    pub fn from_json(text: &str) -> Result<Self> {
        serde_json::from_str(text).map_err(|e| ShaderError::DocumentParse {
            path: "<settings>".to_string(),
            reason: e.to_string(),
        })
    }

    /// Document path of program `name`.
    #[must_use]
    pub fn program_path(&self, name: &str) -> VfsPath {
        VfsPath::new(&self.shader_root).join(&format!("{name}.{}", self.document_extension))
    }

    /// Document path of effect `name`.
    #[must_use]
    pub fn effect_path(&self, name: &str) -> VfsPath {
        VfsPath::new(&self.shader_root)
            .join(&self.effects_dir)
            .join(&format!("{name}.{}", self.document_extension))
    }

    /// Path of a stage source referenced from a program document.
    #[must_use]
    pub fn stage_path(&self, file: &str) -> VfsPath {
        VfsPath::new(&self.shader_root).join(file)
    }
}
