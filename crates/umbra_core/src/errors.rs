//! Error Types
//!
//! This module defines the error type shared by every Umbra crate.
//!
//! # Overview
//!
//! [`ShaderError`] covers every way an effect or program resolution can fail:
//! - Document loading and parsing failures
//! - Schema validation failures
//! - Authoring errors (unrecognized tokens in markup)
//! - Technique selection failures
//!
//! Resolution results are memoized together with their failures, so the
//! error type is `Clone` and carries its context as owned strings.
//!
//! # Usage
//!
//! ```rust,ignore
//! use umbra_core::errors::{Result, ShaderError};
//!
//! fn load() -> Result<()> {
//!     Err(ShaderError::Authoring("bad semantics".into()))
//! }
//! ```

use thiserror::Error;

/// The main error type for Umbra.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ShaderError {
    // ========================================================================
    // Document Errors
    // ========================================================================
    /// A document could not be read from the virtual filesystem.
    #[error("Failed to load document '{path}': {reason}")]
    DocumentLoad {
        /// VFS path of the document
        path: String,
        /// Underlying I/O failure
        reason: String,
    },

    /// A document was read but is not a well-formed markup tree.
    #[error("Failed to parse document '{path}': {reason}")]
    DocumentParse {
        /// VFS path of the document
        path: String,
        /// Parser diagnostic
        reason: String,
    },

    /// A program document does not conform to its grammar.
    #[error("Validation of '{name}' failed: {reason}")]
    Validation {
        /// Program name
        name: String,
        /// First grammar violation found
        reason: String,
    },

    // ========================================================================
    // Authoring Errors
    // ========================================================================
    /// The markup uses a construct the engine does not recognize.
    #[error("Authoring error: {0}")]
    Authoring(String),

    /// An enumeration token could not be parsed.
    #[error("Invalid {kind} token '{token}'")]
    InvalidToken {
        /// Human readable name of the expected enumeration
        kind: &'static str,
        /// The offending token
        token: String,
    },

    /// A conditional expression could not be evaluated.
    #[error("Failed to evaluate condition '{expression}': {reason}")]
    Condition {
        /// The expression as written in markup
        expression: String,
        /// Evaluator diagnostic
        reason: String,
    },

    // ========================================================================
    // Resolution Errors
    // ========================================================================
    /// Every candidate technique of an effect failed its predicates.
    #[error("Can't find a usable technique for effect '{effect}'")]
    NoUsableTechnique {
        /// Effect name
        effect: String,
    },

    /// A shader program could not be constructed.
    #[error("Failed to load shader '{name}': {reason}")]
    Program {
        /// Program name
        name: String,
        /// Cause of the failure
        reason: String,
    },

    /// A pass of an effect references a program that failed to resolve.
    #[error("Pass {index} of effect '{effect}' failed: {source}")]
    Pass {
        /// Effect name
        effect: String,
        /// Zero-based pass index
        index: usize,
        /// The program failure
        source: Box<ShaderError>,
    },

    /// The engine-wide default pipeline state was already fixed.
    #[error("Default pipeline state is already initialized")]
    DefaultStateAlreadySet,

    // ========================================================================
    // I/O Errors
    // ========================================================================
    /// File I/O error.
    #[error("IO error: {0}")]
    Io(String),

    /// The file watcher could not be set up.
    #[error("File watch error: {0}")]
    Watch(String),
}

impl From<std::io::Error> for ShaderError {
    fn from(err: std::io::Error) -> Self {
        ShaderError::Io(err.to_string())
    }
}

/// Alias for `Result<T, ShaderError>`.
pub type Result<T> = std::result::Result<T, ShaderError>;
