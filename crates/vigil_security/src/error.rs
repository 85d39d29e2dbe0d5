//! # Error Types
//!
//! Everything that can fail outside the event path. Event handlers never
//! return errors: they no-op, suppress, or log and skip.

use std::path::PathBuf;

use thiserror::Error;
use vigil_core::UnknownMaterial;

/// Errors raised while loading configuration or scenarios, or rendering
/// enforcement commands.
#[derive(Error, Debug)]
pub enum VigilError {
    /// Configuration or scenario text is not valid TOML for the expected shape.
    #[error("invalid TOML: {0}")]
    Toml(#[from] toml::de::Error),

    /// A file could not be read.
    #[error("failed to read {path}: {source}")]
    Io {
        /// File that failed.
        path: PathBuf,
        /// Underlying error.
        source: std::io::Error,
    },

    /// An enforcement command template could not be rendered.
    #[error("malformed command template {template:?} at byte {position}: {problem}")]
    MalformedTemplate {
        /// The template text.
        template: String,
        /// Byte offset of the problem.
        position: usize,
        /// What is wrong.
        problem: &'static str,
    },

    /// A material name did not resolve.
    #[error(transparent)]
    UnknownMaterial(#[from] UnknownMaterial),

    /// A configuration value is out of range.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for fallible Vigil operations.
pub type VigilResult<T> = Result<T, VigilError>;
