//! # Render Error Types
//!
//! Configuration errors surfaced to callers. Data anomalies inside a frame
//! (unsupported attachment kinds, fully clipped geometry) are not errors;
//! they contribute nothing to the frame.

use thiserror::Error;

/// Errors that can occur while configuring a skeleton renderable.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum RenderError {
    /// A slot name did not resolve against the skeleton.
    #[error("slot not found: {0}")]
    SlotNotFound(String),

    /// A bone name did not resolve against the skeleton.
    #[error("bone not found: {0}")]
    BoneNotFound(String),

    /// Invalid configuration file.
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
}

/// Result type for render operations.
pub type RenderResult<T> = Result<T, RenderError>;
