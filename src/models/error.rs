//! Error types for io2rlds.
//!
//! Epistemic taxonomy:
//! - B_i falsified: Expected failures (missing folder, bad file name, bad cell)
//! - I^B materialized: Infrastructure failures (I/O, decoder, archive)
//! - K_i violated: Internal invariant violations (bugs)

use std::path::PathBuf;
use thiserror::Error;

/// Top-level error type for io2rlds.
#[derive(Debug, Error)]
pub enum ConvertError {
    // ═══════════════════════════════════════════════════════════════════
    // B_i FALSIFIED — Belief proven wrong (expected failures)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Configuration error: {0}")]
    Config(#[from] super::ConfigError),

    #[error("Input folder not found: {0}")]
    InputNotFound(PathBuf),

    #[error("Input path is not a directory: {0}")]
    InputNotDirectory(PathBuf),

    #[error("Output folder not found: {0}")]
    OutputNotFound(PathBuf),

    #[error("Cannot derive frame index from file name '{file_name}': {reason}")]
    FrameIndex { file_name: String, reason: String },

    #[error("Unsupported pixel layout {layout} in {path}")]
    UnsupportedPixelLayout { path: PathBuf, layout: String },

    #[error(
        "Depth frame {path} has {actual} samples, cannot reshape to {expected:?}"
    )]
    DepthShape {
        path: PathBuf,
        expected: [usize; 3],
        actual: usize,
    },

    #[error("Column '{column}' not found in {path}")]
    MissingColumn { path: PathBuf, column: String },

    #[error("Invalid value '{value}' in {path} at row {row}, column '{column}'")]
    InvalidCell {
        path: PathBuf,
        row: usize,
        column: String,
        value: String,
    },

    #[error("Key '{key}' not found in {path}")]
    MissingKey { path: PathBuf, key: String },

    #[error("Invalid instruction file {path}: {reason}")]
    InvalidInstruction { path: PathBuf, reason: String },

    #[error("Parse error: {0}")]
    ParseError(String),

    // ═══════════════════════════════════════════════════════════════════
    // I^B MATERIALIZED — Bounded ignorance became known-bad
    // ═══════════════════════════════════════════════════════════════════

    #[error("IO error: {context}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to decode image {path}")]
    ImageDecode {
        path: PathBuf,
        #[source]
        source: image::ImageError,
    },

    #[error("Failed to read table {path}")]
    Table {
        path: PathBuf,
        #[source]
        source: csv::Error,
    },

    #[error("Failed to write episode archive {path}")]
    ArchiveWrite {
        path: PathBuf,
        #[source]
        source: ndarray_npy::WriteNpzError,
    },

    #[error("Failed to read episode archive {path}")]
    ArchiveRead {
        path: PathBuf,
        #[source]
        source: ndarray_npy::ReadNpzError,
    },

    // ═══════════════════════════════════════════════════════════════════
    // K_i VIOLATED — Invariant broken (bug, should not happen)
    // ═══════════════════════════════════════════════════════════════════

    #[error("Array shape error: {0}")]
    Shape(#[from] ndarray::ShapeError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl ConvertError {
    /// Create an IO error with context.
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    /// Create a frame index error for a file name.
    pub fn frame_index(file_name: impl Into<String>, reason: impl Into<String>) -> Self {
        Self::FrameIndex {
            file_name: file_name.into(),
            reason: reason.into(),
        }
    }

    /// Check if this error came from the input data rather than the environment.
    pub fn is_input_error(&self) -> bool {
        matches!(
            self,
            Self::FrameIndex { .. }
                | Self::UnsupportedPixelLayout { .. }
                | Self::DepthShape { .. }
                | Self::MissingColumn { .. }
                | Self::InvalidCell { .. }
                | Self::MissingKey { .. }
                | Self::InvalidInstruction { .. }
                | Self::ImageDecode { .. }
                | Self::Table { .. }
        )
    }
}

/// Result type alias for io2rlds.
pub type Result<T> = std::result::Result<T, ConvertError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_io_error_keeps_context() {
        let err = ConvertError::io(
            "reading rgb folder",
            std::io::Error::new(std::io::ErrorKind::NotFound, "gone"),
        );
        assert_eq!(err.to_string(), "IO error: reading rgb folder");
        assert!(std::error::Error::source(&err).is_some());
        assert!(!err.is_input_error());
    }

    #[test]
    fn test_input_errors_are_classified() {
        let err = ConvertError::frame_index("frame.png", "needs at least two '_' segments");
        assert!(err.is_input_error());
        assert!(err.to_string().contains("frame.png"));
    }
}
