//! Error kinds surfaced by the image pipeline and its collaborators.

use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipelineError {
    /// Load or capture produced no usable pixel data.
    #[error("Could not decode image from {source_label}: {reason}")]
    DecodeFailure { source_label: String, reason: String },
    #[error("No image loaded")]
    NoImageLoaded,
    #[error("Invalid argument: {0}")]
    InvalidArgument(String),
    #[error("Could not save image to {}: {reason}", path.display())]
    EncodeFailure { path: PathBuf, reason: String },
}

impl PipelineError {
    pub fn decode(source_label: impl Into<String>, reason: impl ToString) -> Self {
        PipelineError::DecodeFailure {
            source_label: source_label.into(),
            reason: reason.to_string(),
        }
    }

    pub fn encode(path: &std::path::Path, reason: impl ToString) -> Self {
        PipelineError::EncodeFailure {
            path: path.to_path_buf(),
            reason: reason.to_string(),
        }
    }
}

pub type PipelineResult<T> = Result<T, PipelineError>;
