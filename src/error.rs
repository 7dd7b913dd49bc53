//! Error handling for the cxgui applications
//!
//! This module defines the custom error type and a Result alias used
//! throughout the crate.

use thiserror::Error;

/// Main error type for cxgui operations
#[derive(Error, Debug)]
pub enum CxError {
    /// The executable does not exist or the OS refused to spawn it
    #[error("Failed to launch {program}: {message}")]
    Launch { program: String, message: String },

    /// A precondition for a user-requested action was not met
    #[error("Precondition failed: {0}")]
    Precondition(String),

    /// A pipeline stage exited abnormally or with a nonzero code
    #[error("Stage '{stage}' failed: {message}")]
    Stage { stage: String, message: String },

    /// Errors related to configuration loading/saving
    #[error("Configuration error: {0}")]
    Config(String),

    /// Errors related to channel communication
    #[error("Channel error: {0}")]
    Channel(String),

    /// IO errors
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),
}

impl CxError {
    /// Create a launch error for a program path
    pub fn launch(program: impl Into<String>, message: impl Into<String>) -> Self {
        CxError::Launch {
            program: program.into(),
            message: message.into(),
        }
    }

    /// Create a stage failure for a named pipeline stage
    pub fn stage(stage: impl Into<String>, message: impl Into<String>) -> Self {
        CxError::Stage {
            stage: stage.into(),
            message: message.into(),
        }
    }
}

/// Result type alias for cxgui operations
pub type Result<T> = std::result::Result<T, CxError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_launch_error_display() {
        let err = CxError::launch("/opt/ffmpeg", "No such file or directory");
        assert_eq!(
            err.to_string(),
            "Failed to launch /opt/ffmpeg: No such file or directory"
        );
    }

    #[test]
    fn test_stage_error_display() {
        let err = CxError::stage("decode", "exited with code 1");
        assert!(err.to_string().contains("decode"));
        assert!(err.to_string().contains("code 1"));
    }

    #[test]
    fn test_precondition_display() {
        let err = CxError::Precondition("input file does not exist".to_string());
        assert!(err.to_string().starts_with("Precondition failed"));
    }
}
