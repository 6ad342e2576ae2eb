//! Graphics error types.

use std::fmt;

use crate::backend::ShaderStage;

/// Errors that can occur in the graphics system.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum GraphicsError {
    /// Failed to initialize the graphics system.
    InitializationFailed(String),
    /// Failed to create a resource.
    ResourceCreationFailed(String),
    /// A shader stage failed to compile. Carries the compiler info log.
    ShaderCompilationFailed {
        /// Stage that failed.
        stage: ShaderStage,
        /// Compiler output.
        log: String,
    },
    /// A program failed to link. Carries the linker info log.
    ProgramLinkFailed(String),
    /// A requested feature is not supported.
    FeatureNotSupported(String),
    /// An invalid parameter was provided.
    InvalidParameter(String),
    /// An internal error occurred.
    Internal(String),
}

impl fmt::Display for GraphicsError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::InitializationFailed(msg) => write!(f, "initialization failed: {msg}"),
            Self::ResourceCreationFailed(msg) => write!(f, "resource creation failed: {msg}"),
            Self::ShaderCompilationFailed { stage, log } => {
                write!(f, "{stage:?} shader compilation failed: {log}")
            }
            Self::ProgramLinkFailed(log) => write!(f, "program link failed: {log}"),
            Self::FeatureNotSupported(msg) => write!(f, "feature not supported: {msg}"),
            Self::InvalidParameter(msg) => write!(f, "invalid parameter: {msg}"),
            Self::Internal(msg) => write!(f, "internal error: {msg}"),
        }
    }
}

impl std::error::Error for GraphicsError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_error_display() {
        let err = GraphicsError::ProgramLinkFailed("varying mismatch".to_string());
        assert_eq!(err.to_string(), "program link failed: varying mismatch");

        let err = GraphicsError::ShaderCompilationFailed {
            stage: ShaderStage::Fragment,
            log: "0:1: syntax error".to_string(),
        };
        assert_eq!(
            err.to_string(),
            "Fragment shader compilation failed: 0:1: syntax error"
        );
    }
}
