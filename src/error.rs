//! Error types for the financial document analyzer

use std::path::PathBuf;
use thiserror::Error;

/// Result type alias for analyzer operations
pub type Result<T> = std::result::Result<T, AnalyzerError>;

#[derive(Error, Debug)]
pub enum AnalyzerError {

    // =============================
    // Document Errors
    // =============================

    #[error("Document unreadable ({}): {reason}", path.display())]
    DocumentUnreadable { path: PathBuf, reason: String },

    #[error("Document load timed out after {attempts} attempt(s): {}", path.display())]
    DocumentTimeout { path: PathBuf, attempts: u32 },

    // =============================
    // Configuration Errors
    // =============================

    #[error("Invalid agent config: {0}")]
    InvalidAgentConfig(String),

    #[error("Invalid task config: {0}")]
    InvalidTaskConfig(String),

    #[error("Invalid crew: {0}")]
    InvalidCrew(String),

    #[error("Configuration error: {0}")]
    ConfigError(String),

    // =============================
    // Pipeline Errors
    // =============================

    #[error("Tool error: {0}")]
    ToolError(String),

    #[error("Tool not found: {0}")]
    ToolNotFound(String),

    #[error("Invalid tool input: {0}")]
    InvalidToolInput(String),

    #[error("LLM error: {0}")]
    LlmError(String),

    #[error("Execution error: {0}")]
    ExecutionError(String),

    // =============================
    // External Library Conversions
    // =============================

    #[error("Serialization error: {0}")]
    SerializationError(#[from] serde_json::Error),

    #[error("HTTP client error: {0}")]
    HttpError(#[from] reqwest::Error),

    #[error("IO error: {0}")]
    IoError(#[from] std::io::Error),
}

impl AnalyzerError {
    pub(crate) fn unreadable(path: impl Into<PathBuf>, reason: impl ToString) -> Self {
        AnalyzerError::DocumentUnreadable {
            path: path.into(),
            reason: reason.to_string(),
        }
    }
}
