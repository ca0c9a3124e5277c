//! Error taxonomy for the deployment engine.

use autodeploy_state::StorageError;

/// A project declaration that failed validation.
///
/// These are scoped to one project: the batch logs them and moves on.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum DeclarationError {
    #[error("project '{project}' is missing required field '{field}'")]
    MissingField {
        project: String,
        field: &'static str,
    },

    #[error("project '{project}' declares unrecognized runtime '{value}'")]
    UnrecognizedRuntime { project: String, value: String },

    #[error("project '{name}' is declared more than once")]
    DuplicateProject { name: String },
}

impl DeclarationError {
    /// Name of the project the error belongs to.
    pub fn project(&self) -> &str {
        match self {
            DeclarationError::MissingField { project, .. } => project,
            DeclarationError::UnrecognizedRuntime { project, .. } => project,
            DeclarationError::DuplicateProject { name } => name,
        }
    }
}

/// Autodeploy engine errors.
#[derive(Debug, thiserror::Error)]
pub enum DeployError {
    #[error("configuration error: {0}")]
    Config(String),

    #[error("invalid declaration: {0}")]
    Declaration(#[from] DeclarationError),

    #[error("storage error: {0}")]
    Storage(#[from] StorageError),

    #[error("notification error: {0}")]
    Notify(String),

    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),

    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for engine operations.
pub type Result<T> = std::result::Result<T, DeployError>;
