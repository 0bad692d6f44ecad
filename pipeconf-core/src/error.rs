use thiserror::Error;

#[derive(Error, Debug)]
pub enum PipeconfError {
    #[error("Template error: {0}")]
    Template(#[from] TemplateError),

    #[error("Unsupported server type: {0}")]
    UnsupportedBackend(String),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Invalid request: {0}")]
    InvalidRequest(String),

    /// Endpoint or HTTP client settings that can never work
    #[error("Invalid configuration: {0}")]
    InvalidConfiguration(String),
}

impl PipeconfError {
    /// Errors that mean "the override directory could not be read" rather
    /// than an operator mistake. Callers answer these with "no override".
    pub fn is_no_override(&self) -> bool {
        matches!(self, PipeconfError::Fetch(_))
    }
}

/// Failure to parse or evaluate one of the coordinate templates.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum TemplateError {
    #[error("parse template {template:?}: {message}")]
    Parse { template: String, message: String },

    #[error("execute template {template:?}: unknown field {field:?}")]
    UnknownField { template: String, field: String },
}

/// Failure while talking to a Git-hosting backend.
#[derive(Error, Debug)]
pub enum FetchError {
    #[error("Directory not found: {0}")]
    DirectoryNotFound(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("Authentication failed: {0}")]
    Unauthorized(String),

    #[error("Backend unreachable: {0}")]
    Unreachable(String),

    #[error("Backend returned {status}: {message}")]
    Api { status: u16, message: String },

    #[error("Invalid response: {0}")]
    InvalidResponse(String),

    #[error("Decode error: {0}")]
    Decode(String),

    #[error("HTTP client error: {0}")]
    Client(String),
}

pub type Result<T> = std::result::Result<T, PipeconfError>;
