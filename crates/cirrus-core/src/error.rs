//! Error taxonomy shared by every Cirrus backend.

use thiserror::Error;

/// Result type alias for backend operations.
pub type CloudResult<T> = Result<T, CloudError>;

/// Errors that can be raised by a backend operation.
///
/// Every error is terminal for the operation that raised it. Translating a
/// variant into a protocol-level error code is left to the caller.
#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum CloudError {
    #[error("{resource} already exists: {name}")]
    AlreadyExists { resource: &'static str, name: String },

    #[error("{resource} not found: {id}")]
    NotFound { resource: &'static str, id: String },

    #[error("version {version} of {resource} {id} not found")]
    VersionNotFound {
        resource: &'static str,
        id: String,
        version: String,
    },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("cannot {action} {resource} {name} while it is {state}")]
    InvalidState {
        resource: &'static str,
        name: String,
        state: String,
        action: &'static str,
    },

    #[error("{context} (ErrorDetails: [{}])", .details.join(", "))]
    ValidationAggregate {
        context: String,
        details: Vec<String>,
    },

    #[error("limit exceeded: {0}")]
    LimitExceeded(String),
}

/// Field-less discriminant of [`CloudError`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ErrorKind {
    AlreadyExists,
    NotFound,
    VersionNotFound,
    InvalidInput,
    InvalidState,
    ValidationAggregate,
    LimitExceeded,
}

impl CloudError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            CloudError::AlreadyExists { .. } => ErrorKind::AlreadyExists,
            CloudError::NotFound { .. } => ErrorKind::NotFound,
            CloudError::VersionNotFound { .. } => ErrorKind::VersionNotFound,
            CloudError::InvalidInput(_) => ErrorKind::InvalidInput,
            CloudError::InvalidState { .. } => ErrorKind::InvalidState,
            CloudError::ValidationAggregate { .. } => ErrorKind::ValidationAggregate,
            CloudError::LimitExceeded(_) => ErrorKind::LimitExceeded,
        }
    }

    pub fn already_exists(resource: &'static str, name: impl Into<String>) -> Self {
        CloudError::AlreadyExists {
            resource,
            name: name.into(),
        }
    }

    pub fn not_found(resource: &'static str, id: impl Into<String>) -> Self {
        CloudError::NotFound {
            resource,
            id: id.into(),
        }
    }

    pub fn version_not_found(
        resource: &'static str,
        id: impl Into<String>,
        version: impl Into<String>,
    ) -> Self {
        CloudError::VersionNotFound {
            resource,
            id: id.into(),
            version: version.into(),
        }
    }

    pub fn invalid_input(message: impl Into<String>) -> Self {
        CloudError::InvalidInput(message.into())
    }
}
