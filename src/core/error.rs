use serde::Serialize;
use thiserror::Error;

/// Errors surfaced by every top-level operation.
///
/// The enum is `Clone` because a single batch outcome is handed to every
/// caller waiting on a key of that batch.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum DomainError {
    #[error("access to this resource is denied")]
    AccessDenied,

    #[error("{collection} '{id}' was not found")]
    NotFound { collection: String, id: String },

    #[error("no customer found for order '{0}'")]
    ReferentialPrecondition(String),

    #[error("storage error: {message}")]
    StorageFailure { message: String, retryable: bool },

    #[error("invalid identifier: '{0}'")]
    InvalidIdentifier(String),
}

impl DomainError {
    pub fn not_found(collection: impl Into<String>, id: impl ToString) -> Self {
        Self::NotFound {
            collection: collection.into(),
            id: id.to_string(),
        }
    }

    pub fn storage(message: impl Into<String>) -> Self {
        Self::StorageFailure {
            message: message.into(),
            retryable: false,
        }
    }

    /// A write-write conflict detected at commit. Callers may retry.
    pub fn conflict(message: impl Into<String>) -> Self {
        Self::StorageFailure {
            message: message.into(),
            retryable: true,
        }
    }

    pub fn invalid_identifier(raw: impl Into<String>) -> Self {
        Self::InvalidIdentifier(raw.into())
    }

    pub fn code(&self) -> ErrorCode {
        match self {
            Self::AccessDenied => ErrorCode::AccessDenied,
            Self::NotFound { .. } => ErrorCode::ModelNotFound,
            Self::ReferentialPrecondition(_) => ErrorCode::NoCustomerForOrder,
            Self::StorageFailure { .. } => ErrorCode::Unknown,
            Self::InvalidIdentifier(_) => ErrorCode::IdRequired,
        }
    }

    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::StorageFailure { retryable: true, .. })
    }

    /// Structured form handed to the query layer. Internal storage messages
    /// never leave the crate; the caller only sees the stable code text.
    pub fn payload(&self) -> ErrorPayload {
        let code = self.code();
        ErrorPayload {
            code,
            message: code.message().to_string(),
            retryable: self.is_retryable(),
        }
    }
}

/// Stable error codes exposed to callers.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
pub enum ErrorCode {
    #[serde(rename = "2003")]
    Unknown,
    #[serde(rename = "4001")]
    AccessDenied,
    #[serde(rename = "5001")]
    IdRequired,
    #[serde(rename = "7001")]
    ModelNotFound,
    #[serde(rename = "7002")]
    NoCustomerForOrder,
}

impl ErrorCode {
    pub fn as_str(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "2003",
            ErrorCode::AccessDenied => "4001",
            ErrorCode::IdRequired => "5001",
            ErrorCode::ModelNotFound => "7001",
            ErrorCode::NoCustomerForOrder => "7002",
        }
    }

    pub fn message(&self) -> &'static str {
        match self {
            ErrorCode::Unknown => "UNKNOWN ERROR",
            ErrorCode::AccessDenied => "ACCESS TO THIS RESOURCE IS DENIED",
            ErrorCode::IdRequired => "ID IS REQUIRED",
            ErrorCode::ModelNotFound => "MODEL WAS NOT FOUND",
            ErrorCode::NoCustomerForOrder => "NO CUSTOMER WAS FOUND FOR ORDER",
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct ErrorPayload {
    pub code: ErrorCode,
    pub message: String,
    pub retryable: bool,
}

pub type Result<T> = std::result::Result<T, DomainError>;

impl<T> From<std::sync::PoisonError<T>> for DomainError {
    fn from(err: std::sync::PoisonError<T>) -> Self {
        Self::storage(format!("lock poisoned: {err}"))
    }
}

impl From<serde_json::Error> for DomainError {
    fn from(err: serde_json::Error) -> Self {
        Self::storage(format!("document codec: {err}"))
    }
}
