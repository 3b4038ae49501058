//! Error type shared by every engine operation

use rusqlite::ffi::ErrorCode;
use thiserror::Error;

/// Errors surfaced by the gamification engine.
///
/// `NotFound` and `InvalidInput` are terminal for the call. `ConflictRetryable`
/// is produced when SQLite reports the database busy or locked; the
/// transaction runner retries those internally and only surfaces the variant
/// once its retry budget is spent.
#[derive(Debug, Error)]
pub enum EngineError {
    #[error("{entity} not found: {id}")]
    NotFound { entity: &'static str, id: String },

    #[error("invalid input: {0}")]
    InvalidInput(String),

    #[error("write conflict not resolved after {attempts} attempt(s)")]
    ConflictRetryable { attempts: u32 },

    #[error("storage unavailable: {0}")]
    StorageUnavailable(#[source] rusqlite::Error),

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("TOML error: {0}")]
    Toml(#[from] toml::de::Error),
}

pub type EngineResult<T> = Result<T, EngineError>;

impl EngineError {
    pub fn not_found(entity: &'static str, id: impl ToString) -> Self {
        Self::NotFound {
            entity,
            id: id.to_string(),
        }
    }

    pub fn invalid(msg: impl Into<String>) -> Self {
        Self::InvalidInput(msg.into())
    }

    /// Whether retrying the whole operation may succeed
    pub fn is_retryable(&self) -> bool {
        matches!(self, Self::ConflictRetryable { .. })
    }

    /// Whether the caller is at fault (4xx-equivalent)
    pub fn is_client_error(&self) -> bool {
        matches!(
            self,
            Self::NotFound { .. } | Self::InvalidInput(_) | Self::Json(_) | Self::Toml(_)
        )
    }

    /// Short machine-readable kind used in API error bodies
    pub fn kind(&self) -> &'static str {
        match self {
            Self::NotFound { .. } => "not_found",
            Self::InvalidInput(_) | Self::Json(_) | Self::Toml(_) => "invalid_input",
            Self::ConflictRetryable { .. } => "conflict",
            Self::StorageUnavailable(_) | Self::Io(_) => "storage_unavailable",
        }
    }

    pub fn http_status(&self) -> u16 {
        match self {
            Self::NotFound { .. } => 404,
            Self::InvalidInput(_) | Self::Json(_) | Self::Toml(_) => 400,
            Self::ConflictRetryable { .. } => 503,
            Self::StorageUnavailable(_) | Self::Io(_) => 500,
        }
    }
}

impl From<rusqlite::Error> for EngineError {
    fn from(err: rusqlite::Error) -> Self {
        match err.sqlite_error_code() {
            Some(ErrorCode::DatabaseBusy | ErrorCode::DatabaseLocked) => {
                Self::ConflictRetryable { attempts: 1 }
            }
            _ => Self::StorageUnavailable(err),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn sqlite_failure(code: i32) -> rusqlite::Error {
        rusqlite::Error::SqliteFailure(rusqlite::ffi::Error::new(code), None)
    }

    #[test]
    fn test_busy_maps_to_conflict() {
        let err: EngineError = sqlite_failure(rusqlite::ffi::SQLITE_BUSY).into();
        assert!(err.is_retryable());
        assert_eq!(err.http_status(), 503);

        let err: EngineError = sqlite_failure(rusqlite::ffi::SQLITE_LOCKED).into();
        assert!(err.is_retryable());
    }

    #[test]
    fn test_other_sqlite_errors_are_storage_failures() {
        let err: EngineError = sqlite_failure(rusqlite::ffi::SQLITE_CORRUPT).into();
        assert!(matches!(err, EngineError::StorageUnavailable(_)));
        assert!(!err.is_client_error());
        assert_eq!(err.kind(), "storage_unavailable");
    }

    #[test]
    fn test_client_errors() {
        let err = EngineError::not_found("quiz", 42);
        assert_eq!(err.to_string(), "quiz not found: 42");
        assert!(err.is_client_error());
        assert_eq!(err.http_status(), 404);

        let err = EngineError::invalid("quiz score must be within 0..=100");
        assert!(err.is_client_error());
        assert_eq!(err.http_status(), 400);
    }
}
