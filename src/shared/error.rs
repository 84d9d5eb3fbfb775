use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Validation error: {0}")]
    ValidationError(String),

    #[error("Conflict: {0}")]
    Conflict(String),

    #[error("Forbidden: {0}")]
    Forbidden(String),

    #[error("Invalid state: {0}")]
    InvalidState(String),

    #[error("Database error: {0}")]
    Database(String),

    #[error("Delivery error: {0}")]
    Delivery(String),

    #[error("Configuration error: {0}")]
    ConfigurationError(String),

    #[error("Serialization error: {0}")]
    SerializationError(String),
}

impl AppError {
    pub fn not_found(message: impl Into<String>) -> Self {
        AppError::NotFound(message.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        AppError::ValidationError(message.into())
    }

    pub fn conflict(message: impl Into<String>) -> Self {
        AppError::Conflict(message.into())
    }

    pub fn forbidden(message: impl Into<String>) -> Self {
        AppError::Forbidden(message.into())
    }

    pub fn invalid_state(message: impl Into<String>) -> Self {
        AppError::InvalidState(message.into())
    }

    pub fn configuration(message: impl Into<String>) -> Self {
        AppError::ConfigurationError(message.into())
    }

    /// 呼び出し側（HTTP 層など）がステータスへ写像するための安定コード。
    pub fn code(&self) -> &'static str {
        match self {
            AppError::NotFound(_) => "NOT_FOUND",
            AppError::ValidationError(_) => "VALIDATION",
            AppError::Conflict(_) => "CONFLICT",
            AppError::Forbidden(_) => "FORBIDDEN",
            AppError::InvalidState(_) => "INVALID_STATE",
            AppError::Database(_) => "DATABASE",
            AppError::Delivery(_) => "DELIVERY",
            AppError::ConfigurationError(_) => "CONFIGURATION",
            AppError::SerializationError(_) => "SERIALIZATION",
        }
    }

    /// Domain failures are detected before any mutation and map to a client error.
    pub fn is_domain_failure(&self) -> bool {
        matches!(
            self,
            AppError::NotFound(_)
                | AppError::ValidationError(_)
                | AppError::Conflict(_)
                | AppError::Forbidden(_)
                | AppError::InvalidState(_)
        )
    }
}

impl From<sqlx::Error> for AppError {
    fn from(err: sqlx::Error) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<sqlx::migrate::MigrateError> for AppError {
    fn from(err: sqlx::migrate::MigrateError) -> Self {
        AppError::Database(err.to_string())
    }
}

impl From<serde_json::Error> for AppError {
    fn from(err: serde_json::Error) -> Self {
        AppError::SerializationError(err.to_string())
    }
}

pub type Result<T> = std::result::Result<T, AppError>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_follow_taxonomy() {
        assert_eq!(AppError::not_found("user").code(), "NOT_FOUND");
        assert_eq!(AppError::validation("self").code(), "VALIDATION");
        assert_eq!(AppError::conflict("dup").code(), "CONFLICT");
        assert_eq!(AppError::forbidden("quota").code(), "FORBIDDEN");
        assert_eq!(AppError::invalid_state("accepted").code(), "INVALID_STATE");
        assert_eq!(AppError::configuration("url").code(), "CONFIGURATION");
    }

    #[test]
    fn infrastructure_errors_are_not_domain_failures() {
        assert!(AppError::forbidden("x").is_domain_failure());
        assert!(!AppError::Database("locked".into()).is_domain_failure());
        assert!(!AppError::Delivery("closed".into()).is_domain_failure());
    }
}
