use axum::http::StatusCode;
use thiserror::Error;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("not logged in")]
    NotLoggedIn,
    #[error("invalid username or password")]
    InvalidCredentials,
    #[error("permission denied: {0}")]
    PermissionDenied(String),
    #[error("{0} not found")]
    NotFound(String),
    #[error("{0}")]
    Validation(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("invalid state: {0}")]
    InvalidState(String),
    #[error("{0}")]
    Duplicate(String),
    #[error("storage failure: {0}")]
    Storage(#[from] StoreError),
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("io error: {0}")]
    Io(#[from] std::io::Error),
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
    #[error("password hashing failed: {0}")]
    Hashing(String),
}

impl AppError {
    pub fn not_found(what: impl Into<String>) -> Self {
        Self::NotFound(what.into())
    }

    pub fn validation(message: impl Into<String>) -> Self {
        Self::Validation(message.into())
    }

    pub fn permission_denied(message: impl Into<String>) -> Self {
        Self::PermissionDenied(message.into())
    }

    pub fn status(&self) -> StatusCode {
        match self {
            Self::NotLoggedIn | Self::InvalidCredentials => StatusCode::UNAUTHORIZED,
            Self::PermissionDenied(_) => StatusCode::FORBIDDEN,
            Self::NotFound(_) => StatusCode::NOT_FOUND,
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::Conflict(_) | Self::InvalidState(_) | Self::Duplicate(_) => StatusCode::CONFLICT,
            Self::Storage(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl axum::response::IntoResponse for AppError {
    fn into_response(self) -> axum::response::Response {
        if let Self::Storage(err) = &self {
            tracing::error!("request failed on storage: {err}");
        }
        (self.status(), self.to_string()).into_response()
    }
}

pub fn require(value: &str, field: &str) -> Result<(), AppError> {
    if value.trim().is_empty() {
        return Err(AppError::validation(format!("{field} is required")));
    }
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case(AppError::NotLoggedIn, StatusCode::UNAUTHORIZED)]
    #[case(AppError::permission_denied("parents only"), StatusCode::FORBIDDEN)]
    #[case(AppError::not_found("pet"), StatusCode::NOT_FOUND)]
    #[case(AppError::validation("pet id is required"), StatusCode::BAD_REQUEST)]
    #[case(AppError::Conflict("ledger".into()), StatusCode::CONFLICT)]
    fn errors_map_to_status(#[case] err: AppError, #[case] expected: StatusCode) {
        assert_eq!(err.status(), expected);
    }

    #[test]
    fn require_rejects_blank_values() {
        let err = require("   ", "pet id").unwrap_err();
        assert_eq!(err.to_string(), "pet id is required");
        assert!(require("rex", "pet id").is_ok());
    }
}
