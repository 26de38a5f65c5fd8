use crate::cache::CacheError;
use axum::{
    http::StatusCode,
    response::{IntoResponse, Json, Response},
};
use serde_json::json;
use thiserror::Error;

/// Errors surfaced by the connector. The OAuth flow errors all map to a
/// client error (400) with a human-readable detail string; infrastructure
/// failures map to 500.
#[derive(Error, Debug)]
pub enum AppError {
    #[error("{0}")]
    ProviderDenied(String),
    #[error("Invalid state token")]
    InvalidState,
    #[error("State does not match")]
    StateMismatch,
    #[error("Failed to get tokens from HubSpot: {0}")]
    TokenExchangeFailed(String),
    #[error("No credentials found")]
    CredentialsNotFound,
    #[error("Failed to fetch contacts from HubSpot: {0}")]
    FetchFailed(String),
    #[error("{0}")]
    BadRequest(String),
    #[error("Configuration error: {0}")]
    Config(#[from] config::ConfigError),
    #[error("Cache error: {0}")]
    Cache(#[from] CacheError),
    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::ProviderDenied(_)
            | AppError::InvalidState
            | AppError::StateMismatch
            | AppError::TokenExchangeFailed(_)
            | AppError::CredentialsNotFound
            | AppError::FetchFailed(_)
            | AppError::BadRequest(_) => StatusCode::BAD_REQUEST,
            AppError::Config(_) | AppError::Cache(_) | AppError::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        // The frontend reads the failure message from the "detail" field
        let body = Json(json!({
            "detail": self.to_string()
        }));

        (status, body).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_flow_errors_are_client_errors() {
        for err in [
            AppError::ProviderDenied("access_denied".to_string()),
            AppError::InvalidState,
            AppError::StateMismatch,
            AppError::TokenExchangeFailed("status 403".to_string()),
            AppError::CredentialsNotFound,
            AppError::FetchFailed("status 401".to_string()),
        ] {
            assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);
        }
    }

    #[test]
    fn test_infrastructure_errors_are_server_errors() {
        let cache_err = AppError::Cache(CacheError::Connection("refused".to_string()));
        assert_eq!(cache_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let internal_err = AppError::Internal("boom".to_string());
        assert_eq!(internal_err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_app_error_display() {
        assert_eq!(
            AppError::StateMismatch.to_string(),
            "State does not match"
        );
        assert_eq!(
            AppError::CredentialsNotFound.to_string(),
            "No credentials found"
        );
        assert_eq!(
            AppError::ProviderDenied("user declined".to_string()).to_string(),
            "user declined"
        );
    }

    #[test]
    fn test_app_error_into_response() {
        let response = AppError::StateMismatch.into_response();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);

        let response = AppError::Internal("test".to_string()).into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }
}
