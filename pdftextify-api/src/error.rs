use axum::{
    extract::{multipart::{MultipartError, MultipartRejection}, Json},
    http::StatusCode,
    response::{IntoResponse, Response},
};
use pdftextify::OcrError;
use serde::{Deserialize, Serialize};
use thiserror::Error;
use tracing::{error, warn};

/// Error body returned by every endpoint
#[derive(Debug, Serialize, Deserialize)]
pub struct ErrorResponse {
    /// Human-readable error message describing what went wrong
    pub detail: String,
}

/// Application-specific error types for the API
#[derive(Debug, Error)]
pub enum AppError {
    /// Upload does not carry a `.pdf` file name
    #[error("File must be PDF")]
    NotPdf,

    /// Multipart form without a `file` field
    #[error("Field 'file' is required")]
    MissingFile,

    #[error("{0}")]
    NotFound(String),

    #[error("Method Not Allowed")]
    MethodNotAllowed,

    /// Request is not a multipart form (missing or bad content type)
    #[error("{}", .0.body_text())]
    InvalidForm(MultipartRejection),

    /// Malformed or oversized multipart body
    #[error(transparent)]
    Multipart(#[from] MultipartError),

    /// OCR tool missing, failed or timed out
    #[error(transparent)]
    Ocr(#[from] OcrError),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

impl AppError {
    pub fn status(&self) -> StatusCode {
        match self {
            AppError::NotPdf => StatusCode::BAD_REQUEST,
            AppError::MissingFile => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::MethodNotAllowed => StatusCode::METHOD_NOT_ALLOWED,
            AppError::InvalidForm(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Multipart(e) => e.status(),
            AppError::Ocr(_) | AppError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn detail(&self) -> String {
        match self {
            AppError::Multipart(e) => e.body_text(),
            other => other.to_string(),
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status();
        let detail = self.detail();

        if status.is_server_error() {
            error!(%status, %detail, "request failed");
        } else {
            warn!(%status, %detail, "request rejected");
        }

        (status, Json(ErrorResponse { detail })).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[test]
    fn test_error_response_serialization() {
        let error = ErrorResponse {
            detail: "Test error message".to_string(),
        };

        let json = serde_json::to_value(&error).unwrap();
        assert_eq!(json, serde_json::json!({ "detail": "Test error message" }));
    }

    #[test]
    fn test_client_error_statuses() {
        assert_eq!(AppError::NotPdf.status(), StatusCode::BAD_REQUEST);
        assert_eq!(AppError::MissingFile.status(), StatusCode::UNPROCESSABLE_ENTITY);
        assert_eq!(
            AppError::NotFound("index.html not found".to_string()).status(),
            StatusCode::NOT_FOUND
        );
        assert_eq!(
            AppError::MethodNotAllowed.status(),
            StatusCode::METHOD_NOT_ALLOWED
        );
    }

    #[test]
    fn test_ocr_errors_are_server_errors() {
        let errors = [
            OcrError::ExecutableNotFound("ocrmypdf".to_string()),
            OcrError::Timeout(Duration::from_secs(1)),
            OcrError::Failed {
                code: Some(1),
                detail: "boom".to_string(),
            },
        ];
        for err in errors {
            let app_error: AppError = err.into();
            let response = app_error.into_response();
            assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
        }
    }

    #[test]
    fn test_app_error_io_conversion() {
        let io_error = std::io::Error::new(std::io::ErrorKind::NotFound, "File not found");
        let app_error: AppError = io_error.into();

        let response = app_error.into_response();
        assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
    }

    #[test]
    fn test_detail_passes_ocr_message_through() {
        let app_error: AppError = OcrError::ExecutableNotFound("ocrmypdf".to_string()).into();
        assert_eq!(app_error.detail(), "ocrmypdf not found in PATH");
        assert_eq!(AppError::NotPdf.detail(), "File must be PDF");
    }
}
