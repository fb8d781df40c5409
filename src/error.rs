//! Error types for the demetsiiify server

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;

use crate::iiif::{BuildError, CollectionError, ImageRequestError};
use crate::imgfetch::{DownloadError, FetchError};
use crate::mets::ParseError;

/// Application-wide result type
pub type Result<T> = std::result::Result<T, AppError>;

/// Application error type
#[derive(Error, Debug)]
pub enum AppError {
    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error("Not implemented: {0}")]
    NotImplemented(String),

    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("METS error: {0}")]
    Parse(#[from] ParseError),

    #[error("Fetch error: {0}")]
    Fetch(#[from] FetchError),

    #[error("Download error: {0}")]
    Download(#[from] DownloadError),

    #[error("Manifest error: {0}")]
    Build(#[from] BuildError),

    #[error("Collection error: {0}")]
    Collection(#[from] CollectionError),

    #[error("Image request error: {0}")]
    ImageRequest(#[from] ImageRequestError),
}

/// Error response body
#[derive(Serialize)]
struct ErrorResponse {
    error: String,
    message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    details: Option<String>,
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let (status, error_type, message) = match &self {
            AppError::NotFound(msg) => (StatusCode::NOT_FOUND, "not_found", msg.clone()),
            AppError::BadRequest(msg) => (StatusCode::BAD_REQUEST, "bad_request", msg.clone()),
            AppError::NotImplemented(msg) => {
                (StatusCode::NOT_IMPLEMENTED, "not_implemented", msg.clone())
            }
            AppError::Database(e) => {
                tracing::error!("Database error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "database_error",
                    "Database error".to_string(),
                )
            }
            AppError::Json(e) => {
                tracing::error!("JSON error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "json_error",
                    "Stored document is not valid JSON".to_string(),
                )
            }
            AppError::Io(e) => {
                tracing::error!("IO error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "io_error",
                    "IO error".to_string(),
                )
            }
            AppError::Parse(e) => (StatusCode::BAD_GATEWAY, "parse_error", e.to_string()),
            AppError::Fetch(e) => (StatusCode::BAD_GATEWAY, "fetch_error", e.to_string()),
            AppError::Download(e) => (StatusCode::BAD_GATEWAY, "download_error", e.to_string()),
            AppError::Build(e) => {
                tracing::error!("Manifest build error: {}", e);
                (
                    StatusCode::INTERNAL_SERVER_ERROR,
                    "build_error",
                    e.to_string(),
                )
            }
            AppError::Collection(e) => match e {
                CollectionError::InvalidPage(_) => {
                    (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
                }
                CollectionError::UnknownCollection(_) | CollectionError::PageOutOfRange { .. } => {
                    (StatusCode::NOT_FOUND, "not_found", e.to_string())
                }
            },
            AppError::ImageRequest(e) => match e {
                ImageRequestError::Unsupported(_) => {
                    (StatusCode::NOT_IMPLEMENTED, "not_implemented", e.to_string())
                }
                ImageRequestError::Invalid(_) => {
                    (StatusCode::BAD_REQUEST, "bad_request", e.to_string())
                }
            },
        };

        let body = Json(ErrorResponse {
            error: error_type.to_string(),
            message,
            details: if cfg!(debug_assertions) {
                Some(self.to_string())
            } else {
                None
            },
        });

        (status, body).into_response()
    }
}
