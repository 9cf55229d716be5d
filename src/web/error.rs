use axum::http::StatusCode;
use axum::response::{Html, IntoResponse, Response};
use tracing::warn;

use super::page::escape;
use crate::imaging::PhotoError;
use crate::material::UnknownMaterial;

pub type AppResult<T> = Result<T, AppError>;

/// Request-level failures of the form surface.
#[derive(Debug, thiserror::Error)]
pub enum AppError {
    #[error("Bad request: {0}")]
    BadRequest(String),

    #[error(transparent)]
    UnknownMaterial(#[from] UnknownMaterial),

    #[error("No photo uploaded")]
    NoPhoto,

    #[error(transparent)]
    Photo(#[from] PhotoError),

    #[error("Internal error: {0}")]
    Internal(String),
}

impl AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::BadRequest(_) | AppError::UnknownMaterial(_) => StatusCode::BAD_REQUEST,
            AppError::NoPhoto => StatusCode::NOT_FOUND,
            AppError::Photo(_) => StatusCode::UNPROCESSABLE_ENTITY,
            AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        warn!(status = status.as_u16(), error = %self, "Request failed");
        let body = format!(
            "<!doctype html><meta charset=\"utf-8\"><title>QC Scanner</title>\
             <p>{}</p><p><a href=\"/\">Back</a></p>",
            escape(&self.to_string())
        );
        (status, Html(body)).into_response()
    }
}

impl From<axum::extract::multipart::MultipartError> for AppError {
    fn from(err: axum::extract::multipart::MultipartError) -> Self {
        AppError::BadRequest(format!("upload: {err}"))
    }
}

impl From<tokio::task::JoinError> for AppError {
    fn from(err: tokio::task::JoinError) -> Self {
        AppError::Internal(err.to_string())
    }
}
