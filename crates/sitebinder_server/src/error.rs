use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use log::{error, warn};
use serde_json::json;
use sitebinder_engine::{ScrapeError, SessionError};
use thiserror::Error;

/// Everything a handler can fail with, mapped onto HTTP statuses and the
/// `{"error": ...}` payload clients expect.
#[derive(Debug, Error)]
pub enum ApiError {
    #[error(transparent)]
    Scrape(#[from] ScrapeError),
    #[error("session_id is required")]
    MissingSessionId,
    #[error("session not found")]
    SessionNotFound,
    #[error("{0}")]
    BadRequest(String),
    #[error("internal error: {0}")]
    Internal(String),
}

impl From<SessionError> for ApiError {
    fn from(err: SessionError) -> Self {
        ApiError::Scrape(ScrapeError::Session(err))
    }
}

impl ApiError {
    fn status_code(&self) -> StatusCode {
        match self {
            ApiError::Scrape(ScrapeError::InvalidScheme)
            | ApiError::Scrape(ScrapeError::Fetch(_)) => StatusCode::BAD_REQUEST,
            ApiError::Scrape(ScrapeError::NoLinksFound) => StatusCode::NOT_FOUND,
            ApiError::Scrape(ScrapeError::NoRenderableResults)
            | ApiError::Scrape(ScrapeError::Merge(_))
            | ApiError::Scrape(ScrapeError::Session(_)) => StatusCode::INTERNAL_SERVER_ERROR,
            ApiError::MissingSessionId | ApiError::BadRequest(_) => StatusCode::BAD_REQUEST,
            ApiError::SessionNotFound => StatusCode::NOT_FOUND,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn public_message(&self) -> String {
        match self {
            ApiError::Scrape(ScrapeError::InvalidScheme) => "Invalid URL scheme".to_string(),
            ApiError::Scrape(ScrapeError::Fetch(err)) => {
                format!("Failed to fetch base URL: {err}")
            }
            ApiError::Scrape(ScrapeError::NoLinksFound) => {
                "No valid links found on the page.".to_string()
            }
            ApiError::Scrape(ScrapeError::NoRenderableResults) => {
                "No valid PDFs were generated.".to_string()
            }
            ApiError::Scrape(ScrapeError::Merge(err)) => format!("Failed to merge PDFs: {err}"),
            ApiError::Scrape(ScrapeError::Session(_)) | ApiError::Internal(_) => {
                "Internal server error".to_string()
            }
            ApiError::MissingSessionId => "session_id is required".to_string(),
            ApiError::SessionNotFound => "Session not found or already cleaned".to_string(),
            ApiError::BadRequest(message) => message.clone(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let status = self.status_code();
        if status.is_server_error() {
            error!("request failed: {self}");
        } else {
            warn!("request rejected: {self}");
        }
        (status, Json(json!({ "error": self.public_message() }))).into_response()
    }
}
