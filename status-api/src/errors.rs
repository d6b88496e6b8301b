use axum::{
    http::{header, StatusCode},
    response::{IntoResponse, Response},
    Json,
};
use serde::Serialize;
use thiserror::Error;
use tracing::error;

use crate::metrics::{
    AUTH_FAILURES_TOTAL, DB_FAILURES_TOTAL, NOT_FOUND_TOTAL, VALIDATION_FAILURES_TOTAL,
};

#[derive(Debug, Error)]
pub enum Error {
    #[error("Database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("Database migration error: {0}")]
    Migration(#[from] sqlx::migrate::MigrateError),

    #[error("Validation error: {0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Unauthorized(&'static str),

    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("Metrics error: {0}")]
    Metrics(#[from] prometheus::Error),
}

pub type Result<T> = std::result::Result<T, Error>;

impl Error {
    pub fn status_code(&self) -> StatusCode {
        match self {
            Error::Validation(_) => StatusCode::UNPROCESSABLE_ENTITY,
            Error::NotFound(_) => StatusCode::NOT_FOUND,
            Error::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            Error::Database(_) | Error::Migration(_) | Error::Io(_) | Error::Metrics(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

/// JSON error body returned by every failing endpoint.
#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

impl IntoResponse for Error {
    fn into_response(self) -> Response {
        let status = self.status_code();
        let message = match &self {
            Error::Validation(_) => {
                VALIDATION_FAILURES_TOTAL.inc();
                self.to_string()
            }
            Error::NotFound(_) => {
                NOT_FOUND_TOTAL.inc();
                self.to_string()
            }
            Error::Unauthorized(_) => {
                AUTH_FAILURES_TOTAL.inc();
                let body = Json(ErrorBody {
                    error: self.to_string(),
                });
                return (status, [(header::WWW_AUTHENTICATE, "ApiKey")], body).into_response();
            }
            Error::Database(_) | Error::Migration(_) | Error::Io(_) | Error::Metrics(_) => {
                DB_FAILURES_TOTAL.inc();
                error!("Request failed: {}", self);
                "internal server error".to_string()
            }
        };

        (status, Json(ErrorBody { error: message })).into_response()
    }
}
