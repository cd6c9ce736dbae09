use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use thiserror::Error;

/// Generic message returned to callers for every internal failure.
pub const INTERNAL_ERROR_MESSAGE: &str = "Error en el servidor";

#[derive(Error, Debug)]
pub enum ServiceError {
    #[error("{0}")]
    Validation(String),
    #[error("{0}")]
    Conflict(String),
    #[error("Credenciales incorrectas")]
    InvalidCredentials,
    #[error("Acceso denegado: falta el header Authorization")]
    MissingAuthHeader,
    #[error("Formato de Authorization invalido. Usa: Bearer <token>")]
    BadAuthFormat,
    #[error("Token invalido o expirado")]
    Forbidden,
    #[error("{0}")]
    NotFound(String),
    #[error("Storage I/O error: {0}")]
    Io(#[from] std::io::Error),
    #[error("Malformed store document: {0}")]
    Format(#[from] serde_json::Error),
    #[error("Password hashing failed: {0}")]
    Hashing(String),
    #[error("Token signing failed: {0}")]
    Token(String),
}

impl ServiceError {
    pub fn status(&self) -> StatusCode {
        match self {
            ServiceError::Validation(_) => StatusCode::BAD_REQUEST,
            ServiceError::Conflict(_) => StatusCode::CONFLICT,
            ServiceError::InvalidCredentials
            | ServiceError::MissingAuthHeader
            | ServiceError::BadAuthFormat => StatusCode::UNAUTHORIZED,
            ServiceError::Forbidden => StatusCode::FORBIDDEN,
            ServiceError::NotFound(_) => StatusCode::NOT_FOUND,
            ServiceError::Io(_)
            | ServiceError::Format(_)
            | ServiceError::Hashing(_)
            | ServiceError::Token(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn is_internal(&self) -> bool {
        self.status() == StatusCode::INTERNAL_SERVER_ERROR
    }
}

impl IntoResponse for ServiceError {
    fn into_response(self) -> Response {
        let status = self.status();
        let message = if self.is_internal() {
            // Full detail stays in the server log
            tracing::error!(error = ?self, "request failed: {}", self);
            INTERNAL_ERROR_MESSAGE.to_string()
        } else {
            self.to_string()
        };

        (status, Json(serde_json::json!({ "error": message }))).into_response()
    }
}
