use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;

/// ApiError
///
/// The single error taxonomy surfaced by the HTTP layer. Every failure a client can
/// observe maps onto exactly one of these variants, and every variant carries a single
/// human-readable message. Internal detail (the underlying database error, for example)
/// is logged server-side and never leaked into the response body.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// Missing, malformed, or expired session token (401).
    /// The Authorization Gate clears the session cookie alongside this error.
    #[error("{0}")]
    Authentication(String),

    /// Valid session, insufficient role (403). The cookie is left untouched.
    #[error("{0}")]
    Authorization(String),

    /// Missing or malformed input (400). The message identifies the field or reason.
    #[error("{0}")]
    Validation(String),

    /// Referenced entity does not exist (404).
    #[error("{0}")]
    NotFound(String),

    /// Unexpected persistence or runtime failure (500). Clients get a generic
    /// message; the source error has already been logged at the point of capture.
    #[error("an internal server error occurred")]
    Internal,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            ApiError::Authentication(_) => StatusCode::UNAUTHORIZED,
            ApiError::Authorization(_) => StatusCode::FORBIDDEN,
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }
}

impl IntoResponse for ApiError {
    /// Renders the error as the `{ "error": <message> }` JSON body used across
    /// the whole API surface.
    fn into_response(self) -> Response {
        let status = self.status();
        let body = Json(json!({ "error": self.to_string() }));
        (status, body).into_response()
    }
}

/// RepoError
///
/// Failure type of the repository layer. Handlers convert this into
/// `ApiError::Internal` at the boundary; the conversion logs the detail so the
/// generic 500 body stays uninformative to clients.
#[derive(Debug, thiserror::Error)]
pub enum RepoError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),
}

impl From<RepoError> for ApiError {
    fn from(err: RepoError) -> Self {
        tracing::error!("repository failure: {:?}", err);
        ApiError::Internal
    }
}
