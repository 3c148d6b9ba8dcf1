use actix_web::{
    Error, HttpRequest, HttpResponse, ResponseError,
    body::MessageBody,
    dev::{ServiceRequest, ServiceResponse},
    http::StatusCode,
    middleware::Next,
};
use serde_json::json;
use thiserror::Error;
use tracing::error;

use crate::store::StoreError;

#[derive(Debug, Error)]
pub enum AppError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    InvalidState(String),

    #[error("store error: {0}")]
    Store(StoreError),

    #[error("internal error: {0}")]
    Internal(String),
}

impl AppError {
    /// Operational errors are expected outcomes whose message is safe to show.
    pub fn is_operational(&self) -> bool {
        !matches!(self, AppError::Store(_) | AppError::Internal(_))
    }
}

impl From<StoreError> for AppError {
    fn from(err: StoreError) -> Self {
        match err {
            StoreError::Duplicate(what) => AppError::Conflict(format!("Already exists: {what}")),
            other => AppError::Store(other),
        }
    }
}

impl From<argon2::password_hash::Error> for AppError {
    fn from(err: argon2::password_hash::Error) -> Self {
        AppError::Internal(format!("password hashing: {err}"))
    }
}

impl From<jsonwebtoken::errors::Error> for AppError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        AppError::Internal(format!("token encoding: {err}"))
    }
}

impl ResponseError for AppError {
    fn status_code(&self) -> StatusCode {
        match self {
            AppError::Validation(_) | AppError::InvalidState(_) => StatusCode::BAD_REQUEST,
            AppError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            AppError::Forbidden(_) => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::Conflict(_) => StatusCode::CONFLICT,
            AppError::Store(_) | AppError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn error_response(&self) -> HttpResponse {
        if self.is_operational() {
            HttpResponse::build(self.status_code()).json(json!({
                "status": "fail",
                "message": self.to_string()
            }))
        } else {
            HttpResponse::InternalServerError().json(json!({
                "status": "error",
                "message": "Something went wrong"
            }))
        }
    }
}

/// Logs every 5xx with the method and path that produced it.
pub async fn log_server_errors(
    req: ServiceRequest,
    next: Next<impl MessageBody>,
) -> Result<ServiceResponse<impl MessageBody>, Error> {
    let method = req.method().clone();
    let path = req.path().to_owned();

    let res = next.call(req).await?;

    if res.status().is_server_error() {
        let detail = res
            .response()
            .error()
            .map(|e| e.to_string())
            .unwrap_or_default();
        error!(
            method = %method,
            path = %path,
            status = res.status().as_u16(),
            error = %detail,
            "Request failed"
        );
    }

    Ok(res)
}

/// Fallback for unmatched routes.
pub async fn not_found(req: HttpRequest) -> Result<HttpResponse, AppError> {
    Err(AppError::NotFound(format!(
        "Cannot find {} on this server",
        req.path()
    )))
}

#[cfg(test)]
mod tests {
    use super::*;
    use actix_web::body::to_bytes;

    async fn body_json(err: AppError) -> serde_json::Value {
        let bytes = to_bytes(err.error_response().into_body()).await.unwrap();
        serde_json::from_slice(&bytes).unwrap()
    }

    #[actix_web::test]
    async fn operational_errors_surface_their_message() {
        let err = AppError::InvalidState("Only pending requests can be approved".into());
        assert_eq!(err.status_code(), StatusCode::BAD_REQUEST);

        let body = body_json(err).await;
        assert_eq!(body["status"], "fail");
        assert_eq!(body["message"], "Only pending requests can be approved");
    }

    #[actix_web::test]
    async fn unexpected_errors_are_masked() {
        let err = AppError::from(StoreError::Unavailable("pool timed out".into()));
        assert_eq!(err.status_code(), StatusCode::INTERNAL_SERVER_ERROR);

        let body = body_json(err).await;
        assert_eq!(body["status"], "error");
        assert_eq!(body["message"], "Something went wrong");
    }

    #[test]
    fn duplicate_entries_become_conflicts() {
        let err = AppError::from(StoreError::Duplicate("email a@b.io".into()));
        assert_eq!(err.status_code(), StatusCode::CONFLICT);
    }
}
