use actix_web::{
    Error, HttpMessage,
    body::BoxBody,
    dev::{ServiceRequest, ServiceResponse},
    middleware::Next,
    web::Data,
};

use crate::{auth::auth::AuthUser, error::AppError, service::auth_service::AuthService};

pub async fn auth_middleware(
    req: ServiceRequest,
    next: Next<BoxBody>,
) -> Result<ServiceResponse<BoxBody>, Error> {
    let Some(auth) = req.app_data::<Data<AuthService>>().cloned() else {
        let err = AppError::Internal("AuthService missing from app data".into());
        return Ok(req.error_response(err));
    };

    let token = match req
        .headers()
        .get("Authorization")
        .and_then(|h| h.to_str().ok())
        .and_then(|h| h.strip_prefix("Bearer "))
        .map(str::trim)
    {
        Some(t) if !t.is_empty() => t.to_owned(),
        _ => {
            let err = AppError::Unauthorized("Access token required".into());
            return Ok(req.error_response(err));
        }
    };

    match auth.authenticate(&token).await {
        Ok(employee) => {
            req.extensions_mut().insert(AuthUser { employee });
            next.call(req).await
        }
        Err(err) => Ok(req.error_response(err)),
    }
}
