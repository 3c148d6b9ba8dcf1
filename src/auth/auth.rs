use actix_web::{FromRequest, HttpMessage, HttpRequest, dev::Payload};
use futures::future::{Ready, ready};

use crate::{error::AppError, model::employee::Employee};

/// The authenticated employee, placed in request extensions by
/// [`auth_middleware`](super::middleware::auth_middleware).
#[derive(Debug, Clone)]
pub struct AuthUser {
    pub employee: Employee,
}

impl FromRequest for AuthUser {
    type Error = AppError;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _: &mut Payload) -> Self::Future {
        ready(
            req.extensions()
                .get::<AuthUser>()
                .cloned()
                .ok_or_else(|| AppError::Unauthorized("Access token required".into())),
        )
    }
}

impl AuthUser {
    pub fn id(&self) -> u64 {
        self.employee.id
    }

    pub fn require_manager(&self) -> Result<(), AppError> {
        if self.employee.role.is_manager() {
            Ok(())
        } else {
            Err(AppError::Forbidden(
                "You do not have permission to perform this action".into(),
            ))
        }
    }
}
