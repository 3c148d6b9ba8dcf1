use serde::{Deserialize, Serialize};
use utoipa::ToSchema;

use crate::{error::AppError, model::employee::Employee, model::role::Role};

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct RegisterReqDto {
    #[schema(example = "jane.doe@company.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    /// Defaults to `employee`
    pub role: Option<Role>,
    #[schema(example = 1)]
    pub manager_id: Option<u64>,
}

impl RegisterReqDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();

        if !looks_like_email(&self.email) {
            problems.push("\"email\" must be a valid email");
        }
        if self.password.chars().count() < 6 {
            problems.push("\"password\" length must be at least 6 characters long");
        }
        if self.full_name.trim().is_empty() {
            problems.push("\"fullName\" is not allowed to be empty");
        }

        collect(problems)
    }
}

#[derive(Deserialize, ToSchema)]
pub struct LoginReqDto {
    #[schema(example = "jane.doe@company.com")]
    pub email: String,
    #[schema(example = "s3cret-pass")]
    pub password: String,
}

impl LoginReqDto {
    pub fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();

        if !looks_like_email(&self.email) {
            problems.push("\"email\" must be a valid email");
        }
        if self.password.is_empty() {
            problems.push("\"password\" is not allowed to be empty");
        }

        collect(problems)
    }
}

/// Employee plus a bearer token, returned by register and login.
#[derive(Serialize, ToSchema)]
pub struct AuthSession {
    pub employee: Employee,
    #[schema(example = "eyJhbGciOiJIUzI1NiIsInR5cCI6IkpXVCJ9...")]
    pub token: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct Claims {
    pub employee_id: u64,
    /// employee email
    pub sub: String,
    pub role: Role,
    pub iat: usize,
    pub exp: usize,
    pub jti: String,
}

pub fn looks_like_email(value: &str) -> bool {
    let value = value.trim();
    match value.split_once('@') {
        Some((local, domain)) => {
            !local.is_empty()
                && !domain.contains('@')
                && !value.contains(char::is_whitespace)
                && domain
                    .split_once('.')
                    .is_some_and(|(host, tld)| !host.is_empty() && !tld.is_empty())
        }
        None => false,
    }
}

pub fn collect(problems: Vec<&str>) -> Result<(), AppError> {
    if problems.is_empty() {
        Ok(())
    } else {
        Err(AppError::Validation(problems.join(", ")))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn email_shape() {
        assert!(looks_like_email("a@b.io"));
        assert!(looks_like_email(" jane.doe@corp.example.com "));
        assert!(!looks_like_email("a@b"));
        assert!(!looks_like_email("@b.io"));
        assert!(!looks_like_email("a@@b.io"));
        assert!(!looks_like_email("a b@c.io"));
    }

    #[test]
    fn register_reports_every_problem() {
        let dto = RegisterReqDto {
            email: "nope".into(),
            password: "123".into(),
            full_name: " ".into(),
            role: None,
            manager_id: None,
        };

        let Err(AppError::Validation(msg)) = dto.validate() else {
            panic!("expected validation error");
        };
        assert!(msg.contains("email"));
        assert!(msg.contains("password"));
        assert!(msg.contains("fullName"));
    }
}
