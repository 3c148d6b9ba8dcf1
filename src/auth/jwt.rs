use chrono::Utc;
use jsonwebtoken::{
    DecodingKey, EncodingKey, Header, Validation, decode, encode, errors::Error, errors::ErrorKind,
};
use uuid::Uuid;

use crate::{model::role::Role, models::Claims};

fn now() -> usize {
    Utc::now().timestamp().max(0) as usize
}

pub fn generate_access_token(
    employee_id: u64,
    email: String,
    role: Role,
    secret: &str,
    ttl: usize,
) -> Result<String, Error> {
    let issued_at = now();
    let claims = Claims {
        employee_id,
        sub: email,
        role,
        iat: issued_at,
        exp: issued_at.saturating_add(ttl),
        jti: Uuid::new_v4().to_string(),
    };

    encode(
        &Header::default(),
        &claims,
        &EncodingKey::from_secret(secret.as_bytes()),
    )
}

pub fn verify_token(token: &str, secret: &str) -> Result<Claims, Error> {
    decode::<Claims>(
        token,
        &DecodingKey::from_secret(secret.as_bytes()),
        &Validation::default(),
    )
    .map(|data| data.claims)
}

/// Client-facing reason for a rejected token.
pub fn rejection_message(err: &Error) -> &'static str {
    match err.kind() {
        ErrorKind::ExpiredSignature => "Token expired",
        _ => "Invalid token",
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn token_round_trips_claims() {
        let token =
            generate_access_token(7, "boss@corp.io".into(), Role::Manager, "s3cret", 3600).unwrap();
        let claims = verify_token(&token, "s3cret").unwrap();

        assert_eq!(claims.employee_id, 7);
        assert_eq!(claims.sub, "boss@corp.io");
        assert_eq!(claims.role, Role::Manager);
        assert!(claims.exp > claims.iat);
    }

    #[test]
    fn oversized_ttl_saturates_instead_of_overflowing() {
        let token =
            generate_access_token(7, "boss@corp.io".into(), Role::Manager, "s3cret", usize::MAX)
                .unwrap();
        let claims = verify_token(&token, "s3cret").unwrap();

        assert_eq!(claims.exp, usize::MAX);
    }

    #[test]
    fn wrong_secret_is_rejected() {
        let token =
            generate_access_token(7, "boss@corp.io".into(), Role::Manager, "s3cret", 3600).unwrap();
        let err = verify_token(&token, "other").unwrap_err();
        assert_eq!(rejection_message(&err), "Invalid token");
    }

    #[test]
    fn expired_token_is_reported_as_expired() {
        let claims = Claims {
            employee_id: 7,
            sub: "boss@corp.io".into(),
            role: Role::Manager,
            iat: now() - 7200,
            exp: now() - 3600,
            jti: Uuid::new_v4().to_string(),
        };
        let token = encode(
            &Header::default(),
            &claims,
            &EncodingKey::from_secret(b"s3cret"),
        )
        .unwrap();

        let err = verify_token(&token, "s3cret").unwrap_err();
        assert_eq!(rejection_message(&err), "Token expired");
    }
}
