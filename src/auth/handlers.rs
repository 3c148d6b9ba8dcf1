use actix_web::{HttpResponse, web};
use serde_json::json;
use tracing::info;

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    models::{LoginReqDto, RegisterReqDto},
    service::auth_service::AuthService,
};

// auth end points

/// Register a new employee
#[utoipa::path(
    post,
    path = "/api/auth/register",
    request_body = RegisterReqDto,
    responses(
        (status = 201, description = "Employee registered", body = Object, example = json!({
            "status": "success",
            "data": { "employee": { "id": 2, "email": "jane.doe@company.com" }, "token": "eyJ..." }
        })),
        (status = 400, description = "Validation failed"),
        (status = 409, description = "Email already registered")
    ),
    tag = "Auth"
)]
pub async fn register(
    payload: web::Json<RegisterReqDto>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    let session = auth.register(payload.into_inner()).await?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": session
    })))
}

/// Exchange credentials for a bearer token
#[utoipa::path(
    post,
    path = "/api/auth/login",
    request_body = LoginReqDto,
    responses(
        (status = 200, description = "Logged in", body = Object, example = json!({
            "status": "success",
            "data": { "employee": { "id": 2, "email": "jane.doe@company.com" }, "token": "eyJ..." }
        })),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Invalid credentials")
    ),
    tag = "Auth"
)]
pub async fn login(
    payload: web::Json<LoginReqDto>,
    auth: web::Data<AuthService>,
) -> Result<HttpResponse, AppError> {
    info!("Login request received");
    payload.validate()?;

    let session = auth.login(&payload.email, &payload.password).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": session
    })))
}

/// The employee behind the bearer token
#[utoipa::path(
    get,
    path = "/api/auth/me",
    responses(
        (status = 200, description = "Current employee", body = Object, example = json!({
            "status": "success",
            "data": { "employee": { "id": 2, "email": "jane.doe@company.com", "role": "employee" } }
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Auth"
)]
pub async fn me(auth: AuthUser) -> HttpResponse {
    HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "employee": auth.employee }
    }))
}

#[cfg(test)]
mod tests {
    use actix_web::{http::StatusCode, test};
    use serde_json::{Value, json};

    use crate::test_support::{TestContext, app, request};

    #[actix_web::test]
    async fn register_login_and_me() {
        let ctx = TestContext::new();
        let app = test::init_service(app(
            ctx.config.clone(),
            ctx.auth.clone(),
            ctx.requests.clone(),
        ))
        .await;

        let req = request(test::TestRequest::post(), "/api/auth/register")
            .set_json(json!({
                "email": "Jane@Corp.io",
                "password": "s3cret-pass",
                "fullName": "Jane Doe"
            }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::CREATED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "success");
        assert_eq!(body["data"]["employee"]["email"], "jane@corp.io");
        assert_eq!(body["data"]["employee"]["role"], "employee");
        assert!(body["data"]["employee"].get("password_hash").is_none());

        let req = request(test::TestRequest::post(), "/api/auth/login")
            .set_json(json!({ "email": "jane@corp.io", "password": "s3cret-pass" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        let token = body["data"]["token"].as_str().unwrap().to_string();

        let req = request(test::TestRequest::get(), "/api/auth/me")
            .insert_header(("Authorization", format!("Bearer {token}")))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::OK);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["data"]["employee"]["full_name"], "Jane Doe");
    }

    #[actix_web::test]
    async fn invalid_payloads_are_rejected() {
        let ctx = TestContext::new();
        let app = test::init_service(app(
            ctx.config.clone(),
            ctx.auth.clone(),
            ctx.requests.clone(),
        ))
        .await;

        let req = request(test::TestRequest::post(), "/api/auth/register")
            .set_json(json!({ "email": "nope", "password": "123", "fullName": "X" }))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["status"], "fail");

        let req = request(test::TestRequest::post(), "/api/auth/login")
            .insert_header(("Content-Type", "application/json"))
            .set_payload("{not json")
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::BAD_REQUEST);
    }

    #[actix_web::test]
    async fn me_requires_a_valid_token() {
        let ctx = TestContext::new();
        let app = test::init_service(app(
            ctx.config.clone(),
            ctx.auth.clone(),
            ctx.requests.clone(),
        ))
        .await;

        let req = request(test::TestRequest::get(), "/api/auth/me").to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);

        let req = request(test::TestRequest::get(), "/api/auth/me")
            .insert_header(("Authorization", "Bearer not.a.jwt"))
            .to_request();
        let resp = test::call_service(&app, req).await;
        assert_eq!(resp.status(), StatusCode::UNAUTHORIZED);
        let body: Value = test::read_body_json(resp).await;
        assert_eq!(body["message"], "Invalid token");
    }
}
