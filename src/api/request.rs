use actix_web::{HttpResponse, web};
use serde::Deserialize;
use serde_json::json;
use utoipa::{IntoParams, ToSchema};

use crate::{
    auth::auth::AuthUser,
    error::AppError,
    model::request::RequestStatus,
    models::collect,
    service::request_service::RequestService,
    store::RequestFilter,
};

const TITLE_MAX_CHARS: usize = 255;

#[derive(Deserialize, ToSchema)]
#[serde(rename_all = "camelCase")]
pub struct CreateRequest {
    #[schema(example = "New laptop")]
    pub title: String,
    #[schema(example = "The current one no longer holds a charge")]
    pub description: String,
    /// employee the request is assigned to
    #[schema(example = 2)]
    pub assigned_to: u64,
}

impl CreateRequest {
    fn validate(&self) -> Result<(), AppError> {
        let mut problems = Vec::new();

        if self.title.trim().is_empty() {
            problems.push("\"title\" is not allowed to be empty");
        } else if self.title.trim().chars().count() > TITLE_MAX_CHARS {
            problems.push("\"title\" length must be less than or equal to 255 characters long");
        }
        if self.description.trim().is_empty() {
            problems.push("\"description\" is not allowed to be empty");
        }

        collect(problems)
    }
}

/// Optional body for approve, reject and close.
#[derive(Deserialize, ToSchema, Default)]
pub struct NotesPayload {
    #[schema(example = "Looks fine")]
    pub notes: Option<String>,
}

#[derive(Deserialize, IntoParams)]
#[serde(rename_all = "camelCase")]
#[into_params(parameter_in = Query)]
pub struct RequestQuery {
    /// Filter by creator id
    pub created_by: Option<u64>,
    /// Filter by assignee id
    pub assigned_to: Option<u64>,
    /// Filter by status
    pub status: Option<RequestStatus>,
}

impl From<RequestQuery> for RequestFilter {
    fn from(q: RequestQuery) -> Self {
        RequestFilter {
            created_by: q.created_by,
            assigned_to: q.assigned_to,
            status: q.status,
        }
    }
}

/// A missing or blank body means no notes; anything else must be a valid payload.
fn notes_of(body: &[u8]) -> Result<Option<String>, AppError> {
    if body.trim_ascii().is_empty() {
        return Ok(None);
    }

    serde_json::from_slice::<NotesPayload>(body)
        .map(|payload| payload.notes)
        .map_err(|e| AppError::Validation(format!("Invalid notes payload: {e}")))
}

/* =========================
Create request
========================= */
#[utoipa::path(
    post,
    path = "/api/requests",
    request_body = CreateRequest,
    responses(
        (status = 201, description = "Request created", body = Object, example = json!({
            "status": "success",
            "data": { "request": { "id": 10, "status": "pending" } }
        })),
        (status = 400, description = "Validation failed"),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Assigned employee not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn create_request(
    auth: AuthUser,
    service: web::Data<RequestService>,
    payload: web::Json<CreateRequest>,
) -> Result<HttpResponse, AppError> {
    payload.validate()?;

    let request = service
        .create_request(
            auth.id(),
            &payload.title,
            &payload.description,
            payload.assigned_to,
        )
        .await?;

    Ok(HttpResponse::Created().json(json!({
        "status": "success",
        "data": { "request": request }
    })))
}

/* =========================
List / fetch
========================= */
#[utoipa::path(
    get,
    path = "/api/requests",
    params(RequestQuery),
    responses(
        (status = 200, description = "Requests, newest first", body = Object, example = json!({
            "status": "success",
            "results": 1,
            "data": { "requests": [ { "id": 10, "status": "pending" } ] }
        })),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_requests(
    _auth: AuthUser,
    service: web::Data<RequestService>,
    query: web::Query<RequestQuery>,
) -> Result<HttpResponse, AppError> {
    let requests = service.get_requests(&query.into_inner().into()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": requests.len(),
        "data": { "requests": requests }
    })))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}",
    params(
        ("id" = u64, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Request found", body = Object),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn get_request(
    _auth: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let request = service.get_request(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "request": request }
    })))
}

#[utoipa::path(
    get,
    path = "/api/requests/{id}/actions",
    params(
        ("id" = u64, Path, description = "Request id")
    ),
    responses(
        (status = 200, description = "Audit trail, newest first", body = Object, example = json!({
            "status": "success",
            "results": 1,
            "data": { "actions": [ { "id": 40, "action_type": "created", "notes": "Request created" } ] }
        })),
        (status = 401, description = "Unauthorized"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn get_request_actions(
    _auth: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<u64>,
) -> Result<HttpResponse, AppError> {
    let actions = service.get_request_actions(path.into_inner()).await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": actions.len(),
        "data": { "actions": actions }
    })))
}

/// Employees a request can be assigned to
#[utoipa::path(
    get,
    path = "/api/requests/employees",
    responses(
        (status = 200, description = "Assignable employees", body = Object),
        (status = 401, description = "Unauthorized")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn list_employees(
    _auth: AuthUser,
    service: web::Data<RequestService>,
) -> Result<HttpResponse, AppError> {
    let employees = service.list_assignable_employees().await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "results": employees.len(),
        "data": { "employees": employees }
    })))
}

/* =========================
Approve / reject (manager)
========================= */
#[utoipa::path(
    post,
    path = "/api/requests/{id}/approve",
    params(
        ("id" = u64, Path, description = "Request id")
    ),
    request_body(content = NotesPayload, description = "Optional notes"),
    responses(
        (status = 200, description = "Request approved", body = Object),
        (status = 400, description = "Request is not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the assignee's manager"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn approve_request(
    auth: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    auth.require_manager()?;

    let notes = notes_of(&body)?;
    let request = service
        .approve_request(path.into_inner(), auth.id(), notes)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "request": request }
    })))
}

#[utoipa::path(
    post,
    path = "/api/requests/{id}/reject",
    params(
        ("id" = u64, Path, description = "Request id")
    ),
    request_body(content = NotesPayload, description = "Optional notes"),
    responses(
        (status = 200, description = "Request rejected", body = Object),
        (status = 400, description = "Request is not pending"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the assignee's manager"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn reject_request(
    auth: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    auth.require_manager()?;

    let notes = notes_of(&body)?;
    let request = service
        .reject_request(path.into_inner(), auth.id(), notes)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "request": request }
    })))
}

/* =========================
Close (assignee)
========================= */
#[utoipa::path(
    post,
    path = "/api/requests/{id}/close",
    params(
        ("id" = u64, Path, description = "Request id")
    ),
    request_body(content = NotesPayload, description = "Optional notes"),
    responses(
        (status = 200, description = "Request closed", body = Object),
        (status = 400, description = "Request is not approved"),
        (status = 401, description = "Unauthorized"),
        (status = 403, description = "Not the assignee"),
        (status = 404, description = "Request not found")
    ),
    security(
        ("bearer_auth" = [])
    ),
    tag = "Requests"
)]
pub async fn close_request(
    auth: AuthUser,
    service: web::Data<RequestService>,
    path: web::Path<u64>,
    body: web::Bytes,
) -> Result<HttpResponse, AppError> {
    let notes = notes_of(&body)?;
    let request = service
        .close_request(path.into_inner(), auth.id(), notes)
        .await?;

    Ok(HttpResponse::Ok().json(json!({
        "status": "success",
        "data": { "request": request }
    })))
}
