use crate::api::request::{CreateRequest, NotesPayload};
use crate::model::{
    action::{Action, ActionDetail, ActionType},
    employee::{Employee, EmployeeSummary},
    request::{Request, RequestDetail, RequestStatus},
    role::Role,
};
use crate::models::{AuthSession, LoginReqDto, RegisterReqDto};
use utoipa::openapi::security::{HttpAuthScheme, HttpBuilder, SecurityScheme};
use utoipa::{Modify, OpenApi, openapi};

#[derive(OpenApi)]
#[openapi(
    info(
        title = "Request Desk API",
        version = "1.0.0",
        description = r#"
## Employee Request Desk

Employees submit requests, managers approve or reject them, and assignees
close approved requests. Every step is recorded in an audit trail.

### Lifecycle
`pending` → `approved` → `closed`, or `pending` → `rejected`.

### Security
All `/requests` endpoints and `/auth/me` need a **JWT Bearer** token from
`/auth/login` or `/auth/register`. Approve and reject are limited to the
assignee's manager.

### Response Format
`{"status": "success", "data": {...}}`; errors carry `status` and `message`.
"#,
    ),
    paths(
        crate::auth::handlers::register,
        crate::auth::handlers::login,
        crate::auth::handlers::me,

        crate::api::request::create_request,
        crate::api::request::list_requests,
        crate::api::request::list_employees,
        crate::api::request::get_request,
        crate::api::request::get_request_actions,
        crate::api::request::approve_request,
        crate::api::request::reject_request,
        crate::api::request::close_request
    ),
    components(
        schemas(
            RegisterReqDto,
            LoginReqDto,
            AuthSession,
            Role,
            Employee,
            EmployeeSummary,
            CreateRequest,
            NotesPayload,
            RequestStatus,
            Request,
            RequestDetail,
            ActionType,
            Action,
            ActionDetail
        )
    ),
    modifiers(&SecurityAddon),
    tags(
        (name = "Auth", description = "Registration and login"),
        (name = "Requests", description = "Request lifecycle and audit trail"),
    )
)]
pub struct ApiDoc;

struct SecurityAddon;

impl Modify for SecurityAddon {
    fn modify(&self, openapi: &mut openapi::OpenApi) {
        let components = openapi.components.get_or_insert_with(Default::default);
        components.add_security_scheme(
            "bearer_auth",
            SecurityScheme::Http(
                HttpBuilder::new()
                    .scheme(HttpAuthScheme::Bearer)
                    .bearer_format("JWT")
                    .build(),
            ),
        );
    }
}
