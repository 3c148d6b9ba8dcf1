//! Shared fixtures for handler and service tests.

use std::sync::Arc;

use actix_web::{
    App, Error,
    body::MessageBody,
    dev::{ServiceFactory, ServiceRequest, ServiceResponse},
    middleware::{NormalizePath, from_fn},
    test::TestRequest,
    web::{self, Data},
};

use crate::{
    config::Config,
    error::{log_server_errors, not_found},
    model::{employee::Employee, role::Role},
    routes,
    service::{auth_service::AuthService, request_service::RequestService},
    store::{EmployeeStore, NewEmployee, memory::MemoryStore},
};

pub fn test_config() -> Config {
    Config::from_lookup(|key| match key {
        "SERVER_ADDR" => Some("127.0.0.1:0".into()),
        "JWT_SECRET" => Some("test-secret".into()),
        "STORE_BACKEND" => Some("memory".into()),
        "EMPLOYEE_CACHE_TTL_SECS" => Some("1".into()),
        _ => None,
    })
    .expect("test config is valid")
}

/// Attaches a peer address; the rate limiter keys on it.
pub fn request(req: TestRequest, uri: &str) -> TestRequest {
    req.uri(uri)
        .peer_addr("127.0.0.1:40000".parse().expect("valid socket address"))
}

/// Builds the app from owned parts so the result can outlive the caller.
pub fn app(
    config: Config,
    auth: Data<AuthService>,
    requests: Data<RequestService>,
) -> App<
    impl ServiceFactory<
        ServiceRequest,
        Config = (),
        Response = ServiceResponse<impl MessageBody>,
        Error = Error,
        InitError = (),
    >,
> {
    let route_config = config.clone();
    App::new()
        .wrap(from_fn(log_server_errors))
        .wrap(NormalizePath::trim())
        .app_data(Data::new(config))
        .app_data(auth)
        .app_data(requests)
        .configure(move |cfg| routes::configure(cfg, &route_config))
        .default_service(web::to(not_found))
}

pub struct TestContext {
    pub config: Config,
    pub store: Arc<MemoryStore>,
    pub auth: Data<AuthService>,
    pub requests: Data<RequestService>,
}

impl TestContext {
    pub fn new() -> Self {
        let config = test_config();
        let store = Arc::new(MemoryStore::new());
        let auth = Data::new(AuthService::new(store.clone(), &config));
        let requests = Data::new(RequestService::new(
            store.clone(),
            store.clone(),
            store.clone(),
        ));

        Self {
            config,
            store,
            auth,
            requests,
        }
    }

    /// Inserts an employee directly, skipping password hashing.
    pub async fn hire(&self, name: &str, role: Role, manager_id: Option<u64>) -> Employee {
        EmployeeStore::create(
            self.store.as_ref(),
            NewEmployee {
                email: format!("{name}@corp.io"),
                password_hash: "not-a-real-hash".into(),
                full_name: name.to_string(),
                role,
                manager_id,
            },
        )
        .await
        .expect("seed employee")
    }

    pub fn bearer(&self, employee: &Employee) -> (&'static str, String) {
        let token = self
            .auth
            .issue_token(employee.id, &employee.email, employee.role)
            .expect("token");
        ("Authorization", format!("Bearer {token}"))
    }
}
