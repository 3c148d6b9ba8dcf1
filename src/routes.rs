use crate::{
    api::request,
    auth::{handlers, middleware::auth_middleware},
    config::Config,
    error::AppError,
};
use actix_governor::{
    Governor, GovernorConfig, GovernorConfigBuilder, PeerIpKeyExtractor,
    governor::middleware::NoOpMiddleware,
};
use actix_web::{middleware::from_fn, web};
use std::sync::Arc;

// Helper to build per-route limiter
fn build_limiter(requests_per_min: u32) -> Governor<PeerIpKeyExtractor, NoOpMiddleware> {
    let burst = requests_per_min.max(1);
    let per_ms = 60_000 / burst as u64;
    let cfg = GovernorConfigBuilder::default()
        .per_millisecond(per_ms.max(1))
        .burst_size(burst)
        .key_extractor(PeerIpKeyExtractor)
        .finish()
        .unwrap_or_else(GovernorConfig::default);
    Governor::new(&cfg)
}

pub fn configure(cfg: &mut web::ServiceConfig, config: &Config) {
    let login_limiter = Arc::new(build_limiter(config.rate_login_per_min));
    let register_limiter = Arc::new(build_limiter(config.rate_register_per_min));
    let protected_limiter = Arc::new(build_limiter(config.rate_protected_per_min));

    // Malformed JSON, query strings and path segments answer like any other validation failure
    cfg.app_data(
        web::JsonConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::QueryConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    )
    .app_data(
        web::PathConfig::default()
            .error_handler(|err, _req| AppError::Validation(err.to_string()).into()),
    );

    cfg.service(
        web::scope(&config.api_prefix)
            // Public auth routes, plus /me behind the token check
            .service(
                web::scope("/auth")
                    .service(
                        web::resource("/register")
                            .wrap(register_limiter.clone())
                            .route(web::post().to(handlers::register)),
                    )
                    .service(
                        web::resource("/login")
                            .wrap(login_limiter.clone())
                            .route(web::post().to(handlers::login)),
                    )
                    .service(
                        web::resource("/me")
                            .wrap(from_fn(auth_middleware))
                            .wrap(protected_limiter.clone())
                            .route(web::get().to(handlers::me)),
                    ),
            )
            // Protected request routes
            .service(
                web::scope("/requests")
                    .wrap(from_fn(auth_middleware)) // authentication
                    .wrap(protected_limiter) // rate limiting
                    // /requests
                    .service(
                        web::resource("")
                            .route(web::post().to(request::create_request))
                            .route(web::get().to(request::list_requests)),
                    )
                    // /requests/employees, must precede /{id}
                    .service(
                        web::resource("/employees").route(web::get().to(request::list_employees)),
                    )
                    // /requests/{id}
                    .service(web::resource("/{id}").route(web::get().to(request::get_request)))
                    .service(
                        web::resource("/{id}/actions")
                            .route(web::get().to(request::get_request_actions)),
                    )
                    .service(
                        web::resource("/{id}/approve")
                            .route(web::post().to(request::approve_request)),
                    )
                    .service(
                        web::resource("/{id}/reject").route(web::post().to(request::reject_request)),
                    )
                    .service(
                        web::resource("/{id}/close").route(web::post().to(request::close_request)),
                    ),
            ),
    );
}

// REGISTER / LOGIN
//  └─ token (ACCESS_TOKEN_TTL, default 7 days)

// API REQUEST
//  └─ Authorization: Bearer token
//       └─ auth_middleware resolves the employee (moka cache, then store)
