use actix_web::middleware::{NormalizePath, from_fn};
use actix_web::web::{self, Data};
use actix_web::{App, HttpResponse, HttpServer, Responder, get};
use dotenvy::dotenv;
use std::sync::Arc;

mod api;
mod auth;
mod config;
mod db;
mod docs;
mod error;
mod model;
mod models;
mod routes;
mod service;
mod store;
mod utils;

#[cfg(test)]
mod test_support;

use config::{Config, StoreBackend};
use db::init_db;
use error::{log_server_errors, not_found};
use service::{auth_service::AuthService, request_service::RequestService};
use store::{ActionStore, EmployeeStore, RequestStore, memory::MemoryStore, mysql::MySqlStore};

use crate::docs::ApiDoc;
use anyhow::Context;
use serde_json::json;
use tracing::{info, warn};
use tracing_appender::rolling;
use utoipa::OpenApi; // needed for ApiDoc::openapi()
use utoipa_swagger_ui::SwaggerUi;

type Stores = (
    Arc<dyn EmployeeStore>,
    Arc<dyn RequestStore>,
    Arc<dyn ActionStore>,
);

#[get("/health")]
async fn health() -> impl Responder {
    HttpResponse::Ok().json(json!({ "status": "ok" }))
}

async fn open_stores(config: &Config) -> anyhow::Result<Stores> {
    match config.store_backend {
        StoreBackend::Mysql => {
            let url = config
                .database_url
                .as_deref()
                .context("DATABASE_URL must be set")?;
            let store = Arc::new(MySqlStore::new(init_db(url).await?));
            let stores: Stores = (store.clone(), store.clone(), store);
            Ok(stores)
        }
        StoreBackend::Memory => {
            warn!("Using in-memory store, data is lost on restart");
            let store = Arc::new(MemoryStore::new());
            let stores: Stores = (store.clone(), store.clone(), store);
            Ok(stores)
        }
    }
}

#[actix_web::main]
async fn main() -> anyhow::Result<()> {
    dotenv().ok();

    let config = Config::from_env()?;

    // Rolling daily log
    let file_appender = rolling::daily(&config.log_dir, "app.log");
    let (non_blocking, _guard) = tracing_appender::non_blocking(file_appender);

    tracing_subscriber::fmt()
        .with_writer(non_blocking)
        .with_max_level(config.log_level)
        .with_ansi(false)
        .with_target(false) // removes module path
        .with_level(true)
        .with_thread_ids(false)
        .with_thread_names(false)
        .pretty()
        .init();

    info!("Server starting...");

    let (employees, requests, actions) = open_stores(&config).await?;

    let auth_service = Data::new(AuthService::new(employees.clone(), &config));
    let request_service = Data::new(RequestService::new(employees, requests, actions));

    let auth_for_warmup = auth_service.clone();
    actix_web::rt::spawn(async move {
        if let Err(e) = auth_for_warmup.warmup_email_filter().await {
            warn!(error = %e, "Failed to warm up email filter");
        }
    });

    let server_addr = config.server_addr.clone();
    info!(addr = %server_addr, "Listening");

    HttpServer::new(move || {
        let config_data = config.clone();
        App::new()
            .wrap(from_fn(log_server_errors))
            .wrap(actix_web::middleware::Logger::default())
            .wrap(NormalizePath::trim())
            .service(
                SwaggerUi::new("/swagger-ui/{_:.*}") // wildcard {_:.*} to match JS/CSS files
                    .url("/api-doc/openapi.json", ApiDoc::openapi()),
            )
            .app_data(Data::new(config.clone()))
            .app_data(auth_service.clone())
            .app_data(request_service.clone())
            .service(health)
            .configure(move |cfg| routes::configure(cfg, &config_data))
            .default_service(web::to(not_found))
    })
    .bind(server_addr)?
    .run()
    .await?;

    Ok(())
}
