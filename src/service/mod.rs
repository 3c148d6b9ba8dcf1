pub mod auth_service;
pub mod request_service;
