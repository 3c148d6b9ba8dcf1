//! Persistence seams for employees, requests and their audit trail.
//!
//! Two backends implement every trait: [`mysql::MySqlStore`] for real
//! deployments and [`memory::MemoryStore`] for tests and local runs.

pub mod memory;
pub mod mysql;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::model::{
    action::{ActionDetail, ActionEntry},
    employee::{Employee, EmployeeSummary},
    request::{Request, RequestDetail, RequestStatus},
    role::Role,
};

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("database error: {0}")]
    Database(#[from] sqlx::Error),

    #[error("duplicate entry: {0}")]
    Duplicate(String),

    #[error("corrupt row: {0}")]
    Corrupt(String),

    #[error("store unavailable: {0}")]
    Unavailable(String),
}

pub type StoreResult<T> = Result<T, StoreError>;

#[derive(Debug, Clone)]
pub struct NewEmployee {
    pub email: String,
    pub password_hash: String,
    pub full_name: String,
    pub role: Role,
    pub manager_id: Option<u64>,
}

#[derive(Debug, Clone)]
pub struct NewRequest {
    pub title: String,
    pub description: String,
    pub created_by: u64,
    pub assigned_to: u64,
}

/// Column changes applied by a status transition.
#[derive(Debug, Clone)]
pub struct StatusUpdate {
    pub status: RequestStatus,
    pub approved_by: Option<u64>,
    pub closed_at: Option<DateTime<Utc>>,
}

#[derive(Debug, Clone, Default)]
pub struct RequestFilter {
    pub created_by: Option<u64>,
    pub assigned_to: Option<u64>,
    pub status: Option<RequestStatus>,
}

#[async_trait]
pub trait EmployeeStore: Send + Sync {
    /// Fails with [`StoreError::Duplicate`] when the email is taken.
    async fn create(&self, new: NewEmployee) -> StoreResult<Employee>;

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<Employee>>;

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>>;

    /// `None` both when the employee is unknown and when they have no manager.
    async fn manager_of(&self, employee_id: u64) -> StoreResult<Option<u64>>;

    /// Ordered by full name.
    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<EmployeeSummary>>;

    async fn all_emails(&self) -> StoreResult<Vec<String>>;
}

#[async_trait]
pub trait RequestStore: Send + Sync {
    /// Inserts the request (status pending) and its creation entry together.
    async fn create(&self, new: NewRequest, log: ActionEntry) -> StoreResult<Request>;

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<RequestDetail>>;

    /// Newest first.
    async fn find_all(&self, filter: &RequestFilter) -> StoreResult<Vec<RequestDetail>>;

    /// Applies `update` only if the request is still in `from`, writing `log`
    /// in the same unit of work. Returns false when the status had moved on.
    async fn transition(
        &self,
        id: u64,
        from: RequestStatus,
        update: StatusUpdate,
        log: ActionEntry,
    ) -> StoreResult<bool>;
}

#[async_trait]
pub trait ActionStore: Send + Sync {
    /// Newest first.
    async fn find_by_request(&self, request_id: u64) -> StoreResult<Vec<ActionDetail>>;
}
