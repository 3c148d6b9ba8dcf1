//! Request lifecycle: creation, manager decisions, closing and the audit trail.
//!
//! ```text
//!             approve            close
//!   pending ──────────▶ approved ──────▶ closed
//!      │
//!      └──────────────▶ rejected
//!             reject
//! ```
//!
//! Every accepted step writes exactly one action entry in the same store
//! operation as the status change.

use std::sync::Arc;

use chrono::Utc;
use tracing::{info, instrument};

use crate::{
    error::AppError,
    model::{
        action::{ActionDetail, ActionEntry, ActionType},
        employee::EmployeeSummary,
        request::{Request, RequestDetail, RequestStatus},
        role::Role,
    },
    store::{ActionStore, EmployeeStore, NewRequest, RequestFilter, RequestStore, StatusUpdate},
};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Decision {
    Approve,
    Reject,
}

impl Decision {
    fn status(self) -> RequestStatus {
        match self {
            Decision::Approve => RequestStatus::Approved,
            Decision::Reject => RequestStatus::Rejected,
        }
    }

    fn action(self) -> ActionType {
        match self {
            Decision::Approve => ActionType::Approved,
            Decision::Reject => ActionType::Rejected,
        }
    }

    fn verb(self) -> &'static str {
        match self {
            Decision::Approve => "approve",
            Decision::Reject => "reject",
        }
    }

    fn past(self) -> &'static str {
        match self {
            Decision::Approve => "approved",
            Decision::Reject => "rejected",
        }
    }
}

#[derive(Clone)]
pub struct RequestService {
    employees: Arc<dyn EmployeeStore>,
    requests: Arc<dyn RequestStore>,
    actions: Arc<dyn ActionStore>,
}

impl RequestService {
    pub fn new(
        employees: Arc<dyn EmployeeStore>,
        requests: Arc<dyn RequestStore>,
        actions: Arc<dyn ActionStore>,
    ) -> Self {
        Self {
            employees,
            requests,
            actions,
        }
    }

    #[instrument(skip(self, title, description))]
    pub async fn create_request(
        &self,
        creator_id: u64,
        title: &str,
        description: &str,
        assignee_id: u64,
    ) -> Result<Request, AppError> {
        if self.employees.find_by_id(assignee_id).await?.is_none() {
            return Err(AppError::NotFound("Assigned employee not found".into()));
        }

        let request = self
            .requests
            .create(
                NewRequest {
                    title: title.trim().to_string(),
                    description: description.trim().to_string(),
                    created_by: creator_id,
                    assigned_to: assignee_id,
                },
                ActionEntry::new(creator_id, ActionType::Created, None),
            )
            .await?;

        info!(request_id = request.id, creator_id, "Request created");
        Ok(request)
    }

    pub async fn get_requests(&self, filter: &RequestFilter) -> Result<Vec<RequestDetail>, AppError> {
        Ok(self.requests.find_all(filter).await?)
    }

    pub async fn get_request(&self, request_id: u64) -> Result<RequestDetail, AppError> {
        self.requests
            .find_by_id(request_id)
            .await?
            .ok_or_else(|| AppError::NotFound("Request not found".into()))
    }

    pub async fn approve_request(
        &self,
        request_id: u64,
        manager_id: u64,
        notes: Option<String>,
    ) -> Result<RequestDetail, AppError> {
        self.decide(Decision::Approve, request_id, manager_id, notes).await
    }

    pub async fn reject_request(
        &self,
        request_id: u64,
        manager_id: u64,
        notes: Option<String>,
    ) -> Result<RequestDetail, AppError> {
        self.decide(Decision::Reject, request_id, manager_id, notes).await
    }

    #[instrument(skip(self, notes))]
    async fn decide(
        &self,
        decision: Decision,
        request_id: u64,
        manager_id: u64,
        notes: Option<String>,
    ) -> Result<RequestDetail, AppError> {
        let current = self.get_request(request_id).await?.request;

        if current.status != RequestStatus::Pending {
            return Err(AppError::InvalidState(format!(
                "Only pending requests can be {}",
                decision.past()
            )));
        }

        let assignee_manager = self.employees.manager_of(current.assigned_to).await?;
        if assignee_manager != Some(manager_id) {
            return Err(AppError::Forbidden(format!(
                "Only the assigned employee's manager can {} this request",
                decision.verb()
            )));
        }

        let update = StatusUpdate {
            status: decision.status(),
            approved_by: Some(manager_id),
            closed_at: None,
        };
        let log = ActionEntry::new(manager_id, decision.action(), notes);
        self.apply(request_id, RequestStatus::Pending, update, log, decision.past())
            .await?;

        info!(request_id, manager_id, "Request {}", decision.past());
        self.get_request(request_id).await
    }

    #[instrument(skip(self, notes))]
    pub async fn close_request(
        &self,
        request_id: u64,
        employee_id: u64,
        notes: Option<String>,
    ) -> Result<RequestDetail, AppError> {
        let current = self.get_request(request_id).await?.request;

        if current.assigned_to != employee_id {
            return Err(AppError::Forbidden(
                "Only the assigned employee can close this request".into(),
            ));
        }

        if current.status != RequestStatus::Approved {
            return Err(AppError::InvalidState(
                "Only approved requests can be closed".into(),
            ));
        }

        let update = StatusUpdate {
            status: RequestStatus::Closed,
            approved_by: None,
            closed_at: Some(Utc::now()),
        };
        let log = ActionEntry::new(employee_id, ActionType::Closed, notes);
        self.apply(request_id, RequestStatus::Approved, update, log, "closed")
            .await?;

        info!(request_id, employee_id, "Request closed");
        self.get_request(request_id).await
    }

    pub async fn get_request_actions(&self, request_id: u64) -> Result<Vec<ActionDetail>, AppError> {
        self.get_request(request_id).await?;
        Ok(self.actions.find_by_request(request_id).await?)
    }

    /// Employees that requests can be assigned to.
    pub async fn list_assignable_employees(&self) -> Result<Vec<EmployeeSummary>, AppError> {
        Ok(self.employees.list_by_role(Role::Employee).await?)
    }

    async fn apply(
        &self,
        request_id: u64,
        from: RequestStatus,
        update: StatusUpdate,
        log: ActionEntry,
        outcome: &str,
    ) -> Result<(), AppError> {
        debug_assert!(from.can_transition_to(update.status));

        // The status is re-checked by the store; losing a race to another
        // transition reads the same as arriving late.
        if self.requests.transition(request_id, from, update, log).await? {
            Ok(())
        } else {
            Err(AppError::InvalidState(format!(
                "Request is no longer {from}, it cannot be {outcome}"
            )))
        }
    }
}
