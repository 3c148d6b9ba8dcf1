use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use async_trait::async_trait;
use chrono::Utc;

use super::{
    ActionStore, EmployeeStore, NewEmployee, NewRequest, RequestFilter, RequestStore, StatusUpdate,
    StoreError, StoreResult,
};
use crate::model::{
    action::{Action, ActionDetail, ActionEntry},
    employee::{Employee, EmployeeSummary},
    request::{Request, RequestDetail, RequestStatus},
    role::Role,
};

#[derive(Default)]
struct State {
    employees: Vec<Employee>,
    requests: Vec<Request>,
    actions: Vec<Action>,
    next_employee_id: u64,
    next_request_id: u64,
    next_action_id: u64,
}

impl State {
    fn summary(&self, id: u64) -> Option<EmployeeSummary> {
        self.employees.iter().find(|e| e.id == id).map(Employee::summary)
    }

    fn detail(&self, request: &Request) -> RequestDetail {
        RequestDetail {
            request: request.clone(),
            creator: self.summary(request.created_by),
            assignee: self.summary(request.assigned_to),
            approver: request.approved_by.and_then(|id| self.summary(id)),
        }
    }

    fn push_action(&mut self, request_id: u64, log: ActionEntry) {
        self.next_action_id += 1;
        self.actions.push(Action {
            id: self.next_action_id,
            request_id,
            performed_by: log.performed_by,
            action_type: log.action_type,
            notes: Some(log.notes),
            created_at: Utc::now(),
        });
    }
}

/// Process-local store. One lock guards all three tables, so a request
/// change and its audit entry land together.
#[derive(Default)]
pub struct MemoryStore {
    state: RwLock<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }

    fn read(&self) -> StoreResult<RwLockReadGuard<'_, State>> {
        self.state
            .read()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }

    fn write(&self) -> StoreResult<RwLockWriteGuard<'_, State>> {
        self.state
            .write()
            .map_err(|_| StoreError::Unavailable("memory store lock poisoned".into()))
    }
}

#[async_trait]
impl EmployeeStore for MemoryStore {
    async fn create(&self, new: NewEmployee) -> StoreResult<Employee> {
        let mut state = self.write()?;

        if state.employees.iter().any(|e| e.email == new.email) {
            return Err(StoreError::Duplicate(format!("email {}", new.email)));
        }

        state.next_employee_id += 1;
        let employee = Employee {
            id: state.next_employee_id,
            email: new.email,
            password_hash: new.password_hash,
            full_name: new.full_name,
            role: new.role,
            manager_id: new.manager_id,
            created_at: Utc::now(),
        };
        state.employees.push(employee.clone());

        Ok(employee)
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<Employee>> {
        Ok(self.read()?.employees.iter().find(|e| e.id == id).cloned())
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        Ok(self
            .read()?
            .employees
            .iter()
            .find(|e| e.email == email)
            .cloned())
    }

    async fn manager_of(&self, employee_id: u64) -> StoreResult<Option<u64>> {
        Ok(self
            .read()?
            .employees
            .iter()
            .find(|e| e.id == employee_id)
            .and_then(|e| e.manager_id))
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<EmployeeSummary>> {
        let mut found: Vec<EmployeeSummary> = self
            .read()?
            .employees
            .iter()
            .filter(|e| e.role == role)
            .map(Employee::summary)
            .collect();
        found.sort_by(|a, b| a.full_name.cmp(&b.full_name));
        Ok(found)
    }

    async fn all_emails(&self) -> StoreResult<Vec<String>> {
        Ok(self
            .read()?
            .employees
            .iter()
            .map(|e| e.email.clone())
            .collect())
    }
}

#[async_trait]
impl RequestStore for MemoryStore {
    async fn create(&self, new: NewRequest, log: ActionEntry) -> StoreResult<Request> {
        let mut state = self.write()?;

        state.next_request_id += 1;
        let now = Utc::now();
        let request = Request {
            id: state.next_request_id,
            title: new.title,
            description: new.description,
            status: RequestStatus::Pending,
            created_by: new.created_by,
            assigned_to: new.assigned_to,
            approved_by: None,
            created_at: now,
            updated_at: now,
            closed_at: None,
        };
        state.requests.push(request.clone());
        state.push_action(request.id, log);

        Ok(request)
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<RequestDetail>> {
        let state = self.read()?;
        Ok(state
            .requests
            .iter()
            .find(|r| r.id == id)
            .map(|r| state.detail(r)))
    }

    async fn find_all(&self, filter: &RequestFilter) -> StoreResult<Vec<RequestDetail>> {
        let state = self.read()?;
        let mut found: Vec<RequestDetail> = state
            .requests
            .iter()
            .filter(|r| filter.created_by.is_none_or(|id| r.created_by == id))
            .filter(|r| filter.assigned_to.is_none_or(|id| r.assigned_to == id))
            .filter(|r| filter.status.is_none_or(|s| r.status == s))
            .map(|r| state.detail(r))
            .collect();
        found.sort_by(|a, b| {
            (b.request.created_at, b.request.id).cmp(&(a.request.created_at, a.request.id))
        });
        Ok(found)
    }

    async fn transition(
        &self,
        id: u64,
        from: RequestStatus,
        update: StatusUpdate,
        log: ActionEntry,
    ) -> StoreResult<bool> {
        let mut state = self.write()?;

        let Some(request) = state
            .requests
            .iter_mut()
            .find(|r| r.id == id && r.status == from)
        else {
            return Ok(false);
        };

        request.status = update.status;
        if update.approved_by.is_some() {
            request.approved_by = update.approved_by;
        }
        if update.closed_at.is_some() {
            request.closed_at = update.closed_at;
        }
        request.updated_at = Utc::now();

        state.push_action(id, log);
        Ok(true)
    }
}

#[async_trait]
impl ActionStore for MemoryStore {
    async fn find_by_request(&self, request_id: u64) -> StoreResult<Vec<ActionDetail>> {
        let state = self.read()?;
        let mut found: Vec<ActionDetail> = state
            .actions
            .iter()
            .filter(|a| a.request_id == request_id)
            .map(|a| ActionDetail {
                action: a.clone(),
                performer: state.summary(a.performed_by),
            })
            .collect();
        found.sort_by(|a, b| {
            (b.action.created_at, b.action.id).cmp(&(a.action.created_at, a.action.id))
        });
        Ok(found)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::model::action::ActionType;

    fn new_employee(email: &str, role: Role, manager_id: Option<u64>) -> NewEmployee {
        NewEmployee {
            email: email.to_string(),
            password_hash: "hash".to_string(),
            full_name: email.split('@').next().unwrap_or_default().to_string(),
            role,
            manager_id,
        }
    }

    #[actix_web::test]
    async fn duplicate_email_is_rejected() {
        let store = MemoryStore::new();
        EmployeeStore::create(&store, new_employee("a@x.io", Role::Employee, None))
            .await
            .unwrap();

        let err = EmployeeStore::create(&store, new_employee("a@x.io", Role::Manager, None))
            .await
            .unwrap_err();
        assert!(matches!(err, StoreError::Duplicate(_)));
    }

    #[actix_web::test]
    async fn transition_only_applies_from_expected_status() {
        let store = MemoryStore::new();
        let boss = EmployeeStore::create(&store, new_employee("boss@x.io", Role::Manager, None))
            .await
            .unwrap();
        let worker =
            EmployeeStore::create(&store, new_employee("w@x.io", Role::Employee, Some(boss.id)))
                .await
                .unwrap();

        let request = RequestStore::create(
            &store,
            NewRequest {
                title: "Desk".into(),
                description: "Standing desk".into(),
                created_by: worker.id,
                assigned_to: worker.id,
            },
            ActionEntry::new(worker.id, ActionType::Created, None),
        )
        .await
        .unwrap();

        let approve = StatusUpdate {
            status: RequestStatus::Approved,
            approved_by: Some(boss.id),
            closed_at: None,
        };
        let moved = store
            .transition(
                request.id,
                RequestStatus::Pending,
                approve.clone(),
                ActionEntry::new(boss.id, ActionType::Approved, None),
            )
            .await
            .unwrap();
        assert!(moved);

        // Second attempt from pending must not apply nor log.
        let moved = store
            .transition(
                request.id,
                RequestStatus::Pending,
                approve,
                ActionEntry::new(boss.id, ActionType::Approved, None),
            )
            .await
            .unwrap();
        assert!(!moved);

        let actions = store.find_by_request(request.id).await.unwrap();
        assert_eq!(actions.len(), 2);
        assert_eq!(actions[0].action.action_type, ActionType::Approved);
        assert_eq!(actions[1].action.action_type, ActionType::Created);
        assert_eq!(actions[0].performer.as_ref().map(|p| p.id), Some(boss.id));

        let detail = RequestStore::find_by_id(&store, request.id)
            .await
            .unwrap()
            .unwrap();
        assert_eq!(detail.request.status, RequestStatus::Approved);
        assert_eq!(detail.approver.map(|a| a.id), Some(boss.id));
    }

    #[actix_web::test]
    async fn list_by_role_is_sorted_by_name() {
        let store = MemoryStore::new();
        for email in ["zoe@x.io", "adam@x.io", "mia@x.io"] {
            EmployeeStore::create(&store, new_employee(email, Role::Employee, None))
                .await
                .unwrap();
        }
        EmployeeStore::create(&store, new_employee("boss@x.io", Role::Manager, None))
            .await
            .unwrap();

        let names: Vec<String> = store
            .list_by_role(Role::Employee)
            .await
            .unwrap()
            .into_iter()
            .map(|e| e.full_name)
            .collect();
        assert_eq!(names, vec!["adam", "mia", "zoe"]);
    }
}
