use std::str::FromStr;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::{FromRow, MySqlPool};
use tracing::debug;

use super::{
    ActionStore, EmployeeStore, NewEmployee, NewRequest, RequestFilter, RequestStore, StatusUpdate,
    StoreError, StoreResult,
};
use crate::model::{
    action::{Action, ActionDetail, ActionEntry, ActionType},
    employee::{Employee, EmployeeSummary},
    request::{Request, RequestDetail, RequestStatus},
    role::Role,
};

/// MySQL-backed implementation of every store trait.
#[derive(Clone)]
pub struct MySqlStore {
    pool: MySqlPool,
}

impl MySqlStore {
    pub fn new(pool: MySqlPool) -> Self {
        Self { pool }
    }
}

fn parse_enum<T: FromStr>(column: &str, value: &str) -> StoreResult<T> {
    T::from_str(value).map_err(|_| StoreError::Corrupt(format!("{column} = '{value}'")))
}

fn summary(id: u64, name: Option<String>, email: Option<String>) -> Option<EmployeeSummary> {
    Some(EmployeeSummary {
        id,
        full_name: name?,
        email: email?,
    })
}

// Helper enum for typed SQLx binding
enum FilterValue<'a> {
    U64(u64),
    Str(&'a str),
}

/* =========================
Employees
========================= */

const EMPLOYEE_COLUMNS: &str =
    "id, email, password_hash, full_name, role, manager_id, created_at";

#[derive(FromRow)]
struct EmployeeRow {
    id: u64,
    email: String,
    password_hash: String,
    full_name: String,
    role: String,
    manager_id: Option<u64>,
    created_at: DateTime<Utc>,
}

impl TryFrom<EmployeeRow> for Employee {
    type Error = StoreError;

    fn try_from(row: EmployeeRow) -> StoreResult<Self> {
        Ok(Employee {
            id: row.id,
            email: row.email,
            password_hash: row.password_hash,
            full_name: row.full_name,
            role: parse_enum("employees.role", &row.role)?,
            manager_id: row.manager_id,
            created_at: row.created_at,
        })
    }
}

#[async_trait]
impl EmployeeStore for MySqlStore {
    async fn create(&self, new: NewEmployee) -> StoreResult<Employee> {
        let result = sqlx::query(
            r#"
            INSERT INTO employees (email, password_hash, full_name, role, manager_id)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.email)
        .bind(&new.password_hash)
        .bind(&new.full_name)
        .bind(new.role.as_ref())
        .bind(new.manager_id)
        .execute(&self.pool)
        .await;

        let id = match result {
            Ok(done) => done.last_insert_id(),
            Err(e) => {
                if let sqlx::Error::Database(db_err) = &e {
                    if db_err.code() == Some("23000".into()) {
                        return Err(StoreError::Duplicate(format!("email {}", new.email)));
                    }
                }
                return Err(e.into());
            }
        };

        EmployeeStore::find_by_id(self, id)
            .await?
            .ok_or_else(|| StoreError::Corrupt(format!("employee {id} vanished after insert")))
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE id = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn find_by_email(&self, email: &str) -> StoreResult<Option<Employee>> {
        let sql = format!("SELECT {EMPLOYEE_COLUMNS} FROM employees WHERE email = ?");
        sqlx::query_as::<_, EmployeeRow>(&sql)
            .bind(email)
            .fetch_optional(&self.pool)
            .await?
            .map(Employee::try_from)
            .transpose()
    }

    async fn manager_of(&self, employee_id: u64) -> StoreResult<Option<u64>> {
        let manager = sqlx::query_scalar::<_, Option<u64>>(
            "SELECT manager_id FROM employees WHERE id = ?",
        )
        .bind(employee_id)
        .fetch_optional(&self.pool)
        .await?;

        Ok(manager.flatten())
    }

    async fn list_by_role(&self, role: Role) -> StoreResult<Vec<EmployeeSummary>> {
        let rows = sqlx::query_as::<_, (u64, String, String)>(
            "SELECT id, full_name, email FROM employees WHERE role = ? ORDER BY full_name",
        )
        .bind(role.as_ref())
        .fetch_all(&self.pool)
        .await?;

        Ok(rows
            .into_iter()
            .map(|(id, full_name, email)| EmployeeSummary {
                id,
                full_name,
                email,
            })
            .collect())
    }

    async fn all_emails(&self) -> StoreResult<Vec<String>> {
        Ok(sqlx::query_scalar::<_, String>("SELECT email FROM employees")
            .fetch_all(&self.pool)
            .await?)
    }
}

/* =========================
Requests
========================= */

const REQUEST_SELECT: &str = r#"
    SELECT
        r.id, r.title, r.description, r.status,
        r.created_by, r.assigned_to, r.approved_by,
        r.created_at, r.updated_at, r.closed_at,
        c.full_name AS creator_name, c.email AS creator_email,
        a.full_name AS assignee_name, a.email AS assignee_email,
        p.full_name AS approver_name, p.email AS approver_email
    FROM requests r
    LEFT JOIN employees c ON c.id = r.created_by
    LEFT JOIN employees a ON a.id = r.assigned_to
    LEFT JOIN employees p ON p.id = r.approved_by
"#;

#[derive(FromRow)]
struct RequestRow {
    id: u64,
    title: String,
    description: String,
    status: String,
    created_by: u64,
    assigned_to: u64,
    approved_by: Option<u64>,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
    closed_at: Option<DateTime<Utc>>,
    creator_name: Option<String>,
    creator_email: Option<String>,
    assignee_name: Option<String>,
    assignee_email: Option<String>,
    approver_name: Option<String>,
    approver_email: Option<String>,
}

impl TryFrom<RequestRow> for RequestDetail {
    type Error = StoreError;

    fn try_from(row: RequestRow) -> StoreResult<Self> {
        Ok(RequestDetail {
            creator: summary(row.created_by, row.creator_name, row.creator_email),
            assignee: summary(row.assigned_to, row.assignee_name, row.assignee_email),
            approver: row
                .approved_by
                .and_then(|id| summary(id, row.approver_name, row.approver_email)),
            request: Request {
                id: row.id,
                title: row.title,
                description: row.description,
                status: parse_enum("requests.status", &row.status)?,
                created_by: row.created_by,
                assigned_to: row.assigned_to,
                approved_by: row.approved_by,
                created_at: row.created_at,
                updated_at: row.updated_at,
                closed_at: row.closed_at,
            },
        })
    }
}

async fn insert_action<'c, E>(executor: E, request_id: u64, log: &ActionEntry) -> StoreResult<()>
where
    E: sqlx::Executor<'c, Database = sqlx::MySql>,
{
    sqlx::query(
        r#"
        INSERT INTO actions (request_id, performed_by, action_type, notes)
        VALUES (?, ?, ?, ?)
        "#,
    )
    .bind(request_id)
    .bind(log.performed_by)
    .bind(log.action_type.as_ref())
    .bind(&log.notes)
    .execute(executor)
    .await?;

    Ok(())
}

#[async_trait]
impl RequestStore for MySqlStore {
    async fn create(&self, new: NewRequest, log: ActionEntry) -> StoreResult<Request> {
        let mut tx = self.pool.begin().await?;

        let done = sqlx::query(
            r#"
            INSERT INTO requests (title, description, status, created_by, assigned_to)
            VALUES (?, ?, ?, ?, ?)
            "#,
        )
        .bind(&new.title)
        .bind(&new.description)
        .bind(RequestStatus::Pending.as_ref())
        .bind(new.created_by)
        .bind(new.assigned_to)
        .execute(&mut *tx)
        .await?;
        let id = done.last_insert_id();

        insert_action(&mut *tx, id, &log).await?;
        tx.commit().await?;

        RequestStore::find_by_id(self, id)
            .await?
            .map(|detail| detail.request)
            .ok_or_else(|| StoreError::Corrupt(format!("request {id} vanished after insert")))
    }

    async fn find_by_id(&self, id: u64) -> StoreResult<Option<RequestDetail>> {
        let sql = format!("{REQUEST_SELECT} WHERE r.id = ?");
        sqlx::query_as::<_, RequestRow>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?
            .map(RequestDetail::try_from)
            .transpose()
    }

    async fn find_all(&self, filter: &RequestFilter) -> StoreResult<Vec<RequestDetail>> {
        let mut where_sql = String::from(" WHERE 1=1");
        let mut args: Vec<FilterValue> = Vec::new();

        if let Some(id) = filter.created_by {
            where_sql.push_str(" AND r.created_by = ?");
            args.push(FilterValue::U64(id));
        }
        if let Some(id) = filter.assigned_to {
            where_sql.push_str(" AND r.assigned_to = ?");
            args.push(FilterValue::U64(id));
        }
        if let Some(status) = filter.status.as_ref() {
            where_sql.push_str(" AND r.status = ?");
            args.push(FilterValue::Str(AsRef::<str>::as_ref(status)));
        }

        let sql = format!("{REQUEST_SELECT}{where_sql} ORDER BY r.created_at DESC, r.id DESC");
        debug!(sql = %sql, "Listing requests");

        let mut query = sqlx::query_as::<_, RequestRow>(&sql);
        for arg in args {
            query = match arg {
                FilterValue::U64(v) => query.bind(v),
                FilterValue::Str(s) => query.bind(s),
            };
        }

        query
            .fetch_all(&self.pool)
            .await?
            .into_iter()
            .map(RequestDetail::try_from)
            .collect()
    }

    async fn transition(
        &self,
        id: u64,
        from: RequestStatus,
        update: StatusUpdate,
        log: ActionEntry,
    ) -> StoreResult<bool> {
        let mut tx = self.pool.begin().await?;

        let done = sqlx::query(
            r#"
            UPDATE requests
            SET status = ?,
                approved_by = COALESCE(?, approved_by),
                closed_at = COALESCE(?, closed_at),
                updated_at = CURRENT_TIMESTAMP(6)
            WHERE id = ?
            AND status = ?
            "#,
        )
        .bind(update.status.as_ref())
        .bind(update.approved_by)
        .bind(update.closed_at)
        .bind(id)
        .bind(from.as_ref())
        .execute(&mut *tx)
        .await?;

        if done.rows_affected() == 0 {
            tx.rollback().await?;
            return Ok(false);
        }

        insert_action(&mut *tx, id, &log).await?;
        tx.commit().await?;
        Ok(true)
    }
}

/* =========================
Actions
========================= */

#[derive(FromRow)]
struct ActionRow {
    id: u64,
    request_id: u64,
    performed_by: u64,
    action_type: String,
    notes: Option<String>,
    created_at: DateTime<Utc>,
    performer_name: Option<String>,
    performer_email: Option<String>,
}

impl TryFrom<ActionRow> for ActionDetail {
    type Error = StoreError;

    fn try_from(row: ActionRow) -> StoreResult<Self> {
        let action_type: ActionType = parse_enum("actions.action_type", &row.action_type)?;
        Ok(ActionDetail {
            performer: summary(row.performed_by, row.performer_name, row.performer_email),
            action: Action {
                id: row.id,
                request_id: row.request_id,
                performed_by: row.performed_by,
                action_type,
                notes: row.notes,
                created_at: row.created_at,
            },
        })
    }
}

#[async_trait]
impl ActionStore for MySqlStore {
    async fn find_by_request(&self, request_id: u64) -> StoreResult<Vec<ActionDetail>> {
        sqlx::query_as::<_, ActionRow>(
            r#"
            SELECT
                x.id, x.request_id, x.performed_by, x.action_type, x.notes, x.created_at,
                e.full_name AS performer_name, e.email AS performer_email
            FROM actions x
            LEFT JOIN employees e ON e.id = x.performed_by
            WHERE x.request_id = ?
            ORDER BY x.created_at DESC, x.id DESC
            "#,
        )
        .bind(request_id)
        .fetch_all(&self.pool)
        .await?
        .into_iter()
        .map(ActionDetail::try_from)
        .collect()
    }
}
