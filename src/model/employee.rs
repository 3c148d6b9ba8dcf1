use chrono::{DateTime, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use super::role::Role;

#[derive(Debug, Clone, Serialize, ToSchema)]
#[schema(
    example = json!({
        "id": 2,
        "email": "jane.doe@company.com",
        "full_name": "Jane Doe",
        "role": "employee",
        "manager_id": 1,
        "created_at": "2026-01-01T00:00:00Z"
    })
)]
pub struct Employee {
    #[schema(example = 2)]
    pub id: u64,

    #[schema(example = "jane.doe@company.com")]
    pub email: String,

    /// argon2 PHC string, never leaves the server
    #[serde(skip)]
    pub password_hash: String,

    #[schema(example = "Jane Doe")]
    pub full_name: String,

    pub role: Role,

    #[schema(example = 1, nullable = true)]
    pub manager_id: Option<u64>,

    pub created_at: DateTime<Utc>,
}

impl Employee {
    pub fn summary(&self) -> EmployeeSummary {
        EmployeeSummary {
            id: self.id,
            full_name: self.full_name.clone(),
            email: self.email.clone(),
        }
    }
}

/// Public projection embedded in request and action listings.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, ToSchema)]
pub struct EmployeeSummary {
    #[schema(example = 2)]
    pub id: u64,
    #[schema(example = "Jane Doe")]
    pub full_name: String,
    #[schema(example = "jane.doe@company.com")]
    pub email: String,
}
