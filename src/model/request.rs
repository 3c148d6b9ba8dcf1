use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use strum::{AsRefStr, Display, EnumString};
use utoipa::ToSchema;

use super::employee::EmployeeSummary;

#[derive(
    Debug, Copy, Clone, Eq, PartialEq, Serialize, Deserialize, Display, EnumString, AsRefStr, ToSchema,
)]
#[serde(rename_all = "lowercase")]
#[strum(serialize_all = "lowercase")]
pub enum RequestStatus {
    Pending,
    Approved,
    Rejected,
    Closed,
}

impl RequestStatus {
    /// pending -> approved | rejected, approved -> closed. Nothing else moves.
    pub fn can_transition_to(self, next: RequestStatus) -> bool {
        matches!(
            (self, next),
            (RequestStatus::Pending, RequestStatus::Approved)
                | (RequestStatus::Pending, RequestStatus::Rejected)
                | (RequestStatus::Approved, RequestStatus::Closed)
        )
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Request {
    #[schema(example = 10)]
    pub id: u64,
    #[schema(example = "New laptop")]
    pub title: String,
    #[schema(example = "The current one no longer holds a charge")]
    pub description: String,
    pub status: RequestStatus,
    #[schema(example = 3)]
    pub created_by: u64,
    #[schema(example = 2)]
    pub assigned_to: u64,
    #[schema(example = 1, nullable = true)]
    pub approved_by: Option<u64>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    #[schema(nullable = true)]
    pub closed_at: Option<DateTime<Utc>>,
}

/// A request together with the people it references.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct RequestDetail {
    #[serde(flatten)]
    pub request: Request,
    pub creator: Option<EmployeeSummary>,
    pub assignee: Option<EmployeeSummary>,
    pub approver: Option<EmployeeSummary>,
}
