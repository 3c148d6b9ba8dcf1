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
pub enum ActionType {
    Created,
    Approved,
    Rejected,
    Closed,
}

impl ActionType {
    /// Note recorded when the caller supplies none.
    pub fn default_note(self) -> &'static str {
        match self {
            ActionType::Created => "Request created",
            ActionType::Approved => "Request approved",
            ActionType::Rejected => "Request rejected",
            ActionType::Closed => "Request closed",
        }
    }
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Action {
    #[schema(example = 40)]
    pub id: u64,
    #[schema(example = 10)]
    pub request_id: u64,
    #[schema(example = 1)]
    pub performed_by: u64,
    pub action_type: ActionType,
    #[schema(example = "Looks fine", nullable = true)]
    pub notes: Option<String>,
    pub created_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct ActionDetail {
    #[serde(flatten)]
    pub action: Action,
    pub performer: Option<EmployeeSummary>,
}

/// An audit entry waiting to be written alongside a request change.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ActionEntry {
    pub performed_by: u64,
    pub action_type: ActionType,
    pub notes: String,
}

impl ActionEntry {
    pub fn new(performed_by: u64, action_type: ActionType, notes: Option<String>) -> Self {
        let notes = notes
            .map(|n| n.trim().to_string())
            .filter(|n| !n.is_empty())
            .unwrap_or_else(|| action_type.default_note().to_string());

        Self {
            performed_by,
            action_type,
            notes,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn blank_notes_fall_back_to_default() {
        let entry = ActionEntry::new(7, ActionType::Approved, Some("   ".into()));
        assert_eq!(entry.notes, "Request approved");

        let entry = ActionEntry::new(7, ActionType::Closed, None);
        assert_eq!(entry.notes, "Request closed");

        let entry = ActionEntry::new(7, ActionType::Rejected, Some("Over budget".into()));
        assert_eq!(entry.notes, "Over budget");
    }
}
