use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BadgeVariant, UserId, Worker};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ComplaintStatus {
    Pending,
    Assigned,
    Completed,
    Cancelled,
    /// Any status string this dashboard does not know about.
    #[serde(other)]
    Unrecognized,
}

/// Admin actions offered for a complaint.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum ComplaintAction {
    AssignWorker,
    MarkComplete,
}

impl ComplaintStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "pending",
            ComplaintStatus::Assigned => "assigned",
            ComplaintStatus::Completed => "completed",
            ComplaintStatus::Cancelled => "cancelled",
            ComplaintStatus::Unrecognized => "unrecognized",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ComplaintStatus::Pending => "Pending",
            ComplaintStatus::Assigned => "Assigned",
            ComplaintStatus::Completed => "Completed",
            ComplaintStatus::Cancelled => "Cancelled",
            ComplaintStatus::Unrecognized => "Unknown",
        }
    }

    pub fn badge(self) -> BadgeVariant {
        match self {
            ComplaintStatus::Pending | ComplaintStatus::Unrecognized => BadgeVariant::Secondary,
            ComplaintStatus::Assigned | ComplaintStatus::Completed => BadgeVariant::Default,
            ComplaintStatus::Cancelled => BadgeVariant::Destructive,
        }
    }

    pub fn actions(self) -> &'static [ComplaintAction] {
        match self {
            ComplaintStatus::Pending => &[ComplaintAction::AssignWorker],
            ComplaintStatus::Assigned => &[ComplaintAction::MarkComplete],
            ComplaintStatus::Completed
            | ComplaintStatus::Cancelled
            | ComplaintStatus::Unrecognized => &[],
        }
    }

    pub fn allows(self, action: ComplaintAction) -> bool {
        self.actions().contains(&action)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Complaint {
    pub id: i64,
    #[serde(alias = "user_id")]
    pub user_id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub location: String,
    #[serde(default)]
    pub description: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub photo: Option<String>,
    pub status: ComplaintStatus,
    #[serde(default, alias = "assigned_worker")]
    pub assigned_worker: Option<Worker>,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(alias = "updated_at")]
    pub updated_at: DateTime<Utc>,
}
