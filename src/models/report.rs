use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::{BadgeVariant, UserId};

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ReportStatus {
    Pending,
    Reviewed,
    Resolved,
    #[serde(other)]
    Unrecognized,
}

impl ReportStatus {
    pub fn as_str(self) -> &'static str {
        match self {
            ReportStatus::Pending => "pending",
            ReportStatus::Reviewed => "reviewed",
            ReportStatus::Resolved => "resolved",
            ReportStatus::Unrecognized => "unrecognized",
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            ReportStatus::Pending => "Pending",
            ReportStatus::Reviewed => "Reviewed",
            ReportStatus::Resolved => "Resolved",
            ReportStatus::Unrecognized => "Unknown",
        }
    }

    pub fn badge(self) -> BadgeVariant {
        match self {
            ReportStatus::Pending | ReportStatus::Unrecognized => BadgeVariant::Secondary,
            ReportStatus::Reviewed | ReportStatus::Resolved => BadgeVariant::Default,
        }
    }

    /// Statuses an admin may move a report to from this one.
    pub fn next(self) -> &'static [ReportStatus] {
        match self {
            ReportStatus::Pending => &[ReportStatus::Reviewed, ReportStatus::Resolved],
            ReportStatus::Reviewed => &[ReportStatus::Resolved],
            ReportStatus::Resolved | ReportStatus::Unrecognized => &[],
        }
    }

    pub fn can_move_to(self, target: ReportStatus) -> bool {
        self.next().contains(&target)
    }
}

impl std::str::FromStr for ReportStatus {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "pending" => Ok(ReportStatus::Pending),
            "reviewed" => Ok(ReportStatus::Reviewed),
            "resolved" => Ok(ReportStatus::Resolved),
            other => Err(format!("Invalid report status: {}", other)),
        }
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct Report {
    pub id: i64,
    #[serde(alias = "user_id")]
    pub user_id: UserId,
    #[serde(alias = "complaint_id")]
    pub complaint_id: i64,
    #[serde(default)]
    pub description: String,
    pub status: ReportStatus,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
}
