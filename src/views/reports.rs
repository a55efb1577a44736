use serde::Serialize;

use super::{ViewError, format_timestamp};
use crate::models::{AuthToken, BadgeVariant, Report, ReportStatus, UserId};
use crate::services::DataGateway;

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct ReportStats {
    pub pending: usize,
    pub reviewed: usize,
    pub resolved: usize,
}

#[derive(Debug, Serialize)]
pub struct ReportTransition {
    pub status: &'static str,
    pub label: &'static str,
}

#[derive(Debug, Serialize)]
pub struct ReportCard<'v> {
    pub id: i64,
    pub user_id: &'v UserId,
    pub complaint_id: i64,
    pub description: &'v str,
    pub status: &'static str,
    pub status_label: &'static str,
    pub badge: BadgeVariant,
    pub created_at: String,
    pub transitions: Vec<ReportTransition>,
}

#[derive(Debug, Serialize)]
pub struct ReportsPage<'v> {
    pub stats: ReportStats,
    pub reports: Vec<ReportCard<'v>>,
    pub empty: bool,
    pub needs_attention: bool,
}

fn transition_label(from: ReportStatus, to: ReportStatus) -> &'static str {
    match (from, to) {
        (ReportStatus::Pending, ReportStatus::Reviewed) => "Mark as Reviewed",
        (ReportStatus::Pending, ReportStatus::Resolved) => "Resolve",
        (_, ReportStatus::Resolved) => "Mark as Resolved",
        (_, other) => other.label(),
    }
}

/// Reports manager: user reports about worker performance.
pub struct ReportsView<'a> {
    gateway: &'a dyn DataGateway,
    token: AuthToken,
    reports: Vec<Report>,
}

impl<'a> ReportsView<'a> {
    pub async fn load(gateway: &'a dyn DataGateway, token: AuthToken) -> Result<Self, ViewError> {
        let reports = gateway.list_reports(&token).await?;
        Ok(ReportsView {
            gateway,
            token,
            reports,
        })
    }

    pub fn empty(gateway: &'a dyn DataGateway, token: AuthToken) -> Self {
        ReportsView {
            gateway,
            token,
            reports: Vec::new(),
        }
    }

    pub fn stats(&self) -> ReportStats {
        let count = |status: ReportStatus| self.reports.iter().filter(|r| r.status == status).count();

        ReportStats {
            pending: count(ReportStatus::Pending),
            reviewed: count(ReportStatus::Reviewed),
            resolved: count(ReportStatus::Resolved),
        }
    }

    /// Move a report forward. When the backend does not echo the record, the loaded one
    /// takes the new status.
    pub async fn set_status(&mut self, report_id: i64, status: ReportStatus) -> Result<&Report, ViewError> {
        let index = self
            .reports
            .iter()
            .position(|r| r.id == report_id)
            .ok_or(ViewError::NotFound("Report"))?;
        if !self.reports[index].status.can_move_to(status) {
            return Err(ViewError::ActionUnavailable);
        }

        let updated = self
            .gateway
            .set_report_status(&self.token, report_id, status)
            .await?
            .unwrap_or_else(|| Report {
                status,
                ..self.reports[index].clone()
            });

        self.reports[index] = updated;
        Ok(&self.reports[index])
    }

    pub fn page(&self) -> ReportsPage<'_> {
        let stats = self.stats();
        let reports = self
            .reports
            .iter()
            .map(|r| ReportCard {
                id: r.id,
                user_id: &r.user_id,
                complaint_id: r.complaint_id,
                description: &r.description,
                status: r.status.as_str(),
                status_label: r.status.label(),
                badge: r.status.badge(),
                created_at: format_timestamp(&r.created_at),
                transitions: r
                    .status
                    .next()
                    .iter()
                    .map(|to| ReportTransition {
                        status: to.as_str(),
                        label: transition_label(r.status, *to),
                    })
                    .collect(),
            })
            .collect();

        ReportsPage {
            stats,
            reports,
            empty: self.reports.is_empty(),
            needs_attention: stats.pending > 0,
        }
    }
}
