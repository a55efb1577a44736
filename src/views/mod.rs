pub mod complaints;
pub mod credits;
pub mod reports;

pub use complaints::{ComplaintStats, ComplaintsView};
pub use credits::{CreditGrant, CreditStats, CreditsView};
pub use reports::{ReportStats, ReportsView};

use chrono::{DateTime, Utc};
use thiserror::Error;

use crate::services::GatewayError;

#[derive(Debug, Error)]
pub enum ViewError {
    #[error(transparent)]
    Gateway(#[from] GatewayError),

    #[error("this action is not available in the record's current state")]
    ActionUnavailable,

    #[error("{0} not found")]
    NotFound(&'static str),

    #[error("{0}")]
    Invalid(String),
}

/// "Mar 1, 2024, 10:00 AM"
pub fn format_timestamp(at: &DateTime<Utc>) -> String {
    at.format("%b %-d, %Y, %I:%M %p").to_string()
}
