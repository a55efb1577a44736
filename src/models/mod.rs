pub mod auth;
pub mod complaint;
pub mod redeem_code;
pub mod report;
pub mod user;
pub mod worker;

pub use auth::*;
pub use complaint::*;
pub use redeem_code::*;
pub use report::*;
pub use user::*;
pub use worker::*;

use serde::Serialize;

/// Visual weight of a status badge.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum BadgeVariant {
    Default,
    Secondary,
    Destructive,
}
