use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};

use super::UserId;

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct RedeemCode {
    pub id: i64,
    pub code: String,
    #[serde(alias = "user_id")]
    pub user_id: UserId,
    #[serde(alias = "created_at")]
    pub created_at: DateTime<Utc>,
    #[serde(default)]
    pub redeemed: bool,
}

impl RedeemCode {
    pub fn state_label(&self) -> &'static str {
        if self.redeemed { "Used" } else { "Active" }
    }
}
