use serde::Serialize;
use validator::Validate;

use super::{ViewError, format_timestamp};
use crate::models::{AuthToken, CreditTier, Profile, RedeemCode, UserId};
use crate::services::DataGateway;

const RECENT_REDEMPTIONS: usize = 5;
const INVALID_GRANT: &str = "Please enter a positive number of credits, up to 1000000.";

/// A credit amount an admin asked to add; between 1 and [`CreditGrant::MAX`] once parsed.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Validate)]
pub struct CreditGrant {
    #[validate(range(min = 1, max = 1_000_000))]
    amount: i64,
}

impl CreditGrant {
    pub const MAX: i64 = 1_000_000;

    pub fn parse(raw: &str) -> Result<Self, ViewError> {
        let amount = raw
            .trim()
            .parse::<i64>()
            .map_err(|_| ViewError::Invalid(INVALID_GRANT.to_string()))?;

        let grant = CreditGrant { amount };
        grant
            .validate()
            .map_err(|_| ViewError::Invalid(INVALID_GRANT.to_string()))?;
        Ok(grant)
    }

    pub fn amount(self) -> i64 {
        self.amount
    }
}

#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq, Default)]
pub struct CreditStats {
    pub total_credits: i64,
    pub green_heroes: usize,
    pub redeem_codes: usize,
    pub average_credits: i64,
}

#[derive(Debug, Serialize)]
pub struct UserRow<'v> {
    pub id: &'v UserId,
    pub name: &'v str,
    pub email: &'v str,
    pub credits: i64,
    pub tier: &'static str,
    pub tier_class: &'static str,
}

#[derive(Debug, Serialize)]
pub struct RedemptionRow<'v> {
    pub code: &'v str,
    pub owner: String,
    pub created_at: String,
    pub state: &'static str,
    pub redeemed: bool,
}

#[derive(Debug, Serialize)]
pub struct CreditsPage<'v> {
    pub stats: CreditStats,
    pub users: Vec<UserRow<'v>>,
    pub recent_redemptions: Vec<RedemptionRow<'v>>,
    pub has_more_redemptions: bool,
}

/// Credits manager: user balances and generated reward codes.
pub struct CreditsView<'a> {
    gateway: &'a dyn DataGateway,
    token: AuthToken,
    users: Vec<Profile>,
    redeem_codes: Vec<RedeemCode>,
}

impl<'a> CreditsView<'a> {
    pub async fn load(gateway: &'a dyn DataGateway, token: AuthToken) -> Result<Self, ViewError> {
        let (users, redeem_codes) = tokio::try_join!(
            gateway.list_users(&token),
            gateway.list_redeem_codes(&token)
        )?;

        Ok(CreditsView {
            gateway,
            token,
            users,
            redeem_codes,
        })
    }

    pub fn empty(gateway: &'a dyn DataGateway, token: AuthToken) -> Self {
        CreditsView {
            gateway,
            token,
            users: Vec::new(),
            redeem_codes: Vec::new(),
        }
    }

    pub fn user(&self, id: &UserId) -> Option<&Profile> {
        self.users.iter().find(|u| &u.id == id)
    }

    pub fn stats(&self) -> CreditStats {
        let total_credits: i64 = self.users.iter().map(|u| u.credits).sum();
        let average_credits = if self.users.is_empty() {
            0
        } else {
            (total_credits as f64 / self.users.len() as f64).round() as i64
        };

        CreditStats {
            total_credits,
            green_heroes: self
                .users
                .iter()
                .filter(|u| u.credits >= CreditTier::HERO_THRESHOLD)
                .count(),
            redeem_codes: self.redeem_codes.len(),
            average_credits,
        }
    }

    /// Add credits to a user. The displayed balance becomes the previous one plus the grant.
    pub async fn add_credits(&mut self, user_id: &UserId, grant: CreditGrant) -> Result<&Profile, ViewError> {
        let index = self
            .users
            .iter()
            .position(|u| &u.id == user_id)
            .ok_or(ViewError::NotFound("User"))?;
        let balance = self.users[index]
            .credits
            .checked_add(grant.amount())
            .ok_or_else(|| ViewError::Invalid("That balance is too large to add to.".to_string()))?;

        self.gateway
            .add_credits(&self.token, user_id, grant.amount())
            .await?;

        let user = &mut self.users[index];
        user.credits = balance;
        Ok(user)
    }

    pub fn page(&self) -> CreditsPage<'_> {
        let users = self
            .users
            .iter()
            .map(|u| {
                let tier = CreditTier::for_balance(u.credits);
                UserRow {
                    id: &u.id,
                    name: &u.name,
                    email: &u.email,
                    credits: u.credits,
                    tier: tier.label(),
                    tier_class: tier.css_class(),
                }
            })
            .collect();

        let recent_redemptions = self
            .redeem_codes
            .iter()
            .take(RECENT_REDEMPTIONS)
            .map(|code| RedemptionRow {
                code: &code.code,
                owner: self
                    .user(&code.user_id)
                    .map(|u| u.name.clone())
                    .unwrap_or_else(|| format!("User {}", code.user_id)),
                created_at: format_timestamp(&code.created_at),
                state: code.state_label(),
                redeemed: code.redeemed,
            })
            .collect();

        CreditsPage {
            stats: self.stats(),
            users,
            recent_redemptions,
            has_more_redemptions: self.redeem_codes.len() > RECENT_REDEMPTIONS,
        }
    }
}
