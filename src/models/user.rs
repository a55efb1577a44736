use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use uuid::Uuid;

/// User id as issued by the backend: numeric on the REST API, a UUID on the hosted one.
#[derive(Debug, Clone, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(untagged)]
pub enum UserId {
    Numeric(i64),
    Uuid(Uuid),
}

impl fmt::Display for UserId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            UserId::Numeric(id) => write!(f, "{}", id),
            UserId::Uuid(id) => write!(f, "{}", id),
        }
    }
}

impl FromStr for UserId {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if let Ok(id) = s.parse::<i64>() {
            return Ok(UserId::Numeric(id));
        }
        Uuid::parse_str(s)
            .map(UserId::Uuid)
            .map_err(|_| format!("Invalid user ID: {}", s))
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, Copy, PartialEq, Eq, Default)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    #[default]
    User,
    Admin,
}

impl Role {
    pub fn is_admin(self) -> bool {
        matches!(self, Role::Admin)
    }
}

#[derive(Debug, Serialize, Deserialize, Clone, PartialEq)]
pub struct Profile {
    pub id: UserId,
    #[serde(default)]
    pub name: String,
    #[serde(default)]
    pub email: String,
    #[serde(default)]
    pub role: Role,
    #[serde(default)]
    pub credits: i64,
}

/// Reward level shown next to a user's balance.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
pub enum CreditTier {
    GreenBeginner,
    EcoWarrior,
    GreenHero,
    EcoChampion,
}

impl CreditTier {
    pub const HERO_THRESHOLD: i64 = 100;

    pub fn for_balance(credits: i64) -> Self {
        match credits {
            c if c >= 200 => CreditTier::EcoChampion,
            c if c >= Self::HERO_THRESHOLD => CreditTier::GreenHero,
            c if c >= 50 => CreditTier::EcoWarrior,
            _ => CreditTier::GreenBeginner,
        }
    }

    pub fn label(self) -> &'static str {
        match self {
            CreditTier::EcoChampion => "Eco Champion",
            CreditTier::GreenHero => "Green Hero",
            CreditTier::EcoWarrior => "Eco Warrior",
            CreditTier::GreenBeginner => "Green Beginner",
        }
    }

    /// CSS class used by the templates.
    pub fn css_class(self) -> &'static str {
        match self {
            CreditTier::EcoChampion => "tier-champion",
            CreditTier::GreenHero => "tier-hero",
            CreditTier::EcoWarrior => "tier-warrior",
            CreditTier::GreenBeginner => "tier-beginner",
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn user_id_parses_numbers_and_uuids() {
        assert_eq!("42".parse::<UserId>().unwrap(), UserId::Numeric(42));

        let raw = "5f0c3f7e-9a4b-4c1e-8d2a-1b2c3d4e5f60";
        let parsed = raw.parse::<UserId>().unwrap();
        assert_eq!(parsed.to_string(), raw);
        assert!("not-an-id".parse::<UserId>().is_err());
    }

    #[test]
    fn profile_defaults_role_and_credits() {
        let profile: Profile = serde_json::from_value(json!({
            "id": "5f0c3f7e-9a4b-4c1e-8d2a-1b2c3d4e5f60",
            "name": "Jane Smith",
            "email": "jane@example.com"
        }))
        .unwrap();

        assert_eq!(profile.role, Role::User);
        assert_eq!(profile.credits, 0);
        assert!(matches!(profile.id, UserId::Uuid(_)));
    }

    #[test]
    fn tiers_follow_thresholds() {
        assert_eq!(CreditTier::for_balance(0), CreditTier::GreenBeginner);
        assert_eq!(CreditTier::for_balance(49), CreditTier::GreenBeginner);
        assert_eq!(CreditTier::for_balance(50), CreditTier::EcoWarrior);
        assert_eq!(CreditTier::for_balance(100), CreditTier::GreenHero);
        assert_eq!(CreditTier::for_balance(250).label(), "Eco Champion");
    }
}
