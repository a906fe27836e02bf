use chrono::NaiveDate;
use serde::{Deserialize, Serialize};

pub const STARTING_POINTS: u32 = 10;
pub const DEFAULT_AVATAR: &str = "😊";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct UserConfig {
    pub name: String,
    pub avatar: String,
    pub is_web3_connected: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub wallet_address: Option<String>,
    pub points: u32,
    pub subscription_tier: SubscriptionTier,
    pub daily_posts_count: u32,
    pub daily_flow_count: u32,
    pub last_reset_date: NaiveDate,
}

/// Lenient shape used when reading a stored profile: every field may be
/// missing or of the wrong type and is completed from defaults.
#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase", default)]
struct StoredUserConfig {
    name: Option<String>,
    avatar: Option<String>,
    is_web3_connected: Option<bool>,
    wallet_address: Option<String>,
    points: Option<serde_json::Value>,
    subscription_tier: Option<SubscriptionTier>,
    daily_posts_count: Option<u32>,
    daily_flow_count: Option<u32>,
    last_reset_date: Option<NaiveDate>,
}

impl UserConfig {
    pub fn default_for(today: NaiveDate) -> Self {
        Self {
            name: String::new(),
            avatar: DEFAULT_AVATAR.to_string(),
            is_web3_connected: false,
            wallet_address: None,
            points: STARTING_POINTS,
            subscription_tier: SubscriptionTier::Free,
            daily_posts_count: 0,
            daily_flow_count: 0,
            last_reset_date: today,
        }
    }

    /// Parses a stored profile, filling absent fields. `None` when the blob
    /// is not a JSON object at all.
    pub fn from_stored(raw: &str, today: NaiveDate) -> Option<Self> {
        let stored: StoredUserConfig = serde_json::from_str(raw).ok()?;
        let points = stored
            .points
            .as_ref()
            .and_then(serde_json::Value::as_f64)
            .map(|p| p.max(0.0).min(u32::MAX as f64) as u32)
            .unwrap_or(STARTING_POINTS);

        Some(Self {
            name: stored.name.unwrap_or_default(),
            avatar: stored.avatar.unwrap_or_else(|| DEFAULT_AVATAR.to_string()),
            is_web3_connected: stored.is_web3_connected.unwrap_or(false),
            wallet_address: stored.wallet_address,
            points,
            subscription_tier: stored.subscription_tier.unwrap_or_default(),
            daily_posts_count: stored.daily_posts_count.unwrap_or(0),
            daily_flow_count: stored.daily_flow_count.unwrap_or(0),
            last_reset_date: stored.last_reset_date.unwrap_or(today),
        })
    }

    /// Zeroes the daily counters when `today` differs from the last reset.
    /// Returns whether anything changed.
    pub fn reset_daily_counters(&mut self, today: NaiveDate) -> bool {
        if self.last_reset_date == today {
            return false;
        }
        self.daily_posts_count = 0;
        self.daily_flow_count = 0;
        self.last_reset_date = today;
        true
    }

    pub fn rules(&self) -> TierRules {
        TierRules::for_tier(self.subscription_tier)
    }

    pub fn check_post_limit(&self) -> Result<(), Denied> {
        match self.rules().daily_posts {
            Some(limit) if self.daily_posts_count >= limit => {
                Err(Denied::DailyLimit(LimitKind::Post))
            }
            _ => Ok(()),
        }
    }

    pub fn can_use_flow(&self) -> bool {
        match self.rules().daily_flows {
            Some(limit) => self.daily_flow_count < limit,
            None => true,
        }
    }

    pub fn check_flow_limit(&self) -> Result<(), Denied> {
        if self.can_use_flow() {
            Ok(())
        } else {
            Err(Denied::DailyLimit(LimitKind::Flow))
        }
    }

    /// Moves to `tier`, paying its point cost. Picking the current tier is a
    /// no-op; a short balance leaves the profile untouched.
    pub fn switch_tier(&mut self, tier: SubscriptionTier) -> Result<TierChange, Denied> {
        if tier == self.subscription_tier {
            return Ok(TierChange::Unchanged);
        }
        let cost = TierRules::for_tier(tier).cost;
        if self.points < cost {
            return Err(Denied::InsufficientPoints {
                required: cost,
                balance: self.points,
            });
        }
        self.subscription_tier = tier;
        self.points -= cost;
        Ok(TierChange::Switched { cost })
    }

    pub fn credit(&mut self, points: u32) {
        self.points = self.points.saturating_add(points);
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum SubscriptionTier {
    Free,
    Basic,
    Premium,
}

impl Default for SubscriptionTier {
    fn default() -> Self {
        Self::Free
    }
}

impl SubscriptionTier {
    pub const ALL: [SubscriptionTier; 3] = [
        SubscriptionTier::Free,
        SubscriptionTier::Basic,
        SubscriptionTier::Premium,
    ];
}

/// What a tier allows and what it costs. `None` limits are unlimited.
#[derive(Debug, Serialize, Clone, Copy, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct TierRules {
    pub tier: SubscriptionTier,
    pub daily_posts: Option<u32>,
    pub daily_flows: Option<u32>,
    pub cost: u32,
}

impl TierRules {
    pub fn for_tier(tier: SubscriptionTier) -> Self {
        match tier {
            SubscriptionTier::Free => Self {
                tier,
                daily_posts: Some(1),
                daily_flows: Some(1),
                cost: 0,
            },
            SubscriptionTier::Basic => Self {
                tier,
                daily_posts: Some(2),
                daily_flows: Some(5),
                cost: 50,
            },
            SubscriptionTier::Premium => Self {
                tier,
                daily_posts: None,
                daily_flows: None,
                cost: 69,
            },
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum TierChange {
    Unchanged,
    Switched { cost: u32 },
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum LimitKind {
    Post,
    Flow,
}

/// Business-rule refusals. Expected outcomes rather than failures; nothing
/// is mutated when one is returned.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum Denied {
    #[error("Insufficient points: {required} required, {balance} available")]
    InsufficientPoints { required: u32, balance: u32 },

    #[error("Companion limit of {max} reached")]
    FanLimit { max: usize },

    #[error("Daily {0:?} limit reached")]
    DailyLimit(LimitKind),
}
