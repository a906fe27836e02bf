//! Tier switching and the simulated points top-up.

use super::Journal;
use crate::error::{AppError, AppResult};
use crate::models::user::{SubscriptionTier, TierChange, TierRules, UserConfig};
use crate::state::Slice;

/// Points credited by one recharge.
pub const RECHARGE_POINTS: u32 = 100;

pub fn tiers() -> Vec<TierRules> {
    SubscriptionTier::ALL
        .into_iter()
        .map(TierRules::for_tier)
        .collect()
}

impl Journal {
    pub async fn select_tier(&self, tier: SubscriptionTier) -> AppResult<(TierChange, UserConfig)> {
        let mut data = self.lock_fresh().await;
        let change = data
            .user
            .switch_tier(tier)
            .map_err(|reason| AppError::denied(reason, data.language))?;

        if let TierChange::Switched { cost } = change {
            self.persist(&mut data, &[Slice::User]).await;
            tracing::info!(?tier, cost, balance = data.user.points, "Subscription tier changed");
        }
        Ok((change, data.user.clone()))
    }

    /// Credits [`RECHARGE_POINTS`]. A wallet address marks the account as
    /// connected; without one the top-up still goes through.
    pub async fn recharge(&self, wallet_address: Option<String>) -> UserConfig {
        let mut data = self.lock_fresh().await;
        data.user.credit(RECHARGE_POINTS);

        match wallet_address.map(|a| a.trim().to_string()) {
            Some(address) if !address.is_empty() => {
                data.user.is_web3_connected = true;
                data.user.wallet_address = Some(address);
            }
            _ => tracing::debug!("Recharge without wallet, using demo credit"),
        }

        self.persist(&mut data, &[Slice::User]).await;
        tracing::info!(balance = data.user.points, "Points recharged");
        data.user.clone()
    }
}
