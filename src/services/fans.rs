//! The user's companion roster.

use uuid::Uuid;

use super::Journal;
use crate::error::{AppError, AppResult};
use crate::models::fan::{self, AiFan, AiStyle, FanDraft};
use crate::state::Slice;

/// Fields of a companion that may change after creation.
#[derive(Debug, Clone, Default)]
pub struct FanUpdate {
    pub name: Option<String>,
    pub avatar: Option<String>,
    pub style: Option<AiStyle>,
    pub is_active: Option<bool>,
}

impl Journal {
    pub async fn fans(&self) -> Vec<AiFan> {
        self.read(|data| data.fans.clone()).await
    }

    /// Creates a companion for [`fan::FAN_COST`] points.
    pub async fn add_fan(&self, draft: FanDraft) -> AppResult<AiFan> {
        if draft.name.trim().is_empty() {
            return Err(AppError::Validation("Companion name must not be empty".into()));
        }

        let mut data = self.lock_fresh().await;
        let language = data.language;
        let data_ref = &mut *data;
        let created = fan::create_fan(
            &mut data_ref.fans,
            &mut data_ref.user,
            draft,
            Uuid::new_v4().to_string(),
        )
        .map_err(|reason| AppError::denied(reason, language))?
        .clone();

        self.persist(&mut data, &[Slice::Fans, Slice::User]).await;
        tracing::info!(fan_id = %created.id, balance = data.user.points, "Companion created");
        Ok(created)
    }

    pub async fn update_fan(&self, id: &str, update: FanUpdate) -> AppResult<AiFan> {
        if update.name.as_deref().is_some_and(|n| n.trim().is_empty()) {
            return Err(AppError::Validation("Companion name must not be empty".into()));
        }

        let mut data = self.lock_fresh().await;
        let fan = data
            .fans
            .iter_mut()
            .find(|f| f.id == id)
            .ok_or_else(|| AppError::NotFound("Companion not found".into()))?;

        if let Some(name) = update.name {
            fan.name = name.trim().to_string();
        }
        if let Some(avatar) = update.avatar {
            fan.avatar = avatar;
        }
        if let Some(style) = update.style {
            fan.style = style;
        }
        if let Some(active) = update.is_active {
            fan.is_active = active;
        }
        let updated = fan.clone();

        self.persist(&mut data, &[Slice::Fans]).await;
        Ok(updated)
    }

    /// Removes a companion. Points are not refunded.
    pub async fn delete_fan(&self, id: &str) -> AppResult<()> {
        let mut data = self.lock_fresh().await;
        let before = data.fans.len();
        data.fans.retain(|f| f.id != id);
        if data.fans.len() == before {
            return Err(AppError::NotFound("Companion not found".into()));
        }

        self.persist(&mut data, &[Slice::Fans]).await;
        tracing::info!(fan_id = %id, "Companion deleted");
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::super::testing::journal;
    use super::*;
    use crate::models::fan::MAX_FANS;
    use crate::models::user::Denied;
    use crate::services::relay::stub::StubCompletion;

    fn draft(name: &str) -> FanDraft {
        FanDraft {
            name: name.into(),
            avatar: "🌿".into(),
            style: AiStyle::Humorous,
        }
    }

    #[tokio::test]
    async fn test_add_fan_spends_points_once() {
        let journal = journal(StubCompletion::text("ok")).await;

        let fan = journal.add_fan(draft("Momo")).await.unwrap();
        assert!(fan.is_active);
        assert_eq!(journal.read(|d| d.user.points).await, 0);

        let err = journal.add_fan(draft("Second")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Denied {
                reason: Denied::InsufficientPoints { required: 10, balance: 0 },
                ..
            }
        ));
        assert_eq!(journal.fans().await.len(), 1);
    }

    #[tokio::test]
    async fn test_add_fan_rejects_blank_name_before_charging() {
        let journal = journal(StubCompletion::text("ok")).await;
        assert!(matches!(
            journal.add_fan(draft("  ")).await,
            Err(AppError::Validation(_))
        ));
        assert_eq!(journal.read(|d| d.user.points).await, 10);
    }

    #[tokio::test]
    async fn test_roster_is_capped() {
        let journal = journal(StubCompletion::text("ok")).await;
        journal.recharge(None).await;
        for i in 0..MAX_FANS {
            journal.add_fan(draft(&format!("fan {i}"))).await.unwrap();
        }

        let err = journal.add_fan(draft("one more")).await.unwrap_err();
        assert!(matches!(
            err,
            AppError::Denied {
                reason: Denied::FanLimit { max: MAX_FANS },
                ..
            }
        ));
        assert_eq!(journal.read(|d| d.user.points).await, 60);
    }

    #[tokio::test]
    async fn test_update_and_delete() {
        let journal = journal(StubCompletion::text("ok")).await;
        let fan = journal.add_fan(draft("Momo")).await.unwrap();

        let updated = journal
            .update_fan(
                &fan.id,
                FanUpdate {
                    style: Some(AiStyle::Cool),
                    is_active: Some(false),
                    ..Default::default()
                },
            )
            .await
            .unwrap();
        assert_eq!(updated.style, AiStyle::Cool);
        assert!(!updated.is_active);
        assert_eq!(updated.name, "Momo");
        assert!(journal.read(|d| d.active_fans()).await.is_empty());

        journal.delete_fan(&fan.id).await.unwrap();
        assert!(journal.fans().await.is_empty());
        assert!(matches!(
            journal.delete_fan(&fan.id).await,
            Err(AppError::NotFound(_))
        ));
        assert_eq!(journal.read(|d| d.user.points).await, 0);
    }
}
