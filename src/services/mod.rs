pub mod billing;
pub mod companion;
pub mod fans;
pub mod insights;
pub mod journal;
pub mod relay;

use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::{Mutex, MutexGuard};

use crate::clock::Clock;
use crate::config::MediaLimits;
use crate::error::{AppError, AppResult};
use crate::state::{AppData, Slice};
use crate::storage::KeyValueStore;
use insights::InsightState;
use relay::Relay;

/// The single user's journal: application state, its storage mirror and
/// the AI relay.
///
/// Every mutation happens under the state lock and persists the slices it
/// touched before releasing it. The lock is never held across an AI call.
pub struct Journal {
    store: Arc<dyn KeyValueStore>,
    data: Mutex<AppData>,
    insights: std::sync::Mutex<InsightState>,
    posting: AtomicBool,
    relay: Relay,
    clock: Clock,
    media: MediaLimits,
}

impl Journal {
    pub async fn open(
        store: Arc<dyn KeyValueStore>,
        relay: Relay,
        clock: Clock,
        media: MediaLimits,
    ) -> Self {
        let data = AppData::load(store.as_ref(), clock.today()).await;
        Self {
            store,
            data: Mutex::new(data),
            insights: std::sync::Mutex::new(InsightState::default()),
            posting: AtomicBool::new(false),
            relay,
            clock,
            media,
        }
    }

    pub fn relay(&self) -> &Relay {
        &self.relay
    }

    pub fn clock(&self) -> &Clock {
        &self.clock
    }

    pub async fn ping(&self) -> bool {
        match self.store.ping().await {
            Ok(()) => true,
            Err(e) => {
                tracing::warn!(error = %e, "Storage ping failed");
                false
            }
        }
    }

    /// Runs `f` against the current state after rolling the day over.
    pub async fn read<R>(&self, f: impl FnOnce(&AppData) -> R) -> R {
        let data = self.lock_fresh().await;
        f(&data)
    }

    /// Locks the state, resetting the daily counters first when the local
    /// date has changed since the last reset.
    async fn lock_fresh(&self) -> MutexGuard<'_, AppData> {
        let mut data = self.data.lock().await;
        let today = self.clock.today();
        if data.refresh_day(today) {
            tracing::info!(%today, "Daily counters reset");
            data.persist(self.store.as_ref(), Slice::User).await;
        }
        data
    }

    async fn persist(&self, data: &mut AppData, slices: &[Slice]) {
        for slice in slices {
            data.persist(self.store.as_ref(), *slice).await;
        }
    }

    /// Claims the single posting slot; dropping the guard frees it.
    fn begin_post(&self) -> AppResult<PostingGuard<'_>> {
        self.posting
            .compare_exchange(false, true, Ordering::AcqRel, Ordering::Acquire)
            .map_err(|_| AppError::Conflict("A post is already being submitted".into()))?;
        Ok(PostingGuard(&self.posting))
    }
}

struct PostingGuard<'a>(&'a AtomicBool);

impl Drop for PostingGuard<'_> {
    fn drop(&mut self) {
        self.0.store(false, Ordering::Release);
    }
}
