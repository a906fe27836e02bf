//! Profile, preferences, entries, deep chat and the read-only views.

use chrono::Datelike;
use std::collections::BTreeMap;
use uuid::Uuid;

use super::companion::{self, PostContext, Speaker};
use super::insights::{self, InsightView, PendingGuard, Plan, Snapshot};
use super::Journal;
use crate::error::{AppError, AppResult};
use crate::media;
use crate::models::entry::{AiComment, ChatMessage, DiaryEntry, Privacy, DEFAULT_THREAD};
use crate::models::insight::InsightPeriod;
use crate::models::locale::{Language, Text, ThemeColor};
use crate::models::mood::Mood;
use crate::models::user::UserConfig;
use crate::state::Slice;
use crate::views::{self, CalendarMonth, DateFilter, MoodDataPoint, Stats};

/// A post as submitted. Attachments are `data:` URLs.
#[derive(Debug, Clone, Default)]
pub struct EntryDraft {
    pub content: String,
    pub mood: Mood,
    pub privacy: Privacy,
    pub image: Option<String>,
    pub voice: Option<String>,
}

/// One completed chat turn.
#[derive(Debug, Clone)]
pub struct ChatTurn {
    pub thread: String,
    pub reply: String,
    pub messages: Vec<ChatMessage>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Preferences {
    pub theme: ThemeColor,
    pub language: Language,
}

async fn downscale(url: String, max_dimension: u32) -> AppResult<String> {
    tokio::task::spawn_blocking(move || media::downscale_image(&url, max_dimension))
        .await
        .map_err(|e| AppError::Internal(e.into()))?
        .map_err(AppError::from)
}

impl Journal {
    async fn prepare_avatar(&self, avatar: String) -> AppResult<String> {
        if media::is_data_url(&avatar) {
            return downscale(avatar, self.media.max_avatar_dimension).await;
        }
        let avatar = avatar.trim();
        if avatar.is_empty() {
            return Err(AppError::Validation("Avatar must not be empty".into()));
        }
        Ok(avatar.to_string())
    }

    pub async fn update_profile(
        &self,
        name: Option<String>,
        avatar: Option<String>,
    ) -> AppResult<UserConfig> {
        let avatar = match avatar {
            Some(a) => Some(self.prepare_avatar(a).await?),
            None => None,
        };

        let mut data = self.lock_fresh().await;
        if let Some(name) = name {
            data.user.name = name.trim().to_string();
        }
        if let Some(avatar) = avatar {
            data.user.avatar = avatar;
        }
        self.persist(&mut data, &[Slice::User]).await;
        Ok(data.user.clone())
    }

    pub async fn complete_onboarding(
        &self,
        name: String,
        avatar: Option<String>,
    ) -> AppResult<UserConfig> {
        let name = name.trim();
        if name.is_empty() {
            return Err(AppError::Validation("Name must not be empty".into()));
        }
        let avatar = match avatar {
            Some(a) => Some(self.prepare_avatar(a).await?),
            None => None,
        };

        let mut data = self.lock_fresh().await;
        data.user.name = name.to_string();
        if let Some(avatar) = avatar {
            data.user.avatar = avatar;
        }
        data.onboarding_completed = true;
        self.persist(&mut data, &[Slice::User, Slice::Onboarding]).await;

        tracing::info!("Onboarding completed");
        Ok(data.user.clone())
    }

    pub async fn preferences(&self) -> Preferences {
        self.read(|data| Preferences {
            theme: data.theme,
            language: data.language,
        })
        .await
    }

    pub async fn set_preferences(
        &self,
        theme: Option<ThemeColor>,
        language: Option<Language>,
    ) -> Preferences {
        let mut data = self.lock_fresh().await;
        if let Some(theme) = theme {
            data.theme = theme;
            self.persist(&mut data, &[Slice::Theme]).await;
        }
        if let Some(language) = language {
            data.language = language;
            self.persist(&mut data, &[Slice::Language]).await;
        }
        Preferences {
            theme: data.theme,
            language: data.language,
        }
    }

    /// Creates an entry with a comment from the primary companion.
    ///
    /// The comment is fetched without holding the state lock; AI failures
    /// become a localized fallback comment and never block the post.
    pub async fn post_entry(&self, draft: EntryDraft) -> AppResult<DiaryEntry> {
        let content = draft.content.trim().to_string();
        if content.is_empty() && draft.image.is_none() && draft.voice.is_none() {
            return Err(AppError::Validation(
                "An entry needs text, an image or a voice note".into(),
            ));
        }

        let _posting = self.begin_post()?;

        let (language, user_name, fans) = {
            let data = self.lock_fresh().await;
            data.user
                .check_post_limit()
                .map_err(|reason| AppError::denied(reason, data.language))?;
            (data.language, data.user.name.clone(), data.active_fans())
        };

        let image_url = match draft.image {
            Some(url) => Some(downscale(url, self.media.max_image_dimension).await?),
            None => None,
        };
        if let Some(voice) = &draft.voice {
            media::check_voice_note(voice, self.media.max_voice_bytes)?;
        }

        let comment = companion::entry_comment(
            self.relay.client(),
            &PostContext {
                content: &content,
                mood: draft.mood,
                language,
                user_name: &user_name,
                has_image: image_url.is_some(),
                fans: &fans,
            },
        )
        .await;

        let entry = DiaryEntry {
            id: Uuid::new_v4().to_string(),
            content: if content.is_empty() {
                language.text(Text::DefaultPostContent).to_string()
            } else {
                content
            },
            mood: draft.mood,
            timestamp: self.clock.now(),
            ai_comments: vec![AiComment::from_primary(comment)],
            deep_chat: BTreeMap::new(),
            image_url,
            voice_data: draft.voice,
            privacy: draft.privacy,
        };

        let mut data = self.lock_fresh().await;
        data.entries.insert(0, entry.clone());
        data.user.daily_posts_count += 1;
        self.persist(&mut data, &[Slice::Entries, Slice::User]).await;

        tracing::info!(
            entry_id = %entry.id,
            mood = %entry.mood,
            posts_today = data.user.daily_posts_count,
            "Entry posted"
        );
        Ok(entry)
    }

    pub async fn entries(&self, filter: DateFilter) -> Vec<DiaryEntry> {
        let offset = *self.clock.offset();
        self.read(|data| {
            views::filtered_entries(&data.entries, filter, &offset)
                .into_iter()
                .cloned()
                .collect()
        })
        .await
    }

    pub async fn entry(&self, id: &str) -> AppResult<DiaryEntry> {
        self.read(|data| data.entries.iter().find(|e| e.id == id).cloned())
            .await
            .ok_or_else(|| AppError::NotFound("Entry not found".into()))
    }

    /// Sends `message` on the entry's thread with a companion and appends
    /// the reply. `fan_id` of `None` talks to the primary companion.
    pub async fn chat(
        &self,
        entry_id: &str,
        fan_id: Option<String>,
        message: &str,
    ) -> AppResult<ChatTurn> {
        let message = message.trim();
        if message.is_empty() {
            return Err(AppError::Validation("Message must not be empty".into()));
        }
        let thread = fan_id.unwrap_or_else(|| DEFAULT_THREAD.to_string());

        let (snapshot, speaker, language) = {
            let mut data = self.lock_fresh().await;
            let speaker = if thread == DEFAULT_THREAD {
                Speaker::primary()
            } else {
                data.fans
                    .iter()
                    .find(|f| f.id == thread)
                    .map(Speaker::from)
                    .ok_or_else(|| AppError::NotFound("Companion not found".into()))?
            };
            let language = data.language;

            let entry = data
                .entries
                .iter_mut()
                .find(|e| e.id == entry_id)
                .ok_or_else(|| AppError::NotFound("Entry not found".into()))?;
            entry
                .deep_chat
                .entry(thread.clone())
                .or_default()
                .push(ChatMessage::user(message));
            let snapshot = entry.clone();

            self.persist(&mut data, &[Slice::Entries]).await;
            (snapshot, speaker, language)
        };

        let reply = companion::chat_reply(
            self.relay.client(),
            &snapshot,
            &speaker,
            snapshot.thread(&thread),
            language,
        )
        .await;

        let mut data = self.lock_fresh().await;
        let entry = data
            .entries
            .iter_mut()
            .find(|e| e.id == entry_id)
            .ok_or_else(|| AppError::NotFound("Entry not found".into()))?;
        let messages = entry.deep_chat.entry(thread.clone()).or_default();
        messages.push(ChatMessage::model(reply.clone()));
        let messages = messages.clone();
        self.persist(&mut data, &[Slice::Entries]).await;

        tracing::debug!(entry_id, thread = %thread, messages = messages.len(), "Chat turn completed");
        Ok(ChatTurn {
            thread,
            reply,
            messages,
        })
    }

    /// Spends one decision-helper use and asks the companion.
    pub async fn decide(&self, question: &str) -> AppResult<String> {
        let question = question.trim();
        if question.is_empty() {
            return Err(AppError::Validation("Question must not be empty".into()));
        }

        let language = {
            let mut data = self.lock_fresh().await;
            data.user
                .check_flow_limit()
                .map_err(|reason| AppError::denied(reason, data.language))?;
            data.user.daily_flow_count += 1;
            self.persist(&mut data, &[Slice::User]).await;
            data.language
        };

        Ok(companion::decision_answer(self.relay.client(), question, language).await)
    }

    pub async fn stats(&self) -> Stats {
        let now = self.clock.now();
        self.read(|data| views::stats(&data.entries, now)).await
    }

    pub async fn mood_trend(&self) -> Vec<MoodDataPoint> {
        let offset = *self.clock.offset();
        self.read(|data| views::mood_trend(&data.entries, &offset))
            .await
    }

    /// Month grid; defaults to the current local month.
    pub async fn calendar(&self, year: Option<i32>, month: Option<u32>) -> AppResult<CalendarMonth> {
        let today = self.clock.today();
        let year = year.unwrap_or(today.year());
        let month = month.unwrap_or(today.month());
        let offset = *self.clock.offset();

        let marked = self
            .read(|data| views::calendar_day_map(&data.entries, &offset))
            .await;
        CalendarMonth::build(year, month, &marked)
            .ok_or_else(|| AppError::Validation(format!("Invalid month: {year}-{month}")))
    }

    /// Current insights, regenerating them first when the journal changed
    /// since the last analysis.
    pub async fn insights(&self, period: InsightPeriod) -> InsightView {
        let (snapshot, token, window) = {
            let data = self.lock_fresh().await;
            let snapshot = Snapshot {
                entry_count: data.entries.len(),
                chat_messages: data.total_chat_messages(),
                period,
                language: data.language,
            };

            let mut state = insights::lock(&self.insights);
            let token = match state.plan(snapshot) {
                Plan::Start { token } => token,
                Plan::Idle | Plan::Pending => return state.view(),
            };
            let window: Vec<DiaryEntry> = insights::window(&data.entries, period, self.clock.now())
                .into_iter()
                .cloned()
                .collect();
            (snapshot, token, window)
        };

        let _pending = PendingGuard::new(&self.insights, token);
        tracing::debug!(token, ?period, entries = window.len(), "Generating insights");
        let refs: Vec<&DiaryEntry> = window.iter().collect();
        let result = insights::generate(
            self.relay.client(),
            &refs,
            period,
            snapshot.language,
            self.clock.offset(),
        )
        .await;

        let mut state = insights::lock(&self.insights);
        state.finish(token, snapshot, result);
        state.view()
    }
}
