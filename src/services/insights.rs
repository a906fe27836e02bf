//! Periodic mood analysis.
//!
//! Analysis is expensive, so it only reruns when the journal changed in a way
//! that matters (entry count, chat volume, period or language). Requests are
//! tagged with a generation token and only the latest one may land.

use chrono::{DateTime, Duration, FixedOffset, Utc};
use std::fmt::Write as _;
use std::sync::{Mutex, MutexGuard, PoisonError};

use super::relay::CompletionClient;
use crate::models::entry::DiaryEntry;
use crate::models::insight::{InsightData, InsightPeriod};
use crate::models::locale::Language;

/// Most entries sent for one analysis.
pub const MAX_ANALYZED_ENTRIES: usize = 50;

const ANALYST_PROMPT: &str = "You are a gentle emotional-wellbeing analyst. \
You read diary entries and describe mood patterns without diagnosing. \
Respond with JSON only.";

/// The journal facts an analysis was computed from.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Snapshot {
    pub entry_count: usize,
    pub chat_messages: usize,
    pub period: InsightPeriod,
    pub language: Language,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Plan {
    /// Current data is up to date, or there is nothing to analyze.
    Idle,
    /// The same snapshot is already being analyzed.
    Pending,
    /// Run an analysis and hand `token` back to [`InsightState::finish`].
    Start { token: u64 },
}

#[derive(Debug, Clone)]
pub struct InsightView {
    pub loading: bool,
    pub data: InsightData,
}

#[derive(Debug, Default)]
pub struct InsightState {
    data: InsightData,
    analyzed: Option<Snapshot>,
    pending: Option<(Snapshot, u64)>,
    generation: u64,
}

impl InsightState {
    pub fn plan(&mut self, snapshot: Snapshot) -> Plan {
        if snapshot.entry_count == 0 || self.analyzed == Some(snapshot) {
            return Plan::Idle;
        }
        if matches!(self.pending, Some((pending, _)) if pending == snapshot) {
            return Plan::Pending;
        }

        self.generation += 1;
        self.pending = Some((snapshot, self.generation));
        Plan::Start {
            token: self.generation,
        }
    }

    /// Stores a finished analysis. Returns `false` and drops `data` when a
    /// newer request has started since `token` was issued.
    pub fn finish(&mut self, token: u64, snapshot: Snapshot, data: InsightData) -> bool {
        if token != self.generation {
            tracing::debug!(token, latest = self.generation, "Discarding stale insight result");
            return false;
        }
        self.data = data;
        self.analyzed = Some(snapshot);
        self.pending = None;
        true
    }

    /// Forgets the pending analysis for `token` if it is still the latest,
    /// so the next read starts a new one.
    pub fn abandon(&mut self, token: u64) {
        if matches!(self.pending, Some((_, pending)) if pending == token) {
            tracing::debug!(token, "Insight analysis abandoned");
            self.pending = None;
        }
    }

    pub fn view(&self) -> InsightView {
        InsightView {
            loading: self.pending.is_some(),
            data: self.data.clone(),
        }
    }
}

/// Locks the insight state. Nothing panics while holding it, so a poisoned
/// lock still guards consistent data.
pub fn lock(state: &Mutex<InsightState>) -> MutexGuard<'_, InsightState> {
    state.lock().unwrap_or_else(PoisonError::into_inner)
}

/// Held while an analysis runs. If the analysis never reaches
/// [`InsightState::finish`] (the request was cancelled), dropping the guard
/// clears its pending marker.
pub struct PendingGuard<'a> {
    state: &'a Mutex<InsightState>,
    token: u64,
}

impl<'a> PendingGuard<'a> {
    pub fn new(state: &'a Mutex<InsightState>, token: u64) -> Self {
        Self { state, token }
    }
}

impl Drop for PendingGuard<'_> {
    fn drop(&mut self) {
        lock(self.state).abandon(self.token);
    }
}

/// Entries inside the period window, newest first, capped.
pub fn window<'a>(
    entries: &'a [DiaryEntry],
    period: InsightPeriod,
    now: DateTime<Utc>,
) -> Vec<&'a DiaryEntry> {
    let since = now - Duration::days(period.window_days());
    entries
        .iter()
        .filter(|e| e.timestamp >= since)
        .take(MAX_ANALYZED_ENTRIES)
        .collect()
}

pub fn analysis_prompt(
    entries: &[&DiaryEntry],
    period: InsightPeriod,
    language: Language,
    offset: &FixedOffset,
) -> String {
    let span = match period {
        InsightPeriod::Weekly => "the past week",
        InsightPeriod::Monthly => "the past month",
    };
    let mut prompt = format!("Diary entries from {span}, newest first:\n");
    for entry in entries {
        let _ = writeln!(
            prompt,
            "- [{}] {} (score {}): {} | chat messages: {}",
            entry.timestamp.with_timezone(offset).format("%Y-%m-%d %H:%M"),
            entry.mood.emoji(),
            entry.mood.score(),
            entry.content.replace('\n', " "),
            entry.chat_message_count(),
        );
    }

    let lang = match language {
        Language::Zh => "Simplified Chinese",
        Language::En => "English",
    };
    let _ = write!(
        prompt,
        r#"
Write every string value in {lang}. Use exactly this JSON shape:
{{
  "summary": "2-3 sentence overview of the period",
  "patterns": ["recurring pattern"],
  "triggers": [{{"theme": "topic", "moodImpact": "positive or negative", "description": "how it affects mood"}}],
  "growthAdvice": [{{"category": "area", "tip": "short advice", "action": "one concrete step"}}],
  "topTopics": ["topic"]
}}"#
    );
    prompt
}

/// Pulls the first JSON object out of a reply that may wrap it in prose or
/// code fences.
pub fn parse_insights(reply: &str, period: InsightPeriod) -> Option<InsightData> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    if end < start {
        return None;
    }
    let mut data: InsightData = serde_json::from_str(&reply[start..=end]).ok()?;
    data.period = period;
    Some(data)
}

/// Runs one analysis. Never fails: any problem yields empty data.
pub async fn generate(
    client: &dyn CompletionClient,
    entries: &[&DiaryEntry],
    period: InsightPeriod,
    language: Language,
    offset: &FixedOffset,
) -> InsightData {
    if entries.is_empty() {
        return InsightData::empty(period);
    }

    let prompt = analysis_prompt(entries, period, language, offset);
    match client.complete(ANALYST_PROMPT, &prompt).await {
        Ok(Some(reply)) => parse_insights(&reply, period).unwrap_or_else(|| {
            tracing::warn!(?period, "Insight reply was not valid JSON");
            InsightData::empty(period)
        }),
        Ok(None) => InsightData::empty(period),
        Err(e) => {
            tracing::warn!(error = %e, ?period, "Insight generation failed");
            InsightData::empty(period)
        }
    }
}
