use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;

use super::fan::AiStyle;
use super::mood::Mood;

/// Thread key of the primary companion in `DiaryEntry::deep_chat`.
pub const DEFAULT_THREAD: &str = "default";

pub const PRIMARY_COMPANION_NAME: &str = "Large";
pub const PRIMARY_COMPANION_AVATAR: &str = "🐶";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct DiaryEntry {
    pub id: String,
    pub content: String,
    pub mood: Mood,
    #[serde(with = "chrono::serde::ts_milliseconds")]
    pub timestamp: DateTime<Utc>,
    #[serde(default)]
    pub ai_comments: Vec<AiComment>,
    #[serde(default)]
    pub deep_chat: BTreeMap<String, Vec<ChatMessage>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub image_url: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub voice_data: Option<String>,
    #[serde(default)]
    pub privacy: Privacy,
}

impl DiaryEntry {
    pub fn chat_message_count(&self) -> usize {
        self.deep_chat.values().map(Vec::len).sum()
    }

    pub fn thread(&self, key: &str) -> &[ChatMessage] {
        self.deep_chat.get(key).map(Vec::as_slice).unwrap_or(&[])
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum Privacy {
    Private,
    Friends,
    Anonymous,
}

impl Default for Privacy {
    fn default() -> Self {
        Self::Private
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiComment {
    pub fan_id: String,
    pub fan_name: String,
    pub fan_avatar: String,
    #[serde(default)]
    pub style: AiStyle,
    pub content: String,
}

impl AiComment {
    /// A comment attributed to the built-in companion.
    pub fn from_primary(content: String) -> Self {
        Self {
            fan_id: DEFAULT_THREAD.to_string(),
            fan_name: PRIMARY_COMPANION_NAME.to_string(),
            fan_avatar: PRIMARY_COMPANION_AVATAR.to_string(),
            style: AiStyle::Warm,
            content,
        }
    }
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ChatRole {
    User,
    Model,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ChatMessage {
    pub role: ChatRole,
    pub content: String,
}

impl ChatMessage {
    pub fn user(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::User,
            content: content.into(),
        }
    }

    pub fn model(content: impl Into<String>) -> Self {
        Self {
            role: ChatRole::Model,
            content: content.into(),
        }
    }
}
