//! Prompts and localized fallbacks for everything a companion says.
//!
//! Every function here resolves to text: vendor failures become the
//! localized fallback line and are only logged.

use std::fmt::Write as _;

use super::relay::{CompletionClient, SYSTEM_PROMPT};
use crate::models::entry::{ChatMessage, ChatRole, DiaryEntry, PRIMARY_COMPANION_NAME};
use crate::models::fan::{AiFan, AiStyle};
use crate::models::locale::{Language, Text};
use crate::models::mood::Mood;

/// Thread messages replayed to the vendor on each chat turn.
pub const CHAT_HISTORY: usize = 10;

/// What the companion knows about a post being written.
#[derive(Debug, Clone)]
pub struct PostContext<'a> {
    pub content: &'a str,
    pub mood: Mood,
    pub language: Language,
    pub user_name: &'a str,
    pub has_image: bool,
    pub fans: &'a [AiFan],
}

/// Who is speaking in a chat thread.
#[derive(Debug, Clone)]
pub struct Speaker {
    pub name: String,
    pub style: AiStyle,
}

impl Speaker {
    pub fn primary() -> Self {
        Self {
            name: PRIMARY_COMPANION_NAME.to_string(),
            style: AiStyle::Warm,
        }
    }
}

impl From<&AiFan> for Speaker {
    fn from(fan: &AiFan) -> Self {
        Self {
            name: fan.name.clone(),
            style: fan.style,
        }
    }
}

fn reply_language(language: Language) -> &'static str {
    match language {
        Language::Zh => "Reply in Simplified Chinese.",
        Language::En => "Reply in English.",
    }
}

pub fn entry_prompt(ctx: &PostContext<'_>) -> String {
    let content = match ctx.content.trim() {
        "" => ctx.language.text(Text::MediaPlaceholder),
        text => text,
    };
    let name = match ctx.user_name.trim() {
        "" => "the user",
        name => name,
    };

    let mut prompt = format!(
        "{name} just wrote a diary entry feeling {mood} (mood score {score}/5).\n\
         Entry: {content}\n",
        mood = ctx.mood.emoji(),
        score = ctx.mood.score(),
    );
    if ctx.has_image {
        prompt.push_str("A photo is attached to the entry.\n");
    }
    if !ctx.fans.is_empty() {
        prompt.push_str("Other companions reading along:\n");
        for fan in ctx.fans {
            let _ = writeln!(prompt, "- {} ({})", fan.name, fan.style.persona());
        }
    }
    let _ = write!(
        prompt,
        "As {PRIMARY_COMPANION_NAME}, leave one short comment on the entry. {}",
        reply_language(ctx.language)
    );
    prompt
}

/// A fresh comment on a new entry.
pub async fn entry_comment(client: &dyn CompletionClient, ctx: &PostContext<'_>) -> String {
    let prompt = entry_prompt(ctx);
    match client.complete(SYSTEM_PROMPT, &prompt).await {
        Ok(Some(text)) => text,
        Ok(None) => ctx.language.text(Text::CommentEmpty).to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Companion comment failed, using fallback");
            ctx.language.text(Text::CommentUnavailable).to_string()
        }
    }
}

/// `history` already ends with the user's latest message.
pub fn chat_prompt(
    entry: &DiaryEntry,
    speaker: &Speaker,
    history: &[ChatMessage],
    language: Language,
) -> String {
    let mut prompt = format!(
        "You are {name}, a companion who is {persona}.\n\
         You are talking with the author about this diary entry (mood {mood}):\n\
         {content}\n\nConversation so far:\n",
        name = speaker.name,
        persona = speaker.style.persona(),
        mood = entry.mood.emoji(),
        content = entry.content,
    );

    let start = history.len().saturating_sub(CHAT_HISTORY);
    for message in &history[start..] {
        let who = match message.role {
            ChatRole::User => "Author",
            ChatRole::Model => speaker.name.as_str(),
        };
        let _ = writeln!(prompt, "{who}: {}", message.content);
    }
    let _ = write!(
        prompt,
        "Answer the author's last message as {}. {}",
        speaker.name,
        reply_language(language)
    );
    prompt
}

pub async fn chat_reply(
    client: &dyn CompletionClient,
    entry: &DiaryEntry,
    speaker: &Speaker,
    history: &[ChatMessage],
    language: Language,
) -> String {
    let prompt = chat_prompt(entry, speaker, history, language);
    match client.complete(SYSTEM_PROMPT, &prompt).await {
        Ok(Some(text)) => text,
        Ok(None) => language.text(Text::ChatEmpty).to_string(),
        Err(e) => {
            tracing::warn!(error = %e, companion = %speaker.name, "Chat reply failed");
            language.text(Text::ChatUnavailable).to_string()
        }
    }
}

pub async fn decision_answer(
    client: &dyn CompletionClient,
    question: &str,
    language: Language,
) -> String {
    let prompt = format!("{}{}", language.text(Text::DecisionPrefix), question.trim());
    match client.complete(SYSTEM_PROMPT, &prompt).await {
        Ok(Some(text)) => text,
        Ok(None) => language.text(Text::DecisionEmpty).to_string(),
        Err(e) => {
            tracing::warn!(error = %e, "Decision helper failed");
            language.text(Text::DecisionUnavailable).to_string()
        }
    }
}
