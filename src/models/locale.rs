use serde::{Deserialize, Serialize};
use std::str::FromStr;

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum Language {
    Zh,
    En,
}

impl Default for Language {
    fn default() -> Self {
        Self::Zh
    }
}

impl Language {
    pub fn code(self) -> &'static str {
        match self {
            Language::Zh => "zh",
            Language::En => "en",
        }
    }

    pub fn text(self, text: Text) -> &'static str {
        use Language::*;
        use Text::*;
        match (text, self) {
            (CommentUnavailable, Zh) => "AI 回复暂时不可用",
            (CommentUnavailable, En) => "AI reply is temporarily unavailable",
            (CommentEmpty, Zh) => "AI 暂时没有回复",
            (CommentEmpty, En) => "AI has no reply for now",
            (MediaPlaceholder, _) => "[Media]",
            (DefaultPostContent, Zh) => "心情碎碎念",
            (DefaultPostContent, En) => "Mood thoughts",
            (ChatUnavailable, Zh) => "好像有点问题，但我还在你这边。",
            (ChatUnavailable, En) => "Something went wrong, but I'm still here with you.",
            (ChatEmpty, Zh) => "我在这儿。",
            (ChatEmpty, En) => "I'm here.",
            (DecisionPrefix, Zh) => "我现在在做选择，请帮我理清思路：",
            (DecisionPrefix, En) => "I'm trying to make a decision, please help me think it through: ",
            (DecisionUnavailable, Zh) => "现在有点卡住了，但你的问题是重要的。",
            (DecisionUnavailable, En) => "I'm a bit stuck right now, but your question matters.",
            (DecisionEmpty, Zh) => "也许可以再等等看。",
            (DecisionEmpty, En) => "Maybe it's worth waiting a little longer.",
            (LimitReachedPost, Zh) => "今日发布次数已用完，升级会员即可继续记录",
            (LimitReachedPost, En) => "You've reached today's post limit. Upgrade to keep writing.",
            (LimitReachedFlow, Zh) => "今日决策助手次数已用完，升级会员即可继续使用",
            (LimitReachedFlow, En) => "You've reached today's decision helper limit. Upgrade to keep going.",
        }
    }
}

impl FromStr for Language {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "zh" => Ok(Language::Zh),
            "en" => Ok(Language::En),
            other => Err(format!("unsupported language: {other}")),
        }
    }
}

/// Every user-facing string the service produces itself.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Text {
    CommentUnavailable,
    CommentEmpty,
    MediaPlaceholder,
    DefaultPostContent,
    ChatUnavailable,
    ChatEmpty,
    DecisionPrefix,
    DecisionUnavailable,
    DecisionEmpty,
    LimitReachedPost,
    LimitReachedFlow,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum ThemeColor {
    Pink,
    Purple,
    Indigo,
}

impl Default for ThemeColor {
    fn default() -> Self {
        Self::Pink
    }
}

impl ThemeColor {
    pub fn as_str(self) -> &'static str {
        match self {
            ThemeColor::Pink => "pink",
            ThemeColor::Purple => "purple",
            ThemeColor::Indigo => "indigo",
        }
    }
}

impl FromStr for ThemeColor {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim() {
            "pink" => Ok(ThemeColor::Pink),
            "purple" => Ok(ThemeColor::Purple),
            "indigo" => Ok(ThemeColor::Indigo),
            other => Err(format!("unsupported theme color: {other}")),
        }
    }
}
