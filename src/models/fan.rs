use serde::{Deserialize, Serialize};

use super::locale::Language;
use super::user::{Denied, UserConfig};

/// Most companions a user may keep at once.
pub const MAX_FANS: usize = 5;
/// Points charged for creating one companion.
pub const FAN_COST: u32 = 10;

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct AiFan {
    pub id: String,
    pub name: String,
    pub avatar: String,
    pub style: AiStyle,
    pub is_active: bool,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum AiStyle {
    Humorous,
    Warm,
    Cute,
    Cool,
}

impl Default for AiStyle {
    fn default() -> Self {
        Self::Warm
    }
}

impl AiStyle {
    pub fn label(self, lang: Language) -> &'static str {
        match (self, lang) {
            (AiStyle::Humorous, Language::Zh) => "幽默",
            (AiStyle::Humorous, Language::En) => "Humorous",
            (AiStyle::Warm, Language::Zh) => "温暖",
            (AiStyle::Warm, Language::En) => "Warm",
            (AiStyle::Cute, Language::Zh) => "可爱",
            (AiStyle::Cute, Language::En) => "Cute",
            (AiStyle::Cool, Language::Zh) => "高冷",
            (AiStyle::Cool, Language::En) => "Cool",
        }
    }

    /// Persona hint embedded in companion prompts.
    pub fn persona(self) -> &'static str {
        match self {
            AiStyle::Humorous => "playful and light-hearted, finds gentle humor in everyday things",
            AiStyle::Warm => "warm and patient, listens closely and reassures",
            AiStyle::Cute => "sweet and bubbly, uses soft and affectionate wording",
            AiStyle::Cool => "calm and concise, speaks with quiet understatement",
        }
    }
}

/// Fields a user picks when creating a companion.
#[derive(Debug, Clone)]
pub struct FanDraft {
    pub name: String,
    pub avatar: String,
    pub style: AiStyle,
}

/// Creates a companion and charges for it. On refusal neither list nor
/// balance is touched.
pub fn create_fan<'a>(
    fans: &'a mut Vec<AiFan>,
    user: &mut UserConfig,
    draft: FanDraft,
    id: String,
) -> Result<&'a AiFan, Denied> {
    if user.points < FAN_COST {
        return Err(Denied::InsufficientPoints {
            required: FAN_COST,
            balance: user.points,
        });
    }
    if fans.len() >= MAX_FANS {
        return Err(Denied::FanLimit { max: MAX_FANS });
    }

    fans.push(AiFan {
        id,
        name: draft.name.trim().to_string(),
        avatar: draft.avatar,
        style: draft.style,
        is_active: true,
    });
    user.points = user.points.saturating_sub(FAN_COST);

    Ok(&fans[fans.len() - 1])
}
