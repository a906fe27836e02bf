use serde::{Deserialize, Serialize};
use std::fmt;

/// The eight moods an entry can be tagged with. Serialized as the emoji.
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum Mood {
    #[serde(rename = "😊")]
    Happy,
    #[serde(rename = "🥰")]
    Loved,
    #[serde(rename = "😌")]
    Calm,
    #[serde(rename = "🤔")]
    Thoughtful,
    #[serde(rename = "🤯")]
    Overwhelmed,
    #[serde(rename = "😔")]
    Down,
    #[serde(rename = "😭")]
    Crying,
    #[serde(rename = "😡")]
    Angry,
}

impl Mood {
    /// Picker order.
    pub const ALL: [Mood; 8] = [
        Mood::Happy,
        Mood::Loved,
        Mood::Calm,
        Mood::Thoughtful,
        Mood::Overwhelmed,
        Mood::Down,
        Mood::Crying,
        Mood::Angry,
    ];

    /// Score on the 1-5 scale used by the trend chart.
    pub fn score(self) -> u8 {
        match self {
            Mood::Happy | Mood::Loved => 5,
            Mood::Calm => 4,
            Mood::Thoughtful => 3,
            Mood::Overwhelmed | Mood::Down => 2,
            Mood::Crying | Mood::Angry => 1,
        }
    }

    pub fn emoji(self) -> &'static str {
        match self {
            Mood::Happy => "😊",
            Mood::Loved => "🥰",
            Mood::Calm => "😌",
            Mood::Thoughtful => "🤔",
            Mood::Overwhelmed => "🤯",
            Mood::Down => "😔",
            Mood::Crying => "😭",
            Mood::Angry => "😡",
        }
    }
}

impl Default for Mood {
    fn default() -> Self {
        Self::Happy
    }
}

impl fmt::Display for Mood {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.emoji())
    }
}
