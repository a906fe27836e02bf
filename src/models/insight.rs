use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightData {
    pub summary: String,
    #[serde(default)]
    pub patterns: Vec<String>,
    #[serde(default)]
    pub triggers: Vec<InsightTrigger>,
    #[serde(default)]
    pub growth_advice: Vec<ActionableAdvice>,
    #[serde(default)]
    pub top_topics: Vec<String>,
    #[serde(default)]
    pub period: InsightPeriod,
}

impl InsightData {
    pub fn empty(period: InsightPeriod) -> Self {
        Self {
            period,
            ..Self::default()
        }
    }

    pub fn is_empty(&self) -> bool {
        self.summary.is_empty()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct InsightTrigger {
    pub theme: String,
    pub mood_impact: MoodImpact,
    pub description: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum MoodImpact {
    Positive,
    Negative,
}

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct ActionableAdvice {
    pub category: String,
    pub tip: String,
    pub action: String,
}

#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
#[serde(rename_all = "lowercase")]
pub enum InsightPeriod {
    Weekly,
    Monthly,
}

impl Default for InsightPeriod {
    fn default() -> Self {
        Self::Weekly
    }
}

impl InsightPeriod {
    /// How far back an analysis looks.
    pub fn window_days(self) -> i64 {
        match self {
            InsightPeriod::Weekly => 7,
            InsightPeriod::Monthly => 30,
        }
    }
}
