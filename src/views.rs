//! Read-only views derived from the entry list. All functions are pure; the
//! entry list is newest first.

use chrono::{DateTime, Datelike, FixedOffset, NaiveDate, Utc};
use serde::Serialize;
use std::collections::BTreeSet;

use crate::models::entry::DiaryEntry;
use crate::models::mood::Mood;

/// Entries shown in the mood trend.
pub const TREND_LENGTH: usize = 7;

const DAY_MS: i64 = 24 * 60 * 60 * 1000;

#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct MoodDataPoint {
    /// Short weekday label, e.g. "Mon".
    pub date: String,
    pub score: u8,
    pub mood: Mood,
}

/// The most recent entries in chronological order.
pub fn mood_trend(entries: &[DiaryEntry], offset: &FixedOffset) -> Vec<MoodDataPoint> {
    entries
        .iter()
        .take(TREND_LENGTH)
        .rev()
        .map(|e| MoodDataPoint {
            date: e.timestamp.with_timezone(offset).format("%a").to_string(),
            score: e.mood.score(),
            mood: e.mood,
        })
        .collect()
}

/// Inclusive local-date bounds; a missing bound is unbounded.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateFilter {
    pub start: Option<NaiveDate>,
    pub end: Option<NaiveDate>,
}

impl DateFilter {
    pub fn is_empty(&self) -> bool {
        self.start.is_none() && self.end.is_none()
    }

    /// True when `at` lies between the start of `start` and the end of `end`.
    pub fn contains(&self, at: DateTime<Utc>, offset: &FixedOffset) -> bool {
        let day = at.with_timezone(offset).date_naive();
        self.start.map_or(true, |s| day >= s) && self.end.map_or(true, |e| day <= e)
    }
}

pub fn filtered_entries<'a>(
    entries: &'a [DiaryEntry],
    filter: DateFilter,
    offset: &FixedOffset,
) -> Vec<&'a DiaryEntry> {
    if filter.is_empty() {
        return entries.iter().collect();
    }
    entries
        .iter()
        .filter(|e| filter.contains(e.timestamp, offset))
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct Stats {
    pub entry_count: usize,
    pub streak: i64,
}

/// Entry count and streak.
///
/// The streak counts whole days (rounded up, at least 1) since `entries[0]`,
/// which is the most recent post rather than the first one.
pub fn stats(entries: &[DiaryEntry], now: DateTime<Utc>) -> Stats {
    let streak = entries.first().map_or(0, |latest| {
        let elapsed = (now - latest.timestamp).num_milliseconds();
        let days = if elapsed > 0 {
            (elapsed + DAY_MS - 1) / DAY_MS
        } else {
            0
        };
        days.max(1)
    });

    Stats {
        entry_count: entries.len(),
        streak,
    }
}

/// A local calendar day; `month` is 1-based.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize)]
pub struct CalendarDay {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl From<NaiveDate> for CalendarDay {
    fn from(d: NaiveDate) -> Self {
        Self {
            year: d.year(),
            month: d.month(),
            day: d.day(),
        }
    }
}

/// Days that have at least one entry.
pub fn calendar_day_map(entries: &[DiaryEntry], offset: &FixedOffset) -> BTreeSet<CalendarDay> {
    entries
        .iter()
        .map(|e| CalendarDay::from(e.timestamp.with_timezone(offset).date_naive()))
        .collect()
}

#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarCell {
    pub day: u32,
    pub has_entry: bool,
}

/// One month laid out as a grid with weeks starting on Sunday.
#[derive(Debug, Clone, Serialize, PartialEq)]
#[serde(rename_all = "camelCase")]
pub struct CalendarMonth {
    pub year: i32,
    pub month: u32,
    /// Leading `None`s pad the first week.
    pub cells: Vec<Option<CalendarCell>>,
    pub previous: (i32, u32),
    pub next: (i32, u32),
}

impl CalendarMonth {
    /// `None` when `year`/`month` do not name a real month.
    pub fn build(year: i32, month: u32, marked: &BTreeSet<CalendarDay>) -> Option<Self> {
        let first = NaiveDate::from_ymd_opt(year, month, 1)?;
        let next = shift_month(year, month, 1);
        let last_day = NaiveDate::from_ymd_opt(next.0, next.1, 1)?.pred_opt()?.day();

        let leading = first.weekday().num_days_from_sunday() as usize;
        let mut cells = vec![None; leading];
        cells.extend((1..=last_day).map(|day| {
            Some(CalendarCell {
                day,
                has_entry: marked.contains(&CalendarDay { year, month, day }),
            })
        }));

        Some(Self {
            year,
            month,
            cells,
            previous: shift_month(year, month, -1),
            next,
        })
    }
}

fn shift_month(year: i32, month: u32, delta: i32) -> (i32, u32) {
    let index = year * 12 + month as i32 - 1 + delta;
    (index.div_euclid(12), index.rem_euclid(12) as u32 + 1)
}
