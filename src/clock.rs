use chrono::{DateTime, FixedOffset, NaiveDate, Offset, Utc};

/// Wall clock plus the user's UTC offset, which decides calendar days.
#[derive(Debug, Clone, Copy)]
pub struct Clock {
    offset: FixedOffset,
    frozen: Option<DateTime<Utc>>,
}

impl Clock {
    pub fn new(offset: FixedOffset) -> Self {
        Self {
            offset,
            frozen: None,
        }
    }

    /// A clock that always reads `at`.
    pub fn frozen(at: DateTime<Utc>, offset: FixedOffset) -> Self {
        Self {
            offset,
            frozen: Some(at),
        }
    }

    /// Millisecond precision, the resolution entries are stored at.
    pub fn now(&self) -> DateTime<Utc> {
        let now = self.frozen.unwrap_or_else(Utc::now);
        DateTime::from_timestamp_millis(now.timestamp_millis()).unwrap_or(now)
    }

    pub fn today(&self) -> NaiveDate {
        self.now().with_timezone(&self.offset).date_naive()
    }

    pub fn offset(&self) -> &FixedOffset {
        &self.offset
    }
}

impl Default for Clock {
    fn default() -> Self {
        Self::new(Utc.fix())
    }
}
