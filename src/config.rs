use anyhow::{bail, Result};
use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};

/// Timestamp layout the scheduler expects in query parameters. Whole seconds
/// only; the API rejects fractional components.
const TIMESTAMP_FORMAT: &str = "%Y-%m-%dT%H:%M:%S";

/// The [start, end] timestamp range being checked for availability.
///
/// Both endpoints are truncated to whole seconds, and `start <= end` holds
/// for every constructed window. The window is computed once at startup and
/// never changes for the duration of a run.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CheckWindow {
    start: NaiveDateTime,
    end: NaiveDateTime,
}

impl CheckWindow {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime) -> Result<Self> {
        let start = truncate_subseconds(start);
        let end = truncate_subseconds(end);

        if start > end {
            bail!("Start date {} must be before end date {}", start, end);
        }

        Ok(Self { start, end })
    }

    /// Resolve CLI dates into a concrete window.
    ///
    /// A missing start defaults to tomorrow at midnight; a missing end
    /// defaults to seven days after the start. `today` is passed in rather
    /// than read from the clock so callers control it.
    pub fn resolve(
        start: Option<NaiveDate>,
        end: Option<NaiveDate>,
        today: NaiveDate,
    ) -> Result<Self> {
        let start = start
            .unwrap_or_else(|| today + Duration::days(1))
            .and_time(NaiveTime::MIN);

        let end = match end {
            Some(date) => date.and_time(NaiveTime::MIN),
            None => start + Duration::days(7),
        };

        Self::new(start, end)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    /// Window start serialized for the `startTimestamp` query parameter.
    pub fn start_param(&self) -> String {
        self.start.format(TIMESTAMP_FORMAT).to_string()
    }

    /// Window end serialized for the `endTimestamp` query parameter.
    pub fn end_param(&self) -> String {
        self.end.format(TIMESTAMP_FORMAT).to_string()
    }
}

fn truncate_subseconds(timestamp: NaiveDateTime) -> NaiveDateTime {
    // Zero is always a valid nanosecond value, so this never actually
    // falls back.
    timestamp.with_nanosecond(0).unwrap_or(timestamp)
}
