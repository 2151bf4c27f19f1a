use std::fmt;

use chrono::NaiveDate;
use serde::{Deserialize, Deserializer, Serialize, Serializer};

use crate::errors::AppError;

pub const MINUTES_PER_DAY: u32 = 24 * 60;

/// Wall-clock time as minutes since midnight. Rendered as `HH:MM`.
///
/// `24:00` is the end of the day, so a booking may finish exactly at midnight.
/// Values may run past it when a duration is added; callers that need a
/// same-day time check [`TimeOfDay::is_same_day`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct TimeOfDay(u32);

impl TimeOfDay {
    pub fn from_minutes(minutes: u32) -> Self {
        Self(minutes)
    }

    pub fn minutes(self) -> u32 {
        self.0
    }

    pub fn parse(s: &str) -> Result<Self, AppError> {
        let (h, m) = s
            .split_once(':')
            .ok_or_else(|| AppError::Validation(format!("invalid time format: {s}, expected HH:MM")))?;
        if h.len() != 2 || m.len() != 2 {
            return Err(AppError::Validation(format!(
                "invalid time format: {s}, expected HH:MM"
            )));
        }
        let hour: u32 = h
            .parse()
            .map_err(|_| AppError::Validation(format!("invalid hour in: {s}")))?;
        let minute: u32 = m
            .parse()
            .map_err(|_| AppError::Validation(format!("invalid minute in: {s}")))?;
        let end_of_day = hour == 24 && minute == 0;
        if (hour > 23 || minute > 59) && !end_of_day {
            return Err(AppError::Validation(format!("time out of range: {s}")));
        }
        Ok(Self(hour * 60 + minute))
    }

    pub fn plus_minutes(self, minutes: u32) -> Self {
        Self(self.0.saturating_add(minutes))
    }

    pub fn is_same_day(self) -> bool {
        self.0 <= MINUTES_PER_DAY
    }
}

impl fmt::Display for TimeOfDay {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:02}:{:02}", self.0 / 60, self.0 % 60)
    }
}

impl Serialize for TimeOfDay {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_str(self)
    }
}

impl<'de> Deserialize<'de> for TimeOfDay {
    fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
        let s = String::deserialize(deserializer)?;
        TimeOfDay::parse(&s).map_err(serde::de::Error::custom)
    }
}

pub fn parse_date(s: &str) -> Result<NaiveDate, AppError> {
    NaiveDate::parse_from_str(s.trim(), "%Y-%m-%d")
        .map_err(|_| AppError::Validation(format!("invalid date: {s}, expected YYYY-MM-DD")))
}

/// A same-day span of wall-clock time. Appointments, holds, and candidate
/// slots all reduce to this so conflicts are computed one way.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct TimeInterval {
    pub date: NaiveDate,
    pub start: TimeOfDay,
    pub end: TimeOfDay,
}

impl TimeInterval {
    pub fn new(date: NaiveDate, start: TimeOfDay, end: TimeOfDay) -> Self {
        Self { date, start, end }
    }

    pub fn with_duration(date: NaiveDate, start: TimeOfDay, duration_minutes: u32) -> Self {
        Self {
            date,
            start,
            end: start.plus_minutes(duration_minutes),
        }
    }

    pub fn duration_minutes(&self) -> u32 {
        self.end.minutes().saturating_sub(self.start.minutes())
    }
}
