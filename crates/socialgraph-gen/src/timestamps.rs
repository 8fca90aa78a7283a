//! Uniform timestamp sampling over inclusive intervals.
//!
//! Dates and times are proleptic Gregorian via `chrono`, so February 29 only
//! exists (and can only be drawn) in leap years.

use std::fmt;

use chrono::{Duration, NaiveDate, NaiveDateTime, NaiveTime, Timelike};
use rand::Rng;
use serde::{Deserialize, Serialize};

use crate::error::{GenerationError, Result};

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Precision {
    Date,
    Second,
    Millisecond,
}

impl Precision {
    pub fn format(self) -> &'static str {
        match self {
            Precision::Date => "%Y-%m-%d",
            Precision::Second => "%Y-%m-%dT%H:%M:%S",
            Precision::Millisecond => "%Y-%m-%dT%H:%M:%S%.3f",
        }
    }

    fn step_millis(self) -> i64 {
        match self {
            Precision::Date => 86_400_000,
            Precision::Second => 1_000,
            Precision::Millisecond => 1,
        }
    }

    /// Drop everything finer than this precision.
    pub fn truncate(self, value: NaiveDateTime) -> NaiveDateTime {
        match self {
            Precision::Date => value.date().and_time(NaiveTime::MIN),
            Precision::Second => value.with_nanosecond(0).unwrap_or(value),
            Precision::Millisecond => {
                let nanos = value.nanosecond() / 1_000_000 * 1_000_000;
                value.with_nanosecond(nanos).unwrap_or(value)
            }
        }
    }
}

/// Parse `YYYY-MM-DD` or `YYYY-MM-DDTHH:MM:SS[.fff]`.
pub fn parse_datetime(raw: &str) -> Option<NaiveDateTime> {
    let trimmed = raw.trim().trim_end_matches('Z');
    NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S%.f")
        .or_else(|_| NaiveDateTime::parse_from_str(trimmed, "%Y-%m-%dT%H:%M:%S"))
        .ok()
        .or_else(|| {
            NaiveDate::parse_from_str(trimmed, "%Y-%m-%d")
                .ok()
                .map(|date| date.and_time(NaiveTime::MIN))
        })
}

/// A point in time rendered at a fixed precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct Timestamp {
    value: NaiveDateTime,
    precision: Precision,
}

impl Timestamp {
    pub fn new(value: NaiveDateTime, precision: Precision) -> Self {
        Self {
            value: precision.truncate(value),
            precision,
        }
    }

    pub fn parse(raw: &str, precision: Precision) -> Option<Self> {
        parse_datetime(raw).map(|value| Self::new(value, precision))
    }

    pub fn value(&self) -> NaiveDateTime {
        self.value
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn render(&self) -> String {
        self.value.format(self.precision.format()).to_string()
    }
}

impl fmt::Display for Timestamp {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.render())
    }
}

/// Inclusive `[start, end]` interval sampled at one precision.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Interval {
    start: NaiveDateTime,
    end: NaiveDateTime,
    precision: Precision,
}

impl Interval {
    pub fn new(start: NaiveDateTime, end: NaiveDateTime, precision: Precision) -> Result<Self> {
        let start = precision.truncate(start);
        let end = precision.truncate(end);
        if start > end {
            return Err(GenerationError::InvalidInterval {
                start: start.format(precision.format()).to_string(),
                end: end.format(precision.format()).to_string(),
                reason: "start is after end".to_string(),
            });
        }
        Ok(Self {
            start,
            end,
            precision,
        })
    }

    pub fn parse(start: &str, end: &str, precision: Precision) -> Result<Self> {
        let invalid = |reason: String| GenerationError::InvalidInterval {
            start: start.to_string(),
            end: end.to_string(),
            reason,
        };
        let from = parse_datetime(start).ok_or_else(|| invalid(format!("cannot parse `{start}`")))?;
        let to = parse_datetime(end).ok_or_else(|| invalid(format!("cannot parse `{end}`")))?;
        Self::new(from, to, precision)
    }

    pub fn start(&self) -> NaiveDateTime {
        self.start
    }

    pub fn end(&self) -> NaiveDateTime {
        self.end
    }

    pub fn precision(&self) -> Precision {
        self.precision
    }

    pub fn contains(&self, value: NaiveDateTime) -> bool {
        self.start <= value && value <= self.end
    }

    /// The same interval with its start raised to `lower`.
    ///
    /// A `lower` past the end collapses the interval onto `lower`, so content
    /// created late still gets a follow-up timestamp no earlier than itself.
    pub fn starting_at(&self, lower: NaiveDateTime) -> Self {
        let lower = self.precision.truncate(lower);
        let start = self.start.max(lower);
        Self {
            start,
            end: self.end.max(start),
            precision: self.precision,
        }
    }

    /// Uniform draw over every representable instant in the interval.
    pub fn sample<R: Rng + ?Sized>(&self, rng: &mut R) -> Timestamp {
        let span = (self.end - self.start).num_milliseconds();
        let steps = span / self.precision.step_millis();
        let offset = rng.gen_range(0..=steps) * self.precision.step_millis();
        Timestamp::new(self.start + Duration::milliseconds(offset), self.precision)
    }
}
