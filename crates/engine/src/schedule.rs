// SPDX-License-Identifier: BUSL-1.1
// Copyright (c) 2026 Alfred Jean LLC

//! Trigger schedules: fixed intervals and Quartz-style cron expressions.
//!
//! Cron expressions have 6 or 7 space-separated fields:
//! `sec min hour day-of-month month day-of-week [year]`. Each field accepts
//! `*`, values, ranges `a-b`, steps `a/b` and `*/b`, and comma lists. The
//! day fields also accept `?`. Months take `JAN`..`DEC` and weekdays
//! `SUN`..`SAT` (1 = Sunday). All times are UTC.

use chrono::{DateTime, Datelike, NaiveDate, NaiveDateTime, TimeDelta, TimeZone, Timelike, Utc};
use std::fmt;
use std::str::FromStr;
use std::time::Duration;
use thiserror::Error;

/// Fire times are not searched past this year
pub const MAX_YEAR: i32 = 2099;
const MIN_YEAR: i32 = 1970;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ScheduleError {
    #[error("invalid schedule {expr:?}: {reason}")]
    InvalidSchedule { expr: String, reason: String },
}

fn invalid(expr: &str, reason: impl Into<String>) -> ScheduleError {
    ScheduleError::InvalidSchedule { expr: expr.to_string(), reason: reason.into() }
}

/// When a sweep fires
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Schedule {
    /// Fixed delay between runs
    Every(Duration),
    Cron(CronExpr),
}

impl Schedule {
    /// First fire time strictly after `after`, if any.
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        match self {
            Schedule::Every(interval) => {
                after.checked_add_signed(TimeDelta::from_std(*interval).ok()?)
            }
            Schedule::Cron(expr) => expr.next_after(after),
        }
    }
}

impl FromStr for Schedule {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        // "30 s" is still a duration; cron needs at least six fields
        if s.split_whitespace().count() > 2 {
            return CronExpr::from_str(s).map(Schedule::Cron);
        }
        let interval = parse_duration(s).map_err(|reason| invalid(s, reason))?;
        if interval.is_zero() {
            return Err(invalid(s, "interval must be positive"));
        }
        Ok(Schedule::Every(interval))
    }
}

impl fmt::Display for Schedule {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Schedule::Every(d) if d.subsec_millis() != 0 => write!(f, "every {}ms", d.as_millis()),
            Schedule::Every(d) => write!(f, "every {}s", d.as_secs()),
            Schedule::Cron(expr) => write!(f, "cron {expr}"),
        }
    }
}

/// Parse a duration string like "30s", "5m", "1h" into a Duration
pub fn parse_duration(s: &str) -> Result<Duration, String> {
    let s = s.trim();
    if s.is_empty() {
        return Err("empty duration string".to_string());
    }

    let (num_str, suffix) = s
        .char_indices()
        .find(|(_, c)| !c.is_ascii_digit())
        .map(|(i, _)| (&s[..i], &s[i..]))
        .unwrap_or((s, ""));

    let num: u64 = num_str.parse().map_err(|_| format!("invalid number in duration: {}", s))?;

    let multiplier = match suffix.trim() {
        "ms" | "millis" | "millisecond" | "milliseconds" => {
            return Ok(Duration::from_millis(num));
        }
        "" | "s" | "sec" | "secs" | "second" | "seconds" => 1,
        "m" | "min" | "mins" | "minute" | "minutes" => 60,
        "h" | "hr" | "hrs" | "hour" | "hours" => 3600,
        "d" | "day" | "days" => 86400,
        other => return Err(format!("unknown duration suffix: {}", other)),
    };

    let secs = num.checked_mul(multiplier).ok_or_else(|| format!("duration too large: {}", s))?;
    Ok(Duration::from_secs(secs))
}

/// Allowed values of one cron field, one bit per value
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
struct Field(u64);

impl Field {
    fn matches(self, value: u32) -> bool {
        value < 64 && self.0 & (1u64 << value) != 0
    }
}

struct FieldSpec {
    name: &'static str,
    min: u32,
    max: u32,
    names: &'static [&'static str],
    allow_question: bool,
}

const MONTH_NAMES: &[&str] =
    &["JAN", "FEB", "MAR", "APR", "MAY", "JUN", "JUL", "AUG", "SEP", "OCT", "NOV", "DEC"];
const DAY_NAMES: &[&str] = &["SUN", "MON", "TUE", "WED", "THU", "FRI", "SAT"];

const SECONDS: FieldSpec =
    FieldSpec { name: "seconds", min: 0, max: 59, names: &[], allow_question: false };
const MINUTES: FieldSpec =
    FieldSpec { name: "minutes", min: 0, max: 59, names: &[], allow_question: false };
const HOURS: FieldSpec =
    FieldSpec { name: "hours", min: 0, max: 23, names: &[], allow_question: false };
const DAYS_OF_MONTH: FieldSpec =
    FieldSpec { name: "day-of-month", min: 1, max: 31, names: &[], allow_question: true };
const MONTHS: FieldSpec =
    FieldSpec { name: "month", min: 1, max: 12, names: MONTH_NAMES, allow_question: false };
const DAYS_OF_WEEK: FieldSpec =
    FieldSpec { name: "day-of-week", min: 1, max: 7, names: DAY_NAMES, allow_question: true };

impl FieldSpec {
    fn value(&self, s: &str) -> Result<u32, String> {
        let value = match s.parse::<u32>() {
            Ok(n) => n,
            Err(_) => self
                .names
                .iter()
                .position(|name| name.eq_ignore_ascii_case(s))
                .map(|i| self.min + i as u32)
                .ok_or_else(|| format!("unknown {} value {s:?}", self.name))?,
        };
        if value < self.min || value > self.max {
            return Err(format!(
                "{} value {value} out of range {}-{}",
                self.name, self.min, self.max
            ));
        }
        Ok(value)
    }

    fn parse(&self, text: &str) -> Result<Field, String> {
        let mut bits = 0u64;
        for part in text.split(',') {
            let (range, step) = match part.split_once('/') {
                Some((range, step)) => {
                    let step: u32 = step
                        .parse()
                        .map_err(|_| format!("invalid step {step:?} in {} field", self.name))?;
                    if step == 0 {
                        return Err(format!("zero step in {} field", self.name));
                    }
                    (range, Some(step))
                }
                None => (part, None),
            };

            let (lo, hi) = match range {
                "" => return Err(format!("empty item in {} field", self.name)),
                "?" if !self.allow_question || step.is_some() => {
                    return Err(format!("'?' not allowed in {} field", self.name))
                }
                "*" | "?" => (self.min, self.max),
                _ => match range.split_once('-') {
                    Some((a, b)) => (self.value(a)?, self.value(b)?),
                    None if step.is_some() => (self.value(range)?, self.max),
                    None => {
                        let v = self.value(range)?;
                        (v, v)
                    }
                },
            };
            if lo > hi {
                return Err(format!("reversed range {lo}-{hi} in {} field", self.name));
            }

            let step = step.unwrap_or(1);
            let mut v = lo;
            while v <= hi {
                bits |= 1u64 << v;
                v = v.saturating_add(step);
            }
        }
        Ok(Field(bits))
    }
}

fn parse_years(text: &str) -> Result<Option<(i32, i32)>, String> {
    if text == "*" {
        return Ok(None);
    }
    let year = |s: &str| -> Result<i32, String> {
        let y: i32 = s.parse().map_err(|_| format!("invalid year {s:?}"))?;
        if !(MIN_YEAR..=MAX_YEAR).contains(&y) {
            return Err(format!("year {y} out of range {MIN_YEAR}-{MAX_YEAR}"));
        }
        Ok(y)
    };
    let (lo, hi) = match text.split_once('-') {
        Some((a, b)) => (year(a)?, year(b)?),
        None => {
            let y = year(text)?;
            (y, y)
        }
    };
    if lo > hi {
        return Err(format!("reversed year range {lo}-{hi}"));
    }
    Ok(Some((lo, hi)))
}

/// Parsed Quartz-style cron expression
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct CronExpr {
    source: String,
    seconds: Field,
    minutes: Field,
    hours: Field,
    days_of_month: Field,
    months: Field,
    days_of_week: Field,
    years: Option<(i32, i32)>,
}

impl FromStr for CronExpr {
    type Err = ScheduleError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let fields: Vec<&str> = s.split_whitespace().collect();
        if !(6..=7).contains(&fields.len()) {
            return Err(invalid(s, format!("expected 6 or 7 fields, got {}", fields.len())));
        }
        let parse = |field: &FieldSpec, text: &str| field.parse(text).map_err(|r| invalid(s, r));

        Ok(Self {
            source: fields.join(" "),
            seconds: parse(&SECONDS, fields[0])?,
            minutes: parse(&MINUTES, fields[1])?,
            hours: parse(&HOURS, fields[2])?,
            days_of_month: parse(&DAYS_OF_MONTH, fields[3])?,
            months: parse(&MONTHS, fields[4])?,
            days_of_week: parse(&DAYS_OF_WEEK, fields[5])?,
            years: match fields.get(6) {
                Some(text) => parse_years(text).map_err(|r| invalid(s, r))?,
                None => None,
            },
        })
    }
}

impl fmt::Display for CronExpr {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.source)
    }
}

impl CronExpr {
    /// Day-of-month and day-of-week must both match; `*` and `?` match any.
    fn day_matches(&self, date: NaiveDate) -> bool {
        self.days_of_month.matches(date.day())
            && self.days_of_week.matches(date.weekday().number_from_sunday())
    }

    /// First fire time strictly after `after`, or `None` when there is none
    /// before the end of [`MAX_YEAR`].
    pub fn next_after(&self, after: DateTime<Utc>) -> Option<DateTime<Utc>> {
        let mut t = after.naive_utc().with_nanosecond(0)?.checked_add_signed(TimeDelta::seconds(1))?;

        loop {
            let year = t.year();
            if year > MAX_YEAR {
                return None;
            }
            if let Some((lo, hi)) = self.years {
                if year > hi {
                    return None;
                }
                if year < lo {
                    t = midnight(NaiveDate::from_ymd_opt(lo, 1, 1)?)?;
                    continue;
                }
            }
            if !self.months.matches(t.month()) {
                let (y, m) = if t.month() == 12 { (year + 1, 1) } else { (year, t.month() + 1) };
                t = midnight(NaiveDate::from_ymd_opt(y, m, 1)?)?;
                continue;
            }
            if !self.day_matches(t.date()) {
                t = midnight(t.date().succ_opt()?)?;
                continue;
            }
            if !self.hours.matches(t.hour()) {
                t = t.date().and_hms_opt(t.hour(), 0, 0)?.checked_add_signed(TimeDelta::hours(1))?;
                continue;
            }
            if !self.minutes.matches(t.minute()) {
                t = t
                    .date()
                    .and_hms_opt(t.hour(), t.minute(), 0)?
                    .checked_add_signed(TimeDelta::minutes(1))?;
                continue;
            }
            if !self.seconds.matches(t.second()) {
                t = t.checked_add_signed(TimeDelta::seconds(1))?;
                continue;
            }
            return Some(Utc.from_utc_datetime(&t));
        }
    }
}

fn midnight(date: NaiveDate) -> Option<NaiveDateTime> {
    date.and_hms_opt(0, 0, 0)
}

#[cfg(test)]
#[path = "schedule_tests.rs"]
mod tests;
