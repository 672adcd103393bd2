//! Daily time axes under the CF calendars used by CORDEX models.

use std::fmt;
use std::str::FromStr;

use chrono::NaiveDate;
use serde::Serialize;

use crate::error::{Error, Result};
use crate::filename::DateRange;

const NOLEAP_MONTH_DAYS: [u32; 12] = [31, 28, 31, 30, 31, 30, 31, 31, 30, 31, 30, 31];

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum Calendar {
    Standard,
    NoLeap,
    Day360,
}

impl Calendar {
    /// Name written to the `calendar` attribute and passed to `setcalendar`.
    pub fn cf_name(&self) -> &'static str {
        match self {
            Self::Standard => "standard",
            Self::NoLeap => "365_day",
            Self::Day360 => "360_day",
        }
    }

    pub fn days_in_month(&self, year: i32, month: u32) -> Result<u32> {
        if !(1..=12).contains(&month) {
            return Err(Error::InvalidMonth {
                year,
                month,
                reason: "month out of range".into(),
            });
        }
        Ok(match self {
            Self::NoLeap => NOLEAP_MONTH_DAYS[(month - 1) as usize],
            Self::Day360 => 30,
            Self::Standard => {
                let first = gregorian(year, month, 1)?;
                let next = if month == 12 {
                    gregorian(year + 1, 1, 1)?
                } else {
                    gregorian(year, month + 1, 1)?
                };
                next.signed_duration_since(first).num_days() as u32
            }
        })
    }

    /// Whole days from `from` to `to` under this calendar.
    pub fn days_between(&self, from: CalendarDate, to: CalendarDate) -> Result<i64> {
        Ok(match self {
            Self::Standard => {
                let a = gregorian(from.year, from.month, from.day)?;
                let b = gregorian(to.year, to.month, to.day)?;
                b.signed_duration_since(a).num_days()
            }
            Self::NoLeap => noleap_ordinal(to) - noleap_ordinal(from),
            Self::Day360 => day360_ordinal(to) - day360_ordinal(from),
        })
    }
}

impl FromStr for Calendar {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.trim().to_ascii_lowercase().as_str() {
            "standard" | "gregorian" | "proleptic_gregorian" => Ok(Self::Standard),
            "365_day" | "noleap" => Ok(Self::NoLeap),
            "360_day" => Ok(Self::Day360),
            other => Err(Error::UnsupportedCalendar(other.to_string())),
        }
    }
}

impl fmt::Display for Calendar {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.cf_name())
    }
}

/// A y/m/d triple that need not exist in the Gregorian calendar (e.g. 360_day Feb 30).
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct CalendarDate {
    pub year: i32,
    pub month: u32,
    pub day: u32,
}

impl CalendarDate {
    pub fn new(year: i32, month: u32, day: u32) -> Self {
        Self { year, month, day }
    }

    pub fn compact(&self) -> String {
        format!("{:04}{:02}{:02}", self.year, self.month, self.day)
    }
}

impl FromStr for CalendarDate {
    type Err = Error;

    /// Accepts `YYYY-MM-DD`.
    fn from_str(s: &str) -> Result<Self> {
        let bad = || Error::Config(format!("expected a YYYY-MM-DD date, got '{s}'"));
        let mut parts = s.trim().splitn(3, '-');
        let year = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let month = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        let day = parts.next().and_then(|p| p.parse().ok()).ok_or_else(bad)?;
        if !(1..=12).contains(&month) || !(1..=31).contains(&day) {
            return Err(bad());
        }
        Ok(Self { year, month, day })
    }
}

impl fmt::Display for CalendarDate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}-{:02}", self.year, self.month, self.day)
    }
}

/// One value per day at 12:00, in `days since <reference> 00:00:00`.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct TimeAxis {
    pub calendar: Calendar,
    pub units: String,
    pub dates: Vec<String>,
    pub values: Vec<f64>,
}

impl TimeAxis {
    pub fn for_month(
        year: i32,
        month: u32,
        calendar: Calendar,
        reference: CalendarDate,
    ) -> Result<Self> {
        let days = calendar.days_in_month(year, month)?;
        let first = CalendarDate::new(year, month, 1);
        let offset = calendar.days_between(reference, first)?;
        let dates = (1..=days)
            .map(|day| CalendarDate::new(year, month, day).to_string())
            .collect();
        let values = (0..days).map(|i| (offset + i as i64) as f64 + 0.5).collect();
        Ok(Self {
            calendar,
            units: format!("days since {reference} 00:00:00"),
            dates,
            values,
        })
    }

    pub fn len(&self) -> usize {
        self.values.len()
    }

    pub fn is_empty(&self) -> bool {
        self.values.is_empty()
    }
}

/// Filename date range covering a whole month.
pub fn month_date_range(year: i32, month: u32, calendar: Calendar) -> Result<DateRange> {
    let last = calendar.days_in_month(year, month)?;
    Ok(DateRange::new(
        CalendarDate::new(year, month, 1).compact(),
        CalendarDate::new(year, month, last).compact(),
    ))
}

fn gregorian(year: i32, month: u32, day: u32) -> Result<NaiveDate> {
    NaiveDate::from_ymd_opt(year, month, day).ok_or_else(|| Error::InvalidMonth {
        year,
        month,
        reason: format!("day {day} does not exist"),
    })
}

fn noleap_ordinal(date: CalendarDate) -> i64 {
    let before: u32 = NOLEAP_MONTH_DAYS[..(date.month - 1) as usize].iter().sum();
    date.year as i64 * 365 + before as i64 + date.day as i64 - 1
}

fn day360_ordinal(date: CalendarDate) -> i64 {
    date.year as i64 * 360 + (date.month as i64 - 1) * 30 + date.day as i64 - 1
}
