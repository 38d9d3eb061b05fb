use std::fmt;
use std::sync::OnceLock;

use chrono::{DateTime, Datelike, Local, NaiveDate, NaiveDateTime};
use regex::Regex;

use crate::error::{LedgerError, Result};

/// Canonical `YYYY-MM` bucket. `Unknown` collects records whose date could not
/// be read and always sorts after every real month.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub enum MonthKey {
    Month { year: i32, month: u32 },
    Unknown,
}

impl MonthKey {
    pub fn new(year: i32, month: u32) -> Self {
        MonthKey::Month { year, month }
    }

    pub fn is_unknown(&self) -> bool {
        matches!(self, MonthKey::Unknown)
    }

    /// Parse a `YYYY-MM` label back into a key.
    pub fn parse(s: &str) -> Option<Self> {
        if s == "Unknown" {
            return Some(MonthKey::Unknown);
        }
        let (y, m) = s.split_once('-')?;
        if y.len() != 4 || m.len() != 2 {
            return None;
        }
        let year = y.parse().ok()?;
        let month: u32 = m.parse().ok()?;
        (1..=12).contains(&month).then_some(MonthKey::Month { year, month })
    }
}

impl fmt::Display for MonthKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            MonthKey::Month { year, month } => write!(f, "{year:04}-{month:02}"),
            MonthKey::Unknown => f.write_str("Unknown"),
        }
    }
}

fn canonical_shape() -> &'static Regex {
    static RE: OnceLock<Regex> = OnceLock::new();
    RE.get_or_init(|| Regex::new(r"^\d{4}-\d{2}-\d{2}$").expect("valid date pattern"))
}

/// Read a stored date string as a local calendar date.
///
/// Accepts `YYYY-MM-DD`, a naive `YYYY-MM-DDTHH:MM[:SS]` timestamp (taken as
/// local time), or an RFC 3339 timestamp, which is converted to the local zone
/// before the date is taken.
pub fn parse_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    if s.is_empty() {
        return None;
    }
    if let Ok(d) = NaiveDate::parse_from_str(s, "%Y-%m-%d") {
        return Some(d);
    }
    for pattern in [
        "%Y-%m-%dT%H:%M:%S",
        "%Y-%m-%dT%H:%M:%S%.f",
        "%Y-%m-%dT%H:%M",
        "%Y-%m-%d %H:%M:%S",
    ] {
        if let Ok(dt) = NaiveDateTime::parse_from_str(s, pattern) {
            return Some(dt.date());
        }
    }
    DateTime::parse_from_rfc3339(s)
        .ok()
        .map(|dt| dt.with_timezone(&Local).date_naive())
}

/// True only for zero-padded `YYYY-MM-DD` strings naming a real day.
pub fn is_canonical_date(s: &str) -> bool {
    canonical_shape().is_match(s) && NaiveDate::parse_from_str(s, "%Y-%m-%d").is_ok()
}

/// Validate a date typed in by a user before it reaches the store.
pub fn require_canonical_date(s: &str) -> Result<String> {
    if is_canonical_date(s) {
        Ok(s.to_string())
    } else {
        Err(LedgerError::InvalidDate(s.to_string()))
    }
}

pub fn month_key(date: &str) -> MonthKey {
    match parse_date(date) {
        Some(d) => MonthKey::new(d.year(), d.month()),
        None => MonthKey::Unknown,
    }
}

pub fn months_of_year(year: i32) -> [MonthKey; 12] {
    std::array::from_fn(|i| MonthKey::new(year, i as u32 + 1))
}

/// Inclusive calendar range. A missing bound is open on that side.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DateRange {
    pub from: Option<NaiveDate>,
    pub to: Option<NaiveDate>,
}

impl DateRange {
    pub fn unbounded() -> Self {
        Self::default()
    }

    /// Build a range from user-supplied bounds. Empty strings mean unbounded;
    /// anything else must be a canonical `YYYY-MM-DD` date.
    pub fn parse(from: Option<&str>, to: Option<&str>) -> Result<Self> {
        fn bound(raw: Option<&str>) -> Result<Option<NaiveDate>> {
            match raw.map(str::trim) {
                None | Some("") => Ok(None),
                Some(s) => {
                    require_canonical_date(s)?;
                    Ok(parse_date(s))
                }
            }
        }
        let range = Self {
            from: bound(from)?,
            to: bound(to)?,
        };
        if let (Some(f), Some(t)) = (range.from, range.to) {
            if f > t {
                return Err(LedgerError::Other(format!(
                    "--from {f} is after --to {t}"
                )));
            }
        }
        Ok(range)
    }

    /// January 1 through December 31 of `year`. Years chrono can't represent
    /// are an error rather than an open range.
    pub fn year(year: i32) -> Result<Self> {
        match (NaiveDate::from_ymd_opt(year, 1, 1), NaiveDate::from_ymd_opt(year, 12, 31)) {
            (Some(from), Some(to)) => Ok(Self {
                from: Some(from),
                to: Some(to),
            }),
            _ => Err(LedgerError::Other(format!("year {year} is out of range"))),
        }
    }

    pub fn is_unbounded(&self) -> bool {
        self.from.is_none() && self.to.is_none()
    }

    pub fn contains_date(&self, d: NaiveDate) -> bool {
        self.from.map_or(true, |f| d >= f) && self.to.map_or(true, |t| d <= t)
    }

    /// Undated records only survive an unbounded range, where they land in
    /// the `Unknown` bucket.
    pub fn contains(&self, date: &str) -> bool {
        if self.is_unbounded() {
            return true;
        }
        parse_date(date).is_some_and(|d| self.contains_date(d))
    }
}
