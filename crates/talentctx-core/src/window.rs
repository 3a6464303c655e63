//! Year-month values and employment windows.
//!
//! A year-month stands for the first day of that month when compared with
//! dates, so an event on 2022-06-15 falls outside a window ending 2022-06.

use chrono::{Datelike, NaiveDate};
use std::fmt;
use std::str::FromStr;

use crate::error::{Error, Result};

pub const PRESENT: &str = "present";

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash)]
pub struct YearMonth {
    first_day: NaiveDate,
}

impl YearMonth {
    pub fn new(year: i32, month: u32) -> Option<Self> {
        NaiveDate::from_ymd_opt(year, month, 1).map(|first_day| Self { first_day })
    }

    pub fn first_day(self) -> NaiveDate {
        self.first_day
    }
}

impl FromStr for YearMonth {
    type Err = Error;

    /// Accepts `YYYY-MM` (and `YYYY-M`); anything else is malformed.
    fn from_str(s: &str) -> Result<Self> {
        let malformed = || Error::Malformed(format!("expected YYYY-MM, got '{s}'"));
        let (year, month) = s.trim().split_once('-').ok_or_else(malformed)?;
        let year: i32 = year.parse().map_err(|_| malformed())?;
        let month: u32 = month.parse().map_err(|_| malformed())?;
        Self::new(year, month).ok_or_else(malformed)
    }
}

impl fmt::Display for YearMonth {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:04}-{:02}", self.first_day.year(), self.first_day.month())
    }
}

/// `[start, end]` of one employment; `end == None` means "through today".
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct EmploymentWindow {
    pub start: YearMonth,
    pub end: Option<YearMonth>,
}

impl EmploymentWindow {
    pub fn new(start: YearMonth, end: Option<YearMonth>) -> Result<Self> {
        if let Some(end) = end {
            if end < start {
                return Err(Error::Malformed(format!("window ends ({end}) before it starts ({start})")));
            }
        }
        Ok(Self { start, end })
    }

    pub fn parse(start: &str, end: Option<&str>) -> Result<Self> {
        let start = start.parse()?;
        let end = end.map(str::parse).transpose()?;
        Self::new(start, end)
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.first_day()
    }

    /// Open-ended windows resolve to `today`, which the caller supplies.
    pub fn end_date(&self, today: NaiveDate) -> NaiveDate {
        self.end.map_or(today, YearMonth::first_day)
    }

    pub fn contains(&self, date: NaiveDate, today: NaiveDate) -> bool {
        self.start_date() <= date && date <= self.end_date(today)
    }

    pub fn end_label(&self) -> String {
        self.end.map_or_else(|| PRESENT.to_string(), |e| e.to_string())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).expect("date")
    }

    #[test]
    fn year_month_parses_and_formats() {
        let ym: YearMonth = "2020-1".parse().expect("parse");
        assert_eq!(ym.to_string(), "2020-01");
        assert!("2020-13".parse::<YearMonth>().is_err());
        assert!("2020-01-15".parse::<YearMonth>().is_err());
        assert!("garbage".parse::<YearMonth>().is_err());
    }

    #[test]
    fn window_rejects_inverted_bounds() {
        assert!(EmploymentWindow::parse("2022-06", Some("2020-01")).is_err());
        assert!(EmploymentWindow::parse("2022-06", Some("2022-06")).is_ok());
    }

    #[test]
    fn window_bounds_are_inclusive_first_of_month() {
        let w = EmploymentWindow::parse("2020-01", Some("2022-06")).expect("window");
        let today = d(2030, 1, 1);
        assert!(w.contains(d(2020, 1, 1), today));
        assert!(w.contains(d(2022, 6, 1), today));
        assert!(!w.contains(d(2022, 6, 2), today));
        assert!(!w.contains(d(2019, 12, 31), today));
    }

    #[test]
    fn open_window_ends_today() {
        let w = EmploymentWindow::parse("2021-01", None).expect("window");
        let today = d(2024, 5, 17);
        assert!(w.contains(today, today));
        assert!(!w.contains(d(2024, 5, 18), today));
        assert_eq!(w.end_label(), PRESENT);
    }
}
