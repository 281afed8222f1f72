use super::types::Term;
use chrono::{Datelike, NaiveDate};

pub const DEFAULT_ACADEMIC_YEAR_START_MONTH: u32 = 8;

/// `"YYYY-YYYY"` key of the academic year containing `date`.
pub fn academic_year_for(date: NaiveDate, start_month: u32) -> String {
    let start_month = start_month.clamp(1, 12);
    let first = if date.month() >= start_month {
        date.year()
    } else {
        date.year() - 1
    };
    format!("{}-{}", first, first + 1)
}

/// Testing window a date falls in: Aug-Nov fall, Dec-Feb winter, Mar-Jul spring.
pub fn term_for(date: NaiveDate) -> Term {
    match date.month() {
        8..=11 => Term::Fall,
        12 | 1 | 2 => Term::Winter,
        _ => Term::Spring,
    }
}

pub fn parse_test_date(s: &str) -> Option<NaiveDate> {
    let s = s.trim();
    NaiveDate::parse_from_str(s, "%Y-%m-%d")
        .or_else(|_| NaiveDate::parse_from_str(s, "%m/%d/%Y"))
        .ok()
}
