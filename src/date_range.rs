//! Inclusive date ranges taken from `?start=&end=` query parameters.

use serde::Deserialize;
use time::{Date, Month, format_description::BorrowedFormatItem, macros::format_description};

const ISO_DATE: &[BorrowedFormatItem<'static>] = format_description!("[year]-[month]-[day]");

/// The raw `start` and `end` query parameters.
#[derive(Debug, Default, Clone, Deserialize)]
pub struct DateRangeQuery {
    pub start: Option<String>,
    pub end: Option<String>,
}

/// An inclusive range of dates. `start` may be after `end`, in which case
/// the range is empty.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct DateRange {
    pub start: Date,
    pub end: Date,
}

impl DateRange {
    /// From the first day of `today`'s month up to and including `today`.
    pub fn month_to_date(today: Date) -> Self {
        Self {
            start: first_of_month(today),
            end: today,
        }
    }

    /// The range described by `query`, using [DateRange::month_to_date] for
    /// any bound that is missing or not a valid date.
    pub fn from_query(query: &DateRangeQuery, today: Date) -> Self {
        let default = Self::month_to_date(today);

        Self {
            start: query
                .start
                .as_deref()
                .and_then(parse_date)
                .unwrap_or(default.start),
            end: query
                .end
                .as_deref()
                .and_then(parse_date)
                .unwrap_or(default.end),
        }
    }

    pub fn is_empty(&self) -> bool {
        self.start > self.end
    }
}

/// Parse a "YYYY-MM-DD" date.
pub fn parse_date(text: &str) -> Option<Date> {
    Date::parse(text.trim(), ISO_DATE).ok()
}

pub fn first_of_month(date: Date) -> Date {
    date.replace_day(1).unwrap_or(date)
}

/// The first day of the month after `date`'s month.
pub fn first_of_next_month(date: Date) -> Date {
    let (year, month) = match date.month() {
        Month::December => (date.year() + 1, Month::January),
        month => (date.year(), month.next()),
    };

    Date::from_calendar_date(year, month, 1).unwrap_or(date)
}

#[cfg(test)]
mod date_range_tests {
    use time::macros::date;

    use super::{DateRange, DateRangeQuery, first_of_next_month, parse_date};

    #[test]
    fn defaults_to_month_to_date() {
        let range = DateRange::from_query(&DateRangeQuery::default(), date!(2025 - 03 - 17));

        assert_eq!(
            range,
            DateRange {
                start: date!(2025 - 03 - 01),
                end: date!(2025 - 03 - 17),
            }
        );
    }

    #[test]
    fn invalid_bounds_fall_back_to_defaults() {
        let query = DateRangeQuery {
            start: Some("2025-02-01".to_owned()),
            end: Some("not a date".to_owned()),
        };

        let range = DateRange::from_query(&query, date!(2025 - 03 - 17));

        assert_eq!(range.start, date!(2025 - 02 - 01));
        assert_eq!(range.end, date!(2025 - 03 - 17));
    }

    #[test]
    fn start_after_end_is_empty() {
        let range = DateRange {
            start: date!(2025 - 03 - 02),
            end: date!(2025 - 03 - 01),
        };

        assert!(range.is_empty());
    }

    #[test]
    fn next_month_wraps_year() {
        assert_eq!(first_of_next_month(date!(2024 - 12 - 31)), date!(2025 - 01 - 01));
        assert_eq!(first_of_next_month(date!(2025 - 01 - 31)), date!(2025 - 02 - 01));
    }

    #[test]
    fn parses_iso_dates() {
        assert_eq!(parse_date("2025-01-15"), Some(date!(2025 - 01 - 15)));
        assert_eq!(parse_date("15/01/2025"), None);
    }
}
