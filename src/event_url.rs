//! Date-coded short codes for event URLs
//!
//! A short code has the form `MMDDNN`:
//! - `MM` / `DD` - zero-padded month and day of the event date
//! - `NN` - zero-padded 1-based ordinal of the event among every event that
//!   shares the same month and day, in any year, ordered by creation time
//!
//! Codes are not unique across years when recomputed from a snapshot: an event
//! on 2024-12-19 and one on 2025-12-19 can both compute `121901` if they are
//! looked at in isolation. The store avoids this by assigning ordinals from a
//! ledger that spans all years (see [`crate::database::TABLE_EVENT_DAYS`]).

use chrono::{DateTime, Datelike, NaiveDate, Utc};
use serde::{Deserialize, Serialize};

/// Minimum length of a parsable short code (`MMDD` plus at least two ordinal digits)
pub const MIN_CODE_LEN: usize = 6;

/// The three event fields the short-code scheme cares about
#[derive(Serialize, Deserialize, Debug, Clone, PartialEq, Eq)]
pub struct EventStamp {
    pub id: String,
    pub created_at: DateTime<Utc>,
    pub event_date: NaiveDate,
}

/// A parsed short code: which month/day to look in and which ordinal to pick
#[derive(Serialize, Debug, Clone, PartialEq, Eq)]
pub struct ShortCodeQuery {
    /// `MMDD` prefix, exactly as it appeared in the code
    pub month_day: String,

    /// 1-based position among same month/day events ordered by `created_at`
    pub ordinal: u32,
}

impl ShortCodeQuery {
    /// Renders the `MMDD` prefix for a calendar date
    pub fn month_day_of(date: NaiveDate) -> String {
        format!("{:02}{:02}", date.month(), date.day())
    }
}

/// Formats the parts of a short code
///
/// Ordinals of 100 and above render with three or more digits; they are
/// never truncated.
pub fn format_code(month: u32, day: u32, ordinal: usize) -> String {
    format!("{:02}{:02}{:02}", month, day, ordinal)
}

/// Computes the short code of `event_id` against a snapshot of events
///
/// Only events whose `event_date` falls on the same month and day (any year)
/// take part. They are ordered by `created_at`, keeping input order for equal
/// timestamps. If `event_id` is not in the snapshot yet, it is placed after
/// every matching event.
///
/// # Example
///
/// ```
/// # use chrono::{NaiveDate, TimeZone, Utc};
/// # use founders_links::event_url::{generate, EventStamp};
/// let date = NaiveDate::from_ymd_opt(2024, 12, 19).unwrap();
/// let events = vec![EventStamp {
///     id: "e1".to_string(),
///     created_at: Utc.with_ymd_and_hms(2024, 11, 1, 9, 0, 0).unwrap(),
///     event_date: date,
/// }];
/// assert_eq!(generate("e1", date, &events), "121901");
/// assert_eq!(generate("new", date, &events), "121902");
/// ```
pub fn generate(event_id: &str, event_date: NaiveDate, all_events: &[EventStamp]) -> String {
    let (month, day) = (event_date.month(), event_date.day());

    let mut same_day: Vec<&EventStamp> = all_events
        .iter()
        .filter(|e| e.event_date.month() == month && e.event_date.day() == day)
        .collect();

    // sort_by_key is stable, equal timestamps stay in input order
    same_day.sort_by_key(|e| e.created_at);

    let ordinal = match same_day.iter().position(|e| e.id == event_id) {
        Some(index) => index + 1,
        None => same_day.len() + 1,
    };

    format_code(month, day, ordinal)
}

/// Splits a short code into its month/day prefix and ordinal
///
/// Returns `None` when the code is shorter than [`MIN_CODE_LEN`] characters or
/// when everything after the first four characters is not a positive integer.
/// The month/day prefix itself is not checked; an unknown prefix simply finds
/// no event.
pub fn parse(short_code: &str) -> Option<ShortCodeQuery> {
    if short_code.chars().count() < MIN_CODE_LEN {
        return None;
    }

    let split = short_code.char_indices().nth(4).map(|(i, _)| i)?;
    let (month_day, rest) = short_code.split_at(split);

    if !rest.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }

    let ordinal: u32 = rest.parse().ok()?;
    if ordinal == 0 {
        return None;
    }

    Some(ShortCodeQuery {
        month_day: month_day.to_string(),
        ordinal,
    })
}
