use chrono::{NaiveDate, NaiveTime};

use crate::process::QUARTER_HOURS_PER_DAY;

const QUARTER_HOUR_SECONDS: u32 = 15 * 60;

/// Strict parse of `"DDMMYYYY"` (eight ASCII digits, no separators) → date.
pub fn parse_compact_date(s: &str) -> Option<NaiveDate> {
    if s.len() != 8 || !s.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    let day: u32 = s[0..2].parse().ok()?;
    let month: u32 = s[2..4].parse().ok()?;
    let year: i32 = s[4..8].parse().ok()?;
    NaiveDate::from_ymd_opt(year, month, day)
}

/// Parses the first whitespace-delimited token of a cell, so `"01012024 00:00"`
/// and `"01012024"` both give the first of January.
pub fn parse_leading_date(cell: &str) -> Option<NaiveDate> {
    cell.split_whitespace().next().and_then(parse_compact_date)
}

/// Parse the `DD/MM/YYYY` form used on the command line and in exports.
pub fn parse_display_date(s: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(s.trim(), "%d/%m/%Y").ok()
}

/// Start of the `index`-th quarter hour of a day, counting from 00:00:00.
pub fn quarter_hour(index: usize) -> Option<NaiveTime> {
    if index >= QUARTER_HOURS_PER_DAY {
        return None;
    }
    NaiveTime::from_num_seconds_from_midnight_opt(index as u32 * QUARTER_HOUR_SECONDS, 0)
}

/// The start times of all quarter hours of a day, in order.
pub fn quarter_hours() -> impl Iterator<Item = NaiveTime> {
    (0..QUARTER_HOURS_PER_DAY).filter_map(quarter_hour)
}
