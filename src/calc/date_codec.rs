use chrono::{Datelike, NaiveDate};

/// Parses a strict `YYYY-MM-DD` string.
///
/// Returns `None` for anything that is not three hyphen-delimited groups of
/// 4, 2 and 2 ASCII digits, or that does not name a real calendar day.
/// Partial or empty input is an ordinary state for a form field, so this never
/// reports an error.
pub fn parse_iso(text: &str) -> Option<NaiveDate> {
    let mut parts = text.split('-');
    let year = digits(parts.next()?, 4)?;
    let month = digits(parts.next()?, 2)?;
    let day = digits(parts.next()?, 2)?;
    if parts.next().is_some() {
        return None;
    }
    NaiveDate::from_ymd_opt(year as i32, month, day)
}

fn digits(group: &str, len: usize) -> Option<u32> {
    if group.len() != len || !group.bytes().all(|b| b.is_ascii_digit()) {
        return None;
    }
    group.parse().ok()
}

/// Formats a date as `YYYY-MM-DD`, zero padded.
pub fn format_iso(date: NaiveDate) -> String {
    format!("{:04}-{:02}-{:02}", date.year(), date.month(), date.day())
}

/// Trigger label form, e.g. `Oct 15, 2026`.
pub fn format_display(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}
