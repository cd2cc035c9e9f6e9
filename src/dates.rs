//! Due date conversion between the form's local text and server timestamps.
//!
//! The form shows due dates as `YYYY-MM-DD HH:MM` in the user's time zone;
//! the server stores absolute UTC timestamps. Parsing also understands a few
//! natural phrases so dates can be typed quickly in the terminal.

use chrono::{
    DateTime, Datelike, Duration, NaiveDate, NaiveDateTime, NaiveTime, TimeZone, Utc,
};

/// Text format of a due date inside the form.
pub const INPUT_FORMAT: &str = "%Y-%m-%d %H:%M";

/// Render a server timestamp in the form's local representation.
pub fn to_input<Tz: TimeZone>(due: DateTime<Utc>, tz: &Tz) -> String
where
    Tz::Offset: std::fmt::Display,
{
    due.with_timezone(tz).format(INPUT_FORMAT).to_string()
}

/// Coerce due date text into an absolute timestamp.
///
/// Empty text means no due date (`Ok(None)`). `Err(())` is returned when the
/// text cannot be read as a date at all.
///
/// Supports:
/// - "YYYY-MM-DD HH:MM", "YYYY-MM-DDTHH:MM" and RFC 3339
/// - "YYYY-MM-DD" (end of that day)
/// - "today", "tomorrow"
/// - "in 3d", "in 2w"
/// - "friday", "next monday"
pub fn parse_due_input<Tz: TimeZone>(
    input: &str,
    tz: &Tz,
    today: NaiveDate,
) -> Result<Option<DateTime<Utc>>, ()> {
    let s = input.trim();
    if s.is_empty() {
        return Ok(None);
    }

    if let Ok(dt) = DateTime::parse_from_rfc3339(s) {
        return Ok(Some(dt.with_timezone(&Utc)));
    }
    for format in [INPUT_FORMAT, "%Y-%m-%dT%H:%M", "%Y-%m-%dT%H:%M:%S"] {
        if let Ok(naive) = NaiveDateTime::parse_from_str(s, format) {
            return localise(naive, tz).map(Some);
        }
    }

    let date = parse_date_phrase(&s.to_lowercase(), today).ok_or(())?;
    localise(date.and_time(end_of_day()), tz).map(Some)
}

fn end_of_day() -> NaiveTime {
    NaiveTime::from_hms_opt(23, 59, 0).unwrap_or(NaiveTime::MIN)
}

/// Interpret a wall-clock time in `tz`; times skipped by a DST jump do not exist.
fn localise<Tz: TimeZone>(naive: NaiveDateTime, tz: &Tz) -> Result<DateTime<Utc>, ()> {
    tz.from_local_datetime(&naive)
        .earliest()
        .map(|dt| dt.with_timezone(&Utc))
        .ok_or(())
}

fn parse_date_phrase(s: &str, today: NaiveDate) -> Option<NaiveDate> {
    match s {
        "today" => return Some(today),
        "tomorrow" => return today.succ_opt(),
        _ => {}
    }

    if let Some(rest) = s.strip_prefix("in ") {
        // Out-of-range offsets are unreadable, not a clamp to the calendar's end.
        if let Some(nd) = rest.strip_suffix('d') {
            if let Ok(days) = nd.trim().parse::<i64>() {
                return Duration::try_days(days).and_then(|d| today.checked_add_signed(d));
            }
        }
        if let Some(nw) = rest.strip_suffix('w') {
            if let Ok(weeks) = nw.trim().parse::<i64>() {
                return Duration::try_weeks(weeks).and_then(|d| today.checked_add_signed(d));
            }
        }
    }

    let weekdays = [
        ("monday", 0), ("tuesday", 1), ("wednesday", 2), ("thursday", 3),
        ("friday", 4), ("saturday", 5), ("sunday", 6),
        ("mon", 0), ("tue", 1), ("wed", 2), ("thu", 3),
        ("fri", 4), ("sat", 5), ("sun", 6),
    ];
    let current = today.weekday().num_days_from_monday() as i64;
    for (name, target) in weekdays {
        let days_ahead = (target + 7 - current) % 7;
        if s == name {
            return today.checked_add_signed(Duration::days(days_ahead));
        }
        if s.strip_prefix("next ") == Some(name) {
            let days = if days_ahead == 0 { 7 } else { days_ahead + 7 };
            return today.checked_add_signed(Duration::days(days));
        }
    }

    NaiveDate::parse_from_str(s, "%Y-%m-%d").ok()
}

/// Format a due date relative to today ("today", "tomorrow", "in 3d", "2d late").
pub fn format_due_relative(due: NaiveDate, today: NaiveDate) -> String {
    let delta = (due - today).num_days();
    if delta == 0 {
        "today".into()
    } else if delta == 1 {
        "tomorrow".into()
    } else if delta > 1 {
        format!("in {delta}d")
    } else {
        format!("{}d late", -delta)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::FixedOffset;

    fn day(y: i32, m: u32, d: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, d).unwrap()
    }

    #[test]
    fn empty_input_is_absent() {
        assert_eq!(parse_due_input("   ", &Utc, day(2025, 3, 3)), Ok(None));
    }

    #[test]
    fn local_input_is_normalised_to_utc() {
        let plus2 = FixedOffset::east_opt(2 * 3600).unwrap();
        let due = parse_due_input("2025-03-10 14:30", &plus2, day(2025, 3, 3)).unwrap();
        assert_eq!(due, Some(Utc.with_ymd_and_hms(2025, 3, 10, 12, 30, 0).unwrap()));
    }

    #[test]
    fn round_trips_through_form_representation() {
        let plus2 = FixedOffset::east_opt(2 * 3600).unwrap();
        let due = Utc.with_ymd_and_hms(2025, 3, 10, 12, 30, 0).unwrap();
        let text = to_input(due, &plus2);
        assert_eq!(text, "2025-03-10 14:30");
        assert_eq!(parse_due_input(&text, &plus2, day(2025, 3, 3)), Ok(Some(due)));
    }

    #[test]
    fn bare_date_means_end_of_day() {
        let due = parse_due_input("2025-03-10", &Utc, day(2025, 3, 3)).unwrap();
        assert_eq!(due, Some(Utc.with_ymd_and_hms(2025, 3, 10, 23, 59, 0).unwrap()));
    }

    #[test]
    fn phrases_resolve_against_today() {
        // 2025-03-03 is a Monday.
        let today = day(2025, 3, 3);
        let at = |s: &str| parse_due_input(s, &Utc, today).unwrap().unwrap().date_naive();
        assert_eq!(at("tomorrow"), day(2025, 3, 4));
        assert_eq!(at("in 3d"), day(2025, 3, 6));
        assert_eq!(at("in 2w"), day(2025, 3, 17));
        assert_eq!(at("Friday"), day(2025, 3, 7));
        assert_eq!(at("next monday"), day(2025, 3, 10));
    }

    #[test]
    fn gibberish_is_rejected() {
        assert_eq!(parse_due_input("someday", &Utc, day(2025, 3, 3)), Err(()));
    }

    #[test]
    fn huge_offsets_are_rejected() {
        let today = day(2025, 3, 3);
        assert_eq!(parse_due_input("in 99999999999d", &Utc, today), Err(()));
        assert_eq!(parse_due_input("in 99999999999w", &Utc, today), Err(()));
        assert_eq!(parse_due_input("in -99999999999d", &Utc, today), Err(()));
        assert_eq!(parse_due_input(&format!("in {}d", i64::MAX), &Utc, today), Err(()));
    }

    #[test]
    fn relative_labels() {
        let today = day(2025, 3, 3);
        assert_eq!(format_due_relative(today, today), "today");
        assert_eq!(format_due_relative(day(2025, 3, 4), today), "tomorrow");
        assert_eq!(format_due_relative(day(2025, 3, 8), today), "in 5d");
        assert_eq!(format_due_relative(day(2025, 3, 1), today), "2d late");
    }
}
