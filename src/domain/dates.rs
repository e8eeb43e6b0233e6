use chrono::{Local, NaiveDate};
use std::collections::BTreeMap;

/// Calendar annotation for a single day inside a date range
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct DayMark {
    pub starting_day: bool,
    pub ending_day: bool,
}

impl DayMark {
    /// True for days strictly between the range endpoints
    pub fn is_inner(&self) -> bool {
        !self.starting_day && !self.ending_day
    }
}

/// Today's date in local time
pub fn today() -> NaiveDate {
    Local::now().date_naive()
}

/// Check whether `day` lies within `[start, end]`; a missing end means ongoing
pub fn is_within_range(day: NaiveDate, start: NaiveDate, end: Option<NaiveDate>) -> bool {
    day >= start && end.map_or(true, |end| day <= end)
}

/// Expand an inclusive date range into per-day calendar marks.
///
/// The first day is always flagged as the start and the last as the end,
/// so a single-day range yields one entry flagged as both. A reversed
/// range produces only the two endpoint entries.
pub fn date_range(start: NaiveDate, end: NaiveDate) -> BTreeMap<NaiveDate, DayMark> {
    let mut range = BTreeMap::new();

    let mut current = start;
    while current <= end {
        range.insert(current, DayMark::default());
        match current.succ_opt() {
            Some(next) => current = next,
            None => break,
        }
    }

    range.entry(start).or_default().starting_day = true;
    range.entry(end).or_default().ending_day = true;

    range
}

/// Parse a `YYYY-MM-DD` date
pub fn parse_date(value: &str) -> Option<NaiveDate> {
    NaiveDate::parse_from_str(value.trim(), "%Y-%m-%d").ok()
}

/// Format a date for display, e.g. "Jan 5, 2025"
pub fn format_date_in_words(date: NaiveDate) -> String {
    date.format("%b %-d, %Y").to_string()
}

/// Format a date range for a form title, e.g. "Jan 5, 2025 - Jan 9, 2025"
pub fn format_range_in_words(start: NaiveDate, end: Option<NaiveDate>) -> String {
    match end {
        Some(end) => format!("{} - {}", format_date_in_words(start), format_date_in_words(end)),
        None => format!("{} - Ongoing", format_date_in_words(start)),
    }
}

/// Parse a reminder time like "07:30" into (hour, minute)
pub fn parse_reminder_time(value: &str) -> Option<(u32, u32)> {
    let (hour, minute) = value.trim().split_once(':')?;
    let hour: u32 = hour.trim().parse().ok()?;
    let minute: u32 = minute.trim().parse().ok()?;

    if hour < 24 && minute < 60 {
        Some((hour, minute))
    } else {
        None
    }
}

/// Format a reminder time as zero-padded "HH:MM"
pub fn format_reminder_time(hour: u32, minute: u32) -> String {
    format!("{:02}:{:02}", hour, minute)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn date(s: &str) -> NaiveDate {
        parse_date(s).unwrap()
    }

    #[test]
    fn test_single_day_range_is_start_and_end() {
        let day = date("2025-03-10");
        let range = date_range(day, day);

        assert_eq!(range.len(), 1);
        assert_eq!(
            range[&day],
            DayMark {
                starting_day: true,
                ending_day: true
            }
        );
    }

    #[test]
    fn test_multi_day_range() {
        let start = date("2025-01-30");
        let end = date("2025-02-02");
        let range = date_range(start, end);

        assert_eq!(range.len(), 4);
        assert!(range[&start].starting_day);
        assert!(!range[&start].ending_day);
        assert!(range[&end].ending_day);
        assert!(!range[&end].starting_day);
        assert!(range[&date("2025-01-31")].is_inner());
        assert!(range[&date("2025-02-01")].is_inner());
    }

    #[test]
    fn test_range_crosses_leap_day() {
        let range = date_range(date("2024-02-28"), date("2024-03-01"));
        assert_eq!(range.len(), 3);
        assert!(range.contains_key(&date("2024-02-29")));
    }

    #[test]
    fn test_reversed_range_marks_only_endpoints() {
        let start = date("2025-01-05");
        let end = date("2025-01-01");
        let range = date_range(start, end);

        assert_eq!(range.len(), 2);
        assert!(range[&start].starting_day);
        assert!(range[&end].ending_day);
    }

    #[test]
    fn test_is_within_range() {
        let start = date("2025-01-01");
        let end = Some(date("2025-01-03"));

        assert!(is_within_range(date("2025-01-01"), start, end));
        assert!(is_within_range(date("2025-01-03"), start, end));
        assert!(!is_within_range(date("2024-12-31"), start, end));
        assert!(!is_within_range(date("2025-01-04"), start, end));
        assert!(is_within_range(date("2030-06-01"), start, None));
    }

    #[test]
    fn test_format_date_in_words() {
        assert_eq!(format_date_in_words(date("2025-01-05")), "Jan 5, 2025");
        assert_eq!(format_date_in_words(date("2025-12-25")), "Dec 25, 2025");
        assert_eq!(
            format_range_in_words(date("2025-01-05"), Some(date("2025-01-09"))),
            "Jan 5, 2025 - Jan 9, 2025"
        );
        assert_eq!(
            format_range_in_words(date("2025-01-05"), None),
            "Jan 5, 2025 - Ongoing"
        );
    }

    #[test]
    fn test_parse_reminder_time() {
        assert_eq!(parse_reminder_time("07:30"), Some((7, 30)));
        assert_eq!(parse_reminder_time(" 23:59 "), Some((23, 59)));
        assert_eq!(parse_reminder_time("24:00"), None);
        assert_eq!(parse_reminder_time("12:60"), None);
        assert_eq!(parse_reminder_time("noon"), None);
        assert_eq!(format_reminder_time(7, 5), "07:05");
    }

    #[test]
    fn test_parse_date_rejects_other_formats() {
        assert!(parse_date("05-01-2025").is_none());
        assert!(parse_date("2025-02-30").is_none());
    }
}
