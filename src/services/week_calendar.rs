// src/services/week_calendar.rs
//! Monday-aligned week math and ROC (Minguo) calendar conversion.
//!
//! All calendar days are Asia/Taipei days. Taipei has been UTC+8 without
//! daylight saving since 1980, so a fixed offset is exact for the feeds we
//! ingest.

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, Offset,
    TimeZone, Utc,
};
use serde::Serialize;

/// Gregorian year = ROC year + 1911.
pub const ROC_YEAR_OFFSET: i32 = 1911;

const TAIPEI_OFFSET_SECS: i32 = 8 * 3600;

/// The two encodings the government feeds use for ROC dates.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RocFormat {
    /// `1130311` (year zero-padded to three digits)
    Compact,
    /// `113/03/11`
    Slashed,
}

/// An inclusive window from Monday 00:00:00.000 to Sunday 23:59:59.999.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct WeekRange {
    pub start: NaiveDateTime,
    pub end: NaiveDateTime,
}

impl WeekRange {
    pub fn contains(&self, at: NaiveDateTime) -> bool {
        at >= self.start && at <= self.end
    }

    pub fn start_date(&self) -> NaiveDate {
        self.start.date()
    }

    pub fn end_date(&self) -> NaiveDate {
        self.end.date()
    }

    /// The same window expressed as UTC instants, for store range queries.
    pub fn to_utc(&self) -> (DateTime<Utc>, DateTime<Utc>) {
        (local_to_utc(self.start), local_to_utc(self.end))
    }
}

pub fn taipei() -> FixedOffset {
    FixedOffset::east_opt(TAIPEI_OFFSET_SECS).unwrap_or_else(|| Utc.fix())
}

/// Today's calendar day in Taipei.
pub fn today_local() -> NaiveDate {
    Utc::now().with_timezone(&taipei()).date_naive()
}

/// Calendar day in Taipei for a stored instant.
pub fn local_date(at: DateTime<Utc>) -> NaiveDate {
    at.with_timezone(&taipei()).date_naive()
}

pub fn local_to_utc(local: NaiveDateTime) -> DateTime<Utc> {
    match taipei().from_local_datetime(&local).single() {
        Some(dt) => dt.with_timezone(&Utc),
        None => Utc.from_utc_datetime(&(local - Duration::seconds(TAIPEI_OFFSET_SECS as i64))),
    }
}

/// Taipei midnight of `date`, as a UTC instant.
pub fn local_midnight_utc(date: NaiveDate) -> DateTime<Utc> {
    local_to_utc(date.and_time(NaiveTime::MIN))
}

/// Monday 00:00:00.000 of the week containing `date`. Sunday counts as day 7
/// of the preceding week.
pub fn week_start(date: NaiveDate) -> NaiveDateTime {
    week_monday(date).and_time(NaiveTime::MIN)
}

/// Sunday 23:59:59.999 closing the week containing `date`.
pub fn week_end(date: NaiveDate) -> NaiveDateTime {
    week_start(date) + Duration::days(7) - Duration::milliseconds(1)
}

pub fn week_monday(date: NaiveDate) -> NaiveDate {
    let days_from_monday = date.weekday().num_days_from_monday() as i64;
    date - Duration::days(days_from_monday)
}

/// Week 1 is the week containing `season_start`; week N is shifted by
/// `(N - 1) * 7` days.
pub fn week_date_range(season_start: NaiveDate, week_number: u32) -> WeekRange {
    let offset = Duration::days((week_number as i64 - 1) * 7);
    let start = week_start(season_start) + offset;
    WeekRange {
        start,
        end: start + Duration::days(7) - Duration::milliseconds(1),
    }
}

/// 0 before the season starts, otherwise the 1-based week index of `today`.
pub fn current_week(season_start: NaiveDate, today: NaiveDate) -> u32 {
    let season_monday = week_monday(season_start);
    let this_monday = week_monday(today);
    if this_monday < season_monday {
        return 0;
    }
    ((this_monday - season_monday).num_days() / 7) as u32 + 1
}

pub fn to_roc_date(date: NaiveDate, format: RocFormat) -> String {
    let year = date.year() - ROC_YEAR_OFFSET;
    match format {
        RocFormat::Compact => format!("{:03}{:02}{:02}", year, date.month(), date.day()),
        RocFormat::Slashed => format!("{}/{:02}/{:02}", year, date.month(), date.day()),
    }
}

/// Parses either ROC encoding. Anything after the date part (a time, a
/// weekday annotation) is ignored.
pub fn from_roc_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.contains('/') || raw.contains('-') {
        let date_part = raw.split_whitespace().next()?;
        let mut parts = date_part.split(|c| c == '/' || c == '-');
        let year: i32 = parts.next()?.trim().parse().ok()?;
        let month: u32 = parts.next()?.trim().parse().ok()?;
        let day: u32 = parts.next()?.trim().parse().ok()?;
        return NaiveDate::from_ymd_opt(year + ROC_YEAR_OFFSET, month, day);
    }

    let digits: String = raw.chars().take_while(|c| c.is_ascii_digit()).collect();
    if digits.len() < 6 || digits.len() > 7 {
        return None;
    }
    let split = digits.len() - 4;
    let year: i32 = digits[..split].parse().ok()?;
    let month: u32 = digits[split..split + 2].parse().ok()?;
    let day: u32 = digits[split + 2..].parse().ok()?;
    NaiveDate::from_ymd_opt(year + ROC_YEAR_OFFSET, month, day)
}

/// Lenient date reader for feed fields that may be Gregorian (`2024-03-11`,
/// `2024-03-11T00:00:00`, `2024/03/11`) or ROC.
pub fn parse_feed_date(raw: &str) -> Option<NaiveDate> {
    let raw = raw.trim();
    if raw.is_empty() {
        return None;
    }
    // chrono's %Y takes any width, so "113/03/12" would parse as year 113.
    let four_digit_year = raw.chars().take_while(|c| c.is_ascii_digit()).count() == 4;
    if four_digit_year {
        let head: String = raw.chars().take(10).collect();
        for fmt in ["%Y-%m-%d", "%Y/%m/%d"] {
            if let Ok(date) = NaiveDate::parse_from_str(&head, fmt) {
                return Some(date);
            }
        }
    }
    from_roc_date(raw)
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::Weekday;

    fn d(y: i32, m: u32, day: u32) -> NaiveDate {
        NaiveDate::from_ymd_opt(y, m, day).unwrap()
    }

    #[test]
    fn monday_is_its_own_week_start() {
        let monday = d(2024, 3, 11);
        assert_eq!(week_start(monday), monday.and_hms_opt(0, 0, 0).unwrap());
    }

    #[test]
    fn sunday_shifts_back_six_days() {
        let sunday = d(2024, 3, 17);
        assert_eq!(week_start(sunday).date(), d(2024, 3, 11));
        assert_eq!(week_end(sunday).date(), sunday);
    }

    #[test]
    fn every_day_falls_inside_its_week() {
        let mut day = d(2023, 12, 20);
        for _ in 0..60 {
            let start = week_start(day);
            let end = week_end(day);
            assert_eq!(start.weekday(), Weekday::Mon);
            assert_eq!(start.time(), NaiveTime::MIN);
            assert_eq!(end.weekday(), Weekday::Sun);
            assert_eq!(end.format("%H:%M:%S%.3f").to_string(), "23:59:59.999");
            let noon = day.and_hms_opt(12, 0, 0).unwrap();
            assert!(start <= noon && noon <= end);
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn week_ranges_shift_by_seven_days() {
        let season = d(2024, 2, 21); // a Wednesday
        let first = week_date_range(season, 1);
        assert_eq!(first.start_date(), d(2024, 2, 19));
        assert_eq!(first.end_date(), d(2024, 2, 25));

        let third = week_date_range(season, 3);
        assert_eq!(third.start_date(), d(2024, 3, 4));
        assert!(third.contains(d(2024, 3, 10).and_hms_opt(23, 59, 59).unwrap()));
    }

    #[test]
    fn current_week_counts_from_season_start() {
        let season = d(2024, 2, 19);
        assert_eq!(current_week(season, d(2024, 2, 18)), 0);
        assert_eq!(current_week(season, d(2024, 2, 19)), 1);
        assert_eq!(current_week(season, d(2024, 2, 25)), 1);
        assert_eq!(current_week(season, d(2024, 2, 26)), 2);
        assert_eq!(current_week(season, d(2024, 3, 11)), 4);
    }

    #[test]
    fn roc_year_boundary() {
        assert_eq!(from_roc_date("112/12/31"), Some(d(2023, 12, 31)));
        assert_eq!(from_roc_date("113/01/01"), Some(d(2024, 1, 1)));
        assert_eq!(from_roc_date("1130101"), Some(d(2024, 1, 1)));
        assert_eq!(to_roc_date(d(2023, 12, 31), RocFormat::Slashed), "112/12/31");
        assert_eq!(to_roc_date(d(2024, 1, 1), RocFormat::Compact), "1130101");
    }

    #[test]
    fn roc_round_trip_over_a_year() {
        let mut day = d(2011, 1, 1);
        while day < d(2012, 3, 1) {
            for format in [RocFormat::Compact, RocFormat::Slashed] {
                assert_eq!(from_roc_date(&to_roc_date(day, format)), Some(day));
            }
            day = day.succ_opt().unwrap();
        }
    }

    #[test]
    fn roc_rejects_garbage() {
        assert_eq!(from_roc_date(""), None);
        assert_eq!(from_roc_date("113/13/01"), None);
        assert_eq!(from_roc_date("abc"), None);
    }

    #[test]
    fn feed_dates_accept_both_calendars() {
        assert_eq!(parse_feed_date("2024-03-11T08:00:00.000Z"), Some(d(2024, 3, 11)));
        assert_eq!(parse_feed_date("113/03/11"), Some(d(2024, 3, 11)));
        assert_eq!(parse_feed_date("  "), None);
    }

    #[test]
    fn local_midnight_is_sixteen_hundred_utc_the_day_before() {
        let utc = local_midnight_utc(d(2024, 3, 11));
        assert_eq!(utc.to_rfc3339(), "2024-03-10T16:00:00+00:00");
        assert_eq!(local_date(utc), d(2024, 3, 11));
    }
}
