//! Heuristic extraction of a meeting time from free text.
//!
//! The extractor looks for the first recognizable date and time phrases in a
//! message body, fills anything missing from the current local moment, and
//! pins the result to a fixed UTC offset. Timezone names or offsets in the
//! text are ignored, not converted.
//!
//! Recognized phrases:
//! - times: `3PM`, `10:30 AM`, `7.15PM`, `15:00`, `noon`, `midnight`
//! - dates: `2026-03-06`, `3/6`, `3/6/26`, `March 6th`, `6 March 2026`
//! - relative days: `today`, `tonight`, `tomorrow`
//! - weekdays: `Friday`, `tues`, `thurs` (next occurrence, today included)

use chrono::{
    DateTime, Datelike, Duration, FixedOffset, NaiveDate, NaiveDateTime, NaiveTime, TimeZone,
    Utc, Weekday,
};
use regex::{Captures, Regex};
use std::sync::OnceLock;

const MONTHS: &str = "jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?";

/// Uppercases every lowercase `am`/`pm`, inside words too.
///
/// The time patterns only match uppercase meridiem markers, so this decides
/// which markers count: `3pm` and `3PM` do, `3Pm` does not.
pub fn normalize_meridiem(text: &str) -> String {
    text.replace("am", "AM").replace("pm", "PM")
}

/// Compiles a pattern once. A pattern that fails to compile never matches.
fn pattern(cell: &'static OnceLock<Option<Regex>>, source: &str) -> Option<&'static Regex> {
    cell.get_or_init(|| Regex::new(source).ok()).as_ref()
}

fn meridiem_time_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(
        &RE,
        r"([0-9]{1,2})(?:[:.]([0-9]{2}))?(?::([0-9]{2}))?\s*(AM|PM)\b",
    )
}

fn clock_time_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&RE, r"([0-9]{1,2}):([0-9]{2})(?::([0-9]{2}))?")
}

fn named_time_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&RE, r"(?i)\b(noon|midday|midnight)\b")
}

fn iso_date_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&RE, r"([0-9]{4})-([0-9]{1,2})-([0-9]{1,2})")
}

fn slash_date_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&RE, r"([0-9]{1,2})/([0-9]{1,2})(?:/([0-9]{4}|[0-9]{2}))?")
}

fn month_day_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(
        &RE,
        &format!(r"(?i)\b({MONTHS})\.?\s+([0-9]{{1,2}})(?:st|nd|rd|th)?\b(?:,?\s+([0-9]{{4}})\b)?"),
    )
}

fn day_month_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(
        &RE,
        &format!(r"(?i)\b([0-9]{{1,2}})(?:st|nd|rd|th)?\s+(?:of\s+)?({MONTHS})\b\.?(?:,?\s+([0-9]{{4}})\b)?"),
    )
}

fn weekday_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(
        &RE,
        r"(?i)\b(monday|tuesday|wednesday|thursday|friday|saturday|sunday|tues?|wed|thu(?:rs?)?|fri)\b",
    )
}

fn relative_day_re() -> Option<&'static Regex> {
    static RE: OnceLock<Option<Regex>> = OnceLock::new();
    pattern(&RE, r"(?i)\b(today|tonight|tomorrow)\b")
}

/// Extracts the first date/time expression from message text.
#[derive(Debug, Clone, Copy)]
pub struct DatetimeExtractor {
    offset: FixedOffset,
}

impl DatetimeExtractor {
    pub fn new(offset: FixedOffset) -> Self {
        Self { offset }
    }

    /// Extracts a datetime relative to the current moment in the configured offset.
    pub fn extract(&self, text: &str) -> Option<DateTime<FixedOffset>> {
        let now = Utc::now().with_timezone(&self.offset).naive_local();
        self.extract_at(text, now)
    }

    /// Extracts a datetime, filling unspecified fields from `now`.
    ///
    /// Returns `None` when the text has no recognizable date or time.
    pub fn extract_at(&self, text: &str, now: NaiveDateTime) -> Option<DateTime<FixedOffset>> {
        let text = normalize_meridiem(text);
        let today = now.date();

        let time = find_time(&text);
        let date = find_explicit_date(&text, today.year())
            .or_else(|| find_relative_day(&text, today))
            .or_else(|| find_weekday(&text, today));

        if time.is_none() && date.is_none() {
            return None;
        }

        let local = NaiveDateTime::new(date.unwrap_or(today), time.unwrap_or(now.time()));
        self.offset.from_local_datetime(&local).single()
    }
}

/// True if the match is not glued to neighbouring digits or separators.
/// A leading `T` is allowed for ISO 8601 datetimes.
fn isolated(text: &str, start: usize, end: usize) -> bool {
    let glued = |c: char| c.is_ascii_digit() || matches!(c, ':' | '.' | '/' | '-');
    let before = text[..start].chars().next_back();
    !before.is_some_and(|c| glued(c) || (c.is_alphabetic() && c != 'T'))
        && !continues_number(&text[end..])
}

/// True if `rest` carries on the number just matched. Sentence punctuation
/// does not, and neither does a `-` opening the second half of a time range.
fn continues_number(rest: &str) -> bool {
    let mut chars = rest.chars();
    match chars.next() {
        Some(c) if c.is_ascii_digit() || matches!(c, ':' | '/') => true,
        Some('.') => chars.next().is_some_and(|c| c.is_ascii_digit()),
        Some('-') => {
            let tail = chars.as_str();
            tail.starts_with(|c: char| c.is_ascii_digit()) && !starts_with_clock(tail)
        }
        _ => false,
    }
}

fn starts_with_clock(text: &str) -> bool {
    let digits = text.chars().take_while(char::is_ascii_digit).count();
    (1..=2).contains(&digits) && text[digits..].starts_with(':')
}

fn number(caps: &Captures<'_>, group: usize) -> Option<u32> {
    caps.get(group).and_then(|m| m.as_str().parse().ok())
}

/// First valid match of `re`, with its byte position.
fn first_valid<T>(
    re: Option<&'static Regex>,
    text: &str,
    check_isolated: bool,
    build: impl Fn(&Captures<'_>) -> Option<T>,
) -> Option<(usize, T)> {
    re?.captures_iter(text).find_map(|caps| {
        let whole = caps.get(0)?;
        if check_isolated && !isolated(text, whole.start(), whole.end()) {
            return None;
        }
        build(&caps).map(|value| (whole.start(), value))
    })
}

fn earliest<T>(candidates: impl IntoIterator<Item = Option<(usize, T)>>) -> Option<T> {
    candidates
        .into_iter()
        .flatten()
        .min_by_key(|(pos, _)| *pos)
        .map(|(_, value)| value)
}

fn find_time(text: &str) -> Option<NaiveTime> {
    let meridiem = first_valid(meridiem_time_re(), text, false, |caps| {
        let whole = caps.get(0)?;
        let before = text[..whole.start()].chars().next_back();
        if before.is_some_and(|c| c.is_ascii_digit() || matches!(c, ':' | '.')) {
            return None;
        }

        let hour = number(caps, 1)?;
        if !(1..=12).contains(&hour) {
            return None;
        }
        let hour = match (caps.get(4)?.as_str(), hour) {
            ("AM", 12) => 0,
            ("PM", 12) => 12,
            ("PM", h) => h + 12,
            (_, h) => h,
        };
        NaiveTime::from_hms_opt(
            hour,
            number(caps, 2).unwrap_or(0),
            number(caps, 3).unwrap_or(0),
        )
    });

    let clock = first_valid(clock_time_re(), text, true, |caps| {
        NaiveTime::from_hms_opt(number(caps, 1)?, number(caps, 2)?, number(caps, 3).unwrap_or(0))
    });

    let named = first_valid(named_time_re(), text, false, |caps| {
        match caps.get(1)?.as_str().to_lowercase().as_str() {
            "midnight" => NaiveTime::from_hms_opt(0, 0, 0),
            _ => NaiveTime::from_hms_opt(12, 0, 0),
        }
    });

    // "10:30 PM" matches both time patterns at the same position; the
    // meridiem reading wins because it is listed first.
    earliest([meridiem, clock, named])
}

fn month_number(name: &str) -> Option<u32> {
    let month = match name.get(..3)?.to_lowercase().as_str() {
        "jan" => 1,
        "feb" => 2,
        "mar" => 3,
        "apr" => 4,
        "may" => 5,
        "jun" => 6,
        "jul" => 7,
        "aug" => 8,
        "sep" => 9,
        "oct" => 10,
        "nov" => 11,
        "dec" => 12,
        _ => return None,
    };
    Some(month)
}

fn find_explicit_date(text: &str, current_year: i32) -> Option<NaiveDate> {
    let year_or_current = |caps: &Captures<'_>, group: usize| -> Option<i32> {
        match caps.get(group) {
            Some(m) => m.as_str().parse().ok(),
            None => Some(current_year),
        }
    };

    let iso = first_valid(iso_date_re(), text, false, |caps| {
        let whole = caps.get(0)?;
        let before = text[..whole.start()].chars().next_back();
        let after = text[whole.end()..].chars().next();
        if before.is_some_and(|c| c.is_alphanumeric()) || after.is_some_and(|c| c.is_ascii_digit())
        {
            return None;
        }
        NaiveDate::from_ymd_opt(caps[1].parse().ok()?, number(caps, 2)?, number(caps, 3)?)
    });

    let slash = first_valid(slash_date_re(), text, true, |caps| {
        let year = match caps.get(3) {
            Some(m) if m.as_str().len() == 2 => 2000 + m.as_str().parse::<i32>().ok()?,
            Some(m) => m.as_str().parse().ok()?,
            None => current_year,
        };
        NaiveDate::from_ymd_opt(year, number(caps, 1)?, number(caps, 2)?)
    });

    let month_day = first_valid(month_day_re(), text, false, |caps| {
        NaiveDate::from_ymd_opt(
            year_or_current(caps, 3)?,
            month_number(caps.get(1)?.as_str())?,
            number(caps, 2)?,
        )
    });

    let day_month = first_valid(day_month_re(), text, false, |caps| {
        NaiveDate::from_ymd_opt(
            year_or_current(caps, 3)?,
            month_number(caps.get(2)?.as_str())?,
            number(caps, 1)?,
        )
    });

    earliest([iso, slash, month_day, day_month])
}

fn find_relative_day(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    first_valid(relative_day_re(), text, false, |caps| {
        match caps.get(1)?.as_str().to_lowercase().as_str() {
            "tomorrow" => today.succ_opt(),
            _ => Some(today),
        }
    })
    .map(|(_, date)| date)
}

fn parse_weekday(name: &str) -> Option<Weekday> {
    let weekday = match name.get(..3)?.to_lowercase().as_str() {
        "mon" => Weekday::Mon,
        "tue" => Weekday::Tue,
        "wed" => Weekday::Wed,
        "thu" => Weekday::Thu,
        "fri" => Weekday::Fri,
        "sat" => Weekday::Sat,
        "sun" => Weekday::Sun,
        _ => return None,
    };
    Some(weekday)
}

/// Next occurrence of the named weekday, today included.
fn find_weekday(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    first_valid(weekday_re(), text, false, |caps| {
        let target = parse_weekday(caps.get(1)?.as_str())?;
        let days_ahead = (target.num_days_from_monday() + 7
            - today.weekday().num_days_from_monday())
            % 7;
        today.checked_add_signed(Duration::days(i64::from(days_ahead)))
    })
    .map(|(_, date)| date)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;

    fn extractor() -> DatetimeExtractor {
        DatetimeExtractor::new(FixedOffset::east_opt(5 * 3600 + 45 * 60).unwrap())
    }

    /// Monday 2026-10-19, 09:12:33 local.
    fn now() -> NaiveDateTime {
        NaiveDate::from_ymd_opt(2026, 10, 19)
            .unwrap()
            .and_hms_opt(9, 12, 33)
            .unwrap()
    }

    fn at(y: i32, m: u32, d: u32, h: u32, min: u32) -> NaiveDateTime {
        NaiveDate::from_ymd_opt(y, m, d)
            .unwrap()
            .and_hms_opt(h, min, 0)
            .unwrap()
    }

    fn extract(text: &str) -> Option<NaiveDateTime> {
        extractor().extract_at(text, now()).map(|dt| dt.naive_local())
    }

    #[test]
    fn all_patterns_compile() {
        assert!(meridiem_time_re().is_some());
        assert!(clock_time_re().is_some());
        assert!(named_time_re().is_some());
        assert!(iso_date_re().is_some());
        assert!(slash_date_re().is_some());
        assert!(month_day_re().is_some());
        assert!(day_month_re().is_some());
        assert!(weekday_re().is_some());
        assert!(relative_day_re().is_some());
    }

    #[test]
    fn three_pm_tomorrow() {
        let dt = extractor()
            .extract_at("Let's meet at 3pm tomorrow", now())
            .unwrap();
        assert_eq!(dt.naive_local(), at(2026, 10, 20, 15, 0));
        assert_eq!(dt.offset().local_minus_utc(), 20_700);
    }

    #[test]
    fn weekday_with_time() {
        assert_eq!(
            extract("Can we meet Friday at 10am?"),
            Some(at(2026, 10, 23, 10, 0))
        );
    }

    #[test]
    fn weekday_today_counts() {
        assert_eq!(
            extract("How about Monday at 4:30 PM"),
            Some(at(2026, 10, 19, 16, 30))
        );
    }

    #[test]
    fn weekday_without_time_keeps_current_time() {
        assert_eq!(
            extract("free on wednesday?"),
            Some(
                NaiveDate::from_ymd_opt(2026, 10, 21)
                    .unwrap()
                    .and_hms_opt(9, 12, 33)
                    .unwrap()
            )
        );
    }

    #[test]
    fn time_without_date_is_today() {
        assert_eq!(extract("call me at 17:45"), Some(at(2026, 10, 19, 17, 45)));
    }

    #[test]
    fn named_month_dates() {
        assert_eq!(
            extract("Are you around on March 5th at 10:30 AM?"),
            Some(at(2026, 3, 5, 10, 30))
        );
        assert_eq!(
            extract("the review on 12 November 2027 at 9am"),
            Some(at(2027, 11, 12, 9, 0))
        );
    }

    #[test]
    fn numeric_dates() {
        assert_eq!(
            extract("deadline 2026-11-02 14:15"),
            Some(at(2026, 11, 2, 14, 15))
        );
        assert_eq!(extract("meet 11/05 at noon"), Some(at(2026, 11, 5, 12, 0)));
        assert_eq!(extract("meet 1/2/27 at 8pm"), Some(at(2027, 1, 2, 20, 0)));
    }

    #[test]
    fn trailing_punctuation_ends_the_match() {
        assert_eq!(
            extract("Can we talk at 14:30."),
            Some(at(2026, 10, 19, 14, 30))
        );
        assert_eq!(
            extract("Are you free on 11/05."),
            Some(
                NaiveDate::from_ymd_opt(2026, 11, 5)
                    .unwrap()
                    .and_hms_opt(9, 12, 33)
                    .unwrap()
            )
        );
        assert_eq!(
            extract("Meet at 14:30, ok?"),
            Some(at(2026, 10, 19, 14, 30))
        );
    }

    #[test]
    fn time_range_uses_its_start() {
        assert_eq!(
            extract("Slot is 10:30-11:30"),
            Some(at(2026, 10, 19, 10, 30))
        );
        assert_eq!(
            extract("tomorrow 9:00-10:00 works"),
            Some(at(2026, 10, 20, 9, 0))
        );
    }

    #[test]
    fn numbers_running_on_are_not_times() {
        assert_eq!(extract("build 14:30.5 passed"), None);
        assert_eq!(extract("see items 3/6-7"), None);
    }

    #[test]
    fn iso_datetime_with_t_separator() {
        assert_eq!(
            extract("slot: 2026-12-01T09:00"),
            Some(at(2026, 12, 1, 9, 0))
        );
    }

    #[test]
    fn twelve_oclock_meridiem() {
        assert_eq!(extract("12pm works"), Some(at(2026, 10, 19, 12, 0)));
        assert_eq!(extract("12am works"), Some(at(2026, 10, 19, 0, 0)));
        assert_eq!(extract("midnight works"), Some(at(2026, 10, 19, 0, 0)));
    }

    #[test]
    fn timezone_text_is_ignored() {
        let dt = extractor()
            .extract_at("3pm EST tomorrow (UTC-05:00)", now())
            .unwrap();
        assert_eq!(dt.naive_local(), at(2026, 10, 20, 15, 0));
        assert_eq!(dt.offset().local_minus_utc(), 20_700);
    }

    #[test]
    fn explicit_date_beats_weekday() {
        assert_eq!(
            extract("Friday, November 6 at 2pm"),
            Some(at(2026, 11, 6, 14, 0))
        );
    }

    #[test]
    fn first_time_wins() {
        assert_eq!(
            extract("either 9:15 or 4pm tomorrow"),
            Some(at(2026, 10, 20, 9, 15))
        );
    }

    #[test]
    fn no_date_content_is_absent() {
        assert_eq!(extract("Thanks for the update, talk soon."), None);
        assert_eq!(extract("I am on it, the server is down!"), None);
        assert_eq!(extract("Version 2.3 shipped to 40 users"), None);
        assert_eq!(extract(""), None);
    }

    #[test]
    fn invalid_values_are_skipped() {
        assert_eq!(extract("13pm 25:61 2026-13-45 February 30"), None);
    }

    #[test]
    fn garbage_does_not_panic() {
        for text in [
            "１２:３０ ５pm ñ//::--",
            "::::////----....",
            "PM AM pm am 99999999999999999999pm",
            "\u{0}\u{feff}tomorrow\u{200b}",
            "🎉 at 3pm 🎉",
        ] {
            let _ = extractor().extract_at(text, now());
        }
        assert_eq!(extract("🎉 at 3pm 🎉"), Some(at(2026, 10, 19, 15, 0)));
    }

    #[test]
    fn meridiem_normalization_touches_words() {
        assert_eq!(
            normalize_meridiem("Sample example at 5pm"),
            "SAMple exAMple at 5PM"
        );
    }
}
