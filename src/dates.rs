//! Date and time normalization shared by both extractors.
//!
//! Turns loose expressions ("11pm", "20th June", "tomorrow at 5:30pm") into
//! fixed display strings. Nothing here reads the system clock; callers pass
//! the reference date in, see [`local_today`].

use std::ops::Range;

use chrono::{Datelike, Local, NaiveDate, NaiveTime, Weekday};
use regex::Regex;

/// Long display format, used for relative keywords ("Wednesday, October 14, 2026").
pub const LONG_DATE_FORMAT: &str = "%A, %B %-d, %Y";

/// Medium display format, used for parsed calendar dates ("June 20, 2026").
pub const MEDIUM_DATE_FORMAT: &str = "%B %-d, %Y";

/// Time-of-day patterns, tried in order; first match wins.
///
/// 1. `H(:MM) am|pm`  2. `H am|pm`  3. `H:MM` (24-hour)
pub const TIME_PATTERNS: [&str; 3] = [
    r"(?i)\b\d{1,2}(?::\d{2})?\s*(?:am|pm)\b",
    r"(?i)\b\d{1,2}\s*(?:am|pm)\b",
    r"\b\d{1,2}:\d{2}\b",
];

/// Formats tried against a cleaned date string that carries a year.
const YEAR_FORMATS: [&str; 4] = ["%A %B %d %Y", "%A %d %B %Y", "%B %d %Y", "%d %B %Y"];

/// The current local calendar date.
pub fn local_today() -> NaiveDate {
    Local::now().date_naive()
}

/// Where an extractor takes "today" from.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Clock {
    /// The local system date at the time of each call.
    #[default]
    Local,
    /// A pinned date, for reproducible output.
    Fixed(NaiveDate),
}

impl Clock {
    /// The reference date for one extraction.
    pub fn today(self) -> NaiveDate {
        match self {
            Self::Local => local_today(),
            Self::Fixed(date) => date,
        }
    }
}

/// Parse a clock time like `11pm`, `9:05 am` or `17:30`.
///
/// Minutes default to zero. `pm` adds twelve hours unless the hour is
/// already 12; `12am` is midnight. Returns `None` when the text is not a
/// time or the result is not a valid clock time (e.g. `13pm`).
pub fn parse_clock_time(raw: &str) -> Option<NaiveTime> {
    let lower = raw.trim().to_ascii_lowercase();
    let (digits, meridiem) = if let Some(rest) = lower.strip_suffix("am") {
        (rest.trim_end(), Some(Meridiem::Am))
    } else if let Some(rest) = lower.strip_suffix("pm") {
        (rest.trim_end(), Some(Meridiem::Pm))
    } else {
        (lower.as_str(), None)
    };

    let (hour_text, minute_text) = match digits.split_once(':') {
        Some((h, m)) => (h, Some(m)),
        None => (digits, None),
    };
    if hour_text.is_empty() || !hour_text.chars().all(|c| c.is_ascii_digit()) {
        return None;
    }
    let hour: u32 = hour_text.parse().ok()?;
    let minute: u32 = match minute_text {
        Some(m) if !m.is_empty() && m.chars().all(|c| c.is_ascii_digit()) => m.parse().ok()?,
        Some(_) => return None,
        None => 0,
    };

    let hour = match meridiem {
        Some(Meridiem::Pm) if hour == 12 => 12,
        Some(Meridiem::Pm) => hour.checked_add(12)?,
        Some(Meridiem::Am) if hour == 12 => 0,
        Some(Meridiem::Am) | None => hour,
    };

    NaiveTime::from_hms_opt(hour, minute, 0)
}

/// Format a raw time expression as zero-padded 24-hour `HH:MM`.
pub fn format_time(raw: &str) -> Option<String> {
    parse_clock_time(raw).map(|t| t.format("%H:%M").to_string())
}

#[derive(Debug, Clone, Copy)]
enum Meridiem {
    Am,
    Pm,
}

// ---------------------------------------------------------------------------
// Resolved dates
// ---------------------------------------------------------------------------

/// Relative day keyword.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RelativeDay {
    /// The previous day.
    Yesterday,
    /// The reference day itself.
    Today,
    /// The following day.
    Tomorrow,
}

impl RelativeDay {
    /// Match a keyword exactly (case-insensitive, surrounding space ignored).
    pub fn from_keyword(text: &str) -> Option<Self> {
        match text.trim().to_ascii_lowercase().as_str() {
            "yesterday" => Some(Self::Yesterday),
            "today" => Some(Self::Today),
            "tomorrow" => Some(Self::Tomorrow),
            _ => None,
        }
    }

    /// Find a keyword as a whole word anywhere in `text` (case-insensitive).
    ///
    /// Checked in the order tomorrow, today, yesterday. "todays" or
    /// "tomorrowland" do not count.
    pub fn find_in(text: &str) -> Option<Self> {
        let words: Vec<&str> = text.split(|c: char| !c.is_alphanumeric()).collect();
        [Self::Tomorrow, Self::Today, Self::Yesterday]
            .into_iter()
            .find(|day| words.iter().any(|word| word.eq_ignore_ascii_case(day.keyword())))
    }

    /// The keyword spelling.
    pub fn keyword(self) -> &'static str {
        match self {
            Self::Yesterday => "yesterday",
            Self::Today => "today",
            Self::Tomorrow => "tomorrow",
        }
    }

    /// Resolve against a reference date.
    pub fn resolve(self, today: NaiveDate) -> Option<NaiveDate> {
        match self {
            Self::Yesterday => today.pred_opt(),
            Self::Today => Some(today),
            Self::Tomorrow => today.succ_opt(),
        }
    }
}

/// Which display format a resolved date renders with.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum DateStyle {
    /// Weekday, month name, day and year.
    Long,
    /// Month name, day and year.
    Medium,
}

/// A calendar date, optionally with a time of day, ready for display.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct ResolvedDate {
    /// Calendar date.
    pub date: NaiveDate,
    /// Time of day, when one was given.
    pub time: Option<NaiveTime>,
    /// Display style.
    pub style: DateStyle,
}

impl ResolvedDate {
    /// Render the display string, e.g. `Thursday, October 15, 2026 at 17:00`.
    pub fn display(&self) -> String {
        let format = match self.style {
            DateStyle::Long => LONG_DATE_FORMAT,
            DateStyle::Medium => MEDIUM_DATE_FORMAT,
        };
        let date = self.date.format(format).to_string();
        match self.time {
            Some(time) => format!("{date} at {}", time.format("%H:%M")),
            None => date,
        }
    }
}

// ---------------------------------------------------------------------------
// Normalizer
// ---------------------------------------------------------------------------

/// Compiled patterns for date normalization.
///
/// Construction compiles a handful of regexes; build one and reuse it.
#[derive(Debug, Clone)]
pub struct DateNormalizer {
    time_patterns: Vec<Regex>,
    ordinal: Option<Regex>,
    filler: Option<Regex>,
    iso: Option<Regex>,
    day_month_year: Option<Regex>,
}

impl Default for DateNormalizer {
    fn default() -> Self {
        Self::new()
    }
}

impl DateNormalizer {
    /// Compile the normalizer's patterns.
    pub fn new() -> Self {
        Self {
            time_patterns: TIME_PATTERNS
                .iter()
                .filter_map(|pattern| Regex::new(pattern).ok())
                .collect(),
            ordinal: Regex::new(r"(?i)\b(\d{1,2})(?:st|nd|rd|th)\b").ok(),
            filler: Regex::new(r"(?i)\b(?:at|on|by|the|of|due)\b").ok(),
            iso: Regex::new(r"^(\d{4})-(\d{1,2})-(\d{1,2})$").ok(),
            day_month_year: Regex::new(r"^(\d{1,2})[/.\-](\d{1,2})[/.\-](\d{4}|\d{2})$").ok(),
        }
    }

    /// Find the first time of day in `text`, trying [`TIME_PATTERNS`] in order.
    ///
    /// Returns the byte range of the match and the parsed time. A match that
    /// is not a valid clock time is skipped in favour of the next pattern.
    pub fn find_time(&self, text: &str) -> Option<(Range<usize>, NaiveTime)> {
        self.time_patterns.iter().find_map(|pattern| {
            let found = pattern.find(text)?;
            parse_clock_time(found.as_str()).map(|time| (found.range(), time))
        })
    }

    /// Resolve a date expression taken verbatim from user input.
    ///
    /// An exact relative keyword resolves against `today` in long style;
    /// anything else goes through [`DateNormalizer::parse_calendar`].
    pub fn resolve(&self, raw: &str, today: NaiveDate) -> Option<ResolvedDate> {
        match RelativeDay::from_keyword(raw) {
            Some(day) => Some(ResolvedDate {
                date: day.resolve(today)?,
                time: None,
                style: DateStyle::Long,
            }),
            None => self.parse_calendar(raw, today),
        }
    }

    /// Resolve `day` against `today`, applying any time of day found in `text`.
    pub fn resolve_relative(
        &self,
        day: RelativeDay,
        text: &str,
        today: NaiveDate,
    ) -> Option<ResolvedDate> {
        Some(ResolvedDate {
            date: day.resolve(today)?,
            time: self.find_time(text).map(|(_, time)| time),
            style: DateStyle::Long,
        })
    }

    /// Generic calendar parsing.
    ///
    /// Accepts this module's own display formats, `20th June [2026]`,
    /// `June 20[, 2026]`, abbreviated names, ISO `YYYY-MM-DD`, `D/M/Y`,
    /// `D-M-Y` and a bare weekday (next occurrence on or after `today`).
    /// A year-less date takes the year of `today`. An embedded time of day is
    /// kept on the result.
    pub fn parse_calendar(&self, raw: &str, today: NaiveDate) -> Option<ResolvedDate> {
        let mut text = raw.trim().to_owned();
        if text.is_empty() {
            return None;
        }

        let time = match self.find_time(&text) {
            Some((range, time)) => {
                text.replace_range(range, " ");
                Some(time)
            }
            None => None,
        };

        let cleaned = self.clean(&text);
        if cleaned.is_empty() {
            return None;
        }

        let date = self
            .parse_numeric(&cleaned)
            .or_else(|| parse_named(&cleaned, today))?;

        Some(ResolvedDate {
            date,
            time,
            style: DateStyle::Medium,
        })
    }

    fn clean(&self, text: &str) -> String {
        let mut cleaned = text.replace(',', " ");
        if let Some(ordinal) = &self.ordinal {
            cleaned = ordinal.replace_all(&cleaned, "$1").into_owned();
        }
        if let Some(filler) = &self.filler {
            cleaned = filler.replace_all(&cleaned, " ").into_owned();
        }
        cleaned
            .split_whitespace()
            .map(|word| {
                if word.eq_ignore_ascii_case("sept") {
                    "Sep"
                } else {
                    word
                }
            })
            .collect::<Vec<_>>()
            .join(" ")
    }

    fn parse_numeric(&self, text: &str) -> Option<NaiveDate> {
        if let Some(caps) = self.iso.as_ref().and_then(|re| re.captures(text)) {
            let year: i32 = caps.get(1)?.as_str().parse().ok()?;
            let month: u32 = caps.get(2)?.as_str().parse().ok()?;
            let day: u32 = caps.get(3)?.as_str().parse().ok()?;
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        if let Some(caps) = self.day_month_year.as_ref().and_then(|re| re.captures(text)) {
            let day: u32 = caps.get(1)?.as_str().parse().ok()?;
            let month: u32 = caps.get(2)?.as_str().parse().ok()?;
            let year_text = caps.get(3)?.as_str();
            let mut year: i32 = year_text.parse().ok()?;
            if year_text.len() == 2 {
                year = year.checked_add(2000)?;
            }
            return NaiveDate::from_ymd_opt(year, month, day);
        }
        None
    }
}

fn parse_named(text: &str, today: NaiveDate) -> Option<NaiveDate> {
    for format in YEAR_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(text, format) {
            return Some(date);
        }
    }

    let with_year = format!("{text} {}", today.year());
    for format in YEAR_FORMATS {
        if let Ok(date) = NaiveDate::parse_from_str(&with_year, format) {
            return Some(date);
        }
    }

    let weekday: Weekday = text.parse().ok()?;
    today.iter_days().take(7).find(|d| d.weekday() == weekday)
}
