//! Rule-based extractor: ordered regex passes over a shrinking buffer.
//!
//! Passes run priority → time → date → assignee. Within a pass the first
//! rule that matches wins, and whatever it matched is cut out of the buffer
//! before the next pass runs, so no span is extracted twice. Whatever is
//! left becomes the task name. The order is load-bearing: a word that could
//! be read as both a date and a name goes to whichever pass sees it first.

use async_trait::async_trait;
use regex::Regex;
use tracing::debug;

use super::{Extraction, TaskExtractor};
use crate::dates::{format_time, Clock, DateNormalizer, TIME_PATTERNS};
use crate::types::{display_name_or_placeholder, TaskFields, NO_TIME_SPECIFIED};

const PRIORITY_PATTERN: &str = r"(?i)\bP[1-4]\b";

const DATE_PATTERNS: [&str; 5] = [
    // 20th June, 3 Sept 2027
    r"(?i)\b\d{1,2}(?:st|nd|rd|th)?\s+(?:jan(?:uary)?|feb(?:ruary)?|mar(?:ch)?|apr(?:il)?|may|june?|july?|aug(?:ust)?|sep(?:t(?:ember)?)?|oct(?:ober)?|nov(?:ember)?|dec(?:ember)?)\b(?:,?\s+\d{4}\b)?",
    r"(?i)\b(?:today|tomorrow|yesterday)\b",
    r"(?i)\b(?:monday|tuesday|wednesday|thursday|friday|saturday|sunday)\b",
    r"\b\d{1,2}/\d{1,2}/\d{2,4}\b",
    r"\b\d{1,2}-\d{1,2}-\d{2,4}\b",
];

/// Assignee rules. Names are capitalized ASCII words; keywords are lowercase.
const ASSIGNEE_RULES: [(&str, Strip); 3] = [
    (
        r"\b(?:assigned to|assign to|by|for|to)\s+([A-Z][a-z]+(?:\s+[A-Z][a-z]+)*)",
        Strip::Match,
    ),
    (r"\b([A-Z][a-z]+)\s+(?:by|tomorrow|today|\d)", Strip::Capture),
    (r"\b([A-Z][a-z]+)\s+(?:by|tomorrow|today)\b", Strip::Capture),
];

const NAME_KEYWORDS: &str = r"(?i)\b(?:assigned to|assign to|by|for|to)\b";

// ---------------------------------------------------------------------------
// Pipeline
// ---------------------------------------------------------------------------

/// Field a pass fills.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Field {
    Priority,
    Time,
    Date,
    Assignee,
}

impl Field {
    fn as_str(self) -> &'static str {
        match self {
            Self::Priority => "priority",
            Self::Time => "time",
            Self::Date => "date",
            Self::Assignee => "assignee",
        }
    }
}

/// What a matching rule removes from the buffer.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum Strip {
    /// The whole match.
    Match,
    /// Only the value capture; surrounding context stays.
    Capture,
}

#[derive(Debug, Clone)]
struct Rule {
    pattern: Regex,
    strip: Strip,
}

impl Rule {
    /// On a match, cut the configured span out of `buffer` and return the
    /// value (capture group 1 if the pattern has one, else the whole match).
    fn take(&self, buffer: &mut String) -> Option<String> {
        let (value, range) = {
            let caps = self.pattern.captures(buffer)?;
            let whole = caps.get(0)?;
            let group = caps.get(1).unwrap_or(whole);
            let range = match self.strip {
                Strip::Match => whole.range(),
                Strip::Capture => group.range(),
            };
            (group.as_str().to_owned(), range)
        };
        buffer.replace_range(range, " ");
        Some(value)
    }
}

#[derive(Debug, Clone)]
struct Pass {
    field: Field,
    rules: Vec<Rule>,
}

impl Pass {
    fn new(field: Field, rules: &[(&str, Strip)]) -> Self {
        Self {
            field,
            rules: rules
                .iter()
                .filter_map(|(pattern, strip)| {
                    Regex::new(pattern).ok().map(|pattern| Rule {
                        pattern,
                        strip: *strip,
                    })
                })
                .collect(),
        }
    }

    fn matching(field: Field, patterns: &[&str]) -> Self {
        let rules: Vec<(&str, Strip)> = patterns.iter().map(|p| (*p, Strip::Match)).collect();
        Self::new(field, &rules)
    }

    fn apply(&self, buffer: &mut String) -> Option<String> {
        self.rules.iter().find_map(|rule| rule.take(buffer))
    }
}

#[derive(Debug, Default)]
struct Captured {
    priority: Option<String>,
    time: Option<String>,
    date: Option<String>,
    assignee: Option<String>,
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Heuristic, fully local task-field extractor.
#[derive(Debug, Clone)]
pub struct RuleBasedExtractor {
    passes: Vec<Pass>,
    name_keywords: Option<Regex>,
    dates: DateNormalizer,
    clock: Clock,
}

impl Default for RuleBasedExtractor {
    fn default() -> Self {
        Self::new()
    }
}

impl RuleBasedExtractor {
    /// Build the extractor against the local date.
    pub fn new() -> Self {
        Self::with_clock(Clock::Local)
    }

    /// Build the extractor with an explicit reference date source.
    pub fn with_clock(clock: Clock) -> Self {
        let passes = vec![
            Pass::matching(Field::Priority, &[PRIORITY_PATTERN]),
            Pass::matching(Field::Time, &TIME_PATTERNS),
            Pass::matching(Field::Date, &DATE_PATTERNS),
            Pass::new(Field::Assignee, &ASSIGNEE_RULES),
        ];
        Self {
            passes,
            name_keywords: Regex::new(NAME_KEYWORDS).ok(),
            dates: DateNormalizer::new(),
            clock,
        }
    }

    /// Extract fields from `input`. Never fails.
    pub fn parse(&self, input: &str) -> TaskFields {
        let mut buffer = input.to_owned();
        let mut captured = Captured::default();

        for pass in &self.passes {
            let value = pass.apply(&mut buffer);
            debug!(field = pass.field.as_str(), value = ?value, "rule pass");
            match pass.field {
                Field::Priority => captured.priority = value,
                Field::Time => captured.time = value,
                Field::Date => captured.date = value,
                Field::Assignee => captured.assignee = value,
            }
        }

        let mut fields = TaskFields::new(input);
        fields.name = self.clean_name(&buffer, input);
        fields.priority = captured
            .priority
            .and_then(|p| p.to_ascii_uppercase().parse().ok())
            .unwrap_or_default();
        if let Some(assignee) = captured.assignee {
            fields.assignee = assignee;
        }
        if let Some(raw_time) = captured.time {
            fields.due_time = format_time(&raw_time).unwrap_or_else(|| NO_TIME_SPECIFIED.to_owned());
        }
        if let Some(raw_date) = captured.date {
            fields.due_date = self
                .dates
                .resolve(&raw_date, self.clock.today())
                .map(|resolved| resolved.display())
                .unwrap_or(raw_date);
        }
        fields
    }

    /// Strip leftover keywords and collapse whitespace.
    ///
    /// If that leaves nothing, the keyword-bearing remainder is used, then the
    /// trimmed input, then [`UNTITLED_TASK`](crate::types::UNTITLED_TASK).
    fn clean_name(&self, remainder: &str, original: &str) -> String {
        let stripped = match &self.name_keywords {
            Some(keywords) => keywords.replace_all(remainder, " ").into_owned(),
            None => remainder.to_owned(),
        };
        let name = collapse_whitespace(&stripped);
        if !name.is_empty() {
            return name;
        }
        let rest = collapse_whitespace(remainder);
        if !rest.is_empty() {
            return rest;
        }
        display_name_or_placeholder(original)
    }
}

fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}

#[async_trait]
impl TaskExtractor for RuleBasedExtractor {
    fn name(&self) -> &str {
        "extractor:rules"
    }

    async fn extract_detailed(&self, input: &str) -> Extraction {
        Extraction::parsed(self.parse(input))
    }
}
