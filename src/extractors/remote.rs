//! Remote-model extractor: one chat-completion call per sentence.
//!
//! The model is steered with a fixed few-shot system prompt to answer with a
//! JSON object `{title, assignee, date, priority}`. Priority uses the
//! `low`/`medium`/`high` vocabulary in both the prompt and the mapping.
//! Any failure (transport, empty reply, non-JSON, non-object) produces the
//! fallback record instead of an error.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;
use serde_json::{Map, Value};
use tracing::{debug, warn};

use super::{ExtractError, Extraction, TaskExtractor};
use crate::dates::{Clock, DateNormalizer, RelativeDay};
use crate::providers::{CompletionRequest, LlmProvider, Message, ResponseFormat};
use crate::types::{Priority, TaskFields, NO_DUE_DATE, UNASSIGNED};

/// Default sampling temperature for extraction calls.
pub const DEFAULT_TEMPERATURE: f32 = 0.1;

/// Default completion budget; a reply is one small JSON object.
pub const DEFAULT_MAX_TOKENS: u32 = 200;

const REPLY_PREVIEW_CHARS: usize = 200;

/// One input/output pair embedded in the system prompt.
struct FewShot {
    input: &'static str,
    title: &'static str,
    assignee: Option<&'static str>,
    date: Option<&'static str>,
    priority: Option<&'static str>,
}

const EXAMPLES: [FewShot; 5] = [
    FewShot {
        input: "Call harsha at 5pm",
        title: "Call harsha",
        assignee: Some("Harsha"),
        date: Some("today at 5pm"),
        priority: None,
    },
    FewShot {
        input: "Finish report with Alice by tomorrow at 5pm, high priority",
        title: "Finish report",
        assignee: Some("Alice"),
        date: Some("tomorrow at 5pm"),
        priority: Some("high"),
    },
    FewShot {
        input: "Finish landing page Aman by 11pm 20th June",
        title: "Finish landing page",
        assignee: Some("Aman"),
        date: Some("11pm 20th June"),
        priority: None,
    },
    FewShot {
        input: "Review budget with Sam on 3rd March, not urgent",
        title: "Review budget",
        assignee: Some("Sam"),
        date: Some("3rd March"),
        priority: Some("low"),
    },
    FewShot {
        input: "Call client",
        title: "Call client",
        assignee: None,
        date: None,
        priority: None,
    },
];

const INSTRUCTIONS: &str = "\
You are a task parsing assistant.

Extract structured task data from the user's sentence and answer with a JSON object with these fields:
- \"title\": a short title for the task, without the assignee, date or priority
- \"assignee\": the name of the person responsible, or null if not provided
- \"date\": the due date and time in natural language as written, or null if not specified
- \"priority\": one of \"low\", \"medium\", \"high\", or null if the sentence does not state one

Respond only with the JSON object, no commentary or explanation.";

/// Build the few-shot system prompt.
pub fn system_prompt() -> String {
    let examples: Vec<Value> = EXAMPLES
        .iter()
        .map(|example| {
            serde_json::json!({
                "input": example.input,
                "output": {
                    "title": example.title,
                    "assignee": example.assignee,
                    "date": example.date,
                    "priority": example.priority,
                }
            })
        })
        .collect();
    let rendered = serde_json::to_string_pretty(&examples).unwrap_or_default();
    format!("{INSTRUCTIONS}\n\nExamples:\n{rendered}")
}

// ---------------------------------------------------------------------------
// Reply parsing and mapping
// ---------------------------------------------------------------------------

/// Parse the model's reply text into a JSON object.
///
/// Text around the outermost `{ ... }` is ignored, since models sometimes
/// wrap the object in prose or code fences.
///
/// # Errors
///
/// `ExtractError::NotJson` if the text does not parse and
/// `ExtractError::NotAnObject` if it parses to anything but an object.
pub fn parse_reply(text: &str) -> Result<Map<String, Value>, ExtractError> {
    let trimmed = text.trim();
    let json_text = match (trimmed.find('{'), trimmed.rfind('}')) {
        (Some(start), Some(end)) if start < end => &trimmed[start..=end],
        _ => trimmed,
    };

    match serde_json::from_str::<Value>(json_text).map_err(ExtractError::NotJson)? {
        Value::Object(map) => Ok(map),
        _ => Err(ExtractError::NotAnObject),
    }
}

/// Map the model's priority word onto [`Priority`].
///
/// `high` → P1, `medium` → P2, `low` → P3; anything else, including a
/// missing value, → P3.
pub fn map_priority(value: Option<&str>) -> Priority {
    match value.map(|v| v.trim().to_ascii_lowercase()).as_deref() {
        Some("high") => Priority::P1,
        Some("medium") => Priority::P2,
        Some("low") => Priority::P3,
        _ => Priority::P3,
    }
}

/// Map the model's free-text date onto a display string.
///
/// A relative keyword ("tomorrow at 5:30pm") resolves against `today` and
/// keeps any time of day; other text goes through generic calendar parsing.
/// Absent or unparseable dates give [`NO_DUE_DATE`].
pub fn map_date(dates: &DateNormalizer, value: Option<&str>, today: NaiveDate) -> String {
    let Some(raw) = value else {
        return NO_DUE_DATE.to_owned();
    };
    let resolved = match RelativeDay::find_in(raw) {
        Some(day) => dates.resolve_relative(day, raw, today),
        None => dates.parse_calendar(raw, today),
    };
    resolved
        .map(|date| date.display())
        .unwrap_or_else(|| NO_DUE_DATE.to_owned())
}

/// Non-blank string value of `key`; null and non-string values count as absent.
fn string_field(reply: &Map<String, Value>, key: &str) -> Option<String> {
    reply
        .get(key)
        .and_then(Value::as_str)
        .map(str::trim)
        .filter(|s| !s.is_empty())
        .map(str::to_owned)
}

// ---------------------------------------------------------------------------
// Extractor
// ---------------------------------------------------------------------------

/// Extractor backed by a chat-completion model.
pub struct RemoteModelExtractor {
    provider: Arc<dyn LlmProvider>,
    system_prompt: String,
    dates: DateNormalizer,
    clock: Clock,
    temperature: Option<f32>,
    max_tokens: Option<u32>,
}

impl std::fmt::Debug for RemoteModelExtractor {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("RemoteModelExtractor")
            .field("model", &self.provider.model_id())
            .field("clock", &self.clock)
            .field("temperature", &self.temperature)
            .field("max_tokens", &self.max_tokens)
            .finish()
    }
}

impl RemoteModelExtractor {
    /// Build the extractor over an injected transport.
    pub fn new(provider: Arc<dyn LlmProvider>) -> Self {
        Self {
            provider,
            system_prompt: system_prompt(),
            dates: DateNormalizer::new(),
            clock: Clock::Local,
            temperature: Some(DEFAULT_TEMPERATURE),
            max_tokens: Some(DEFAULT_MAX_TOKENS),
        }
    }

    /// Resolve relative dates against `clock` instead of the local date.
    #[must_use]
    pub fn with_clock(mut self, clock: Clock) -> Self {
        self.clock = clock;
        self
    }

    /// Override sampling parameters sent with each request.
    #[must_use]
    pub fn with_sampling(mut self, temperature: Option<f32>, max_tokens: Option<u32>) -> Self {
        self.temperature = temperature;
        self.max_tokens = max_tokens;
        self
    }

    /// The request sent for `input`.
    pub fn build_request(&self, input: &str) -> CompletionRequest {
        CompletionRequest {
            messages: vec![Message::user(input)],
            system: Some(self.system_prompt.clone()),
            max_tokens: self.max_tokens,
            temperature: self.temperature,
            response_format: ResponseFormat::JsonObject,
        }
    }

    /// Map a parsed reply onto task fields for `input`.
    pub fn map_reply(&self, input: &str, reply: &Map<String, Value>) -> TaskFields {
        let mut fields = TaskFields::fallback(input);
        if let Some(title) = string_field(reply, "title") {
            fields.name = title;
        }
        fields.assignee = string_field(reply, "assignee").unwrap_or_else(|| UNASSIGNED.to_owned());
        fields.priority = map_priority(string_field(reply, "priority").as_deref());
        fields.due_date = map_date(
            &self.dates,
            string_field(reply, "date").as_deref(),
            self.clock.today(),
        );
        fields
    }

    async fn request_reply(&self, input: &str) -> Result<Map<String, Value>, ExtractError> {
        let response = self.provider.complete(self.build_request(input)).await?;

        let text = response
            .text
            .filter(|t| !t.trim().is_empty())
            .ok_or(ExtractError::EmptyReply)?;

        debug!(
            model = %response.model,
            input_tokens = response.usage.input_tokens,
            output_tokens = response.usage.output_tokens,
            reply_preview = %text.chars().take(REPLY_PREVIEW_CHARS).collect::<String>(),
            "remote extraction reply"
        );

        parse_reply(&text)
    }
}

#[async_trait]
impl TaskExtractor for RemoteModelExtractor {
    fn name(&self) -> &str {
        "extractor:remote"
    }

    async fn extract_detailed(&self, input: &str) -> Extraction {
        debug!(model = %self.provider.model_id(), "remote extraction starting");
        match self.request_reply(input).await {
            Ok(reply) => Extraction::parsed(self.map_reply(input, &reply)),
            Err(err) => {
                warn!(error = %err, "remote extraction failed, using fallback record");
                Extraction::fallback(input, err)
            }
        }
    }
}
