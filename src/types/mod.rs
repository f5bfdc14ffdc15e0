//! Task record types shared by the extractors and the task board.
//!
//! [`TaskFields`] is what an extractor produces; [`Task`] is the same record
//! after the board has given it an identity. Every display field carries a
//! sentinel string instead of being optional, so renderers never see a gap.

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

/// Assignee sentinel used when no person could be identified.
pub const UNASSIGNED: &str = "Unassigned";

/// Due-date sentinel used when no date could be identified.
pub const NO_DUE_DATE: &str = "No due date";

/// Due-time sentinel used when no time of day could be identified.
pub const NO_TIME_SPECIFIED: &str = "No time specified";

/// Last-resort task name when the input leaves nothing to display.
pub const UNTITLED_TASK: &str = "Untitled task";

// ---------------------------------------------------------------------------
// Priority
// ---------------------------------------------------------------------------

/// Task priority. Lower number means more urgent.
#[derive(
    Debug, Clone, Copy, Default, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize,
)]
pub enum Priority {
    /// Most urgent.
    P1,
    /// High.
    P2,
    /// Normal; the default when nothing is specified.
    #[default]
    P3,
    /// Low.
    P4,
}

impl Priority {
    /// All priorities, most urgent first.
    pub const ALL: [Priority; 4] = [Priority::P1, Priority::P2, Priority::P3, Priority::P4];

    /// The literal label (`"P1"`..`"P4"`).
    pub fn as_str(self) -> &'static str {
        match self {
            Self::P1 => "P1",
            Self::P2 => "P2",
            Self::P3 => "P3",
            Self::P4 => "P4",
        }
    }
}

impl fmt::Display for Priority {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Error returned when a string is not one of `P1`..`P4`.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
#[error("invalid priority {0:?}, expected one of P1, P2, P3, P4")]
pub struct InvalidPriority(pub String);

impl FromStr for Priority {
    type Err = InvalidPriority;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_uppercase().as_str() {
            "P1" => Ok(Self::P1),
            "P2" => Ok(Self::P2),
            "P3" => Ok(Self::P3),
            "P4" => Ok(Self::P4),
            _ => Err(InvalidPriority(s.to_owned())),
        }
    }
}

// ---------------------------------------------------------------------------
// TaskFields
// ---------------------------------------------------------------------------

/// Structured fields extracted from one free-text sentence.
///
/// `original_text` is private: it is set once at construction and only
/// readable afterwards.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskFields {
    /// Task description with extracted entities removed. Never empty.
    pub name: String,
    /// Person responsible, or [`UNASSIGNED`].
    pub assignee: String,
    /// Formatted due date, or [`NO_DUE_DATE`].
    pub due_date: String,
    /// `HH:MM` due time, or [`NO_TIME_SPECIFIED`].
    pub due_time: String,
    /// Task priority.
    pub priority: Priority,
    original_text: String,
}

impl TaskFields {
    /// Start a record for `original_text` with every field at its default.
    ///
    /// The name defaults to the trimmed input (or [`UNTITLED_TASK`] when the
    /// input is blank).
    pub fn new(original_text: &str) -> Self {
        Self {
            name: display_name_or_placeholder(original_text),
            assignee: UNASSIGNED.to_owned(),
            due_date: NO_DUE_DATE.to_owned(),
            due_time: NO_TIME_SPECIFIED.to_owned(),
            priority: Priority::default(),
            original_text: original_text.to_owned(),
        }
    }

    /// The fallback record used when extraction could not run.
    ///
    /// The name is the input verbatim, or [`UNTITLED_TASK`] when the input is
    /// blank.
    pub fn fallback(original_text: &str) -> Self {
        let mut fields = Self::new(original_text);
        if !original_text.trim().is_empty() {
            fields.name = original_text.to_owned();
        }
        fields
    }

    /// The verbatim input this record was extracted from.
    pub fn original_text(&self) -> &str {
        &self.original_text
    }

    /// Whether the due date is the "no due date" sentinel.
    pub fn has_due_date(&self) -> bool {
        self.due_date != NO_DUE_DATE
    }

    /// Whether the due time is the "no time specified" sentinel.
    pub fn has_due_time(&self) -> bool {
        self.due_time != NO_TIME_SPECIFIED
    }

    /// Whether someone is assigned.
    pub fn is_assigned(&self) -> bool {
        self.assignee != UNASSIGNED
    }

    /// Replace every editable field with the values from `edit`.
    ///
    /// Blank values fall back to the matching sentinel so the display
    /// invariants survive user edits.
    pub fn apply(&mut self, edit: TaskEdit) {
        self.name = non_blank_or(edit.name, &self.original_text);
        self.assignee = non_blank_or(edit.assignee, UNASSIGNED);
        self.due_date = non_blank_or(edit.due_date, NO_DUE_DATE);
        self.due_time = non_blank_or(edit.due_time, NO_TIME_SPECIFIED);
        self.priority = edit.priority;
    }

    /// The editable subset of this record.
    pub fn to_edit(&self) -> TaskEdit {
        TaskEdit {
            name: self.name.clone(),
            assignee: self.assignee.clone(),
            due_date: self.due_date.clone(),
            due_time: self.due_time.clone(),
            priority: self.priority,
        }
    }
}

/// Trim `text`, substituting [`UNTITLED_TASK`] when nothing is left.
pub fn display_name_or_placeholder(text: &str) -> String {
    let trimmed = text.trim();
    if trimmed.is_empty() {
        UNTITLED_TASK.to_owned()
    } else {
        trimmed.to_owned()
    }
}

fn non_blank_or(value: String, fallback: &str) -> String {
    let trimmed = value.trim();
    if trimmed.is_empty() {
        display_name_or_placeholder(fallback)
    } else if trimmed.len() == value.len() {
        value
    } else {
        trimmed.to_owned()
    }
}

// ---------------------------------------------------------------------------
// Task / TaskEdit
// ---------------------------------------------------------------------------

/// A task on the board: extracted fields plus an identity.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Task {
    /// Opaque unique identifier assigned at insertion time.
    pub id: String,
    /// The task's fields.
    #[serde(flatten)]
    pub fields: TaskFields,
}

/// User-editable fields of a task, applied as a full-record replace.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct TaskEdit {
    /// New task name.
    pub name: String,
    /// New assignee.
    pub assignee: String,
    /// New due date display string.
    pub due_date: String,
    /// New due time display string.
    pub due_time: String,
    /// New priority.
    pub priority: Priority,
}

/// A rejected single-field edit.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum EditError {
    /// The field name is not editable.
    #[error("unknown field {0:?}, expected name, assignee, dueDate, dueTime or priority")]
    UnknownField(String),
    /// The priority value is not P1..P4.
    #[error(transparent)]
    Priority(#[from] InvalidPriority),
}

impl TaskEdit {
    /// Set one field by name.
    ///
    /// Accepts the camelCase names, their snake_case spellings and the
    /// short forms `date` and `time`.
    ///
    /// # Errors
    ///
    /// Returns `EditError` for an unknown field or an invalid priority.
    pub fn set(&mut self, field: &str, value: &str) -> Result<(), EditError> {
        let value = value.trim().to_owned();
        match field.trim().to_ascii_lowercase().as_str() {
            "name" | "title" => self.name = value,
            "assignee" => self.assignee = value,
            "duedate" | "due_date" | "date" => self.due_date = value,
            "duetime" | "due_time" | "time" => self.due_time = value,
            "priority" => self.priority = value.parse()?,
            _ => return Err(EditError::UnknownField(field.to_owned())),
        }
        Ok(())
    }
}
