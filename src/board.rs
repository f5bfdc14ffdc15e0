//! In-memory task board.
//!
//! Holds the tasks added during one session. Each submission runs exactly
//! one extraction; edits and deletes address tasks by id.

use std::sync::Arc;

use tracing::debug;

use crate::extractors::TaskExtractor;
use crate::types::{Task, TaskEdit};

/// Errors returned by [`TaskBoard`] operations.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum BoardError {
    /// The submitted text was empty after trimming.
    #[error("task text is empty")]
    EmptyInput,
    /// No task has this id.
    #[error("no task with id {0}")]
    NotFound(String),
    /// An id prefix matches more than one task.
    #[error("id prefix {0} matches more than one task")]
    Ambiguous(String),
}

/// Outcome of [`TaskBoard::submit`].
#[derive(Debug, Clone)]
pub struct Submission {
    /// The task as stored on the board.
    pub task: Task,
    /// Whether the extractor fell back to the default record.
    pub used_fallback: bool,
}

/// Ordered collection of tasks backed by one extractor.
pub struct TaskBoard {
    extractor: Arc<dyn TaskExtractor>,
    tasks: Vec<Task>,
}

impl std::fmt::Debug for TaskBoard {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TaskBoard")
            .field("extractor", &self.extractor.name())
            .field("tasks", &self.tasks.len())
            .finish()
    }
}

impl TaskBoard {
    /// Create an empty board.
    pub fn new(extractor: Arc<dyn TaskExtractor>) -> Self {
        Self {
            extractor,
            tasks: Vec::new(),
        }
    }

    /// Extract a task from `text` and append it.
    ///
    /// Holding `&mut self` for the whole call keeps submissions sequential.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::EmptyInput` if `text` is blank; the extractor is
    /// not called in that case.
    pub async fn submit(&mut self, text: &str) -> Result<Submission, BoardError> {
        let text = text.trim();
        if text.is_empty() {
            return Err(BoardError::EmptyInput);
        }

        let extraction = self.extractor.extract_detailed(text).await;
        let used_fallback = extraction.used_fallback();
        let task = Task {
            id: uuid::Uuid::new_v4().to_string(),
            fields: extraction.fields,
        };

        debug!(
            id = %task.id,
            extractor = self.extractor.name(),
            used_fallback,
            "task added"
        );
        self.tasks.push(task.clone());

        Ok(Submission {
            task,
            used_fallback,
        })
    }

    /// Replace the editable fields of task `id`.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::NotFound` for an unknown id.
    pub fn update(&mut self, id: &str, edit: TaskEdit) -> Result<&Task, BoardError> {
        let task = self
            .tasks
            .iter_mut()
            .find(|task| task.id == id)
            .ok_or_else(|| BoardError::NotFound(id.to_owned()))?;
        task.fields.apply(edit);
        debug!(id, "task updated");
        Ok(task)
    }

    /// Remove task `id` and return it.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::NotFound` for an unknown id.
    pub fn delete(&mut self, id: &str) -> Result<Task, BoardError> {
        let index = self
            .tasks
            .iter()
            .position(|task| task.id == id)
            .ok_or_else(|| BoardError::NotFound(id.to_owned()))?;
        debug!(id, "task deleted");
        Ok(self.tasks.remove(index))
    }

    /// Task `id`, if present.
    pub fn get(&self, id: &str) -> Option<&Task> {
        self.tasks.iter().find(|task| task.id == id)
    }

    /// Resolve a full id or a unique id prefix to the full id.
    ///
    /// # Errors
    ///
    /// Returns `BoardError::NotFound` when nothing matches and
    /// `BoardError::Ambiguous` when several tasks share the prefix.
    pub fn resolve_id(&self, prefix: &str) -> Result<&str, BoardError> {
        let prefix = prefix.trim();
        if prefix.is_empty() {
            return Err(BoardError::NotFound(prefix.to_owned()));
        }
        if let Some(task) = self.get(prefix) {
            return Ok(&task.id);
        }
        let mut matches = self.tasks.iter().filter(|task| task.id.starts_with(prefix));
        match (matches.next(), matches.next()) {
            (Some(task), None) => Ok(&task.id),
            (Some(_), Some(_)) => Err(BoardError::Ambiguous(prefix.to_owned())),
            (None, _) => Err(BoardError::NotFound(prefix.to_owned())),
        }
    }

    /// All tasks in insertion order.
    pub fn tasks(&self) -> &[Task] {
        &self.tasks
    }

    /// Number of tasks.
    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    /// Whether the board is empty.
    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}
