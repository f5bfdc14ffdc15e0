//! Task board lifecycle tests.

use std::collections::HashSet;
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;

use async_trait::async_trait;
use chrono::NaiveDate;

use smarttask::board::{BoardError, TaskBoard};
use smarttask::dates::Clock;
use smarttask::extractors::{ExtractError, Extraction, RuleBasedExtractor, TaskExtractor};
use smarttask::types::{Priority, TaskEdit, NO_DUE_DATE, UNASSIGNED};

/// Counts calls and always falls back.
#[derive(Default)]
struct CountingFallbackExtractor {
    calls: AtomicUsize,
}

#[async_trait]
impl TaskExtractor for CountingFallbackExtractor {
    fn name(&self) -> &str {
        "extractor:counting"
    }

    async fn extract_detailed(&self, input: &str) -> Extraction {
        self.calls.fetch_add(1, Ordering::SeqCst);
        Extraction::fallback(input, ExtractError::EmptyReply)
    }
}

fn rules_board() -> TaskBoard {
    let today = NaiveDate::from_ymd_opt(2026, 10, 14).expect("valid date");
    TaskBoard::new(Arc::new(RuleBasedExtractor::with_clock(Clock::Fixed(
        today,
    ))))
}

#[tokio::test]
async fn submit_extracts_and_keeps_order() {
    let mut board = rules_board();
    let first = board
        .submit("Finish landing page Aman by 11pm 20th June P1")
        .await
        .expect("accepted");
    let second = board.submit("Call client").await.expect("accepted");

    assert_eq!(first.task.fields.priority, Priority::P1);
    assert_eq!(first.task.fields.assignee, "Aman");
    assert_eq!(second.task.fields.name, "Call client");

    let ids: Vec<&str> = board.tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids, vec![first.task.id.as_str(), second.task.id.as_str()]);
}

#[tokio::test]
async fn ids_are_unique() {
    let mut board = rules_board();
    for _ in 0..25 {
        board.submit("Call client").await.expect("accepted");
    }
    let ids: HashSet<&str> = board.tasks().iter().map(|t| t.id.as_str()).collect();
    assert_eq!(ids.len(), 25);
}

#[tokio::test]
async fn blank_input_never_reaches_extractor() {
    let extractor = Arc::new(CountingFallbackExtractor::default());
    let mut board = TaskBoard::new(extractor.clone());

    for blank in ["", "   ", "\n\t"] {
        assert_eq!(board.submit(blank).await.err(), Some(BoardError::EmptyInput));
    }
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 0);
    assert!(board.is_empty());
}

#[tokio::test]
async fn fallback_is_reported_and_task_still_added() {
    let extractor = Arc::new(CountingFallbackExtractor::default());
    let mut board = TaskBoard::new(extractor.clone());

    let submission = board.submit("Call client P1").await.expect("accepted");
    assert!(submission.used_fallback);
    assert_eq!(submission.task.fields.priority, Priority::P3);
    assert_eq!(board.len(), 1);
    assert_eq!(extractor.calls.load(Ordering::SeqCst), 1);
}

#[tokio::test]
async fn edit_replaces_fields_and_keeps_identity() {
    let mut board = rules_board();
    let task = board.submit("Call Bob tomorrow").await.expect("accepted").task;

    let updated = board
        .update(
            &task.id,
            TaskEdit {
                name: "Call Bob about the contract".to_owned(),
                assignee: "Bob".to_owned(),
                due_date: String::new(),
                due_time: "10:00".to_owned(),
                priority: Priority::P2,
            },
        )
        .expect("known id")
        .clone();

    assert_eq!(updated.id, task.id);
    assert_eq!(updated.fields.name, "Call Bob about the contract");
    assert_eq!(updated.fields.assignee, "Bob");
    assert_eq!(updated.fields.due_date, NO_DUE_DATE);
    assert_eq!(updated.fields.due_time, "10:00");
    assert_eq!(updated.fields.priority, Priority::P2);
    assert_eq!(updated.fields.original_text(), "Call Bob tomorrow");
    assert_eq!(board.get(&task.id), Some(&updated));
}

#[tokio::test]
async fn single_field_edit_round_trip() {
    let mut board = rules_board();
    let task = board.submit("Call client").await.expect("accepted").task;

    let mut edit = task.fields.to_edit();
    edit.set("assignee", "Priya").expect("known field");
    board.update(&task.id, edit).expect("known id");

    let stored = board.get(&task.id).expect("still present");
    assert_eq!(stored.fields.assignee, "Priya");
    assert_eq!(stored.fields.name, "Call client");
}

#[tokio::test]
async fn delete_removes_only_that_task() {
    let mut board = rules_board();
    let keep = board.submit("Call client").await.expect("accepted").task;
    let gone = board.submit("Water plants").await.expect("accepted").task;

    let removed = board.delete(&gone.id).expect("known id");
    assert_eq!(removed.id, gone.id);
    assert_eq!(board.len(), 1);
    assert!(board.get(&gone.id).is_none());
    assert_eq!(board.get(&keep.id).map(|t| t.fields.assignee.as_str()), Some(UNASSIGNED));

    assert_eq!(
        board.delete(&gone.id).err(),
        Some(BoardError::NotFound(gone.id.clone()))
    );
}

#[tokio::test]
async fn shared_prefix_is_ambiguous() {
    let mut board = rules_board();
    // Seventeen ids over sixteen leading hex digits: two must share one.
    for _ in 0..17 {
        board.submit("Call client").await.expect("accepted");
    }
    let mut leading: Vec<String> = board
        .tasks()
        .iter()
        .filter_map(|t| t.id.get(..1).map(str::to_owned))
        .collect();
    leading.sort();
    let shared = leading
        .windows(2)
        .find(|pair| pair.first() == pair.last())
        .and_then(|pair| pair.first().cloned())
        .expect("two ids share a leading digit");

    assert_eq!(
        board.resolve_id(&shared),
        Err(BoardError::Ambiguous(shared.clone()))
    );
    for task in board.tasks() {
        assert_eq!(board.resolve_id(&task.id), Ok(task.id.as_str()));
    }
}
