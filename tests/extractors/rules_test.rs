//! Rule-based extractor behaviour through the public trait.

use chrono::NaiveDate;

use smarttask::dates::Clock;
use smarttask::extractors::{RuleBasedExtractor, TaskExtractor};
use smarttask::types::{Priority, NO_DUE_DATE, NO_TIME_SPECIFIED, UNASSIGNED};

fn extractor() -> RuleBasedExtractor {
    let today = NaiveDate::from_ymd_opt(2026, 10, 14).expect("valid date");
    RuleBasedExtractor::with_clock(Clock::Fixed(today))
}

#[tokio::test]
async fn call_client_yields_defaults() {
    let extraction = extractor().extract_detailed("Call client").await;
    assert!(!extraction.used_fallback());

    let fields = extraction.fields;
    assert_eq!(fields.name, "Call client");
    assert_eq!(fields.assignee, UNASSIGNED);
    assert_eq!(fields.due_date, NO_DUE_DATE);
    assert_eq!(fields.due_time, NO_TIME_SPECIFIED);
    assert_eq!(fields.priority, Priority::P3);
}

#[tokio::test]
async fn landing_page_sentence() {
    let fields = extractor()
        .extract("Finish landing page Aman by 11pm 20th June P1")
        .await;
    assert_eq!(fields.priority, Priority::P1);
    assert_eq!(fields.due_time, "23:00");
    assert_eq!(fields.due_date, "June 20, 2026");
    assert_eq!(fields.assignee, "Aman");
    assert_eq!(fields.name, "Finish landing page");
}

#[tokio::test]
async fn tomorrow_with_keyword_assignee() {
    let fields = extractor()
        .extract("Send the quarterly report to Dana tomorrow 9:15am P2")
        .await;
    assert_eq!(fields.priority, Priority::P2);
    assert_eq!(fields.due_time, "09:15");
    assert_eq!(fields.due_date, "Thursday, October 15, 2026");
    assert_eq!(fields.assignee, "Dana");
    assert_eq!(fields.name, "Send the quarterly report");
}

#[tokio::test]
async fn day_first_date_with_year() {
    let fields = extractor().extract("Renew passport 3rd March 2027").await;
    assert_eq!(fields.due_date, "March 3, 2027");
    assert_eq!(fields.name, "Renew passport");
}

#[tokio::test]
async fn serialized_fields_use_display_names() {
    let fields = extractor().extract("Call client P4").await;
    let value = serde_json::to_value(&fields).expect("should serialize");
    assert_eq!(value["name"], "Call client");
    assert_eq!(value["priority"], "P4");
    assert_eq!(value["dueDate"], NO_DUE_DATE);
    assert_eq!(value["dueTime"], NO_TIME_SPECIFIED);
    assert_eq!(value["originalText"], "Call client P4");
}
