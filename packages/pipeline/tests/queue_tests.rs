//! Topic queue on disk, plus its ordering and persistence properties.

use chrono::{DateTime, NaiveDate, TimeZone, Utc};
use pipeline_core::error::QueueError;
use pipeline_core::lockfile::{lock_path_for, LockFile};
use pipeline_core::queue::{
    topic_slug, NewTopic, Priority, QueueDocument, StatusExtras, TopicFilter, TopicQueue,
    TopicStatus,
};
use proptest::prelude::*;
use proptest::test_runner::Config;
use tempfile::TempDir;

fn today() -> NaiveDate {
    NaiveDate::from_ymd_opt(2026, 2, 15).unwrap()
}

fn at(second: u32) -> DateTime<Utc> {
    Utc.with_ymd_and_hms(2026, 2, 15, 9, 0, second).unwrap()
}

fn queue(dir: &TempDir) -> TopicQueue {
    TopicQueue::new(dir.path().join("data/queue.json"))
}

#[test]
fn missing_file_is_an_empty_queue() {
    let dir = TempDir::new().unwrap();
    let queue = queue(&dir);
    assert_eq!(queue.load().unwrap(), QueueDocument::default());
    assert!(queue.next_pending().unwrap().is_none());
    assert!(queue.list(&TopicFilter::default()).unwrap().is_empty());
}

#[test]
fn adding_twice_on_one_day_is_a_duplicate() {
    let dir = TempDir::new().unwrap();
    let queue = queue(&dir);

    let first = queue.add(NewTopic::new("Flat earth resurgence", "Science")).unwrap();
    let err = queue
        .add(NewTopic::new("Flat earth resurgence", "Science"))
        .unwrap_err();

    assert!(matches!(err, QueueError::DuplicateSlug(ref s) if *s == first.slug));
    assert_eq!(queue.list(&TopicFilter::default()).unwrap().len(), 1);
}

#[test]
fn document_shape_on_disk() {
    let dir = TempDir::new().unwrap();
    let queue = queue(&dir);
    queue
        .add(
            NewTopic::new("Flat earth resurgence", "Science")
                .with_priority(Priority::High)
                .with_slug("flat-earth-20260215"),
        )
        .unwrap();

    let raw: serde_json::Value =
        serde_json::from_str(&std::fs::read_to_string(queue.path()).unwrap()).unwrap();
    assert_eq!(raw["version"], 1);
    assert!(raw["last_updated"].is_string());
    assert_eq!(raw["topics"][0]["slug"], "flat-earth-20260215");
    assert_eq!(raw["topics"][0]["status"], "pending");
    assert_eq!(raw["topics"][0]["priority"], "high");
    assert!(raw["topics"][0].get("last_error").is_none());
    // The queue lock is gone once the write finished.
    assert!(!lock_path_for(queue.path()).exists());
}

#[test]
fn held_lock_blocks_writes_but_not_reads() {
    let dir = TempDir::new().unwrap();
    let queue = queue(&dir);
    queue.add(NewTopic::new("one", "Science")).unwrap();

    let held = LockFile::acquire(lock_path_for(queue.path())).unwrap();
    let err = queue.add(NewTopic::new("two", "Science")).unwrap_err();
    assert!(matches!(err, QueueError::Locked { .. }));
    assert_eq!(queue.list(&TopicFilter::default()).unwrap().len(), 1);

    drop(held);
    queue.add(NewTopic::new("two", "Science")).unwrap();
    assert_eq!(queue.list(&TopicFilter::default()).unwrap().len(), 2);
}

#[test]
fn reset_walks_needs_review_back_to_pending() {
    let dir = TempDir::new().unwrap();
    let queue = queue(&dir);
    let slug = queue.add(NewTopic::new("topic", "Science")).unwrap().slug;
    for status in [TopicStatus::Processing, TopicStatus::Researching] {
        queue.set_status(&slug, status, StatusExtras::default()).unwrap();
    }
    queue
        .set_status(&slug, TopicStatus::NeedsReview, StatusExtras::error("2 sources"))
        .unwrap();

    let topic = queue.reset(&slug).unwrap();
    assert_eq!(topic.status, TopicStatus::Pending);
    assert_eq!(topic.last_error, None);
    assert_eq!(queue.next_pending().unwrap().unwrap().slug, slug);
}

#[test]
fn reset_refuses_active_topics() {
    let dir = TempDir::new().unwrap();
    let queue = queue(&dir);
    let slug = queue.add(NewTopic::new("topic", "Science")).unwrap().slug;
    queue
        .set_status(&slug, TopicStatus::Processing, StatusExtras::default())
        .unwrap();

    assert!(matches!(
        queue.reset(&slug),
        Err(QueueError::IllegalTransition { from: TopicStatus::Processing, .. })
    ));
}

fn arb_priority() -> impl Strategy<Value = Priority> {
    prop_oneof![Just(Priority::High), Just(Priority::Medium), Just(Priority::Low)]
}

fn arb_status() -> impl Strategy<Value = TopicStatus> {
    prop::sample::select(TopicStatus::ALL.to_vec())
}

/// Queues built from distinct names with arbitrary priority and status.
fn arb_document() -> impl Strategy<Value = QueueDocument> {
    prop::collection::vec((arb_priority(), arb_status()), 0..12).prop_map(|specs| {
        let mut doc = QueueDocument::default();
        for (i, (priority, status)) in specs.into_iter().enumerate() {
            let topic = NewTopic::new(format!("topic {}", i), "Science").with_priority(priority);
            doc.add(topic, today(), at(i as u32)).unwrap();
            doc.topics[i].status = status;
        }
        doc
    })
}

proptest! {
    #![proptest_config(Config::with_cases(64))]

    #[test]
    fn next_pending_depends_only_on_contents(doc in arb_document()) {
        let copy = doc.clone();
        let chosen = doc.next_pending().map(|t| t.slug.clone());
        prop_assert_eq!(copy.next_pending().map(|t| t.slug.clone()), chosen.clone());

        let expected = doc
            .topics
            .iter()
            .enumerate()
            .filter(|(_, t)| t.status == TopicStatus::Pending)
            .min_by_key(|(i, t)| (t.priority, *i))
            .map(|(_, t)| t.slug.clone());
        prop_assert_eq!(chosen, expected);
    }

    #[test]
    fn persisted_queue_loads_back_unchanged(doc in arb_document()) {
        let dir = TempDir::new().unwrap();
        let queue = queue(&dir);
        queue.save(&doc).unwrap();
        prop_assert_eq!(queue.load().unwrap(), doc);
    }

    #[test]
    fn slugs_are_stable_for_a_name_and_day(name in "[A-Za-z][A-Za-z0-9 ,.'!?-]{0,80}") {
        let first = topic_slug(&name, today());
        prop_assert_eq!(first.clone(), topic_slug(&name, today()));
        if let Some(slug) = first {
            prop_assert!(slug.ends_with("-20260215"));
            prop_assert!(report::schema::is_kebab_slug(&slug));
        }
    }
}
