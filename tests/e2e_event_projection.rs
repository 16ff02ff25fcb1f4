//! End-to-end tests for event and involvement interval projection.
//!
//! Events carry their dates through begin/end links to date values;
//! involvements carry them through link-property associations qualifying the
//! involvement link.

use chrono::NaiveDate;
use cidoc_temporal::model::codes::{class, property};
use cidoc_temporal::{
    DateKind, Endpoint, EntityDraft, ErrorKind, Graph, StorageBackend, Timestamp, TxMode,
};
use pretty_assertions::assert_eq;

fn day(year: i32, month: u32, d: u32) -> Timestamp {
    NaiveDate::from_ymd_opt(year, month, d).unwrap().and_hms_opt(0, 0, 0).unwrap()
}

// ============================================================================
// 1. Event with an exact begin date
// ============================================================================

#[tokio::test]
async fn test_exact_begin_date_is_projected() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let e = db.create_entity(&mut tx, EntityDraft::new(class::ACQUISITION, "E")).await.unwrap();
    let value = db.create_entity(&mut tx,
        EntityDraft::date_value(DateKind::Exact, day(1805, 5, 10)).with_description("deed")).await.unwrap();
    db.create_link(&mut tx, e.into(), property::BEGIN, value).await.unwrap();
    db.commit_tx(tx).await.unwrap();

    let migrator = graph.migrator();
    migrator.prepare_schema().await.unwrap();
    let entities_before = graph.snapshot().entities.len();
    let report = migrator.project_events().await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert!(report.is_clean());

    let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
    let event = db.get_entity(&tx, e).await.unwrap().unwrap();
    assert_eq!(event.interval.begin_from, Some(day(1805, 5, 10)));
    assert_eq!(event.interval.begin_to, None);
    assert_eq!(event.interval.begin_comment, None);
    assert_eq!(event.interval.end(), Default::default());

    // No new entities; the date value is consumed.
    assert_eq!(graph.snapshot().entities.len(), entities_before - 1);
    assert!(db.get_entity(&tx, value).await.unwrap().is_none());
}

// ============================================================================
// 2. Each half resolves independently
// ============================================================================

#[tokio::test]
async fn test_begin_range_and_end_point() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let e = db.create_entity(&mut tx, EntityDraft::new(class::PRODUCTION, "Casting")).await.unwrap();
    let untouched = db.create_entity(&mut tx, EntityDraft::new(class::DESTRUCTION, "Fire")).await.unwrap();
    for (code, kind, when) in [
        (property::BEGIN, DateKind::From, day(1500, 1, 1)),
        (property::BEGIN, DateKind::To, day(1510, 12, 31)),
        (property::END, DateKind::Exact, day(1520, 6, 1)),
    ] {
        let value = db.create_entity(&mut tx, EntityDraft::date_value(kind, when)).await.unwrap();
        db.create_link(&mut tx, e.into(), code, value).await.unwrap();
    }
    db.commit_tx(tx).await.unwrap();

    let migrator = graph.migrator();
    migrator.prepare_schema().await.unwrap();
    let report = migrator.project_events().await.unwrap();
    assert_eq!(report.succeeded, 2);

    let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
    let event = db.get_entity(&tx, e).await.unwrap().unwrap();
    assert_eq!(event.interval.begin_from, Some(day(1500, 1, 1)));
    assert_eq!(event.interval.begin_to, Some(day(1510, 12, 31)));
    assert_eq!(event.interval.end_from, Some(day(1520, 6, 1)));
    assert_eq!(event.interval.end_to, None);
    assert!(db.get_entity(&tx, untouched).await.unwrap().unwrap().interval.is_empty());
    assert!(db.links_from(&tx, e.into(), &[property::BEGIN, property::END]).await.unwrap().is_empty());
}

// ============================================================================
// 3. Involvement links
// ============================================================================

#[tokio::test]
async fn test_involvement_interval_from_link_properties() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let event = db.create_entity(&mut tx, EntityDraft::new(class::ACTIVITY, "Excavation")).await.unwrap();
    let actor = db.create_entity(&mut tx, EntityDraft::new(class::PERSON, "Digger")).await.unwrap();
    let involvement = db.create_link(&mut tx, event.into(), property::CARRIED_OUT_BY, actor).await.unwrap();
    let begin = db.create_entity(&mut tx, EntityDraft::date_value(DateKind::Exact, day(1922, 11, 4))).await.unwrap();
    let end = db.create_entity(&mut tx, EntityDraft::date_value(DateKind::Exact, day(1932, 2, 1))).await.unwrap();
    db.create_link(&mut tx, involvement.into(), property::BEGIN, begin).await.unwrap();
    db.create_link(&mut tx, involvement.into(), property::END, end).await.unwrap();
    db.commit_tx(tx).await.unwrap();

    let migrator = graph.migrator();
    migrator.prepare_schema().await.unwrap();
    let report = migrator.project_events().await.unwrap();
    // The activity itself plus its one involvement.
    assert_eq!(report.succeeded, 2);

    let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
    let link = db.get_link(&tx, involvement).await.unwrap().unwrap();
    assert_eq!(link.interval.begin_from, Some(day(1922, 11, 4)));
    assert_eq!(link.interval.end_from, Some(day(1932, 2, 1)));
    assert!(db.links_from(&tx, involvement.into(), &[property::BEGIN, property::END])
        .await.unwrap().is_empty());

    let event = db.get_entity(&tx, event).await.unwrap().unwrap();
    assert!(event.interval.is_empty());
}

// ============================================================================
// 4. Failures stay local
// ============================================================================

#[tokio::test]
async fn test_orphaned_end_on_involvement_is_reported() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let event = db.create_entity(&mut tx, EntityDraft::new(class::EVENT, "Meeting")).await.unwrap();
    let actor = db.create_entity(&mut tx, EntityDraft::new(class::GROUP, "Council")).await.unwrap();
    let involvement = db.create_link(&mut tx, event.into(), property::HAD_PARTICIPANT, actor).await.unwrap();
    let to = db.create_entity(&mut tx, EntityDraft::date_value(DateKind::To, day(1600, 1, 1))).await.unwrap();
    db.create_link(&mut tx, involvement.into(), property::END, to).await.unwrap();
    let begin = db.create_entity(&mut tx, EntityDraft::date_value(DateKind::Exact, day(1599, 1, 1))).await.unwrap();
    db.create_link(&mut tx, event.into(), property::BEGIN, begin).await.unwrap();
    db.commit_tx(tx).await.unwrap();

    let migrator = graph.migrator();
    migrator.prepare_schema().await.unwrap();
    let report = migrator.project_events().await.unwrap();
    assert_eq!(report.succeeded, 1);
    assert_eq!(report.failed_subjects(), vec![Endpoint::Link(involvement)]);
    assert_eq!(report.failures[0].kind, ErrorKind::OrphanedToBound);

    let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
    assert_eq!(db.get_entity(&tx, event).await.unwrap().unwrap().interval.begin_from, Some(day(1599, 1, 1)));
    assert!(db.get_entity(&tx, to).await.unwrap().is_some());
}

#[tokio::test]
async fn test_two_exact_begin_values_are_ambiguous() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let e = db.create_entity(&mut tx, EntityDraft::new(class::EVENT, "Battle")).await.unwrap();
    for year in [1066, 1067] {
        let value = db.create_entity(&mut tx, EntityDraft::date_value(DateKind::Exact, day(year, 10, 14))).await.unwrap();
        db.create_link(&mut tx, e.into(), property::BEGIN, value).await.unwrap();
    }
    db.commit_tx(tx).await.unwrap();

    let migrator = graph.migrator();
    migrator.prepare_schema().await.unwrap();
    let report = migrator.project_events().await.unwrap();
    assert_eq!(report.failures.len(), 1);
    assert_eq!(report.failures[0].kind, ErrorKind::AmbiguousTemporalSource);
    assert!(report.failures[0].message.contains("entity"));
}
