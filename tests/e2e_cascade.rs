//! End-to-end tests for the deletion cascade.
//!
//! Deletes go through `Graph::delete_entity`, which runs the registered
//! cascade policy inside the deleting transaction.

use cidoc_temporal::model::codes::{class, property};
use cidoc_temporal::{
    CascadePolicy, CascadeRule, Endpoint, EntityDraft, EntityId, Error, Graph, MemoryBackend,
    StorageBackend, TxMode,
};
use pretty_assertions::assert_eq;

async fn exists(graph: &Graph<MemoryBackend>, id: EntityId) -> bool {
    let db = graph.backend();
    let tx = db.begin_tx(TxMode::ReadOnly).await.unwrap();
    db.get_entity(&tx, id).await.unwrap().is_some()
}

// ============================================================================
// 1. Actor aliases
// ============================================================================

#[tokio::test]
async fn test_person_aliases_one_hop() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let person = db.create_entity(&mut tx, EntityDraft::new(class::PERSON, "Ludwig")).await.unwrap();
    let alias = db.create_entity(&mut tx, EntityDraft::new(class::ACTOR_APPELLATION, "Louis")).await.unwrap();
    let alias_of_alias = db.create_entity(&mut tx, EntityDraft::new(class::ACTOR_APPELLATION, "Lou")).await.unwrap();
    let friend = db.create_entity(&mut tx, EntityDraft::new(class::PERSON, "Friend")).await.unwrap();
    db.create_link(&mut tx, person.into(), property::IS_IDENTIFIED_BY, alias).await.unwrap();
    db.create_link(&mut tx, alias.into(), property::IS_IDENTIFIED_BY, alias_of_alias).await.unwrap();
    db.create_link(&mut tx, friend.into(), property::HAD_PARTICIPANT, person).await.unwrap();
    db.commit_tx(tx).await.unwrap();

    assert!(graph.delete_entity(person).await.unwrap());

    assert!(!exists(&graph, person).await);
    assert!(!exists(&graph, alias).await);
    assert!(exists(&graph, alias_of_alias).await);
    assert!(exists(&graph, friend).await);
    // Incident links went with the deleted entities.
    assert_eq!(graph.snapshot().links.len(), 0);
}

// ============================================================================
// 2. Finds: location and aliases
// ============================================================================

#[tokio::test]
async fn test_find_with_location() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let find = db.create_entity(&mut tx, EntityDraft::new(class::MAN_MADE_OBJECT, "Amphora")).await.unwrap();
    let location = db.create_entity(&mut tx, EntityDraft::new(class::PLACE, "Trench 4")).await.unwrap();
    let alias = db.create_entity(&mut tx, EntityDraft::new(class::APPELLATION, "Inv. 12")).await.unwrap();
    db.create_link(&mut tx, find.into(), property::HAS_CURRENT_LOCATION, location).await.unwrap();
    db.create_link(&mut tx, find.into(), property::HAS_IDENTIFIER, alias).await.unwrap();
    db.commit_tx(tx).await.unwrap();

    graph.delete_entity(find).await.unwrap();
    assert!(graph.snapshot().entities.is_empty());
}

#[tokio::test]
async fn test_find_without_location() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let find = db.create_entity(&mut tx, EntityDraft::new(class::PHYSICAL_THING, "Shard")).await.unwrap();
    let other = db.create_entity(&mut tx, EntityDraft::new(class::PLACE, "Museum")).await.unwrap();
    db.commit_tx(tx).await.unwrap();

    assert!(graph.delete_entity(find).await.unwrap());
    assert!(exists(&graph, other).await);
    assert_eq!(graph.snapshot().entities.len(), 1);
}

// ============================================================================
// 3. Documents and generic entities
// ============================================================================

#[tokio::test]
async fn test_document_translations() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let document = db.create_entity(&mut tx, EntityDraft::new(class::LINGUISTIC_OBJECT, "Report")).await.unwrap();
    let mut translations = Vec::new();
    for lang in ["de", "fr"] {
        let t = db.create_entity(&mut tx, EntityDraft::new(class::LINGUISTIC_OBJECT, lang)).await.unwrap();
        db.create_link(&mut tx, document.into(), property::HAS_TRANSLATION, t).await.unwrap();
        translations.push(t);
    }
    db.commit_tx(tx).await.unwrap();

    graph.delete_entity(document).await.unwrap();
    for t in translations {
        assert!(!exists(&graph, t).await);
    }
}

#[tokio::test]
async fn test_derived_event_delete_does_not_cascade() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let event = db.create_entity(&mut tx, EntityDraft::new(class::EVENT, "Appearance of A")).await.unwrap();
    let place = db.create_entity(&mut tx, EntityDraft::new(class::PLACE, "P")).await.unwrap();
    let actor = db.create_entity(&mut tx, EntityDraft::new(class::PERSON, "A")).await.unwrap();
    db.create_link(&mut tx, event.into(), property::TOOK_PLACE_AT, place).await.unwrap();
    db.create_link(&mut tx, event.into(), property::HAD_PARTICIPANT, actor).await.unwrap();
    db.commit_tx(tx).await.unwrap();

    graph.delete_entity(event).await.unwrap();
    assert!(exists(&graph, place).await);
    assert!(exists(&graph, actor).await);
}

#[tokio::test]
async fn test_deleting_missing_entity_returns_false() {
    let graph = Graph::open_memory().await.unwrap();
    assert!(!graph.delete_entity(EntityId(42)).await.unwrap());
}

// ============================================================================
// 4. Violations abort the whole delete
// ============================================================================

#[tokio::test]
async fn test_shared_location_aborts_delete() {
    let graph = Graph::open_memory().await.unwrap();
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let first = db.create_entity(&mut tx, EntityDraft::new(class::PHYSICAL_THING, "Coin")).await.unwrap();
    let second = db.create_entity(&mut tx, EntityDraft::new(class::PHYSICAL_THING, "Ring")).await.unwrap();
    let alias = db.create_entity(&mut tx, EntityDraft::new(class::APPELLATION, "C-1")).await.unwrap();
    let location = db.create_entity(&mut tx, EntityDraft::new(class::PLACE, "Hoard")).await.unwrap();
    db.create_link(&mut tx, first.into(), property::HAS_IDENTIFIER, alias).await.unwrap();
    db.create_link(&mut tx, first.into(), property::HAS_CURRENT_LOCATION, location).await.unwrap();
    db.create_link(&mut tx, second.into(), property::HAS_CURRENT_LOCATION, location).await.unwrap();
    db.commit_tx(tx).await.unwrap();
    let before = graph.snapshot();

    let err = graph.delete_entity(first).await.unwrap_err();
    assert!(matches!(
        err,
        Error::CascadeConstraintViolation { entity, dependent, referrer }
            if entity == first && dependent == location && referrer == Endpoint::Entity(second)
    ));
    assert_eq!(graph.snapshot(), before);
}

#[tokio::test]
async fn test_custom_policy() {
    let policy = CascadePolicy {
        rules: vec![CascadeRule::new(&[class::EVENT], property::TOOK_PLACE_AT).single()],
    };
    let graph = Graph::with_policy(MemoryBackend::new(), policy);
    let db = graph.backend();
    let mut tx = db.begin_tx(TxMode::ReadWrite).await.unwrap();
    let event = db.create_entity(&mut tx, EntityDraft::new(class::EVENT, "Fair")).await.unwrap();
    let place = db.create_entity(&mut tx, EntityDraft::new(class::PLACE, "Market")).await.unwrap();
    let person = db.create_entity(&mut tx, EntityDraft::new(class::PERSON, "Kept")).await.unwrap();
    let alias = db.create_entity(&mut tx, EntityDraft::new(class::ACTOR_APPELLATION, "Also kept")).await.unwrap();
    db.create_link(&mut tx, event.into(), property::TOOK_PLACE_AT, place).await.unwrap();
    db.create_link(&mut tx, person.into(), property::IS_IDENTIFIED_BY, alias).await.unwrap();
    db.commit_tx(tx).await.unwrap();

    graph.delete_entity(event).await.unwrap();
    graph.delete_entity(person).await.unwrap();
    assert!(!exists(&graph, place).await);
    assert!(exists(&graph, alias).await);
}
