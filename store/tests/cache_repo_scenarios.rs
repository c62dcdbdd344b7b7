//! End-to-end scenarios exercising `CacheRepo` against a pair of
//! `InMemoryRepository` delegates: write-through binding, session-scoped
//! read-fill, tag read-fill, relation-sensitive delete, the
//! `FindEntitiesByType` session boundary, and cross-domain edge creation.

use assetgraph_core::{Asset, AssetType, Entity, EntityId, Relation};
use assetgraph_store::{CacheRepo, InMemoryRepository, Repository};
use chrono::Duration as ChronoDuration;
use std::time::Duration;

fn repo(freq_secs: u64) -> CacheRepo<InMemoryRepository, InMemoryRepository> {
    CacheRepo::new(
        InMemoryRepository::new("cache"),
        InMemoryRepository::new("db"),
        Duration::from_secs(freq_secs),
    )
}

#[tokio::test]
async fn write_through_propagation() {
    let repo = repo(2);

    let cache_entity = repo.create_asset(Asset::fqdn("owasp.org")).await.unwrap();

    let authoritative_hits = repo
        .db
        .find_entities_by_content(&Asset::fqdn("owasp.org"), assetgraph_core::since_epoch())
        .await
        .unwrap();
    assert_eq!(authoritative_hits.len(), 1);

    let binding = repo
        .cache
        .get_entity_tags(&cache_entity, assetgraph_core::since_epoch(), &["cache_create_entity"])
        .await
        .unwrap();
    assert_eq!(binding.len(), 1);
    let cp = binding[0].property.as_cache().unwrap();
    assert_eq!(cp.ref_id, authoritative_hits[0].id);
}

#[tokio::test]
async fn session_scoped_read_miss() {
    let db = InMemoryRepository::new("db");
    let eight_hours_ago = assetgraph_core::now() - ChronoDuration::hours(8);
    db.create_entity(Entity::new(
        EntityId::new(String::new()),
        Asset::fqdn("utica.edu"),
        eight_hours_ago,
    ))
    .await
    .unwrap();

    let repo = CacheRepo::new(InMemoryRepository::new("cache"), db, Duration::from_secs(60));
    let start = repo.start_time();

    let miss = repo.find_entities_by_content(&Asset::fqdn("utica.edu"), start).await;
    assert!(miss.unwrap_err().is_not_found());

    let twenty_seconds_before_start = start - ChronoDuration::seconds(20);
    let hit = repo
        .find_entities_by_content(&Asset::fqdn("utica.edu"), twenty_seconds_before_start)
        .await
        .unwrap();
    assert_eq!(hit.len(), 1);

    let now_cached = repo
        .cache
        .find_entities_by_content(&Asset::fqdn("utica.edu"), assetgraph_core::since_epoch())
        .await
        .unwrap();
    assert_eq!(now_cached.len(), 1);
}

#[tokio::test]
async fn tag_read_fill() {
    let repo = repo(60);
    let start = repo.start_time();

    let entity = repo.create_asset(Asset::fqdn("example.com")).await.unwrap();
    let authoritative = repo
        .db
        .find_entities_by_content(&Asset::fqdn("example.com"), assetgraph_core::since_epoch())
        .await
        .unwrap()[0]
        .clone();

    let eight_hours_ago = assetgraph_core::now() - ChronoDuration::hours(8);
    for _ in 0..3 {
        repo.db
            .create_entity_tag(
                &authoritative,
                assetgraph_core::EntityTag {
                    id: EntityId::new(String::new()),
                    created_at: eight_hours_ago,
                    last_seen: eight_hours_ago,
                    entity_id: authoritative.id.clone(),
                    property: assetgraph_core::Property::simple("test", "old"),
                },
            )
            .await
            .unwrap();
    }
    // Distinct values: `create_entity_tag` dedups same name+value within
    // `freq`, so three identical calls would collapse to one tag.
    for i in 0..3 {
        repo.create_entity_property(&entity, assetgraph_core::Property::simple("test", format!("new-{i}")))
            .await
            .unwrap();
    }

    let session_only = repo.get_entity_tags(&entity, start, &["test"]).await.unwrap();
    assert_eq!(session_only.len(), 3);

    let two_seconds_before_start = start - ChronoDuration::seconds(2);
    let whole_history = repo
        .get_entity_tags(&entity, two_seconds_before_start, &["test"])
        .await
        .unwrap();
    assert_eq!(whole_history.len(), 6);

    let refill_tag = repo
        .cache
        .get_entity_tags(&entity, assetgraph_core::since_epoch(), &["cache_get_entity_tags"])
        .await
        .unwrap();
    assert_eq!(refill_tag.len(), 1);
    let cp = refill_tag[0].property.as_cache().unwrap();
    assert!(cp.timestamp >= two_seconds_before_start);
    assert!(cp.timestamp <= start);
}

#[tokio::test]
async fn relation_sensitive_delete() {
    let repo = repo(60);

    let a = repo.create_asset(Asset::fqdn("a.example.com")).await.unwrap();
    let b = repo.create_asset(Asset::fqdn("b.example.com")).await.unwrap();
    let relation = Relation::basic_dns("dns_record", 5, 1, 3600);
    let edge = repo
        .create_edge(assetgraph_core::Edge::new(
            EntityId::new(String::new()),
            relation.clone(),
            a.clone(),
            b.clone(),
            assetgraph_core::now(),
        ))
        .await
        .unwrap();

    let a_db = repo
        .db
        .find_entities_by_content(&a.asset, assetgraph_core::since_epoch())
        .await
        .unwrap()[0]
        .clone();
    let before = repo
        .db
        .outgoing_edges(&a_db, assetgraph_core::since_epoch(), &["dns_record"])
        .await
        .unwrap();
    assert!(before.iter().any(|e| e.relation.deep_eq(&relation)));

    repo.delete_edge(&edge.id).await.unwrap();

    let after = repo
        .db
        .outgoing_edges(&a_db, assetgraph_core::since_epoch(), &["dns_record"])
        .await
        .unwrap();
    assert!(!after.iter().any(|e| e.relation.deep_eq(&relation)));
}

#[tokio::test]
async fn find_entities_by_type_session_boundary() {
    let db = InMemoryRepository::new("db");
    let twenty_four_hours_ago = assetgraph_core::now() - ChronoDuration::hours(24);
    let eight_hours_ago = assetgraph_core::now() - ChronoDuration::hours(8);
    for i in 0..3 {
        db.create_entity(Entity::new(
            EntityId::new(String::new()),
            Asset::fqdn(format!("old-{i}.example.com")),
            twenty_four_hours_ago,
        ))
        .await
        .unwrap();
    }
    for i in 0..3 {
        db.create_entity(Entity::new(
            EntityId::new(String::new()),
            Asset::fqdn(format!("stale-{i}.example.com")),
            eight_hours_ago,
        ))
        .await
        .unwrap();
    }

    let repo = CacheRepo::new(InMemoryRepository::new("cache"), db, Duration::from_secs(60));
    let start = repo.start_time();

    for i in 0..3 {
        repo.create_asset(Asset::fqdn(format!("new-{i}.example.com")))
            .await
            .unwrap();
    }

    let session_scoped = repo.find_entities_by_type(AssetType::Fqdn, start).await.unwrap();
    assert_eq!(session_scoped.len(), 3);

    let eight_hours_before_start = start - ChronoDuration::hours(8) - ChronoDuration::seconds(1);
    let six = repo
        .find_entities_by_type(AssetType::Fqdn, eight_hours_before_start)
        .await
        .unwrap();
    assert_eq!(six.len(), 6);

    let twenty_four_hours_before_start = start - ChronoDuration::hours(24) - ChronoDuration::seconds(1);
    let nine = repo
        .find_entities_by_type(AssetType::Fqdn, twenty_four_hours_before_start)
        .await
        .unwrap();
    assert_eq!(nine.len(), 9);
}

#[tokio::test]
async fn create_edge_across_id_domains() {
    let repo = repo(60);

    let e1 = repo.create_asset(Asset::fqdn("e1.example.com")).await.unwrap();
    let e2 = repo.create_asset(Asset::fqdn("e2.example.com")).await.unwrap();

    let relation = Relation::simple("node");
    repo.create_edge(assetgraph_core::Edge::new(
        EntityId::new(String::new()),
        relation.clone(),
        e2.clone(),
        e1.clone(),
        assetgraph_core::now(),
    ))
    .await
    .unwrap();

    let e2_db = repo
        .db
        .find_entities_by_content(&e2.asset, assetgraph_core::since_epoch())
        .await
        .unwrap()[0]
        .clone();
    let e1_db = repo
        .db
        .find_entities_by_content(&e1.asset, assetgraph_core::since_epoch())
        .await
        .unwrap()[0]
        .clone();

    let outgoing = repo
        .db
        .outgoing_edges(&e2_db, assetgraph_core::since_epoch(), &["node"])
        .await
        .unwrap();
    assert!(outgoing
        .iter()
        .any(|e| e.to.id == e1_db.id && e.relation.deep_eq(&relation)));
}
