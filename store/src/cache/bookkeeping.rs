//! The four bookkeeping primitives every other cache path is built on.
//! These operate on the cache store only — the authoritative store never
//! sees a bookkeeping tag.

use assetgraph_core::{
    CacheProperty, CacheResult, Edge, Entity, EntityId, InvalidArgumentError, Property, Timestamp,
};
use std::time::Duration;

use crate::cache::freshness::is_due_for_refresh;
use crate::repository::Repository;

/// Drop any existing `name`-tags on `entity`, then attach a fresh
/// `CacheProperty(name, ref_id, ts)`.
pub async fn bind_entity<C: Repository>(
    cache: &C,
    entity: &Entity,
    name: &'static str,
    ref_id: &EntityId,
    ts: Timestamp,
) -> CacheResult<()> {
    if ref_id.is_empty() {
        return Err(InvalidArgumentError::Empty { what: "ref_id" }.into());
    }
    let existing = cache
        .get_entity_tags(entity, assetgraph_core::since_epoch(), &[name])
        .await?;
    for tag in existing {
        if tag.property.is_cache_tag_named(name) {
            cache.delete_entity_tag(&tag.id).await?;
        }
    }
    cache
        .create_entity_property(entity, Property::cache(name, ref_id.clone(), ts))
        .await?;
    Ok(())
}

/// Edge-side counterpart of [`bind_entity`].
pub async fn bind_edge<C: Repository>(
    cache: &C,
    edge: &Edge,
    name: &'static str,
    ref_id: &EntityId,
    ts: Timestamp,
) -> CacheResult<()> {
    if ref_id.is_empty() {
        return Err(InvalidArgumentError::Empty { what: "ref_id" }.into());
    }
    let existing = cache
        .get_edge_tags(edge, assetgraph_core::since_epoch(), &[name])
        .await?;
    for tag in existing {
        if tag.property.is_cache_tag_named(name) {
            cache.delete_edge_tag(&tag.id).await?;
        }
    }
    cache
        .create_edge_property(edge, Property::cache(name, ref_id.clone(), ts))
        .await?;
    Ok(())
}

/// The result of [`check_entity`]/[`check_edge`].
#[derive(Debug, Clone)]
pub struct CheckResult {
    pub tag: Option<CacheProperty>,
    /// Due-for-refresh polarity: `true` means the tag is older than `freq`.
    /// Meaningless (always `false`) when `tag` is `None` — callers must
    /// branch on `tag.is_none() || fresh` to decide whether a refill is
    /// owed, matching the source's "absent or stale" phrasing.
    pub fresh: bool,
}

/// Locate the single `name`-tag on `entity` and classify its age.
pub async fn check_entity<C: Repository>(
    cache: &C,
    entity: &Entity,
    name: &'static str,
    freq: Duration,
    now: Timestamp,
) -> CacheResult<CheckResult> {
    let tags = cache
        .get_entity_tags(entity, assetgraph_core::since_epoch(), &[name])
        .await?;
    let tag = tags.into_iter().find_map(|t| t.property.as_cache().cloned());
    Ok(classify(tag, freq, now))
}

/// Edge-side counterpart of [`check_entity`].
pub async fn check_edge<C: Repository>(
    cache: &C,
    edge: &Edge,
    name: &'static str,
    freq: Duration,
    now: Timestamp,
) -> CacheResult<CheckResult> {
    let tags = cache
        .get_edge_tags(edge, assetgraph_core::since_epoch(), &[name])
        .await?;
    let tag = tags.into_iter().find_map(|t| t.property.as_cache().cloned());
    Ok(classify(tag, freq, now))
}

fn classify(tag: Option<CacheProperty>, freq: Duration, now: Timestamp) -> CheckResult {
    match tag {
        None => CheckResult { tag: None, fresh: false },
        Some(cp) => {
            let fresh = is_due_for_refresh(cp.timestamp, freq, now);
            CheckResult { tag: Some(cp), fresh }
        }
    }
}

/// `true` if a write-through is owed for a tag in this state: absent, or
/// present but due for refresh.
pub fn needs_refill(check: &CheckResult) -> bool {
    check.tag.is_none() || check.fresh
}

/// Read the single `name`-tag on `entity`, if any, with no freshness
/// classification attached.
///
/// The refill-tracking tags (`cache_get_entity_tags`, `cache_incoming_edges`,
/// `cache_outgoing_edges`, `cache_find_entities_by_type`) don't use the
/// `freq`-based "due for refresh" check [`check_entity`]/[`check_edge`]
/// apply to the `cache_create_*` binding tags — their freshness decision
/// instead compares the recorded `since'` directly against the requested
/// `since` (see `crate::cache::freshness::is_refill_due_for_since`), because
/// their `timestamp` field holds a `since` watermark, not a bind time.
pub async fn read_entity_tag<C: Repository>(
    cache: &C,
    entity: &Entity,
    name: &'static str,
) -> CacheResult<Option<CacheProperty>> {
    let tags = cache
        .get_entity_tags(entity, assetgraph_core::since_epoch(), &[name])
        .await?;
    Ok(tags.into_iter().find_map(|t| t.property.as_cache().cloned()))
}

/// Edge-side counterpart of [`read_entity_tag`].
pub async fn read_edge_tag<C: Repository>(
    cache: &C,
    edge: &Edge,
    name: &'static str,
) -> CacheResult<Option<CacheProperty>> {
    let tags = cache
        .get_edge_tags(edge, assetgraph_core::since_epoch(), &[name])
        .await?;
    Ok(tags.into_iter().find_map(|t| t.property.as_cache().cloned()))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::InMemoryRepository;
    use assetgraph_core::Asset;

    #[tokio::test]
    async fn bind_then_check_finds_tag() {
        let cache = InMemoryRepository::new("cache");
        let entity = cache.create_asset(Asset::fqdn("owasp.org")).await.unwrap();
        let ref_id = EntityId::new("db-1");
        bind_entity(&cache, &entity, "cache_create_entity", &ref_id, assetgraph_core::now())
            .await
            .unwrap();

        let checked = check_entity(
            &cache,
            &entity,
            "cache_create_entity",
            Duration::from_secs(60),
            assetgraph_core::now(),
        )
        .await
        .unwrap();
        assert_eq!(checked.tag.unwrap().ref_id, ref_id);
        assert!(!checked.fresh);
    }

    #[tokio::test]
    async fn rebinding_replaces_the_old_tag() {
        let cache = InMemoryRepository::new("cache");
        let entity = cache.create_asset(Asset::fqdn("owasp.org")).await.unwrap();
        bind_entity(
            &cache,
            &entity,
            "cache_create_entity",
            &EntityId::new("db-1"),
            assetgraph_core::now(),
        )
        .await
        .unwrap();
        bind_entity(
            &cache,
            &entity,
            "cache_create_entity",
            &EntityId::new("db-2"),
            assetgraph_core::now(),
        )
        .await
        .unwrap();

        let tags = cache
            .get_entity_tags(&entity, assetgraph_core::since_epoch(), &["cache_create_entity"])
            .await
            .unwrap();
        assert_eq!(tags.len(), 1);
        assert_eq!(tags[0].property.as_cache().unwrap().ref_id, EntityId::new("db-2"));
    }

    #[tokio::test]
    async fn bind_entity_rejects_empty_ref_id() {
        let cache = InMemoryRepository::new("cache");
        let entity = cache.create_asset(Asset::fqdn("owasp.org")).await.unwrap();
        let err = bind_entity(
            &cache,
            &entity,
            "cache_create_entity",
            &EntityId::new(""),
            assetgraph_core::now(),
        )
        .await
        .unwrap_err();
        assert!(matches!(err, assetgraph_core::CacheError::InvalidArgument(_)));
    }

    #[tokio::test]
    async fn missing_tag_is_not_fresh_and_needs_refill() {
        let cache = InMemoryRepository::new("cache");
        let entity = cache.create_asset(Asset::fqdn("owasp.org")).await.unwrap();
        let checked = check_entity(
            &cache,
            &entity,
            "cache_create_entity",
            Duration::from_secs(60),
            assetgraph_core::now(),
        )
        .await
        .unwrap();
        assert!(checked.tag.is_none());
        assert!(!checked.fresh);
        assert!(needs_refill(&checked));
    }
}
