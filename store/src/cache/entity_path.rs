//! `CreateEntity`/`CreateAsset`, `FindEntityById`, `FindEntitiesByContent`,
//! `FindEntitiesByType`, `DeleteEntity`.

use assetgraph_core::{
    Asset, AssetType, CacheResult, Entity, EntityId, NotFoundError, Timestamp,
    CACHE_CREATE_ENTITY, CACHE_FIND_ENTITIES_BY_TYPE,
};

use crate::cache::bookkeeping;
use crate::cache::cache_repo::CacheRepo;
use crate::cache::edge_path::ensure_cache_twin;
use crate::cache::freshness::is_refill_due_for_since;
use crate::repository::Repository;

/// Insert `entity` into the cache store, then establish or refresh its
/// authoritative binding if the existing one is absent or due for
/// refresh. The authoritative entity is never returned — callers live
/// entirely in the cache's id space.
pub(crate) async fn create_entity<C, D>(repo: &CacheRepo<C, D>, entity: Entity) -> CacheResult<Entity>
where
    C: Repository,
    D: Repository,
{
    let cache_entity = repo.cache.create_entity(entity).await?;
    bind_to_authority_if_due(repo, &cache_entity).await?;
    Ok(cache_entity)
}

async fn bind_to_authority_if_due<C, D>(repo: &CacheRepo<C, D>, cache_entity: &Entity) -> CacheResult<()>
where
    C: Repository,
    D: Repository,
{
    let check = bookkeeping::check_entity(
        &repo.cache,
        cache_entity,
        CACHE_CREATE_ENTITY,
        repo.freq,
        assetgraph_core::now(),
    )
    .await?;
    if bookkeeping::needs_refill(&check) {
        let authoritative = repo
            .db
            .create_entity(Entity {
                id: EntityId::new(String::new()),
                created_at: cache_entity.created_at,
                last_seen: cache_entity.last_seen,
                asset: cache_entity.asset.clone(),
            })
            .await?;
        bookkeeping::bind_entity(
            &repo.cache,
            cache_entity,
            CACHE_CREATE_ENTITY,
            &authoritative.id,
            assetgraph_core::now(),
        )
        .await?;
    }
    Ok(())
}

/// Cache-store only. No authoritative fallback.
pub(crate) async fn find_entity_by_id<C, D>(repo: &CacheRepo<C, D>, id: &EntityId) -> CacheResult<Entity>
where
    C: Repository,
    D: Repository,
{
    repo.cache.find_entity_by_id(id).await
}

pub(crate) async fn find_entities_by_content<C, D>(
    repo: &CacheRepo<C, D>,
    asset: &Asset,
    since: Timestamp,
) -> CacheResult<Vec<Entity>>
where
    C: Repository,
    D: Repository,
{
    match repo.cache.find_entities_by_content(asset, since).await {
        Ok(hits) => return Ok(hits),
        Err(e) if e.is_not_found() => {}
        Err(e) => return Err(e),
    }

    if !repo.is_whole_history(since) {
        return Err(NotFoundError::ByContent.into());
    }

    // A genuine authoritative-store error degrades to the cache's own
    // (already-empty) view rather than aborting the call: the cache came
    // back not-found above, so there is nothing better to offer than that
    // same not-found.
    if let Ok(authoritative_hits) = repo.db.find_entities_by_content(asset, since).await {
        let mut projected = Vec::with_capacity(authoritative_hits.len());
        for hit in authoritative_hits {
            let cache_entity = repo
                .cache
                .create_entity(Entity {
                    id: EntityId::new(String::new()),
                    created_at: hit.created_at,
                    last_seen: hit.last_seen,
                    asset: hit.asset.clone(),
                })
                .await?;
            bookkeeping::bind_entity(
                &repo.cache,
                &cache_entity,
                CACHE_CREATE_ENTITY,
                &hit.id,
                assetgraph_core::now(),
            )
            .await?;
            projected.push(cache_entity);
        }
        if !projected.is_empty() {
            return Ok(projected);
        }
    }
    Err(NotFoundError::ByContent.into())
}

pub(crate) async fn find_entities_by_type<C, D>(
    repo: &CacheRepo<C, D>,
    asset_type: AssetType,
    since: Timestamp,
) -> CacheResult<Vec<Entity>>
where
    C: Repository,
    D: Repository,
{
    let cache_hits = repo.cache.find_entities_by_type(asset_type, since).await?;

    if !cache_hits.is_empty() {
        let session_scoped = !repo.is_whole_history(since);
        let tag_satisfies = if session_scoped {
            true
        } else {
            let recorded = bookkeeping::read_entity_tag(
                &repo.cache,
                &cache_hits[0],
                CACHE_FIND_ENTITIES_BY_TYPE,
            )
            .await?
            .map(|cp| cp.timestamp);
            !is_refill_due_for_since(recorded, since)
        };
        if tag_satisfies {
            return Ok(cache_hits);
        }
    }

    // A backend error on the refill degrades to the cache's own (possibly
    // stale, possibly empty) view rather than discarding it.
    match repo.db.find_entities_by_type(asset_type, since).await {
        Ok(authoritative_hits) => {
            for hit in authoritative_hits {
                // Reuse any existing cache twin by content instead of minting a
                // second cache row for an entity `find_entities_by_type` already
                // holds (e.g. one created earlier this session).
                let cache_entity = ensure_cache_twin(repo, &hit).await?;
                // Tag the projected cache entity, never the authoritative one --
                // the latter is never guaranteed to have a cache-store presence.
                bookkeeping::bind_entity(
                    &repo.cache,
                    &cache_entity,
                    CACHE_FIND_ENTITIES_BY_TYPE,
                    &hit.id,
                    since,
                )
                .await?;
            }
            repo.cache.find_entities_by_type(asset_type, since).await
        }
        Err(_) => Ok(cache_hits),
    }
}

/// Load by id from cache (fail if absent); delete from cache; delete the
/// authoritative twin by content if exactly one match exists. Errors from
/// the authoritative delete are swallowed -- cache truth wins on deletion.
pub(crate) async fn delete_entity<C, D>(repo: &CacheRepo<C, D>, id: &EntityId) -> CacheResult<()>
where
    C: Repository,
    D: Repository,
{
    let entity = repo.cache.find_entity_by_id(id).await?;
    repo.cache.delete_entity(id).await?;

    if let Ok(matches) = repo
        .db
        .find_entities_by_content(&entity.asset, assetgraph_core::since_epoch())
        .await
    {
        if matches.len() == 1 {
            let _ = repo.db.delete_entity(&matches[0].id).await;
        }
    }
    Ok(())
}
