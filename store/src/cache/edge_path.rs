//! `CreateEdge`, `FindEdgeById`, `IncomingEdges`/`OutgoingEdges`, `DeleteEdge`.

use assetgraph_core::{
    CacheResult, Edge, Entity, EntityId, Timestamp, CACHE_CREATE_EDGE, CACHE_CREATE_ENTITY,
    CACHE_INCOMING_EDGES, CACHE_OUTGOING_EDGES,
};

use crate::cache::bookkeeping;
use crate::cache::cache_repo::CacheRepo;
use crate::cache::freshness::is_refill_due_for_since;
use crate::repository::Repository;

/// Resolve `entity`'s authoritative twin via its `cache_create_entity`
/// binding — never by content, per the causal-binding invariant.
pub(crate) async fn resolve_authoritative_entity<C, D>(repo: &CacheRepo<C, D>, entity: &Entity) -> CacheResult<Option<Entity>>
where
    C: Repository,
    D: Repository,
{
    let tag = bookkeeping::read_entity_tag(&repo.cache, entity, CACHE_CREATE_ENTITY).await?;
    match tag {
        None => Ok(None),
        Some(cp) => match repo.db.find_entity_by_id(&cp.ref_id).await {
            Ok(e) => Ok(Some(e)),
            Err(e) if e.is_not_found() => Ok(None),
            Err(e) => Err(e),
        },
    }
}

/// Find `authoritative`'s cache-store twin by content, projecting a new one
/// (with preserved timestamps, bound) if none yet exists.
pub(crate) async fn ensure_cache_twin<C, D>(repo: &CacheRepo<C, D>, authoritative: &Entity) -> CacheResult<Entity>
where
    C: Repository,
    D: Repository,
{
    match repo
        .cache
        .find_entities_by_content(&authoritative.asset, assetgraph_core::since_epoch())
        .await
    {
        Ok(hits) if !hits.is_empty() => Ok(hits[0].clone()),
        _ => {
            let cache_entity = repo
                .cache
                .create_entity(Entity {
                    id: EntityId::new(String::new()),
                    created_at: authoritative.created_at,
                    last_seen: authoritative.last_seen,
                    asset: authoritative.asset.clone(),
                })
                .await?;
            bookkeeping::bind_entity(
                &repo.cache,
                &cache_entity,
                CACHE_CREATE_ENTITY,
                &authoritative.id,
                assetgraph_core::now(),
            )
            .await?;
            Ok(cache_entity)
        }
    }
}

pub(crate) async fn create_edge<C, D>(repo: &CacheRepo<C, D>, edge: Edge) -> CacheResult<Edge>
where
    C: Repository,
    D: Repository,
{
    let cache_edge = repo.cache.create_edge(edge).await?;
    let from = repo.cache.find_entity_by_id(&cache_edge.from.id).await?;
    let to = repo.cache.find_entity_by_id(&cache_edge.to.id).await?;

    let existing = bookkeeping::read_edge_tag(&repo.cache, &cache_edge, CACHE_CREATE_EDGE).await?;
    if existing.is_none() {
        let from_hits = repo
            .db
            .find_entities_by_content(&from.asset, assetgraph_core::since_epoch())
            .await;
        let to_hits = repo
            .db
            .find_entities_by_content(&to.asset, assetgraph_core::since_epoch())
            .await;
        if let (Ok(from_hits), Ok(to_hits)) = (from_hits, to_hits) {
            if from_hits.len() == 1 && to_hits.len() == 1 {
                let authoritative = repo
                    .db
                    .create_edge(Edge {
                        id: EntityId::new(String::new()),
                        created_at: cache_edge.created_at,
                        last_seen: cache_edge.last_seen,
                        relation: cache_edge.relation.clone(),
                        from: from_hits[0].clone(),
                        to: to_hits[0].clone(),
                    })
                    .await?;
                bookkeeping::bind_edge(
                    &repo.cache,
                    &cache_edge,
                    CACHE_CREATE_EDGE,
                    &authoritative.id,
                    assetgraph_core::now(),
                )
                .await?;
            }
            // endpoints not yet uniquely bound on the authoritative side:
            // the edge remains cache-only until a later call binds them.
        }
    }

    Ok(cache_edge)
}

pub(crate) async fn find_edge_by_id<C, D>(repo: &CacheRepo<C, D>, id: &EntityId) -> CacheResult<Edge>
where
    C: Repository,
    D: Repository,
{
    repo.cache.find_edge_by_id(id).await
}

enum Direction {
    Incoming,
    Outgoing,
}

async fn traverse<C, D>(
    repo: &CacheRepo<C, D>,
    entity: &Entity,
    since: Timestamp,
    labels: &[&str],
    direction: Direction,
) -> CacheResult<Vec<Edge>>
where
    C: Repository,
    D: Repository,
{
    if !repo.is_whole_history(since) {
        return match direction {
            Direction::Incoming => repo.cache.incoming_edges(entity, since, labels).await,
            Direction::Outgoing => repo.cache.outgoing_edges(entity, since, labels).await,
        };
    }

    let tag_name = match direction {
        Direction::Incoming => CACHE_INCOMING_EDGES,
        Direction::Outgoing => CACHE_OUTGOING_EDGES,
    };
    let recorded = bookkeeping::read_entity_tag(&repo.cache, entity, tag_name)
        .await?
        .map(|cp| cp.timestamp);

    if is_refill_due_for_since(recorded, since) {
        fill(repo, entity, since, tag_name, &direction).await?;
    }

    match direction {
        Direction::Incoming => repo.cache.incoming_edges(entity, since, labels).await,
        Direction::Outgoing => repo.cache.outgoing_edges(entity, since, labels).await,
    }
}

async fn fill<C, D>(
    repo: &CacheRepo<C, D>,
    entity: &Entity,
    since: Timestamp,
    tag_name: &'static str,
    direction: &Direction,
) -> CacheResult<()>
where
    C: Repository,
    D: Repository,
{
    let authoritative_root = match resolve_authoritative_entity(repo, entity).await? {
        Some(e) => e,
        None => return Ok(()),
    };

    // A backend error here degrades to the cache's existing (possibly
    // stale) edge list: skip the fill and leave the bookkeeping tag
    // unwritten so the next call still sees a refill as due.
    let authoritative_edges = match direction {
        Direction::Incoming => repo.db.incoming_edges(&authoritative_root, since, &[]).await,
        Direction::Outgoing => repo.db.outgoing_edges(&authoritative_root, since, &[]).await,
    };
    let authoritative_edges = match authoritative_edges {
        Ok(edges) => edges,
        Err(_) => return Ok(()),
    };

    for authoritative_edge in authoritative_edges {
        let (cache_from, cache_to) = match direction {
            Direction::Incoming => (
                ensure_cache_twin(repo, &authoritative_edge.from).await?,
                entity.clone(),
            ),
            Direction::Outgoing => (
                entity.clone(),
                ensure_cache_twin(repo, &authoritative_edge.to).await?,
            ),
        };

        let cache_edge = repo
            .cache
            .create_edge(Edge {
                id: EntityId::new(String::new()),
                created_at: authoritative_edge.created_at,
                last_seen: authoritative_edge.last_seen,
                relation: authoritative_edge.relation.clone(),
                from: cache_from,
                to: cache_to,
            })
            .await?;
        bookkeeping::bind_edge(
            &repo.cache,
            &cache_edge,
            CACHE_CREATE_EDGE,
            &authoritative_edge.id,
            assetgraph_core::now(),
        )
        .await?;
    }

    bookkeeping::bind_entity(&repo.cache, entity, tag_name, &authoritative_root.id, since).await
}

pub(crate) async fn incoming_edges<C, D>(
    repo: &CacheRepo<C, D>,
    entity: &Entity,
    since: Timestamp,
    labels: &[&str],
) -> CacheResult<Vec<Edge>>
where
    C: Repository,
    D: Repository,
{
    traverse(repo, entity, since, labels, Direction::Incoming).await
}

pub(crate) async fn outgoing_edges<C, D>(
    repo: &CacheRepo<C, D>,
    entity: &Entity,
    since: Timestamp,
    labels: &[&str],
) -> CacheResult<Vec<Edge>>
where
    C: Repository,
    D: Repository,
{
    traverse(repo, entity, since, labels, Direction::Outgoing).await
}

/// Fails silently (returns `Ok(())`) if the edge is already absent from the
/// cache. The authoritative side is deleted best-effort by matching
/// endpoints-by-content plus relation deep-equality.
pub(crate) async fn delete_edge<C, D>(repo: &CacheRepo<C, D>, id: &EntityId) -> CacheResult<()>
where
    C: Repository,
    D: Repository,
{
    let edge = match repo.cache.find_edge_by_id(id).await {
        Ok(e) => e,
        Err(e) if e.is_not_found() => return Ok(()),
        Err(e) => return Err(e),
    };
    repo.cache.delete_edge(id).await?;

    let from_db = repo
        .db
        .find_entities_by_content(&edge.from.asset, assetgraph_core::since_epoch())
        .await;
    let to_db = repo
        .db
        .find_entities_by_content(&edge.to.asset, assetgraph_core::since_epoch())
        .await;
    if let (Ok(from_hits), Ok(to_hits)) = (from_db, to_db) {
        if from_hits.len() == 1 && to_hits.len() == 1 {
            let label = edge.relation.label();
            if let Ok(candidates) = repo
                .db
                .outgoing_edges(&from_hits[0], assetgraph_core::since_epoch(), &[label])
                .await
            {
                if let Some(found) = candidates
                    .into_iter()
                    .find(|c| c.to.id == to_hits[0].id && c.relation.deep_eq(&edge.relation))
                {
                    let _ = repo.db.delete_edge(&found.id).await;
                }
            }
        }
    }
    Ok(())
}
