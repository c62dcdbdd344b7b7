//! `CreateEntityTag`/`CreateEntityProperty`, `FindEntityTagById`,
//! `FindEntityTagsByContent`, `GetEntityTags`, `DeleteEntityTag`, and the
//! symmetric edge-tag set. Write-through is addressed to the authoritative
//! host discovered via the `cache_create_*` binding.

use assetgraph_core::{
    CacheResult, Edge, EdgeTag, Entity, EntityId, EntityTag, InvariantBrokenError, Property, Timestamp,
    CACHE_CREATE_EDGE, CACHE_CREATE_ENTITY, CACHE_GET_EDGE_TAGS, CACHE_GET_ENTITY_TAGS,
};

use crate::cache::bookkeeping;
use crate::cache::cache_repo::CacheRepo;
use crate::cache::edge_path::{ensure_cache_twin, resolve_authoritative_entity};
use crate::cache::freshness::{is_fresh_for_dedup, is_refill_due_for_since};
use crate::repository::Repository;

// ----------------------------------------------------------------------
// Entity tags
// ----------------------------------------------------------------------

pub(crate) async fn create_entity_tag<C, D>(
    repo: &CacheRepo<C, D>,
    entity: &Entity,
    tag: EntityTag,
) -> CacheResult<EntityTag>
where
    C: Repository,
    D: Repository,
{
    if let Some(existing) = find_fresh_duplicate_entity_tag(repo, entity, &tag.property).await? {
        return Ok(existing);
    }

    let cache_tag = repo.cache.create_entity_tag(entity, tag).await?;

    let binding = bookkeeping::read_entity_tag(&repo.cache, entity, CACHE_CREATE_ENTITY).await?;
    let binding = binding.ok_or_else(|| InvariantBrokenError::MissingBinding {
        tag_name: CACHE_CREATE_ENTITY,
        host_id: entity.id.clone(),
    })?;
    let authoritative_host = repo.db.find_entity_by_id(&binding.ref_id).await?;
    repo.db
        .create_entity_property(&authoritative_host, cache_tag.property.clone())
        .await?;

    Ok(cache_tag)
}

async fn find_fresh_duplicate_entity_tag<C, D>(
    repo: &CacheRepo<C, D>,
    entity: &Entity,
    property: &Property,
) -> CacheResult<Option<EntityTag>>
where
    C: Repository,
    D: Repository,
{
    let existing = repo
        .cache
        .get_entity_tags(entity, assetgraph_core::since_epoch(), &[property.name()])
        .await?;
    for tag in existing {
        if tag.property == *property && is_fresh_for_dedup(tag.last_seen, repo.freq, assetgraph_core::now()) {
            return Ok(Some(tag));
        }
    }
    Ok(None)
}

pub(crate) async fn find_entity_tag_by_id<C, D>(repo: &CacheRepo<C, D>, id: &EntityId) -> CacheResult<EntityTag>
where
    C: Repository,
    D: Repository,
{
    repo.cache.find_entity_tag_by_id(id).await
}

pub(crate) async fn find_entity_tags_by_content<C, D>(
    repo: &CacheRepo<C, D>,
    property: &Property,
    since: Timestamp,
) -> CacheResult<Vec<EntityTag>>
where
    C: Repository,
    D: Repository,
{
    if repo.is_whole_history(since) {
        if let Ok(authoritative_hits) = repo.db.find_entity_tags_by_content(property, since).await {
            for hit in authoritative_hits {
                let authoritative_host = repo.db.find_entity_by_id(&hit.entity_id).await?;
                let cache_host = ensure_cache_twin(repo, &authoritative_host).await?;
                project_entity_tag_if_absent(repo, &cache_host, &hit).await?;
            }
        }
    }
    repo.cache.find_entity_tags_by_content(property, since).await
}

async fn project_entity_tag_if_absent<C, D>(
    repo: &CacheRepo<C, D>,
    cache_host: &Entity,
    authoritative_tag: &EntityTag,
) -> CacheResult<()>
where
    C: Repository,
    D: Repository,
{
    let existing = repo
        .cache
        .get_entity_tags(
            cache_host,
            assetgraph_core::since_epoch(),
            &[authoritative_tag.property.name()],
        )
        .await?;
    if existing.iter().any(|t| t.property == authoritative_tag.property) {
        return Ok(());
    }
    repo.cache
        .create_entity_tag(
            cache_host,
            EntityTag {
                id: EntityId::new(String::new()),
                created_at: authoritative_tag.created_at,
                last_seen: authoritative_tag.last_seen,
                entity_id: cache_host.id.clone(),
                property: authoritative_tag.property.clone(),
            },
        )
        .await?;
    Ok(())
}

pub(crate) async fn get_entity_tags<C, D>(
    repo: &CacheRepo<C, D>,
    entity: &Entity,
    since: Timestamp,
    names: &[&str],
) -> CacheResult<Vec<EntityTag>>
where
    C: Repository,
    D: Repository,
{
    if repo.is_whole_history(since) {
        let recorded = bookkeeping::read_entity_tag(&repo.cache, entity, CACHE_GET_ENTITY_TAGS)
            .await?
            .map(|cp| cp.timestamp);
        if is_refill_due_for_since(recorded, since) {
            if let Some(authoritative_host) = resolve_authoritative_entity(repo, entity).await? {
                if let Ok(authoritative_tags) = repo
                    .db
                    .get_entity_tags(&authoritative_host, since, &[])
                    .await
                {
                    for tag in &authoritative_tags {
                        project_entity_tag_if_absent(repo, entity, tag).await?;
                    }
                    bookkeeping::bind_entity(
                        &repo.cache,
                        entity,
                        CACHE_GET_ENTITY_TAGS,
                        &authoritative_host.id,
                        since,
                    )
                    .await?;
                }
            }
        }
    }
    repo.cache.get_entity_tags(entity, since, names).await
}

pub(crate) async fn delete_entity_tag<C, D>(repo: &CacheRepo<C, D>, id: &EntityId) -> CacheResult<()>
where
    C: Repository,
    D: Repository,
{
    let tag = repo.cache.find_entity_tag_by_id(id).await?;
    let host = repo.cache.find_entity_by_id(&tag.entity_id).await?;

    if let Some(binding) = bookkeeping::read_entity_tag(&repo.cache, &host, CACHE_CREATE_ENTITY).await? {
        if let Ok(authoritative_host) = repo.db.find_entity_by_id(&binding.ref_id).await {
            if let Ok(authoritative_tags) = repo
                .db
                .get_entity_tags(&authoritative_host, assetgraph_core::since_epoch(), &[tag.property.name()])
                .await
            {
                if let Some(found) = authoritative_tags.into_iter().find(|t| t.property == tag.property) {
                    let _ = repo.db.delete_entity_tag(&found.id).await;
                }
            }
        }
    }

    repo.cache.delete_entity_tag(id).await
}

// ----------------------------------------------------------------------
// Edge tags (symmetric)
// ----------------------------------------------------------------------

pub(crate) async fn create_edge_tag<C, D>(repo: &CacheRepo<C, D>, edge: &Edge, tag: EdgeTag) -> CacheResult<EdgeTag>
where
    C: Repository,
    D: Repository,
{
    if let Some(existing) = find_fresh_duplicate_edge_tag(repo, edge, &tag.property).await? {
        return Ok(existing);
    }

    let cache_tag = repo.cache.create_edge_tag(edge, tag).await?;

    let authoritative_edge = resolve_authoritative_edge(repo, edge).await?;
    let authoritative_edge = authoritative_edge.ok_or_else(|| InvariantBrokenError::MissingBinding {
        tag_name: CACHE_CREATE_EDGE,
        host_id: edge.id.clone(),
    })?;
    repo.db
        .create_edge_property(&authoritative_edge, cache_tag.property.clone())
        .await?;

    Ok(cache_tag)
}

async fn find_fresh_duplicate_edge_tag<C, D>(
    repo: &CacheRepo<C, D>,
    edge: &Edge,
    property: &Property,
) -> CacheResult<Option<EdgeTag>>
where
    C: Repository,
    D: Repository,
{
    let existing = repo
        .cache
        .get_edge_tags(edge, assetgraph_core::since_epoch(), &[property.name()])
        .await?;
    for tag in existing {
        if tag.property == *property && is_fresh_for_dedup(tag.last_seen, repo.freq, assetgraph_core::now()) {
            return Ok(Some(tag));
        }
    }
    Ok(None)
}

/// Resolve `edge`'s authoritative twin: endpoints by their `cache_create_entity`
/// bindings, then the matching outgoing edge by (endpoint, relation deep-equality).
async fn resolve_authoritative_edge<C, D>(repo: &CacheRepo<C, D>, edge: &Edge) -> CacheResult<Option<Edge>>
where
    C: Repository,
    D: Repository,
{
    let from_binding = bookkeeping::read_entity_tag(&repo.cache, &edge.from, CACHE_CREATE_ENTITY).await?;
    let to_binding = bookkeeping::read_entity_tag(&repo.cache, &edge.to, CACHE_CREATE_ENTITY).await?;
    let (from_binding, to_binding) = match (from_binding, to_binding) {
        (Some(f), Some(t)) => (f, t),
        _ => return Ok(None),
    };
    let authoritative_from = match repo.db.find_entity_by_id(&from_binding.ref_id).await {
        Ok(e) => e,
        Err(e) if e.is_not_found() => return Ok(None),
        Err(e) => return Err(e),
    };
    let candidates = repo
        .db
        .outgoing_edges(
            &authoritative_from,
            assetgraph_core::since_epoch(),
            &[edge.relation.label()],
        )
        .await?;
    Ok(candidates
        .into_iter()
        .find(|c| c.to.id == to_binding.ref_id && c.relation.deep_eq(&edge.relation)))
}

pub(crate) async fn find_edge_tag_by_id<C, D>(repo: &CacheRepo<C, D>, id: &EntityId) -> CacheResult<EdgeTag>
where
    C: Repository,
    D: Repository,
{
    repo.cache.find_edge_tag_by_id(id).await
}

pub(crate) async fn find_edge_tags_by_content<C, D>(
    repo: &CacheRepo<C, D>,
    property: &Property,
    since: Timestamp,
) -> CacheResult<Vec<EdgeTag>>
where
    C: Repository,
    D: Repository,
{
    if repo.is_whole_history(since) {
        if let Ok(authoritative_hits) = repo.db.find_edge_tags_by_content(property, since).await {
            for hit in authoritative_hits {
                if let Ok(authoritative_edge) = repo.db.find_edge_by_id(&hit.edge_id).await {
                    let cache_from = ensure_cache_twin(repo, &authoritative_edge.from).await?;
                    let cache_to = ensure_cache_twin(repo, &authoritative_edge.to).await?;
                    let cache_edge = ensure_cache_edge(repo, &authoritative_edge, cache_from, cache_to).await?;
                    project_edge_tag_if_absent(repo, &cache_edge, &hit).await?;
                }
            }
        }
    }
    repo.cache.find_edge_tags_by_content(property, since).await
}

async fn ensure_cache_edge<C, D>(
    repo: &CacheRepo<C, D>,
    authoritative_edge: &Edge,
    cache_from: Entity,
    cache_to: Entity,
) -> CacheResult<Edge>
where
    C: Repository,
    D: Repository,
{
    let existing = repo
        .cache
        .outgoing_edges(&cache_from, assetgraph_core::since_epoch(), &[authoritative_edge.relation.label()])
        .await?;
    if let Some(found) = existing
        .into_iter()
        .find(|e| e.to.id == cache_to.id && e.relation.deep_eq(&authoritative_edge.relation))
    {
        return Ok(found);
    }
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
    Ok(cache_edge)
}

async fn project_edge_tag_if_absent<C, D>(
    repo: &CacheRepo<C, D>,
    cache_edge: &Edge,
    authoritative_tag: &EdgeTag,
) -> CacheResult<()>
where
    C: Repository,
    D: Repository,
{
    let existing = repo
        .cache
        .get_edge_tags(
            cache_edge,
            assetgraph_core::since_epoch(),
            &[authoritative_tag.property.name()],
        )
        .await?;
    if existing.iter().any(|t| t.property == authoritative_tag.property) {
        return Ok(());
    }
    repo.cache
        .create_edge_tag(
            cache_edge,
            EdgeTag {
                id: EntityId::new(String::new()),
                created_at: authoritative_tag.created_at,
                last_seen: authoritative_tag.last_seen,
                edge_id: cache_edge.id.clone(),
                property: authoritative_tag.property.clone(),
            },
        )
        .await?;
    Ok(())
}

pub(crate) async fn get_edge_tags<C, D>(
    repo: &CacheRepo<C, D>,
    edge: &Edge,
    since: Timestamp,
    names: &[&str],
) -> CacheResult<Vec<EdgeTag>>
where
    C: Repository,
    D: Repository,
{
    if repo.is_whole_history(since) {
        let recorded = bookkeeping::read_edge_tag(&repo.cache, edge, CACHE_GET_EDGE_TAGS)
            .await?
            .map(|cp| cp.timestamp);
        if is_refill_due_for_since(recorded, since) {
            if let Some(authoritative_edge) = resolve_authoritative_edge(repo, edge).await? {
                if let Ok(authoritative_tags) =
                    repo.db.get_edge_tags(&authoritative_edge, since, &[]).await
                {
                    for tag in &authoritative_tags {
                        project_edge_tag_if_absent(repo, edge, tag).await?;
                    }
                    bookkeeping::bind_edge(
                        &repo.cache,
                        edge,
                        CACHE_GET_EDGE_TAGS,
                        &authoritative_edge.id,
                        since,
                    )
                    .await?;
                }
            }
        }
    }
    repo.cache.get_edge_tags(edge, since, names).await
}

pub(crate) async fn delete_edge_tag<C, D>(repo: &CacheRepo<C, D>, id: &EntityId) -> CacheResult<()>
where
    C: Repository,
    D: Repository,
{
    let tag = repo.cache.find_edge_tag_by_id(id).await?;
    let host = repo.cache.find_edge_by_id(&tag.edge_id).await?;

    if let Some(authoritative_edge) = resolve_authoritative_edge(repo, &host).await? {
        if let Ok(authoritative_tags) = repo
            .db
            .get_edge_tags(&authoritative_edge, assetgraph_core::since_epoch(), &[tag.property.name()])
            .await
        {
            if let Some(found) = authoritative_tags.into_iter().find(|t| t.property == tag.property) {
                let _ = repo.db.delete_edge_tag(&found.id).await;
            }
        }
    }

    repo.cache.delete_edge_tag(id).await
}
