//! The `Repository` contract.
//!
//! Both delegate stores of a `CacheRepo` — the fast "cache store" and the
//! durable "authoritative store" — implement this same trait, and
//! `CacheRepo` implements it a third time, composing the other two. This
//! is the only interface the cache layer knows about; it never reaches
//! past it into a concrete backend.
//!
//! # `since` semantics
//!
//! Every list/fetch operation that takes a `since` timestamp restricts
//! results to rows with `last_seen >= since`. Passing
//! `assetgraph_core::since_epoch()` (the Unix epoch) disables the filter —
//! every row satisfies `last_seen >= epoch`, which is
//! "since = 0 disables the filter" spelled out as ordinary timestamp
//! arithmetic rather than a magic sentinel value.
//!
//! # Not-found vs. empty list
//!
//! One specific asymmetry matters here: failing to find any
//! row for a by-id or by-content lookup is an *error*
//! (`assetgraph_core::NotFoundError`), not an empty success. This crate applies that
//! convention uniformly to every `*_by_id` and `*_by_content` method
//! (content-keyed and id-keyed lookups are both "I expected something
//! specific to exist"); ordinary list queries
//! (`find_entities_by_type`, `incoming_edges`/`outgoing_edges`,
//! `get_entity_tags`/`get_edge_tags`) return an empty `Vec` when nothing
//! matches, since "no assets of this type yet" is a legitimate answer, not
//! a signalling failure. See `DESIGN.md` for the grounding of this
//! decision, which is only stated explicitly for `FindEntitiesByContent`.
//!
//! # `create_*` vs `create_*_property`/`create_asset`
//!
//! `create_entity`/`create_entity_tag`/`create_edge_tag` take a fully-formed
//! object and keep its `created_at`/`last_seen` verbatim (the store only
//! ever overwrites the id). This is what lets the cache project a row
//! fetched from authority into the other store without losing its original
//! timestamps. `create_asset`/`create_entity_property`/`create_edge_property`
//! are the now-stamped conveniences for ordinary callers who don't have
//! (and shouldn't have to fabricate) timestamps of their own.

use assetgraph_core::{
    Asset, AssetType, CacheResult, Edge, EdgeTag, Entity, EntityId, EntityTag, Property, Timestamp,
};
use async_trait::async_trait;

/// Abstract operations on entities, edges, entity-tags, and edge-tags.
///
/// Implemented by the cache store, the authoritative store, and by
/// [`crate::cache::CacheRepo`] itself.
#[async_trait]
pub trait Repository: Send + Sync {
    // ------------------------------------------------------------------
    // Entities
    // ------------------------------------------------------------------

    /// Insert `entity` as given, except for its id, which the store mints.
    async fn create_entity(&self, entity: Entity) -> CacheResult<Entity>;

    /// Convenience over [`Repository::create_entity`] for a caller with no
    /// opinion on timestamps: wraps `asset` as an entity stamped `now`.
    async fn create_asset(&self, asset: Asset) -> CacheResult<Entity> {
        let now = assetgraph_core::now();
        self.create_entity(Entity::new(EntityId::new(String::new()), asset, now))
            .await
    }

    /// Look up an entity by this store's own id. No cross-store fallback.
    async fn find_entity_by_id(&self, id: &EntityId) -> CacheResult<Entity>;

    /// All entities whose asset content-key matches `asset`'s, with
    /// `last_seen >= since`. Errors (does not return an empty list) if
    /// none match.
    async fn find_entities_by_content(
        &self,
        asset: &Asset,
        since: Timestamp,
    ) -> CacheResult<Vec<Entity>>;

    /// All entities of the given asset type with `last_seen >= since`.
    async fn find_entities_by_type(
        &self,
        asset_type: AssetType,
        since: Timestamp,
    ) -> CacheResult<Vec<Entity>>;

    /// Remove an entity by id.
    async fn delete_entity(&self, id: &EntityId) -> CacheResult<()>;

    // ------------------------------------------------------------------
    // Edges
    // ------------------------------------------------------------------

    /// Insert `edge` as given, except for its id. Both `edge.from` and
    /// `edge.to` must already exist, as entities, in this same store.
    async fn create_edge(&self, edge: Edge) -> CacheResult<Edge>;

    async fn find_edge_by_id(&self, id: &EntityId) -> CacheResult<Edge>;

    /// Edges directed into `entity` with `last_seen >= since`, optionally
    /// restricted to the given relation labels (no restriction if empty).
    async fn incoming_edges(
        &self,
        entity: &Entity,
        since: Timestamp,
        labels: &[&str],
    ) -> CacheResult<Vec<Edge>>;

    /// Edges directed out of `entity` with `last_seen >= since`, optionally
    /// restricted to the given relation labels (no restriction if empty).
    async fn outgoing_edges(
        &self,
        entity: &Entity,
        since: Timestamp,
        labels: &[&str],
    ) -> CacheResult<Vec<Edge>>;

    async fn delete_edge(&self, id: &EntityId) -> CacheResult<()>;

    // ------------------------------------------------------------------
    // Entity tags
    // ------------------------------------------------------------------

    /// Insert `tag` as given (except for its id; `entity_id` is forced to
    /// `entity.id`).
    async fn create_entity_tag(&self, entity: &Entity, tag: EntityTag) -> CacheResult<EntityTag>;

    /// Convenience over [`Repository::create_entity_tag`]: wraps `property`
    /// as a tag stamped `now`.
    async fn create_entity_property(
        &self,
        entity: &Entity,
        property: Property,
    ) -> CacheResult<EntityTag> {
        let now = assetgraph_core::now();
        self.create_entity_tag(
            entity,
            EntityTag {
                id: EntityId::new(String::new()),
                created_at: now,
                last_seen: now,
                entity_id: entity.id.clone(),
                property,
            },
        )
        .await
    }

    async fn find_entity_tag_by_id(&self, id: &EntityId) -> CacheResult<EntityTag>;

    /// All entity tags whose property matches `property` by (name, value),
    /// with `last_seen >= since`. Errors if none match.
    async fn find_entity_tags_by_content(
        &self,
        property: &Property,
        since: Timestamp,
    ) -> CacheResult<Vec<EntityTag>>;

    /// Tags on `entity` with `last_seen >= since`, optionally restricted to
    /// the given property names (no restriction if empty).
    async fn get_entity_tags(
        &self,
        entity: &Entity,
        since: Timestamp,
        names: &[&str],
    ) -> CacheResult<Vec<EntityTag>>;

    async fn delete_entity_tag(&self, id: &EntityId) -> CacheResult<()>;

    // ------------------------------------------------------------------
    // Edge tags (symmetric with entity tags)
    // ------------------------------------------------------------------

    async fn create_edge_tag(&self, edge: &Edge, tag: EdgeTag) -> CacheResult<EdgeTag>;

    async fn create_edge_property(&self, edge: &Edge, property: Property) -> CacheResult<EdgeTag> {
        let now = assetgraph_core::now();
        self.create_edge_tag(
            edge,
            EdgeTag {
                id: EntityId::new(String::new()),
                created_at: now,
                last_seen: now,
                edge_id: edge.id.clone(),
                property,
            },
        )
        .await
    }

    async fn find_edge_tag_by_id(&self, id: &EntityId) -> CacheResult<EdgeTag>;

    async fn find_edge_tags_by_content(
        &self,
        property: &Property,
        since: Timestamp,
    ) -> CacheResult<Vec<EdgeTag>>;

    async fn get_edge_tags(
        &self,
        edge: &Edge,
        since: Timestamp,
        names: &[&str],
    ) -> CacheResult<Vec<EdgeTag>>;

    async fn delete_edge_tag(&self, id: &EntityId) -> CacheResult<()>;

    // ------------------------------------------------------------------
    // Lifecycle
    // ------------------------------------------------------------------

    /// Release any resources held by this store.
    async fn close(&self) -> CacheResult<()>;

    /// An opaque identification string for this store implementation
    /// (e.g. `"in-memory"`, `"postgres"`).
    fn get_db_type(&self) -> &str;
}
