//! In-memory reference [`Repository`] implementation.
//!
//! Grounded on the teacher's `MockStorage`: one `Arc<RwLock<HashMap<..>>>`
//! per object kind, a monotonic counter to mint ids, and a linear scan for
//! every content- or type-indexed query. No pretense of a real backend's
//! indexing strategy — this exists so `CacheRepo` has two independent,
//! freely constructible stores to compose in tests.

use assetgraph_core::{
    Asset, AssetType, CacheResult, Edge, EdgeTag, Entity, EntityId, EntityTag, NotFoundError,
    Property,
};
use async_trait::async_trait;
use std::collections::HashMap;
use std::sync::{Arc, RwLock};
use uuid::Uuid;

use crate::repository::Repository;

/// An in-memory [`Repository`]. Cheaply `Clone`-able; all state lives
/// behind `Arc`, so clones share the same underlying maps.
#[derive(Clone)]
pub struct InMemoryRepository {
    label: &'static str,
    entities: Arc<RwLock<HashMap<EntityId, Entity>>>,
    edges: Arc<RwLock<HashMap<EntityId, Edge>>>,
    entity_tags: Arc<RwLock<HashMap<EntityId, EntityTag>>>,
    edge_tags: Arc<RwLock<HashMap<EntityId, EdgeTag>>>,
}

impl InMemoryRepository {
    /// Construct an empty store. `label` is returned by
    /// [`Repository::get_db_type`] — give the cache store and the
    /// authoritative store distinct labels in tests so assertions can tell
    /// them apart.
    pub fn new(label: &'static str) -> Self {
        Self {
            label,
            entities: Arc::new(RwLock::new(HashMap::new())),
            edges: Arc::new(RwLock::new(HashMap::new())),
            entity_tags: Arc::new(RwLock::new(HashMap::new())),
            edge_tags: Arc::new(RwLock::new(HashMap::new())),
        }
    }

    /// Mints a `{label}-{prefix}-{uuid}` id: the uuid keeps ids unique
    /// across stores without a shared counter, and the label/prefix
    /// keep them human-readable in test failures and debug output.
    fn mint_id(&self, prefix: &str) -> EntityId {
        EntityId::new(format!("{}-{prefix}-{}", self.label, Uuid::new_v4()))
    }

    /// Number of entities currently stored. Test convenience.
    pub fn entity_count(&self) -> usize {
        self.entities.read().unwrap().len()
    }

    /// Number of edges currently stored. Test convenience.
    pub fn edge_count(&self) -> usize {
        self.edges.read().unwrap().len()
    }
}

#[async_trait]
impl Repository for InMemoryRepository {
    async fn create_entity(&self, mut entity: Entity) -> CacheResult<Entity> {
        entity.id = self.mint_id("entity");
        self.entities
            .write()
            .unwrap()
            .insert(entity.id.clone(), entity.clone());
        Ok(entity)
    }

    async fn find_entity_by_id(&self, id: &EntityId) -> CacheResult<Entity> {
        self.entities
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::Entity { id: id.clone() }.into())
    }

    async fn find_entities_by_content(
        &self,
        asset: &Asset,
        since: assetgraph_core::Timestamp,
    ) -> CacheResult<Vec<Entity>> {
        let key = asset.content_key();
        let matches: Vec<Entity> = self
            .entities
            .read()
            .unwrap()
            .values()
            .filter(|e| e.asset.content_key() == key && e.last_seen >= since)
            .cloned()
            .collect();
        if matches.is_empty() {
            return Err(NotFoundError::ByContent.into());
        }
        Ok(matches)
    }

    async fn find_entities_by_type(
        &self,
        asset_type: AssetType,
        since: assetgraph_core::Timestamp,
    ) -> CacheResult<Vec<Entity>> {
        Ok(self
            .entities
            .read()
            .unwrap()
            .values()
            .filter(|e| e.asset.asset_type() == asset_type && e.last_seen >= since)
            .cloned()
            .collect())
    }

    async fn delete_entity(&self, id: &EntityId) -> CacheResult<()> {
        self.entities
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| NotFoundError::Entity { id: id.clone() }.into())
    }

    async fn create_edge(&self, mut edge: Edge) -> CacheResult<Edge> {
        edge.id = self.mint_id("edge");
        self.edges
            .write()
            .unwrap()
            .insert(edge.id.clone(), edge.clone());
        Ok(edge)
    }

    async fn find_edge_by_id(&self, id: &EntityId) -> CacheResult<Edge> {
        self.edges
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::Edge { id: id.clone() }.into())
    }

    async fn incoming_edges(
        &self,
        entity: &Entity,
        since: assetgraph_core::Timestamp,
        labels: &[&str],
    ) -> CacheResult<Vec<Edge>> {
        Ok(self
            .edges
            .read()
            .unwrap()
            .values()
            .filter(|e| e.to.id == entity.id && e.last_seen >= since)
            .filter(|e| labels.is_empty() || labels.contains(&e.relation.label()))
            .cloned()
            .collect())
    }

    async fn outgoing_edges(
        &self,
        entity: &Entity,
        since: assetgraph_core::Timestamp,
        labels: &[&str],
    ) -> CacheResult<Vec<Edge>> {
        Ok(self
            .edges
            .read()
            .unwrap()
            .values()
            .filter(|e| e.from.id == entity.id && e.last_seen >= since)
            .filter(|e| labels.is_empty() || labels.contains(&e.relation.label()))
            .cloned()
            .collect())
    }

    async fn delete_edge(&self, id: &EntityId) -> CacheResult<()> {
        self.edges
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| NotFoundError::Edge { id: id.clone() }.into())
    }

    async fn create_entity_tag(&self, entity: &Entity, mut tag: EntityTag) -> CacheResult<EntityTag> {
        tag.id = self.mint_id("entity-tag");
        tag.entity_id = entity.id.clone();
        self.entity_tags
            .write()
            .unwrap()
            .insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }

    async fn find_entity_tag_by_id(&self, id: &EntityId) -> CacheResult<EntityTag> {
        self.entity_tags
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::EntityTag { id: id.clone() }.into())
    }

    async fn find_entity_tags_by_content(
        &self,
        property: &Property,
        since: assetgraph_core::Timestamp,
    ) -> CacheResult<Vec<EntityTag>> {
        let matches: Vec<EntityTag> = self
            .entity_tags
            .read()
            .unwrap()
            .values()
            .filter(|t| {
                t.property.name() == property.name()
                    && t.property.value() == property.value()
                    && t.last_seen >= since
            })
            .cloned()
            .collect();
        if matches.is_empty() {
            return Err(NotFoundError::ByContent.into());
        }
        Ok(matches)
    }

    async fn get_entity_tags(
        &self,
        entity: &Entity,
        since: assetgraph_core::Timestamp,
        names: &[&str],
    ) -> CacheResult<Vec<EntityTag>> {
        Ok(self
            .entity_tags
            .read()
            .unwrap()
            .values()
            .filter(|t| t.entity_id == entity.id && t.last_seen >= since)
            .filter(|t| names.is_empty() || names.contains(&t.property.name()))
            .cloned()
            .collect())
    }

    async fn delete_entity_tag(&self, id: &EntityId) -> CacheResult<()> {
        self.entity_tags
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| NotFoundError::EntityTag { id: id.clone() }.into())
    }

    async fn create_edge_tag(&self, edge: &Edge, mut tag: EdgeTag) -> CacheResult<EdgeTag> {
        tag.id = self.mint_id("edge-tag");
        tag.edge_id = edge.id.clone();
        self.edge_tags
            .write()
            .unwrap()
            .insert(tag.id.clone(), tag.clone());
        Ok(tag)
    }

    async fn find_edge_tag_by_id(&self, id: &EntityId) -> CacheResult<EdgeTag> {
        self.edge_tags
            .read()
            .unwrap()
            .get(id)
            .cloned()
            .ok_or_else(|| NotFoundError::EdgeTag { id: id.clone() }.into())
    }

    async fn find_edge_tags_by_content(
        &self,
        property: &Property,
        since: assetgraph_core::Timestamp,
    ) -> CacheResult<Vec<EdgeTag>> {
        let matches: Vec<EdgeTag> = self
            .edge_tags
            .read()
            .unwrap()
            .values()
            .filter(|t| {
                t.property.name() == property.name()
                    && t.property.value() == property.value()
                    && t.last_seen >= since
            })
            .cloned()
            .collect();
        if matches.is_empty() {
            return Err(NotFoundError::ByContent.into());
        }
        Ok(matches)
    }

    async fn get_edge_tags(
        &self,
        edge: &Edge,
        since: assetgraph_core::Timestamp,
        names: &[&str],
    ) -> CacheResult<Vec<EdgeTag>> {
        Ok(self
            .edge_tags
            .read()
            .unwrap()
            .values()
            .filter(|t| t.edge_id == edge.id && t.last_seen >= since)
            .filter(|t| names.is_empty() || names.contains(&t.property.name()))
            .cloned()
            .collect())
    }

    async fn delete_edge_tag(&self, id: &EntityId) -> CacheResult<()> {
        self.edge_tags
            .write()
            .unwrap()
            .remove(id)
            .map(|_| ())
            .ok_or_else(|| NotFoundError::EdgeTag { id: id.clone() }.into())
    }

    async fn close(&self) -> CacheResult<()> {
        Ok(())
    }

    fn get_db_type(&self) -> &str {
        self.label
    }
}

impl std::fmt::Debug for InMemoryRepository {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("InMemoryRepository")
            .field("label", &self.label)
            .field("entities", &self.entity_count())
            .field("edges", &self.edge_count())
            .finish()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn create_then_find_entity_by_id_roundtrips() {
        let repo = InMemoryRepository::new("test");
        let created = repo.create_asset(Asset::fqdn("owasp.org")).await.unwrap();
        let found = repo.find_entity_by_id(&created.id).await.unwrap();
        assert_eq!(found, created);
    }

    #[tokio::test]
    async fn find_entity_by_id_errors_when_absent() {
        let repo = InMemoryRepository::new("test");
        let err = repo
            .find_entity_by_id(&EntityId::new("missing"))
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn find_entities_by_content_errors_on_no_match() {
        let repo = InMemoryRepository::new("test");
        let err = repo
            .find_entities_by_content(&Asset::fqdn("owasp.org"), assetgraph_core::since_epoch())
            .await
            .unwrap_err();
        assert!(err.is_not_found());
    }

    #[tokio::test]
    async fn find_entities_by_content_matches_case_insensitively() {
        let repo = InMemoryRepository::new("test");
        repo.create_asset(Asset::fqdn("OWASP.org")).await.unwrap();
        let found = repo
            .find_entities_by_content(&Asset::fqdn("owasp.ORG"), assetgraph_core::since_epoch())
            .await
            .unwrap();
        assert_eq!(found.len(), 1);
    }

    #[tokio::test]
    async fn create_entity_preserves_given_timestamps() {
        let repo = InMemoryRepository::new("test");
        let old = assetgraph_core::since_epoch();
        let projected = Entity::new(EntityId::new(""), Asset::fqdn("old.example"), old);
        let created = repo.create_entity(projected).await.unwrap();
        assert_eq!(created.created_at, old);
        assert_eq!(created.last_seen, old);
    }

    #[tokio::test]
    async fn find_entities_by_type_returns_empty_vec_not_error() {
        let repo = InMemoryRepository::new("test");
        let found = repo
            .find_entities_by_type(AssetType::Fqdn, assetgraph_core::since_epoch())
            .await
            .unwrap();
        assert!(found.is_empty());
    }

    #[tokio::test]
    async fn incoming_and_outgoing_edges_are_directional() {
        let repo = InMemoryRepository::new("test");
        let a = repo.create_asset(Asset::fqdn("a.example")).await.unwrap();
        let b = repo.create_asset(Asset::fqdn("b.example")).await.unwrap();
        let now = assetgraph_core::now();
        let edge = Edge::new(
            EntityId::new(""),
            assetgraph_core::Relation::basic_dns("cname", 5, 1, 3600),
            a.clone(),
            b.clone(),
            now,
        );
        repo.create_edge(edge).await.unwrap();

        let out = repo
            .outgoing_edges(&a, assetgraph_core::since_epoch(), &[])
            .await
            .unwrap();
        assert_eq!(out.len(), 1);
        let inn = repo
            .incoming_edges(&a, assetgraph_core::since_epoch(), &[])
            .await
            .unwrap();
        assert!(inn.is_empty());
    }

    #[tokio::test]
    async fn delete_entity_tag_then_lookup_errors() {
        let repo = InMemoryRepository::new("test");
        let e = repo.create_asset(Asset::fqdn("a.example")).await.unwrap();
        let tag = repo
            .create_entity_property(&e, Property::simple("note", "v"))
            .await
            .unwrap();
        repo.delete_entity_tag(&tag.id).await.unwrap();
        let err = repo.find_entity_tag_by_id(&tag.id).await.unwrap_err();
        assert!(err.is_not_found());
    }
}
