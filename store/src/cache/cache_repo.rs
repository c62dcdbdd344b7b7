//! `CacheRepo`: the write-through, read-fill composite over two
//! [`Repository`] delegates.

use assetgraph_core::{AssetType, CacheResult, HealthCheck, Timestamp};
use async_trait::async_trait;
use std::time::Duration;
use tokio::sync::Mutex;

use crate::cache::{edge_path, entity_path, tag_path};
use crate::repository::Repository;

/// Composes a fast "cache store" and a durable "authoritative store"
/// behind a single [`Repository`] surface, maintaining the bookkeeping
/// tags described in `assetgraph_core::bookkeeping` to decide when a read
/// must consult authority and which authoritative object a cache object
/// shadows.
///
/// `CacheRepo` is itself a `Repository` — callers never need to know they
/// are talking to a composite rather than a single store.
///
/// Per-operation serialization: every `Repository` method that reads or
/// writes entity/edge/tag data takes `lock` first, for the whole duration
/// of the call (`close`/`get_db_type` are trivial single-delegate
/// pass-throughs with no multi-step invariant to protect, so they don't).
/// A read-fill (check binding, maybe write to authority, maybe project
/// into cache) is several steps against two stores that are not otherwise
/// transactional together; without this, two concurrent calls against the
/// same object could both observe "binding absent" and both write
/// through, transiently breaking the binding-uniqueness invariant. This is
/// the "simplest correct implementation" the concurrency model calls for
/// — a single process-wide mutex rather than per-host-object locks.
pub struct CacheRepo<C: Repository, D: Repository> {
    pub(crate) cache: C,
    pub(crate) db: D,
    pub(crate) freq: Duration,
    start: Timestamp,
    lock: Mutex<()>,
}

impl<C: Repository, D: Repository> CacheRepo<C, D> {
    /// `freq` is the freshness window: the minimum interval between
    /// authoritative refills for a given (object, access pattern). The
    /// session epoch (`start_time()`) is recorded as `now()` at
    /// construction.
    pub fn new(cache: C, db: D, freq: Duration) -> Self {
        Self {
            cache,
            db,
            freq,
            start: assetgraph_core::now(),
            lock: Mutex::new(()),
        }
    }

    /// As [`CacheRepo::new`], but taking a [`assetgraph_core::CacheConfig`]
    /// and rejecting it up front via
    /// [`assetgraph_core::CacheConfig::validate`] rather than constructing
    /// a `CacheRepo` with a nonsensical freshness window.
    pub fn with_config(cache: C, db: D, config: assetgraph_core::CacheConfig) -> CacheResult<Self> {
        config.validate()?;
        Ok(Self::new(cache, db, config.freshness_window))
    }

    /// The wall-clock moment this `CacheRepo` was constructed. Separates
    /// "historical" queries (`since < start_time()`) from "this session"
    /// queries (`since >= start_time()`).
    pub fn start_time(&self) -> Timestamp {
        self.start
    }

    pub(crate) fn is_whole_history(&self, since: Timestamp) -> bool {
        crate::cache::freshness::is_whole_history(since, self.start)
    }

    /// Probe both delegate stores with a cheap, always-legal read
    /// (`find_entities_by_type`, which never errors except on a genuine
    /// backend failure — an empty result is a healthy answer) and report
    /// reachability for each. Mirrors the teacher's readiness-check shape
    /// (one `ComponentHealth` per dependency) without the HTTP framing,
    /// which is out of this crate's scope.
    pub async fn health_check(&self) -> Vec<HealthCheck> {
        vec![
            probe(&self.cache, "cache").await,
            probe(&self.db, self.db.get_db_type()).await,
        ]
    }
}

async fn probe<R: Repository>(repo: &R, label: &str) -> HealthCheck {
    match repo
        .find_entities_by_type(AssetType::Fqdn, assetgraph_core::since_epoch())
        .await
    {
        Ok(_) => HealthCheck::healthy(label),
        Err(e) => HealthCheck::unhealthy(label, e.to_string()),
    }
}

#[async_trait]
impl<C: Repository, D: Repository> Repository for CacheRepo<C, D> {
    async fn create_entity(&self, entity: assetgraph_core::Entity) -> CacheResult<assetgraph_core::Entity> {
        let _guard = self.lock.lock().await;
        entity_path::create_entity(self, entity).await
    }

    async fn find_entity_by_id(
        &self,
        id: &assetgraph_core::EntityId,
    ) -> CacheResult<assetgraph_core::Entity> {
        let _guard = self.lock.lock().await;
        entity_path::find_entity_by_id(self, id).await
    }

    async fn find_entities_by_content(
        &self,
        asset: &assetgraph_core::Asset,
        since: Timestamp,
    ) -> CacheResult<Vec<assetgraph_core::Entity>> {
        let _guard = self.lock.lock().await;
        entity_path::find_entities_by_content(self, asset, since).await
    }

    async fn find_entities_by_type(
        &self,
        asset_type: assetgraph_core::AssetType,
        since: Timestamp,
    ) -> CacheResult<Vec<assetgraph_core::Entity>> {
        let _guard = self.lock.lock().await;
        entity_path::find_entities_by_type(self, asset_type, since).await
    }

    async fn delete_entity(&self, id: &assetgraph_core::EntityId) -> CacheResult<()> {
        let _guard = self.lock.lock().await;
        entity_path::delete_entity(self, id).await
    }

    async fn create_edge(&self, edge: assetgraph_core::Edge) -> CacheResult<assetgraph_core::Edge> {
        let _guard = self.lock.lock().await;
        edge_path::create_edge(self, edge).await
    }

    async fn find_edge_by_id(&self, id: &assetgraph_core::EntityId) -> CacheResult<assetgraph_core::Edge> {
        let _guard = self.lock.lock().await;
        edge_path::find_edge_by_id(self, id).await
    }

    async fn incoming_edges(
        &self,
        entity: &assetgraph_core::Entity,
        since: Timestamp,
        labels: &[&str],
    ) -> CacheResult<Vec<assetgraph_core::Edge>> {
        let _guard = self.lock.lock().await;
        edge_path::incoming_edges(self, entity, since, labels).await
    }

    async fn outgoing_edges(
        &self,
        entity: &assetgraph_core::Entity,
        since: Timestamp,
        labels: &[&str],
    ) -> CacheResult<Vec<assetgraph_core::Edge>> {
        let _guard = self.lock.lock().await;
        edge_path::outgoing_edges(self, entity, since, labels).await
    }

    async fn delete_edge(&self, id: &assetgraph_core::EntityId) -> CacheResult<()> {
        let _guard = self.lock.lock().await;
        edge_path::delete_edge(self, id).await
    }

    async fn create_entity_tag(
        &self,
        entity: &assetgraph_core::Entity,
        tag: assetgraph_core::EntityTag,
    ) -> CacheResult<assetgraph_core::EntityTag> {
        let _guard = self.lock.lock().await;
        tag_path::create_entity_tag(self, entity, tag).await
    }

    async fn find_entity_tag_by_id(
        &self,
        id: &assetgraph_core::EntityId,
    ) -> CacheResult<assetgraph_core::EntityTag> {
        let _guard = self.lock.lock().await;
        tag_path::find_entity_tag_by_id(self, id).await
    }

    async fn find_entity_tags_by_content(
        &self,
        property: &assetgraph_core::Property,
        since: Timestamp,
    ) -> CacheResult<Vec<assetgraph_core::EntityTag>> {
        let _guard = self.lock.lock().await;
        tag_path::find_entity_tags_by_content(self, property, since).await
    }

    async fn get_entity_tags(
        &self,
        entity: &assetgraph_core::Entity,
        since: Timestamp,
        names: &[&str],
    ) -> CacheResult<Vec<assetgraph_core::EntityTag>> {
        let _guard = self.lock.lock().await;
        tag_path::get_entity_tags(self, entity, since, names).await
    }

    async fn delete_entity_tag(&self, id: &assetgraph_core::EntityId) -> CacheResult<()> {
        let _guard = self.lock.lock().await;
        tag_path::delete_entity_tag(self, id).await
    }

    async fn create_edge_tag(
        &self,
        edge: &assetgraph_core::Edge,
        tag: assetgraph_core::EdgeTag,
    ) -> CacheResult<assetgraph_core::EdgeTag> {
        let _guard = self.lock.lock().await;
        tag_path::create_edge_tag(self, edge, tag).await
    }

    async fn find_edge_tag_by_id(
        &self,
        id: &assetgraph_core::EntityId,
    ) -> CacheResult<assetgraph_core::EdgeTag> {
        let _guard = self.lock.lock().await;
        tag_path::find_edge_tag_by_id(self, id).await
    }

    async fn find_edge_tags_by_content(
        &self,
        property: &assetgraph_core::Property,
        since: Timestamp,
    ) -> CacheResult<Vec<assetgraph_core::EdgeTag>> {
        let _guard = self.lock.lock().await;
        tag_path::find_edge_tags_by_content(self, property, since).await
    }

    async fn get_edge_tags(
        &self,
        edge: &assetgraph_core::Edge,
        since: Timestamp,
        names: &[&str],
    ) -> CacheResult<Vec<assetgraph_core::EdgeTag>> {
        let _guard = self.lock.lock().await;
        tag_path::get_edge_tags(self, edge, since, names).await
    }

    async fn delete_edge_tag(&self, id: &assetgraph_core::EntityId) -> CacheResult<()> {
        let _guard = self.lock.lock().await;
        tag_path::delete_edge_tag(self, id).await
    }

    /// Closes the cache store. The authoritative store's lifetime is owned
    /// by the caller, not by `CacheRepo`.
    async fn close(&self) -> CacheResult<()> {
        self.cache.close().await
    }

    /// Returns the authoritative store's type tag — the cache is
    /// transparent from the outside.
    fn get_db_type(&self) -> &str {
        self.db.get_db_type()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::mock::InMemoryRepository;

    #[test]
    fn start_time_is_stable_and_in_the_past() {
        let before = assetgraph_core::now();
        let repo = CacheRepo::new(
            InMemoryRepository::new("cache"),
            InMemoryRepository::new("db"),
            Duration::from_secs(60),
        );
        let after = assetgraph_core::now();
        assert!(repo.start_time() >= before);
        assert!(repo.start_time() <= after);
        assert_eq!(repo.start_time(), repo.start_time());
    }

    #[test]
    fn with_config_rejects_a_zero_freshness_window() {
        let err = CacheRepo::with_config(
            InMemoryRepository::new("cache"),
            InMemoryRepository::new("db"),
            assetgraph_core::CacheConfig::new(Duration::ZERO),
        )
        .unwrap_err();
        assert!(matches!(err, assetgraph_core::CacheError::Config(_)));
    }

    #[test]
    fn with_config_accepts_a_valid_freshness_window() {
        let repo = CacheRepo::with_config(
            InMemoryRepository::new("cache"),
            InMemoryRepository::new("db"),
            assetgraph_core::CacheConfig::default(),
        )
        .unwrap();
        assert_eq!(repo.freq, Duration::from_secs(60));
    }

    #[test]
    fn get_db_type_passes_through_to_authoritative_store() {
        let repo = CacheRepo::new(
            InMemoryRepository::new("cache"),
            InMemoryRepository::new("postgres"),
            Duration::from_secs(60),
        );
        assert_eq!(repo.get_db_type(), "postgres");
    }

    #[tokio::test]
    async fn health_check_reports_both_stores_healthy() {
        let repo = CacheRepo::new(
            InMemoryRepository::new("cache"),
            InMemoryRepository::new("postgres"),
            Duration::from_secs(60),
        );
        let checks = repo.health_check().await;
        assert_eq!(checks.len(), 2);
        assert!(checks
            .iter()
            .all(|c| c.status == assetgraph_core::HealthStatus::Healthy));
        assert_eq!(checks[0].store, "cache");
        assert_eq!(checks[1].store, "postgres");
    }
}
