//! Test fixtures and proptest generators for the asset graph cache workspace.
//!
//! Centralizes the handful of `Asset`/`Relation`/`Property` shapes the cache
//! layer's tests reuse, so individual test modules build entities and edges
//! from one small vocabulary instead of each inventing its own FQDN strings.

pub use assetgraph_core::*;
pub use assetgraph_store::{CacheRepo, InMemoryRepository, Repository};

use chrono::Duration as ChronoDuration;

pub mod generators {
    //! Proptest strategies for the asset graph model.

    use super::*;
    use proptest::prelude::*;

    pub fn arb_fqdn() -> impl Strategy<Value = Asset> {
        "[a-z]{3,10}\\.(com|org|net|edu)".prop_map(Asset::fqdn)
    }

    pub fn arb_ip_address() -> impl Strategy<Value = Asset> {
        (1u8..255, 0u8..255, 0u8..255, 1u8..255)
            .prop_map(|(a, b, c, d)| Asset::ip_address(format!("{a}.{b}.{c}.{d}")))
    }

    pub fn arb_autonomous_system() -> impl Strategy<Value = Asset> {
        (1u32..65535).prop_map(Asset::autonomous_system)
    }

    pub fn arb_asset() -> impl Strategy<Value = Asset> {
        prop_oneof![arb_fqdn(), arb_ip_address(), arb_autonomous_system()]
    }

    pub fn arb_simple_relation() -> impl Strategy<Value = Relation> {
        "[a-z_]{3,12}".prop_map(Relation::simple)
    }

    pub fn arb_basic_dns_relation() -> impl Strategy<Value = Relation> {
        ("[a-z_]{3,12}", 1u16..50, 1u16..5, 60u32..86400)
            .prop_map(|(name, rr_type, class, ttl)| Relation::basic_dns(name, rr_type, class, ttl))
    }

    pub fn arb_relation() -> impl Strategy<Value = Relation> {
        prop_oneof![arb_simple_relation(), arb_basic_dns_relation()]
    }

    pub fn arb_simple_property() -> impl Strategy<Value = Property> {
        ("[a-z_]{3,10}", "[a-zA-Z0-9 ]{1,30}").prop_map(|(name, value)| Property::simple(name, value))
    }
}

pub mod fixtures {
    //! Pre-built entities, edges, and store pairs for cache-path tests.

    use super::*;

    /// An `Entity` carrying an FQDN asset, stamped `now`.
    pub fn fqdn_entity(name: impl Into<String>) -> Entity {
        Entity::new(EntityId::new(""), Asset::fqdn(name), assetgraph_core::now())
    }

    /// An `Entity` carrying an FQDN asset, stamped at the given age before now.
    pub fn fqdn_entity_aged(name: impl Into<String>, age: ChronoDuration) -> Entity {
        Entity::new(EntityId::new(""), Asset::fqdn(name), assetgraph_core::now() - age)
    }

    /// A DNS A-record relation binding `from` to `to`.
    pub fn dns_a_record_edge(from: Entity, to: Entity) -> Edge {
        Edge::new(
            EntityId::new(""),
            Relation::basic_dns("dns_record", 1, 1, 3600),
            from,
            to,
            assetgraph_core::now(),
        )
    }

    /// A pair of independent, empty in-memory stores labeled `"cache"` and
    /// `"db"` — the two delegates a [`CacheRepo`] composes in tests.
    pub fn store_pair() -> (InMemoryRepository, InMemoryRepository) {
        (InMemoryRepository::new("cache"), InMemoryRepository::new("db"))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use proptest::prelude::*;

    #[test]
    fn fqdn_entity_fixture_has_empty_id_and_fqdn_asset() {
        let e = fixtures::fqdn_entity("owasp.org");
        assert!(e.id.is_empty());
        assert_eq!(e.asset.asset_type(), AssetType::Fqdn);
    }

    #[test]
    fn store_pair_labels_are_distinct() {
        let (cache, db) = fixtures::store_pair();
        assert_eq!(cache.get_db_type(), "cache");
        assert_eq!(db.get_db_type(), "db");
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(50))]

        #[test]
        fn prop_generated_asset_has_a_type(asset in generators::arb_asset()) {
            let _ = asset.asset_type();
            let _ = asset.content_key();
        }

        #[test]
        fn prop_generated_relation_has_a_label(relation in generators::arb_relation()) {
            assert!(!relation.label().is_empty());
        }
    }
}
