//! Stable bookkeeping tag names.
//!
//! These are the `Property::Cache.name` values the cache store's own
//! bookkeeping tags carry. They're observable (a caller inspecting the raw
//! cache store will see these strings) so they're pinned as constants
//! rather than assembled ad hoc at call sites.

/// Binds a cache entity to the authoritative entity id it shadows.
pub const CACHE_CREATE_ENTITY: &str = "cache_create_entity";

/// Binds a cache edge to the authoritative edge id it shadows.
pub const CACHE_CREATE_EDGE: &str = "cache_create_edge";

/// Reserved for parity with the source system's tag-name enumeration;
/// `CreateAsset` is a convenience wrapper over `CreateEntity` and shares its
/// binding tag (`CACHE_CREATE_ENTITY`), so this name is not written by the
/// cache itself but is kept as a stable constant since it is part of the
/// externally observable tag-name set.
pub const CACHE_CREATE_ASSET: &str = "cache_create_asset";

/// Records the last `since` for which an entity's tag set was refilled.
pub const CACHE_GET_ENTITY_TAGS: &str = "cache_get_entity_tags";

/// Records the last `since` for which an edge's tag set was refilled.
pub const CACHE_GET_EDGE_TAGS: &str = "cache_get_edge_tags";

/// Records the last `since` for which an entity's incoming-edge traversal
/// was refilled.
pub const CACHE_INCOMING_EDGES: &str = "cache_incoming_edges";

/// Records the last `since` for which an entity's outgoing-edge traversal
/// was refilled.
pub const CACHE_OUTGOING_EDGES: &str = "cache_outgoing_edges";

/// Records the last `since` covered for a `FindEntitiesByType` query,
/// one marker per asset type.
pub const CACHE_FIND_ENTITIES_BY_TYPE: &str = "cache_find_entities_by_type";
