//! Entity/Edge/Tag shapes.

use crate::identity::{EntityId, Timestamp};
use crate::model::{Asset, Property, Relation};
use serde::{Deserialize, Serialize};

/// A node in the asset graph.
///
/// Ownership: an `Entity` is owned by whichever store minted its `id`. The
/// same logical asset (same [`Asset::content_key`]) may exist concurrently
/// in both stores under different ids.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Entity {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub last_seen: Timestamp,
    pub asset: Asset,
}

impl Entity {
    /// Construct an entity with `created_at == last_seen == now`, as a
    /// store would when minting a brand new row.
    pub fn new(id: EntityId, asset: Asset, now: Timestamp) -> Self {
        Self {
            id,
            created_at: now,
            last_seen: now,
            asset,
        }
    }
}

/// A directed relationship between two entities, which must live in the
/// same store as the edge itself.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Edge {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub last_seen: Timestamp,
    pub relation: Relation,
    pub from: Entity,
    pub to: Entity,
}

impl Edge {
    pub fn new(id: EntityId, relation: Relation, from: Entity, to: Entity, now: Timestamp) -> Self {
        Self {
            id,
            created_at: now,
            last_seen: now,
            relation,
            from,
            to,
        }
    }
}

/// A time-stamped property attached to an [`Entity`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EntityTag {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub last_seen: Timestamp,
    pub entity_id: EntityId,
    pub property: Property,
}

/// A time-stamped property attached to an [`Edge`].
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct EdgeTag {
    pub id: EntityId,
    pub created_at: Timestamp,
    pub last_seen: Timestamp,
    pub edge_id: EntityId,
    pub property: Property,
}
