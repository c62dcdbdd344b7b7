//! Identity and timestamp primitives shared by every store.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;

/// Opaque object identifier, minted by whichever store created the object.
///
/// Two stores never share an ID space: the same logical asset may have a
/// different [`EntityId`] in the cache store than it has in the
/// authoritative store. The only sanctioned way to cross from one ID space
/// to the other is the bookkeeping binding tags in
/// `assetgraph_store::cache::bookkeeping`.
#[derive(Debug, Clone, PartialEq, Eq, PartialOrd, Ord, Hash, Default)]
pub struct EntityId(String);

impl EntityId {
    /// Wrap an owned string as an entity id.
    pub fn new(id: impl Into<String>) -> Self {
        Self(id.into())
    }

    /// Borrow the underlying string.
    pub fn as_str(&self) -> &str {
        &self.0
    }

    /// Returns true if this id is the empty string.
    ///
    /// Bookkeeping primitives (`bind_entity`/`bind_edge`) reject empty
    /// reference ids as an invalid-argument error; this helper centralizes
    /// that check.
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }
}

impl fmt::Display for EntityId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

impl FromStr for EntityId {
    type Err = std::convert::Infallible;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Ok(Self(s.to_string()))
    }
}

impl From<String> for EntityId {
    fn from(s: String) -> Self {
        Self(s)
    }
}

impl From<&str> for EntityId {
    fn from(s: &str) -> Self {
        Self(s.to_string())
    }
}

impl Serialize for EntityId {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: serde::Serializer,
    {
        self.0.serialize(serializer)
    }
}

impl<'de> Deserialize<'de> for EntityId {
    fn deserialize<D>(deserializer: D) -> Result<Self, D::Error>
    where
        D: serde::Deserializer<'de>,
    {
        String::deserialize(deserializer).map(Self)
    }
}

/// UTC timestamp used throughout the model. `created_at`/`last_seen` on
/// every object, and the `timestamp` field of bookkeeping tags, are all
/// this type.
pub type Timestamp = DateTime<Utc>;

/// Returns the current wall-clock time.
///
/// Centralized so that tests can reason about "the moment a CacheRepo was
/// constructed" without every call site reaching for `chrono::Utc::now()`
/// directly.
pub fn now() -> Timestamp {
    Utc::now()
}

/// The timestamp store-level `since` filters treat as "no lower bound".
///
/// Store implementations filter rows by `last_seen >= since`; passing this
/// value (the Unix epoch) is equivalent to "since = 0 disables the filter"
/// without the trait needing a separate `Option<Timestamp>` signature.
pub fn since_epoch() -> Timestamp {
    DateTime::<Utc>::from_timestamp(0, 0).expect("epoch zero is always a valid timestamp")
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn entity_id_displays_as_raw_string() {
        let id = EntityId::new("abc-123");
        assert_eq!(id.to_string(), "abc-123");
        assert_eq!(id.as_str(), "abc-123");
    }

    #[test]
    fn entity_id_empty_detection() {
        assert!(EntityId::new("").is_empty());
        assert!(!EntityId::new("x").is_empty());
    }

    #[test]
    fn entity_id_serde_roundtrip() {
        let id = EntityId::new("fqdn:owasp.org");
        let json = serde_json::to_string(&id).unwrap();
        assert_eq!(json, "\"fqdn:owasp.org\"");
        let back: EntityId = serde_json::from_str(&json).unwrap();
        assert_eq!(id, back);
    }
}
