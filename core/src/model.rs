//! The asset/relation/property model the cache operates over.
//!
//! The full open asset-model hierarchy is deliberately scoped out
//! of this crate. What remains is the minimal, concrete cast needed to
//! exercise every cache code path and to write meaningful tests: a handful
//! of `Asset` variants, a handful of `Relation` variants, and the
//! `Property` sum type (user properties plus the structurally-distinct
//! bookkeeping payload).

use crate::identity::{EntityId, Timestamp};
use serde::{Deserialize, Serialize};
use std::fmt;

// ============================================================================
// ASSET
// ============================================================================

/// Type tag for an [`Asset`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AssetType {
    Fqdn,
    IpAddress,
    AutonomousSystem,
    Certificate,
    Organization,
}

impl fmt::Display for AssetType {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            AssetType::Fqdn => "fqdn",
            AssetType::IpAddress => "ip_address",
            AssetType::AutonomousSystem => "autonomous_system",
            AssetType::Certificate => "certificate",
            AssetType::Organization => "organization",
        };
        write!(f, "{s}")
    }
}

/// A fully-qualified domain name.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FqdnAsset {
    pub name: String,
}

/// An IP address (v4 or v6), stored in its canonical string form.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct IpAddressAsset {
    pub address: String,
}

/// An autonomous system number.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AutonomousSystemAsset {
    pub number: u32,
}

/// A TLS certificate, identified by serial number plus issuing-subject CN.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CertificateAsset {
    pub serial_number: String,
    pub subject_common_name: String,
}

/// An organization (registrant, ASN holder, etc).
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OrganizationAsset {
    pub name: String,
}

/// A reconnaissance asset: the payload an [`crate::entities::Entity`] carries.
///
/// Equality/content-key is by [`Asset::content_key`], never by derived
/// struct equality or by id — two stores mint different ids for the same
/// logical asset, and `content_key()` is the only thing that correlates
/// them.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Asset {
    Fqdn(FqdnAsset),
    IpAddress(IpAddressAsset),
    AutonomousSystem(AutonomousSystemAsset),
    Certificate(CertificateAsset),
    Organization(OrganizationAsset),
}

impl Asset {
    pub fn fqdn(name: impl Into<String>) -> Self {
        Asset::Fqdn(FqdnAsset { name: name.into() })
    }

    pub fn ip_address(address: impl Into<String>) -> Self {
        Asset::IpAddress(IpAddressAsset {
            address: address.into(),
        })
    }

    pub fn autonomous_system(number: u32) -> Self {
        Asset::AutonomousSystem(AutonomousSystemAsset { number })
    }

    pub fn certificate(serial_number: impl Into<String>, subject_common_name: impl Into<String>) -> Self {
        Asset::Certificate(CertificateAsset {
            serial_number: serial_number.into(),
            subject_common_name: subject_common_name.into(),
        })
    }

    pub fn organization(name: impl Into<String>) -> Self {
        Asset::Organization(OrganizationAsset { name: name.into() })
    }

    /// The type tag, used by `FindEntitiesByType`.
    pub fn asset_type(&self) -> AssetType {
        match self {
            Asset::Fqdn(_) => AssetType::Fqdn,
            Asset::IpAddress(_) => AssetType::IpAddress,
            Asset::AutonomousSystem(_) => AssetType::AutonomousSystem,
            Asset::Certificate(_) => AssetType::Certificate,
            Asset::Organization(_) => AssetType::Organization,
        }
    }

    /// Deterministic content-key projection used for cross-store equality
    /// lookups (`FindEntitiesByContent`). Two `Asset`s denote the same
    /// logical asset iff their content keys match.
    pub fn content_key(&self) -> String {
        match self {
            Asset::Fqdn(a) => format!("fqdn:{}", a.name.to_ascii_lowercase()),
            Asset::IpAddress(a) => format!("ip_address:{}", a.address),
            Asset::AutonomousSystem(a) => format!("autonomous_system:{}", a.number),
            Asset::Certificate(a) => {
                format!("certificate:{}:{}", a.serial_number, a.subject_common_name)
            }
            Asset::Organization(a) => format!("organization:{}", a.name.to_ascii_lowercase()),
        }
    }

    /// Deterministic serialization, e.g. for hashing or wire transfer.
    pub fn serialize(&self) -> Vec<u8> {
        serde_json::to_vec(self).expect("Asset serialization is infallible for these shapes")
    }
}

// ============================================================================
// RELATION
// ============================================================================

/// Type tag for a [`Relation`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum RelationType {
    BasicDns,
    Port,
    Srv,
    Simple,
}

/// A DNS resource-record relation (e.g. `A`, `CNAME`, `NS`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BasicDnsRelation {
    pub name: String,
    pub rr_type: u16,
    pub class: u16,
    pub ttl: u32,
}

/// A relation that names an open port and protocol.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PortRelation {
    pub port: u16,
    pub protocol: String,
}

/// A DNS SRV-record relation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SrvRelation {
    pub priority: u16,
    pub weight: u16,
    pub port: u16,
}

/// A bare named relation with no further structure.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleRelation {
    pub name: String,
}

/// A typed, directed relationship between two entities.
///
/// `PartialEq` is derived, giving field-by-field structural equality per
/// variant — the "deep equality" needed for matching
/// edges across independently-minted ID spaces. Two `Relation`s are never
/// compared by identity; only by this structural equality.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Relation {
    BasicDns(BasicDnsRelation),
    Port(PortRelation),
    Srv(SrvRelation),
    Simple(SimpleRelation),
}

impl Relation {
    pub fn basic_dns(name: impl Into<String>, rr_type: u16, class: u16, ttl: u32) -> Self {
        Relation::BasicDns(BasicDnsRelation {
            name: name.into(),
            rr_type,
            class,
            ttl,
        })
    }

    pub fn port(port: u16, protocol: impl Into<String>) -> Self {
        Relation::Port(PortRelation {
            port,
            protocol: protocol.into(),
        })
    }

    pub fn srv(priority: u16, weight: u16, port: u16) -> Self {
        Relation::Srv(SrvRelation {
            priority,
            weight,
            port,
        })
    }

    pub fn simple(name: impl Into<String>) -> Self {
        Relation::Simple(SimpleRelation { name: name.into() })
    }

    /// The label used for traversal filtering (`IncomingEdges`/`OutgoingEdges`
    /// take a list of labels).
    pub fn label(&self) -> &str {
        match self {
            Relation::BasicDns(r) => &r.name,
            Relation::Port(_) => "port",
            Relation::Srv(_) => "srv",
            Relation::Simple(r) => &r.name,
        }
    }

    pub fn relation_type(&self) -> RelationType {
        match self {
            Relation::BasicDns(_) => RelationType::BasicDns,
            Relation::Port(_) => RelationType::Port,
            Relation::Srv(_) => RelationType::Srv,
            Relation::Simple(_) => RelationType::Simple,
        }
    }

    /// Structural (deep) equality, spelled out for call sites that want to
    /// be explicit about which equality they mean.
    pub fn deep_eq(&self, other: &Relation) -> bool {
        self == other
    }
}

// ============================================================================
// PROPERTY
// ============================================================================

/// Type tag for a [`Property`] variant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum PropertyType {
    Simple,
    Cache,
}

/// A user-defined, time-stamped property on an entity or edge.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SimpleProperty {
    pub name: String,
    pub value: String,
}

/// The bookkeeping payload the cache attaches to its own objects (see
/// "CacheProperty" bookkeeping, an intentionally distinct payload).
///
/// This is kept as a *distinct* `Property` variant rather than reusing
/// [`SimpleProperty`]'s `(name, value)` shape: a `SimpleProperty` whose
/// value happens to equal an authoritative id would otherwise be
/// indistinguishable from a real binding tag. Bookkeeping code always
/// matches on `Property::Cache(..)` directly and never reads
/// [`Property::value`] to recover `ref_id`.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CacheProperty {
    pub name: &'static str,
    pub ref_id: EntityId,
    pub timestamp: Timestamp,
}

/// Either a user property or a cache bookkeeping tag.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum Property {
    Simple(SimpleProperty),
    Cache(CacheProperty),
}

impl Property {
    pub fn simple(name: impl Into<String>, value: impl Into<String>) -> Self {
        Property::Simple(SimpleProperty {
            name: name.into(),
            value: value.into(),
        })
    }

    pub fn cache(name: &'static str, ref_id: EntityId, timestamp: Timestamp) -> Self {
        Property::Cache(CacheProperty {
            name,
            ref_id,
            timestamp,
        })
    }

    pub fn name(&self) -> &str {
        match self {
            Property::Simple(p) => &p.name,
            Property::Cache(p) => p.name,
        }
    }

    /// A string projection of the value. For [`Property::Cache`] this
    /// returns the reference id's string form; callers implementing the
    /// bookkeeping protocol should match on the variant instead of relying
    /// on this (see the doc comment on [`CacheProperty`]).
    pub fn value(&self) -> String {
        match self {
            Property::Simple(p) => p.value.clone(),
            Property::Cache(p) => p.ref_id.to_string(),
        }
    }

    pub fn property_type(&self) -> PropertyType {
        match self {
            Property::Simple(_) => PropertyType::Simple,
            Property::Cache(_) => PropertyType::Cache,
        }
    }

    /// True if this is a [`Property::Cache`] bookkeeping tag with the given
    /// name.
    pub fn is_cache_tag_named(&self, name: &str) -> bool {
        matches!(self, Property::Cache(p) if p.name == name)
    }

    pub fn as_cache(&self) -> Option<&CacheProperty> {
        match self {
            Property::Cache(p) => Some(p),
            _ => None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn content_key_is_case_insensitive_for_fqdn() {
        let a = Asset::fqdn("OWASP.org");
        let b = Asset::fqdn("owasp.org");
        assert_eq!(a.content_key(), b.content_key());
    }

    #[test]
    fn different_assets_have_different_content_keys() {
        let a = Asset::fqdn("owasp.org");
        let b = Asset::ip_address("1.2.3.4");
        assert_ne!(a.content_key(), b.content_key());
    }

    #[test]
    fn relation_deep_equality_is_structural() {
        let a = Relation::basic_dns("dns_record", 5, 1, 3600);
        let b = Relation::basic_dns("dns_record", 5, 1, 3600);
        let c = Relation::basic_dns("dns_record", 5, 1, 60);
        assert!(a.deep_eq(&b));
        assert!(!a.deep_eq(&c));
    }

    #[test]
    fn cache_property_is_distinct_from_simple_property() {
        let simple = Property::simple("note", "some-ref-id");
        let cache = Property::cache(
            "cache_create_entity",
            EntityId::new("some-ref-id"),
            crate::identity::now(),
        );
        assert_eq!(simple.value(), cache.value());
        assert_ne!(simple, cache);
        assert_eq!(cache.property_type(), PropertyType::Cache);
        assert_eq!(simple.property_type(), PropertyType::Simple);
    }
}
