//! Health reporting for the two delegate stores.

use serde::{Deserialize, Serialize};

/// Health status for a store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    /// The store answered a trivial request within expectations.
    Healthy,
    /// The store answered but reported degraded operation.
    Degraded,
    /// The store could not be reached or returned an error.
    Unhealthy,
}

/// A health check result for one named store ("cache" or the
/// authoritative store's `GetDBType()`).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct HealthCheck {
    pub store: String,
    pub status: HealthStatus,
    pub message: Option<String>,
}

impl HealthCheck {
    pub fn healthy(store: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            status: HealthStatus::Healthy,
            message: None,
        }
    }

    pub fn unhealthy(store: impl Into<String>, message: impl Into<String>) -> Self {
        Self {
            store: store.into(),
            status: HealthStatus::Unhealthy,
            message: Some(message.into()),
        }
    }
}
