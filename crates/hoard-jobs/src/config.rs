//! Export manager configuration.

use hoard_types::EXPORT_TTL_SECS;
use serde::{Deserialize, Serialize};

/// Configuration for the [`crate::ExportManager`].
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ExporterConfig {
    /// Permission a user must hold to start (and, via
    /// [`crate::ExportManager::cancel_export_as`], cancel) exports.
    pub required_permission: String,
    /// Expiration applied to a job's keys once it is finished, in seconds.
    pub ttl_secs: u64,
}

impl Default for ExporterConfig {
    fn default() -> Self {
        Self {
            required_permission: "exporter".to_string(),
            ttl_secs: EXPORT_TTL_SECS,
        }
    }
}

impl ExporterConfig {
    /// Default configuration requiring `permission`.
    #[must_use]
    pub fn with_permission(permission: impl Into<String>) -> Self {
        Self {
            required_permission: permission.into(),
            ..Self::default()
        }
    }
}
