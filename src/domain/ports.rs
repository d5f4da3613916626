//! Domain Ports - Boundary definitions for the share driver
//!
//! The driver core only knows the [`Transport`] trait for talking to the
//! appliance and plain records for talking to the host framework.
//! Adapters implement the trait to provide concrete I/O.

use async_trait::async_trait;
use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::sync::Arc;
use thiserror::Error;

// =============================================================================
// Wire Types
// =============================================================================

/// HTTP method used against the appliance API
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "UPPERCASE")]
pub enum HttpMethod {
    Get,
    Post,
    Put,
    Delete,
}

impl HttpMethod {
    pub fn as_str(&self) -> &'static str {
        match self {
            HttpMethod::Get => "GET",
            HttpMethod::Post => "POST",
            HttpMethod::Put => "PUT",
            HttpMethod::Delete => "DELETE",
        }
    }
}

impl std::fmt::Display for HttpMethod {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A fully built request, ready to be sent by a [`Transport`]
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceRequest {
    pub method: HttpMethod,
    /// Absolute URL including the API root
    pub url: String,
    pub headers: BTreeMap<String, String>,
    /// JSON text for create/update, `None` for select/delete
    pub body: Option<String>,
}

/// Raw HTTP response as seen by the transport
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ApplianceResponse {
    pub status: u16,
    /// Reason phrase for the status code, if known
    pub reason: Option<String>,
    pub body: String,
}

impl ApplianceResponse {
    /// Shorthand for a `200 OK` response carrying `body`
    pub fn ok(body: impl Into<String>) -> Self {
        Self {
            status: 200,
            reason: Some("OK".to_string()),
            body: body.into(),
        }
    }

    pub fn is_success(&self) -> bool {
        (200..300).contains(&self.status)
    }
}

/// Failure to complete a round trip at all
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum TransportError {
    /// The connection could not be made or was dropped
    #[error("connection failed: {reason}")]
    Connection { errno: Option<i32>, reason: String },

    /// Anything the transport cannot put a name to
    #[error("transport failed: {0}")]
    Unclassified(String),
}

// =============================================================================
// Transport Port
// =============================================================================

/// Port for one request/response round trip against the appliance
///
/// Implementations must not retry; each call is one attempt.
#[async_trait]
pub trait Transport: Send + Sync {
    async fn send(
        &self,
        request: ApplianceRequest,
    ) -> std::result::Result<ApplianceResponse, TransportError>;
}

pub type TransportRef = Arc<dyn Transport>;

// =============================================================================
// Host Framework Records
// =============================================================================

/// A share as handed over by the host framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareRecord {
    pub name: String,
    /// Size in GB
    pub size: u64,
    pub share_id: String,
    pub share_proto: String,
}

/// A snapshot as handed over by the host framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotRecord {
    pub name: String,
    /// Name of the share the snapshot was taken from
    pub share_name: String,
    pub share: ShareRecord,
}

/// Externally reported access path of a share (`<host>:<absolute path>`)
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Location {
    pub path: String,
}

/// Access rule as handed over by the host framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AccessRule {
    pub access_type: String,
    pub access_to: String,
    pub access_level: String,
}

/// Model update returned after a snapshot was taken
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct SnapshotUpdate {
    pub provider_location: String,
}

// =============================================================================
// Stats Records
// =============================================================================

/// Capabilities and capacity of the single pool the driver exposes
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PoolStats {
    pub pool_name: String,
    pub total_capacity_gb: u64,
    pub free_capacity_gb: u64,
    pub snapshot_support: bool,
    pub create_share_from_snapshot_support: bool,
    pub reserved_percentage: u32,
    pub compression: bool,
    pub dedupe: bool,
    pub thin_provisioning: bool,
}

/// Stats record reported to the host framework
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ShareStats {
    pub vendor_name: String,
    pub storage_protocol: String,
    pub nfs_mount_point_base: String,
    pub pools: Vec<PoolStats>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub driver_version: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub share_backend_name: Option<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub volume_backend_name: Option<String>,
}
