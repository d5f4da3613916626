//! Naming rules
//!
//! Maps the host framework's share and snapshot identifiers onto the
//! dataset and snapshot names used on the appliance.

use crate::error::{Error, Result};
use serde::Serialize;

/// Prefix of every dataset the driver creates
pub const SHARE_PREFIX: &str = "agtshare-";

/// Prefix of every snapshot the driver creates
pub const SNAPSHOT_PREFIX: &str = "agtsnap-";

const BYTES_PER_GIB: u64 = 1024 * 1024 * 1024;

/// Dataset name and mountpoint plus the per-operation properties sent with it
///
/// Unset properties are left out of the serialized body.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct DatasetDescriptor {
    pub name: String,
    pub mountpoint: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub refquota: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dedup: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compression: Option<String>,
}

impl DatasetDescriptor {
    /// Set the reference quota to `size_gb` gigabytes
    pub fn with_refquota(mut self, size_gb: u64) -> Self {
        self.refquota = Some(format!("{}G", size_gb));
        self
    }
}

/// Split `identifier` on '-' and require at least `required` segments
fn segments(identifier: &str, required: usize) -> Result<Vec<&str>> {
    let parts: Vec<&str> = identifier.split('-').collect();
    if parts.len() < required {
        return Err(Error::InvalidIdentifier {
            identifier: identifier.to_string(),
            expected_segments: required,
        });
    }
    Ok(parts)
}

/// Derive the appliance dataset for a share: prefix + second segment of the
/// share name, mounted directly under `mount_base`.
pub fn derive_dataset_identity(share_name: &str, mount_base: &str) -> Result<DatasetDescriptor> {
    let parts = segments(share_name, 2)?;
    let name = format!("{}{}", SHARE_PREFIX, parts[1]);
    let mountpoint = format!("{}/{}", mount_base, name);

    Ok(DatasetDescriptor {
        name,
        mountpoint,
        refquota: None,
        dedup: None,
        compression: None,
    })
}

/// Derive the appliance snapshot name: prefix + third segment of the
/// snapshot name.
pub fn derive_snapshot_identity(snapshot_name: &str) -> Result<String> {
    let parts = segments(snapshot_name, 3)?;
    Ok(format!("{}{}", SNAPSHOT_PREFIX, parts[2]))
}

/// Whole gibibytes in `bytes`, truncated
pub fn bytes_to_reporting_unit(bytes: u64) -> u64 {
    bytes / BYTES_PER_GIB
}
