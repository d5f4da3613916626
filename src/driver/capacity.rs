//! Capacity reporter
//!
//! Reads volume usage from the appliance and reports it in whole GiB.

use crate::appliance::client::{ApplianceClient, Command, REST_API_VOLUME};
use crate::driver::naming::bytes_to_reporting_unit;
use crate::error::Result;
use serde::Deserialize;
use tracing::debug;

/// Byte counters the appliance reports for a volume
#[derive(Debug, Clone, Copy, Deserialize)]
struct VolumeUsage {
    avail: u64,
    used: u64,
}

/// Volume capacity in GiB, truncated
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct CapacityReport {
    pub total_gb: u64,
    pub free_gb: u64,
    pub allocated_gb: u64,
}

impl CapacityReport {
    pub fn from_bytes(avail: u64, used: u64) -> Self {
        Self {
            total_gb: bytes_to_reporting_unit(avail.saturating_add(used)),
            free_gb: bytes_to_reporting_unit(avail),
            allocated_gb: bytes_to_reporting_unit(used),
        }
    }
}

/// Query the usage of `volume` on the appliance
pub async fn volume_capacity(client: &ApplianceClient, volume: &str) -> Result<CapacityReport> {
    let request_urn = format!("{}/{}/", REST_API_VOLUME, volume);
    debug!("request_urn : {}", request_urn);

    let payload = client
        .invoke(Command::Select, &request_urn, None)
        .await?
        .into_result("Error while reading volume usage")?;

    let usage: VolumeUsage = serde_json::from_str(&payload)?;
    Ok(CapacityReport::from_bytes(usage.avail, usage.used))
}
