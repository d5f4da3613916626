//! FreeNAS Appliance Access
//!
//! - `client`: request building, authentication and outcome classification
//! - `transport`: reqwest implementation of the transport port
//! - `metrics`: Prometheus instrumentation for appliance round trips

pub mod client;
pub mod metrics;
pub mod transport;

#[cfg(test)]
pub(crate) mod testing;

pub use client::*;
pub use metrics::ApplianceMetrics;
pub use transport::ReqwestTransport;
