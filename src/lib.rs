//! FreeNAS Share Driver
//!
//! Exposes NFS share lifecycle operations (create, delete, extend,
//! snapshot, clone, stats) as calls against a FreeNAS appliance's REST API.
//!
//! # Architecture
//!
//! ```text
//! ┌───────────────────────────────────────────────────────────────┐
//! │                  FreeNasDriver (host facade)                  │
//! ├───────────────────────────────────────────────────────────────┤
//! │                 ShareOrchestrator (lifecycle)                 │
//! │  ┌──────────────────┐            ┌──────────────────────────┐ │
//! │  │   Naming Rules   │            │    Capacity Reporter     │ │
//! │  └──────────────────┘            └──────────────────────────┘ │
//! ├───────────────────────────────────────────────────────────────┤
//! │            ApplianceClient (auth, outcome mapping)            │
//! ├───────────────────────────────────────────────────────────────┤
//! │              Transport port (reqwest in production)           │
//! └───────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`appliance`]: appliance client, transport and metrics
//! - [`driver`]: naming rules, orchestrator, capacity reporting, driver facade
//! - [`config`]: driver configuration
//! - [`domain`]: boundary types and the transport port
//! - [`error`]: error types

pub mod appliance;
pub mod config;
pub mod domain;
pub mod driver;
pub mod error;

// Re-export commonly used types
pub use appliance::{
    ApplianceClient, ApplianceMetrics, Command, CommandOutcome, CommandStatus,
    ConnectionDescriptor, ReqwestTransport,
};

pub use config::{AuthStyle, Compression, Dedupe, DriverConfig, TransportScheme};

pub use domain::ports::{
    AccessRule, ApplianceRequest, ApplianceResponse, HttpMethod, Location, PoolStats,
    ShareRecord, ShareStats, SnapshotRecord, SnapshotUpdate, Transport, TransportError,
};

pub use driver::{CapacityReport, FreeNasDriver, ShareOrchestrator, DRIVER_VERSION};

pub use error::{Error, ErrorAction, Result};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
