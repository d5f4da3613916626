//! FreeNAS share driver
//!
//! The object the host framework talks to. It owns the configuration,
//! builds the orchestrator on `do_setup` and stamps driver identity onto
//! the stats it reports.

use crate::appliance::metrics::ApplianceMetrics;
use crate::appliance::transport::ReqwestTransport;
use crate::config::DriverConfig;
use crate::domain::ports::{
    AccessRule, Location, ShareRecord, ShareStats, SnapshotRecord, SnapshotUpdate, TransportRef,
};
use crate::driver::orchestrator::ShareOrchestrator;
use crate::error::{Error, Result};
use parking_lot::RwLock;
use std::sync::Arc;
use tracing::debug;

/// Driver version reported in stats
pub const DRIVER_VERSION: &str = "1.0";

/// Backend name used when none is configured
pub const DEFAULT_BACKEND_NAME: &str = "AgattiL";

/// FreeNAS driver for NFS shares
pub struct FreeNasDriver {
    config: DriverConfig,
    transport: TransportRef,
    metrics: Option<Arc<ApplianceMetrics>>,
    helper: RwLock<Option<Arc<ShareOrchestrator>>>,
}

impl std::fmt::Debug for FreeNasDriver {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("FreeNasDriver")
            .field("hostname", &self.config.hostname)
            .field("share_backend_name", &self.share_backend_name())
            .field("set_up", &self.helper.read().is_some())
            .finish_non_exhaustive()
    }
}

impl FreeNasDriver {
    /// Create a driver talking to the appliance over HTTP
    pub fn new(config: DriverConfig) -> Result<Self> {
        let transport: TransportRef = Arc::new(ReqwestTransport::new()?);
        Self::with_transport(config, transport)
    }

    /// Create a driver on top of an arbitrary transport
    pub fn with_transport(config: DriverConfig, transport: TransportRef) -> Result<Self> {
        debug!("Initializing FreeNAS NFS driver.");
        config.validate()?;

        Ok(Self {
            config,
            transport,
            metrics: None,
            helper: RwLock::new(None),
        })
    }

    pub fn with_metrics(mut self, metrics: Arc<ApplianceMetrics>) -> Self {
        self.metrics = Some(metrics);
        self
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn share_backend_name(&self) -> &str {
        self.config
            .share_backend_name
            .as_deref()
            .filter(|name| !name.is_empty())
            .unwrap_or(DEFAULT_BACKEND_NAME)
    }

    /// Build the appliance client; must run before any other operation
    pub fn do_setup(&self) -> Result<()> {
        debug!("Setting up the FreeNAS plugin.");
        let helper = ShareOrchestrator::setup(
            self.config.clone(),
            self.transport.clone(),
            self.metrics.clone(),
        )?;
        *self.helper.write() = Some(Arc::new(helper));
        Ok(())
    }

    fn helper(&self) -> Result<Arc<ShareOrchestrator>> {
        self.helper
            .read()
            .clone()
            .ok_or_else(|| Error::Configuration("driver not set up".into()))
    }

    pub async fn check_for_setup_error(&self) -> Result<()> {
        self.helper()?.check_setup().await
    }

    pub async fn create_share(&self, share: &ShareRecord) -> Result<Vec<Location>> {
        debug!("Share Name: {}", share.name);
        self.helper()?.create_share(share).await
    }

    pub async fn create_share_from_snapshot(
        &self,
        share: &ShareRecord,
        snapshot: &SnapshotRecord,
    ) -> Result<Vec<Location>> {
        debug!(
            "Old Share Name: {} Clone Share name {}",
            snapshot.share_name, share.name
        );
        self.helper()?.create_share_from_snapshot(share, snapshot).await
    }

    pub async fn delete_share(&self, share: &ShareRecord) -> Result<()> {
        debug!("Deleting share {}.", share.name);
        self.helper()?.delete_share(&share.name).await
    }

    pub async fn extend_share(&self, share: &ShareRecord, new_size: u64) -> Result<()> {
        debug!("Extending share {} to {}G.", share.name, new_size);
        self.helper()?.extend_share(&share.name, new_size).await
    }

    pub async fn create_snapshot(&self, snapshot: &SnapshotRecord) -> Result<SnapshotUpdate> {
        debug!("Creating a snapshot of share {}", snapshot.share_name);
        self.helper()?.create_snapshot(snapshot).await
    }

    pub async fn delete_snapshot(&self, snapshot: &SnapshotRecord) -> Result<()> {
        debug!("Deleting a snapshot of share {}.", snapshot.share_name);
        self.helper()?.delete_snapshot(snapshot).await
    }

    /// Shares are exported with the appliance's default access; rules are
    /// accepted and ignored.
    pub async fn update_access(&self, share: &ShareRecord, access_rules: &[AccessRule]) -> Result<()> {
        debug!(
            "Ignoring {} access rule(s) for share {}",
            access_rules.len(),
            share.name
        );
        Ok(())
    }

    pub async fn update_share_stats(&self) -> Result<ShareStats> {
        let mut stats = self.helper()?.update_stats().await?;
        stats.driver_version = Some(DRIVER_VERSION.to_string());
        stats.share_backend_name = Some(self.share_backend_name().to_string());
        stats.volume_backend_name = Some(self.config.volume_backend_name.clone());
        Ok(stats)
    }
}
