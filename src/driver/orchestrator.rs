//! Share Request Orchestrator
//!
//! Implements every share and snapshot lifecycle operation as a sequence
//! of appliance calls:
//! - Dataset create/delete/quota update under the configured volume
//! - NFS export of freshly created datasets and clones
//! - Snapshot create/delete and clone-from-snapshot
//! - Capability and capacity reporting
//!
//! Each step must report `ok` before the next one is issued.

use crate::appliance::client::{
    ApplianceClient, Command, ConnectionDescriptor, CLONE, DATASETS, REST_API_SHARE,
    REST_API_SNAPSHOT, REST_API_VOLUME,
};
use crate::appliance::metrics::ApplianceMetrics;
use crate::config::{DriverConfig, REQUIRED_VOLUME_NAME};
use crate::domain::ports::{
    Location, PoolStats, ShareRecord, ShareStats, SnapshotRecord, SnapshotUpdate, TransportRef,
};
use crate::driver::capacity::volume_capacity;
use crate::driver::naming::{derive_dataset_identity, derive_snapshot_identity};
use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::{debug, info};

// =============================================================================
// Request Bodies
// =============================================================================

#[derive(Debug, Serialize)]
struct NfsExportParams {
    nfs_paths: Vec<String>,
}

#[derive(Debug, Serialize)]
struct SnapshotParams {
    dataset: String,
    name: String,
}

#[derive(Debug, Serialize)]
struct CloneParams {
    name: String,
}

/// Subset of the volume resource checked during setup
#[derive(Debug, Deserialize)]
struct VolumeInfo {
    #[serde(default)]
    name: Option<String>,
}

// =============================================================================
// Orchestrator
// =============================================================================

/// Translates lifecycle operations into appliance requests
#[derive(Debug)]
pub struct ShareOrchestrator {
    config: DriverConfig,
    client: ApplianceClient,
}

impl ShareOrchestrator {
    pub fn new(config: DriverConfig, client: ApplianceClient) -> Self {
        Self { config, client }
    }

    /// Build the appliance client from configuration
    pub fn setup(
        config: DriverConfig,
        transport: TransportRef,
        metrics: Option<Arc<ApplianceMetrics>>,
    ) -> Result<Self> {
        config.validate()?;
        debug!("FreeNAS server: {}", config.hostname);

        let mut client = ApplianceClient::new(ConnectionDescriptor::from_config(&config), transport);
        if let Some(metrics) = metrics {
            client = client.with_metrics(metrics);
        }
        Ok(Self::new(config, client))
    }

    pub fn config(&self) -> &DriverConfig {
        &self.config
    }

    pub fn client(&self) -> &ApplianceClient {
        &self.client
    }

    /// Check the configured and the actual top-level volume are the required one
    pub async fn check_setup(&self) -> Result<()> {
        if self.config.dataset != REQUIRED_VOLUME_NAME {
            return Err(Error::Configuration(format!(
                "Volume name must be {} for creating share, got {}",
                REQUIRED_VOLUME_NAME, self.config.dataset
            )));
        }

        let payload = self
            .client
            .invoke(Command::Select, &self.volume_path(), None)
            .await?
            .into_result("Error while reading top level volume")?;

        let reported = serde_json::from_str::<VolumeInfo>(&payload)
            .ok()
            .and_then(|volume| volume.name);
        match reported.as_deref() {
            Some(REQUIRED_VOLUME_NAME) => Ok(()),
            Some(name) => Err(Error::appliance(format!(
                "Top Level volume name must be {}, appliance reports {}",
                REQUIRED_VOLUME_NAME, name
            ))),
            None => Err(Error::appliance(format!(
                "Top Level volume name must be {}, appliance reports no name",
                REQUIRED_VOLUME_NAME
            ))),
        }
    }

    /// Create a dataset for `share`, export it over NFS and return its location
    pub async fn create_share(&self, share: &ShareRecord) -> Result<Vec<Location>> {
        debug!("create share: {}", share.name);
        self.ensure_protocol(&share.share_proto)?;

        let mut dataset = derive_dataset_identity(&share.name, &self.config.mount_path())?
            .with_refquota(share.size);
        dataset.dedup = Some(self.config.dataset_dedupe.to_string());
        dataset.compression = Some(self.config.dataset_compression.to_string());

        let body = serde_json::to_string(&dataset)?;
        debug!("create dataset params : {}", body);

        let ds_req = format!("{}/", self.datasets_path());
        self.client
            .invoke(Command::Create, &ds_req, Some(body))
            .await?
            .into_result("Error while creating dataset")?;

        info!("Created share {} for shareID {}", dataset.name, share.share_id);

        self.export_nfs(&dataset.mountpoint).await?;
        let path = self.share_path(&dataset.name);
        Ok(vec![self.location(&path, &share.share_proto)?])
    }

    /// Delete the dataset backing `share_name`
    pub async fn delete_share(&self, share_name: &str) -> Result<()> {
        let dataset = derive_dataset_identity(share_name, &self.config.mount_path())?;
        let del_req = format!("{}/{}/", self.datasets_path(), dataset.name);
        debug!("Delete dataset request : {}", del_req);

        self.client
            .invoke(Command::Delete, &del_req, None)
            .await?
            .into_result("Error while deleting dataset")?;

        info!("Deleted share dataset {}", dataset.name);
        Ok(())
    }

    /// Set the reference quota of `share_name` to `new_size` GB
    pub async fn extend_share(&self, share_name: &str, new_size: u64) -> Result<()> {
        let dataset =
            derive_dataset_identity(share_name, &self.config.mount_path())?.with_refquota(new_size);
        let qt_req = format!("{}/{}", self.datasets_path(), dataset.name);

        // The appliance applies quota changes on POST to the item resource.
        self.client
            .invoke(Command::Create, &qt_req, Some(serde_json::to_string(&dataset)?))
            .await?
            .into_result("Error while updating dataset quota")?;

        info!("Extended share {} to {}G", dataset.name, new_size);
        Ok(())
    }

    /// Snapshot the dataset of the snapshot's parent share
    pub async fn create_snapshot(&self, snapshot: &SnapshotRecord) -> Result<SnapshotUpdate> {
        let share = derive_dataset_identity(&snapshot.share.name, &self.config.mount_path())?;
        let params = SnapshotParams {
            dataset: format!("{}/{}", self.config.dataset, share.name),
            name: derive_snapshot_identity(&snapshot.name)?,
        };

        let body = serde_json::to_string(&params)?;
        debug!("Snaps params {}", body);

        let snap_req = format!("{}/", REST_API_SNAPSHOT);
        self.client
            .invoke(Command::Create, &snap_req, Some(body))
            .await?
            .into_result("Error while creating snapshot")?;

        info!("Created snapshot {}@{}", params.dataset, params.name);
        Ok(SnapshotUpdate {
            provider_location: format!("{}@{}", self.share_path(&share.name), params.name),
        })
    }

    pub async fn delete_snapshot(&self, snapshot: &SnapshotRecord) -> Result<()> {
        let share = derive_dataset_identity(&snapshot.share.name, &self.config.mount_path())?;
        let snap_name = derive_snapshot_identity(&snapshot.name)?;

        let request_urn = format!(
            "{}/{}/{}@{}/",
            REST_API_SNAPSHOT, self.config.dataset, share.name, snap_name
        );
        debug!("Snaps del req {}", request_urn);

        self.client
            .invoke(Command::Delete, &request_urn, None)
            .await?
            .into_result("Error while deleting snapshot")?;

        info!("Deleted snapshot {}@{}", share.name, snap_name);
        Ok(())
    }

    /// Clone `snapshot` into a new dataset for `share`, export it and
    /// return its location
    pub async fn create_share_from_snapshot(
        &self,
        share: &ShareRecord,
        snapshot: &SnapshotRecord,
    ) -> Result<Vec<Location>> {
        self.ensure_protocol(&share.share_proto)?;

        let mount_path = self.config.mount_path();
        let base = derive_dataset_identity(&snapshot.share_name, &mount_path)?;
        let snap_name = derive_snapshot_identity(&snapshot.name)?;
        let clone = derive_dataset_identity(&share.name, &mount_path)?;

        let params = CloneParams {
            name: format!("{}/{}", self.config.dataset, clone.name),
        };
        let clone_req = format!(
            "{}/{}/{}@{}/{}/",
            REST_API_SNAPSHOT, self.config.dataset, base.name, snap_name, CLONE
        );

        self.client
            .invoke(Command::Create, &clone_req, Some(serde_json::to_string(&params)?))
            .await?
            .into_result("Error while cloning snapshot")?;

        info!(
            "Cloned {}@{} into {} for shareID {}",
            base.name, snap_name, clone.name, share.share_id
        );

        self.export_nfs(&clone.mountpoint).await?;
        let path = self.share_path(&clone.name);
        Ok(vec![self.location(&path, &share.share_proto)?])
    }

    /// Capability and capacity record for the configured volume
    pub async fn update_stats(&self) -> Result<ShareStats> {
        let capacity = volume_capacity(&self.client, &self.config.dataset).await?;

        Ok(ShareStats {
            vendor_name: self.config.vendor_name.clone(),
            storage_protocol: self.config.storage_protocol.clone(),
            nfs_mount_point_base: self.config.mount_point_base.clone(),
            pools: vec![PoolStats {
                pool_name: self.config.dataset.clone(),
                total_capacity_gb: capacity.total_gb,
                free_capacity_gb: capacity.free_gb,
                snapshot_support: true,
                create_share_from_snapshot_support: true,
                reserved_percentage: self.config.reserved_percentage,
                compression: self.config.dataset_compression.is_enabled(),
                dedupe: self.config.dataset_dedupe.is_enabled(),
                thin_provisioning: self.config.thin_provisioning,
            }],
            driver_version: None,
            share_backend_name: None,
            volume_backend_name: None,
        })
    }

    // =========================================================================
    // Helpers
    // =========================================================================

    async fn export_nfs(&self, mountpoint: &str) -> Result<()> {
        let params = NfsExportParams {
            nfs_paths: vec![mountpoint.to_string()],
        };
        let body = serde_json::to_string(&params)?;
        debug!("create share params : {}", body);

        let nfs_req = format!("{}/", REST_API_SHARE);
        self.client
            .invoke(Command::Create, &nfs_req, Some(body))
            .await?
            .into_result("Error while creating NFS share")?;
        Ok(())
    }

    fn volume_path(&self) -> String {
        format!("{}/{}", REST_API_VOLUME, self.config.dataset)
    }

    fn datasets_path(&self) -> String {
        format!("{}/{}", self.volume_path(), DATASETS)
    }

    fn share_path(&self, dataset_name: &str) -> String {
        format!("{}/{}", self.config.mount_path(), dataset_name)
    }

    fn ensure_protocol(&self, protocol: &str) -> Result<()> {
        if protocol == self.config.storage_protocol {
            Ok(())
        } else {
            Err(Error::InvalidShare(format!(
                "Only {} protocol is currently supported, got {}",
                self.config.storage_protocol, protocol
            )))
        }
    }

    fn location(&self, path: &str, protocol: &str) -> Result<Location> {
        self.ensure_protocol(protocol)?;
        Ok(Location {
            path: format!("{}:{}", self.config.hostname, path),
        })
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::appliance::testing::MockTransport;
    use crate::config::{Compression, Dedupe};
    use crate::domain::ports::{HttpMethod, TransportError};
    use assert_matches::assert_matches;

    const BASE: &str = "http://1.1.1.1:3000/api/v1.0";

    fn test_config() -> DriverConfig {
        DriverConfig {
            hostname: "1.1.1.1".into(),
            login: Some("user".into()),
            password: Some("pass".into()),
            dataset_compression: Compression::On,
            dataset_dedupe: Dedupe::On,
            thin_provisioning: false,
            ..Default::default()
        }
    }

    fn orchestrator(config: DriverConfig, transport: &Arc<MockTransport>) -> ShareOrchestrator {
        ShareOrchestrator::setup(config, transport.clone(), None).unwrap()
    }

    fn share(name: &str) -> ShareRecord {
        ShareRecord {
            name: name.into(),
            size: 1,
            share_id: name.into(),
            share_proto: "NFS".into(),
        }
    }

    fn snapshot() -> SnapshotRecord {
        SnapshotRecord {
            name: "share-snap-1234-4567".into(),
            share_name: "share-1234-4567-78787".into(),
            share: share("share-1234-4567-78787"),
        }
    }

    #[test]
    fn test_setup_validates_config() {
        let transport = MockTransport::new();
        let config = DriverConfig {
            hostname: String::new(),
            ..test_config()
        };
        assert_matches!(
            ShareOrchestrator::setup(config, transport, None),
            Err(Error::Configuration(_))
        );
    }

    #[tokio::test]
    async fn test_check_setup_wrong_configured_volume() {
        let transport = MockTransport::new();
        let config = DriverConfig {
            dataset: "testvol".into(),
            ..test_config()
        };

        let err = orchestrator(config, &transport).check_setup().await.unwrap_err();
        assert_matches!(err, Error::Configuration(_));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_check_setup_wrong_appliance_volume() {
        let transport = MockTransport::new();
        transport.push_ok(r#"{"name":"adsfsdf"}"#);

        let err = orchestrator(test_config(), &transport)
            .check_setup()
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { .. });
    }

    #[tokio::test]
    async fn test_check_setup_volume_without_name() {
        for payload in [r#"{"avail":1,"used":1}"#, r#"{"name":null}"#, "[]", "not json"] {
            let transport = MockTransport::new();
            transport.push_ok(payload);

            let err = orchestrator(test_config(), &transport)
                .check_setup()
                .await
                .unwrap_err();
            assert_matches!(err, Error::Appliance { .. }, "payload {}", payload);
        }
    }

    #[tokio::test]
    async fn test_check_setup_ok() {
        let transport = MockTransport::new();
        transport.push_ok(r#"{"name":"agattivol","avail":1,"used":1}"#);

        orchestrator(test_config(), &transport).check_setup().await.unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Get);
        assert_eq!(request.url, format!("{}/storage/volume/agattivol", BASE));
    }

    #[tokio::test]
    async fn test_check_setup_unreachable_appliance() {
        let transport = MockTransport::new();
        transport.push_failure(TransportError::Connection {
            errno: Some(113),
            reason: "No route to host".into(),
        });

        let err = orchestrator(test_config(), &transport)
            .check_setup()
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { ref message, .. } if message.contains("113:No route to host"));
    }

    #[tokio::test]
    async fn test_create_share() {
        let transport = MockTransport::new();
        let locations = orchestrator(test_config(), &transport)
            .create_share(&share("share-1234-4567-78787"))
            .await
            .unwrap();

        assert_eq!(
            locations,
            vec![Location {
                path: "1.1.1.1:/mnt/agattivol/agtshare-1234".into()
            }]
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);

        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(
            requests[0].url,
            format!("{}/storage/volume/agattivol/datasets/", BASE)
        );
        assert_eq!(
            requests[0].body.as_deref(),
            Some(r#"{"name":"agtshare-1234","mountpoint":"/mnt/agattivol/agtshare-1234","refquota":"1G","dedup":"on","compression":"on"}"#)
        );

        assert_eq!(requests[1].method, HttpMethod::Post);
        assert_eq!(requests[1].url, format!("{}/sharing/nfs/", BASE));
        assert_eq!(
            requests[1].body.as_deref(),
            Some(r#"{"nfs_paths":["/mnt/agattivol/agtshare-1234"]}"#)
        );
    }

    #[tokio::test]
    async fn test_create_share_uses_compression_setting() {
        let transport = MockTransport::new();
        let config = DriverConfig {
            dataset_compression: Compression::Lz4,
            dataset_dedupe: Dedupe::Off,
            ..test_config()
        };

        orchestrator(config, &transport)
            .create_share(&share("share-1234"))
            .await
            .unwrap();

        let body: serde_json::Value =
            serde_json::from_str(transport.requests()[0].body.as_deref().unwrap()).unwrap();
        assert_eq!(body["compression"], "lz4");
        assert_eq!(body["dedup"], "off");
    }

    #[tokio::test]
    async fn test_create_share_wrong_proto() {
        let transport = MockTransport::new();
        let mut cifs = share("share-1234-4567-78787");
        cifs.share_proto = "INVALID_PROTOCOL".into();

        let err = orchestrator(test_config(), &transport)
            .create_share(&cifs)
            .await
            .unwrap_err();
        assert_matches!(err, Error::InvalidShare(_));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_share_protocol_is_case_sensitive() {
        let transport = MockTransport::new();
        let mut lower = share("share-1234");
        lower.share_proto = "nfs".into();

        let err = orchestrator(test_config(), &transport)
            .create_share(&lower)
            .await
            .unwrap_err();
        assert_matches!(err, Error::InvalidShare(_));
    }

    #[tokio::test]
    async fn test_create_share_dataset_failure_skips_export() {
        let transport = MockTransport::new();
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .create_share(&share("share-1234-4567-78787"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { ref message, .. } if message.contains("500:Internal Server Error"));
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_create_share_export_failure() {
        let transport = MockTransport::new();
        transport.push_ok("{}");
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .create_share(&share("share-1234-4567-78787"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { .. });
        assert_eq!(transport.request_count(), 2);
    }

    #[tokio::test]
    async fn test_create_share_invalid_name() {
        let transport = MockTransport::new();
        let err = orchestrator(test_config(), &transport)
            .create_share(&share("share"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::InvalidIdentifier { .. });
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_share() {
        let transport = MockTransport::new();
        orchestrator(test_config(), &transport)
            .delete_share("share-1234-4567-78787")
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(
            request.url,
            format!("{}/storage/volume/agattivol/datasets/agtshare-1234/", BASE)
        );
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_delete_share_with_error() {
        let transport = MockTransport::new();
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .delete_share("share-1234-4567-78787")
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { .. });
    }

    #[tokio::test]
    async fn test_extend_share() {
        let transport = MockTransport::new();
        orchestrator(test_config(), &transport)
            .extend_share("share-1234-4567-78787", 4)
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(
            request.url,
            format!("{}/storage/volume/agattivol/datasets/agtshare-1234", BASE)
        );
        assert_eq!(
            request.body.as_deref(),
            Some(r#"{"name":"agtshare-1234","mountpoint":"/mnt/agattivol/agtshare-1234","refquota":"4G"}"#)
        );
    }

    #[tokio::test]
    async fn test_extend_share_with_error() {
        let transport = MockTransport::new();
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .extend_share("share-1234-4567-78787", 4)
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { .. });
    }

    #[tokio::test]
    async fn test_create_snapshot() {
        let transport = MockTransport::new();
        let update = orchestrator(test_config(), &transport)
            .create_snapshot(&snapshot())
            .await
            .unwrap();

        assert_eq!(
            update.provider_location,
            "/mnt/agattivol/agtshare-1234@agtsnap-1234"
        );

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Post);
        assert_eq!(request.url, format!("{}/storage/snapshot/", BASE));
        assert_eq!(
            request.body.as_deref(),
            Some(r#"{"dataset":"agattivol/agtshare-1234","name":"agtsnap-1234"}"#)
        );
    }

    #[tokio::test]
    async fn test_create_snapshot_with_error() {
        let transport = MockTransport::new();
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .create_snapshot(&snapshot())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { .. });
    }

    #[tokio::test]
    async fn test_create_snapshot_invalid_name() {
        let transport = MockTransport::new();
        let mut snap = snapshot();
        snap.name = "snap-1234".into();

        let err = orchestrator(test_config(), &transport)
            .create_snapshot(&snap)
            .await
            .unwrap_err();
        assert_matches!(err, Error::InvalidIdentifier { expected_segments: 3, .. });
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_delete_snapshot() {
        let transport = MockTransport::new();
        orchestrator(test_config(), &transport)
            .delete_snapshot(&snapshot())
            .await
            .unwrap();

        let request = transport.last_request().unwrap();
        assert_eq!(request.method, HttpMethod::Delete);
        assert_eq!(
            request.url,
            format!("{}/storage/snapshot/agattivol/agtshare-1234@agtsnap-1234/", BASE)
        );
        assert!(request.body.is_none());
    }

    #[tokio::test]
    async fn test_delete_snapshot_with_error() {
        let transport = MockTransport::new();
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .delete_snapshot(&snapshot())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { .. });
    }

    #[tokio::test]
    async fn test_create_share_from_snapshot() {
        let transport = MockTransport::new();
        let locations = orchestrator(test_config(), &transport)
            .create_share_from_snapshot(&share("share-9999-0000"), &snapshot())
            .await
            .unwrap();

        assert_eq!(
            locations,
            vec![Location {
                path: "1.1.1.1:/mnt/agattivol/agtshare-9999".into()
            }]
        );

        let requests = transport.requests();
        assert_eq!(requests.len(), 2);
        assert_eq!(requests[0].method, HttpMethod::Post);
        assert_eq!(
            requests[0].url,
            format!(
                "{}/storage/snapshot/agattivol/agtshare-1234@agtsnap-1234/clone/",
                BASE
            )
        );
        assert_eq!(
            requests[0].body.as_deref(),
            Some(r#"{"name":"agattivol/agtshare-9999"}"#)
        );
        assert_eq!(requests[1].url, format!("{}/sharing/nfs/", BASE));
        assert_eq!(
            requests[1].body.as_deref(),
            Some(r#"{"nfs_paths":["/mnt/agattivol/agtshare-9999"]}"#)
        );
    }

    #[tokio::test]
    async fn test_create_share_from_snapshot_clone_failure_skips_export() {
        let transport = MockTransport::new();
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .create_share_from_snapshot(&share("share-9999-0000"), &snapshot())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { .. });
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_create_share_from_snapshot_wrong_proto() {
        let transport = MockTransport::new();
        let mut cifs = share("share-9999-0000");
        cifs.share_proto = "CIFS".into();

        let err = orchestrator(test_config(), &transport)
            .create_share_from_snapshot(&cifs, &snapshot())
            .await
            .unwrap_err();
        assert_matches!(err, Error::InvalidShare(_));
        assert_eq!(transport.request_count(), 0);
    }

    #[tokio::test]
    async fn test_create_share_from_snapshot_export_failure() {
        let transport = MockTransport::new();
        transport.push_ok("{}");
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .create_share_from_snapshot(&share("share-9999-0000"), &snapshot())
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { ref message, .. } if message.contains("500:Internal Server Error"));
        assert_eq!(transport.request_count(), 2);
        assert_eq!(
            transport.last_request().unwrap().url,
            format!("{}/sharing/nfs/", BASE)
        );
    }

    #[tokio::test]
    async fn test_export_keeps_mount_path_with_spaces() {
        let transport = MockTransport::new();
        let config = DriverConfig {
            mount_point_base: "/mnt/my pool".into(),
            ..test_config()
        };

        let locations = orchestrator(config, &transport)
            .create_share(&share("share-1234"))
            .await
            .unwrap();
        assert_eq!(locations[0].path, "1.1.1.1:/mnt/my pool/agattivol/agtshare-1234");
        assert_eq!(
            transport.requests()[1].body.as_deref(),
            Some(r#"{"nfs_paths":["/mnt/my pool/agattivol/agtshare-1234"]}"#)
        );
    }

    #[tokio::test]
    async fn test_unclassified_failure_aborts_operation() {
        let transport = MockTransport::new();
        transport.push_failure(TransportError::Unclassified("broken pipe".into()));

        let err = orchestrator(test_config(), &transport)
            .create_share(&share("share-1234"))
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { ref message, .. } if message == "broken pipe");
        assert_eq!(transport.request_count(), 1);
    }

    #[tokio::test]
    async fn test_update_stats() {
        let transport = MockTransport::new();
        transport.push_ok(r#"{"avail":161061273600,"used":53687091200}"#);

        let stats = orchestrator(test_config(), &transport)
            .update_stats()
            .await
            .unwrap();

        assert_eq!(stats.vendor_name, "FreeNAS");
        assert_eq!(stats.storage_protocol, "NFS");
        assert_eq!(stats.nfs_mount_point_base, "/mnt");
        assert_eq!(
            stats.pools,
            vec![PoolStats {
                pool_name: "agattivol".into(),
                total_capacity_gb: 200,
                free_capacity_gb: 150,
                snapshot_support: true,
                create_share_from_snapshot_support: true,
                reserved_percentage: 0,
                compression: true,
                dedupe: true,
                thin_provisioning: false,
            }]
        );
    }

    #[tokio::test]
    async fn test_update_stats_appliance_error() {
        let transport = MockTransport::new();
        transport.push_server_error();

        let err = orchestrator(test_config(), &transport)
            .update_stats()
            .await
            .unwrap_err();
        assert_matches!(err, Error::Appliance { .. });
    }
}
