//! Driver configuration
//!
//! A plain record handed to the driver by the host framework (or loaded
//! from YAML by the CLI). Defaults mirror the option declarations the
//! driver has always shipped with.

use crate::error::{Error, Result};
use serde::{Deserialize, Serialize};
use std::path::Path;
use std::str::FromStr;

/// Name the top-level volume must carry for the driver to operate
pub const REQUIRED_VOLUME_NAME: &str = "agattivol";

// =============================================================================
// Option Enums
// =============================================================================

/// ZFS compression property for new datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Compression {
    #[serde(rename = "on")]
    On,
    #[serde(rename = "off")]
    Off,
    #[serde(rename = "gzip")]
    Gzip,
    #[serde(rename = "gzip-1")]
    Gzip1,
    #[serde(rename = "gzip-2")]
    Gzip2,
    #[serde(rename = "gzip-3")]
    Gzip3,
    #[serde(rename = "gzip-4")]
    Gzip4,
    #[serde(rename = "gzip-5")]
    Gzip5,
    #[serde(rename = "gzip-6")]
    Gzip6,
    #[serde(rename = "gzip-7")]
    Gzip7,
    #[serde(rename = "gzip-8")]
    Gzip8,
    #[serde(rename = "gzip-9")]
    Gzip9,
    #[serde(rename = "lzjb")]
    Lzjb,
    #[serde(rename = "zle")]
    Zle,
    #[serde(rename = "lz4")]
    Lz4,
}

impl Compression {
    pub fn as_str(&self) -> &'static str {
        match self {
            Compression::On => "on",
            Compression::Off => "off",
            Compression::Gzip => "gzip",
            Compression::Gzip1 => "gzip-1",
            Compression::Gzip2 => "gzip-2",
            Compression::Gzip3 => "gzip-3",
            Compression::Gzip4 => "gzip-4",
            Compression::Gzip5 => "gzip-5",
            Compression::Gzip6 => "gzip-6",
            Compression::Gzip7 => "gzip-7",
            Compression::Gzip8 => "gzip-8",
            Compression::Gzip9 => "gzip-9",
            Compression::Lzjb => "lzjb",
            Compression::Zle => "zle",
            Compression::Lz4 => "lz4",
        }
    }

    /// Anything but `off` counts as compression support
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Compression::Off)
    }
}

impl std::fmt::Display for Compression {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// ZFS dedup property for new datasets
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Dedupe {
    On,
    Off,
    Inherit,
}

impl Dedupe {
    pub fn as_str(&self) -> &'static str {
        match self {
            Dedupe::On => "on",
            Dedupe::Off => "off",
            Dedupe::Inherit => "inherit",
        }
    }

    /// Anything but `off` counts as dedupe support
    pub fn is_enabled(&self) -> bool {
        !matches!(self, Dedupe::Off)
    }
}

impl std::fmt::Display for Dedupe {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// URL scheme used to reach the appliance
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TransportScheme {
    Http,
    Https,
}

impl std::fmt::Display for TransportScheme {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            TransportScheme::Http => write!(f, "http"),
            TransportScheme::Https => write!(f, "https"),
        }
    }
}

/// Authorization style for the appliance API; only basic auth exists
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub enum AuthStyle {
    BasicAuth,
}

impl FromStr for AuthStyle {
    type Err = Error;

    fn from_str(s: &str) -> Result<Self> {
        match s.to_lowercase().as_str() {
            "basic_auth" => Ok(AuthStyle::BasicAuth),
            other => Err(Error::Configuration(format!(
                "Unsupported authentication style: {}",
                other
            ))),
        }
    }
}

impl TryFrom<String> for AuthStyle {
    type Error = Error;

    fn try_from(value: String) -> Result<Self> {
        value.parse()
    }
}

impl From<AuthStyle> for String {
    fn from(style: AuthStyle) -> Self {
        match style {
            AuthStyle::BasicAuth => "basic_auth".to_string(),
        }
    }
}

// =============================================================================
// Driver Configuration
// =============================================================================

/// Configuration record for the FreeNAS driver
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct DriverConfig {
    /// Host name or address of the appliance
    pub hostname: String,
    pub port: u16,
    pub login: Option<String>,
    pub password: Option<String>,
    pub api_version: String,
    pub transport_type: TransportScheme,
    pub auth_style: AuthStyle,
    /// Base directory that contains NFS share mount points
    pub mount_point_base: String,
    /// Top-level volume holding every share dataset
    pub dataset: String,
    pub dataset_compression: Compression,
    pub dataset_dedupe: Dedupe,
    pub thin_provisioning: bool,
    /// Only protocol shares may request; compared case-sensitively
    pub storage_protocol: String,
    pub reserved_percentage: u32,
    pub vendor_name: String,
    pub volume_backend_name: String,
    pub share_backend_name: Option<String>,
}

impl Default for DriverConfig {
    fn default() -> Self {
        Self {
            hostname: String::new(),
            port: 3000,
            login: Some("root".to_string()),
            password: None,
            api_version: "v1.0".to_string(),
            transport_type: TransportScheme::Http,
            auth_style: AuthStyle::BasicAuth,
            mount_point_base: "/mnt".to_string(),
            dataset: REQUIRED_VOLUME_NAME.to_string(),
            dataset_compression: Compression::On,
            dataset_dedupe: Dedupe::Off,
            thin_provisioning: true,
            storage_protocol: "NFS".to_string(),
            reserved_percentage: 0,
            vendor_name: "FreeNAS".to_string(),
            volume_backend_name: "FREENAS_Storage".to_string(),
            share_backend_name: None,
        }
    }
}

impl DriverConfig {
    /// Parse a YAML document; missing keys take their defaults
    pub fn from_yaml_str(yaml: &str) -> Result<Self> {
        Ok(serde_yaml::from_str(yaml)?)
    }

    /// Load configuration from a YAML file
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let raw = std::fs::read_to_string(path)?;
        Self::from_yaml_str(&raw)
    }

    /// Check the fields the appliance client cannot work without
    pub fn validate(&self) -> Result<()> {
        if self.hostname.trim().is_empty() {
            return Err(Error::Configuration("hostname must be set".into()));
        }
        if self.port == 0 {
            return Err(Error::Configuration("port must be non-zero".into()));
        }
        if self.api_version.trim().is_empty() {
            return Err(Error::Configuration("api_version must be set".into()));
        }
        Ok(())
    }

    /// Directory under which share datasets are mounted on the appliance
    pub fn mount_path(&self) -> String {
        format!("{}/{}", self.mount_point_base, self.dataset)
    }
}
