//! FreeNAS Share Driver CLI
//!
//! Runs single share lifecycle operations against a FreeNAS appliance
//! and prints the result as JSON.

use anyhow::Context;
use clap::{Parser, Subcommand};
use serde::Serialize;
use std::path::PathBuf;
use std::sync::Arc;
use tracing::{info, Level};
use tracing_subscriber::{fmt, prelude::*, EnvFilter};

use freenas_share_driver::appliance::metrics;
use freenas_share_driver::{
    ApplianceMetrics, DriverConfig, FreeNasDriver, ShareRecord, SnapshotRecord,
};

// =============================================================================
// CLI Arguments
// =============================================================================

/// FreeNAS share driver - NFS share lifecycle over the appliance REST API
#[derive(Parser, Debug)]
#[command(author, version, about, long_about = None)]
struct Args {
    /// Path to the YAML driver configuration
    #[arg(long, env = "FREENAS_CONFIG")]
    config: Option<PathBuf>,

    /// Appliance host name (overrides the config file)
    #[arg(long, env = "FREENAS_HOSTNAME")]
    hostname: Option<String>,

    /// Appliance user (overrides the config file)
    #[arg(long, env = "FREENAS_LOGIN")]
    login: Option<String>,

    /// Appliance password (overrides the config file)
    #[arg(long, env = "FREENAS_PASSWORD", hide_env_values = true)]
    password: Option<String>,

    /// Log level (trace, debug, info, warn, error)
    #[arg(long, env = "LOG_LEVEL", default_value = "info")]
    log_level: String,

    /// Output logs as JSON
    #[arg(long, env = "LOG_JSON")]
    log_json: bool,

    /// Print appliance request metrics after the operation
    #[arg(long)]
    print_metrics: bool,

    #[command(subcommand)]
    command: Operation,
}

#[derive(Subcommand, Debug)]
enum Operation {
    /// Verify the configured volume exists on the appliance
    CheckSetup,
    /// Report pool capacity and capabilities
    Stats,
    /// Create and export a share
    CreateShare {
        #[command(flatten)]
        share: ShareArgs,
    },
    /// Delete a share's dataset
    DeleteShare {
        #[arg(long)]
        name: String,
    },
    /// Set a share's quota to a new size in GB
    ExtendShare {
        #[arg(long)]
        name: String,
        #[arg(long)]
        size: u64,
    },
    /// Snapshot a share
    CreateSnapshot {
        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
    /// Delete a share snapshot
    DeleteSnapshot {
        #[command(flatten)]
        snapshot: SnapshotArgs,
    },
    /// Clone a snapshot into a new exported share
    CreateShareFromSnapshot {
        #[command(flatten)]
        share: ShareArgs,
        /// Snapshot to clone
        #[arg(long)]
        snapshot: String,
        /// Share the snapshot was taken from
        #[arg(long)]
        snapshot_share: String,
    },
}

#[derive(clap::Args, Debug)]
struct ShareArgs {
    #[arg(long)]
    name: String,
    /// Size in GB
    #[arg(long)]
    size: u64,
    /// Defaults to the share name
    #[arg(long)]
    share_id: Option<String>,
    #[arg(long, default_value = "NFS")]
    proto: String,
}

impl ShareArgs {
    fn record(&self) -> ShareRecord {
        ShareRecord {
            name: self.name.clone(),
            size: self.size,
            share_id: self.share_id.clone().unwrap_or_else(|| self.name.clone()),
            share_proto: self.proto.clone(),
        }
    }
}

#[derive(clap::Args, Debug)]
struct SnapshotArgs {
    /// Snapshot name
    #[arg(long)]
    name: String,
    /// Share the snapshot belongs to
    #[arg(long)]
    share_name: String,
}

/// Share known only by name; delete/extend/snapshot need nothing else
fn share_record(name: &str) -> ShareRecord {
    ShareRecord {
        name: name.to_string(),
        size: 0,
        share_id: name.to_string(),
        share_proto: String::new(),
    }
}

fn snapshot_record(name: &str, share_name: &str) -> SnapshotRecord {
    SnapshotRecord {
        name: name.to_string(),
        share_name: share_name.to_string(),
        share: share_record(share_name),
    }
}

// =============================================================================
// Main
// =============================================================================

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    let args = Args::parse();

    init_logging(&args);

    let config = load_config(&args)?;
    info!(
        "FreeNAS share driver {} against {}",
        freenas_share_driver::VERSION,
        config.hostname
    );

    let registry = prometheus::Registry::new();
    let appliance_metrics = Arc::new(ApplianceMetrics::register(&registry)?);

    let driver = FreeNasDriver::new(config)?.with_metrics(appliance_metrics);
    driver.do_setup()?;

    match &args.command {
        Operation::CheckSetup => {
            driver.check_for_setup_error().await?;
            print_json(&serde_json::json!({ "status": "ok" }))?;
        }
        Operation::Stats => print_json(&driver.update_share_stats().await?)?,
        Operation::CreateShare { share } => {
            print_json(&driver.create_share(&share.record()).await?)?
        }
        Operation::DeleteShare { name } => {
            driver.delete_share(&share_record(name)).await?;
            print_json(&serde_json::json!({ "deleted": name }))?;
        }
        Operation::ExtendShare { name, size } => {
            driver.extend_share(&share_record(name), *size).await?;
            print_json(&serde_json::json!({ "extended": name, "size_gb": size }))?;
        }
        Operation::CreateSnapshot { snapshot } => {
            let record = snapshot_record(&snapshot.name, &snapshot.share_name);
            print_json(&driver.create_snapshot(&record).await?)?;
        }
        Operation::DeleteSnapshot { snapshot } => {
            let record = snapshot_record(&snapshot.name, &snapshot.share_name);
            driver.delete_snapshot(&record).await?;
            print_json(&serde_json::json!({ "deleted": snapshot.name }))?;
        }
        Operation::CreateShareFromSnapshot {
            share,
            snapshot,
            snapshot_share,
        } => {
            let record = snapshot_record(snapshot, snapshot_share);
            print_json(&driver.create_share_from_snapshot(&share.record(), &record).await?)?;
        }
    }

    if args.print_metrics {
        print!("{}", metrics::render(&registry)?);
    }

    Ok(())
}

fn load_config(args: &Args) -> anyhow::Result<DriverConfig> {
    let mut config = match &args.config {
        Some(path) => DriverConfig::load(path)
            .with_context(|| format!("Failed to load config from {}", path.display()))?,
        None => DriverConfig::default(),
    };

    if let Some(hostname) = &args.hostname {
        config.hostname = hostname.clone();
    }
    if let Some(login) = &args.login {
        config.login = Some(login.clone());
    }
    if let Some(password) = &args.password {
        config.password = Some(password.clone());
    }

    Ok(config)
}

fn print_json<T: Serialize>(value: &T) -> anyhow::Result<()> {
    println!("{}", serde_json::to_string_pretty(value)?);
    Ok(())
}

// =============================================================================
// Logging Setup
// =============================================================================

fn init_logging(args: &Args) {
    let level = match args.log_level.to_lowercase().as_str() {
        "trace" => Level::TRACE,
        "debug" => Level::DEBUG,
        "info" => Level::INFO,
        "warn" => Level::WARN,
        "error" => Level::ERROR,
        _ => Level::INFO,
    };

    let filter = EnvFilter::from_default_env()
        .add_directive(level.into())
        .add_directive("hyper=warn".parse().expect("static directive"))
        .add_directive("reqwest=warn".parse().expect("static directive"));

    // Logs go to stderr so stdout stays pure JSON.
    if args.log_json {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().json().with_writer(std::io::stderr))
            .init();
    } else {
        tracing_subscriber::registry()
            .with(filter)
            .with(fmt::layer().with_target(true).with_writer(std::io::stderr))
            .init();
    }
}
