// SPDX-License-Identifier: GPL-3.0-only

//! CLI wrapper around the storage handlers for inspecting physical volumes

use std::path::PathBuf;
use std::sync::Arc;

use anyhow::Result;
use clap::{Parser, Subcommand};
use storage_fs::{FsType, Lvm2Pv, Partition, Registry};
use storage_sys::config::DEFAULT_CONFIG_PATH;
use storage_sys::{Config, MountInfo, SystemRunner};
use storage_types::DEFAULT_SECTOR_SIZE;

/// Inspect LVM2 physical volumes as the partition editor sees them
#[derive(Parser)]
#[command(name = "partview-pv")]
#[command(about = "CLI tool for LVM2 physical volume queries", long_about = None)]
struct Cli {
    /// Configuration file
    #[arg(long, global = true, default_value = DEFAULT_CONFIG_PATH)]
    config: PathBuf,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Report whether the lvm tool is available
    Supported,
    /// Show what is known about a physical volume
    Show {
        /// Device path of the physical volume
        path: String,
        /// Logical sector size in bytes
        #[arg(long, default_value_t = DEFAULT_SECTOR_SIZE)]
        sector_size: u64,
        /// Partition length in sectors, if known
        #[arg(long, default_value_t = 0)]
        length_sectors: u64,
    },
    /// List mount points, for every device or for one
    Mounts {
        /// Device path
        path: Option<String>,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let config = Config::load(&cli.config)?;
    let pv = Arc::new(Lvm2Pv::system(&config)?);

    // Initialize tracing to stderr
    tracing_subscriber::fmt()
        .with_writer(std::io::stderr)
        .with_env_filter(
            tracing_subscriber::EnvFilter::try_from_default_env()
                .unwrap_or_else(|_| {
                    tracing_subscriber::EnvFilter::new(config.log_level.as_directive())
                }),
        )
        .init();

    if unsafe { libc::geteuid() } != 0 {
        tracing::warn!("Not running as root; lvm may not report every physical volume");
    }

    let mut registry = Registry::new();
    registry.register(FsType::Lvm2Pv, pv.clone());

    match cli.command {
        Commands::Supported => {
            let support = registry.get(FsType::Lvm2Pv)?.filesystem_support();
            let json = serde_json::json!({ "supported": support.read.is_supported() });
            println!("{}", json);
        }
        Commands::Show {
            path,
            sector_size,
            length_sectors,
        } => {
            let partition =
                Partition::new(path, FsType::Lvm2Pv, sector_size).with_length(length_sectors);
            let report = pv.report(&partition);
            println!("{}", serde_json::to_string_pretty(&report)?);
        }
        Commands::Mounts { path } => {
            let mounts = MountInfo::load(&SystemRunner::new());
            let json = match path {
                Some(path) => serde_json::to_string_pretty(&mounts.report(&path))?,
                None => serde_json::to_string_pretty(&mounts.all_mountpoints())?,
            };
            println!("{}", json);
        }
    }

    Ok(())
}
