//! oVirt Inventory Collector
//!
//! Authenticates against an oVirt engine, fetches virtual machines, disks
//! and per-VM disk attachments, and produces a flattened per-VM report of
//! memory, status, disk count and disk size per storage tier.
//!
//! # Architecture
//!
//! ```text
//! ┌──────────────────────────────────────────────────────────────┐
//! │                      ovirt-inventory (bin)                   │
//! ├──────────────────────────────────────────────────────────────┤
//! │  ┌──────────────────┐         ┌────────────────────────────┐ │
//! │  │  oVirt Adapter   │ ──────▶ │   InventorySource (port)   │ │
//! │  │ SSO · TLS · DTOs │         └─────────────┬──────────────┘ │
//! │  └──────────────────┘                       │                │
//! │                          ┌──────────────────┴─────────────┐  │
//! │                          │  Collector                     │  │
//! │                          │  VMs → disks → attachments     │  │
//! │                          └──────────────────┬─────────────┘  │
//! │          ┌──────────────┬───────────────────┴───┐            │
//! │          │   Indexer    │  Classifier (ssd/hdd) │            │
//! │          └──────┬───────┴───────────┬───────────┘            │
//! │                 └──── Aggregator ───┘                        │
//! │                           │                                  │
//! │                     Report (JSON)                            │
//! └──────────────────────────────────────────────────────────────┘
//! ```
//!
//! # Modules
//!
//! - [`config`]: Endpoint, credential and trust anchor configuration
//! - [`domain`]: Core inventory types and the source port
//! - [`inventory`]: Indexing, classification, aggregation and reporting
//! - [`ovirt`]: Engine REST API adapter
//! - [`error`]: Error types and handling

pub mod config;
pub mod domain;
pub mod error;
pub mod inventory;
pub mod ovirt;

// Re-export commonly used types
pub use config::{CollectorConfig, PasswordSource};

pub use domain::ports::{
    AttachmentsByVm, Disk, DiskAttachment, InventorySource, VirtualMachine, VmStatsRecord,
    VmStatus,
};

pub use error::{Error, ErrorKind, Result};

pub use inventory::{
    aggregate, collect, is_solid_state, write_report, DiskIndex, InventorySnapshot, ReportFormat,
    StorageTier, VmDiskIndex,
};

pub use ovirt::{OvirtClient, TrustAnchors};

/// Library version
pub const VERSION: &str = env!("CARGO_PKG_VERSION");

/// Library name
pub const NAME: &str = env!("CARGO_PKG_NAME");
