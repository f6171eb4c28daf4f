//! Domain Ports - Core types and the inventory source boundary
//!
//! Only the handful of fields the aggregation actually consumes live here.
//! The engine's full wire schema stays behind the adapter in [`crate::ovirt::dto`].

use crate::error::Result;
use async_trait::async_trait;
use chrono::{DateTime, Utc};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

// =============================================================================
// Virtual Machines
// =============================================================================

/// Lifecycle status of a virtual machine
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum VmStatus {
    Down,
    ImageLocked,
    Migrating,
    NotResponding,
    Paused,
    PoweringDown,
    PoweringUp,
    RebootInProgress,
    RestoringState,
    SavingState,
    Suspended,
    Unassigned,
    Up,
    WaitForLaunch,
    /// Status could not be determined, or the engine sent a value we do not know
    #[serde(other)]
    Unknown,
}

impl VmStatus {
    /// Whether the VM process is running on a host
    pub fn is_running(&self) -> bool {
        matches!(
            self,
            VmStatus::Up
                | VmStatus::Migrating
                | VmStatus::Paused
                | VmStatus::PoweringDown
                | VmStatus::PoweringUp
                | VmStatus::RebootInProgress
                | VmStatus::SavingState
        )
    }
}

impl std::fmt::Display for VmStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        let s = match self {
            VmStatus::Down => "down",
            VmStatus::ImageLocked => "image_locked",
            VmStatus::Migrating => "migrating",
            VmStatus::NotResponding => "not_responding",
            VmStatus::Paused => "paused",
            VmStatus::PoweringDown => "powering_down",
            VmStatus::PoweringUp => "powering_up",
            VmStatus::RebootInProgress => "reboot_in_progress",
            VmStatus::RestoringState => "restoring_state",
            VmStatus::SavingState => "saving_state",
            VmStatus::Suspended => "suspended",
            VmStatus::Unassigned => "unassigned",
            VmStatus::Up => "up",
            VmStatus::WaitForLaunch => "wait_for_launch",
            VmStatus::Unknown => "unknown",
        };
        write!(f, "{}", s)
    }
}

/// A virtual machine as seen by the aggregation core
#[derive(Debug, Clone, Default, PartialEq)]
pub struct VirtualMachine {
    /// Unique identifier
    pub id: String,
    /// Display name
    pub name: Option<String>,
    /// Memory size in bytes
    pub memory: Option<u64>,
    /// Number of virtual CPUs (cores x sockets x threads)
    pub cpu_count: Option<u32>,
    pub status: Option<VmStatus>,
    /// Human readable detail of the current status
    pub status_detail: Option<String>,
    pub stop_reason: Option<String>,
    pub creation_time: Option<DateTime<Utc>>,
    pub start_time: Option<DateTime<Utc>>,
    pub stop_time: Option<DateTime<Utc>>,
    pub comment: Option<String>,
    pub description: Option<String>,
    /// Fully qualified domain name reported by the guest
    pub fqdn: Option<String>,
    /// Operating system type, e.g. `rhel_8x64`
    pub os_type: Option<String>,
    pub serial_number: Option<String>,
    /// Started with the run-once command
    pub run_once: Option<bool>,
}

// =============================================================================
// Disks
// =============================================================================

/// A virtual disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Disk {
    /// Unique identifier
    pub id: String,
    /// Initial provisioned size in bytes
    pub initial_size: Option<u64>,
    /// Free-text description of the backing storage, used for tier classification
    pub storage_description: Option<String>,
}

/// Link between one VM and one disk
#[derive(Debug, Clone, Default, PartialEq)]
pub struct DiskAttachment {
    /// Identifier of the attachment itself
    pub id: Option<String>,
    /// Identifier of the referenced disk. This is the join key into the disk index.
    pub disk_id: Option<String>,
    pub bootable: Option<bool>,
    pub read_only: Option<bool>,
    pub active: Option<bool>,
}

// =============================================================================
// Report Record
// =============================================================================

/// One flattened report row per VM
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct VmStatsRecord {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub comment: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub cpu: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub creation_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub fqdn: Option<String>,
    pub id: String,
    /// Memory in bytes; omitted only when the engine did not report it
    #[serde(skip_serializing_if = "Option::is_none")]
    pub memory: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub name: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub os: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub run_once: Option<bool>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub serial_number: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub start_time: Option<DateTime<Utc>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<VmStatus>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status_detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_reason: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub stop_time: Option<DateTime<Utc>>,

    /// Sum of initial sizes of attached non-SSD disks, in bytes
    pub hdd_disk_size: u64,
    /// Sum of initial sizes of attached SSD disks, in bytes
    pub ssd_disk_size: u64,
    /// Number of attachments, resolved or not
    pub disk_count: usize,
}

// =============================================================================
// Inventory Source Port
// =============================================================================

/// Attachments keyed by VM identifier, in fetch order
pub type AttachmentsByVm = IndexMap<String, Vec<DiskAttachment>>;

/// Read-only access to an authenticated virtualization manager session
#[async_trait]
pub trait InventorySource: Send + Sync {
    /// List all virtual machines
    async fn list_vms(&self) -> Result<Vec<VirtualMachine>>;

    /// List all virtual disks
    async fn list_disks(&self) -> Result<Vec<Disk>>;

    /// List the disk attachments of one VM
    async fn list_disk_attachments(&self, vm_id: &str) -> Result<Vec<DiskAttachment>>;

    /// List the disk attachments of many VMs.
    ///
    /// The default issues one request per VM, in order, and stops at the
    /// first failure. Adapters with a batch endpoint can override it.
    async fn list_all_attachments(&self, vm_ids: &[String]) -> Result<AttachmentsByVm> {
        let mut out = IndexMap::with_capacity(vm_ids.len());
        for vm_id in vm_ids {
            let attachments = self.list_disk_attachments(vm_id).await?;
            out.insert(vm_id.clone(), attachments);
        }
        Ok(out)
    }
}
