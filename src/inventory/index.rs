//! Collection Indexer
//!
//! Lookup structures built once per run from the fetched collections.
//! Repeated keys are not validated; the last occurrence wins.

use crate::domain::ports::{Disk, DiskAttachment};
use std::collections::HashMap;

// =============================================================================
// Disk Index
// =============================================================================

/// Disks keyed by disk identifier
#[derive(Debug, Default, Clone)]
pub struct DiskIndex {
    disks: HashMap<String, Disk>,
}

impl DiskIndex {
    /// Index a fetched disk collection
    pub fn build<'a, I>(disks: I) -> Self
    where
        I: IntoIterator<Item = &'a Disk>,
    {
        let disks = disks
            .into_iter()
            .map(|disk| (disk.id.clone(), disk.clone()))
            .collect();
        Self { disks }
    }

    /// Look up a disk by identifier
    pub fn get(&self, disk_id: &str) -> Option<&Disk> {
        self.disks.get(disk_id)
    }

    pub fn len(&self) -> usize {
        self.disks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.disks.is_empty()
    }
}

// =============================================================================
// VM -> Attachments Index
// =============================================================================

/// Disk attachments keyed by VM identifier.
///
/// Each VM's sequence keeps the order in which the attachments were fetched.
#[derive(Debug, Default, Clone)]
pub struct VmDiskIndex {
    attachments: HashMap<String, Vec<DiskAttachment>>,
}

impl VmDiskIndex {
    /// Index per-VM attachment batches
    pub fn build<I, K>(batches: I) -> Self
    where
        I: IntoIterator<Item = (K, Vec<DiskAttachment>)>,
        K: Into<String>,
    {
        let attachments = batches
            .into_iter()
            .map(|(vm_id, batch)| (vm_id.into(), batch))
            .collect();
        Self { attachments }
    }

    /// Attachments of a VM; empty when the VM is not indexed
    pub fn attachments_for(&self, vm_id: &str) -> &[DiskAttachment] {
        self.attachments
            .get(vm_id)
            .map(Vec::as_slice)
            .unwrap_or_default()
    }

    /// Number of VMs indexed
    pub fn len(&self) -> usize {
        self.attachments.len()
    }

    pub fn is_empty(&self) -> bool {
        self.attachments.is_empty()
    }
}
