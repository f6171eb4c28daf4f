//! Collection run
//!
//! Fetches VMs, then disks, then attachments for every VM, strictly in that
//! order, and aggregates the frozen snapshot. The first failing fetch aborts
//! the run; nothing partial is returned.

use super::aggregator::aggregate;
use super::index::{DiskIndex, VmDiskIndex};
use crate::domain::ports::{AttachmentsByVm, Disk, InventorySource, VirtualMachine, VmStatsRecord};
use crate::error::Result;
use std::time::Instant;
use tracing::{debug, info};

/// Everything fetched during one run
#[derive(Debug, Clone, Default)]
pub struct InventorySnapshot {
    pub vms: Vec<VirtualMachine>,
    pub disks: Vec<Disk>,
    pub attachments: AttachmentsByVm,
}

impl InventorySnapshot {
    /// Fetch a complete snapshot from the source
    pub async fn fetch<S>(source: &S) -> Result<Self>
    where
        S: InventorySource + ?Sized,
    {
        let started = Instant::now();

        let vms = source.list_vms().await?;
        info!("Fetched {} virtual machines", vms.len());

        let disks = source.list_disks().await?;
        info!("Fetched {} disks", disks.len());

        let vm_ids: Vec<String> = vms.iter().map(|vm| vm.id.clone()).collect();
        let attachments = source.list_all_attachments(&vm_ids).await?;
        let attachment_total: usize = attachments.values().map(Vec::len).sum();
        info!(
            "Fetched {} disk attachments for {} VMs",
            attachment_total,
            attachments.len()
        );

        debug!(elapsed_ms = started.elapsed().as_millis() as u64, "Snapshot complete");

        Ok(Self {
            vms,
            disks,
            attachments,
        })
    }

    /// Index the snapshot and produce one record per VM
    pub fn aggregate(&self) -> Vec<VmStatsRecord> {
        let disk_index = DiskIndex::build(&self.disks);
        let vm_disk_index = VmDiskIndex::build(
            self.attachments
                .iter()
                .map(|(vm_id, batch)| (vm_id.clone(), batch.clone())),
        );
        debug!(
            disks = disk_index.len(),
            vms_with_attachments = vm_disk_index.len(),
            "Indexes built"
        );

        aggregate(&self.vms, &disk_index, &vm_disk_index)
    }
}

/// Run one full collection against the source
pub async fn collect<S>(source: &S) -> Result<Vec<VmStatsRecord>>
where
    S: InventorySource + ?Sized,
{
    let snapshot = InventorySnapshot::fetch(source).await?;
    let records = snapshot.aggregate();
    let running = records
        .iter()
        .filter(|r| r.status.map_or(false, |s| s.is_running()))
        .count();
    info!("Aggregated stats for {} VMs ({} running)", records.len(), running);
    Ok(records)
}
