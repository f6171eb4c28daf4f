//! Stats Aggregator
//!
//! Joins each VM with its attachments and the disks they reference, and
//! flattens the result into one [`VmStatsRecord`] per VM.

use super::classifier::StorageTier;
use super::index::{DiskIndex, VmDiskIndex};
use crate::domain::ports::{DiskAttachment, VirtualMachine, VmStatsRecord};
use tracing::debug;

/// Per-tier size totals of one VM's attachments
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct TierSizes {
    pub ssd: u64,
    pub hdd: u64,
}

impl TierSizes {
    fn add(&mut self, tier: StorageTier, bytes: u64) {
        match tier {
            StorageTier::Ssd => self.ssd = self.ssd.saturating_add(bytes),
            StorageTier::Hdd => self.hdd = self.hdd.saturating_add(bytes),
        }
    }
}

/// Sum initial sizes per tier.
///
/// Attachments are resolved by the referenced disk id. An attachment with no
/// disk reference, or one pointing at a disk missing from the index,
/// contributes nothing.
pub fn tier_sizes(attachments: &[DiskAttachment], disks: &DiskIndex) -> TierSizes {
    let mut sizes = TierSizes::default();

    for attachment in attachments {
        let Some(disk) = attachment.disk_id.as_deref().and_then(|id| disks.get(id)) else {
            debug!(
                attachment = attachment.id.as_deref().unwrap_or("-"),
                disk = attachment.disk_id.as_deref().unwrap_or("-"),
                "Attached disk not found, skipping"
            );
            continue;
        };

        let tier = StorageTier::classify(disk.storage_description.as_deref());
        sizes.add(tier, disk.initial_size.unwrap_or(0));
    }

    sizes
}

/// Build one record per VM, in input order. Inputs are not modified.
pub fn aggregate(
    vms: &[VirtualMachine],
    disks: &DiskIndex,
    vm_disks: &VmDiskIndex,
) -> Vec<VmStatsRecord> {
    vms.iter()
        .map(|vm| {
            let attachments = vm_disks.attachments_for(&vm.id);
            let sizes = tier_sizes(attachments, disks);
            stats_record(vm, sizes, attachments.len())
        })
        .collect()
}

fn stats_record(vm: &VirtualMachine, sizes: TierSizes, disk_count: usize) -> VmStatsRecord {
    VmStatsRecord {
        comment: vm.comment.clone(),
        cpu: vm.cpu_count,
        creation_time: vm.creation_time,
        description: vm.description.clone(),
        fqdn: vm.fqdn.clone(),
        id: vm.id.clone(),
        memory: vm.memory,
        name: vm.name.clone(),
        os: vm.os_type.clone(),
        run_once: vm.run_once,
        serial_number: vm.serial_number.clone(),
        start_time: vm.start_time,
        status: vm.status,
        status_detail: vm.status_detail.clone(),
        stop_reason: vm.stop_reason.clone(),
        stop_time: vm.stop_time,
        hdd_disk_size: sizes.hdd,
        ssd_disk_size: sizes.ssd,
        disk_count,
    }
}
