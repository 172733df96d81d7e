//! Mounted volumes and their medium

use serde::{Deserialize, Serialize};

use super::host::HostSampler;
use super::inventory::HardwareInventory;
use super::reading::ReadingExt;
use super::resolver::{classify_disk, match_partition};
use super::units::bytes_to_gb;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MediumType {
    Nvme,
    SataSsd,
    Rotating,
    Unknown,
}

impl MediumType {
    pub fn label(self) -> &'static str {
        match self {
            MediumType::Nvme => "NVMe SSD",
            MediumType::SataSsd => "SSD",
            MediumType::Rotating => "HDD",
            MediumType::Unknown => "Unknown",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct StorageDevice {
    /// Logical device identifier of the volume.
    pub device: String,
    pub medium: MediumType,
    pub total_gb: u64,
    pub free_gb: u64,
    pub mount_point: String,
}

impl StorageDevice {
    /// One entry per mounted volume with a readable size.
    pub fn probe_all(inventory: &dyn HardwareInventory, host: &dyn HostSampler) -> Vec<Self> {
        let disks: Vec<(String, MediumType)> = inventory
            .physical_disks()
            .or_absent("storage.disks")
            .unwrap_or_default()
            .into_iter()
            .map(|disk| {
                let medium = classify_disk(disk.model.as_deref().ok(), disk.media_hint.ok());
                tracing::debug!(device = %disk.device_id, medium = medium.label(), "physical disk");
                (disk.device_id, medium)
            })
            .collect();

        host.partitions()
            .into_iter()
            .filter(|part| {
                let readable = part.total_bytes > 0;
                if !readable {
                    tracing::debug!(device = %part.device, "skipping unreadable volume");
                }
                readable
            })
            .map(|part| StorageDevice {
                medium: match_partition(&part.device, &disks),
                total_gb: bytes_to_gb(part.total_bytes),
                free_gb: bytes_to_gb(part.available_bytes.min(part.total_bytes)),
                device: part.device,
                mount_point: part.mount_point,
            })
            .collect()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::fixtures::{FakeHost, FakeInventory};
    use crate::hardware::host::PartitionSample;
    use crate::hardware::inventory::PhysicalDiskRecord;
    use crate::hardware::reading::ProbeError;

    const GIB: u64 = 1 << 30;

    fn partition(device: &str, mount: &str, total: u64, free: u64) -> PartitionSample {
        PartitionSample {
            device: device.to_string(),
            mount_point: mount.to_string(),
            total_bytes: total,
            available_bytes: free,
        }
    }

    #[test]
    fn unreadable_volumes_are_dropped() {
        let inventory = FakeInventory {
            disks: Ok(vec![PhysicalDiskRecord {
                device_id: "/dev/nvme0n1".into(),
                model: Ok("Samsung SSD 980".into()),
                media_hint: Ok(MediumType::Nvme),
            }]),
            ..FakeInventory::default()
        };
        let host = FakeHost {
            partitions: vec![
                partition("/dev/nvme0n1p2", "/", 500 * GIB, 120 * GIB),
                partition("/dev/loop0", "/snap/core", 0, 0),
                partition("/dev/nvme0n1p1", "/boot/efi", GIB / 2, GIB / 4),
            ],
            ..FakeHost::default()
        };

        let devices = StorageDevice::probe_all(&inventory, &host);
        assert_eq!(devices.len(), 2);
        assert_eq!(devices[0].medium, MediumType::SataSsd);
        assert_eq!(devices[0].total_gb, 500);
        assert_eq!(devices[0].free_gb, 120);
        assert_eq!(devices[1].mount_point, "/boot/efi");
        assert_eq!(devices[1].total_gb, 1);
    }

    #[test]
    fn no_disk_inventory_means_unknown_medium() {
        let inventory = FakeInventory {
            disks: Err(ProbeError::unavailable("test", "no disks")),
            ..FakeInventory::default()
        };
        let host = FakeHost {
            partitions: vec![partition("/dev/sda1", "/", 100 * GIB, 50 * GIB)],
            ..FakeHost::default()
        };

        let devices = StorageDevice::probe_all(&inventory, &host);
        assert_eq!(devices.len(), 1);
        assert_eq!(devices[0].medium, MediumType::Unknown);
    }

    #[test]
    fn medium_tags_serialize_snake_case() {
        let tags: Vec<String> = [
            MediumType::Nvme,
            MediumType::SataSsd,
            MediumType::Rotating,
            MediumType::Unknown,
        ]
        .iter()
        .map(|m| serde_json::to_string(m).unwrap())
        .collect();
        assert_eq!(tags, ["\"nvme\"", "\"sata_ssd\"", "\"rotating\"", "\"unknown\""]);
    }
}
