//! Host counters through sysinfo
//!
//! Live figures the inventory does not carry: brand string and logical
//! thread count, instantaneous load, physical memory, mounted volumes and
//! the OS identity.

use std::time::Duration;

use sysinfo::{Disks, System};

/// Fixed interval the CPU load is averaged over.
pub const LOAD_SAMPLE_INTERVAL: Duration = Duration::from_secs(1);

#[derive(Debug, Clone, Default, PartialEq)]
pub struct CpuSample {
    pub brand: Option<String>,
    pub logical_threads: usize,
    pub physical_cores: Option<usize>,
    /// Current frequency of the first core, in MHz.
    pub frequency_mhz: Option<u64>,
    pub load_percent: Option<f32>,
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub struct MemorySample {
    pub total_bytes: u64,
    pub available_bytes: u64,
}

/// Usage of one mounted volume.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PartitionSample {
    /// Identifier matched against physical disks (`/dev/nvme0n1p2`, `C:\`).
    pub device: String,
    pub mount_point: String,
    pub total_bytes: u64,
    pub available_bytes: u64,
}

pub trait HostSampler {
    /// Blocks for [`LOAD_SAMPLE_INTERVAL`] while measuring load.
    fn cpu(&self) -> CpuSample;

    fn memory(&self) -> MemorySample;

    fn partitions(&self) -> Vec<PartitionSample>;

    fn os_name(&self) -> Option<String>;

    fn os_version(&self) -> Option<String>;
}

pub struct SysinfoSampler;

impl HostSampler for SysinfoSampler {
    fn cpu(&self) -> CpuSample {
        let mut sys = System::new();
        sys.refresh_cpu_all();

        let (brand, frequency_mhz) = match sys.cpus().first() {
            Some(cpu) => (
                Some(cpu.brand().trim().to_string()).filter(|b| !b.is_empty()),
                Some(cpu.frequency()).filter(|&mhz| mhz > 0),
            ),
            None => (None, None),
        };
        let logical_threads = sys.cpus().len();
        let physical_cores = sys.physical_core_count().filter(|&n| n > 0);

        std::thread::sleep(LOAD_SAMPLE_INTERVAL);
        sys.refresh_cpu_usage();
        let load_percent = if logical_threads > 0 {
            Some(sys.global_cpu_usage())
        } else {
            None
        };

        CpuSample {
            brand,
            logical_threads,
            physical_cores,
            frequency_mhz,
            load_percent,
        }
    }

    fn memory(&self) -> MemorySample {
        let mut sys = System::new();
        sys.refresh_memory();
        MemorySample {
            total_bytes: sys.total_memory(),
            available_bytes: sys.available_memory(),
        }
    }

    fn partitions(&self) -> Vec<PartitionSample> {
        let disks = Disks::new_with_refreshed_list();
        disks
            .list()
            .iter()
            .map(|disk| {
                let mount_point = disk.mount_point().to_string_lossy().to_string();
                PartitionSample {
                    device: partition_id(&disk.name().to_string_lossy(), &mount_point),
                    mount_point,
                    total_bytes: disk.total_space(),
                    available_bytes: disk.available_space(),
                }
            })
            .collect()
    }

    fn os_name(&self) -> Option<String> {
        System::name()
    }

    fn os_version(&self) -> Option<String> {
        System::os_version()
    }
}

/// Volumes are named by device node on Unix and by drive letter on Windows.
#[cfg(target_os = "windows")]
fn partition_id(_name: &str, mount_point: &str) -> String {
    mount_point.to_string()
}

#[cfg(not(target_os = "windows"))]
fn partition_id(name: &str, _mount_point: &str) -> String {
    name.to_string()
}
