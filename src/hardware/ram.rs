//! RAM probe
//!
//! Capacity comes from sysinfo; speed and type come from the first
//! installed module that reports them (SMBIOS type 17 / `Win32_PhysicalMemory`).

use serde::{Deserialize, Serialize};

use super::host::HostSampler;
use super::inventory::HardwareInventory;
use super::reading::ReadingExt;
use super::units::bytes_to_gb;

/// RAM information
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemorySpecs {
    pub total_gb: u64,
    pub used_gb: u64,
    pub free_gb: u64,
    /// Configured speed in MHz (MT/s)
    pub speed_mhz: Option<u64>,
    /// Memory type (e.g., "DDR5")
    pub memory_type: Option<String>,
}

impl MemorySpecs {
    pub fn probe(inventory: &dyn HardwareInventory, host: &dyn HostSampler) -> Self {
        let sample = host.memory();
        let total_gb = bytes_to_gb(sample.total_bytes);
        // Derive used from the rounded figures so the three always add up.
        let free_gb = bytes_to_gb(sample.available_bytes).min(total_gb);
        let used_gb = total_gb - free_gb;

        let modules = inventory
            .memory_modules()
            .or_absent("ram.modules")
            .unwrap_or_default();

        let speed_mhz = modules
            .iter()
            .find_map(|m| m.speed_mhz.clone().ok().filter(|&mhz| mhz > 0));
        let memory_type = modules
            .iter()
            .find_map(|m| m.type_label.clone().ok().filter(|l| !l.trim().is_empty()));

        MemorySpecs {
            total_gb,
            used_gb,
            free_gb,
            speed_mhz,
            memory_type,
        }
    }
}
