//! CPU probe
//!
//! Combines sysinfo's live counters with the inventory's processor record:
//! - name, thread count, current clock and load from sysinfo
//! - physical cores, clocks and temperature from the inventory when sysinfo
//!   has nothing better

use serde::{Deserialize, Serialize};

use super::host::HostSampler;
use super::inventory::HardwareInventory;
use super::reading::ReadingExt;
use super::units::{normalize_architecture, round_to, Frequency};

/// CPU information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CpuSpecs {
    /// CPU name (e.g., "AMD Ryzen 7 5800X")
    pub name: String,
    /// Number of physical cores
    pub physical_cores: usize,
    /// Number of logical threads
    pub logical_threads: usize,
    /// Base clock in GHz
    pub base_clock_ghz: Option<f64>,
    /// Max boost clock in GHz
    pub max_clock_ghz: Option<f64>,
    /// Package temperature in °C
    pub temperature_c: Option<f64>,
    /// Load over the sample interval, 0-100
    pub load_percent: Option<f64>,
    /// Normalized architecture tag (x64, x86, ARM64)
    pub architecture: Option<String>,
}

impl CpuSpecs {
    /// Blocks for the one-second load sample.
    pub fn probe(inventory: &dyn HardwareInventory, host: &dyn HostSampler) -> Self {
        let sample = host.cpu();
        let processor = inventory.processor().or_absent("cpu.processor");

        let name = sample
            .brand
            .clone()
            .or_else(|| processor.as_ref().and_then(|p| p.name.clone().ok()))
            .unwrap_or_else(|| "Unknown CPU".to_string());

        let logical_threads = sample.logical_threads;
        let physical_cores = sample
            .physical_cores
            .or_else(|| processor.as_ref().and_then(|p| p.physical_cores.clone().ok()))
            .filter(|&n| n > 0)
            .unwrap_or(logical_threads);

        let base_clock_ghz = sample
            .frequency_mhz
            .and_then(|mhz| Frequency::mhz(mhz).to_ghz())
            .or_else(|| {
                processor
                    .as_ref()
                    .and_then(|p| p.current_clock.clone().ok())
                    .and_then(Frequency::to_ghz)
            });
        let max_clock_ghz = processor
            .as_ref()
            .and_then(|p| p.max_clock.clone().ok())
            .and_then(Frequency::to_ghz)
            .or(base_clock_ghz);

        let load_percent = sample
            .load_percent
            .map(f64::from)
            .filter(|load| (0.0..=100.0).contains(load))
            .map(|load| round_to(load, 1));

        CpuSpecs {
            name,
            physical_cores,
            logical_threads,
            base_clock_ghz,
            max_clock_ghz,
            temperature_c: inventory.cpu_temperature().or_absent("cpu.temperature"),
            load_percent,
            architecture: inventory
                .machine_architecture()
                .or_absent("cpu.architecture")
                .map(|token| normalize_architecture(&token)),
        }
    }
}
