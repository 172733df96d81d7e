//! Hardware inventory handle
//!
//! The inventory is the OS-level catalog of installed devices: CIM/WMI
//! classes on Windows, `/proc`, `/sys` and a few system tools on Linux.
//! [`connect`] opens it once per collection call; probes borrow the handle.
//! Every accessor returns a [`Reading`] so a missing class or attribute only
//! degrades the fields that depend on it.

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "windows")]
mod windows;

use thiserror::Error;

use super::reading::{ProbeError, Reading};
use super::storage::MediumType;
use super::units::Frequency;

/// The inventory could not be opened at all.
#[derive(Error, Debug)]
pub enum InventoryError {
    #[error("could not open {backend} hardware inventory: {detail}")]
    Connect {
        backend: &'static str,
        detail: String,
        #[source]
        cause: Option<std::io::Error>,
    },
}

/// Processor row (`Win32_Processor`, `/proc/cpuinfo` + cpufreq).
#[derive(Debug, Clone, PartialEq)]
pub struct ProcessorRecord {
    pub name: Reading<String>,
    pub physical_cores: Reading<usize>,
    pub current_clock: Reading<Frequency>,
    pub max_clock: Reading<Frequency>,
}

/// One installed memory module.
#[derive(Debug, Clone, PartialEq)]
pub struct MemoryModuleRecord {
    pub speed_mhz: Reading<u64>,
    pub type_label: Reading<String>,
}

/// One display controller as the inventory lists it.
#[derive(Debug, Clone, PartialEq)]
pub struct VideoControllerRecord {
    pub name: String,
    /// PCI slot (`0000:01:00.0`) when the inventory exposes it.
    pub pci_slot: Option<String>,
    /// Primary adapter memory attribute, in bytes.
    pub adapter_ram: Reading<u64>,
    /// Secondary video memory attribute, in bytes.
    pub video_memory: Reading<u64>,
    pub driver_version: Reading<String>,
    /// Driver date exactly as the inventory reports it.
    pub driver_date: Reading<String>,
    pub resolution: Reading<(u32, u32)>,
    pub refresh_rate_hz: Reading<u32>,
}

#[cfg(test)]
impl VideoControllerRecord {
    /// A controller known only by name.
    pub fn named(name: impl Into<String>) -> Self {
        let missing = || ProbeError::unavailable("inventory", "not reported");
        VideoControllerRecord {
            name: name.into(),
            pci_slot: None,
            adapter_ram: Err(missing()),
            video_memory: Err(missing()),
            driver_version: Err(missing()),
            driver_date: Err(missing()),
            resolution: Err(missing()),
            refresh_rate_hz: Err(missing()),
        }
    }
}

/// One physical disk.
#[derive(Debug, Clone, PartialEq)]
pub struct PhysicalDiskRecord {
    /// Identifier partitions are prefix-matched against (`/dev/nvme0n1`, `C:`).
    pub device_id: String,
    pub model: Reading<String>,
    /// Medium reported by the disk itself (rotational flag, bus type).
    pub media_hint: Reading<MediumType>,
}

/// Read-only view of the installed hardware.
pub trait HardwareInventory {
    /// Short backend label for logs.
    fn backend(&self) -> &'static str;

    fn processor(&self) -> Reading<ProcessorRecord>;

    fn cpu_temperature(&self) -> Reading<f64>;

    /// Raw machine token (`AMD64`, `x86_64`, `aarch64`).
    fn machine_architecture(&self) -> Reading<String>;

    fn memory_modules(&self) -> Reading<Vec<MemoryModuleRecord>>;

    fn video_controllers(&self) -> Reading<Vec<VideoControllerRecord>>;

    fn physical_disks(&self) -> Reading<Vec<PhysicalDiskRecord>>;

    fn os_build(&self) -> Reading<String>;

    /// Graphics API runtime, prefixed with the API name (`DirectX 12`, `Vulkan 1.3.275`).
    fn graphics_api_version(&self) -> Reading<String>;
}

/// Open the inventory for the current platform.
pub fn connect() -> Result<Box<dyn HardwareInventory>, InventoryError> {
    connect_impl()
}

#[cfg(target_os = "linux")]
fn connect_impl() -> Result<Box<dyn HardwareInventory>, InventoryError> {
    Ok(Box::new(linux::LinuxInventory::open()?))
}

#[cfg(target_os = "windows")]
fn connect_impl() -> Result<Box<dyn HardwareInventory>, InventoryError> {
    Ok(Box::new(windows::WindowsInventory::open()?))
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn connect_impl() -> Result<Box<dyn HardwareInventory>, InventoryError> {
    Ok(Box::new(UnsupportedInventory))
}

/// Inventory for platforms without a catalog backend; everything is absent.
#[cfg(not(any(target_os = "linux", target_os = "windows")))]
struct UnsupportedInventory;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
impl UnsupportedInventory {
    fn missing<T>() -> Reading<T> {
        Err(ProbeError::unavailable(
            "inventory",
            "no hardware inventory on this platform",
        ))
    }
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
impl HardwareInventory for UnsupportedInventory {
    fn backend(&self) -> &'static str {
        "none"
    }

    fn processor(&self) -> Reading<ProcessorRecord> {
        Self::missing()
    }

    fn cpu_temperature(&self) -> Reading<f64> {
        Self::missing()
    }

    fn machine_architecture(&self) -> Reading<String> {
        Ok(std::env::consts::ARCH.to_string())
    }

    fn memory_modules(&self) -> Reading<Vec<MemoryModuleRecord>> {
        Self::missing()
    }

    fn video_controllers(&self) -> Reading<Vec<VideoControllerRecord>> {
        Self::missing()
    }

    fn physical_disks(&self) -> Reading<Vec<PhysicalDiskRecord>> {
        Self::missing()
    }

    fn os_build(&self) -> Reading<String> {
        Self::missing()
    }

    fn graphics_api_version(&self) -> Reading<String> {
        Self::missing()
    }
}

/// Run a command and return its stdout when it exits successfully.
pub(crate) fn run_command_capture(program: &str, args: &[&str]) -> Reading<String> {
    let output = std::process::Command::new(program)
        .args(args)
        .output()
        .map_err(|err| ProbeError::unavailable("command", format!("{program}: {err}")))?;

    if !output.status.success() {
        return Err(ProbeError::unavailable(
            "command",
            format!("{program} exited with {}", output.status),
        ));
    }

    Ok(String::from_utf8_lossy(&output.stdout).into_owned())
}
