//! Native graphics adapter descriptors
//!
//! The most reliable VRAM figure comes from the graphics stack itself rather
//! than the device inventory: DXGI adapter descriptions on Windows, the NVIDIA
//! management interface on Linux. Each platform binds its native records
//! behind [`GraphicsAdapterQuery`].

#[cfg(target_os = "linux")]
mod linux;
#[cfg(target_os = "windows")]
mod windows;

use super::reading::{ProbeError, Reading};

/// Owned copy of one native adapter description.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdapterDescription {
    pub name: String,
    /// PCI slot (`0000:01:00.0`) when the native API reports it.
    pub pci_slot: Option<String>,
    /// Dedicated video memory in bytes.
    pub dedicated_video_memory: u64,
}

/// Enumerates adapters through the platform's graphics API.
pub trait GraphicsAdapterQuery {
    fn adapters(&self) -> Reading<Vec<AdapterDescription>>;
}

/// Adapter query for the current platform.
pub fn platform_query() -> Box<dyn GraphicsAdapterQuery> {
    platform_query_impl()
}

#[cfg(target_os = "linux")]
fn platform_query_impl() -> Box<dyn GraphicsAdapterQuery> {
    Box::new(linux::NvidiaSmiQuery)
}

#[cfg(target_os = "windows")]
fn platform_query_impl() -> Box<dyn GraphicsAdapterQuery> {
    Box::new(windows::DxgiQuery)
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
fn platform_query_impl() -> Box<dyn GraphicsAdapterQuery> {
    Box::new(NoAdapterQuery)
}

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
struct NoAdapterQuery;

#[cfg(not(any(target_os = "linux", target_os = "windows")))]
impl GraphicsAdapterQuery for NoAdapterQuery {
    fn adapters(&self) -> Reading<Vec<AdapterDescription>> {
        Err(ProbeError::unavailable(
            "adapter",
            "no native adapter API on this platform",
        ))
    }
}

/// Slot without its PCI domain: `00000000:01:00.0` and `0000:01:00.0` both become `01:00.0`.
pub fn normalize_pci_slot(slot: &str) -> String {
    let trimmed = slot.trim().to_ascii_lowercase();
    if trimmed.matches(':').count() >= 2 {
        if let Some((_, rest)) = trimmed.split_once(':') {
            return rest.to_string();
        }
    }
    trimmed
}

/// Whether a native description refers to the same device as an inventory name.
pub fn names_match(adapter: &str, controller: &str) -> bool {
    let adapter = adapter.trim().to_lowercase();
    let controller = controller.trim().to_lowercase();
    if adapter.is_empty() || controller.is_empty() {
        return false;
    }
    adapter == controller || adapter.contains(&controller) || controller.contains(&adapter)
}

#[cfg(any(target_os = "linux", target_os = "windows"))]
pub(crate) fn empty_result(interface: &'static str) -> ProbeError {
    ProbeError::unavailable(interface, "no adapters enumerated")
}
