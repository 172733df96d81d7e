//! GPU probe
//!
//! Enumerates display controllers from the inventory, resolves each one's
//! dedicated memory through the tiered sources in [`super::resolver`], and
//! reports the device a game would actually render on.

use serde::{Deserialize, Serialize};

use super::adapter::{names_match, normalize_pci_slot, AdapterDescription, GraphicsAdapterQuery};
use super::heuristics::{self, GpuProfile};
use super::inventory::{HardwareInventory, VideoControllerRecord};
use super::reading::{ProbeError, Reading, ReadingExt};
use super::resolver::{is_vendor_tagged, resolve_memory, select_device, MemorySource};
use super::units::{bytes_to_gb, format_driver_date};

/// Capability flags; all false unless a model profile sets them.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct GpuFeatures {
    /// DLSS 3 class frame generation / upscaling
    pub advanced_upscaling: bool,
    /// Hardware ray tracing
    pub ray_tracing: bool,
    /// DirectX 12 Ultimate feature level
    pub directx12_ultimate: bool,
    /// Vendor-specific upscaler (DLSS)
    pub vendor_upscaling: bool,
}

/// GPU information
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GpuSpecs {
    /// GPU name (e.g., "NVIDIA GeForce RTX 4050 Laptop GPU")
    pub name: String,
    /// Dedicated memory in GB
    pub memory_gb: Option<u64>,
    /// Which source the memory figure came from
    pub memory_source: Option<MemorySource>,
    /// Memory technology (e.g., "GDDR6")
    pub memory_type: Option<String>,
    pub driver_version: Option<String>,
    /// Driver date as DD/MM/YYYY
    pub driver_date: Option<String>,
    /// Current display mode, "WIDTHxHEIGHT"
    pub resolution: Option<String>,
    pub refresh_rate_hz: Option<u32>,
    /// Architecture family (e.g., "Ada Lovelace")
    pub architecture: Option<String>,
    pub features: GpuFeatures,
}

/// A controller with everything resolved for it.
struct Candidate {
    record: VideoControllerRecord,
    memory: Option<(MemorySource, u64)>,
    profile: Option<&'static GpuProfile>,
}

impl GpuSpecs {
    pub fn unknown() -> Self {
        GpuSpecs {
            name: "Unknown GPU".to_string(),
            memory_gb: None,
            memory_source: None,
            memory_type: None,
            driver_version: None,
            driver_date: None,
            resolution: None,
            refresh_rate_hz: None,
            architecture: None,
            features: GpuFeatures::default(),
        }
    }

    pub fn probe(inventory: &dyn HardwareInventory, adapters: &dyn GraphicsAdapterQuery) -> Self {
        let controllers = inventory
            .video_controllers()
            .or_absent("gpu.controllers")
            .unwrap_or_default();

        // The native API is only consulted for discrete-vendor devices.
        let native = if controllers.iter().any(|c| is_vendor_tagged(&c.name)) {
            adapters.adapters().or_absent("gpu.native").unwrap_or_default()
        } else {
            Vec::new()
        };

        let candidates: Vec<Candidate> = controllers
            .into_iter()
            .map(|record| resolve_candidate(record, &native))
            .collect();

        let Some(chosen) = select_device(
            &candidates,
            |c| c.record.name.as_str(),
            |c| c.memory.map(|(_, gb)| gb),
        ) else {
            tracing::debug!("no display controllers enumerated");
            return GpuSpecs::unknown();
        };

        tracing::debug!(
            device = %chosen.record.name,
            gb = ?chosen.memory.map(|(_, gb)| gb),
            "selected gpu"
        );
        GpuSpecs::from_candidate(chosen)
    }

    fn from_candidate(candidate: &Candidate) -> Self {
        let record = &candidate.record;
        let profile = candidate.profile;

        let resolution = record
            .resolution
            .clone()
            .and_then(|(w, h)| {
                if w > 0 && h > 0 {
                    Ok(format!("{w}x{h}"))
                } else {
                    Err(ProbeError::parse("gpu.resolution", format!("{w}x{h}")))
                }
            })
            .or_absent("gpu.resolution");

        GpuSpecs {
            name: record.name.clone(),
            memory_gb: candidate.memory.map(|(_, gb)| gb),
            memory_source: candidate.memory.map(|(tier, _)| tier),
            memory_type: profile.map(|p| p.memory_type.to_string()),
            driver_version: record
                .driver_version
                .clone()
                .or_absent("gpu.driver_version")
                .filter(|v| !v.trim().is_empty()),
            driver_date: record
                .driver_date
                .as_deref()
                .ok()
                .map(format_driver_date)
                .filter(|d| !d.is_empty()),
            resolution,
            refresh_rate_hz: record
                .refresh_rate_hz
                .clone()
                .or_absent("gpu.refresh_rate")
                .filter(|&hz| hz > 0),
            architecture: profile.map(|p| p.architecture.to_string()),
            features: profile.map(|p| p.features).unwrap_or_default(),
        }
    }
}

fn resolve_candidate(mut record: VideoControllerRecord, native: &[AdapterDescription]) -> Candidate {
    let native_memory: Reading<u64> = if is_vendor_tagged(&record.name) {
        match find_descriptor(&record, native) {
            Some((descriptor, by_slot)) => {
                if by_slot && !descriptor.name.trim().is_empty() {
                    record.name = descriptor.name.clone();
                }
                Ok(bytes_to_gb(descriptor.dedicated_video_memory))
            }
            None => Err(ProbeError::unavailable(
                "adapter",
                "no native descriptor for this device",
            )),
        }
    } else {
        Err(ProbeError::unavailable("adapter", "not a discrete-vendor device"))
    };

    let profile = heuristics::infer(&record.name);
    let memory = resolve_memory([
        (MemorySource::NativeDescriptor, native_memory),
        (
            MemorySource::AdapterRam,
            record.adapter_ram.clone().map(bytes_to_gb),
        ),
        (
            MemorySource::VideoMemory,
            record.video_memory.clone().map(bytes_to_gb),
        ),
        (
            MemorySource::ModelHeuristic,
            profile
                .map(|p| p.memory_gb)
                .ok_or_else(|| ProbeError::unavailable("heuristic", "no matching model")),
        ),
    ]);

    Candidate {
        record,
        memory,
        profile,
    }
}

/// Descriptor for a controller, and whether it matched by PCI slot.
fn find_descriptor<'a>(
    record: &VideoControllerRecord,
    native: &'a [AdapterDescription],
) -> Option<(&'a AdapterDescription, bool)> {
    if let Some(slot) = record.pci_slot.as_deref() {
        let slot = normalize_pci_slot(slot);
        let by_slot = native.iter().find(|d| {
            d.pci_slot
                .as_deref()
                .is_some_and(|other| normalize_pci_slot(other) == slot)
        });
        if let Some(descriptor) = by_slot {
            return Some((descriptor, true));
        }
    }
    native
        .iter()
        .find(|d| names_match(&d.name, &record.name))
        .map(|d| (d, false))
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::fixtures::{FakeAdapters, FakeInventory};

    const GIB: u64 = 1 << 30;

    fn controller(name: &str, adapter_ram: u64) -> VideoControllerRecord {
        VideoControllerRecord {
            adapter_ram: Ok(adapter_ram),
            ..VideoControllerRecord::named(name)
        }
    }

    fn inventory_with(controllers: Vec<VideoControllerRecord>) -> FakeInventory {
        FakeInventory {
            controllers: Ok(controllers),
            ..FakeInventory::default()
        }
    }

    #[test]
    fn laptop_4050_with_zero_everywhere_uses_the_table() {
        let inventory = inventory_with(vec![VideoControllerRecord {
            video_memory: Ok(0),
            ..controller("NVIDIA GeForce RTX 4050 Laptop GPU", 0)
        }]);
        let adapters = FakeAdapters::with(vec![AdapterDescription {
            name: "NVIDIA GeForce RTX 4050 Laptop GPU".into(),
            pci_slot: None,
            dedicated_video_memory: 0,
        }]);

        let gpu = GpuSpecs::probe(&inventory, &adapters);
        assert_eq!(gpu.memory_gb, Some(6));
        assert_eq!(gpu.memory_source, Some(MemorySource::ModelHeuristic));
        assert_eq!(gpu.memory_type.as_deref(), Some("GDDR6"));
        assert_eq!(gpu.architecture.as_deref(), Some("Ada Lovelace"));
        assert_eq!(
            gpu.features,
            GpuFeatures {
                advanced_upscaling: true,
                ray_tracing: true,
                directx12_ultimate: true,
                vendor_upscaling: true,
            }
        );
    }

    #[test]
    fn direct_reading_is_not_overridden_by_the_table() {
        let inventory = inventory_with(vec![controller("NVIDIA GeForce RTX 4050 Laptop GPU", 4 * GIB)]);
        let gpu = GpuSpecs::probe(&inventory, &FakeAdapters::failing());
        assert_eq!(gpu.memory_gb, Some(4));
        assert_eq!(gpu.memory_source, Some(MemorySource::AdapterRam));
        // Model-only fields still come from the table.
        assert_eq!(gpu.memory_type.as_deref(), Some("GDDR6"));
    }

    #[test]
    fn native_descriptor_beats_inventory_ram() {
        // Win32 AdapterRAM is a 32-bit field and caps at 4 GB.
        let inventory = inventory_with(vec![controller("NVIDIA GeForce RTX 3060", 4 * GIB)]);
        let adapters = FakeAdapters::with(vec![AdapterDescription {
            name: "NVIDIA GeForce RTX 3060".into(),
            pci_slot: None,
            dedicated_video_memory: 12 * GIB,
        }]);

        let gpu = GpuSpecs::probe(&inventory, &adapters);
        assert_eq!(gpu.memory_gb, Some(12));
        assert_eq!(gpu.memory_source, Some(MemorySource::NativeDescriptor));
    }

    #[test]
    fn slot_match_takes_the_descriptor_name() {
        let inventory = inventory_with(vec![VideoControllerRecord {
            pci_slot: Some("0000:01:00.0".into()),
            ..VideoControllerRecord::named("NVIDIA GPU")
        }]);
        let adapters = FakeAdapters::with(vec![AdapterDescription {
            name: "NVIDIA GeForce RTX 4070 Ti".into(),
            pci_slot: Some("00000000:01:00.0".into()),
            dedicated_video_memory: 12 * GIB,
        }]);

        let gpu = GpuSpecs::probe(&inventory, &adapters);
        assert_eq!(gpu.name, "NVIDIA GeForce RTX 4070 Ti");
        assert_eq!(gpu.memory_gb, Some(12));
        assert_eq!(gpu.memory_type.as_deref(), Some("GDDR6X"));
    }

    #[test]
    fn native_query_skipped_without_vendor_devices() {
        let inventory = inventory_with(vec![controller("Microsoft Basic Display Adapter", 0)]);
        let adapters = FakeAdapters::with(Vec::new());

        let gpu = GpuSpecs::probe(&inventory, &adapters);
        assert_eq!(adapters.calls(), 0);
        assert_eq!(gpu.name, "Microsoft Basic Display Adapter");
        assert_eq!(gpu.memory_gb, None);
        assert_eq!(gpu.features, GpuFeatures::default());
    }

    #[test]
    fn vendor_device_preferred_over_larger_integrated_one() {
        let inventory = inventory_with(vec![
            controller("Intel(R) UHD Graphics 770", 8 * GIB),
            controller("NVIDIA GeForce GTX 1650", 4 * GIB),
        ]);
        let gpu = GpuSpecs::probe(&inventory, &FakeAdapters::failing());
        assert_eq!(gpu.name, "NVIDIA GeForce GTX 1650");
    }

    #[test]
    fn unresolved_vendor_device_loses_to_resolved_one() {
        let inventory = inventory_with(vec![
            controller("AMD Radeon(TM) Graphics", 0),
            controller("NVIDIA GeForce RTX 3050 Laptop GPU", 0),
        ]);
        let gpu = GpuSpecs::probe(&inventory, &FakeAdapters::failing());
        assert_eq!(gpu.name, "NVIDIA GeForce RTX 3050 Laptop GPU");
        assert_eq!(gpu.memory_gb, Some(4));
    }

    #[test]
    fn linux_hybrid_laptop_picks_the_mobile_discrete_gpu() {
        // lspci names, amdgpu reporting 512 MiB carve-out, no NVIDIA driver loaded.
        let inventory = inventory_with(vec![
            controller(
                "Advanced Micro Devices, Inc. [AMD/ATI] Phoenix1",
                512 * 1024 * 1024,
            ),
            VideoControllerRecord::named("NVIDIA Corporation AD107M [GeForce RTX 4050 Max-Q / Mobile]"),
        ]);
        let gpu = GpuSpecs::probe(&inventory, &FakeAdapters::failing());
        assert_eq!(gpu.name, "NVIDIA Corporation AD107M [GeForce RTX 4050 Max-Q / Mobile]");
        assert_eq!(gpu.memory_gb, Some(6));
        assert_eq!(gpu.memory_source, Some(MemorySource::ModelHeuristic));
    }

    #[test]
    fn no_controllers_reports_unknown_gpu() {
        let inventory = FakeInventory::default();
        let gpu = GpuSpecs::probe(&inventory, &FakeAdapters::failing());
        assert_eq!(gpu, GpuSpecs::unknown());
    }

    #[test]
    fn display_and_driver_fields_are_normalized() {
        let inventory = inventory_with(vec![VideoControllerRecord {
            driver_version: Ok("32.0.15.6094".into()),
            driver_date: Ok("20250506000000.000000-000".into()),
            resolution: Ok((2560, 1440)),
            refresh_rate_hz: Ok(0),
            ..controller("AMD Radeon RX 6700 XT", 12 * GIB)
        }]);
        let gpu = GpuSpecs::probe(&inventory, &FakeAdapters::failing());
        assert_eq!(gpu.driver_version.as_deref(), Some("32.0.15.6094"));
        assert_eq!(gpu.driver_date.as_deref(), Some("06/05/2025"));
        assert_eq!(gpu.resolution.as_deref(), Some("2560x1440"));
        assert_eq!(gpu.refresh_rate_hz, None);
        assert_eq!(gpu.architecture.as_deref(), Some("RDNA 2"));
    }
}
