//! System snapshot aggregator

use std::time::Instant;

use serde::{Deserialize, Serialize};

use super::adapter::{self, GraphicsAdapterQuery};
use super::cpu::CpuSpecs;
use super::gpu::GpuSpecs;
use super::host::{HostSampler, SysinfoSampler};
use super::inventory::{self, HardwareInventory, InventoryError};
use super::os::OsSpecs;
use super::ram::MemorySpecs;
use super::storage::StorageDevice;

/// Complete hardware snapshot
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct SystemSpecs {
    pub cpu: CpuSpecs,
    pub memory: MemorySpecs,
    pub gpu: GpuSpecs,
    pub storage: Vec<StorageDevice>,
    pub os: OsSpecs,
}

/// Run one probe stage and log how long it took.
fn timed<T>(stage: &'static str, probe: impl FnOnce() -> T) -> T {
    let started = Instant::now();
    let value = probe();
    tracing::debug!(stage, elapsed_ms = started.elapsed().as_millis() as u64, "probe finished");
    value
}

impl SystemSpecs {
    /// Probe the live system.
    ///
    /// Fails only when the hardware inventory cannot be opened; every other
    /// problem leaves the affected fields absent.
    pub fn collect() -> Result<Self, InventoryError> {
        let inventory = inventory::connect()?;
        let adapters = adapter::platform_query();
        Ok(Self::collect_with(
            inventory.as_ref(),
            adapters.as_ref(),
            &SysinfoSampler,
        ))
    }

    /// Probe through explicit handles, in the order CPU, RAM, GPU, storage, OS.
    pub fn collect_with(
        inventory: &dyn HardwareInventory,
        adapters: &dyn GraphicsAdapterQuery,
        host: &dyn HostSampler,
    ) -> Self {
        let started = Instant::now();

        let cpu = timed("cpu", || CpuSpecs::probe(inventory, host));
        let memory = timed("ram", || MemorySpecs::probe(inventory, host));
        let gpu = timed("gpu", || GpuSpecs::probe(inventory, adapters));
        let storage = timed("storage", || StorageDevice::probe_all(inventory, host));
        let os = timed("os", || OsSpecs::probe(inventory, host));

        tracing::info!(
            backend = inventory.backend(),
            gpu = %gpu.name,
            volumes = storage.len(),
            elapsed_ms = started.elapsed().as_millis() as u64,
            "hardware snapshot collected"
        );

        SystemSpecs {
            cpu,
            memory,
            gpu,
            storage,
            os,
        }
    }

    /// Fixed-width boxed report
    pub fn display(&self) -> String {
        const WIDTH: usize = 62;
        let mut output = String::new();
        let rule = |left: char, right: char| format!("{left}{}{right}\n", "═".repeat(WIDTH));

        output.push_str(&rule('╔', '╗'));
        output.push_str(&format!("║{:^WIDTH$}║\n", "SYSTEM SPECIFICATIONS"));
        output.push_str(&rule('╠', '╣'));

        let format_line = |label: &str, content: &str| -> String {
            let room = WIDTH.saturating_sub(2 + label.chars().count());
            let content: String = content.chars().take(room).collect();
            format!("║ {label}{content:<room$} ║\n")
        };
        const INDENT: &str = "      ";

        // CPU
        output.push_str(&format_line("CPU:  ", &self.cpu.name));
        output.push_str(&format_line(
            INDENT,
            &format!(
                "{} cores / {} threads",
                self.cpu.physical_cores, self.cpu.logical_threads
            ),
        ));
        match (self.cpu.base_clock_ghz, self.cpu.max_clock_ghz) {
            (Some(base), Some(max)) if max > base => {
                output.push_str(&format_line(INDENT, &format!("{base:.2} GHz (boost {max:.2} GHz)")))
            }
            (Some(base), _) => output.push_str(&format_line(INDENT, &format!("{base:.2} GHz"))),
            (None, Some(max)) => {
                output.push_str(&format_line(INDENT, &format!("boost {max:.2} GHz")))
            }
            (None, None) => {}
        }
        let mut live = Vec::new();
        if let Some(load) = self.cpu.load_percent {
            live.push(format!("Load: {load:.1}%"));
        }
        if let Some(temp) = self.cpu.temperature_c {
            live.push(format!("Temp: {temp:.1}°C"));
        }
        if let Some(ref arch) = self.cpu.architecture {
            live.push(format!("Arch: {arch}"));
        }
        if !live.is_empty() {
            output.push_str(&format_line(INDENT, &live.join(" | ")));
        }

        output.push_str(&rule('╠', '╣'));

        // RAM
        let mut ram_info = format!(
            "{} GB ({} GB used, {} GB free)",
            self.memory.total_gb, self.memory.used_gb, self.memory.free_gb
        );
        if let Some(ref ram_type) = self.memory.memory_type {
            ram_info.push_str(&format!(" | {ram_type}"));
        }
        if let Some(speed) = self.memory.speed_mhz {
            ram_info.push_str(&format!(" | {speed} MHz"));
        }
        output.push_str(&format_line("RAM:  ", &ram_info));

        output.push_str(&rule('╠', '╣'));

        // GPU
        output.push_str(&format_line("GPU:  ", &self.gpu.name));
        if let Some(vram) = self.gpu.memory_gb {
            let mut vram_info = format!("VRAM: {vram} GB");
            if let Some(ref kind) = self.gpu.memory_type {
                vram_info.push_str(&format!(" {kind}"));
            }
            if let Some(source) = self.gpu.memory_source {
                vram_info.push_str(&format!(" (via {})", source.label()));
            }
            output.push_str(&format_line(INDENT, &vram_info));
        }
        if let Some(ref arch) = self.gpu.architecture {
            output.push_str(&format_line(INDENT, &format!("Architecture: {arch}")));
        }
        if let Some(ref driver) = self.gpu.driver_version {
            let date = self
                .gpu
                .driver_date
                .as_ref()
                .map(|d| format!(" ({d})"))
                .unwrap_or_default();
            output.push_str(&format_line(INDENT, &format!("Driver: {driver}{date}")));
        }
        if let Some(ref resolution) = self.gpu.resolution {
            let refresh = self
                .gpu
                .refresh_rate_hz
                .map(|hz| format!(" @ {hz} Hz"))
                .unwrap_or_default();
            output.push_str(&format_line(INDENT, &format!("Display: {resolution}{refresh}")));
        }
        let features = self.gpu.features;
        let flags: Vec<&str> = [
            (features.advanced_upscaling, "Frame Gen"),
            (features.ray_tracing, "Ray Tracing"),
            (features.directx12_ultimate, "DX12 Ultimate"),
            (features.vendor_upscaling, "DLSS"),
        ]
        .iter()
        .filter(|(on, _)| *on)
        .map(|(_, label)| *label)
        .collect();
        if !flags.is_empty() {
            output.push_str(&format_line(INDENT, &flags.join(", ")));
        }

        output.push_str(&rule('╠', '╣'));

        // Storage
        if self.storage.is_empty() {
            output.push_str(&format_line("DISK: ", "none readable"));
        }
        for (i, device) in self.storage.iter().enumerate() {
            let label = if i == 0 { "DISK: " } else { INDENT };
            output.push_str(&format_line(
                label,
                &format!(
                    "{} {} GB ({} GB free) {}",
                    device.mount_point,
                    device.total_gb,
                    device.free_gb,
                    device.medium.label()
                ),
            ));
        }

        output.push_str(&rule('╠', '╣'));

        // OS
        let mut os_str = format!("{} {}", self.os.name, self.os.version);
        if let Some(ref build) = self.os.build {
            os_str.push_str(&format!(" (build {build})"));
        }
        output.push_str(&format_line("OS:   ", &os_str));
        if let Some(ref api) = self.os.graphics_api_version {
            output.push_str(&format_line(INDENT, api));
        }

        output.push_str(&format!("╚{}╝", "═".repeat(WIDTH)));

        output
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::fixtures::{FakeAdapters, FakeHost, FakeInventory};
    use crate::hardware::host::{CpuSample, MemorySample, PartitionSample};
    use crate::hardware::inventory::VideoControllerRecord;

    const GIB: u64 = 1 << 30;

    fn host() -> FakeHost {
        FakeHost {
            cpu: CpuSample {
                brand: Some("Intel(R) Core(TM) i7-13700H".into()),
                logical_threads: 20,
                physical_cores: Some(14),
                frequency_mhz: Some(2400),
                load_percent: Some(7.5),
            },
            memory: MemorySample {
                total_bytes: 16 * GIB,
                available_bytes: 10 * GIB,
            },
            partitions: vec![PartitionSample {
                device: "C:\\".into(),
                mount_point: "C:\\".into(),
                total_bytes: 512 * GIB,
                available_bytes: 200 * GIB,
            }],
            os_name: Some("Windows".into()),
            os_version: Some("11 (26100)".into()),
        }
    }

    #[test]
    fn collects_from_every_probe() {
        let inventory = FakeInventory {
            controllers: Ok(vec![VideoControllerRecord::named(
                "NVIDIA GeForce RTX 4050 Laptop GPU",
            )]),
            os_build: Ok("26100".into()),
            ..FakeInventory::default()
        };

        let specs = SystemSpecs::collect_with(&inventory, &FakeAdapters::failing(), &host());
        assert_eq!(specs.cpu.physical_cores, 14);
        assert_eq!(specs.memory.total_gb, 16);
        assert_eq!(specs.gpu.memory_gb, Some(6));
        assert_eq!(specs.storage.len(), 1);
        assert_eq!(specs.os.build.as_deref(), Some("26100"));
    }

    #[test]
    fn json_keeps_absent_fields_as_null() {
        let specs =
            SystemSpecs::collect_with(&FakeInventory::default(), &FakeAdapters::failing(), &host());
        let json = serde_json::to_value(&specs).unwrap();

        assert!(json["gpu"]["memory_gb"].is_null());
        assert!(json["gpu"].as_object().unwrap().contains_key("driver_date"));
        assert!(json["cpu"]["temperature_c"].is_null());
        assert!(json["memory"].as_object().unwrap().contains_key("speed_mhz"));
        assert!(json["os"]["graphics_api_version"].is_null());
        assert_eq!(json["gpu"]["name"], "Unknown GPU");
        assert_eq!(json["gpu"]["features"]["ray_tracing"], false);
        assert_eq!(json["storage"][0]["medium"], "unknown");
    }

    #[test]
    fn report_lines_have_equal_width() {
        let inventory = FakeInventory {
            controllers: Ok(vec![VideoControllerRecord::named(
                "NVIDIA GeForce RTX 4050 Laptop GPU",
            )]),
            ..FakeInventory::default()
        };
        let specs = SystemSpecs::collect_with(&inventory, &FakeAdapters::failing(), &host());
        let report = specs.display();

        let widths: Vec<usize> = report.lines().map(|l| l.chars().count()).collect();
        assert!(widths.iter().all(|&w| w == widths[0]), "{report}");
        assert!(report.contains("VRAM: 6 GB GDDR6 (via model heuristic)"));
    }
}
