//! In-memory stand-ins for the three OS handles.

use std::cell::Cell;

use super::adapter::{AdapterDescription, GraphicsAdapterQuery};
use super::cpu::CpuSpecs;
use super::gpu::GpuSpecs;
use super::host::{CpuSample, HostSampler, MemorySample, PartitionSample};
use super::inventory::{
    HardwareInventory, MemoryModuleRecord, PhysicalDiskRecord, ProcessorRecord,
    VideoControllerRecord,
};
use super::os::OsSpecs;
use super::ram::MemorySpecs;
use super::reading::{ProbeError, Reading};
use super::SystemSpecs;

fn missing<T>() -> Reading<T> {
    Err(ProbeError::unavailable("fake", "not set"))
}

pub struct FakeInventory {
    pub processor: Reading<ProcessorRecord>,
    pub temperature: Reading<f64>,
    pub architecture: Reading<String>,
    pub modules: Reading<Vec<MemoryModuleRecord>>,
    pub controllers: Reading<Vec<VideoControllerRecord>>,
    pub disks: Reading<Vec<PhysicalDiskRecord>>,
    pub os_build: Reading<String>,
    pub graphics_api: Reading<String>,
}

impl Default for FakeInventory {
    fn default() -> Self {
        FakeInventory {
            processor: missing(),
            temperature: missing(),
            architecture: missing(),
            modules: missing(),
            controllers: missing(),
            disks: missing(),
            os_build: missing(),
            graphics_api: missing(),
        }
    }
}

impl HardwareInventory for FakeInventory {
    fn backend(&self) -> &'static str {
        "fake"
    }

    fn processor(&self) -> Reading<ProcessorRecord> {
        self.processor.clone()
    }

    fn cpu_temperature(&self) -> Reading<f64> {
        self.temperature.clone()
    }

    fn machine_architecture(&self) -> Reading<String> {
        self.architecture.clone()
    }

    fn memory_modules(&self) -> Reading<Vec<MemoryModuleRecord>> {
        self.modules.clone()
    }

    fn video_controllers(&self) -> Reading<Vec<VideoControllerRecord>> {
        self.controllers.clone()
    }

    fn physical_disks(&self) -> Reading<Vec<PhysicalDiskRecord>> {
        self.disks.clone()
    }

    fn os_build(&self) -> Reading<String> {
        self.os_build.clone()
    }

    fn graphics_api_version(&self) -> Reading<String> {
        self.graphics_api.clone()
    }
}

/// Adapter query that counts how often it is asked.
pub struct FakeAdapters {
    result: Reading<Vec<AdapterDescription>>,
    calls: Cell<usize>,
}

impl FakeAdapters {
    pub fn with(adapters: Vec<AdapterDescription>) -> Self {
        FakeAdapters {
            result: Ok(adapters),
            calls: Cell::new(0),
        }
    }

    pub fn failing() -> Self {
        FakeAdapters {
            result: missing(),
            calls: Cell::new(0),
        }
    }

    pub fn calls(&self) -> usize {
        self.calls.get()
    }
}

impl GraphicsAdapterQuery for FakeAdapters {
    fn adapters(&self) -> Reading<Vec<AdapterDescription>> {
        self.calls.set(self.calls.get() + 1);
        self.result.clone()
    }
}

#[derive(Default)]
pub struct FakeHost {
    pub cpu: CpuSample,
    pub memory: MemorySample,
    pub partitions: Vec<PartitionSample>,
    pub os_name: Option<String>,
    pub os_version: Option<String>,
}

impl HostSampler for FakeHost {
    fn cpu(&self) -> CpuSample {
        self.cpu.clone()
    }

    fn memory(&self) -> MemorySample {
        self.memory
    }

    fn partitions(&self) -> Vec<PartitionSample> {
        self.partitions.clone()
    }

    fn os_name(&self) -> Option<String> {
        self.os_name.clone()
    }

    fn os_version(&self) -> Option<String> {
        self.os_version.clone()
    }
}

/// A plausible desktop snapshot for consumers of [`SystemSpecs`].
pub fn sample_specs() -> SystemSpecs {
    SystemSpecs {
        cpu: CpuSpecs {
            name: "AMD Ryzen 5 5600X".into(),
            physical_cores: 6,
            logical_threads: 12,
            base_clock_ghz: Some(3.7),
            max_clock_ghz: Some(4.6),
            temperature_c: None,
            load_percent: Some(4.0),
            architecture: Some("x64".into()),
        },
        memory: MemorySpecs {
            total_gb: 16,
            used_gb: 6,
            free_gb: 10,
            speed_mhz: Some(3200),
            memory_type: Some("DDR4".into()),
        },
        gpu: GpuSpecs {
            name: "NVIDIA GeForce RTX 3060".into(),
            memory_gb: Some(12),
            ..GpuSpecs::unknown()
        },
        storage: Vec::new(),
        os: OsSpecs {
            name: "Windows".into(),
            version: "11".into(),
            build: Some("26100".into()),
            graphics_api_version: Some("DirectX 12".into()),
        },
    }
}
