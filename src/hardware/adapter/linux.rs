use super::{empty_result, AdapterDescription, GraphicsAdapterQuery};
use crate::hardware::inventory::run_command_capture;
use crate::hardware::reading::{ProbeError, Reading};

const MIB: u64 = 1024 * 1024;

/// NVIDIA adapters through `nvidia-smi`; other vendors report via sysfs instead.
pub(super) struct NvidiaSmiQuery;

impl GraphicsAdapterQuery for NvidiaSmiQuery {
    fn adapters(&self) -> Reading<Vec<AdapterDescription>> {
        let stdout = run_command_capture(
            "nvidia-smi",
            &[
                "--query-gpu=name,pci.bus_id,memory.total",
                "--format=csv,noheader,nounits",
            ],
        )?;
        let adapters = parse_nvidia_smi(&stdout)?;
        if adapters.is_empty() {
            return Err(empty_result("nvidia-smi"));
        }
        Ok(adapters)
    }
}

/// `NVIDIA GeForce RTX 4050 Laptop GPU, 00000000:01:00.0, 6141`
fn parse_nvidia_smi(stdout: &str) -> Reading<Vec<AdapterDescription>> {
    stdout
        .lines()
        .filter(|line| !line.trim().is_empty())
        .map(|line| {
            let parts: Vec<&str> = line.split(',').map(str::trim).collect();
            if parts.len() < 3 {
                return Err(ProbeError::parse("nvidia-smi", line));
            }

            let raw_name = parts[0];
            let name = if raw_name.starts_with("NVIDIA") {
                raw_name.to_string()
            } else {
                format!("NVIDIA {raw_name}")
            };
            let memory_mib: u64 = parts[2]
                .parse()
                .map_err(|_| ProbeError::parse("nvidia-smi.memory", parts[2]))?;

            Ok(AdapterDescription {
                name,
                pci_slot: Some(parts[1].to_string()).filter(|s| !s.is_empty()),
                dedicated_video_memory: memory_mib * MIB,
            })
        })
        .collect()
}
