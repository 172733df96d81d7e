//! DXGI adapter enumeration

use windows::Win32::Graphics::Dxgi::{
    CreateDXGIFactory1, IDXGIFactory1, DXGI_ADAPTER_DESC1, DXGI_ADAPTER_FLAG_SOFTWARE,
};

use super::{empty_result, AdapterDescription, GraphicsAdapterQuery};
use crate::hardware::reading::{ProbeError, Reading};

pub(super) struct DxgiQuery;

impl GraphicsAdapterQuery for DxgiQuery {
    fn adapters(&self) -> Reading<Vec<AdapterDescription>> {
        let factory: IDXGIFactory1 = unsafe { CreateDXGIFactory1::<IDXGIFactory1>() }
            .map_err(|err| {
                ProbeError::unavailable("dxgi", format!("CreateDXGIFactory1 failed: {err}"))
            })?;

        let mut adapters = Vec::new();
        let mut index: u32 = 0;
        // EnumAdapters1 fails with DXGI_ERROR_NOT_FOUND past the last adapter.
        while let Ok(adapter) = unsafe { factory.EnumAdapters1(index) } {
            index += 1;
            let Ok(desc) = (unsafe { adapter.GetDesc1() }) else {
                continue;
            };
            if desc.Flags & DXGI_ADAPTER_FLAG_SOFTWARE.0 as u32 != 0 {
                continue;
            }
            adapters.push(describe(&desc));
        }

        if adapters.is_empty() {
            return Err(empty_result("dxgi"));
        }
        Ok(adapters)
    }
}

fn describe(desc: &DXGI_ADAPTER_DESC1) -> AdapterDescription {
    let len = desc
        .Description
        .iter()
        .position(|&c| c == 0)
        .unwrap_or(desc.Description.len());
    AdapterDescription {
        name: String::from_utf16_lossy(&desc.Description[..len]).trim().to_string(),
        pci_slot: None,
        dedicated_video_memory: desc.DedicatedVideoMemory as u64,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn descriptor_name_stops_at_nul() {
        let mut desc = DXGI_ADAPTER_DESC1::default();
        for (slot, unit) in desc.Description.iter_mut().zip("NVIDIA GeForce RTX 4060 ".encode_utf16()) {
            *slot = unit;
        }
        desc.DedicatedVideoMemory = 8 << 30;

        let described = describe(&desc);
        assert_eq!(described.name, "NVIDIA GeForce RTX 4060");
        assert_eq!(described.dedicated_video_memory, 8 << 30);
        assert_eq!(described.pci_slot, None);
    }
}
