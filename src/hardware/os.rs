use serde::{Deserialize, Serialize};

use super::host::HostSampler;
use super::inventory::HardwareInventory;
use super::reading::ReadingExt;

/// Operating system identity
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OsSpecs {
    pub name: String,
    pub version: String,
    /// Windows build number or Linux kernel release
    pub build: Option<String>,
    /// Graphics API runtime (e.g., "DirectX 12", "Vulkan 1.3.275")
    pub graphics_api_version: Option<String>,
}

impl OsSpecs {
    pub fn probe(inventory: &dyn HardwareInventory, host: &dyn HostSampler) -> Self {
        OsSpecs {
            name: host.os_name().unwrap_or_else(|| "Unknown".to_string()),
            version: host.os_version().unwrap_or_else(|| "Unknown".to_string()),
            build: inventory.os_build().or_absent("os.build"),
            graphics_api_version: inventory
                .graphics_api_version()
                .or_absent("os.graphics_api"),
        }
    }
}
