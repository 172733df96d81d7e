use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};

use super::{
    run_command_capture, HardwareInventory, InventoryError, MemoryModuleRecord,
    PhysicalDiskRecord, ProcessorRecord, VideoControllerRecord,
};
use crate::hardware::reading::{non_placeholder, parse_positive, ProbeError, Reading};
use crate::hardware::storage::MediumType;
use crate::hardware::units::{plausible_temperature, Frequency};

const PROC_CPUINFO: &str = "/proc/cpuinfo";
const SYS_CLASS: &str = "/sys/class";
const DRM_PATH: &str = "/sys/class/drm";
const BLOCK_PATH: &str = "/sys/block";
const HWMON_PATH: &str = "/sys/class/hwmon";
const THERMAL_PATH: &str = "/sys/class/thermal";

/// hwmon drivers that report package/die temperature.
const CPU_HWMON_DRIVERS: &[&str] = &["coretemp", "k10temp", "zenpower", "cpu_thermal"];

/// Block devices that are never physical disks.
const VIRTUAL_BLOCK_PREFIXES: &[&str] = &["loop", "ram", "zram", "dm-", "md", "sr", "fd"];

pub(super) struct LinuxInventory {
    root: PathBuf,
}

impl LinuxInventory {
    pub(super) fn open() -> Result<Self, InventoryError> {
        Self::open_at(Path::new("/"))
    }

    fn open_at(root: &Path) -> Result<Self, InventoryError> {
        let inventory = LinuxInventory {
            root: root.to_path_buf(),
        };

        if !inventory.path(SYS_CLASS).is_dir() {
            return Err(InventoryError::Connect {
                backend: "sysfs",
                detail: format!("{} is not mounted", inventory.path(SYS_CLASS).display()),
                cause: None,
            });
        }

        fs::read_to_string(inventory.path(PROC_CPUINFO)).map_err(|err| {
            InventoryError::Connect {
                backend: "procfs",
                detail: format!("{} is not readable", inventory.path(PROC_CPUINFO).display()),
                cause: Some(err),
            }
        })?;

        Ok(inventory)
    }

    fn path(&self, absolute: &str) -> PathBuf {
        self.root.join(absolute.trim_start_matches('/'))
    }

    fn read_trimmed(&self, path: &Path) -> Reading<String> {
        fs::read_to_string(path)
            .map(|content| content.trim().to_string())
            .map_err(|err| ProbeError::unavailable("sysfs", format!("{}: {err}", path.display())))
    }

    fn cpuinfo_field(&self, key: &str) -> Reading<String> {
        let content = self.read_trimmed(&self.path(PROC_CPUINFO))?;
        content
            .lines()
            .find_map(|line| {
                let (name, value) = line.split_once(':')?;
                (name.trim() == key).then(|| value.trim().to_string())
            })
            .ok_or_else(|| ProbeError::unavailable("procfs", format!("no '{key}' in cpuinfo")))
    }

    /// cpufreq value in kHz for cpu0, trying each file in order.
    fn cpufreq_khz(&self, files: &[&str]) -> Reading<Frequency> {
        let base = self.path("/sys/devices/system/cpu/cpu0/cpufreq");
        let mut last_err = ProbeError::unavailable("cpufreq", "no cpufreq interface");
        for file in files {
            match self
                .read_trimmed(&base.join(file))
                .and_then(|raw| parse_positive("cpu.clock", &raw))
            {
                Ok(khz) => return Ok(Frequency::khz(khz)),
                Err(err) => last_err = err,
            }
        }
        Err(last_err)
    }

    fn physical_core_count(&self) -> Reading<usize> {
        let content = self.read_trimmed(&self.path(PROC_CPUINFO))?;
        let mut cores = HashSet::new();
        let mut physical_id = String::new();
        for line in content.lines() {
            let Some((key, value)) = line.split_once(':') else {
                continue;
            };
            match key.trim() {
                "physical id" => physical_id = value.trim().to_string(),
                "core id" => {
                    cores.insert((physical_id.clone(), value.trim().to_string()));
                }
                _ => {}
            }
        }
        if cores.is_empty() {
            return Err(ProbeError::unavailable("procfs", "no core ids in cpuinfo"));
        }
        Ok(cores.len())
    }

    fn hwmon_temperature(&self) -> Reading<f64> {
        let entries = fs::read_dir(self.path(HWMON_PATH))
            .map_err(|err| ProbeError::unavailable("hwmon", err.to_string()))?;

        for entry in entries.flatten() {
            let dir = entry.path();
            let Ok(driver) = self.read_trimmed(&dir.join("name")) else {
                continue;
            };
            if !CPU_HWMON_DRIVERS.contains(&driver.as_str()) {
                continue;
            }
            if let Ok(millis) = self
                .read_trimmed(&dir.join("temp1_input"))
                .and_then(|raw| parse_positive("cpu.temperature", &raw))
            {
                return plausible_temperature(millis as f64 / 1000.0);
            }
        }

        Err(ProbeError::unavailable("hwmon", "no cpu sensor"))
    }

    fn thermal_zone_temperature(&self) -> Reading<f64> {
        let entries = fs::read_dir(self.path(THERMAL_PATH))
            .map_err(|err| ProbeError::unavailable("thermal", err.to_string()))?;

        for entry in entries.flatten() {
            let dir = entry.path();
            let Ok(zone_type) = self.read_trimmed(&dir.join("type")) else {
                continue;
            };
            if zone_type != "x86_pkg_temp" && !zone_type.contains("cpu") {
                continue;
            }
            if let Ok(millis) = self
                .read_trimmed(&dir.join("temp"))
                .and_then(|raw| parse_positive("cpu.temperature", &raw))
            {
                return plausible_temperature(millis as f64 / 1000.0);
            }
        }

        Err(ProbeError::unavailable("thermal", "no cpu thermal zone"))
    }

    /// Memory device entries from `dmidecode -t 17` (needs root).
    fn dmidecode_modules(&self) -> Reading<Vec<MemoryModuleRecord>> {
        let stdout = run_command_capture("dmidecode", &["-t", "17"])?;
        let modules = parse_dmidecode_memory(&stdout);
        if modules.is_empty() {
            return Err(ProbeError::unavailable("dmidecode", "no populated memory devices"));
        }
        Ok(modules)
    }

    /// Memory type from EDAC when the kernel exposes it.
    fn edac_module(&self) -> Reading<MemoryModuleRecord> {
        let mut type_label = Err(ProbeError::unavailable("edac", "no dimm type"));
        for mc in ["mc0", "mc1"] {
            let mc_path = self.path("/sys/devices/system/edac/mc").join(mc);
            let Ok(entries) = fs::read_dir(&mc_path) else {
                continue;
            };
            for entry in entries.flatten() {
                let dimm_type = entry.path().join("dimm_mem_type");
                if let Ok(raw) = self.read_trimmed(&dimm_type) {
                    // "Unbuffered-DDR4", "Registered-DDR5"
                    if let Some(label) = raw.rsplit('-').next().filter(|l| l.starts_with("DDR")) {
                        type_label = Ok(label.to_string());
                        break;
                    }
                }
            }
        }

        let speed_mhz = self
            .read_trimmed(&self.path("/sys/devices/system/edac/mc/mc0/clock_speed"))
            .and_then(|raw| parse_positive("memory.speed", &raw));

        if type_label.is_err() && speed_mhz.is_err() {
            return Err(ProbeError::unavailable("edac", "no memory controller info"));
        }

        Ok(MemoryModuleRecord {
            speed_mhz,
            type_label,
        })
    }

    fn drm_cards(&self) -> Reading<Vec<PathBuf>> {
        let entries = fs::read_dir(self.path(DRM_PATH))
            .map_err(|err| ProbeError::unavailable("drm", err.to_string()))?;

        let mut cards: Vec<PathBuf> = entries
            .flatten()
            .filter(|entry| {
                let name = entry.file_name();
                let name = name.to_string_lossy();
                name.starts_with("card") && !name.contains('-')
            })
            .map(|entry| entry.path())
            .collect();
        cards.sort();
        Ok(cards)
    }

    fn video_controller(&self, card: &Path) -> VideoControllerRecord {
        let device = card.join("device");
        let uevent = self.read_trimmed(&device.join("uevent")).unwrap_or_default();
        let pci_slot = uevent_value(&uevent, "PCI_SLOT_NAME");
        let vendor = self
            .read_trimmed(&device.join("vendor"))
            .map(|id| vendor_name(&id))
            .unwrap_or("Unknown");

        let name = pci_slot
            .as_deref()
            .and_then(|slot| run_command_capture("lspci", &["-s", slot]).ok())
            .and_then(|stdout| stdout.lines().next().map(parse_lspci_name))
            .filter(|name| !name.is_empty())
            .unwrap_or_else(|| format!("{vendor} GPU"));

        let driver = uevent_value(&uevent, "DRIVER");
        let driver_version = match driver.as_deref() {
            Some(module) => self
                .read_trimmed(&self.path("/sys/module").join(module).join("version"))
                .and_then(|raw| non_placeholder("gpu.driver_version", &raw)),
            None => Err(ProbeError::unavailable("drm", "no bound driver")),
        };

        let adapter_ram = self
            .read_trimmed(&device.join("mem_info_vram_total"))
            .and_then(|raw| parse_positive("gpu.adapter_ram", &raw));

        VideoControllerRecord {
            name,
            pci_slot,
            adapter_ram,
            video_memory: Err(ProbeError::unavailable(
                "drm",
                "no secondary memory attribute on linux",
            )),
            driver_version,
            driver_date: Err(ProbeError::unavailable("drm", "driver date not exposed")),
            resolution: self.connected_mode(card),
            refresh_rate_hz: Err(ProbeError::unavailable("drm", "refresh rate not exposed")),
        }
    }

    /// Preferred mode of the first connected connector on this card.
    fn connected_mode(&self, card: &Path) -> Reading<(u32, u32)> {
        let card_name = card
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_default();
        let prefix = format!("{card_name}-");

        let entries = fs::read_dir(self.path(DRM_PATH))
            .map_err(|err| ProbeError::unavailable("drm", err.to_string()))?;
        let mut connectors: Vec<PathBuf> = entries
            .flatten()
            .filter(|e| e.file_name().to_string_lossy().starts_with(&prefix))
            .map(|e| e.path())
            .collect();
        connectors.sort();

        for connector in connectors {
            if self.read_trimmed(&connector.join("status")).as_deref() != Ok("connected") {
                continue;
            }
            if let Ok(modes) = self.read_trimmed(&connector.join("modes")) {
                if let Some(mode) = modes.lines().next().and_then(parse_mode) {
                    return Ok(mode);
                }
            }
        }

        Err(ProbeError::unavailable("drm", "no connected display"))
    }
}

impl HardwareInventory for LinuxInventory {
    fn backend(&self) -> &'static str {
        "linux-sysfs"
    }

    fn processor(&self) -> Reading<ProcessorRecord> {
        let name = self
            .cpuinfo_field("model name")
            .or_else(|_| self.cpuinfo_field("Hardware"))
            .and_then(|raw| non_placeholder("cpu.name", &raw));

        let current_clock = self
            .cpuinfo_field("cpu MHz")
            .and_then(|raw| {
                raw.parse::<f64>()
                    .map_err(|_| ProbeError::parse("cpu.clock", raw.clone()))
            })
            .and_then(|mhz| {
                if mhz >= 1.0 {
                    Ok(Frequency::mhz(mhz.round() as u64))
                } else {
                    Err(ProbeError::unavailable("procfs", "cpu MHz reported zero"))
                }
            })
            .or_else(|_| self.cpufreq_khz(&["base_frequency", "scaling_cur_freq"]));

        Ok(ProcessorRecord {
            name,
            physical_cores: self.physical_core_count(),
            current_clock,
            max_clock: self.cpufreq_khz(&["cpuinfo_max_freq", "scaling_max_freq"]),
        })
    }

    fn cpu_temperature(&self) -> Reading<f64> {
        self.hwmon_temperature()
            .or_else(|_| self.thermal_zone_temperature())
    }

    fn machine_architecture(&self) -> Reading<String> {
        run_command_capture("uname", &["-m"])
            .and_then(|raw| non_placeholder("cpu.architecture", &raw))
    }

    fn memory_modules(&self) -> Reading<Vec<MemoryModuleRecord>> {
        self.dmidecode_modules()
            .or_else(|_| self.edac_module().map(|module| vec![module]))
    }

    fn video_controllers(&self) -> Reading<Vec<VideoControllerRecord>> {
        let cards = self.drm_cards()?;
        if cards.is_empty() {
            return Err(ProbeError::unavailable("drm", "no display cards"));
        }
        Ok(cards
            .iter()
            .map(|card| self.video_controller(card))
            .collect())
    }

    fn physical_disks(&self) -> Reading<Vec<PhysicalDiskRecord>> {
        let entries = fs::read_dir(self.path(BLOCK_PATH))
            .map_err(|err| ProbeError::unavailable("block", err.to_string()))?;

        let mut disks: Vec<PhysicalDiskRecord> = entries
            .flatten()
            .filter_map(|entry| {
                let name = entry.file_name().to_string_lossy().into_owned();
                if VIRTUAL_BLOCK_PREFIXES.iter().any(|p| name.starts_with(p)) {
                    return None;
                }
                let dir = entry.path();
                let model = self
                    .read_trimmed(&dir.join("device/model"))
                    .and_then(|raw| non_placeholder("disk.model", &raw));
                let media_hint = if name.starts_with("nvme") {
                    Ok(MediumType::Nvme)
                } else {
                    match self.read_trimmed(&dir.join("queue/rotational")).as_deref() {
                        Ok("1") => Ok(MediumType::Rotating),
                        Ok("0") => Ok(MediumType::SataSsd),
                        Ok(other) => Err(ProbeError::parse("disk.rotational", other)),
                        Err(err) => Err(err.clone()),
                    }
                };
                Some(PhysicalDiskRecord {
                    device_id: format!("/dev/{name}"),
                    model,
                    media_hint,
                })
            })
            .collect();

        if disks.is_empty() {
            return Err(ProbeError::unavailable("block", "no physical disks"));
        }
        disks.sort_by(|a, b| a.device_id.cmp(&b.device_id));
        Ok(disks)
    }

    fn os_build(&self) -> Reading<String> {
        self.read_trimmed(&self.path("/proc/sys/kernel/osrelease"))
            .and_then(|raw| non_placeholder("os.build", &raw))
    }

    fn graphics_api_version(&self) -> Reading<String> {
        let stdout = run_command_capture("vulkaninfo", &["--summary"])?;
        parse_vulkan_version(&stdout)
            .map(|version| format!("Vulkan {version}"))
            .ok_or_else(|| ProbeError::unavailable("vulkaninfo", "no instance version"))
    }
}

fn vendor_name(pci_vendor_id: &str) -> &'static str {
    match pci_vendor_id {
        "0x10de" => "NVIDIA",
        "0x1002" => "AMD",
        "0x8086" => "Intel",
        _ => "Unknown",
    }
}

fn uevent_value(uevent: &str, key: &str) -> Option<String> {
    uevent.lines().find_map(|line| {
        line.strip_prefix(key)
            .and_then(|rest| rest.strip_prefix('='))
            .map(|value| value.trim().to_string())
    })
}

/// Device description from one lspci line.
///
/// `01:00.0 VGA compatible controller: NVIDIA Corporation AD107M [GeForce RTX 4050 Max-Q / Mobile] (rev a1)`
fn parse_lspci_name(line: &str) -> String {
    let after_class = match line.find(": ") {
        Some(idx) => &line[idx + 2..],
        None => line,
    };
    match after_class.rfind(" (rev") {
        Some(rev_idx) => after_class[..rev_idx].trim().to_string(),
        None => after_class.trim().to_string(),
    }
}

/// `1920x1080` (optionally followed by `i` for interlaced modes).
fn parse_mode(line: &str) -> Option<(u32, u32)> {
    let (width, height) = line.trim().split_once('x')?;
    let height: String = height.chars().take_while(char::is_ascii_digit).collect();
    let width = width.parse::<u32>().ok().filter(|w| *w > 0)?;
    let height = height.parse::<u32>().ok().filter(|h| *h > 0)?;
    Some((width, height))
}

fn parse_vulkan_version(stdout: &str) -> Option<String> {
    stdout.lines().find_map(|line| {
        let (key, value) = line.split_once(':')?;
        (key.trim() == "Vulkan Instance Version")
            .then(|| value.trim().to_string())
            .filter(|v| !v.is_empty())
    })
}

/// Populated memory devices from `dmidecode -t 17` output.
fn parse_dmidecode_memory(stdout: &str) -> Vec<MemoryModuleRecord> {
    stdout
        .split("Memory Device")
        .skip(1)
        .filter(|block| !block.contains("No Module Installed"))
        .map(|block| {
            let field = |name: &str| {
                block.lines().find_map(|line| {
                    let (key, value) = line.trim().split_once(':')?;
                    (key.trim() == name).then(|| value.trim().to_string())
                })
            };

            let speed_mhz = field("Configured Memory Speed")
                .or_else(|| field("Speed"))
                .ok_or_else(|| ProbeError::unavailable("dmidecode", "no speed"))
                .and_then(|raw| {
                    let number = raw
                        .trim_end_matches("MT/s")
                        .trim_end_matches("MHz")
                        .trim()
                        .to_string();
                    parse_positive("memory.speed", &number)
                });

            let type_label = field("Type")
                .ok_or_else(|| ProbeError::unavailable("dmidecode", "no type"))
                .and_then(|raw| non_placeholder("memory.type", &raw))
                .and_then(|label| {
                    if label.contains("DDR") {
                        Ok(label)
                    } else {
                        Err(ProbeError::parse("memory.type", label))
                    }
                });

            MemoryModuleRecord {
                speed_mhz,
                type_label,
            }
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn lspci_name_strips_class_and_revision() {
        let line = "01:00.0 VGA compatible controller: NVIDIA Corporation AD107M [GeForce RTX 4050 Max-Q / Mobile] (rev a1)";
        assert_eq!(
            parse_lspci_name(line),
            "NVIDIA Corporation AD107M [GeForce RTX 4050 Max-Q / Mobile]"
        );
    }

    #[test]
    fn dmidecode_skips_empty_slots() {
        let stdout = "\
Handle 0x0040, DMI type 17, 92 bytes
Memory Device
\tSize: 16 GB
\tType: DDR5
\tSpeed: 5600 MT/s
\tConfigured Memory Speed: 5200 MT/s

Handle 0x0041, DMI type 17, 92 bytes
Memory Device
\tSize: No Module Installed
\tType: Unknown
\tSpeed: Unknown
";
        let modules = parse_dmidecode_memory(stdout);
        assert_eq!(modules.len(), 1);
        assert_eq!(modules[0].speed_mhz, Ok(5200));
        assert_eq!(modules[0].type_label, Ok("DDR5".to_string()));
    }

    #[test]
    fn dmidecode_unknown_fields_are_absent() {
        let stdout = "Memory Device\n\tSize: 8 GB\n\tType: Unknown\n\tSpeed: Unknown\n";
        let modules = parse_dmidecode_memory(stdout);
        assert_eq!(modules.len(), 1);
        assert!(modules[0].speed_mhz.is_err());
        assert!(modules[0].type_label.is_err());
    }

    #[test]
    fn drm_modes_and_vulkan_summary_parse() {
        assert_eq!(parse_mode("2560x1440"), Some((2560, 1440)));
        assert_eq!(parse_mode("1920x1080i"), Some((1920, 1080)));
        assert_eq!(parse_mode("garbage"), None);

        let summary = "Vulkan Instance Version: 1.3.275\n\nDevices:\n";
        assert_eq!(parse_vulkan_version(summary).as_deref(), Some("1.3.275"));
    }

    #[test]
    fn open_fails_without_sysfs() {
        let empty = tempfile::tempdir().unwrap();
        let err = LinuxInventory::open_at(empty.path()).err().unwrap();
        assert!(matches!(err, InventoryError::Connect { backend: "sysfs", .. }));
    }

    #[test]
    fn fake_root_reads_cpu_and_disks() {
        let root = tempfile::tempdir().unwrap();
        let write = |rel: &str, content: &str| {
            let path = root.path().join(rel);
            fs::create_dir_all(path.parent().unwrap()).unwrap();
            fs::write(path, content).unwrap();
        };

        write(
            "proc/cpuinfo",
            "processor\t: 0\nmodel name\t: AMD Ryzen 7 7840HS\ncpu MHz\t\t: 3800.000\nphysical id\t: 0\ncore id\t\t: 0\n\n\
             processor\t: 1\nmodel name\t: AMD Ryzen 7 7840HS\ncpu MHz\t\t: 3800.000\nphysical id\t: 0\ncore id\t\t: 0\n\n\
             processor\t: 2\nmodel name\t: AMD Ryzen 7 7840HS\ncpu MHz\t\t: 3800.000\nphysical id\t: 0\ncore id\t\t: 1\n",
        );
        write("sys/class/.keep", "");
        write("sys/devices/system/cpu/cpu0/cpufreq/cpuinfo_max_freq", "5137000\n");
        write("sys/block/nvme0n1/device/model", "Samsung SSD 980 PRO 1TB\n");
        write("sys/block/sda/device/model", "WDC WD10EZEX-08W\n");
        write("sys/block/sda/queue/rotational", "1\n");
        write("sys/block/loop0/queue/rotational", "0\n");

        let inventory = LinuxInventory::open_at(root.path()).unwrap();
        let cpu = inventory.processor().unwrap();
        assert_eq!(cpu.name, Ok("AMD Ryzen 7 7840HS".to_string()));
        assert_eq!(cpu.physical_cores, Ok(2));
        assert_eq!(cpu.current_clock, Ok(Frequency::mhz(3800)));
        assert_eq!(cpu.max_clock, Ok(Frequency::khz(5_137_000)));

        let disks = inventory.physical_disks().unwrap();
        assert_eq!(disks.len(), 2);
        assert_eq!(disks[0].device_id, "/dev/nvme0n1");
        assert_eq!(disks[0].media_hint, Ok(MediumType::Nvme));
        assert_eq!(disks[1].device_id, "/dev/sda");
        assert_eq!(disks[1].media_hint, Ok(MediumType::Rotating));
    }
}
