use serde::de::DeserializeOwned;
use serde::Deserialize;

use super::{
    run_command_capture, HardwareInventory, InventoryError, MemoryModuleRecord,
    PhysicalDiskRecord, ProcessorRecord, VideoControllerRecord,
};
use crate::hardware::reading::{non_placeholder, ProbeError, Reading};
use crate::hardware::storage::MediumType;
use crate::hardware::units::{
    decikelvin_to_celsius, plausible_temperature, smbios_memory_type, Frequency,
};

const DISPLAY_CLASS_KEY: &str =
    r"HKLM:\SYSTEM\ControlSet001\Control\Class\{4d36e968-e325-11ce-bfc1-08002be10318}\0*";

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct OperatingSystemRow {
    build_number: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ProcessorRow {
    name: Option<String>,
    number_of_cores: Option<u64>,
    current_clock_speed: Option<u64>,
    max_clock_speed: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PhysicalMemoryRow {
    speed: Option<u64>,
    configured_clock_speed: Option<u64>,
    #[serde(rename = "SMBIOSMemoryType")]
    smbios_memory_type: Option<u32>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct VideoControllerRow {
    name: Option<String>,
    #[serde(rename = "AdapterRAM")]
    adapter_ram: Option<u64>,
    driver_version: Option<String>,
    driver_date: Option<String>,
    current_horizontal_resolution: Option<u32>,
    current_vertical_resolution: Option<u32>,
    current_refresh_rate: Option<u32>,
}

#[derive(Debug, Deserialize)]
struct DisplayClassRow {
    #[serde(rename = "DriverDesc")]
    driver_desc: Option<String>,
    #[serde(rename = "HardwareInformation.qwMemorySize")]
    memory_size: Option<u64>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PartitionDiskRow {
    drive_letter: Option<String>,
    model: Option<String>,
    media_type: Option<String>,
    bus_type: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "PascalCase")]
struct ThermalZoneRow {
    current_temperature: Option<u64>,
}

pub(super) struct WindowsInventory {
    build_number: Reading<String>,
}

impl WindowsInventory {
    pub(super) fn open() -> Result<Self, InventoryError> {
        let rows: Vec<OperatingSystemRow> =
            cim_query("Win32_OperatingSystem", &["BuildNumber"]).map_err(|err| {
                InventoryError::Connect {
                    backend: "cim",
                    detail: err.to_string(),
                    cause: None,
                }
            })?;

        let build_number = rows
            .into_iter()
            .find_map(|row| row.build_number)
            .ok_or_else(|| ProbeError::unavailable("cim", "Win32_OperatingSystem has no build"))
            .and_then(|raw| non_placeholder("os.build", &raw));

        Ok(WindowsInventory { build_number })
    }
}

impl HardwareInventory for WindowsInventory {
    fn backend(&self) -> &'static str {
        "windows-cim"
    }

    fn processor(&self) -> Reading<ProcessorRecord> {
        let rows: Vec<ProcessorRow> = cim_query(
            "Win32_Processor",
            &["Name", "NumberOfCores", "CurrentClockSpeed", "MaxClockSpeed"],
        )?;
        let first = rows
            .first()
            .ok_or_else(|| ProbeError::unavailable("cim", "no Win32_Processor rows"))?;

        // NumberOfCores is per socket
        let cores: u64 = rows.iter().filter_map(|row| row.number_of_cores).sum();

        Ok(ProcessorRecord {
            name: present_string("cpu.name", first.name.as_deref()),
            physical_cores: positive("cpu.cores", Some(cores)).map(|c| c as usize),
            current_clock: positive("cpu.clock", first.current_clock_speed).map(Frequency::mhz),
            max_clock: positive("cpu.max_clock", first.max_clock_speed).map(Frequency::mhz),
        })
    }

    fn cpu_temperature(&self) -> Reading<f64> {
        // Needs elevation on most machines.
        let stdout = run_powershell(
            "Get-CimInstance -Namespace root/wmi -ClassName MSAcpi_ThermalZoneTemperature \
             | Select-Object CurrentTemperature | ConvertTo-Json -Compress",
        )?;
        let rows: Vec<ThermalZoneRow> = parse_rows(&stdout)?;
        let raw = rows
            .into_iter()
            .filter_map(|row| row.current_temperature)
            .max()
            .ok_or_else(|| ProbeError::unavailable("cim", "no thermal zones"))?;
        plausible_temperature(decikelvin_to_celsius(raw))
    }

    fn machine_architecture(&self) -> Reading<String> {
        // A 32-bit process on 64-bit Windows sees the WOW64 value first.
        std::env::var("PROCESSOR_ARCHITEW6432")
            .or_else(|_| std::env::var("PROCESSOR_ARCHITECTURE"))
            .map_err(|err| ProbeError::unavailable("environment", err.to_string()))
            .and_then(|raw| non_placeholder("cpu.architecture", &raw))
    }

    fn memory_modules(&self) -> Reading<Vec<MemoryModuleRecord>> {
        let rows: Vec<PhysicalMemoryRow> = cim_query(
            "Win32_PhysicalMemory",
            &["Speed", "ConfiguredClockSpeed", "SMBIOSMemoryType"],
        )?;
        if rows.is_empty() {
            return Err(ProbeError::unavailable("cim", "no Win32_PhysicalMemory rows"));
        }
        Ok(rows
            .into_iter()
            .map(|row| MemoryModuleRecord {
                speed_mhz: positive("memory.speed", row.configured_clock_speed)
                    .or_else(|_| positive("memory.speed", row.speed)),
                type_label: row
                    .smbios_memory_type
                    .ok_or_else(|| ProbeError::unavailable("cim", "no SMBIOSMemoryType"))
                    .and_then(|code| {
                        smbios_memory_type(code)
                            .map(str::to_string)
                            .ok_or_else(|| ProbeError::parse("memory.type", code.to_string()))
                    }),
            })
            .collect())
    }

    fn video_controllers(&self) -> Reading<Vec<VideoControllerRecord>> {
        // DriverDate is a DateTime on CIM instances; convert it back to DMTF text.
        let stdout = run_powershell(
            "Get-CimInstance -ClassName Win32_VideoController | Select-Object Name,AdapterRAM,\
             DriverVersion,@{n='DriverDate';e={if ($_.DriverDate) {[Management.ManagementDateTimeConverter]::ToDmtfDateTime($_.DriverDate)}}},\
             CurrentHorizontalResolution,CurrentVerticalResolution,CurrentRefreshRate | ConvertTo-Json -Compress",
        )?;
        let rows: Vec<VideoControllerRow> = parse_rows(&stdout)?;
        if rows.is_empty() {
            return Err(ProbeError::unavailable("cim", "no Win32_VideoController rows"));
        }

        let display_class = display_class_memory();

        Ok(rows
            .into_iter()
            .filter_map(|row| {
                let name = row.name.as_deref().map(str::trim).filter(|n| !n.is_empty())?;
                let video_memory = match &display_class {
                    Ok(entries) => entries
                        .iter()
                        .find(|(desc, _)| desc.eq_ignore_ascii_case(name))
                        .map(|(_, bytes)| *bytes)
                        .ok_or_else(|| ProbeError::unavailable("registry", "no display class entry")),
                    Err(err) => Err(err.clone()),
                };

                let resolution = match (
                    row.current_horizontal_resolution,
                    row.current_vertical_resolution,
                ) {
                    (Some(w), Some(h)) if w > 0 && h > 0 => Ok((w, h)),
                    _ => Err(ProbeError::unavailable("cim", "no active display mode")),
                };

                Some(VideoControllerRecord {
                    name: name.to_string(),
                    pci_slot: None,
                    adapter_ram: positive("gpu.adapter_ram", row.adapter_ram),
                    video_memory,
                    driver_version: present_string("gpu.driver_version", row.driver_version.as_deref()),
                    driver_date: present_string("gpu.driver_date", row.driver_date.as_deref()),
                    resolution,
                    refresh_rate_hz: positive("gpu.refresh_rate", row.current_refresh_rate.map(u64::from))
                        .map(|hz| hz as u32),
                })
            })
            .collect())
    }

    fn physical_disks(&self) -> Reading<Vec<PhysicalDiskRecord>> {
        // One row per lettered partition, carrying its parent disk's model.
        let stdout = run_powershell(
            "Get-Partition | Where-Object DriveLetter | ForEach-Object { $d = Get-PhysicalDisk | \
             Where-Object DeviceId -eq $_.DiskNumber; [pscustomobject]@{ DriveLetter = \"$($_.DriveLetter)\"; \
             Model = $d.FriendlyName; MediaType = \"$($d.MediaType)\"; BusType = \"$($d.BusType)\" } } \
             | ConvertTo-Json -Compress",
        )?;
        let rows: Vec<PartitionDiskRow> = parse_rows(&stdout)?;

        let disks: Vec<PhysicalDiskRecord> = rows
            .into_iter()
            .filter_map(|row| {
                let letter = row.drive_letter?.trim().to_string();
                if letter.is_empty() {
                    return None;
                }
                Some(PhysicalDiskRecord {
                    device_id: format!("{letter}:"),
                    model: present_string("disk.model", row.model.as_deref()),
                    media_hint: media_hint(row.media_type.as_deref(), row.bus_type.as_deref()),
                })
            })
            .collect();

        if disks.is_empty() {
            return Err(ProbeError::unavailable("storage", "no lettered partitions"));
        }
        Ok(disks)
    }

    fn os_build(&self) -> Reading<String> {
        self.build_number.clone()
    }

    fn graphics_api_version(&self) -> Reading<String> {
        let stdout = run_command_capture(
            "reg",
            &["query", r"HKLM\SOFTWARE\Microsoft\DirectX", "/v", "Version"],
        )?;
        // "    Version    REG_SZ    4.09.00.0904"
        stdout
            .lines()
            .find(|line| line.trim_start().starts_with("Version"))
            .and_then(|line| line.split_whitespace().last())
            .map(|version| format!("DirectX {version}"))
            .ok_or_else(|| ProbeError::unavailable("registry", "no DirectX version value"))
    }
}

fn run_powershell(script: &str) -> Reading<String> {
    run_command_capture(
        "powershell",
        &["-NoProfile", "-NonInteractive", "-Command", script],
    )
}

fn cim_query<T: DeserializeOwned>(class: &str, properties: &[&str]) -> Reading<Vec<T>> {
    let script = format!(
        "Get-CimInstance -ClassName {class} | Select-Object {} | ConvertTo-Json -Compress",
        properties.join(",")
    );
    let stdout = run_powershell(&script)?;
    parse_rows(&stdout)
}

/// `ConvertTo-Json` emits a bare object for one row and an array for several.
fn parse_rows<T: DeserializeOwned>(stdout: &str) -> Reading<Vec<T>> {
    let trimmed = stdout.trim();
    if trimmed.is_empty() {
        return Ok(Vec::new());
    }
    let value: serde_json::Value = serde_json::from_str(trimmed)
        .map_err(|_| ProbeError::parse("cim.json", truncate(trimmed)))?;
    let rows = match value {
        serde_json::Value::Array(items) => items,
        other => vec![other],
    };
    rows.into_iter()
        .map(|row| {
            serde_json::from_value(row.clone())
                .map_err(|_| ProbeError::parse("cim.row", truncate(&row.to_string())))
        })
        .collect()
}

fn display_class_memory() -> Reading<Vec<(String, u64)>> {
    let script = format!(
        "Get-ItemProperty -Path '{DISPLAY_CLASS_KEY}' -ErrorAction SilentlyContinue \
         | Select-Object DriverDesc,'HardwareInformation.qwMemorySize' | ConvertTo-Json -Compress"
    );
    let stdout = run_powershell(&script)?;
    let rows: Vec<DisplayClassRow> = parse_rows(&stdout)?;
    Ok(rows
        .into_iter()
        .filter_map(|row| Some((row.driver_desc?.trim().to_string(), row.memory_size?)))
        .filter(|(_, bytes)| *bytes > 0)
        .collect())
}

fn media_hint(media_type: Option<&str>, bus_type: Option<&str>) -> Reading<MediumType> {
    if bus_type.is_some_and(|bus| bus.eq_ignore_ascii_case("nvme")) {
        return Ok(MediumType::Nvme);
    }
    match media_type.map(|m| m.trim().to_ascii_uppercase()).as_deref() {
        Some("SSD") => Ok(MediumType::SataSsd),
        Some("HDD") => Ok(MediumType::Rotating),
        Some(other) => Err(ProbeError::parse("disk.media_type", other)),
        None => Err(ProbeError::unavailable("storage", "no media type")),
    }
}

fn positive(field: &'static str, value: Option<u64>) -> Reading<u64> {
    match value {
        Some(0) => Err(ProbeError::unavailable(field, "reported zero")),
        Some(v) => Ok(v),
        None => Err(ProbeError::unavailable(field, "not reported")),
    }
}

fn present_string(field: &'static str, value: Option<&str>) -> Reading<String> {
    value
        .ok_or_else(|| ProbeError::unavailable(field, "not reported"))
        .and_then(|raw| non_placeholder(field, raw))
}

fn truncate(text: &str) -> String {
    text.chars().take(120).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn single_object_and_array_both_parse() {
        let one: Vec<ProcessorRow> =
            parse_rows(r#"{"Name":"Intel(R) Core(TM) i7-13700H","NumberOfCores":14,"CurrentClockSpeed":2400,"MaxClockSpeed":2400}"#).unwrap();
        assert_eq!(one.len(), 1);

        let many: Vec<PhysicalMemoryRow> = parse_rows(
            r#"[{"Speed":5200,"ConfiguredClockSpeed":4800,"SMBIOSMemoryType":34},{"Speed":5200,"ConfiguredClockSpeed":null,"SMBIOSMemoryType":34}]"#,
        )
        .unwrap();
        assert_eq!(many.len(), 2);
        assert_eq!(many[1].configured_clock_speed, None);
    }

    #[test]
    fn media_hint_prefers_bus_type() {
        assert_eq!(media_hint(Some("SSD"), Some("NVMe")), Ok(MediumType::Nvme));
        assert_eq!(media_hint(Some("HDD"), Some("SATA")), Ok(MediumType::Rotating));
        assert!(media_hint(Some("Unspecified"), Some("SATA")).is_err());
    }
}
