//! Unit normalization
//!
//! Pure conversions from raw inventory values (bytes, kHz/MHz/Hz, DMTF
//! timestamps, SMBIOS codes) into the canonical units of the snapshot.

use chrono::NaiveDateTime;
use serde::{Deserialize, Serialize};

use super::reading::{ProbeError, Reading};

const BYTES_PER_GB: u64 = 1 << 30;

/// Bytes to whole GB (2^30), rounding half up.
pub fn bytes_to_gb(bytes: u64) -> u64 {
    bytes / BYTES_PER_GB + u64::from(bytes % BYTES_PER_GB >= BYTES_PER_GB / 2)
}

/// Unit a raw clock reading was reported in.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ClockUnit {
    Hz,
    KHz,
    MHz,
}

/// Raw clock value as reported by a source.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct Frequency {
    pub value: u64,
    pub unit: ClockUnit,
}

impl Frequency {
    pub fn mhz(value: u64) -> Self {
        Frequency {
            value,
            unit: ClockUnit::MHz,
        }
    }

    pub fn khz(value: u64) -> Self {
        Frequency {
            value,
            unit: ClockUnit::KHz,
        }
    }

    /// GHz rounded to two decimals; `None` for a zero reading.
    pub fn to_ghz(self) -> Option<f64> {
        if self.value == 0 {
            return None;
        }
        let divisor = match self.unit {
            ClockUnit::Hz => 1e9,
            ClockUnit::KHz => 1e6,
            ClockUnit::MHz => 1e3,
        };
        Some(round_to(self.value as f64 / divisor, 2))
    }
}

/// Round to a fixed number of decimals.
pub fn round_to(value: f64, decimals: i32) -> f64 {
    let factor = 10f64.powi(decimals);
    (value * factor).round() / factor
}

/// Parse a DMTF timestamp (`YYYYMMDDhhmmss.ffffff±UUU`) into a date-time.
pub fn parse_driver_date(raw: &str) -> Reading<NaiveDateTime> {
    let trimmed = raw.trim();
    let (stamp, rest) = match trimmed.split_once('.') {
        Some(parts) => parts,
        None => (trimmed, ""),
    };
    if stamp.len() != 14 || !stamp.bytes().all(|b| b.is_ascii_digit()) {
        return Err(ProbeError::parse("gpu.driver_date", trimmed));
    }
    if !rest.is_empty() && !is_dmtf_fraction(rest) {
        return Err(ProbeError::parse("gpu.driver_date", trimmed));
    }
    NaiveDateTime::parse_from_str(stamp, "%Y%m%d%H%M%S")
        .map_err(|_| ProbeError::parse("gpu.driver_date", trimmed))
}

/// `ffffff±UUU`
fn is_dmtf_fraction(rest: &str) -> bool {
    let bytes = rest.as_bytes();
    bytes.len() == 10
        && bytes[..6].iter().all(u8::is_ascii_digit)
        && matches!(bytes[6], b'+' | b'-')
        && bytes[7..].iter().all(u8::is_ascii_digit)
}

/// Driver date as `DD/MM/YYYY`, or the raw string when it cannot be parsed.
pub fn format_driver_date(raw: &str) -> String {
    match parse_driver_date(raw) {
        Ok(date) => date.format("%d/%m/%Y").to_string(),
        Err(err) => {
            tracing::debug!(error = %err, "keeping raw driver date");
            raw.trim().to_string()
        }
    }
}

/// Map a machine architecture token to the snapshot's tag.
pub fn normalize_architecture(token: &str) -> String {
    let trimmed = token.trim();
    let lowered = trimmed.to_ascii_lowercase();
    match lowered.as_str() {
        "amd64" | "x86_64" => "x64".to_string(),
        "x86" => "x86".to_string(),
        arm if arm.contains("arm") || arm.starts_with("aarch") => trimmed.to_ascii_uppercase(),
        _ => trimmed.to_string(),
    }
}

/// SMBIOS type 17 memory type code to a generation label.
#[cfg(any(test, target_os = "windows"))]
pub fn smbios_memory_type(code: u32) -> Option<&'static str> {
    match code {
        18 => Some("DDR"),
        19 => Some("DDR2"),
        20 => Some("DDR"),
        21 => Some("DDR2"),
        24 => Some("DDR3"),
        26 => Some("DDR4"),
        27 => Some("LPDDR"),
        28 => Some("LPDDR2"),
        29 => Some("LPDDR3"),
        30 => Some("LPDDR4"),
        34 => Some("DDR5"),
        35 => Some("LPDDR5"),
        _ => None,
    }
}

/// ACPI thermal zone reading (tenths of Kelvin) to Celsius.
#[cfg(any(test, target_os = "windows"))]
pub fn decikelvin_to_celsius(raw: u64) -> f64 {
    round_to(raw as f64 / 10.0 - 273.15, 1)
}

/// Reject temperatures no working CPU would report.
pub fn plausible_temperature(celsius: f64) -> Reading<f64> {
    if celsius.is_finite() && celsius > 0.0 && celsius < 125.0 {
        Ok(round_to(celsius, 1))
    } else {
        Err(ProbeError::parse("cpu.temperature", celsius.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn bytes_round_to_nearest_gb() {
        assert_eq!(bytes_to_gb(8_589_934_592), 8);
        assert_eq!(bytes_to_gb(8_000_000_000), 7);
        assert_eq!(bytes_to_gb(0), 0);
        // 0.5 GB rounds up
        assert_eq!(bytes_to_gb(BYTES_PER_GB / 2), 1);
        assert_eq!(bytes_to_gb(BYTES_PER_GB / 2 - 1), 0);
    }

    #[test]
    fn clocks_normalize_to_ghz() {
        assert_eq!(Frequency::mhz(3600).to_ghz(), Some(3.6));
        assert_eq!(Frequency::khz(4_680_000).to_ghz(), Some(4.68));
        assert_eq!(
            Frequency {
                value: 2_904_000_000,
                unit: ClockUnit::Hz
            }
            .to_ghz(),
            Some(2.9)
        );
        assert_eq!(Frequency::mhz(0).to_ghz(), None);
    }

    #[test]
    fn driver_date_formats_as_day_month_year() {
        assert_eq!(format_driver_date("20250506000000.000000-000"), "06/05/2025");
        assert_eq!(format_driver_date("20231231120000"), "31/12/2023");
    }

    #[test]
    fn unparseable_driver_date_passes_through() {
        assert_eq!(format_driver_date("yesterday"), "yesterday");
        assert_eq!(
            format_driver_date("20251341000000.000000-000"),
            "20251341000000.000000-000"
        );
        assert!(parse_driver_date("2025050600000.000000-000").is_err());
    }

    #[test]
    fn architecture_tokens_normalize() {
        let inputs = ["AMD64", "x86_64", "x86", "aarch64"];
        let outputs: Vec<String> = inputs.iter().map(|t| normalize_architecture(t)).collect();
        assert_eq!(outputs, ["x64", "x64", "x86", "AARCH64"]);
        assert_eq!(normalize_architecture("ARM64"), "ARM64");
        assert_eq!(normalize_architecture("armv7l"), "ARMV7L");
        assert_eq!(normalize_architecture("riscv64"), "riscv64");
    }

    #[test]
    fn smbios_codes_map_to_generations() {
        assert_eq!(smbios_memory_type(26), Some("DDR4"));
        assert_eq!(smbios_memory_type(34), Some("DDR5"));
        assert_eq!(smbios_memory_type(0), None);
    }

    #[test]
    fn thermal_readings() {
        assert!((decikelvin_to_celsius(3232) - 50.0).abs() < 0.11);
        assert!(plausible_temperature(0.0).is_err());
        assert!(plausible_temperature(-273.1).is_err());
        assert_eq!(plausible_temperature(47.25).unwrap(), 47.3);
    }
}
