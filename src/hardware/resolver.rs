//! Fallback resolution for fields with more than one source
//!
//! Candidates are always listed most reliable first. A candidate counts only
//! when it is present and non-degenerate; a zero is as good as missing.

use serde::{Deserialize, Serialize};

use super::reading::Reading;
use super::storage::MediumType;

/// Name fragments of discrete GPU vendors.
pub const VENDOR_TOKENS: &[&str] = &[
    "nvidia",
    "geforce",
    "amd",
    "radeon",
    "intel arc",
    "intel(r) arc",
];

/// Where a resolved GPU memory figure came from.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum MemorySource {
    NativeDescriptor,
    AdapterRam,
    VideoMemory,
    ModelHeuristic,
}

impl MemorySource {
    pub fn label(self) -> &'static str {
        match self {
            MemorySource::NativeDescriptor => "native descriptor",
            MemorySource::AdapterRam => "adapter RAM",
            MemorySource::VideoMemory => "video memory",
            MemorySource::ModelHeuristic => "model heuristic",
        }
    }
}

pub fn is_vendor_tagged(name: &str) -> bool {
    let lower = name.to_lowercase();
    VENDOR_TOKENS.iter().any(|token| lower.contains(token))
}

/// First tier holding a positive value, in GB.
pub fn resolve_memory<I>(tiers: I) -> Option<(MemorySource, u64)>
where
    I: IntoIterator<Item = (MemorySource, Reading<u64>)>,
{
    for (tier, reading) in tiers {
        match reading {
            Ok(gb) if gb > 0 => {
                tracing::debug!(tier = tier.label(), gb, "gpu memory resolved");
                return Some((tier, gb));
            }
            Ok(_) => tracing::debug!(tier = tier.label(), "gpu memory tier reported zero"),
            Err(err) => tracing::debug!(tier = tier.label(), error = %err, "gpu memory tier unavailable"),
        }
    }
    None
}

/// Pick the device to report.
///
/// Candidates are ordered by resolved memory, largest first (unresolved sorts
/// as zero, ties keep enumeration order). The first vendor-tagged candidate in
/// that order wins; without one, the head of the order does.
pub fn select_device<'a, T, N, M>(candidates: &'a [T], name: N, memory_gb: M) -> Option<&'a T>
where
    N: Fn(&T) -> &str,
    M: Fn(&T) -> Option<u64>,
{
    let mut ordered: Vec<&T> = candidates.iter().collect();
    ordered.sort_by_key(|c| std::cmp::Reverse(memory_gb(*c).unwrap_or(0)));

    ordered
        .iter()
        .copied()
        .find(|c| is_vendor_tagged(name(*c)))
        .or_else(|| ordered.first().copied())
}

const NVME_PATTERNS: &[&str] = &["nvme"];
const SSD_PATTERNS: &[&str] = &["ssd", "solid state"];
const ROTATING_PATTERNS: &[&str] = &["hdd", "hard disk", "barracuda", "ironwolf", "wdc wd"];

/// Medium of a physical disk from its model string, then from the disk's own hint.
pub fn classify_disk(model: Option<&str>, hint: Option<MediumType>) -> MediumType {
    if let Some(model) = model {
        let lower = model.to_lowercase();
        let by_model = [
            (NVME_PATTERNS, MediumType::Nvme),
            (SSD_PATTERNS, MediumType::SataSsd),
            (ROTATING_PATTERNS, MediumType::Rotating),
        ]
        .into_iter()
        .find(|(patterns, _)| patterns.iter().any(|p| lower.contains(p)))
        .map(|(_, medium)| medium);

        if let Some(medium) = by_model {
            return medium;
        }
    }
    hint.unwrap_or(MediumType::Unknown)
}

fn strip_separators(id: &str) -> &str {
    id.trim_matches(|c| c == '/' || c == '\\')
}

/// Medium of the first disk whose identifier prefixes the partition's.
pub fn match_partition(partition: &str, disks: &[(String, MediumType)]) -> MediumType {
    let partition = strip_separators(partition).to_lowercase();
    disks
        .iter()
        .find(|(disk_id, _)| {
            let disk_id = strip_separators(disk_id).to_lowercase();
            !disk_id.is_empty() && partition.starts_with(&disk_id)
        })
        .map(|(_, medium)| *medium)
        .unwrap_or(MediumType::Unknown)
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::hardware::reading::ProbeError;

    fn missing() -> Reading<u64> {
        Err(ProbeError::unavailable("test", "missing"))
    }

    #[test]
    fn all_tiers_missing_resolves_nothing() {
        let tiers = vec![
            (MemorySource::NativeDescriptor, missing()),
            (MemorySource::AdapterRam, Ok(0)),
            (MemorySource::VideoMemory, missing()),
            (MemorySource::ModelHeuristic, missing()),
        ];
        assert_eq!(resolve_memory(tiers), None);
    }

    #[test]
    fn single_positive_tier_wins_wherever_it_is() {
        for position in 0..4 {
            let sources = [
                MemorySource::NativeDescriptor,
                MemorySource::AdapterRam,
                MemorySource::VideoMemory,
                MemorySource::ModelHeuristic,
            ];
            let tiers: Vec<_> = sources
                .iter()
                .enumerate()
                .map(|(i, &s)| (s, if i == position { Ok(6) } else { Ok(0) }))
                .collect();
            assert_eq!(resolve_memory(tiers), Some((sources[position], 6)));
        }
    }

    #[test]
    fn earlier_tier_beats_heuristic() {
        let tiers = vec![
            (MemorySource::NativeDescriptor, missing()),
            (MemorySource::AdapterRam, Ok(4)),
            (MemorySource::VideoMemory, missing()),
            (MemorySource::ModelHeuristic, Ok(6)),
        ];
        assert_eq!(resolve_memory(tiers), Some((MemorySource::AdapterRam, 4)));
    }

    fn pick<'a>(gpus: &'a [(&'a str, Option<u64>)]) -> Option<&'a (&'a str, Option<u64>)> {
        select_device(gpus, |g| g.0, |g| g.1)
    }

    #[test]
    fn vendor_tag_beats_more_memory() {
        let gpus = [("Intel UHD Graphics", Some(8)), ("NVIDIA GeForce GTX 1650", Some(4))];
        assert_eq!(pick(&gpus).unwrap().0, "NVIDIA GeForce GTX 1650");
    }

    #[test]
    fn resolved_vendor_device_beats_unresolved_one() {
        let gpus = [("AMD Radeon Graphics", None), ("NVIDIA GeForce RTX 3060", Some(6))];
        assert_eq!(pick(&gpus).unwrap().0, "NVIDIA GeForce RTX 3060");
    }

    #[test]
    fn untagged_devices_fall_back_to_largest_then_first() {
        let gpus = [("Basic Display", Some(1)), ("Matrox G200", Some(2))];
        assert_eq!(pick(&gpus).unwrap().0, "Matrox G200");

        let unresolved = [("Basic Display", None), ("Matrox G200", None)];
        assert_eq!(pick(&unresolved).unwrap().0, "Basic Display");

        assert!(pick(&[]).is_none());
    }

    #[test]
    fn disk_model_patterns_then_hint() {
        assert_eq!(classify_disk(Some("Samsung SSD 980 PRO"), None), MediumType::SataSsd);
        assert_eq!(classify_disk(Some("WDC WD10EZEX-08WN4A0"), None), MediumType::Rotating);
        assert_eq!(
            classify_disk(Some("KINGSTON SNV2S1000G"), Some(MediumType::Nvme)),
            MediumType::Nvme
        );
        assert_eq!(classify_disk(Some("KINGSTON SNV2S1000G"), None), MediumType::Unknown);
        assert_eq!(
            classify_disk(Some("Samsung NVMe SSD"), Some(MediumType::Rotating)),
            MediumType::Nvme
        );
    }

    #[test]
    fn partitions_match_disks_by_prefix() {
        let disks = vec![
            ("/dev/sda".to_string(), MediumType::Rotating),
            ("/dev/nvme0n1".to_string(), MediumType::Nvme),
        ];
        assert_eq!(match_partition("/dev/nvme0n1p2", &disks), MediumType::Nvme);
        assert_eq!(match_partition("/dev/sda1", &disks), MediumType::Rotating);
        assert_eq!(match_partition("/dev/mapper/root", &disks), MediumType::Unknown);

        let windows = vec![("C:".to_string(), MediumType::SataSsd)];
        assert_eq!(match_partition("C:\\", &windows), MediumType::SataSsd);
    }
}
