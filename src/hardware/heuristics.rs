//! GPU model-name inference table
//!
//! When no interface reports usable video memory, the model name is the only
//! thing left. This table maps name fragments to what that model ships with.
//! Order matters: laptop variants come before desktop parts, and `Ti`/`XT`
//! variants before their base models, because the first full match wins.
//! Fragments match whole words of the name, so `ti` never hits "Corporation".

use super::gpu::GpuFeatures;

/// What a model name implies about the card.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct GpuProfile {
    pub memory_gb: u64,
    pub memory_type: &'static str,
    pub architecture: &'static str,
    pub features: GpuFeatures,
}

/// One row: every fragment in `pattern` must appear in the device name.
///
/// A fragment may list alternatives separated by `|`; a multi-word fragment
/// such as `max-q` must appear as consecutive words.
#[derive(Debug, Clone, Copy)]
pub struct GpuRule {
    pub pattern: &'static [&'static str],
    pub profile: GpuProfile,
}

const ADA: GpuFeatures = GpuFeatures {
    advanced_upscaling: true,
    ray_tracing: true,
    directx12_ultimate: true,
    vendor_upscaling: true,
};

const RTX: GpuFeatures = GpuFeatures {
    advanced_upscaling: false,
    ray_tracing: true,
    directx12_ultimate: true,
    vendor_upscaling: true,
};

const GTX: GpuFeatures = GpuFeatures {
    advanced_upscaling: false,
    ray_tracing: false,
    directx12_ultimate: false,
    vendor_upscaling: false,
};

const RDNA3: GpuFeatures = GpuFeatures {
    advanced_upscaling: true,
    ray_tracing: true,
    directx12_ultimate: true,
    vendor_upscaling: false,
};

const RDNA2: GpuFeatures = GpuFeatures {
    advanced_upscaling: false,
    ray_tracing: true,
    directx12_ultimate: true,
    vendor_upscaling: false,
};

const ALCHEMIST: GpuFeatures = GpuFeatures {
    advanced_upscaling: false,
    ray_tracing: true,
    directx12_ultimate: true,
    vendor_upscaling: true,
};

const MOBILE: &str = "laptop|mobile|max-q";

const fn rule(
    pattern: &'static [&'static str],
    memory_gb: u64,
    memory_type: &'static str,
    architecture: &'static str,
    features: GpuFeatures,
) -> GpuRule {
    GpuRule {
        pattern,
        profile: GpuProfile {
            memory_gb,
            memory_type,
            architecture,
            features,
        },
    }
}

/// Known discrete GPU families, evaluated top to bottom.
pub static GPU_PROFILES: &[GpuRule] = &[
    // GeForce RTX 40 (laptop first)
    rule(&["4050", MOBILE], 6, "GDDR6", "Ada Lovelace", ADA),
    rule(&["4060", MOBILE], 8, "GDDR6", "Ada Lovelace", ADA),
    rule(&["4070", MOBILE], 8, "GDDR6", "Ada Lovelace", ADA),
    rule(&["4080", MOBILE], 12, "GDDR6", "Ada Lovelace", ADA),
    rule(&["4090", MOBILE], 16, "GDDR6", "Ada Lovelace", ADA),
    rule(&["rtx", "4090"], 24, "GDDR6X", "Ada Lovelace", ADA),
    rule(&["rtx", "4080"], 16, "GDDR6X", "Ada Lovelace", ADA),
    rule(&["rtx", "4070", "ti"], 12, "GDDR6X", "Ada Lovelace", ADA),
    rule(&["rtx", "4070"], 12, "GDDR6X", "Ada Lovelace", ADA),
    rule(&["rtx", "4060", "ti"], 8, "GDDR6", "Ada Lovelace", ADA),
    rule(&["rtx", "4060"], 8, "GDDR6", "Ada Lovelace", ADA),
    // GeForce RTX 30
    rule(&["3050", MOBILE], 4, "GDDR6", "Ampere", RTX),
    rule(&["3060", MOBILE], 6, "GDDR6", "Ampere", RTX),
    rule(&["3070", MOBILE], 8, "GDDR6", "Ampere", RTX),
    rule(&["3080", MOBILE], 8, "GDDR6", "Ampere", RTX),
    rule(&["rtx", "3090"], 24, "GDDR6X", "Ampere", RTX),
    rule(&["rtx", "3080", "ti"], 12, "GDDR6X", "Ampere", RTX),
    rule(&["rtx", "3080"], 10, "GDDR6X", "Ampere", RTX),
    rule(&["rtx", "3070"], 8, "GDDR6", "Ampere", RTX),
    rule(&["rtx", "3060", "ti"], 8, "GDDR6", "Ampere", RTX),
    rule(&["rtx", "3060"], 12, "GDDR6", "Ampere", RTX),
    rule(&["rtx", "3050"], 8, "GDDR6", "Ampere", RTX),
    // GeForce RTX 20 / GTX 16
    rule(&["rtx", "2080", "ti"], 11, "GDDR6", "Turing", RTX),
    rule(&["rtx", "2080"], 8, "GDDR6", "Turing", RTX),
    rule(&["rtx", "2070"], 8, "GDDR6", "Turing", RTX),
    rule(&["rtx", "2060"], 6, "GDDR6", "Turing", RTX),
    rule(&["gtx", "1660"], 6, "GDDR5", "Turing", GTX),
    rule(&["gtx", "1650"], 4, "GDDR5", "Turing", GTX),
    // Radeon RX 7000
    rule(&["rx", "7900", "xtx"], 24, "GDDR6", "RDNA 3", RDNA3),
    rule(&["rx", "7900", "xt"], 20, "GDDR6", "RDNA 3", RDNA3),
    rule(&["rx", "7800", "xt"], 16, "GDDR6", "RDNA 3", RDNA3),
    rule(&["rx", "7700", "xt"], 12, "GDDR6", "RDNA 3", RDNA3),
    rule(&["rx", "7600"], 8, "GDDR6", "RDNA 3", RDNA3),
    // Radeon RX 6000
    rule(&["rx", "6900", "xt"], 16, "GDDR6", "RDNA 2", RDNA2),
    rule(&["rx", "6800"], 16, "GDDR6", "RDNA 2", RDNA2),
    rule(&["rx", "6700", "xt"], 12, "GDDR6", "RDNA 2", RDNA2),
    rule(&["rx", "6600"], 8, "GDDR6", "RDNA 2", RDNA2),
    rule(&["rx", "6500", "xt"], 4, "GDDR6", "RDNA 2", RDNA2),
    // Intel Arc
    rule(&["arc", "a770"], 16, "GDDR6", "Alchemist", ALCHEMIST),
    rule(&["arc", "a750"], 8, "GDDR6", "Alchemist", ALCHEMIST),
    rule(&["arc", "a380"], 6, "GDDR6", "Alchemist", ALCHEMIST),
];

/// Lower-cased alphanumeric words: "GA106M [GeForce RTX 3060 Mobile / Max-Q]"
/// becomes `ga106m geforce rtx 3060 mobile max q`.
fn words(text: &str) -> Vec<String> {
    text.split(|c: char| !c.is_alphanumeric())
        .filter(|word| !word.is_empty())
        .map(str::to_lowercase)
        .collect()
}

fn fragment_matches(fragment: &str, name_words: &[String]) -> bool {
    fragment.split('|').any(|alternative| {
        let needle = words(alternative);
        !needle.is_empty() && name_words.windows(needle.len()).any(|run| run == needle.as_slice())
    })
}

/// First profile in `rules` whose fragments all appear in `name`.
pub fn infer_profile<'a>(name: &str, rules: &'a [GpuRule]) -> Option<&'a GpuProfile> {
    let name_words = words(name);
    rules
        .iter()
        .find(|rule| {
            rule.pattern
                .iter()
                .all(|fragment| fragment_matches(fragment, &name_words))
        })
        .map(|rule| &rule.profile)
}

/// Lookup against the built-in table.
pub fn infer(name: &str) -> Option<&'static GpuProfile> {
    infer_profile(name, GPU_PROFILES)
}
