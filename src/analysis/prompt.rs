use std::fmt::Write;

use crate::hardware::SystemSpecs;
use crate::requirements::{RequirementSection, Requirements};

pub(super) const SYSTEM_PROMPT: &str = r#"You are an expert in PC hardware compatibility for games.
Compare the computer's specifications with the game's requirements and assess whether it runs and how well.

Reply with ONLY a valid JSON object, no text before or after it, in exactly this shape:
{
  "can_run": true,
  "performance_level": "Low" | "Medium" | "High",
  "expected_issues": ["issue", "..."],
  "recommended_settings": "settings summary",
  "upgrade_suggestions": ["suggestion", "..."],
  "component_analysis": {"cpu": "...", "gpu": "...", "ram": "...", "storage": "..."},
  "fps_estimates": {"1080p": "...", "1440p": "...", "4k": "..."}
}
can_run, performance_level and expected_issues are required."#;

fn or_unknown<T: std::fmt::Display>(value: Option<T>) -> String {
    value.map(|v| v.to_string()).unwrap_or_else(|| "unknown".to_string())
}

fn system_block(specs: &SystemSpecs) -> String {
    let mut out = String::from("System specifications:\n");
    let cpu = &specs.cpu;
    let _ = writeln!(
        out,
        "CPU: {} ({} cores, {} threads, base {} GHz, max {} GHz)",
        cpu.name,
        cpu.physical_cores,
        cpu.logical_threads,
        or_unknown(cpu.base_clock_ghz),
        or_unknown(cpu.max_clock_ghz)
    );

    let gpu = &specs.gpu;
    let _ = writeln!(
        out,
        "GPU: {} ({} GB VRAM{}{})",
        gpu.name,
        or_unknown(gpu.memory_gb),
        gpu.memory_type
            .as_deref()
            .map(|t| format!(" {t}"))
            .unwrap_or_default(),
        gpu.architecture
            .as_deref()
            .map(|a| format!(", {a}"))
            .unwrap_or_default()
    );
    let features = gpu.features;
    let _ = writeln!(
        out,
        "GPU features: ray tracing {}, DirectX 12 Ultimate {}, DLSS {}, frame generation {}",
        yes_no(features.ray_tracing),
        yes_no(features.directx12_ultimate),
        yes_no(features.vendor_upscaling),
        yes_no(features.advanced_upscaling)
    );

    let ram = &specs.memory;
    let _ = writeln!(
        out,
        "RAM: {} GB {} {} MHz",
        ram.total_gb,
        ram.memory_type.as_deref().unwrap_or(""),
        or_unknown(ram.speed_mhz)
    );

    for device in &specs.storage {
        let _ = writeln!(
            out,
            "Storage {}: {} GB {} ({} GB free)",
            device.mount_point,
            device.total_gb,
            device.medium.label(),
            device.free_gb
        );
    }

    let os = &specs.os;
    let _ = writeln!(out, "OS: {} {}", os.name, os.version);
    let _ = writeln!(
        out,
        "Graphics API: {}",
        os.graphics_api_version.as_deref().unwrap_or("not specified")
    );
    out
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "yes"
    } else {
        "no"
    }
}

fn section_block(out: &mut String, heading: &str, section: &RequirementSection) {
    if section.is_empty() {
        return;
    }
    let _ = writeln!(out, "\n{heading}:");
    for (category, value) in section.iter() {
        let _ = writeln!(out, "{category}: {value}");
    }
}

pub(super) fn user_prompt(specs: &SystemSpecs, requirements: &Requirements) -> String {
    let mut game = format!(
        "Game requirements for {}:\n",
        requirements.title.as_deref().unwrap_or("the game")
    );
    section_block(&mut game, "Minimum", &requirements.minimum);
    section_block(&mut game, "Recommended", &requirements.recommended);
    if requirements.minimum.is_empty() && requirements.recommended.is_empty() {
        game.push_str("The publisher lists no requirements.\n");
    }

    format!(
        "Analyze whether this system can run the game.\n\n{}\n{}\n\
         Consider:\n\
         1. Whether the game runs on this system\n\
         2. The performance level to expect\n\
         3. Likely problems or limitations\n\
         4. Recommended settings for the best experience\n\
         5. Upgrades worth making, if any\n\n\
         Return the analysis in the JSON format specified.",
        system_block(specs),
        game
    )
}
