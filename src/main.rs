//! Game Spec Analyzer
//!
//! Takes a normalized snapshot of this machine's hardware and checks it
//! against a game's published requirements:
//! - `specs` prints the snapshot (boxed report or JSON)
//! - `check` looks games up in the requirements catalog and, with
//!   `--analyze`, asks a language model for a compatibility verdict
//! - `config` shows where settings come from (`--init` writes defaults)

mod analysis;
mod config;
mod hardware;
mod requirements;

use std::path::PathBuf;

use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use colored::*;
use serde::Serialize;

use crate::analysis::{CompatibilityAnalysis, CompatibilityAnalyzer, OpenRouterAnalyzer};
use crate::config::Config;
use crate::hardware::SystemSpecs;
use crate::requirements::{CatalogSource, RequirementSection, Requirements, RequirementsSource};

#[cfg(target_os = "windows")]
use windows_sys::Win32::Foundation::INVALID_HANDLE_VALUE;
#[cfg(target_os = "windows")]
use windows_sys::Win32::System::Console::{
    GetConsoleMode, GetStdHandle, SetConsoleMode, SetConsoleOutputCP,
    ENABLE_VIRTUAL_TERMINAL_PROCESSING, STD_ERROR_HANDLE, STD_OUTPUT_HANDLE,
};

/// Game Spec Analyzer - will this game run on this PC?
#[derive(Parser)]
#[command(name = "game-spec")]
#[command(version)]
#[command(about = "Inspect your hardware and check it against game requirements")]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, action = clap::ArgAction::Count, global = true)]
    verbose: u8,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand)]
enum Commands {
    /// Detect and display your system hardware
    Specs {
        /// Print the snapshot as JSON
        #[arg(long)]
        json: bool,
    },

    /// Look up game requirements and compare them with this PC
    Check {
        /// Game titles (e.g., "Elden Ring", "cs2")
        #[arg(required = true)]
        games: Vec<String>,

        /// Requirements catalog to use instead of the configured/bundled one
        #[arg(long)]
        catalog: Option<PathBuf>,

        /// Ask the configured model for a compatibility verdict
        #[arg(long)]
        analyze: bool,

        /// Print results as JSON
        #[arg(long)]
        json: bool,
    },

    /// Show configuration file location and current settings
    Config {
        /// Write a default config file if none exists yet
        #[arg(long)]
        init: bool,
    },
}

#[derive(Serialize)]
struct CheckReport {
    query: String,
    requirements: Option<Requirements>,
    analysis: Option<CompatibilityAnalysis>,
    error: Option<String>,
}

fn main() -> Result<()> {
    #[cfg(target_os = "windows")]
    init_windows_console();

    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Commands::Specs { json } => run_specs(json),
        Commands::Check {
            games,
            catalog,
            analyze,
            json,
        } => run_check(&games, catalog, analyze, json),
        Commands::Config { init } => show_config_info(init),
    }
}

/// Logs go to stderr so `--json` output stays clean.
fn init_tracing(verbose: u8) {
    let rust_log = std::env::var(tracing_subscriber::EnvFilter::DEFAULT_ENV).ok();
    tracing_subscriber::fmt()
        .with_env_filter(log_filter(rust_log.as_deref(), verbose))
        .with_writer(std::io::stderr)
        .with_target(false)
        .init();
}

/// `RUST_LOG` when it parses, else `warn`; `-v` then raises this crate.
fn log_filter(rust_log: Option<&str>, verbose: u8) -> tracing_subscriber::EnvFilter {
    let mut env_filter = rust_log
        .filter(|spec| !spec.trim().is_empty())
        .and_then(|spec| tracing_subscriber::EnvFilter::try_new(spec).ok())
        .unwrap_or_else(|| tracing_subscriber::EnvFilter::new("warn"));

    let crate_directive = match verbose {
        0 => None,
        1 => Some("game_spec_analyzer=debug"),
        _ => Some("game_spec_analyzer=trace"),
    };
    if let Some(directive) = crate_directive.and_then(|d| d.parse().ok()) {
        env_filter = env_filter.add_directive(directive);
    }
    env_filter
}

#[cfg(target_os = "windows")]
fn init_windows_console() {
    // UTF-8 box drawing and ANSI colors on legacy console hosts; failures leave defaults.
    unsafe {
        let _ = SetConsoleOutputCP(65001);

        for handle_id in [STD_OUTPUT_HANDLE, STD_ERROR_HANDLE] {
            let handle = GetStdHandle(handle_id);
            if handle.is_null() || handle == INVALID_HANDLE_VALUE {
                continue;
            }

            let mut mode: u32 = 0;
            if GetConsoleMode(handle, &mut mode) == 0 {
                continue;
            }
            let _ = SetConsoleMode(handle, mode | ENABLE_VIRTUAL_TERMINAL_PROCESSING);
        }
    }
}

fn collect_specs() -> Result<SystemSpecs> {
    SystemSpecs::collect().context("Failed to read the hardware inventory")
}

fn run_specs(json: bool) -> Result<()> {
    if !json {
        println!("{}", "Detecting hardware...".bright_cyan());
    }
    let specs = collect_specs()?;

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&specs).context("Failed to serialize snapshot")?
        );
    } else {
        println!("{}", specs.display());
    }
    Ok(())
}

fn open_catalog(explicit: Option<PathBuf>, config: &Config) -> Result<CatalogSource> {
    match explicit.or_else(|| config.requirements.catalog_path.clone()) {
        Some(path) => CatalogSource::load(&path)
            .with_context(|| format!("Could not open requirements catalog {}", path.display())),
        None => CatalogSource::builtin().context("Bundled requirements catalog is invalid"),
    }
}

fn run_check(games: &[String], catalog: Option<PathBuf>, analyze: bool, json: bool) -> Result<()> {
    let config = Config::load()?.with_env_overrides();
    let source = open_catalog(catalog, &config)?;
    if source.is_empty() {
        tracing::warn!("requirements catalog lists no games");
    }
    tracing::debug!(games = source.len(), "catalog ready");

    let mut reports: Vec<CheckReport> = games
        .iter()
        .map(|query| CheckReport {
            query: query.clone(),
            requirements: source.fetch_requirements(query),
            analysis: None,
            error: None,
        })
        .collect();

    if analyze && reports.iter().any(|r| r.requirements.is_some()) {
        let analyzer = OpenRouterAnalyzer::from_config(&config.analyzer, config::api_key())
            .context("Compatibility analysis is not configured")?;

        if !json {
            println!("{}", "Detecting hardware...".bright_cyan());
        }
        // Collection blocks for the CPU load sample; keep it outside the runtime.
        let specs = collect_specs()?;

        if !json {
            println!(
                "{} {}",
                "Asking".bright_cyan(),
                analyzer.model().bright_white()
            );
        }
        let rt = tokio::runtime::Runtime::new()?;
        for report in reports.iter_mut() {
            let Some(requirements) = report.requirements.as_ref() else {
                continue;
            };
            match rt.block_on(analyzer.analyze(&specs, requirements)) {
                Ok(analysis) => report.analysis = Some(analysis),
                Err(err) => {
                    tracing::warn!(game = %report.query, error = %err, "analysis failed");
                    report.error = Some(err.to_string());
                }
            }
        }
    }

    if json {
        println!(
            "{}",
            serde_json::to_string_pretty(&reports).context("Failed to serialize results")?
        );
        return Ok(());
    }

    for report in &reports {
        print_report(report);
    }
    Ok(())
}

fn print_report(report: &CheckReport) {
    let Some(requirements) = &report.requirements else {
        println!(
            "\n{} '{}' not found in the requirements catalog.",
            "Game".bright_red(),
            report.query.bright_yellow()
        );
        return;
    };

    let title = requirements.title.as_deref().unwrap_or(&report.query);
    println!("\n{}", format!("Requirements for {title}").bright_cyan().bold());
    if let Some(price) = &requirements.price {
        println!("  {} {}", "Price:".bright_yellow(), price);
    }
    print_section("Minimum", &requirements.minimum);
    print_section("Recommended", &requirements.recommended);
    if !requirements.source_url.is_empty() {
        println!("  {} {}", "Source:".bright_black(), requirements.source_url);
    }

    if let Some(analysis) = &report.analysis {
        print_analysis(analysis);
    }
    if let Some(error) = &report.error {
        println!("  {} {}", "✗ Analysis failed:".bright_red(), error.bright_red());
    }
}

fn print_section(heading: &str, section: &RequirementSection) {
    println!("\n  {}", heading.bright_white().bold());
    if section.is_empty() {
        println!("    {}", "Not available".bright_black());
        return;
    }
    for (category, value) in section.iter() {
        println!("    {} {}", format!("{category}:").bright_cyan(), value);
    }
}

fn print_analysis(analysis: &CompatibilityAnalysis) {
    println!("\n  {}", "Compatibility".bright_white().bold());
    let verdict = if analysis.can_run {
        "✓ Can run".bright_green()
    } else {
        "✗ Cannot run".bright_red()
    };
    println!(
        "    {}  {} {}",
        verdict,
        "Performance:".bright_cyan(),
        analysis.performance_level
    );

    let list = |label: &str, items: &[String]| {
        if items.is_empty() {
            return;
        }
        println!("    {}", label.bright_yellow());
        for item in items {
            println!("      - {item}");
        }
    };
    list("Expected issues:", &analysis.expected_issues);

    if let Some(settings) = &analysis.recommended_settings {
        println!("    {} {}", "Recommended settings:".bright_cyan(), settings);
    }
    for (component, verdict) in &analysis.component_analysis {
        println!("    {} {}", format!("{component}:").bright_cyan(), verdict);
    }
    for (resolution, fps) in &analysis.fps_estimates {
        println!("    {} {}", format!("{resolution}:").bright_cyan(), fps);
    }
    list("Upgrade suggestions:", &analysis.upgrade_suggestions);
}

fn show_config_info(init: bool) -> Result<()> {
    println!("{}", "Game Spec Analyzer Configuration\n".bright_cyan().bold());

    let path = Config::config_path()?;
    if init && !path.exists() {
        Config::default().save_to(&path)?;
        tracing::info!(path = %path.display(), "wrote default config");
    }
    println!(
        "{} {}",
        "Config file:".bright_yellow(),
        path.display().to_string().bright_white()
    );
    if path.exists() {
        println!("  {} {}", "Status:".bright_cyan(), "Exists".bright_green());
    } else {
        println!(
            "  {} {}",
            "Status:".bright_cyan(),
            "Not created yet (using defaults)".bright_yellow()
        );
    }

    let cfg = Config::load_from(&path)?.with_env_overrides();

    println!("\n{}", "Analyzer settings:".bright_white().bold());
    println!("  {} {}", "Base URL:".bright_cyan(), cfg.analyzer.base_url);
    println!(
        "  {} {}",
        "Model:".bright_cyan(),
        cfg.analyzer
            .model
            .as_deref()
            .unwrap_or("(not set)")
    );
    println!(
        "  {} {}s, {} retries, temperature {}",
        "Requests:".bright_cyan(),
        cfg.analyzer.timeout_seconds,
        cfg.analyzer.max_retries,
        cfg.analyzer.temperature
    );
    let key_status = if config::api_key().is_some() {
        "set".bright_green()
    } else {
        "not set".bright_yellow()
    };
    println!("  {} {}", format!("{}:", config::API_KEY_ENV).bright_cyan(), key_status);

    println!("\n{}", "Requirements:".bright_white().bold());
    let catalog = cfg
        .requirements
        .catalog_path
        .as_ref()
        .map(|p| p.display().to_string())
        .unwrap_or_else(|| "bundled catalog".to_string());
    println!("  {} {}", "Catalog:".bright_cyan(), catalog);

    println!(
        "\n{}",
        format!(
            "Set {} to use a different config file.",
            config::CONFIG_PATH_ENV
        )
        .bright_black()
    );
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn rust_log_level_is_kept() {
        let filter = log_filter(Some("debug"), 0).to_string();
        assert_eq!(filter, "debug");
    }

    #[test]
    fn default_level_is_warn() {
        assert_eq!(log_filter(None, 0).to_string(), "warn");
        assert_eq!(log_filter(Some(""), 0).to_string(), "warn");
    }

    #[test]
    fn verbose_raises_this_crate_only() {
        let filter = log_filter(None, 1).to_string();
        assert!(filter.contains("game_spec_analyzer=debug"));
        assert!(filter.contains("warn"));
    }
}
