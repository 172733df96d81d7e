//! Game compatibility analysis
//!
//! A [`CompatibilityAnalyzer`] weighs a [`SystemSpecs`] snapshot against a
//! game's [`Requirements`] and returns a structured verdict. The shipped
//! analyzer asks a chat-completions model for a strict JSON reply.

mod openrouter;
mod prompt;

pub use openrouter::OpenRouterAnalyzer;

use std::collections::BTreeMap;
use std::future::Future;

use serde::{Deserialize, Serialize};
use thiserror::Error;

use crate::hardware::SystemSpecs;
use crate::requirements::Requirements;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum PerformanceLevel {
    #[serde(alias = "low", alias = "LOW", alias = "Baixo")]
    Low,
    #[serde(alias = "medium", alias = "MEDIUM", alias = "Médio", alias = "Medio")]
    Medium,
    #[serde(alias = "high", alias = "HIGH", alias = "Alto")]
    High,
}

impl std::fmt::Display for PerformanceLevel {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            PerformanceLevel::Low => write!(f, "Low"),
            PerformanceLevel::Medium => write!(f, "Medium"),
            PerformanceLevel::High => write!(f, "High"),
        }
    }
}

/// Verdict for one game on one machine
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct CompatibilityAnalysis {
    pub can_run: bool,
    pub performance_level: PerformanceLevel,
    pub expected_issues: Vec<String>,
    #[serde(default)]
    pub recommended_settings: Option<String>,
    #[serde(default)]
    pub upgrade_suggestions: Vec<String>,
    /// Component ("cpu", "gpu", ...) → assessment
    #[serde(default)]
    pub component_analysis: BTreeMap<String, String>,
    /// Resolution ("1080p", ...) → expected frame-rate tier
    #[serde(default)]
    pub fps_estimates: BTreeMap<String, String>,
}

#[derive(Error, Debug)]
pub enum AnalyzerError {
    #[error("OPENROUTER_API_KEY is not set")]
    MissingApiKey,

    #[error("no analyzer model configured (set OPENROUTER_MODEL or analyzer.model)")]
    MissingModel,

    #[error("Network error: {0}")]
    Network(#[from] reqwest::Error),

    #[error("API error: {status} - {message}")]
    Api { status: u16, message: String },

    #[error("could not parse analysis: {0}")]
    Parse(String),
}

pub trait CompatibilityAnalyzer {
    fn analyze(
        &self,
        specs: &SystemSpecs,
        requirements: &Requirements,
    ) -> impl Future<Output = Result<CompatibilityAnalysis, AnalyzerError>> + Send;
}

/// The span from the first `{` to the last `}`, which skips code fences and chatter.
pub fn extract_json_object(reply: &str) -> Option<&str> {
    let start = reply.find('{')?;
    let end = reply.rfind('}')?;
    (end > start).then(|| &reply[start..=end])
}

pub fn parse_analysis(reply: &str) -> Result<CompatibilityAnalysis, AnalyzerError> {
    let json = extract_json_object(reply)
        .ok_or_else(|| AnalyzerError::Parse("reply contains no JSON object".to_string()))?;
    serde_json::from_str(json).map_err(|err| AnalyzerError::Parse(err.to_string()))
}
