//! TOML requirements catalog
//!
//! ```toml
//! [[game]]
//! title = "Cyberpunk 2077"
//! aliases = ["CP2077"]
//! source_url = "https://store.steampowered.com/app/1091500/"
//! price = "$59.99"
//!
//! [game.minimum]
//! Processor = "Core i7-6700 or Ryzen 5 1600"
//! ```

use std::fs;
use std::path::{Path, PathBuf};

use serde::Deserialize;
use thiserror::Error;

use super::{normalize_title, RequirementSection, Requirements, RequirementsSource};

/// Catalog shipped with the binary.
const BUILTIN_CATALOG: &str = include_str!("../../catalog/games.toml");

/// Placeholder key a section carries when the publisher lists nothing.
const STATUS_KEY: &str = "status";

#[derive(Error, Debug)]
pub enum CatalogError {
    #[error("failed to read catalog {path}")]
    Read {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse catalog {origin}")]
    Parse {
        origin: String,
        #[source]
        source: toml::de::Error,
    },
}

#[derive(Debug, Deserialize)]
struct CatalogFile {
    #[serde(default)]
    game: Vec<CatalogEntry>,
}

#[derive(Debug, Deserialize)]
struct CatalogEntry {
    title: String,
    #[serde(default)]
    aliases: Vec<String>,
    #[serde(default)]
    source_url: String,
    price: Option<String>,
    #[serde(default)]
    minimum: toml::Table,
    #[serde(default)]
    recommended: toml::Table,
}

impl CatalogEntry {
    fn matches(&self, key: &str) -> bool {
        normalize_title(&self.title) == key || self.aliases.iter().any(|a| normalize_title(a) == key)
    }

    fn to_requirements(&self) -> Requirements {
        Requirements {
            title: Some(self.title.clone()),
            minimum: section(&self.minimum),
            recommended: section(&self.recommended),
            source_url: self.source_url.clone(),
            price: self.price.clone().filter(|p| !p.trim().is_empty()),
        }
    }
}

/// Table to section, dropping the status placeholder.
fn section(table: &toml::Table) -> RequirementSection {
    RequirementSection(
        table
            .iter()
            .filter(|(key, _)| !key.eq_ignore_ascii_case(STATUS_KEY))
            .map(|(key, value)| {
                let text = match value {
                    toml::Value::String(s) => s.trim().to_string(),
                    other => other.to_string(),
                };
                (key.clone(), text)
            })
            .filter(|(_, text)| !text.is_empty())
            .collect(),
    )
}

/// Requirements looked up in a local catalog.
#[derive(Debug)]
pub struct CatalogSource {
    entries: Vec<CatalogEntry>,
}

impl CatalogSource {
    pub fn builtin() -> Result<Self, CatalogError> {
        Self::parse(BUILTIN_CATALOG, "<builtin>")
    }

    pub fn load(path: &Path) -> Result<Self, CatalogError> {
        let content = fs::read_to_string(path).map_err(|source| CatalogError::Read {
            path: path.to_path_buf(),
            source,
        })?;
        Self::parse(&content, &path.display().to_string())
    }

    fn parse(content: &str, origin: &str) -> Result<Self, CatalogError> {
        let file: CatalogFile = toml::from_str(content).map_err(|source| CatalogError::Parse {
            origin: origin.to_string(),
            source,
        })?;
        tracing::debug!(origin, games = file.game.len(), "requirements catalog loaded");
        Ok(CatalogSource { entries: file.game })
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }
}

impl RequirementsSource for CatalogSource {
    fn fetch_requirements(&self, title: &str) -> Option<Requirements> {
        let key = normalize_title(title);
        if key.is_empty() {
            return None;
        }
        let found = self.entries.iter().find(|entry| entry.matches(&key));
        if found.is_none() {
            tracing::debug!(title, "game not in catalog");
        }
        found.map(CatalogEntry::to_requirements)
    }
}
