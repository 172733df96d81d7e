//! Game requirements
//!
//! A [`RequirementsSource`] turns a game title into its published minimum and
//! recommended requirements. The bundled source reads a TOML catalog.

mod catalog;

pub use catalog::CatalogSource;

use serde::ser::{Serialize, Serializer};

/// Category → value pairs in publication order ("Processor", "Memory", ...).
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct RequirementSection(pub Vec<(String, String)>);

impl RequirementSection {
    pub fn is_empty(&self) -> bool {
        self.0.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = (&str, &str)> {
        self.0.iter().map(|(k, v)| (k.as_str(), v.as_str()))
    }
}

impl Serialize for RequirementSection {
    fn serialize<S: Serializer>(&self, serializer: S) -> Result<S::Ok, S::Error> {
        serializer.collect_map(self.iter())
    }
}

/// Published requirements for one game
#[derive(Debug, Clone, PartialEq, Eq, serde::Serialize)]
pub struct Requirements {
    pub title: Option<String>,
    /// Empty when the publisher lists none
    pub minimum: RequirementSection,
    pub recommended: RequirementSection,
    pub source_url: String,
    pub price: Option<String>,
}

pub trait RequirementsSource {
    /// `None` when the title is unknown.
    fn fetch_requirements(&self, title: &str) -> Option<Requirements>;
}

/// Lower-case alphanumerics only, so "Counter-Strike 2" and "counter strike 2" agree.
pub fn normalize_title(value: &str) -> String {
    value
        .chars()
        .filter(|c| c.is_alphanumeric())
        .flat_map(|c| c.to_lowercase())
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn titles_normalize_loosely() {
        assert_eq!(normalize_title("Counter-Strike 2"), "counterstrike2");
        assert_eq!(normalize_title("counter strike 2"), "counterstrike2");
        assert_eq!(normalize_title("Baldur's Gate 3"), "baldursgate3");
    }

    #[test]
    fn sections_serialize_as_ordered_maps() {
        let section = RequirementSection(vec![
            ("Processor".into(), "Intel Core i5-8400".into()),
            ("Memory".into(), "12 GB RAM".into()),
        ]);
        assert_eq!(
            serde_json::to_string(&section).unwrap(),
            r#"{"Processor":"Intel Core i5-8400","Memory":"12 GB RAM"}"#
        );
    }
}
