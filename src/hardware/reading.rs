//! Typed per-field probe results
//!
//! Every value pulled from an OS interface is a [`Reading`]: either the value,
//! or the reason it is missing. Probes never propagate these errors upward;
//! they are resolved into `Option`s at the probe boundary.

use thiserror::Error;

/// Why a single field could not be read.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum ProbeError {
    /// The interface could not be reached or returned no usable rows.
    #[error("{interface} unavailable: {detail}")]
    SourceUnavailable {
        interface: &'static str,
        detail: String,
    },

    /// A raw value existed but could not be converted to canonical form.
    #[error("could not parse {field} from {raw:?}")]
    Parse { field: &'static str, raw: String },
}

impl ProbeError {
    pub fn unavailable(interface: &'static str, detail: impl Into<String>) -> Self {
        ProbeError::SourceUnavailable {
            interface,
            detail: detail.into(),
        }
    }

    pub fn parse(field: &'static str, raw: impl Into<String>) -> Self {
        ProbeError::Parse {
            field,
            raw: raw.into(),
        }
    }
}

/// Result of reading one field from one source.
pub type Reading<T> = Result<T, ProbeError>;

/// Reading helpers used by the probes and the resolver.
pub trait ReadingExt<T> {
    /// Convert to `Option`, logging why the value is missing.
    fn or_absent(self, field: &'static str) -> Option<T>;
}

impl<T> ReadingExt<T> for Reading<T> {
    fn or_absent(self, field: &'static str) -> Option<T> {
        match self {
            Ok(value) => Some(value),
            Err(err) => {
                tracing::debug!(field, error = %err, "field absent");
                None
            }
        }
    }
}

/// Parse a trimmed string into a positive integer, rejecting zero.
pub fn parse_positive(field: &'static str, raw: &str) -> Reading<u64> {
    let trimmed = raw.trim();
    match trimmed.parse::<u64>() {
        Ok(0) => Err(ProbeError::unavailable(field, "reported zero")),
        Ok(value) => Ok(value),
        Err(_) => Err(ProbeError::parse(field, trimmed)),
    }
}

/// Reject empty or placeholder strings reported by firmware tables.
pub fn non_placeholder(field: &'static str, raw: &str) -> Reading<String> {
    let trimmed = raw.trim();
    let lowered = trimmed.to_ascii_lowercase();
    if trimmed.is_empty()
        || matches!(
            lowered.as_str(),
            "unknown" | "not specified" | "to be filled by o.e.m." | "default string" | "none"
        )
    {
        return Err(ProbeError::unavailable(field, "placeholder value"));
    }
    Ok(trimmed.to_string())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn parse_positive_rejects_zero_and_garbage() {
        assert_eq!(parse_positive("speed", " 3200 "), Ok(3200));
        assert!(matches!(
            parse_positive("speed", "0"),
            Err(ProbeError::SourceUnavailable { .. })
        ));
        assert_eq!(
            parse_positive("speed", "fast"),
            Err(ProbeError::parse("speed", "fast"))
        );
    }

    #[test]
    fn placeholders_are_absent() {
        assert!(non_placeholder("model", "To Be Filled By O.E.M.").is_err());
        assert!(non_placeholder("model", "  ").is_err());
        assert_eq!(non_placeholder("model", " DDR5 ").unwrap(), "DDR5");
    }

    #[test]
    fn or_absent_drops_errors() {
        let missing: Reading<u64> = Err(ProbeError::unavailable("wmi", "no rows"));
        assert_eq!(missing.or_absent("gpu.memory"), None);
        assert_eq!(Ok::<u64, ProbeError>(4).or_absent("gpu.memory"), Some(4));
    }
}
