//! Logger configuration and presets.

use std::io::IsTerminal;

use serde::{Deserialize, Serialize};

/// Logging configuration
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Config {
    /// Filter directive, e.g. `"info"` or `"info,beacon_broker=debug"`
    pub level: String,

    /// Output format
    pub format: Format,

    /// Display toggles
    pub display: DisplayConfig,

    /// Fields attached to the root span
    pub fields: Fields,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            level: "info".to_string(),
            format: Format::Compact,
            display: DisplayConfig::default(),
            fields: Fields::default(),
        }
    }
}

/// Output format
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Format {
    /// Multi-line human-readable output
    Pretty,
    /// Single-line output
    Compact,
    /// One JSON object per event
    Json,
}

impl Format {
    fn parse_lenient(raw: &str) -> Self {
        match raw.to_ascii_lowercase().as_str() {
            "pretty" => Self::Pretty,
            "json" => Self::Json,
            _ => Self::Compact,
        }
    }
}

/// Display toggles
#[allow(clippy::struct_excessive_bools)]
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct DisplayConfig {
    /// Use ANSI colors
    pub colors: bool,
    /// Show the target module
    pub target: bool,
    /// Show `file:line`
    pub source: bool,
    /// Show thread ids
    pub thread_ids: bool,
    /// Include the span list in JSON output
    pub span_list: bool,
    /// Flatten event fields into the JSON root
    pub flatten: bool,
}

impl Default for DisplayConfig {
    fn default() -> Self {
        Self {
            colors: std::io::stderr().is_terminal(),
            target: true,
            source: cfg!(debug_assertions),
            thread_ids: false,
            span_list: true,
            flatten: true,
        }
    }
}

/// Fields recorded on the root span.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct Fields {
    /// Process role, e.g. `fleet` or `consumer`
    pub service: Option<String>,
    /// Instance label
    pub instance: Option<String>,
}

impl Fields {
    /// True when no field is set.
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.service.is_none() && self.instance.is_none()
    }
}

impl Config {
    /// Configuration from the process environment.
    ///
    /// Reads `BEACON_LOG` (falling back to `RUST_LOG`), `BEACON_LOG_FORMAT`,
    /// `BEACON_LOG_COLORS`, `BEACON_SERVICE` and `BEACON_INSTANCE`.
    #[must_use]
    pub fn from_env() -> Self {
        Self::from_lookup(|key| std::env::var(key).ok())
    }

    /// Same as [`Config::from_env`] with an explicit variable source.
    pub fn from_lookup(lookup: impl Fn(&str) -> Option<String>) -> Self {
        let mut config = Self::default();

        if let Some(level) = lookup("BEACON_LOG").or_else(|| lookup("RUST_LOG")) {
            config.level = level;
        }
        if let Some(format) = lookup("BEACON_LOG_FORMAT") {
            config.format = Format::parse_lenient(&format);
        }
        if let Some(colors) = lookup("BEACON_LOG_COLORS") {
            config.display.colors = flag(&colors);
        }
        config.fields.service = lookup("BEACON_SERVICE");
        config.fields.instance = lookup("BEACON_INSTANCE");

        config
    }

    /// Trace level compact output for test binaries.
    #[must_use]
    pub fn test() -> Self {
        Self {
            level: "trace".to_string(),
            format: Format::Compact,
            display: DisplayConfig {
                colors: false,
                source: false,
                ..DisplayConfig::default()
            },
            ..Self::default()
        }
    }
}

fn flag(raw: &str) -> bool {
    !matches!(
        raw.trim().to_ascii_lowercase().as_str(),
        "0" | "false" | "no" | "off" | ""
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use rstest::rstest;
    use std::collections::HashMap;

    fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
        let map: HashMap<String, String> = pairs
            .iter()
            .map(|(k, v)| ((*k).to_string(), (*v).to_string()))
            .collect();
        move |key| map.get(key).cloned()
    }

    #[test]
    fn empty_environment_yields_defaults() {
        let config = Config::from_lookup(env(&[]));
        assert_eq!(config.level, "info");
        assert_eq!(config.format, Format::Compact);
        assert!(config.fields.is_empty());
    }

    #[test]
    fn beacon_log_wins_over_rust_log() {
        let config = Config::from_lookup(env(&[("BEACON_LOG", "debug"), ("RUST_LOG", "warn")]));
        assert_eq!(config.level, "debug");

        let config = Config::from_lookup(env(&[("RUST_LOG", "warn")]));
        assert_eq!(config.level, "warn");
    }

    #[rstest]
    #[case("json", Format::Json)]
    #[case("PRETTY", Format::Pretty)]
    #[case("compact", Format::Compact)]
    #[case("logfmt", Format::Compact)]
    fn parses_format(#[case] raw: &str, #[case] expected: Format) {
        let config = Config::from_lookup(env(&[("BEACON_LOG_FORMAT", raw)]));
        assert_eq!(config.format, expected);
    }

    #[rstest]
    #[case("1", true)]
    #[case("true", true)]
    #[case("0", false)]
    #[case("off", false)]
    fn parses_colors(#[case] raw: &str, #[case] expected: bool) {
        let config = Config::from_lookup(env(&[("BEACON_LOG_COLORS", raw)]));
        assert_eq!(config.display.colors, expected);
    }

    #[test]
    fn reads_root_fields() {
        let config = Config::from_lookup(env(&[
            ("BEACON_SERVICE", "consumer"),
            ("BEACON_INSTANCE", "c-1"),
        ]));
        assert_eq!(config.fields.service.as_deref(), Some("consumer"));
        assert_eq!(config.fields.instance.as_deref(), Some("c-1"));
    }

    #[test]
    fn test_preset_is_quiet_on_colors() {
        assert_eq!(Config::test().level, "trace");
        assert!(!Config::test().display.colors);
    }

    #[test]
    fn deserializes_partial_document() {
        let config: Config = serde_json::from_str(r#"{"level":"warn","format":"json"}"#).unwrap();
        assert_eq!(config.level, "warn");
        assert_eq!(config.format, Format::Json);
        assert_eq!(config.display, DisplayConfig::default());
    }
}
