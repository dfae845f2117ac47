//! Engine configuration.
//!
//! A thin, serde-friendly struct loaded through a layered [`figment`]
//! source (defaults, then an optional TOML file, then environment
//! variables prefixed `SQUIGGLY_`), the same shape the crate this engine
//! follows the idiom of uses for its own `Config`.

use std::time::Duration;

use figment::providers::{Env, Format, Toml};
use figment::Figment;
use serde::{Deserialize, Serialize};

use crate::error::{ConfigError, FilterResult};

pub mod defaults {
    //! Default values for every [`super::EngineConfig`] field, kept in one
    //! place so they're easy to audit and to reuse from `Default::default`.
    use std::time::Duration;

    pub const DEFAULT_APPEND_CONTEXT_IN_NODE_FILTER: bool = true;
    pub const DEFAULT_FILTER_IMPLICITLY_INCLUDE_BASE_FIELDS_IN_VIEW: bool = true;
    pub const DEFAULT_FILTER_PROPAGATE_VIEW_TO_NESTED_FILTERS: bool = false;
    pub const DEFAULT_PROPERTY_ADD_NON_ANNOTATED_FIELDS_TO_BASE_VIEW: bool = true;
    pub const DEFAULT_PARSE_CACHE_MAX_ENTRIES: usize = 10_000;
    pub const DEFAULT_PARSE_CACHE_FAILURE_TTL: Duration = Duration::from_secs(5);
}

use defaults::*;

/// Custom serde for `Duration` accepting either a plain integer of seconds
/// or a human-readable string (`"5s"`, `"1m30s"`), mirroring the config
/// module this is lifted from.
mod duration_serde {
    use serde::de::{self, Visitor};
    use serde::{Deserializer, Serializer};
    use std::fmt;
    use std::time::Duration;

    pub fn serialize<S>(duration: &Duration, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        serializer.serialize_str(&humantime::format_duration(*duration).to_string())
    }

    pub fn deserialize<'de, D>(deserializer: D) -> Result<Duration, D::Error>
    where
        D: Deserializer<'de>,
    {
        struct DurationVisitor;

        impl<'de> Visitor<'de> for DurationVisitor {
            type Value = Duration;

            fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
                formatter.write_str("a duration in seconds (number) or a human-readable string such as '5s'")
            }

            fn visit_u64<E>(self, seconds: u64) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                Ok(Duration::from_secs(seconds))
            }

            fn visit_str<E>(self, value: &str) -> Result<Self::Value, E>
            where
                E: de::Error,
            {
                humantime::parse_duration(value).map_err(|e| de::Error::custom(format!("invalid duration '{value}': {e}")))
            }
        }

        deserializer.deserialize_any(DurationVisitor)
    }
}

/// Engine-wide configuration. Every field has a default, so an empty
/// `EngineConfig::default()` is always a valid starting point.
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
#[serde(default)]
pub struct EngineConfig {
    /// When applying a filter to a nested node, append the matched path as
    /// diagnostic context rather than silently dropping it.
    pub append_context_in_node_filter: bool,
    /// A resolved view implicitly includes the base view's fields in
    /// addition to its own.
    pub filter_implicitly_include_base_fields_in_view: bool,
    /// A nested filter inherits the view active at its parent, unless it
    /// names its own.
    pub filter_propagate_view_to_nested_filters: bool,
    /// Fields present on the host type but not named by any view are added
    /// to the base view automatically.
    pub property_add_non_annotated_fields_to_base_view: bool,
    /// Upper bound on the parse cache's resident entry count.
    pub parse_cache_max_entries: usize,
    /// How long a parse failure is cached before the next `parse` call for
    /// the same text retries the lexer/parser instead of replaying the error.
    #[serde(with = "duration_serde")]
    pub parse_cache_failure_ttl: Duration,
}

impl Default for EngineConfig {
    fn default() -> Self {
        Self {
            append_context_in_node_filter: DEFAULT_APPEND_CONTEXT_IN_NODE_FILTER,
            filter_implicitly_include_base_fields_in_view: DEFAULT_FILTER_IMPLICITLY_INCLUDE_BASE_FIELDS_IN_VIEW,
            filter_propagate_view_to_nested_filters: DEFAULT_FILTER_PROPAGATE_VIEW_TO_NESTED_FILTERS,
            property_add_non_annotated_fields_to_base_view: DEFAULT_PROPERTY_ADD_NON_ANNOTATED_FIELDS_TO_BASE_VIEW,
            parse_cache_max_entries: DEFAULT_PARSE_CACHE_MAX_ENTRIES,
            parse_cache_failure_ttl: DEFAULT_PARSE_CACHE_FAILURE_TTL,
        }
    }
}

impl EngineConfig {
    /// Loads configuration layered as defaults, then an optional TOML file
    /// at `path`, then `SQUIGGLY_`-prefixed environment variables.
    pub fn load(path: Option<&str>) -> FilterResult<Self> {
        let mut figment = Figment::from(figment::providers::Serialized::defaults(Self::default()));
        if let Some(path) = path {
            figment = figment.merge(Toml::file(path));
        }
        figment = figment.merge(Env::prefixed("SQUIGGLY_"));
        figment.extract().map_err(|e| ConfigError::Load(e).into())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_config_matches_documented_defaults() {
        let config = EngineConfig::default();
        assert!(config.append_context_in_node_filter);
        assert!(config.filter_implicitly_include_base_fields_in_view);
        assert!(!config.filter_propagate_view_to_nested_filters);
        assert!(config.property_add_non_annotated_fields_to_base_view);
        assert_eq!(config.parse_cache_max_entries, 10_000);
        assert_eq!(config.parse_cache_failure_ttl, Duration::from_secs(5));
    }

    #[test]
    fn load_with_no_file_yields_defaults() {
        let config = EngineConfig::load(None).expect("loads");
        assert_eq!(config, EngineConfig::default());
    }
}
