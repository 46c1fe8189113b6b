//! Mapper configuration, loadable from a `[mapping]` TOML table.

use crate::error::{ErrorClass, ErrorOrigin, MapError};
use convert_case::{Case, Casing};
use serde::{Deserialize, Serialize};
use thiserror::Error as ThisError;

///
/// ConfigError
///

#[derive(Debug, ThisError)]
pub enum ConfigError {
    #[error("failed to parse mapper config: {0}")]
    Parse(#[from] toml::de::Error),

    #[error("max_depth must be at least 1")]
    ZeroDepth,
}

impl From<ConfigError> for MapError {
    fn from(err: ConfigError) -> Self {
        let class = match err {
            ConfigError::Parse(_) => ErrorClass::Unsupported,
            ConfigError::ZeroDepth => ErrorClass::InvariantViolation,
        };

        Self::new(class, ErrorOrigin::Config, err.to_string())
    }
}

///
/// NameStyle
///
/// How flattened path names are normalized before auto-bind matching.
///
/// Exact    → segments joined with `_` as declared; matching is exact
/// Snake    → each segment is snake_cased, segments joined with `_`
/// Verbatim → segments concatenated as declared
///

#[derive(Clone, Copy, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NameStyle {
    #[default]
    Exact,
    Snake,
    Verbatim,
}

impl NameStyle {
    /// Flattened match key for a sequence of field names.
    #[must_use]
    pub fn flatten_key<'a>(self, segments: impl IntoIterator<Item = &'a str>) -> String {
        match self {
            Self::Exact => segments.into_iter().collect::<Vec<_>>().join("_"),
            Self::Snake => segments
                .into_iter()
                .map(|segment| segment.to_case(Case::Snake))
                .collect::<Vec<_>>()
                .join("_"),
            Self::Verbatim => segments.into_iter().collect(),
        }
    }
}

///
/// MapperConfig
///
/// `max_depth` bounds auto-bind path length on each side; `None` means
/// unlimited, with a cycle guard against recursive types.
///

#[derive(Clone, Debug, Default, Deserialize, Eq, PartialEq, Serialize)]
#[serde(default, deny_unknown_fields)]
pub struct MapperConfig {
    pub max_depth: Option<usize>,
    pub name_style: NameStyle,
}

impl MapperConfig {
    #[must_use]
    pub const fn with_max_depth(mut self, max_depth: usize) -> Self {
        self.max_depth = Some(max_depth);
        self
    }

    #[must_use]
    pub const fn with_name_style(mut self, name_style: NameStyle) -> Self {
        self.name_style = name_style;
        self
    }

    /// Parse from TOML. Settings live under an optional `[mapping]` table.
    pub fn from_toml_str(source: &str) -> Result<Self, ConfigError> {
        #[derive(Deserialize)]
        struct ConfigFile {
            #[serde(default)]
            mapping: MapperConfig,
        }

        let file: ConfigFile = toml::from_str(source)?;
        file.mapping.validate()?;

        Ok(file.mapping)
    }

    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.max_depth == Some(0) {
            return Err(ConfigError::ZeroDepth);
        }

        Ok(())
    }

    /// Whether a path of `len` segments may still be extended.
    #[must_use]
    pub fn allows_descent(&self, len: usize) -> bool {
        self.max_depth.is_none_or(|max| len < max)
    }
}

///
/// TESTS
///

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn snake_style_normalizes_each_segment() {
        assert_eq!(
            NameStyle::Snake.flatten_key(["Sub", "Property"]),
            "sub_property"
        );
        assert_eq!(NameStyle::Snake.flatten_key(["SubProperty"]), "sub_property");
        assert_eq!(NameStyle::Snake.flatten_key(["sub_property"]), "sub_property");
    }

    #[test]
    fn exact_style_keeps_case() {
        assert_eq!(NameStyle::default(), NameStyle::Exact);
        assert_eq!(NameStyle::Exact.flatten_key(["sub", "property"]), "sub_property");
        assert_eq!(NameStyle::Exact.flatten_key(["Sub", "Property"]), "Sub_Property");
        assert_ne!(
            NameStyle::Exact.flatten_key(["Value"]),
            NameStyle::Exact.flatten_key(["value"])
        );
    }

    #[test]
    fn verbatim_style_concatenates() {
        assert_eq!(
            NameStyle::Verbatim.flatten_key(["Sub", "Property"]),
            "SubProperty"
        );
    }

    #[test]
    fn missing_table_uses_defaults() {
        let config = MapperConfig::from_toml_str("").expect("empty config parses");

        assert_eq!(config, MapperConfig::default());
    }

    #[test]
    fn mapping_table_is_read() {
        let config = MapperConfig::from_toml_str(
            r#"
            [mapping]
            max_depth = 2
            name_style = "verbatim"
            "#,
        )
        .expect("config parses");

        assert_eq!(config.max_depth, Some(2));
        assert_eq!(config.name_style, NameStyle::Verbatim);
        assert!(config.allows_descent(1));
        assert!(!config.allows_descent(2));
    }

    #[test]
    fn zero_depth_is_rejected() {
        let err = MapperConfig::from_toml_str("[mapping]\nmax_depth = 0\n");

        assert!(matches!(err, Err(ConfigError::ZeroDepth)));
    }

    #[test]
    fn unknown_keys_are_rejected() {
        let err = MapperConfig::from_toml_str("[mapping]\ndepth = 3\n");

        assert!(matches!(err, Err(ConfigError::Parse(_))));
    }

    #[test]
    fn config_errors_carry_the_config_origin() {
        let err = MapperConfig::from_toml_str("[mapping]\nmax_depth = 0\n")
            .map_err(MapError::from)
            .unwrap_err();

        assert_eq!(err.origin, ErrorOrigin::Config);
        assert!(err.is_contract_violation());
        assert_eq!(
            err.display_with_class(),
            "config:invariant_violation: max_depth must be at least 1"
        );

        let err = MapperConfig::from_toml_str("[mapping]\ndepth = 3\n")
            .map_err(MapError::from)
            .unwrap_err();
        assert_eq!(err.origin, ErrorOrigin::Config);
        assert!(err.is_unsupported());
    }
}
