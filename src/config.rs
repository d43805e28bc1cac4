use std::path::Path;

use serde::{Deserialize, Deserializer, Serialize};

use crate::annotate::AnnotationOptions;
use crate::category::CategoryGroup;
use crate::detect::DetectionOptions;
use crate::error::{ConfigError, Result};
use crate::selection::SelectionRequest;

fn default_check() -> SelectionRequest {
    SelectionRequest::of_groups(vec![
        CategoryGroup::Ducts,
        CategoryGroup::Pipes,
        CategoryGroup::Conduit,
    ])
}

fn default_against() -> SelectionRequest {
    SelectionRequest::of_groups(vec![CategoryGroup::Structural])
}

/// A selection table as written in the file, where `groups` may be omitted.
#[derive(Default, Deserialize)]
#[serde(default)]
struct PartialSelection {
    groups: Option<Vec<CategoryGroup>>,
    duct_system_types: Vec<String>,
    pipe_system_types: Vec<String>,
    min_pipe_diameter: Option<f64>,
}

impl PartialSelection {
    fn into_request(self, fallback: fn() -> SelectionRequest) -> SelectionRequest {
        SelectionRequest {
            groups: self.groups.unwrap_or_else(|| fallback().groups),
            duct_system_types: self.duct_system_types,
            pipe_system_types: self.pipe_system_types,
            min_pipe_diameter: self.min_pipe_diameter,
        }
    }
}

fn check_request<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<SelectionRequest, D::Error> {
    PartialSelection::deserialize(deserializer).map(|p| p.into_request(default_check))
}

fn against_request<'de, D: Deserializer<'de>>(
    deserializer: D,
) -> std::result::Result<SelectionRequest, D::Error> {
    PartialSelection::deserialize(deserializer).map(|p| p.into_request(default_against))
}

/// Runtime configuration for one clash check.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ClashConfig {
    /// Elements to check. A table without `groups` keeps the default groups.
    #[serde(default = "default_check", deserialize_with = "check_request")]
    pub check: SelectionRequest,
    /// Elements to check against. A table without `groups` keeps the default
    /// groups.
    #[serde(default = "default_against", deserialize_with = "against_request")]
    pub against: SelectionRequest,
    /// Limit the checked elements to those visible in the active view.
    pub active_view_only: bool,
    /// Draw clash outlines in the active view.
    pub draw_annotations: bool,
    pub detection: DetectionOptions,
    pub annotation: AnnotationOptions,
}

impl Default for ClashConfig {
    fn default() -> Self {
        Self {
            check: default_check(),
            against: default_against(),
            active_view_only: false,
            draw_annotations: false,
            detection: DetectionOptions::default(),
            annotation: AnnotationOptions::default(),
        }
    }
}

impl ClashConfig {
    /// Parses and validates a configuration from TOML text.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Toml` on a parse failure and
    /// `ConfigError::Invalid` if a value is out of range.
    pub fn from_toml_str(text: &str) -> Result<Self> {
        let config: Self = toml::from_str(text).map_err(ConfigError::from)?;
        config.validate()?;
        Ok(config)
    }

    /// Reads, parses and validates a configuration file.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Io` if the file cannot be read, otherwise as
    /// [`from_toml_str`](Self::from_toml_str).
    pub fn load(path: impl AsRef<Path>) -> Result<Self> {
        let path = path.as_ref();
        let text = std::fs::read_to_string(path).map_err(|source| ConfigError::Io {
            path: path.display().to_string(),
            source,
        })?;
        Self::from_toml_str(&text)
    }

    /// Checks value ranges.
    ///
    /// # Errors
    ///
    /// Returns `ConfigError::Invalid` naming the first offending value.
    pub fn validate(&self) -> std::result::Result<(), ConfigError> {
        if self.check.groups.is_empty() {
            return Err(ConfigError::Invalid("check.groups must not be empty".into()));
        }
        if self.against.groups.is_empty() {
            return Err(ConfigError::Invalid("against.groups must not be empty".into()));
        }
        let epsilon = self.detection.volume_epsilon;
        if !epsilon.is_finite() || epsilon < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "detection.volume_epsilon must be non-negative, got {epsilon}"
            )));
        }
        let length = self.annotation.min_segment_length;
        if !length.is_finite() || length < 0.0 {
            return Err(ConfigError::Invalid(format!(
                "annotation.min_segment_length must be non-negative, got {length}"
            )));
        }
        for request in [&self.check, &self.against] {
            if let Some(d) = request.min_pipe_diameter {
                if !d.is_finite() || d < 0.0 {
                    return Err(ConfigError::Invalid(format!(
                        "min_pipe_diameter must be non-negative, got {d}"
                    )));
                }
            }
        }
        Ok(())
    }
}

#[cfg(test)]
#[allow(clippy::unwrap_used)]
mod tests {
    use super::*;
    use crate::error::ClashError;
    use crate::geometry::Color;

    #[test]
    fn empty_text_gives_defaults() {
        let config = ClashConfig::from_toml_str("").unwrap();
        assert_eq!(config, ClashConfig::default());
        assert_eq!(
            config.check.groups,
            vec![CategoryGroup::Ducts, CategoryGroup::Pipes, CategoryGroup::Conduit]
        );
        assert_eq!(config.against.groups, vec![CategoryGroup::Structural]);
        assert!(!config.draw_annotations);
    }

    #[test]
    fn parses_nested_tables() {
        let text = r#"
            active_view_only = true
            draw_annotations = true

            [check]
            groups = ["ducts", "pipes"]
            duct_system_types = ["Supply Air"]
            min_pipe_diameter = 0.05

            [against]
            groups = ["ducts", "structural"]

            [detection]
            volume_epsilon = 1e-6

            [annotation]
            min_segment_length = 0.01

            [annotation.palette]
            pipe = [0, 128, 255]
        "#;
        let config = ClashConfig::from_toml_str(text).unwrap();
        assert!(config.active_view_only && config.draw_annotations);
        assert_eq!(config.check.groups, vec![CategoryGroup::Ducts, CategoryGroup::Pipes]);
        assert_eq!(config.check.duct_system_types, vec!["Supply Air".to_owned()]);
        assert!(config.check.pipe_system_types.is_empty());
        assert_eq!(config.check.min_pipe_diameter, Some(0.05));
        assert_eq!(config.against.groups.len(), 2);
        assert!((config.detection.volume_epsilon - 1e-6).abs() < f64::EPSILON);
        assert_eq!(config.annotation.palette.pipe, Color::rgb(0, 128, 255));
        assert_eq!(config.annotation.palette.duct, Color::rgb(255, 153, 0));
    }

    #[test]
    fn negative_epsilon_is_rejected() {
        let err = ClashConfig::from_toml_str("[detection]\nvolume_epsilon = -1.0").unwrap_err();
        assert!(matches!(err, ClashError::Config(ConfigError::Invalid(_))));
    }

    #[test]
    fn empty_group_list_is_rejected() {
        let err = ClashConfig::from_toml_str("[against]\ngroups = []").unwrap_err();
        assert!(err.to_string().contains("against.groups"));
    }

    #[test]
    fn table_without_groups_keeps_default_groups() {
        let text = r#"
            [check]
            pipe_system_types = ["Domestic Cold Water"]

            [against]
            min_pipe_diameter = 0.02
        "#;
        let config = ClashConfig::from_toml_str(text).unwrap();
        assert_eq!(config.check.groups, ClashConfig::default().check.groups);
        assert_eq!(config.check.pipe_system_types, vec!["Domestic Cold Water".to_owned()]);
        assert_eq!(config.against.groups, vec![CategoryGroup::Structural]);
        assert_eq!(config.against.min_pipe_diameter, Some(0.02));
    }

    #[test]
    fn unknown_group_is_a_parse_error() {
        let err = ClashConfig::from_toml_str("[check]\ngroups = [\"walls\"]").unwrap_err();
        assert!(matches!(err, ClashError::Config(ConfigError::Toml(_))));
    }
}
