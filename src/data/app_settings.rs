use crate::calc::PlacementConfig;
use crate::data::persistence::{Format, Persistable};
use crate::picker::DEFAULT_PLACEHOLDER;
use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::path::Path;

#[derive(Serialize, Deserialize, Debug, Clone, PartialEq)]
#[serde(default)]
pub struct AppSettings {
    /// Trigger text for date fields without a value and without their own
    /// placeholder.
    pub placeholder: String,
    /// `error`, `warn`, `info`, `debug` or `trace`.
    pub log_level: String,
    /// Popover geometry, in terminal cells.
    pub placement: PlacementConfig,
}

impl Default for AppSettings {
    fn default() -> Self {
        AppSettings {
            placeholder: DEFAULT_PLACEHOLDER.to_string(),
            log_level: "info".to_string(),
            placement: PlacementConfig::terminal(),
        }
    }
}

/// Wrapper that reads the `settings` key from config.yaml.
/// `FormSchema` reads the same file for its `fields` key; both work
/// independently because serde ignores unknown fields by default.
#[derive(Serialize, Deserialize, Default, Debug)]
struct SettingsWrapper {
    #[serde(default)]
    settings: AppSettings,
}

impl Persistable for SettingsWrapper {
    fn filename() -> &'static str {
        "config.yaml"
    }
    fn format() -> Format {
        Format::Yaml
    }
}

impl AppSettings {
    pub fn load() -> Result<Self> {
        Ok(SettingsWrapper::load()?.settings)
    }

    pub fn load_from(dir: &Path) -> Result<Self> {
        Ok(SettingsWrapper::load_from(dir)?.settings)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_app_settings_default_values() {
        let settings = AppSettings::default();
        assert_eq!(settings.placeholder, "YYYY-MM-DD");
        assert_eq!(settings.log_level, "info");
        assert_eq!(settings.placement, PlacementConfig::terminal());
    }

    #[test]
    fn test_settings_wrapper_yaml_roundtrip() {
        let wrapper = SettingsWrapper {
            settings: AppSettings {
                placeholder: "Pick a day".to_string(),
                log_level: "debug".to_string(),
                placement: PlacementConfig::default(),
            },
        };
        let yaml = serde_norway::to_string(&wrapper).unwrap();
        let parsed: SettingsWrapper = serde_norway::from_str(&yaml).unwrap();
        assert_eq!(parsed.settings, wrapper.settings);
    }

    #[test]
    fn test_settings_wrapper_missing_key_uses_default() {
        // When config.yaml has no 'settings' key, default values kick in
        let yaml = "fields: []";
        let wrapper: SettingsWrapper = serde_norway::from_str(yaml).unwrap();
        assert_eq!(wrapper.settings, AppSettings::default());
    }

    #[test]
    fn test_missing_placement_uses_terminal_sizes() {
        let yaml = "settings:\n  placeholder: Pick\n";
        let wrapper: SettingsWrapper = serde_norway::from_str(yaml).unwrap();
        assert_eq!(wrapper.settings.placeholder, "Pick");
        assert_eq!(wrapper.settings.placement, PlacementConfig::terminal());
        assert_eq!(wrapper.settings.log_level, "info");
    }

    #[test]
    fn test_incomplete_placement_is_rejected() {
        let yaml = "settings:\n  placement:\n    gap: 1.0\n";
        assert!(serde_norway::from_str::<SettingsWrapper>(yaml).is_err());
    }

    #[test]
    fn test_load_from_missing_dir_gives_defaults() {
        let tmp = tempfile::TempDir::new().unwrap();
        let settings = AppSettings::load_from(&tmp.path().join("nope")).unwrap();
        assert_eq!(settings, AppSettings::default());
    }
}
