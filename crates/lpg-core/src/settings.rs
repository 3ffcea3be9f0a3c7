//! The application settings model.
//!
//! Settings are stored on disk as a single JSON document ([`SETTINGS_DOCUMENT`])
//! with one top-level key per section:
//!
//! ```json
//! {
//!   "global": { "plugin_path": "/opt/plugins", "theme": "dark" },
//!   "lpg":    { "output": "/home/me/packages" }
//! }
//! ```
//!
//! # Complete in memory, partial on disk
//!
//! The persisted document may be missing a whole section or single fields in
//! a section (first run, older versions of the app).  The in-memory
//! [`Settings`] value is never partial: [`merge_with_defaults`] fills a
//! missing section with that section's default, and `#[serde(default)]` on
//! each section struct fills missing fields.
//!
//! A field holding a value of the wrong type (`"theme": "solarized"`,
//! `"plugin_path": null`) falls back to that field's default alone; the other
//! fields of its section are kept.

use serde::de::DeserializeOwned;
use serde::{Deserialize, Deserializer, Serialize};
use serde_json::Value;
use tracing::warn;

/// File name of the persisted settings document.
pub const SETTINGS_DOCUMENT: &str = "settings.json";

/// Document key of the [`GlobalSettings`] section.
pub const GLOBAL_SECTION: &str = "global";

/// Document key of the [`LpgSettings`] section.
pub const LPG_SECTION: &str = "lpg";

/// Name of the notification fired when another actor changed the settings.
pub const SETTINGS_UPDATED_EVENT: &str = "settings-updated";

// ── Sections ──────────────────────────────────────────────────────────────────

/// UI colour scheme.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Dark,
    Light,
}

/// Settings shared by every tool in the app.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct GlobalSettings {
    /// Directory of the game's plugin folder.  Empty when not configured.
    #[serde(deserialize_with = "field_or_default")]
    pub plugin_path: String,
    #[serde(deserialize_with = "field_or_default")]
    pub theme: Theme,
}

/// Settings of the poster generator tool.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct LpgSettings {
    /// Directory generated packages are written to.  Empty when not configured.
    #[serde(deserialize_with = "field_or_default")]
    pub output: String,
}

/// Decodes one present field, substituting the field's default when the
/// stored value has the wrong shape.
fn field_or_default<'de, D, T>(deserializer: D) -> Result<T, D::Error>
where
    D: Deserializer<'de>,
    T: DeserializeOwned + Default,
{
    let value = Value::deserialize(deserializer)?;
    Ok(serde_json::from_value(value).unwrap_or_else(|e| {
        warn!("malformed settings field replaced by default: {e}");
        T::default()
    }))
}

// ── Settings ──────────────────────────────────────────────────────────────────

/// The canonical, always-complete settings value.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct Settings {
    pub global: GlobalSettings,
    pub lpg: LpgSettings,
}

impl Settings {
    /// True iff the plugin path is a non-empty string.
    ///
    /// Whitespace is not trimmed: `" "` counts as set.
    pub fn is_plugin_path_set(&self) -> bool {
        !self.global.plugin_path.is_empty()
    }

    /// True iff the package output path is a non-empty string.
    pub fn is_package_path_set(&self) -> bool {
        !self.lpg.output.is_empty()
    }

    pub fn is_theme_dark(&self) -> bool {
        self.global.theme == Theme::Dark
    }

    /// Every section as `(document key, JSON value)`, in write order.
    ///
    /// # Errors
    ///
    /// Returns the serializer error if a section cannot be represented as JSON.
    pub fn sections(&self) -> Result<Vec<(&'static str, Value)>, serde_json::Error> {
        Ok(vec![
            (GLOBAL_SECTION, serde_json::to_value(&self.global)?),
            (LPG_SECTION, serde_json::to_value(&self.lpg)?),
        ])
    }
}

// ── Merging ───────────────────────────────────────────────────────────────────

/// Sections as read from the persisted document; `None` means the key was
/// absent.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct PartialSettings {
    pub global: Option<GlobalSettings>,
    pub lpg: Option<LpgSettings>,
}

impl PartialSettings {
    /// Builds a `PartialSettings` from the raw JSON values stored under each
    /// section key.
    ///
    /// A value that does not have the shape of its section is treated as
    /// absent (and logged) rather than failing the whole load.
    pub fn from_values(global: Option<Value>, lpg: Option<Value>) -> Self {
        Self {
            global: decode_section(GLOBAL_SECTION, global),
            lpg: decode_section(LPG_SECTION, lpg),
        }
    }
}

fn decode_section<T: serde::de::DeserializeOwned>(key: &str, value: Option<Value>) -> Option<T> {
    let value = value?;
    match serde_json::from_value(value) {
        Ok(section) => Some(section),
        Err(e) => {
            warn!(section = key, "malformed settings section replaced by default: {e}");
            None
        }
    }
}

/// Completes `partial` with `defaults`, section by section.
pub fn merge_with_defaults(partial: PartialSettings, defaults: &Settings) -> Settings {
    Settings {
        global: partial.global.unwrap_or_else(|| defaults.global.clone()),
        lpg: partial.lpg.unwrap_or_else(|| defaults.lpg.clone()),
    }
}

// ── Tests ─────────────────────────────────────────────────────────────────────

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn test_default_settings_have_empty_paths_and_dark_theme() {
        let settings = Settings::default();

        assert_eq!(settings.global.plugin_path, "");
        assert_eq!(settings.lpg.output, "");
        assert_eq!(settings.global.theme, Theme::Dark);
    }

    #[test]
    fn test_predicates_on_default_settings() {
        let settings = Settings::default();

        assert!(!settings.is_plugin_path_set());
        assert!(!settings.is_package_path_set());
        assert!(settings.is_theme_dark());
    }

    #[test]
    fn test_whitespace_only_plugin_path_counts_as_set() {
        let mut settings = Settings::default();
        settings.global.plugin_path = "   ".to_string();

        assert!(settings.is_plugin_path_set());
    }

    #[test]
    fn test_light_theme_is_not_dark() {
        let mut settings = Settings::default();
        settings.global.theme = Theme::Light;

        assert!(!settings.is_theme_dark());
    }

    #[test]
    fn test_merge_empty_partial_yields_defaults() {
        // Arrange
        let defaults = Settings::default();

        // Act
        let merged = merge_with_defaults(PartialSettings::default(), &defaults);

        // Assert
        assert_eq!(merged, defaults);
    }

    #[test]
    fn test_merge_keeps_present_section_and_defaults_missing_one() {
        // Arrange
        let partial = PartialSettings {
            global: Some(GlobalSettings {
                plugin_path: "/opt/plugins".to_string(),
                theme: Theme::Light,
            }),
            lpg: None,
        };
        let mut defaults = Settings::default();
        defaults.lpg.output = "/default/out".to_string();

        // Act
        let merged = merge_with_defaults(partial, &defaults);

        // Assert
        assert_eq!(merged.global.plugin_path, "/opt/plugins");
        assert_eq!(merged.global.theme, Theme::Light);
        assert_eq!(merged.lpg.output, "/default/out");
    }

    #[test]
    fn test_from_values_fills_missing_theme_with_dark() {
        let partial = PartialSettings::from_values(Some(json!({ "plugin_path": "/p" })), None);

        let global = partial.global.expect("global section present");
        assert_eq!(global.plugin_path, "/p");
        assert_eq!(global.theme, Theme::Dark);
        assert!(partial.lpg.is_none());
    }

    #[test]
    fn test_from_values_treats_non_object_section_as_absent() {
        let partial = PartialSettings::from_values(Some(json!("not an object")), Some(json!([1])));

        assert!(partial.global.is_none());
        assert!(partial.lpg.is_none());
    }

    #[test]
    fn test_malformed_field_defaults_alone_and_keeps_siblings() {
        // Arrange
        let global = json!({ "plugin_path": "/opt/plugins", "theme": "solarized" });

        // Act
        let partial = PartialSettings::from_values(Some(global), Some(json!({ "output": 7 })));

        // Assert
        let global = partial.global.expect("global section kept");
        assert_eq!(global.plugin_path, "/opt/plugins");
        assert_eq!(global.theme, Theme::Dark);
        assert_eq!(partial.lpg, Some(LpgSettings::default()));
    }

    #[test]
    fn test_null_path_field_defaults_and_keeps_theme() {
        let global: GlobalSettings =
            serde_json::from_value(json!({ "plugin_path": null, "theme": "light" })).unwrap();

        assert_eq!(global.plugin_path, "");
        assert_eq!(global.theme, Theme::Light);
    }

    #[test]
    fn test_theme_serializes_lowercase() {
        assert_eq!(serde_json::to_value(Theme::Dark).unwrap(), json!("dark"));
        assert_eq!(serde_json::to_value(Theme::Light).unwrap(), json!("light"));
    }

    #[test]
    fn test_unknown_theme_value_is_rejected_by_theme_itself() {
        let result: Result<Theme, _> = serde_json::from_value(json!("solarized"));

        assert!(result.is_err());
    }

    #[test]
    fn test_sections_lists_every_section_key_in_order() {
        let sections = Settings::default().sections().expect("serialize sections");
        let keys: Vec<&str> = sections.iter().map(|(k, _)| *k).collect();

        assert_eq!(keys, vec![GLOBAL_SECTION, LPG_SECTION]);
        assert_eq!(sections[1].1, json!({ "output": "" }));
    }
}
