//! The `configClient` singleton document.
//!
//! Consumers write nested fields directly (`config.java_config.java_memory`),
//! so the first-run document must carry every group fully populated, and
//! every group defaults independently when a stored document predates it.

use serde::{Deserialize, Serialize};

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct ConfigClient {
    /// Selected account's store key. If set, it must reference an existing
    /// account record; reconciliation repairs violations.
    pub account_selected: Option<i64>,
    /// Selected instance name, a key into the externally fetched list.
    pub instance_selected: Option<String>,
    pub java_config: JavaConfig,
    pub game_config: GameConfig,
    pub launcher_config: LauncherConfig,
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct JavaConfig {
    pub java_path: Option<String>,
    pub java_memory: MemoryRange,
}

/// Memory bounds in GiB.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MemoryRange {
    pub min: u32,
    pub max: u32,
}

impl Default for MemoryRange {
    fn default() -> Self {
        MemoryRange { min: 4, max: 16 }
    }
}

#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct GameConfig {
    pub screen_size: ScreenSize,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ScreenSize {
    pub width: u32,
    pub height: u32,
}

impl Default for ScreenSize {
    fn default() -> Self {
        ScreenSize {
            width: 1920,
            height: 1080,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    /// Parallel download slots handed to the download library.
    pub download_multi: u32,
    pub theme: Theme,
    pub close_launcher: CloseBehavior,
    pub intel_enabled_mac: bool,
    pub debug_logging: bool,
}

impl Default for LauncherConfig {
    fn default() -> Self {
        LauncherConfig {
            download_multi: 5,
            theme: Theme::Auto,
            close_launcher: CloseBehavior::CloseLauncher,
            intel_enabled_mac: true,
            debug_logging: false,
        }
    }
}

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Theme {
    #[default]
    Auto,
    Dark,
    Light,
}

/// What happens to the launcher window once the game starts.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum CloseBehavior {
    /// Hide the launcher while the game runs, restore on exit.
    #[default]
    CloseLauncher,
    /// Quit the launcher process entirely.
    CloseAll,
    /// Leave the launcher window up.
    CloseNone,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn default_document_populates_every_group() {
        let value = serde_json::to_value(ConfigClient::default()).unwrap();

        assert!(value["account_selected"].is_null());
        assert!(value["instance_selected"].is_null());
        assert_eq!(value["java_config"]["java_memory"]["min"], 4);
        assert_eq!(value["java_config"]["java_memory"]["max"], 16);
        assert_eq!(value["game_config"]["screen_size"]["width"], 1920);
        assert_eq!(value["game_config"]["screen_size"]["height"], 1080);
        assert_eq!(value["launcher_config"]["download_multi"], 5);
        assert_eq!(value["launcher_config"]["theme"], "auto");
        assert_eq!(value["launcher_config"]["close_launcher"], "close-launcher");
        assert_eq!(value["launcher_config"]["intel_enabled_mac"], true);
    }

    #[test]
    fn missing_groups_default_independently() {
        let config: ConfigClient = serde_json::from_value(serde_json::json!({
            "account_selected": 2,
            "java_config": { "java_memory": { "min": 2, "max": 8 } }
        }))
        .unwrap();

        assert_eq!(config.account_selected, Some(2));
        assert_eq!(config.java_config.java_memory.min, 2);
        // groups the document never carried come back as defaults
        assert_eq!(config.game_config.screen_size.width, 1920);
        assert_eq!(config.launcher_config.download_multi, 5);
        assert_eq!(config.launcher_config.close_launcher, CloseBehavior::CloseLauncher);
    }
}
