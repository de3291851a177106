//! Shell configuration

use std::path::Path;

use anyhow::{bail, Context, Result};
use serde::{Deserialize, Serialize};
use tn_core::NavigatorSettings;

/// One tab of the shell
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct TabConfig {
    /// Key used in scripts, e.g. `home`
    pub key: String,
    /// Name of the screen created as the tab's root
    pub root: String,
    /// Overrides `navigator.detach_by_default` for the root
    #[serde(default)]
    pub detachable: Option<bool>,
}

impl TabConfig {
    pub fn new(key: &str, root: &str) -> Self {
        Self {
            key: key.to_string(),
            root: root.to_string(),
            detachable: None,
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct ShellConfig {
    pub default_tab: String,
    pub tabs: Vec<TabConfig>,
    pub navigator: NavigatorSettings,
}

impl Default for ShellConfig {
    fn default() -> Self {
        Self {
            default_tab: "home".to_string(),
            tabs: vec![
                TabConfig::new("home", "feed"),
                TabConfig::new("search", "explore"),
                TabConfig::new("library", "shelf"),
            ],
            navigator: NavigatorSettings::default(),
        }
    }
}

impl ShellConfig {
    /// Load from a JSON file
    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config {}", path.display()))?;
        let config: Self = serde_json::from_str(&text)
            .with_context(|| format!("Failed to parse config {}", path.display()))?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<()> {
        if self.tabs.is_empty() {
            bail!("At least one tab must be configured");
        }
        if !self.tabs.iter().any(|tab| tab.key == self.default_tab) {
            bail!("Default tab '{}' is not among the configured tabs", self.default_tab);
        }
        for (index, tab) in self.tabs.iter().enumerate() {
            if self.tabs[..index].iter().any(|other| other.key == tab.key) {
                bail!("Tab '{}' is configured twice", tab.key);
            }
        }
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_default_config_is_valid() {
        let config = ShellConfig::default();
        assert!(config.validate().is_ok());
        assert_eq!(config.tabs.len(), 3);
    }

    #[test]
    fn test_partial_json_uses_defaults() {
        let config: ShellConfig =
            serde_json::from_str(r#"{ "navigator": { "scroll_to_top_taps": 5 } }"#).unwrap();

        assert_eq!(config.default_tab, "home");
        assert_eq!(config.navigator.scroll_to_top_taps, 5);
        assert!(!config.navigator.detach_by_default);
    }

    #[test]
    fn test_unknown_default_tab_is_rejected() {
        let config = ShellConfig {
            default_tab: "settings".to_string(),
            ..ShellConfig::default()
        };
        assert!(config.validate().is_err());
    }

    #[test]
    fn test_duplicate_tabs_are_rejected() {
        let mut config = ShellConfig::default();
        config.tabs.push(TabConfig::new("home", "again"));
        assert!(config.validate().is_err());
    }
}
