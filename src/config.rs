use serde::{Deserialize, Serialize};
use std::fs;
use std::path::Path;
use std::time::Duration;

use crate::error::PanelError;
use crate::lamp::MAX_LEVELS;
use crate::processor::AddressRegister;

fn default_refresh_ms() -> u64 {
    50
}

fn default_selector_step_ms() -> u64 {
    100
}

fn default_lamp_levels() -> u8 {
    6
}

fn default_title() -> String {
    "IBM 1620 CONTROL PANEL".to_string()
}

/// Tunables for the panel. Every field has a default, so an empty TOML file
/// (or no file at all) gives the stock panel.
///
/// ```toml
/// refresh_ms = 50
/// selector_step_ms = 100
/// lamp_levels = 6
/// selector_start = 4   # OR1
/// title = "1620 CE PANEL"
/// ```
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PanelConfig {
    /// period between processor polls
    #[serde(default = "default_refresh_ms")]
    pub refresh_ms: u64,

    /// time per selector knob step while animating
    #[serde(default = "default_selector_step_ms")]
    pub selector_step_ms: u64,

    /// number of brightness levels above "off" for gate lamps
    #[serde(default = "default_lamp_levels")]
    pub lamp_levels: u8,

    /// knob position used until the processor reports one
    pub selector_start: usize,

    #[serde(default = "default_title")]
    pub title: String,
}

impl Default for PanelConfig {
    fn default() -> Self {
        PanelConfig {
            refresh_ms: default_refresh_ms(),
            selector_step_ms: default_selector_step_ms(),
            lamp_levels: default_lamp_levels(),
            selector_start: 0,
            title: default_title(),
        }
    }
}

impl PanelConfig {
    /// read and validate a TOML config file
    pub fn load(path: impl AsRef<Path>) -> Result<Self, PanelError> {
        let text = fs::read_to_string(path)?;
        Self::from_toml(&text)
    }

    pub fn from_toml(text: &str) -> Result<Self, PanelError> {
        let config: PanelConfig = toml::from_str(text)?;
        config.validate()?;
        Ok(config)
    }

    pub fn validate(&self) -> Result<(), PanelError> {
        if self.refresh_ms == 0 {
            return Err(PanelError::InvalidConfig(
                "refresh_ms must be greater than zero".into(),
            ));
        }
        if self.selector_step_ms == 0 {
            return Err(PanelError::InvalidConfig(
                "selector_step_ms must be greater than zero".into(),
            ));
        }
        if self.lamp_levels == 0 || self.lamp_levels > MAX_LEVELS {
            return Err(PanelError::InvalidConfig(format!(
                "lamp_levels must be between 1 and {}, got {}",
                MAX_LEVELS, self.lamp_levels
            )));
        }
        if self.selector_start >= AddressRegister::ALL.len() {
            return Err(PanelError::InvalidConfig(format!(
                "selector_start must be below {}, got {}",
                AddressRegister::ALL.len(),
                self.selector_start
            )));
        }
        Ok(())
    }

    pub fn refresh_period(&self) -> Duration {
        Duration::from_millis(self.refresh_ms)
    }

    pub fn selector_step(&self) -> Duration {
        Duration::from_millis(self.selector_step_ms)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_empty_toml_gives_defaults() -> Result<(), PanelError> {
        let c = PanelConfig::from_toml("")?;
        assert_eq!(c, PanelConfig::default());
        assert_eq!(c.refresh_period(), Duration::from_millis(50));
        assert_eq!(c.selector_step(), Duration::from_millis(100));
        assert_eq!(c.lamp_levels, 6);
        Ok(())
    }

    #[test]
    fn test_partial_toml_keeps_other_defaults() -> Result<(), PanelError> {
        let c = PanelConfig::from_toml("refresh_ms = 20\nselector_start = 4\n")?;
        assert_eq!(c.refresh_ms, 20);
        assert_eq!(c.selector_start, 4);
        assert_eq!(c.selector_step_ms, 100);
        assert_eq!(c.title, "IBM 1620 CONTROL PANEL");
        Ok(())
    }

    #[test]
    fn test_rejects_zero_refresh() {
        let r = PanelConfig::from_toml("refresh_ms = 0");
        assert!(matches!(r, Err(PanelError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_too_many_levels() {
        let r = PanelConfig::from_toml("lamp_levels = 7");
        assert!(matches!(r, Err(PanelError::InvalidConfig(_))));
        let r = PanelConfig::from_toml("lamp_levels = 0");
        assert!(matches!(r, Err(PanelError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_selector_start_off_the_knob() {
        let r = PanelConfig::from_toml("selector_start = 12");
        assert!(matches!(r, Err(PanelError::InvalidConfig(_))));
    }

    #[test]
    fn test_rejects_unknown_keys() {
        let r = PanelConfig::from_toml("refresh = 10");
        assert!(matches!(r, Err(PanelError::ConfigParse(_))));
    }

    #[test]
    fn test_load_missing_file_is_io_error() {
        let r = PanelConfig::load("/nonexistent/panel1620.toml");
        assert!(matches!(r, Err(PanelError::Io(_))));
    }
}
