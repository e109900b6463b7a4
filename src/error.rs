use std::io;
use thiserror::Error;

/// Everything that can go wrong outside the widgets themselves. Lamps,
/// registers and the selector clamp their inputs and never fail.
#[derive(Error, Debug)]
pub enum PanelError {
    /// terminal or file I/O failed
    #[error("I/O error: {0}")]
    Io(#[from] io::Error),

    /// config file wasn't valid TOML for `PanelConfig`
    #[error("Config parse error: {0}")]
    ConfigParse(#[from] toml::de::Error),

    /// config parsed but holds values the panel can't use
    #[error("Invalid config: {0}")]
    InvalidConfig(String),
}
