//! Configuration management for retime.
//!
//! This module provides:
//! - TOML-based configuration with logical sections
//! - Atomic file writes (write to temp, then rename)
//! - Section-level updates (only changed section is modified)
//! - Validation on load with automatic defaults
//!
//! # Example
//!
//! ```no_run
//! use retime_core::config::{ConfigManager, ConfigSection};
//!
//! let mut config = ConfigManager::new(".config/retime.toml");
//! config.load_or_create().unwrap();
//!
//! println!("Preset: {}", config.settings().encoding.preset);
//!
//! config.settings_mut().encoding.crf = 20;
//! config.update_section(ConfigSection::Encoding).unwrap();
//! ```

mod manager;
mod settings;

pub use manager::{ConfigError, ConfigManager, ConfigResult};
pub use settings::{
    ConfigSection, EncodingSettings, EngineSettings, LoggingSettings, PathSettings, Settings,
    SyncSettings,
};
