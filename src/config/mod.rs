//! Configuration module for Koble.
//!
//! Handles loading and managing application settings.

mod settings;

pub use settings::{
    AccountSelection, AgentSettings, ConnectionSettings, GeneralSettings, PlatformSettings,
    Settings, UserSettings,
};
