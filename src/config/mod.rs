//! Configuration Module
//!
//! Session settings, protocol versions, and settings-file loading.

pub mod loader;
pub mod settings;

pub use loader::ConfigLoader;
pub use settings::{ApiVersion, ChatConfig, ChatSettings, VersionProfile};
