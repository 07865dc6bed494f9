//! Connection preferences
//!
//! This module defines preference types, default values, and providers:
//! - `preferences`: The `Preferences` structure
//! - `defaults`: Default preference values
//! - `provider`: Where sources look preferences up at connect time

pub mod defaults;
pub mod preferences;
pub mod provider;

pub use preferences::Preferences;
pub use provider::{ConfigProvider, FileConfig, StaticConfig};
