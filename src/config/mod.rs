// src/config/mod.rs

//! Run configuration.
//!
//! - [`model`] defines the in-process [`RunConfig`] and the file-backed
//!   [`RunSettings`] (`[run]` table).
//! - [`loader`] reads settings from TOML.
//! - [`validate`] turns raw settings into validated ones.

pub mod loader;
pub mod model;
pub mod validate;

pub use loader::{default_config_path, load_and_validate, load_from_path, parse_and_validate};
pub use model::{RawSettingsFile, RunConfig, RunSettings, SettingsFile};
