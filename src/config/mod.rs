// src/config/mod.rs

//! Configuration loading for `utrun`.

pub mod loader;
pub mod model;

pub use loader::{load_from_path, load_or_default};
pub use model::{ApiSection, ConfigFile, EnvSection, ScriptSection};
