//! Folio application library
//!
//! Wires the project modules into a registry that the HTTP facade serves.

pub mod modules;

use folio_kernel::{settings::Settings, ModuleRegistry};

/// Build a registry holding every application module.
pub fn build_registry(settings: &Settings) -> anyhow::Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    modules::register_all(&mut registry, settings)?;
    Ok(registry)
}
