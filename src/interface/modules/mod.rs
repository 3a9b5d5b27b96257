//! # Bundled Modules
//!
//! `core_commands` is always loaded. The others are listed by `module list` and can be
//! loaded, unloaded and made default at runtime.

use std::sync::Arc;

use crate::application::modules::ModuleRegistry;

pub mod core_commands;
pub mod moderation;
pub mod utils;

/// Every module that can be loaded with the `module load` command.
pub fn bundled_modules() -> ModuleRegistry {
    ModuleRegistry::new()
        .with(moderation::NAME, || Arc::new(moderation::Moderation::default()))
        .with(utils::NAME, || Arc::new(utils::Utils::default()))
}
