pub mod data;

use anyhow::Result;
use twig_core::module::ModuleRegistry;

/// Register all stdlib modules with the given registry
pub fn register_stdlib_modules(registry: &mut ModuleRegistry) -> Result<()> {
    registry.register_module(Box::new(data::DataModule::new()))?;
    Ok(())
}

/// A registry holding every stdlib module.
pub fn stdlib_registry() -> Result<ModuleRegistry> {
    let mut registry = ModuleRegistry::new();
    register_stdlib_modules(&mut registry)?;
    Ok(registry)
}
