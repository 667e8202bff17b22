use std::collections::HashMap;

use anyhow::Result;

use crate::error::{ErrorKind, lang_error};
use crate::val::{DictValue, Value};

/// Registry of native modules.
///
/// Each module contributes a dict of exported values; an
/// [`EvaluationContext`](crate::interp::EvaluationContext) built from the
/// registry exposes every module under its name.
#[derive(Debug, Default)]
pub struct ModuleRegistry {
    modules: HashMap<String, Box<dyn Module>>,
}

impl ModuleRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Register a module under its own name. Disabled modules are skipped.
    pub fn register_module(&mut self, module: Box<dyn Module>) -> Result<()> {
        if !module.enabled() {
            tracing::debug!(target: "twig::module", module = module.name(), "module disabled, skipping");
            return Ok(());
        }
        module.init()?;
        self.modules.insert(module.name().to_string(), module);
        Ok(())
    }

    pub fn get_module(&self, name: &str) -> Result<&dyn Module> {
        self.modules
            .get(name)
            .map(|boxed| boxed.as_ref())
            .ok_or_else(|| lang_error(ErrorKind::CannotFindModule, format!("module '{}' not found", name)))
    }

    /// Registered module names, sorted.
    pub fn module_names(&self) -> Vec<String> {
        let mut names: Vec<String> = self.modules.keys().cloned().collect();
        names.sort();
        names
    }

    /// The module's exports as a dict value.
    pub fn module_value(&self, name: &str) -> Result<Value> {
        let module = self.get_module(name)?;
        let dict: DictValue = module.exports().into_iter().collect();
        Ok(Value::Dict(dict))
    }

    /// Resolve `module.member`, e.g. `data.get_in`.
    pub fn resolve(&self, path: &str) -> Result<Value> {
        let (module, member) = path
            .split_once('.')
            .ok_or_else(|| lang_error(ErrorKind::CannotFindModule, format!("'{}' is not a module member path", path)))?;
        let exports = self.get_module(module)?.exports();
        exports
            .into_iter()
            .find(|(name, _)| name == member)
            .map(|(_, value)| value)
            .ok_or_else(|| {
                lang_error(
                    ErrorKind::IllegalAccess,
                    format!("module '{}' has no member '{}'", module, member),
                )
            })
    }
}

/// A native module: a named bundle of exported values.
pub trait Module: Send + Sync + std::fmt::Debug {
    fn name(&self) -> &str;

    fn description(&self) -> &str {
        ""
    }

    fn enabled(&self) -> bool {
        true
    }

    /// Called once on registration.
    fn init(&self) -> Result<()> {
        Ok(())
    }

    fn exports(&self) -> Vec<(String, Value)>;
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::error_kind;

    #[derive(Debug)]
    struct Constants;

    impl Module for Constants {
        fn name(&self) -> &str {
            "consts"
        }

        fn exports(&self) -> Vec<(String, Value)> {
            vec![("answer".to_string(), Value::Long(42))]
        }
    }

    #[test]
    fn test_registry_starts_empty() {
        let registry = ModuleRegistry::new();
        assert!(registry.module_names().is_empty());
    }

    #[test]
    fn test_missing_module_is_cannot_find_module() {
        let registry = ModuleRegistry::new();
        let err = registry.get_module("nonexistent").unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::CannotFindModule));
    }

    #[test]
    fn test_resolve_member() -> Result<()> {
        let mut registry = ModuleRegistry::new();
        registry.register_module(Box::new(Constants))?;
        assert_eq!(registry.resolve("consts.answer")?, Value::Long(42));
        let err = registry.resolve("consts.question").unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::IllegalAccess));
        Ok(())
    }
}
