use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};

use anyhow::Result;

use crate::module::ModuleRegistry;
use crate::util::fast_map::{NameMap, name_map_new};
use crate::val::Value;

use super::EvalConfig;

static NEXT_ID: AtomicU64 = AtomicU64::new(1);

fn next_id() -> u64 {
    NEXT_ID.fetch_add(1, Ordering::Relaxed)
}

/// Read-only state shared by every evaluation: the global namespace and
/// the evaluator configuration. Safe to share across threads.
///
/// Every distinct set of globals gets its own id. Clones share it, since
/// their globals are identical.
#[derive(Debug, Clone)]
pub struct EvaluationContext {
    id: u64,
    globals: NameMap<Value>,
    config: EvalConfig,
}

impl Default for EvaluationContext {
    fn default() -> Self {
        Self::new(EvalConfig::default())
    }
}

impl EvaluationContext {
    pub fn new(config: EvalConfig) -> Self {
        Self {
            id: next_id(),
            globals: name_map_new(),
            config,
        }
    }

    /// Expose every registered module as a global dict of its exports.
    pub fn from_registry(registry: &ModuleRegistry, config: EvalConfig) -> Result<Self> {
        let mut ctx = Self::new(config);
        for name in registry.module_names() {
            let value = registry.module_value(&name)?;
            ctx.globals.insert(Arc::from(name), value);
        }
        Ok(ctx)
    }

    pub fn with_global(mut self, name: impl Into<Arc<str>>, value: Value) -> Self {
        self.globals.insert(name.into(), value);
        self.id = next_id();
        self
    }

    /// Identity of this global namespace, used to key cached lookups.
    #[inline]
    pub fn id(&self) -> u64 {
        self.id
    }

    #[inline]
    pub fn global(&self, name: &str) -> Option<&Value> {
        self.globals.get(name)
    }

    #[inline]
    pub fn config(&self) -> &EvalConfig {
        &self.config
    }
}
