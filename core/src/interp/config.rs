use std::path::Path;

use anyhow::{Context as _, Result};
use serde::Deserialize;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct EvalConfig {
    /// Frames allowed on one stack before `STACK_OVERFLOW` is raised.
    pub max_call_depth: usize,
    /// Replace generic operators with type-monomorphic variants when operand types are known.
    pub specialize: bool,
    /// Evaluate constant subtrees once at compile time.
    pub fold_constants: bool,
}

impl Default for EvalConfig {
    fn default() -> Self {
        Self {
            max_call_depth: 10_000,
            specialize: true,
            fold_constants: true,
        }
    }
}

impl EvalConfig {
    pub fn from_toml_str(text: &str) -> Result<Self> {
        toml::from_str(text).context("invalid evaluator config")
    }

    pub fn load(path: &Path) -> Result<Self> {
        let text = std::fs::read_to_string(path).with_context(|| format!("failed to read config {}", path.display()))?;
        Self::from_toml_str(&text)
    }
}
