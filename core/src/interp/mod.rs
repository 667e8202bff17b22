mod config;
mod context;
mod memory;
mod stack;

#[cfg(test)]
mod stack_test;

pub use config::EvalConfig;
pub use context::EvaluationContext;
pub use memory::MemorySpace;
pub use stack::{Frame, Stack};
