//! The `data` module: lookups, persistent updates and higher-order
//! traversals over lists and dicts.
//!
//! Every function is a native function registered with a full signature,
//! so argument casting and defaults happen in the call protocol. Callbacks
//! are wrapped into arity call sites once per library call.

mod access;
mod higher;
mod random;
mod seq;


use std::sync::Arc;

use anyhow::Result;
use tracing::debug;
use twig_core::call::{Arity1CallSite, Arity2CallSite, Arity3CallSite, CallContext, callable};
use twig_core::error::{ErrorKind, lang_error};
use twig_core::module::Module;
use twig_core::typ::Type;
use twig_core::val::{FunctionSignature, FunctionValue, NativeFn, Parameter, Value};

#[derive(Debug)]
pub struct DataModule {
    functions: Vec<(String, Value)>,
}

impl Default for DataModule {
    fn default() -> Self {
        Self::new()
    }
}

impl DataModule {
    pub fn new() -> Self {
        let mut module = Self { functions: Vec::new() };
        access::register(&mut module);
        seq::register(&mut module);
        higher::register(&mut module);
        random::register(&mut module);
        module
    }

    fn define(&mut self, name: &str, params: Vec<Parameter>, return_type: Type, f: NativeFn) {
        let function = FunctionValue::native(name, FunctionSignature::new(params, return_type), f);
        self.functions.push((name.to_string(), Value::from(function)));
    }
}

impl Module for DataModule {
    fn name(&self) -> &str {
        "data"
    }

    fn description(&self) -> &str {
        "Lookups, persistent updates and traversals over lists and dicts"
    }

    fn init(&self) -> Result<()> {
        debug!(target: "twig::data", functions = self.functions.len(), "data module ready");
        Ok(())
    }

    fn exports(&self) -> Vec<(String, Value)> {
        self.functions.clone()
    }
}

fn param(name: &str, declared_type: Type) -> Parameter {
    Parameter::new(name, declared_type)
}

fn param_or(name: &str, declared_type: Type, default: Value) -> Parameter {
    Parameter::new(name, declared_type).with_default(default)
}

fn illegal(message: impl Into<String>) -> anyhow::Error {
    lang_error(ErrorKind::IllegalArgument, message)
}

fn not_defined(function: &str, xs: &Value) -> anyhow::Error {
    illegal(format!("{} is not defined for type {}", function, xs.type_name()))
}

/// Dict key form of `key`; `None` for nil.
fn as_key(key: &Value) -> Result<Option<Arc<str>>> {
    match key.cast_to(Type::String)? {
        Value::String(s) => Ok(Some(s)),
        _ => Ok(None),
    }
}

/// List index form of `key`; `None` for nil.
fn as_index(key: &Value) -> Result<Option<i64>> {
    match key.cast_to(Type::Long)? {
        Value::Long(i) => Ok(Some(i)),
        _ => Ok(None),
    }
}

/// Callbacks that see an item, and optionally its index or key when they
/// declare a second parameter.
enum Callback {
    Item(Arity1CallSite),
    Indexed(Arity2CallSite),
}

impl Callback {
    fn new(cx: &CallContext<'_>, f: &Value, role: &str) -> Result<Self> {
        if f.is_nil() {
            return Err(lang_error(ErrorKind::NilError, format!("{} cannot be nil", role)));
        }
        match callable(f)?.arity() {
            0 => Err(illegal(format!("{} must accept at least one argument", role))),
            1 => Ok(Callback::Item(cx.arity1(f)?)),
            _ => Ok(Callback::Indexed(cx.arity2(f)?)),
        }
    }

    fn call(&self, cx: &mut CallContext<'_>, item: &Value, index: impl FnOnce() -> Value) -> Result<Value> {
        match self {
            Callback::Item(site) => site.call(cx, item.clone()),
            Callback::Indexed(site) => site.call(cx, item.clone(), index()),
        }
    }

    fn test(&self, cx: &mut CallContext<'_>, item: &Value, index: impl FnOnce() -> Value) -> Result<bool> {
        Ok(self.call(cx, item, index)?.truthy())
    }
}

/// Reducing functions: `(acc, x)` or `(acc, x, index_or_key)`.
enum Reducer {
    Plain(Arity2CallSite),
    Indexed(Arity3CallSite),
}

impl Reducer {
    fn new(cx: &CallContext<'_>, f: &Value) -> Result<Self> {
        if f.is_nil() {
            return Err(lang_error(ErrorKind::NilError, "f cannot be nil"));
        }
        match callable(f)?.arity() {
            0 | 1 => Err(illegal("f must accept at least two arguments")),
            2 => Ok(Reducer::Plain(cx.arity2(f)?)),
            _ => Ok(Reducer::Indexed(cx.arity3(f)?)),
        }
    }

    fn call(&self, cx: &mut CallContext<'_>, acc: Value, item: &Value, index: impl FnOnce() -> Value) -> Result<Value> {
        match self {
            Reducer::Plain(site) => site.call(cx, acc, item.clone()),
            Reducer::Indexed(site) => site.call(cx, acc, item.clone(), index()),
        }
    }
}

/// Arity-one predicate, as used on accumulators by `reduce_until` and `reduce_while`.
fn accumulator_predicate(cx: &CallContext<'_>, p: &Value) -> Result<Arity1CallSite> {
    if p.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "p cannot be nil"));
    }
    if callable(p)?.arity() == 0 {
        return Err(illegal("p must accept at least one argument"));
    }
    cx.arity1(p)
}
