use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::call::CallContext;
use crate::error::{ErrorKind, SourceInfo, lang_error};
use crate::interp::{EvaluationContext, Frame, MemorySpace, Stack};
use crate::op::ExpressionOp;
use crate::typ::Type;
use crate::util::stack::ensure_sufficient_stack;

use super::Value;

/// Native function entry point. `args` always has exactly the declared arity.
pub type NativeFn = fn(&mut CallContext<'_>, &[Value]) -> Result<Value>;

#[derive(Debug, Clone)]
pub struct Parameter {
    pub name: Arc<str>,
    pub declared_type: Type,
    pub default: Option<Value>,
}

impl Parameter {
    pub fn new(name: impl Into<Arc<str>>, declared_type: Type) -> Self {
        Self {
            name: name.into(),
            declared_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: Value) -> Self {
        self.default = Some(default);
        self
    }
}

#[derive(Debug, Clone)]
pub struct FunctionSignature {
    pub params: Vec<Parameter>,
    pub return_type: Type,
}

impl FunctionSignature {
    pub fn new(params: Vec<Parameter>, return_type: Type) -> Self {
        Self { params, return_type }
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.params.len()
    }

    fn position(&self, name: &str) -> Option<usize> {
        self.params.iter().position(|p| &*p.name == name)
    }
}

pub enum FunctionBody {
    /// Closure over an operation tree. The tree is shared read-only by every
    /// invocation; all per-call state lives on the caller's [`Stack`].
    User {
        body: Arc<dyn ExpressionOp>,
        captured: Arc<MemorySpace>,
    },
    Native(NativeFn),
    /// Partial application: `slots` follows the inner signature, `Some` for
    /// bound parameters.
    Curried {
        inner: Arc<FunctionValue>,
        slots: Vec<Option<Value>>,
    },
}

impl fmt::Debug for FunctionBody {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FunctionBody::User { body, .. } => f.debug_struct("User").field("body", body).finish_non_exhaustive(),
            FunctionBody::Native(_) => f.write_str("Native"),
            FunctionBody::Curried { inner, slots } => f
                .debug_struct("Curried")
                .field("inner", &inner.name)
                .field("bound", &slots.iter().filter(|s| s.is_some()).count())
                .finish(),
        }
    }
}

#[derive(Debug)]
pub struct FunctionValue {
    name: Option<Arc<str>>,
    signature: FunctionSignature,
    body: FunctionBody,
    source: Option<SourceInfo>,
}

impl FunctionValue {
    pub fn user(
        name: Option<Arc<str>>,
        signature: FunctionSignature,
        body: Arc<dyn ExpressionOp>,
        captured: Arc<MemorySpace>,
        source: Option<SourceInfo>,
    ) -> Self {
        Self {
            name,
            signature,
            body: FunctionBody::User { body, captured },
            source,
        }
    }

    pub fn native(name: &str, signature: FunctionSignature, f: NativeFn) -> Self {
        Self {
            name: Some(Arc::from(name)),
            signature,
            body: FunctionBody::Native(f),
            source: None,
        }
    }

    pub fn name(&self) -> Option<&str> {
        self.name.as_deref()
    }

    fn display_name(&self) -> Arc<str> {
        self.name.clone().unwrap_or_else(|| Arc::from("<anonymous>"))
    }

    pub fn signature(&self) -> &FunctionSignature {
        &self.signature
    }

    #[inline]
    pub fn arity(&self) -> usize {
        self.signature.arity()
    }

    pub fn source(&self) -> Option<&SourceInfo> {
        self.source.as_ref()
    }

    /// Match positional and named arguments to parameters, filling defaults.
    pub fn bind_arguments(&self, positional: Vec<Value>, named: Vec<(Arc<str>, Value)>) -> Result<Vec<Value>> {
        let params = &self.signature.params;
        if positional.len() > params.len() {
            return Err(lang_error(
                ErrorKind::IllegalArgument,
                format!(
                    "{} accepts at most {} argument(s), got {}",
                    self.display_name(),
                    params.len(),
                    positional.len()
                ),
            ));
        }
        let mut slots: Vec<Option<Value>> = positional.into_iter().map(Some).collect();
        slots.resize(params.len(), None);
        for (name, value) in named {
            let idx = self.signature.position(&name).ok_or_else(|| {
                lang_error(
                    ErrorKind::IllegalArgument,
                    format!("{} has no parameter named {}", self.display_name(), name),
                )
            })?;
            if slots[idx].is_some() {
                return Err(lang_error(
                    ErrorKind::IllegalArgument,
                    format!("parameter {} given more than once", name),
                ));
            }
            slots[idx] = Some(value);
        }
        slots
            .into_iter()
            .zip(params)
            .map(|(slot, param)| match slot {
                Some(v) => Ok(v),
                None => param.default.clone().ok_or_else(|| {
                    lang_error(
                        ErrorKind::IllegalArgument,
                        format!("missing argument {} for {}", param.name, self.display_name()),
                    )
                }),
            })
            .collect()
    }

    /// Call with exactly `arity()` arguments.
    pub fn invoke(self: &Arc<Self>, stack: &mut Stack, context: &EvaluationContext, args: Vec<Value>) -> Result<Value> {
        if args.len() != self.arity() {
            return Err(lang_error(
                ErrorKind::IllegalArgument,
                format!(
                    "{} expects {} argument(s), got {}",
                    self.display_name(),
                    self.arity(),
                    args.len()
                ),
            ));
        }
        self.invoke_unchecked(stack, context, args)
    }

    /// Call without the arity check. Call sites validate arity once when built.
    pub(crate) fn invoke_unchecked(
        self: &Arc<Self>,
        stack: &mut Stack,
        context: &EvaluationContext,
        args: Vec<Value>,
    ) -> Result<Value> {
        let args = self.coerce_arguments(args)?;
        let result = ensure_sufficient_stack(|| self.dispatch(stack, context, args))?;
        match self.signature.return_type {
            Type::Any => Ok(result),
            ty => result.cast_to(ty),
        }
    }

    fn coerce_arguments(&self, mut args: Vec<Value>) -> Result<Vec<Value>> {
        for (arg, param) in args.iter_mut().zip(&self.signature.params) {
            if param.declared_type != Type::Any && !arg.is_nil() && arg.type_of() != param.declared_type {
                *arg = arg.cast_to(param.declared_type)?;
            }
        }
        Ok(args)
    }

    fn dispatch(self: &Arc<Self>, stack: &mut Stack, context: &EvaluationContext, args: Vec<Value>) -> Result<Value> {
        let max_depth = context.config().max_call_depth;
        match &self.body {
            FunctionBody::User { body, captured } => {
                trace!(target: "twig::call", function = %self.display_name(), "invoke user function");
                let frame = Frame::new(self.display_name(), Some(captured.clone()));
                stack.with_frame(frame, max_depth, |stack| {
                    if let Some(name) = &self.name {
                        stack.bind(name.clone(), Value::Function(self.clone()));
                    }
                    for (param, arg) in self.signature.params.iter().zip(args) {
                        stack.bind(param.name.clone(), arg);
                    }
                    body.eval(stack, context)
                })
            }
            FunctionBody::Native(f) => {
                let frame = Frame::new(self.display_name(), None);
                stack.with_frame(frame, max_depth, |stack| {
                    let result = {
                        let mut cx = CallContext::new(stack, context);
                        f(&mut cx, &args)
                    };
                    result.map_err(|err| stack.locate(err, None))
                })
            }
            FunctionBody::Curried { inner, slots } => {
                let mut rest = args.into_iter();
                let full: Vec<Value> = slots
                    .iter()
                    .map(|slot| match slot {
                        Some(bound) => bound.clone(),
                        None => rest.next().unwrap_or_default(),
                    })
                    .collect();
                inner.invoke_unchecked(stack, context, full)
            }
        }
    }

    /// Bind parameters by name, leaving a function of the remaining ones.
    pub fn curry(self: &Arc<Self>, bound: Vec<(Arc<str>, Value)>) -> Result<FunctionValue> {
        let mut slots: Vec<Option<Value>> = vec![None; self.arity()];
        for (name, value) in bound {
            let idx = self.signature.position(&name).ok_or_else(|| {
                lang_error(
                    ErrorKind::IllegalArgument,
                    format!("cannot curry {}: no parameter named {}", self.display_name(), name),
                )
            })?;
            let param = &self.signature.params[idx];
            slots[idx] = Some(value.cast_to(param.declared_type)?);
        }
        let params = self
            .signature
            .params
            .iter()
            .zip(&slots)
            .filter(|(_, slot)| slot.is_none())
            .map(|(param, _)| param.clone())
            .collect();
        Ok(FunctionValue {
            name: self.name.clone(),
            signature: FunctionSignature::new(params, self.signature.return_type),
            body: FunctionBody::Curried {
                inner: self.clone(),
                slots,
            },
            source: self.source.clone(),
        })
    }
}
