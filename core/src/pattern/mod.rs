//! Pattern engine behind `match` arms and destructuring `let` bindings.
//!
//! A pattern is consulted in two phases. `matches` decides without touching
//! the caller's scope; `bind` is only called after a successful match and
//! writes the pattern's own captures into the scope it is handed.

use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::ast::{PatternNode, RestCapture};
use crate::interp::{EvaluationContext, MemorySpace, Stack};
use crate::op::{BoxedOp, OpBuilder};
use crate::typ::Type;
use crate::val::{DictValue, Value};


pub type BoxedPattern = Box<dyn PatternOp>;

pub trait PatternOp: Send + Sync + Debug {
    fn matches(&self, subject: &Value, stack: &mut Stack, context: &EvaluationContext) -> Result<bool>;

    /// Bind captures of a subject `matches` accepted.
    fn bind(&self, subject: &Value, scope: &mut MemorySpace);

    fn specialize(&self) -> BoxedPattern;

    fn refresh(&self) -> BoxedPattern;
}

pub(crate) fn build(pattern: &PatternNode, builder: &OpBuilder) -> BoxedPattern {
    match pattern {
        PatternNode::Capture(name) => Box::new(CapturePattern { name: name.clone() }),
        PatternNode::Value(value) => Box::new(ValuePattern { value: value.clone() }),
        PatternNode::DataType { declared_type, capture } => Box::new(DataTypePattern {
            declared_type: *declared_type,
            capture: capture.clone(),
        }),
        PatternNode::List { items, rest } => Box::new(ListPattern {
            items: items.iter().map(|p| build(p, builder)).collect(),
            rest: rest.clone(),
        }),
        PatternNode::Dict { entries, rest } => Box::new(DictPattern {
            entries: entries.iter().map(|(k, p)| (k.clone(), build(p, builder))).collect(),
            rest: rest.clone(),
        }),
        PatternNode::Guard { pattern, guard } => Box::new(GuardPattern {
            pattern: build(pattern, builder),
            guard: builder.build(guard),
        }),
    }
}

fn bind_capture(name: &Option<Arc<str>>, subject: &Value, scope: &mut MemorySpace) {
    if let Some(name) = name {
        scope.bind(name.clone(), subject.clone());
    }
}

/// `x` or `_`: matches anything.
#[derive(Debug, Clone)]
pub struct CapturePattern {
    name: Option<Arc<str>>,
}

impl PatternOp for CapturePattern {
    fn matches(&self, _: &Value, _: &mut Stack, _: &EvaluationContext) -> Result<bool> {
        Ok(true)
    }

    fn bind(&self, subject: &Value, scope: &mut MemorySpace) {
        bind_capture(&self.name, subject, scope);
    }

    fn specialize(&self) -> BoxedPattern {
        Box::new(self.clone())
    }

    fn refresh(&self) -> BoxedPattern {
        Box::new(self.clone())
    }
}

/// A literal; the subject has to equal it exactly, type included.
#[derive(Debug, Clone)]
pub struct ValuePattern {
    value: Value,
}

impl PatternOp for ValuePattern {
    fn matches(&self, subject: &Value, _: &mut Stack, _: &EvaluationContext) -> Result<bool> {
        Ok(*subject == self.value)
    }

    fn bind(&self, _: &Value, _: &mut MemorySpace) {}

    fn specialize(&self) -> BoxedPattern {
        Box::new(self.clone())
    }

    fn refresh(&self) -> BoxedPattern {
        Box::new(self.clone())
    }
}

/// `long x`, `any x`. `any` stands for every type but nil.
#[derive(Debug, Clone)]
pub struct DataTypePattern {
    declared_type: Type,
    capture: Option<Arc<str>>,
}

impl PatternOp for DataTypePattern {
    fn matches(&self, subject: &Value, _: &mut Stack, _: &EvaluationContext) -> Result<bool> {
        Ok(match self.declared_type {
            Type::Any => !subject.is_nil(),
            ty => subject.type_of() == ty,
        })
    }

    fn bind(&self, subject: &Value, scope: &mut MemorySpace) {
        bind_capture(&self.capture, subject, scope);
    }

    fn specialize(&self) -> BoxedPattern {
        Box::new(self.clone())
    }

    fn refresh(&self) -> BoxedPattern {
        Box::new(self.clone())
    }
}

/// `[a, b]` matches lists of exactly two items, `[a, b, ...rest]` lists of
/// at least two.
#[derive(Debug)]
pub struct ListPattern {
    items: Vec<BoxedPattern>,
    rest: RestCapture,
}

impl PatternOp for ListPattern {
    fn matches(&self, subject: &Value, stack: &mut Stack, context: &EvaluationContext) -> Result<bool> {
        let Value::List(list) = subject else {
            return Ok(false);
        };
        let fits = match self.rest {
            None => list.len() == self.items.len(),
            Some(_) => list.len() >= self.items.len(),
        };
        if !fits {
            return Ok(false);
        }
        for (pattern, item) in self.items.iter().zip(list.iter()) {
            if !pattern.matches(item, stack, context)? {
                return Ok(false);
            }
        }
        Ok(true)
    }

    fn bind(&self, subject: &Value, scope: &mut MemorySpace) {
        let Value::List(list) = subject else {
            return;
        };
        for (pattern, item) in self.items.iter().zip(list.iter()) {
            pattern.bind(item, scope);
        }
        if let Some(Some(name)) = &self.rest {
            let rest = list.slice(self.items.len(), list.len());
            scope.bind(name.clone(), Value::List(rest));
        }
    }

    fn specialize(&self) -> BoxedPattern {
        Box::new(ListPattern {
            items: self.items.iter().map(|p| p.specialize()).collect(),
            rest: self.rest.clone(),
        })
    }

    fn refresh(&self) -> BoxedPattern {
        Box::new(ListPattern {
            items: self.items.iter().map(|p| p.refresh()).collect(),
            rest: self.rest.clone(),
        })
    }
}

/// `{:a x}` requires exactly the listed keys, `{:a x, ...rest}` at least them.
#[derive(Debug)]
pub struct DictPattern {
    entries: Vec<(Arc<str>, BoxedPattern)>,
    rest: RestCapture,
}

impl PatternOp for DictPattern {
    fn matches(&self, subject: &Value, stack: &mut Stack, context: &EvaluationContext) -> Result<bool> {
        let Value::Dict(dict) = subject else {
            return Ok(false);
        };
        if self.rest.is_none() && dict.len() != self.entries.len() {
            return Ok(false);
        }
        for (key, pattern) in &self.entries {
            match dict.get(key) {
                Some(value) if pattern.matches(value, stack, context)? => {}
                _ => return Ok(false),
            }
        }
        Ok(true)
    }

    fn bind(&self, subject: &Value, scope: &mut MemorySpace) {
        let Value::Dict(dict) = subject else {
            return;
        };
        for (key, pattern) in &self.entries {
            if let Some(value) = dict.get(key) {
                pattern.bind(value, scope);
            }
        }
        if let Some(Some(name)) = &self.rest {
            let rest: DictValue = self.entries.iter().fold(dict.clone(), |acc, (key, _)| acc.delete(key));
            scope.bind(name.clone(), Value::Dict(rest));
        }
    }

    fn specialize(&self) -> BoxedPattern {
        Box::new(DictPattern {
            entries: self.entries.iter().map(|(k, p)| (k.clone(), p.specialize())).collect(),
            rest: self.rest.clone(),
        })
    }

    fn refresh(&self) -> BoxedPattern {
        Box::new(DictPattern {
            entries: self.entries.iter().map(|(k, p)| (k.clone(), p.refresh())).collect(),
            rest: self.rest.clone(),
        })
    }
}

/// `pattern, guard`: the guard sees the pattern's captures in a scratch
/// scope that is dropped again before `bind`.
#[derive(Debug)]
pub struct GuardPattern {
    pattern: BoxedPattern,
    guard: BoxedOp,
}

impl PatternOp for GuardPattern {
    fn matches(&self, subject: &Value, stack: &mut Stack, context: &EvaluationContext) -> Result<bool> {
        if !self.pattern.matches(subject, stack, context)? {
            return Ok(false);
        }
        let held = stack.with_scope(|stack| {
            self.pattern.bind(subject, stack.scope_mut());
            Ok(self.guard.eval(stack, context)?.truthy())
        })?;
        if !held {
            trace!(target: "twig::pattern", subject = %subject, "guard rejected subject");
        }
        Ok(held)
    }

    fn bind(&self, subject: &Value, scope: &mut MemorySpace) {
        self.pattern.bind(subject, scope);
    }

    fn specialize(&self) -> BoxedPattern {
        Box::new(GuardPattern {
            pattern: self.pattern.specialize(),
            guard: self.guard.specialize(),
        })
    }

    fn refresh(&self) -> BoxedPattern {
        Box::new(GuardPattern {
            pattern: self.pattern.refresh(),
            guard: self.guard.refresh(),
        })
    }
}
