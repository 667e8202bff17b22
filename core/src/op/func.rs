use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::ast::{FunctionDef, Node};
use crate::call::callable;
use crate::interp::{EvaluationContext, Stack};
use crate::val::{FunctionSignature, FunctionValue, Parameter, Value};

use super::{BoxedOp, ExpressionOp, located};

/// Function literal. Each evaluation closes over a snapshot of the locals
/// visible at that point; the body tree is shared by all closures made here.
#[derive(Debug)]
pub struct FunctionOp {
    node: Arc<Node>,
    def: Arc<FunctionDef>,
    signature: FunctionSignature,
    body: Arc<dyn ExpressionOp>,
}

impl FunctionOp {
    pub fn new(node: Arc<Node>, def: Arc<FunctionDef>, body: BoxedOp) -> Self {
        let params = def
            .params
            .iter()
            .map(|p| Parameter {
                name: p.name.clone(),
                declared_type: p.declared_type,
                default: p.default.clone(),
            })
            .collect();
        let signature = FunctionSignature::new(params, def.return_type);
        Self {
            node,
            def,
            signature,
            body: Arc::from(body),
        }
    }

    fn with_body(&self, body: BoxedOp) -> BoxedOp {
        Box::new(FunctionOp {
            node: self.node.clone(),
            def: self.def.clone(),
            signature: self.signature.clone(),
            body: Arc::from(body),
        })
    }
}

impl ExpressionOp for FunctionOp {
    fn eval(&self, stack: &mut Stack, _: &EvaluationContext) -> Result<Value> {
        let function = FunctionValue::user(
            self.def.name.clone(),
            self.signature.clone(),
            self.body.clone(),
            stack.capture(),
            self.node.source.clone(),
        );
        Ok(Value::Function(Arc::new(function)))
    }

    fn is_constant(&self) -> bool {
        false
    }

    fn specialize(&self) -> BoxedOp {
        self.with_body(self.body.specialize())
    }

    fn refresh(&self) -> BoxedOp {
        self.with_body(self.body.refresh())
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

#[derive(Debug)]
pub enum CallArgument {
    Positional(BoxedOp),
    Named(Arc<str>, BoxedOp),
}

impl CallArgument {
    fn map(&self, f: impl Fn(&dyn ExpressionOp) -> BoxedOp) -> Self {
        match self {
            CallArgument::Positional(op) => CallArgument::Positional(f(op.as_ref())),
            CallArgument::Named(name, op) => CallArgument::Named(name.clone(), f(op.as_ref())),
        }
    }
}

/// `f(a, b, name: c)`. Callee first, then arguments left to right.
#[derive(Debug)]
pub struct CallOp {
    node: Arc<Node>,
    callee: BoxedOp,
    args: Vec<CallArgument>,
}

impl CallOp {
    pub fn new(node: Arc<Node>, callee: BoxedOp, args: Vec<CallArgument>) -> Self {
        Self { node, callee, args }
    }
}

impl ExpressionOp for CallOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let callee = self.callee.eval(stack, context)?;
        let function = located(callable(&callee), stack, &self.node)?.clone();
        let mut positional = Vec::with_capacity(self.args.len());
        let mut named = Vec::new();
        for arg in &self.args {
            match arg {
                CallArgument::Positional(op) => positional.push(op.eval(stack, context)?),
                CallArgument::Named(name, op) => named.push((name.clone(), op.eval(stack, context)?)),
            }
        }
        let args = if named.is_empty() && positional.len() == function.arity() {
            positional
        } else {
            located(function.bind_arguments(positional, named), stack, &self.node)?
        };
        stack.set_position(self.node.source.as_ref());
        let result = function.invoke(stack, context, args);
        located(result, stack, &self.node)
    }

    fn is_constant(&self) -> bool {
        false
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(CallOp::new(
            self.node.clone(),
            self.callee.specialize(),
            self.args.iter().map(|a| a.map(|op| op.specialize())).collect(),
        ))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(CallOp::new(
            self.node.clone(),
            self.callee.refresh(),
            self.args.iter().map(|a| a.map(|op| op.refresh())).collect(),
        ))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// `f(name: value)` partial application by parameter name.
#[derive(Debug)]
pub struct CurryOp {
    node: Arc<Node>,
    callee: BoxedOp,
    args: Vec<(Arc<str>, BoxedOp)>,
}

impl CurryOp {
    pub fn new(node: Arc<Node>, callee: BoxedOp, args: Vec<(Arc<str>, BoxedOp)>) -> Self {
        Self { node, callee, args }
    }
}

impl ExpressionOp for CurryOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let callee = self.callee.eval(stack, context)?;
        let function = located(callable(&callee), stack, &self.node)?.clone();
        let mut bound = Vec::with_capacity(self.args.len());
        for (name, op) in &self.args {
            bound.push((name.clone(), op.eval(stack, context)?));
        }
        trace!(target: "twig::call", bound = bound.len(), "curry");
        let curried = located(function.curry(bound), stack, &self.node)?;
        Ok(Value::Function(Arc::new(curried)))
    }

    fn is_constant(&self) -> bool {
        false
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(CurryOp::new(
            self.node.clone(),
            self.callee.specialize(),
            self.args.iter().map(|(n, op)| (n.clone(), op.specialize())).collect(),
        ))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(CurryOp::new(
            self.node.clone(),
            self.callee.refresh(),
            self.args.iter().map(|(n, op)| (n.clone(), op.refresh())).collect(),
        ))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}
