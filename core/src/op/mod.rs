//! Executable operation tree.
//!
//! Every syntax node lowers to exactly one [`ExpressionOp`]. A freshly built
//! tree is generic: binary operators dispatch on runtime types.
//! [`ExpressionOp::specialize`] swaps in monomorphic variants where static
//! operand types allow, and [`ExpressionOp::refresh`] yields an independent
//! copy with every per-instance cache dropped.

use std::fmt::Debug;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;

use crate::ast::{Argument, BindTarget, Node, NodeKind, PatternNode};
use crate::interp::{EvalConfig, EvaluationContext, Stack};
use crate::pattern::{self, PatternOp};
use crate::val::Value;

mod arith;
mod bind;
mod compare;
mod data;
mod func;
mod logic;
mod ops;

#[cfg(test)]
mod specialize_test;

pub use arith::{ArithmeticOp, NegateOp};
pub use bind::{LetBinding, LetOp, MatchOp};
pub use compare::{ComparisonOp, EqualityOp};
pub use data::{AccessOp, CastOp, ConcatOp, ConstantOp, DictOp, IsOp, ListOp, ReferenceOp};
pub use func::{CallArgument, CallOp, CurryOp, FunctionOp};
pub use logic::{AndOp, IfOp, NotOp, OrOp};
pub use ops::{BinaryOperator, NumericPath};

pub type BoxedOp = Box<dyn ExpressionOp>;

pub trait ExpressionOp: Send + Sync + Debug {
    /// Evaluate against `stack`. Scopes pushed here are popped again on
    /// every exit path.
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value>;

    /// True when this op and all its operands fold without side effects.
    fn is_constant(&self) -> bool;

    /// A monomorphic replacement when static operand types allow one, a
    /// generic copy otherwise. Never fails.
    fn specialize(&self) -> BoxedOp;

    /// An independent copy of this subtree without cached state.
    fn refresh(&self) -> BoxedOp;

    fn node(&self) -> &Arc<Node>;

    /// Implementation variant of a numeric operator, `None` for other ops.
    fn numeric_path(&self) -> Option<NumericPath> {
        None
    }
}

/// Attach the node's position and the current trace to an error raised by it.
#[inline]
pub(crate) fn located<T>(result: Result<T>, stack: &Stack, node: &Node) -> Result<T> {
    result.map_err(|err| stack.locate(err, node.source.as_ref()))
}

/// Lowers syntax nodes into generic operations, folding constant subtrees
/// when asked to.
#[derive(Debug, Clone, Copy, Default)]
pub struct OpBuilder {
    fold_constants: bool,
}

impl OpBuilder {
    pub fn new(config: &EvalConfig) -> Self {
        Self {
            fold_constants: config.fold_constants,
        }
    }

    pub fn build(&self, node: &Arc<Node>) -> BoxedOp {
        let op = self.build_node(node);
        if self.fold_constants && op.is_constant() && !matches!(node.kind, NodeKind::Constant(_)) {
            self.fold(node, op)
        } else {
            op
        }
    }

    fn fold(&self, node: &Arc<Node>, op: BoxedOp) -> BoxedOp {
        let mut stack = Stack::new();
        let context = EvaluationContext::default();
        match op.eval(&mut stack, &context) {
            Ok(value) => Box::new(ConstantOp::new(node.clone(), value)),
            Err(err) => {
                // keep the op so the error surfaces at runtime with a trace
                debug!(target: "twig::op", error = %err, "constant folding failed");
                op
            }
        }
    }

    fn build_node(&self, node: &Arc<Node>) -> BoxedOp {
        let n = node.clone();
        match &node.kind {
            NodeKind::Constant(value) => Box::new(ConstantOp::new(n, value.clone())),
            NodeKind::Reference(name) => Box::new(ReferenceOp::new(n, name.clone())),
            NodeKind::Binary { op, left, right } => {
                let (l, r) = (self.build(left), self.build(right));
                if let Some(arith) = op.arith() {
                    Box::new(ArithmeticOp::new(n, arith, l, r))
                } else if let Some(cmp) = op.comparison() {
                    Box::new(ComparisonOp::new(n, cmp, l, r))
                } else {
                    Box::new(EqualityOp::new(n, *op == BinaryOperator::Ne, l, r))
                }
            }
            NodeKind::StringConcat { left, right } => {
                Box::new(ConcatOp::new(n, self.build(left), self.build(right)))
            }
            NodeKind::And { left, right } => Box::new(AndOp::new(n, self.build(left), self.build(right))),
            NodeKind::Or { left, right } => Box::new(OrOp::new(n, self.build(left), self.build(right))),
            NodeKind::Not(operand) => Box::new(NotOp::new(n, self.build(operand))),
            NodeKind::Negate(operand) => Box::new(NegateOp::new(n, self.build(operand))),
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            } => Box::new(IfOp::new(
                n,
                self.build(condition),
                self.build(then_branch),
                self.build(else_branch),
            )),
            NodeKind::Let { bindings, body } => {
                let bindings = bindings
                    .iter()
                    .map(|binding| {
                        let value = self.build(&binding.value);
                        match &binding.target {
                            BindTarget::Name(name) => LetBinding::Name(name.clone(), value),
                            BindTarget::Pattern(p) => LetBinding::Pattern(self.build_pattern(p), value),
                        }
                    })
                    .collect();
                Box::new(LetOp::new(n, bindings, self.build(body)))
            }
            NodeKind::Match { subject, arms } => {
                let arms = arms
                    .iter()
                    .map(|arm| (self.build_pattern(&arm.pattern), self.build(&arm.body)))
                    .collect();
                Box::new(MatchOp::new(n, self.build(subject), arms))
            }
            NodeKind::Call { callee, args } => {
                let args = args
                    .iter()
                    .map(|arg| match arg {
                        Argument::Positional(expr) => CallArgument::Positional(self.build(expr)),
                        Argument::Named(name, expr) => CallArgument::Named(name.clone(), self.build(expr)),
                    })
                    .collect();
                Box::new(CallOp::new(n, self.build(callee), args))
            }
            NodeKind::Curry { callee, args } => {
                let args = args
                    .iter()
                    .map(|(name, expr)| (name.clone(), self.build(expr)))
                    .collect();
                Box::new(CurryOp::new(n, self.build(callee), args))
            }
            NodeKind::Function(def) => Box::new(FunctionOp::new(n, def.clone(), self.build(&def.body))),
            NodeKind::List(items) => Box::new(ListOp::new(n, items.iter().map(|i| self.build(i)).collect())),
            NodeKind::Dict(entries) => Box::new(DictOp::new(
                n,
                entries.iter().map(|(k, v)| (self.build(k), self.build(v))).collect(),
            )),
            NodeKind::Access { container, key } => {
                Box::new(AccessOp::new(n, self.build(container), self.build(key)))
            }
            NodeKind::Cast { expr, target } => Box::new(CastOp::new(n, self.build(expr), *target)),
            NodeKind::Is { expr, target } => Box::new(IsOp::new(n, self.build(expr), *target)),
        }
    }

    pub fn build_pattern(&self, pattern: &PatternNode) -> Box<dyn PatternOp> {
        pattern::build(pattern, self)
    }
}

/// Generic operation tree for `node`, without folding.
pub fn build(node: &Arc<Node>) -> BoxedOp {
    OpBuilder::default().build(node)
}

/// Operation tree for `node` as configured: constants folded and operators
/// specialized unless switched off.
pub fn compile(node: &Arc<Node>, config: &EvalConfig) -> BoxedOp {
    let op = OpBuilder::new(config).build(node);
    if config.specialize { op.specialize() } else { op }
}

/// Evaluate a compiled tree on a fresh stack.
pub fn evaluate(op: &dyn ExpressionOp, context: &EvaluationContext) -> Result<Value> {
    let mut stack = Stack::new();
    op.eval(&mut stack, context)
}
