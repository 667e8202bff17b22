use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::ast::Node;
use crate::error::ErrorKind;
use crate::interp::{EvaluationContext, Stack};
use crate::pattern::BoxedPattern;
use crate::val::Value;

use super::{BoxedOp, ExpressionOp};

#[derive(Debug)]
pub enum LetBinding {
    Name(Arc<str>, BoxedOp),
    Pattern(BoxedPattern, BoxedOp),
}

impl LetBinding {
    fn map(&self, f: impl Fn(&dyn ExpressionOp) -> BoxedOp, p: impl Fn(&BoxedPattern) -> BoxedPattern) -> Self {
        match self {
            LetBinding::Name(name, value) => LetBinding::Name(name.clone(), f(value.as_ref())),
            LetBinding::Pattern(pattern, value) => LetBinding::Pattern(p(pattern), f(value.as_ref())),
        }
    }
}

/// `let { a: 1; [x, y]: pair; } body`. Bindings go into one fresh scope in
/// order, so later ones see earlier ones.
#[derive(Debug)]
pub struct LetOp {
    node: Arc<Node>,
    bindings: Vec<LetBinding>,
    body: BoxedOp,
}

impl LetOp {
    pub fn new(node: Arc<Node>, bindings: Vec<LetBinding>, body: BoxedOp) -> Self {
        Self { node, bindings, body }
    }
}

impl ExpressionOp for LetOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        stack.with_scope(|stack| {
            for binding in &self.bindings {
                match binding {
                    LetBinding::Name(name, value) => {
                        let v = value.eval(stack, context)?;
                        stack.bind(name.clone(), v);
                    }
                    LetBinding::Pattern(pattern, value) => {
                        let v = value.eval(stack, context)?;
                        if !pattern.matches(&v, stack, context)? {
                            return Err(stack.error(
                                ErrorKind::PatternMismatch,
                                format!("value {} does not match the binding pattern", v),
                                value.node().source.as_ref().or(self.node.source.as_ref()),
                            ));
                        }
                        pattern.bind(&v, stack.scope_mut());
                    }
                }
            }
            self.body.eval(stack, context)
        })
    }

    fn is_constant(&self) -> bool {
        false
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(LetOp::new(
            self.node.clone(),
            self.bindings.iter().map(|b| b.map(|op| op.specialize(), |p| p.specialize())).collect(),
            self.body.specialize(),
        ))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(LetOp::new(
            self.node.clone(),
            self.bindings.iter().map(|b| b.map(|op| op.refresh(), |p| p.refresh())).collect(),
            self.body.refresh(),
        ))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// `match subject { pattern -> body, ... }`. Arms are tried in order, each
/// in its own scope; when none matches the result is nil.
#[derive(Debug)]
pub struct MatchOp {
    node: Arc<Node>,
    subject: BoxedOp,
    arms: Vec<(BoxedPattern, BoxedOp)>,
}

impl MatchOp {
    pub fn new(node: Arc<Node>, subject: BoxedOp, arms: Vec<(BoxedPattern, BoxedOp)>) -> Self {
        Self { node, subject, arms }
    }
}

impl ExpressionOp for MatchOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let subject = self.subject.eval(stack, context)?;
        for (pattern, body) in &self.arms {
            let outcome = stack.with_scope(|stack| {
                if !pattern.matches(&subject, stack, context)? {
                    return Ok(None);
                }
                pattern.bind(&subject, stack.scope_mut());
                body.eval(stack, context).map(Some)
            })?;
            if let Some(value) = outcome {
                return Ok(value);
            }
        }
        trace!(target: "twig::pattern", subject = %subject, "no match arm applies");
        Ok(Value::Nil)
    }

    fn is_constant(&self) -> bool {
        false
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(MatchOp::new(
            self.node.clone(),
            self.subject.specialize(),
            self.arms.iter().map(|(p, b)| (p.specialize(), b.specialize())).collect(),
        ))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(MatchOp::new(
            self.node.clone(),
            self.subject.refresh(),
            self.arms.iter().map(|(p, b)| (p.refresh(), b.refresh())).collect(),
        ))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}
