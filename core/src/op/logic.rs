use std::sync::Arc;

use anyhow::Result;

use crate::ast::Node;
use crate::interp::{EvaluationContext, Stack};
use crate::val::Value;

use super::{BoxedOp, ExpressionOp};

#[derive(Debug)]
pub struct AndOp {
    node: Arc<Node>,
    left: BoxedOp,
    right: BoxedOp,
}

impl AndOp {
    pub fn new(node: Arc<Node>, left: BoxedOp, right: BoxedOp) -> Self {
        Self { node, left, right }
    }
}

impl ExpressionOp for AndOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        if !self.left.eval(stack, context)?.truthy() {
            return Ok(Value::FALSE);
        }
        Ok(Value::Boolean(self.right.eval(stack, context)?.truthy()))
    }

    fn is_constant(&self) -> bool {
        self.left.is_constant() && self.right.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(AndOp::new(self.node.clone(), self.left.specialize(), self.right.specialize()))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(AndOp::new(self.node.clone(), self.left.refresh(), self.right.refresh()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

#[derive(Debug)]
pub struct OrOp {
    node: Arc<Node>,
    left: BoxedOp,
    right: BoxedOp,
}

impl OrOp {
    pub fn new(node: Arc<Node>, left: BoxedOp, right: BoxedOp) -> Self {
        Self { node, left, right }
    }
}

impl ExpressionOp for OrOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        if self.left.eval(stack, context)?.truthy() {
            return Ok(Value::TRUE);
        }
        Ok(Value::Boolean(self.right.eval(stack, context)?.truthy()))
    }

    fn is_constant(&self) -> bool {
        self.left.is_constant() && self.right.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(OrOp::new(self.node.clone(), self.left.specialize(), self.right.specialize()))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(OrOp::new(self.node.clone(), self.left.refresh(), self.right.refresh()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

#[derive(Debug)]
pub struct NotOp {
    node: Arc<Node>,
    operand: BoxedOp,
}

impl NotOp {
    pub fn new(node: Arc<Node>, operand: BoxedOp) -> Self {
        Self { node, operand }
    }
}

impl ExpressionOp for NotOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        Ok(Value::Boolean(!self.operand.eval(stack, context)?.truthy()))
    }

    fn is_constant(&self) -> bool {
        self.operand.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(NotOp::new(self.node.clone(), self.operand.specialize()))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(NotOp::new(self.node.clone(), self.operand.refresh()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// `if c then a else b`. Only the taken branch is evaluated.
#[derive(Debug)]
pub struct IfOp {
    node: Arc<Node>,
    condition: BoxedOp,
    then_branch: BoxedOp,
    else_branch: BoxedOp,
}

impl IfOp {
    pub fn new(node: Arc<Node>, condition: BoxedOp, then_branch: BoxedOp, else_branch: BoxedOp) -> Self {
        Self {
            node,
            condition,
            then_branch,
            else_branch,
        }
    }
}

impl ExpressionOp for IfOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        if self.condition.eval(stack, context)?.truthy() {
            self.then_branch.eval(stack, context)
        } else {
            self.else_branch.eval(stack, context)
        }
    }

    fn is_constant(&self) -> bool {
        self.condition.is_constant() && self.then_branch.is_constant() && self.else_branch.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(IfOp::new(
            self.node.clone(),
            self.condition.specialize(),
            self.then_branch.specialize(),
            self.else_branch.specialize(),
        ))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(IfOp::new(
            self.node.clone(),
            self.condition.refresh(),
            self.then_branch.refresh(),
            self.else_branch.refresh(),
        ))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}
