use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::ast::Node;
use crate::interp::{EvaluationContext, Stack};
use crate::val::{Comparison, Value, compare};

use super::{BoxedOp, ExpressionOp, NumericPath, located};

/// `< <= > >=` over numbers and datetimes.
#[derive(Debug)]
pub struct ComparisonOp {
    node: Arc<Node>,
    cmp: Comparison,
    path: NumericPath,
    left: BoxedOp,
    right: BoxedOp,
}

impl ComparisonOp {
    pub fn new(node: Arc<Node>, cmp: Comparison, left: BoxedOp, right: BoxedOp) -> Self {
        Self {
            node,
            cmp,
            path: NumericPath::Generic,
            left,
            right,
        }
    }

    #[inline]
    fn apply(&self, l: &Value, r: &Value) -> Result<bool> {
        // a fast path only fires on the exact pair it was built for
        match (self.path, l, r) {
            (NumericPath::LongLong, Value::Long(a), Value::Long(b)) => Ok(self.cmp.holds(Some(a.cmp(b)))),
            (NumericPath::DoubleDouble, Value::Double(a), Value::Double(b)) => {
                Ok(self.cmp.holds(a.partial_cmp(b)))
            }
            (NumericPath::DecimalDecimal, Value::Decimal(a), Value::Decimal(b)) => {
                Ok(self.cmp.holds(Some(a.cmp(b))))
            }
            (NumericPath::DateTimeDateTime, Value::DateTime(a), Value::DateTime(b)) => {
                Ok(self.cmp.holds(Some(a.cmp(b))))
            }
            _ => compare(self.cmp, l, r),
        }
    }
}

impl ExpressionOp for ComparisonOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let l = self.left.eval(stack, context)?;
        let r = self.right.eval(stack, context)?;
        located(self.apply(&l, &r), stack, &self.node).map(Value::Boolean)
    }

    fn is_constant(&self) -> bool {
        self.left.is_constant() && self.right.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        let path = NumericPath::for_comparison(self.left.node().value_type, self.right.node().value_type);
        trace!(target: "twig::op", cmp = %self.cmp, ?path, "specialize comparison");
        Box::new(ComparisonOp {
            node: self.node.clone(),
            cmp: self.cmp,
            path,
            left: self.left.specialize(),
            right: self.right.specialize(),
        })
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(ComparisonOp {
            node: self.node.clone(),
            cmp: self.cmp,
            path: self.path,
            left: self.left.refresh(),
            right: self.right.refresh(),
        })
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }

    fn numeric_path(&self) -> Option<NumericPath> {
        Some(self.path)
    }
}

/// `==` and `!=`, with numeric promotion across number types.
#[derive(Debug)]
pub struct EqualityOp {
    node: Arc<Node>,
    negated: bool,
    left: BoxedOp,
    right: BoxedOp,
}

impl EqualityOp {
    pub fn new(node: Arc<Node>, negated: bool, left: BoxedOp, right: BoxedOp) -> Self {
        Self {
            node,
            negated,
            left,
            right,
        }
    }
}

impl ExpressionOp for EqualityOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let l = self.left.eval(stack, context)?;
        let r = self.right.eval(stack, context)?;
        Ok(Value::Boolean(l.value_equals(&r) != self.negated))
    }

    fn is_constant(&self) -> bool {
        self.left.is_constant() && self.right.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(EqualityOp::new(
            self.node.clone(),
            self.negated,
            self.left.specialize(),
            self.right.specialize(),
        ))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(EqualityOp::new(
            self.node.clone(),
            self.negated,
            self.left.refresh(),
            self.right.refresh(),
        ))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}
