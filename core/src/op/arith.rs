use std::sync::Arc;

use anyhow::Result;
use tracing::trace;

use crate::ast::Node;
use crate::interp::{EvaluationContext, Stack};
use crate::val::{Arith, Value, arithmetic, decimal_arithmetic, double_arithmetic, long_arithmetic, negate};

use super::{BoxedOp, ExpressionOp, NumericPath, located};

/// `+ - * / // %`.
///
/// Specialized paths only take over when both runtime values have the
/// expected type; anything else, nil included, goes through the generic
/// kernel so type errors and nil propagation stay identical.
#[derive(Debug)]
pub struct ArithmeticOp {
    node: Arc<Node>,
    op: Arith,
    path: NumericPath,
    left: BoxedOp,
    right: BoxedOp,
}

impl ArithmeticOp {
    pub fn new(node: Arc<Node>, op: Arith, left: BoxedOp, right: BoxedOp) -> Self {
        Self {
            node,
            op,
            path: NumericPath::Generic,
            left,
            right,
        }
    }

    #[inline]
    fn apply(&self, l: &Value, r: &Value) -> Result<Value> {
        match (self.path, l, r) {
            (NumericPath::LongLong, Value::Long(a), Value::Long(b)) => long_arithmetic(self.op, *a, *b),
            (NumericPath::DoubleDouble, Value::Double(a), Value::Double(b)) => {
                Ok(double_arithmetic(self.op, *a, *b))
            }
            (NumericPath::DecimalDecimal, Value::Decimal(a), Value::Decimal(b)) => {
                decimal_arithmetic(self.op, *a, *b)
            }
            _ => arithmetic(self.op, l, r),
        }
    }
}

impl ExpressionOp for ArithmeticOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let l = self.left.eval(stack, context)?;
        let r = self.right.eval(stack, context)?;
        located(self.apply(&l, &r), stack, &self.node)
    }

    fn is_constant(&self) -> bool {
        self.left.is_constant() && self.right.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        let path = NumericPath::for_arithmetic(self.left.node().value_type, self.right.node().value_type);
        trace!(target: "twig::op", op = %self.op, ?path, "specialize arithmetic");
        Box::new(ArithmeticOp {
            node: self.node.clone(),
            op: self.op,
            path,
            left: self.left.specialize(),
            right: self.right.specialize(),
        })
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(ArithmeticOp {
            node: self.node.clone(),
            op: self.op,
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

/// Unary minus.
#[derive(Debug)]
pub struct NegateOp {
    node: Arc<Node>,
    operand: BoxedOp,
}

impl NegateOp {
    pub fn new(node: Arc<Node>, operand: BoxedOp) -> Self {
        Self { node, operand }
    }
}

impl ExpressionOp for NegateOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let v = self.operand.eval(stack, context)?;
        located(negate(&v), stack, &self.node)
    }

    fn is_constant(&self) -> bool {
        self.operand.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(NegateOp::new(self.node.clone(), self.operand.specialize()))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(NegateOp::new(self.node.clone(), self.operand.refresh()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}
