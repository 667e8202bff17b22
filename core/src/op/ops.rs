use std::fmt::{self, Display};

use crate::typ::Type;
use crate::val::{Arith, Comparison};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum BinaryOperator {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
    Eq,
    Ne,
    Gt,
    Lt,
    Ge,
    Le,
}

impl BinaryOperator {
    pub(crate) fn arith(&self) -> Option<Arith> {
        match self {
            BinaryOperator::Add => Some(Arith::Add),
            BinaryOperator::Sub => Some(Arith::Sub),
            BinaryOperator::Mul => Some(Arith::Mul),
            BinaryOperator::Div => Some(Arith::Div),
            BinaryOperator::IntDiv => Some(Arith::IntDiv),
            BinaryOperator::Mod => Some(Arith::Mod),
            _ => None,
        }
    }

    pub(crate) fn comparison(&self) -> Option<Comparison> {
        match self {
            BinaryOperator::Gt => Some(Comparison::Gt),
            BinaryOperator::Lt => Some(Comparison::Lt),
            BinaryOperator::Ge => Some(Comparison::Ge),
            BinaryOperator::Le => Some(Comparison::Le),
            _ => None,
        }
    }

    /// Static result type for operands of the given static types.
    pub fn result_type(&self, left: Type, right: Type) -> Type {
        match self {
            BinaryOperator::Div if left == Type::Long && right == Type::Long => Type::Double,
            op if op.arith().is_some() => Type::arithmetic_result(left, right),
            _ => Type::Boolean,
        }
    }
}

impl Display for BinaryOperator {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            BinaryOperator::Add => write!(f, "+"),
            BinaryOperator::Sub => write!(f, "-"),
            BinaryOperator::Mul => write!(f, "*"),
            BinaryOperator::Div => write!(f, "/"),
            BinaryOperator::IntDiv => write!(f, "//"),
            BinaryOperator::Mod => write!(f, "%"),
            BinaryOperator::Eq => write!(f, "=="),
            BinaryOperator::Ne => write!(f, "!="),
            BinaryOperator::Gt => write!(f, ">"),
            BinaryOperator::Lt => write!(f, "<"),
            BinaryOperator::Ge => write!(f, ">="),
            BinaryOperator::Le => write!(f, "<="),
        }
    }
}

/// Implementation variant of a numeric operator. `Generic` dispatches on
/// runtime types; the others are monomorphic fast paths chosen from static
/// operand types.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum NumericPath {
    Generic,
    LongLong,
    DoubleDouble,
    DecimalDecimal,
    DateTimeDateTime,
}

impl NumericPath {
    /// Variant for statically typed operands of a comparison.
    pub fn for_comparison(left: Type, right: Type) -> NumericPath {
        match (left, right) {
            (Type::Long, Type::Long) => NumericPath::LongLong,
            (Type::Double, Type::Double) => NumericPath::DoubleDouble,
            (Type::Decimal, Type::Decimal) => NumericPath::DecimalDecimal,
            (Type::DateTime, Type::DateTime) => NumericPath::DateTimeDateTime,
            _ => NumericPath::Generic,
        }
    }

    /// Variant for statically typed operands of an arithmetic operator.
    /// Datetimes have no arithmetic, so that pairing stays generic.
    pub fn for_arithmetic(left: Type, right: Type) -> NumericPath {
        match NumericPath::for_comparison(left, right) {
            NumericPath::DateTimeDateTime => NumericPath::Generic,
            path => path,
        }
    }
}
