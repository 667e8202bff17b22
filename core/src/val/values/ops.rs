use std::cmp::Ordering;
use std::fmt;

use anyhow::Result;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{ErrorKind, lang_error};

use super::{Value, decimal_from_f64};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Arith {
    Add,
    Sub,
    Mul,
    Div,
    IntDiv,
    Mod,
}

impl Arith {
    fn verb(&self) -> &'static str {
        match self {
            Arith::Add => "add",
            Arith::Sub => "subtract",
            Arith::Mul => "multiply",
            Arith::Div | Arith::IntDiv => "divide",
            Arith::Mod => "take the remainder of",
        }
    }
}

impl fmt::Display for Arith {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Arith::Add => "+",
            Arith::Sub => "-",
            Arith::Mul => "*",
            Arith::Div => "/",
            Arith::IntDiv => "//",
            Arith::Mod => "%",
        })
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Comparison {
    Lt,
    Le,
    Gt,
    Ge,
}

impl Comparison {
    /// Outcome when at least one side is nil: only `nil >= nil` and
    /// `nil <= nil` hold.
    #[inline]
    pub fn nil_result(&self, left_nil: bool, right_nil: bool) -> bool {
        left_nil && right_nil && matches!(self, Comparison::Ge | Comparison::Le)
    }

    /// Unordered pairs (NaN) never satisfy a comparison.
    #[inline]
    pub fn holds(&self, ord: Option<Ordering>) -> bool {
        match (self, ord) {
            (_, None) => false,
            (Comparison::Lt, Some(o)) => o == Ordering::Less,
            (Comparison::Le, Some(o)) => o != Ordering::Greater,
            (Comparison::Gt, Some(o)) => o == Ordering::Greater,
            (Comparison::Ge, Some(o)) => o != Ordering::Less,
        }
    }
}

impl fmt::Display for Comparison {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(match self {
            Comparison::Lt => "<",
            Comparison::Le => "<=",
            Comparison::Gt => ">",
            Comparison::Ge => ">=",
        })
    }
}

/// Both operands nil-or-numeric, or both nil-or-datetime.
pub fn ensure_comparable_types(l: &Value, r: &Value) -> Result<()> {
    let numeric = (l.is_nil() || l.is_numeric()) && (r.is_nil() || r.is_numeric());
    let temporal = (l.is_nil() || l.is_datetime()) && (r.is_nil() || r.is_datetime());
    if numeric || temporal {
        Ok(())
    } else {
        Err(lang_error(
            ErrorKind::CastError,
            format!("cannot compare types {} and {}", l.type_name(), r.type_name()),
        ))
    }
}

pub fn ensure_arithmetic_types(op: Arith, l: &Value, r: &Value) -> Result<()> {
    if (l.is_nil() || l.is_numeric()) && (r.is_nil() || r.is_numeric()) {
        Ok(())
    } else {
        Err(lang_error(
            ErrorKind::CastError,
            format!("cannot {} types {} and {}", op.verb(), l.type_name(), r.type_name()),
        ))
    }
}

fn compare_double_decimal(d: f64, dec: &Decimal) -> Option<Ordering> {
    if d.is_nan() {
        return None;
    }
    if d.is_infinite() {
        // the sign decides, infinity has no decimal form
        return Some(if d > 0.0 { Ordering::Greater } else { Ordering::Less });
    }
    match decimal_from_f64(d) {
        Some(converted) => Some(converted.cmp(dec)),
        None => dec.to_f64().and_then(|x| d.partial_cmp(&x)),
    }
}

/// Ordering between two non-nil numeric or datetime values, promoting
/// across Long, Double and Decimal. `None` when the pair is unordered.
pub fn compare_numeric(l: &Value, r: &Value) -> Option<Ordering> {
    match (l, r) {
        (Value::Long(a), Value::Long(b)) => Some(a.cmp(b)),
        (Value::Double(a), Value::Double(b)) => a.partial_cmp(b),
        (Value::Decimal(a), Value::Decimal(b)) => Some(a.cmp(b)),
        (Value::Long(a), Value::Double(b)) => (*a as f64).partial_cmp(b),
        (Value::Double(a), Value::Long(b)) => a.partial_cmp(&(*b as f64)),
        (Value::Long(a), Value::Decimal(b)) => Some(Decimal::from(*a).cmp(b)),
        (Value::Decimal(a), Value::Long(b)) => Some(a.cmp(&Decimal::from(*b))),
        (Value::Double(a), Value::Decimal(b)) => compare_double_decimal(*a, b),
        (Value::Decimal(a), Value::Double(b)) => compare_double_decimal(*b, a).map(Ordering::reverse),
        (Value::DateTime(a), Value::DateTime(b)) => Some(a.cmp(b)),
        _ => None,
    }
}

/// Generic comparison with the full type check and nil rules.
pub fn compare(cmp: Comparison, l: &Value, r: &Value) -> Result<bool> {
    ensure_comparable_types(l, r)?;
    if l.is_nil() || r.is_nil() {
        return Ok(cmp.nil_result(l.is_nil(), r.is_nil()));
    }
    Ok(cmp.holds(compare_numeric(l, r)))
}

pub fn long_arithmetic(op: Arith, a: i64, b: i64) -> Result<Value> {
    let v = match op {
        Arith::Add => Value::Long(a.wrapping_add(b)),
        Arith::Sub => Value::Long(a.wrapping_sub(b)),
        Arith::Mul => Value::Long(a.wrapping_mul(b)),
        Arith::Div => Value::Double(a as f64 / b as f64),
        Arith::IntDiv => {
            if b == 0 {
                return Err(lang_error(ErrorKind::DivisionByZero, "division by zero"));
            }
            let q = a.wrapping_div(b);
            if a.wrapping_rem(b) != 0 && ((a < 0) != (b < 0)) {
                Value::Long(q - 1)
            } else {
                Value::Long(q)
            }
        }
        Arith::Mod => {
            if b == 0 {
                return Err(lang_error(ErrorKind::DivisionByZero, "division by zero"));
            }
            Value::Long(a.wrapping_rem(b))
        }
    };
    Ok(v)
}

pub fn double_arithmetic(op: Arith, a: f64, b: f64) -> Value {
    Value::Double(match op {
        Arith::Add => a + b,
        Arith::Sub => a - b,
        Arith::Mul => a * b,
        Arith::Div => a / b,
        Arith::IntDiv => (a / b).floor(),
        Arith::Mod => a % b,
    })
}

pub fn decimal_arithmetic(op: Arith, a: Decimal, b: Decimal) -> Result<Value> {
    if matches!(op, Arith::Div | Arith::IntDiv | Arith::Mod) && b.is_zero() {
        return Err(lang_error(ErrorKind::DivisionByZero, "division by zero"));
    }
    let result = match op {
        Arith::Add => a.checked_add(b),
        Arith::Sub => a.checked_sub(b),
        Arith::Mul => a.checked_mul(b),
        Arith::Div => a.checked_div(b),
        Arith::IntDiv => a.checked_div(b).map(|q| q.floor()),
        Arith::Mod => a.checked_rem(b),
    };
    result
        .map(Value::Decimal)
        .ok_or_else(|| lang_error(ErrorKind::IllegalArgument, format!("decimal overflow in {a} {op} {b}")))
}

fn to_decimal_operand(v: &Value) -> Result<Decimal> {
    match v {
        Value::Long(l) => Ok(Decimal::from(*l)),
        Value::Decimal(d) => Ok(*d),
        Value::Double(d) => decimal_from_f64(*d).ok_or_else(|| {
            lang_error(
                ErrorKind::CastError,
                format!("cannot convert {} to decimal", super::format_double(*d)),
            )
        }),
        _ => Err(lang_error(ErrorKind::CastError, format!("cannot convert {} to decimal", v.type_name()))),
    }
}

/// Generic arithmetic: type check, nil propagation, numeric promotion.
pub fn arithmetic(op: Arith, l: &Value, r: &Value) -> Result<Value> {
    ensure_arithmetic_types(op, l, r)?;
    match (l, r) {
        (Value::Nil, _) | (_, Value::Nil) => Ok(Value::Nil),
        (Value::Long(a), Value::Long(b)) => long_arithmetic(op, *a, *b),
        (Value::Double(a), Value::Double(b)) => Ok(double_arithmetic(op, *a, *b)),
        (Value::Long(a), Value::Double(b)) => Ok(double_arithmetic(op, *a as f64, *b)),
        (Value::Double(a), Value::Long(b)) => Ok(double_arithmetic(op, *a, *b as f64)),
        _ => decimal_arithmetic(op, to_decimal_operand(l)?, to_decimal_operand(r)?),
    }
}

pub fn negate(v: &Value) -> Result<Value> {
    match v {
        Value::Nil => Ok(Value::Nil),
        Value::Long(l) => Ok(Value::Long(l.wrapping_neg())),
        Value::Double(d) => Ok(Value::Double(-d)),
        Value::Decimal(d) => Ok(Value::Decimal(-*d)),
        _ => Err(lang_error(ErrorKind::CastError, format!("cannot negate type {}", v.type_name()))),
    }
}

impl Value {
    /// Equality used by the `==` operator: numbers compare by value across
    /// Long, Double and Decimal, recursively inside collections.
    pub fn value_equals(&self, other: &Value) -> bool {
        match (self, other) {
            (a, b) if a.is_numeric() && b.is_numeric() => compare_numeric(a, b) == Some(Ordering::Equal),
            (Value::List(a), Value::List(b)) => {
                a.len() == b.len() && a.iter().zip(b.iter()).all(|(x, y)| x.value_equals(y))
            }
            (Value::Dict(a), Value::Dict(b)) => {
                a.len() == b.len()
                    && a.iter().all(|(k, v)| b.get(k).is_some_and(|w| v.value_equals(w)))
            }
            _ => self == other,
        }
    }
}
