use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::Result;
use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use crate::error::{ErrorKind, lang_error};
use crate::typ::Type;
use crate::val::function::FunctionValue;

mod cast;
mod convert;
mod dict;
mod list;
mod ops;

pub use cast::{decimal_from_f64, format_double};
pub use dict::DictValue;
pub use list::ListValue;
pub use ops::{
    Arith, Comparison, arithmetic, compare, compare_numeric, decimal_arithmetic, double_arithmetic, ensure_arithmetic_types,
    ensure_comparable_types, long_arithmetic, negate,
};

/// An immutable language value.
///
/// Scalars are stored inline; strings, binaries and collections share their
/// payload, so cloning a `Value` never copies data.
#[derive(Clone, Debug, Default)]
pub enum Value {
    #[default]
    Nil,
    Boolean(bool),
    Long(i64),
    Double(f64),
    Decimal(Decimal),
    DateTime(DateTime<FixedOffset>),
    String(Arc<str>),
    Binary(Arc<[u8]>),
    List(ListValue),
    Dict(DictValue),
    Function(Arc<FunctionValue>),
}

impl Value {
    pub const NIL: Value = Value::Nil;
    pub const TRUE: Value = Value::Boolean(true);
    pub const FALSE: Value = Value::Boolean(false);

    pub fn type_of(&self) -> Type {
        match self {
            Value::Nil => Type::Nil,
            Value::Boolean(_) => Type::Boolean,
            Value::Long(_) => Type::Long,
            Value::Double(_) => Type::Double,
            Value::Decimal(_) => Type::Decimal,
            Value::DateTime(_) => Type::DateTime,
            Value::String(_) => Type::String,
            Value::Binary(_) => Type::Binary,
            Value::List(_) => Type::List,
            Value::Dict(_) => Type::Dict,
            Value::Function(_) => Type::Function,
        }
    }

    #[inline]
    pub fn type_name(&self) -> &'static str {
        self.type_of().name()
    }

    #[inline]
    pub fn is_nil(&self) -> bool {
        matches!(self, Value::Nil)
    }

    #[inline]
    pub fn is_boolean(&self) -> bool {
        matches!(self, Value::Boolean(_))
    }

    #[inline]
    pub fn is_long(&self) -> bool {
        matches!(self, Value::Long(_))
    }

    #[inline]
    pub fn is_double(&self) -> bool {
        matches!(self, Value::Double(_))
    }

    #[inline]
    pub fn is_decimal(&self) -> bool {
        matches!(self, Value::Decimal(_))
    }

    #[inline]
    pub fn is_datetime(&self) -> bool {
        matches!(self, Value::DateTime(_))
    }

    #[inline]
    pub fn is_string(&self) -> bool {
        matches!(self, Value::String(_))
    }

    #[inline]
    pub fn is_binary(&self) -> bool {
        matches!(self, Value::Binary(_))
    }

    #[inline]
    pub fn is_list(&self) -> bool {
        matches!(self, Value::List(_))
    }

    #[inline]
    pub fn is_dict(&self) -> bool {
        matches!(self, Value::Dict(_))
    }

    #[inline]
    pub fn is_function(&self) -> bool {
        matches!(self, Value::Function(_))
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Value::Long(_) | Value::Double(_) | Value::Decimal(_))
    }

    /// NaN and functions never equal anything, themselves included.
    pub fn is_comparable(&self) -> bool {
        match self {
            Value::Double(d) => !d.is_nan(),
            Value::Function(_) => false,
            _ => true,
        }
    }

    /// Boolean cast. Every value has one, so this cannot fail.
    pub fn truthy(&self) -> bool {
        match self {
            Value::Nil => false,
            Value::Boolean(b) => *b,
            Value::Long(l) => *l != 0,
            Value::Double(d) => *d != 0.0 && !d.is_nan(),
            Value::Decimal(d) => !d.is_zero(),
            Value::DateTime(_) | Value::Function(_) => true,
            Value::String(s) => !s.is_empty(),
            Value::Binary(b) => !b.is_empty(),
            Value::List(l) => !l.is_empty(),
            Value::Dict(d) => !d.is_empty(),
        }
    }

    fn mismatch(&self, expected: Type) -> anyhow::Error {
        lang_error(
            ErrorKind::CastError,
            format!("expected {} but got {}", expected, self.type_name()),
        )
    }

    pub fn as_bool(&self) -> Result<bool> {
        match self {
            Value::Boolean(b) => Ok(*b),
            _ => Err(self.mismatch(Type::Boolean)),
        }
    }

    pub fn as_long(&self) -> Result<i64> {
        match self {
            Value::Long(l) => Ok(*l),
            _ => Err(self.mismatch(Type::Long)),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match self {
            Value::Double(d) => Ok(*d),
            _ => Err(self.mismatch(Type::Double)),
        }
    }

    pub fn as_decimal(&self) -> Result<Decimal> {
        match self {
            Value::Decimal(d) => Ok(*d),
            _ => Err(self.mismatch(Type::Decimal)),
        }
    }

    pub fn as_datetime(&self) -> Result<&DateTime<FixedOffset>> {
        match self {
            Value::DateTime(dt) => Ok(dt),
            _ => Err(self.mismatch(Type::DateTime)),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match self {
            Value::String(s) => Ok(s),
            _ => Err(self.mismatch(Type::String)),
        }
    }

    pub fn as_binary(&self) -> Result<&[u8]> {
        match self {
            Value::Binary(b) => Ok(b),
            _ => Err(self.mismatch(Type::Binary)),
        }
    }

    pub fn as_list(&self) -> Result<&ListValue> {
        match self {
            Value::List(l) => Ok(l),
            _ => Err(self.mismatch(Type::List)),
        }
    }

    pub fn as_dict(&self) -> Result<&DictValue> {
        match self {
            Value::Dict(d) => Ok(d),
            _ => Err(self.mismatch(Type::Dict)),
        }
    }

    pub fn as_function(&self) -> Result<&Arc<FunctionValue>> {
        match self {
            Value::Function(f) => Ok(f),
            _ => Err(self.mismatch(Type::Function)),
        }
    }
}

/// Type-strict structural equality. `1 == 1.0` is false here; the `==`
/// operator goes through [`Value::value_equals`] instead.
impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        match (self, other) {
            (Value::Nil, Value::Nil) => true,
            (Value::Boolean(a), Value::Boolean(b)) => a == b,
            (Value::Long(a), Value::Long(b)) => a == b,
            (Value::Double(a), Value::Double(b)) => a == b,
            (Value::Decimal(a), Value::Decimal(b)) => a == b,
            (Value::DateTime(a), Value::DateTime(b)) => a == b,
            (Value::String(a), Value::String(b)) => a == b,
            (Value::Binary(a), Value::Binary(b)) => a == b,
            (Value::List(a), Value::List(b)) => a == b,
            (Value::Dict(a), Value::Dict(b)) => a == b,
            _ => false,
        }
    }
}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        std::mem::discriminant(self).hash(state);
        match self {
            Value::Nil => {}
            Value::Boolean(b) => b.hash(state),
            Value::Long(l) => l.hash(state),
            // 0.0 and -0.0 are equal and must hash alike
            Value::Double(d) => {
                let d = if *d == 0.0 { 0.0 } else { *d };
                d.to_bits().hash(state)
            }
            Value::Decimal(d) => d.hash(state),
            Value::DateTime(dt) => dt.hash(state),
            Value::String(s) => s.hash(state),
            Value::Binary(b) => b.hash(state),
            Value::List(l) => l.hash(state),
            Value::Dict(d) => d.hash(state),
            Value::Function(f) => std::ptr::hash(Arc::as_ptr(f), state),
        }
    }
}

/// Hash set key over values.
///
/// Only values passing [`Value::is_comparable`] should be inserted; the
/// others are never equal to themselves and would be kept as duplicates.
#[derive(Debug, Clone, PartialEq, Hash)]
pub struct ValueKey(pub Value);

impl Eq for ValueKey {}

fn write_escaped(f: &mut fmt::Formatter<'_>, s: &str) -> fmt::Result {
    f.write_str("\"")?;
    for ch in s.chars() {
        match ch {
            '"' => f.write_str("\\\"")?,
            '\\' => f.write_str("\\\\")?,
            '\n' => f.write_str("\\n")?,
            '\r' => f.write_str("\\r")?,
            '\t' => f.write_str("\\t")?,
            c => write!(f, "{c}")?,
        }
    }
    f.write_str("\"")
}

fn is_plain_key(key: &str) -> bool {
    let mut chars = key.chars();
    match chars.next() {
        Some(c) if c.is_ascii_alphabetic() || c == '_' => {}
        _ => return false,
    }
    chars.all(|c| c.is_ascii_alphanumeric() || c == '_' || c == '?')
}

/// Inspect form, used by error messages and the CLI.
impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Value::Nil => f.write_str("nil"),
            Value::Boolean(b) => write!(f, "{b}"),
            Value::Long(l) => f.write_str(itoa::Buffer::new().format(*l)),
            Value::Double(d) => f.write_str(&format_double(*d)),
            Value::Decimal(d) => write!(f, "{d}d"),
            Value::DateTime(dt) => f.write_str(&dt.to_rfc3339()),
            Value::String(s) => write_escaped(f, s),
            Value::Binary(bytes) => {
                f.write_str("0b")?;
                for b in bytes.iter() {
                    write!(f, "{b:02X}")?;
                }
                Ok(())
            }
            Value::List(list) => {
                f.write_str("[")?;
                for (i, item) in list.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    write!(f, "{item}")?;
                }
                f.write_str("]")
            }
            Value::Dict(dict) => {
                f.write_str("{")?;
                for (i, (key, value)) in dict.iter().enumerate() {
                    if i > 0 {
                        f.write_str(", ")?;
                    }
                    if is_plain_key(key) {
                        write!(f, ":{key}")?;
                    } else {
                        write_escaped(f, key)?;
                    }
                    write!(f, " {value}")?;
                }
                f.write_str("}")
            }
            Value::Function(func) => match func.name() {
                Some(name) => write!(f, "function {name}"),
                None => f.write_str("function"),
            },
        }
    }
}
