use std::str::FromStr;
use std::sync::Arc;

use anyhow::Result;
use chrono::DateTime;
use rust_decimal::Decimal;
use rust_decimal::prelude::ToPrimitive;

use crate::error::{ErrorKind, lang_error};
use crate::typ::Type;

use super::{DictValue, ListValue, Value};

/// Canonical text of a double: shortest round-trip digits, plus the names
/// `NaN`, `Infinity` and `-Infinity`.
pub fn format_double(d: f64) -> String {
    if d.is_nan() {
        "NaN".to_string()
    } else if d.is_infinite() {
        if d > 0.0 { "Infinity".to_string() } else { "-Infinity".to_string() }
    } else {
        ryu::Buffer::new().format_finite(d).to_string()
    }
}

/// Decimal with the same digits as the shortest text of `d`. `None` for
/// non-finite values and values beyond decimal range.
pub fn decimal_from_f64(d: f64) -> Option<Decimal> {
    if !d.is_finite() {
        return None;
    }
    let mut buf = ryu::Buffer::new();
    let text = buf.format_finite(d);
    if text.contains('e') {
        Decimal::from_scientific(text).ok()
    } else {
        Decimal::from_str(text).ok()
    }
}

fn parse_decimal(text: &str) -> Option<Decimal> {
    Decimal::from_str(text).or_else(|_| Decimal::from_scientific(text)).ok()
}

fn parse_double(text: &str) -> Option<f64> {
    match text {
        "NaN" => Some(f64::NAN),
        "Infinity" | "+Infinity" => Some(f64::INFINITY),
        "-Infinity" => Some(f64::NEG_INFINITY),
        _ => text.parse::<f64>().ok(),
    }
}

fn cast_failure(value: &Value, target: Type) -> anyhow::Error {
    lang_error(
        ErrorKind::CastError,
        format!("cannot cast {} to {}", value.type_name(), target),
    )
}

impl Value {
    /// Convert along the coercion lattice. Nil casts to nil for every target.
    pub fn cast_to(&self, target: Type) -> Result<Value> {
        if self.is_nil() || target == Type::Any || self.type_of() == target {
            return Ok(self.clone());
        }
        match target {
            Type::Nil => Err(cast_failure(self, target)),
            Type::Boolean => Ok(Value::Boolean(self.truthy())),
            Type::Long => self.cast_to_long(),
            Type::Double => self.cast_to_double(),
            Type::Decimal => self.cast_to_decimal(),
            Type::String => self.cast_to_string(),
            Type::List => self.cast_to_list(),
            Type::Dict => self.cast_to_dict(),
            Type::DateTime => match self {
                Value::String(s) => DateTime::parse_from_rfc3339(s.trim())
                    .map(Value::DateTime)
                    .map_err(|_| lang_error(ErrorKind::CastError, format!("cannot cast {} to datetime", self))),
                _ => Err(cast_failure(self, target)),
            },
            Type::Binary | Type::Function | Type::Any => Err(cast_failure(self, target)),
        }
    }

    fn cast_to_long(&self) -> Result<Value> {
        match self {
            Value::Boolean(b) => Ok(Value::Long(i64::from(*b))),
            // saturating, NaN becomes 0
            Value::Double(d) => Ok(Value::Long(*d as i64)),
            Value::Decimal(d) => d
                .trunc()
                .to_i64()
                .map(Value::Long)
                .ok_or_else(|| lang_error(ErrorKind::CastError, format!("decimal {d} out of long range"))),
            Value::String(s) => s
                .trim()
                .parse::<i64>()
                .map(Value::Long)
                .map_err(|_| lang_error(ErrorKind::CastError, format!("cannot cast {} to long", self))),
            _ => Err(cast_failure(self, Type::Long)),
        }
    }

    fn cast_to_double(&self) -> Result<Value> {
        match self {
            Value::Boolean(b) => Ok(Value::Double(if *b { 1.0 } else { 0.0 })),
            Value::Long(l) => Ok(Value::Double(*l as f64)),
            Value::Decimal(d) => d
                .to_f64()
                .map(Value::Double)
                .ok_or_else(|| lang_error(ErrorKind::CastError, format!("cannot cast {d} to double"))),
            Value::String(s) => parse_double(s.trim())
                .map(Value::Double)
                .ok_or_else(|| lang_error(ErrorKind::CastError, format!("cannot cast {} to double", self))),
            _ => Err(cast_failure(self, Type::Double)),
        }
    }

    fn cast_to_decimal(&self) -> Result<Value> {
        match self {
            Value::Boolean(b) => Ok(Value::Decimal(Decimal::from(i64::from(*b)))),
            Value::Long(l) => Ok(Value::Decimal(Decimal::from(*l))),
            Value::Double(d) => decimal_from_f64(*d)
                .map(Value::Decimal)
                .ok_or_else(|| lang_error(ErrorKind::CastError, format!("cannot cast {} to decimal", self))),
            Value::String(s) => parse_decimal(s.trim())
                .map(Value::Decimal)
                .ok_or_else(|| lang_error(ErrorKind::CastError, format!("cannot cast {} to decimal", self))),
            _ => Err(cast_failure(self, Type::Decimal)),
        }
    }

    fn cast_to_string(&self) -> Result<Value> {
        let text = match self {
            Value::Boolean(b) => b.to_string(),
            Value::Long(l) => itoa::Buffer::new().format(*l).to_string(),
            Value::Double(d) => format_double(*d),
            Value::Decimal(d) => d.to_string(),
            Value::DateTime(dt) => dt.to_rfc3339(),
            _ => return Err(cast_failure(self, Type::String)),
        };
        Ok(Value::String(Arc::from(text)))
    }

    fn cast_to_list(&self) -> Result<Value> {
        let list: ListValue = match self {
            Value::Dict(dict) => dict
                .iter()
                .flat_map(|(k, v)| [Value::String(k.clone()), v.clone()])
                .collect(),
            Value::String(s) => s.chars().map(|c| Value::String(Arc::from(c.to_string()))).collect(),
            Value::Binary(bytes) => bytes.iter().map(|b| Value::Long(i64::from(*b))).collect(),
            _ => return Err(cast_failure(self, Type::List)),
        };
        Ok(Value::List(list))
    }

    fn cast_to_dict(&self) -> Result<Value> {
        let Value::List(list) = self else {
            return Err(cast_failure(self, Type::Dict));
        };
        if list.len() % 2 != 0 {
            return Err(lang_error(
                ErrorKind::CastError,
                "cannot cast list with odd number of items to dict",
            ));
        }
        let mut dict = DictValue::new();
        let items = list.to_vec();
        for pair in items.chunks(2) {
            let key = match pair[0].cast_to(Type::String)? {
                Value::String(k) => k,
                _ => return Err(lang_error(ErrorKind::CastError, "cannot cast list with nil keys to dict")),
            };
            dict = dict.put(key, pair[1].clone());
        }
        Ok(Value::Dict(dict))
    }
}
