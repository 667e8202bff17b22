use std::sync::Arc;

use chrono::{DateTime, FixedOffset};
use rust_decimal::Decimal;

use crate::val::function::FunctionValue;

use super::{DictValue, ListValue, Value};

impl From<String> for Value {
    #[inline]
    fn from(s: String) -> Self {
        Value::String(Arc::<str>::from(s))
    }
}

impl From<&str> for Value {
    #[inline]
    fn from(s: &str) -> Self {
        Value::String(Arc::from(s))
    }
}

impl From<Arc<str>> for Value {
    #[inline]
    fn from(s: Arc<str>) -> Self {
        Value::String(s)
    }
}

impl From<i64> for Value {
    #[inline]
    fn from(i: i64) -> Self {
        Value::Long(i)
    }
}

impl From<i32> for Value {
    #[inline]
    fn from(i: i32) -> Self {
        Value::Long(i64::from(i))
    }
}

impl From<usize> for Value {
    #[inline]
    fn from(i: usize) -> Self {
        Value::Long(i64::try_from(i).unwrap_or(i64::MAX))
    }
}

impl From<f64> for Value {
    #[inline]
    fn from(f: f64) -> Self {
        Value::Double(f)
    }
}

impl From<bool> for Value {
    #[inline]
    fn from(b: bool) -> Self {
        Value::Boolean(b)
    }
}

impl From<Decimal> for Value {
    #[inline]
    fn from(d: Decimal) -> Self {
        Value::Decimal(d)
    }
}

impl From<DateTime<FixedOffset>> for Value {
    #[inline]
    fn from(dt: DateTime<FixedOffset>) -> Self {
        Value::DateTime(dt)
    }
}

impl From<ListValue> for Value {
    #[inline]
    fn from(list: ListValue) -> Self {
        Value::List(list)
    }
}

impl From<DictValue> for Value {
    #[inline]
    fn from(dict: DictValue) -> Self {
        Value::Dict(dict)
    }
}

impl From<FunctionValue> for Value {
    #[inline]
    fn from(f: FunctionValue) -> Self {
        Value::Function(Arc::new(f))
    }
}

impl From<Arc<FunctionValue>> for Value {
    #[inline]
    fn from(f: Arc<FunctionValue>) -> Self {
        Value::Function(f)
    }
}

impl<T> From<Vec<T>> for Value
where
    T: Into<Value>,
{
    fn from(v: Vec<T>) -> Self {
        Value::List(v.into_iter().map(Into::into).collect())
    }
}

impl<T> From<Option<T>> for Value
where
    T: Into<Value>,
{
    fn from(o: Option<T>) -> Self {
        match o {
            Some(v) => v.into(),
            None => Value::Nil,
        }
    }
}

impl Value {
    pub fn binary(bytes: impl Into<Arc<[u8]>>) -> Value {
        Value::Binary(bytes.into())
    }

    pub fn list<I, T>(items: I) -> Value
    where
        I: IntoIterator<Item = T>,
        T: Into<Value>,
    {
        Value::List(items.into_iter().map(Into::into).collect())
    }

    pub fn dict<I, K, T>(entries: I) -> Value
    where
        I: IntoIterator<Item = (K, T)>,
        K: Into<Arc<str>>,
        T: Into<Value>,
    {
        Value::Dict(entries.into_iter().map(|(k, v)| (k, v.into())).collect())
    }
}
