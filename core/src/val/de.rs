use std::fmt;
use std::sync::Arc;

use anyhow::Result;
use chrono::DateTime;
use rust_decimal::Decimal;
use serde::de::{Deserialize, Deserializer, MapAccess, SeqAccess, Visitor};
use serde::ser::{Error as _, Serialize, SerializeMap, SerializeSeq, Serializer};

use crate::error::{ErrorKind, lang_error};
use crate::val::{DictValue, ListValue, Value};

/// Key the `toml` deserializer wraps datetimes in.
const TOML_DATETIME_KEY: &str = "$__toml_private_datetime";

/// Deserializes any self-describing document into a Value.
struct ValueVisitor;

impl<'de> Visitor<'de> for ValueVisitor {
    type Value = Value;

    fn expecting(&self, formatter: &mut fmt::Formatter) -> fmt::Result {
        formatter.write_str("a value of any type")
    }

    fn visit_bool<E>(self, value: bool) -> Result<Value, E> {
        Ok(Value::Boolean(value))
    }

    fn visit_i64<E>(self, value: i64) -> Result<Value, E> {
        Ok(Value::Long(value))
    }

    fn visit_u64<E>(self, value: u64) -> Result<Value, E> {
        // too big for a long, still exact as a decimal
        match i64::try_from(value) {
            Ok(l) => Ok(Value::Long(l)),
            Err(_) => Ok(Value::Decimal(Decimal::from(value))),
        }
    }

    fn visit_f64<E>(self, value: f64) -> Result<Value, E> {
        Ok(Value::Double(value))
    }

    fn visit_str<E>(self, value: &str) -> Result<Value, E> {
        Ok(Value::String(Arc::from(value)))
    }

    fn visit_string<E>(self, value: String) -> Result<Value, E> {
        Ok(Value::String(Arc::<str>::from(value)))
    }

    fn visit_bytes<E>(self, value: &[u8]) -> Result<Value, E> {
        Ok(Value::binary(value))
    }

    fn visit_none<E>(self) -> Result<Value, E> {
        Ok(Value::Nil)
    }

    fn visit_some<D>(self, deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }

    fn visit_unit<E>(self) -> Result<Value, E> {
        Ok(Value::Nil)
    }

    fn visit_seq<A>(self, mut seq: A) -> Result<Value, A::Error>
    where
        A: SeqAccess<'de>,
    {
        let mut items = Vec::with_capacity(seq.size_hint().unwrap_or(0));
        while let Some(item) = seq.next_element::<Value>()? {
            items.push(item);
        }
        Ok(Value::List(ListValue::from(items)))
    }

    fn visit_map<M>(self, mut map_access: M) -> Result<Value, M::Error>
    where
        M: MapAccess<'de>,
    {
        let mut dict = DictValue::new();
        while let Some((key, value)) = map_access.next_entry::<String, Value>()? {
            if key == TOML_DATETIME_KEY {
                return Ok(toml_datetime(value));
            }
            dict = dict.put(key, value);
        }
        Ok(Value::Dict(dict))
    }
}

/// Offset datetimes become datetimes; local dates and times stay text.
fn toml_datetime(raw: Value) -> Value {
    match &raw {
        Value::String(s) => DateTime::parse_from_rfc3339(s).map(Value::DateTime).unwrap_or(raw),
        _ => raw,
    }
}

impl<'de> Deserialize<'de> for Value {
    fn deserialize<D>(deserializer: D) -> Result<Value, D::Error>
    where
        D: Deserializer<'de>,
    {
        deserializer.deserialize_any(ValueVisitor)
    }
}

impl Serialize for Value {
    fn serialize<S>(&self, serializer: S) -> Result<S::Ok, S::Error>
    where
        S: Serializer,
    {
        match self {
            Value::Nil => serializer.serialize_unit(),
            Value::Boolean(b) => serializer.serialize_bool(*b),
            Value::Long(l) => serializer.serialize_i64(*l),
            Value::Double(d) => serializer.serialize_f64(*d),
            Value::Decimal(d) => serializer.serialize_str(&d.to_string()),
            Value::DateTime(dt) => serializer.serialize_str(&dt.to_rfc3339()),
            Value::String(s) => serializer.serialize_str(s),
            Value::Binary(b) => serializer.serialize_bytes(b),
            Value::List(list) => {
                let mut seq = serializer.serialize_seq(Some(list.len()))?;
                for item in list {
                    seq.serialize_element(item)?;
                }
                seq.end()
            }
            Value::Dict(dict) => {
                let mut map = serializer.serialize_map(Some(dict.len()))?;
                for (key, value) in dict.iter() {
                    map.serialize_entry(&**key, value)?;
                }
                map.end()
            }
            Value::Function(_) => Err(S::Error::custom("function values cannot be serialized")),
        }
    }
}

impl Value {
    pub fn from_json(json: serde_json::Value) -> Value {
        match json {
            serde_json::Value::Null => Value::Nil,
            serde_json::Value::Bool(b) => Value::Boolean(b),
            serde_json::Value::Number(n) => match (n.as_i64(), n.as_u64(), n.as_f64()) {
                (Some(l), _, _) => Value::Long(l),
                (None, Some(u), _) => Value::Decimal(Decimal::from(u)),
                (None, None, Some(d)) => Value::Double(d),
                _ => Value::Nil,
            },
            serde_json::Value::String(s) => Value::from(s),
            serde_json::Value::Array(items) => Value::List(items.into_iter().map(Value::from_json).collect()),
            serde_json::Value::Object(entries) => Value::Dict(
                entries
                    .into_iter()
                    .map(|(k, v)| (k, Value::from_json(v)))
                    .collect(),
            ),
        }
    }

    /// JSON form; fails `NotSerializable` when a function is reachable.
    pub fn to_json(&self) -> Result<serde_json::Value> {
        serde_json::to_value(self).map_err(|e| lang_error(ErrorKind::NotSerializable, e.to_string()))
    }
}

pub fn from_json_str(input: &str) -> Result<Value> {
    serde_json::from_str::<Value>(input).map_err(|e| anyhow::anyhow!(e))
}

pub fn from_toml_str(input: &str) -> Result<Value> {
    toml::from_str::<Value>(input).map_err(|e| anyhow::anyhow!(e))
}
