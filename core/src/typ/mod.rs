use std::fmt;

use serde::{Deserialize, Serialize};

/// Runtime and static value types.
///
/// `Any` is the static top type: it never describes a runtime value, and a
/// node typed `Any` is never specialized.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Type {
    Nil,
    Boolean,
    Long,
    Double,
    Decimal,
    DateTime,
    String,
    Binary,
    List,
    Dict,
    Function,
    Any,
}

impl Type {
    pub fn name(&self) -> &'static str {
        match self {
            Type::Nil => "nil",
            Type::Boolean => "boolean",
            Type::Long => "long",
            Type::Double => "double",
            Type::Decimal => "decimal",
            Type::DateTime => "datetime",
            Type::String => "string",
            Type::Binary => "binary",
            Type::List => "list",
            Type::Dict => "dict",
            Type::Function => "function",
            Type::Any => "any",
        }
    }

    pub fn parse(s: &str) -> Option<Type> {
        let ty = match s.trim() {
            "nil" | "void" => Type::Nil,
            "boolean" | "bool" => Type::Boolean,
            "long" => Type::Long,
            "double" => Type::Double,
            "decimal" => Type::Decimal,
            "datetime" => Type::DateTime,
            "string" => Type::String,
            "binary" => Type::Binary,
            "list" => Type::List,
            "dict" => Type::Dict,
            "function" => Type::Function,
            "any" => Type::Any,
            _ => return None,
        };
        Some(ty)
    }

    #[inline]
    pub fn is_numeric(&self) -> bool {
        matches!(self, Type::Long | Type::Double | Type::Decimal)
    }

    /// Result type of an arithmetic operator over two statically typed operands.
    pub fn arithmetic_result(left: Type, right: Type) -> Type {
        match (left, right) {
            (l, r) if l == r && l.is_numeric() => l,
            (Type::Decimal, r) | (r, Type::Decimal) if r.is_numeric() => Type::Decimal,
            (Type::Double, Type::Long) | (Type::Long, Type::Double) => Type::Double,
            _ => Type::Any,
        }
    }
}

impl fmt::Display for Type {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_round_trips_names() {
        for ty in [
            Type::Nil,
            Type::Boolean,
            Type::Long,
            Type::Double,
            Type::Decimal,
            Type::DateTime,
            Type::String,
            Type::Binary,
            Type::List,
            Type::Dict,
            Type::Function,
            Type::Any,
        ] {
            assert_eq!(Type::parse(ty.name()), Some(ty));
        }
        assert_eq!(Type::parse("void"), Some(Type::Nil));
        assert_eq!(Type::parse("Int"), None);
    }

    #[test]
    fn test_arithmetic_result() {
        assert_eq!(Type::arithmetic_result(Type::Long, Type::Long), Type::Long);
        assert_eq!(Type::arithmetic_result(Type::Long, Type::Double), Type::Double);
        assert_eq!(Type::arithmetic_result(Type::Double, Type::Decimal), Type::Decimal);
        assert_eq!(Type::arithmetic_result(Type::Long, Type::Any), Type::Any);
        assert_eq!(Type::arithmetic_result(Type::String, Type::String), Type::Any);
    }
}
