#[cfg(test)]
mod tests {
    use std::sync::Arc;

    use anyhow::Result;
    use rust_decimal::Decimal;

    use crate::error::{ErrorKind, error_kind};
    use crate::typ::Type;
    use crate::val::de::{from_json_str, from_toml_str};
    use crate::val::{FunctionSignature, FunctionValue, Value};

    #[test]
    fn test_from_json_str_basic() -> Result<()> {
        let val = from_json_str(r#"{"name": "test", "age": 25, "active": true}"#)?;
        let dict = val.as_dict()?;
        assert_eq!(dict.get("name"), Some(&Value::from("test")));
        assert_eq!(dict.get("age"), Some(&Value::Long(25)));
        assert_eq!(dict.get("active"), Some(&Value::TRUE));
        Ok(())
    }

    #[test]
    fn test_from_json_str_array() -> Result<()> {
        let val = from_json_str(r#"[1, 2.5, "hello", true, null]"#)?;
        let list = val.as_list()?;
        assert_eq!(list.len(), 5);
        assert_eq!(list.get(0), Some(&Value::Long(1)));
        assert_eq!(list.get(1), Some(&Value::Double(2.5)));
        assert_eq!(list.get(2), Some(&Value::from("hello")));
        assert_eq!(list.get(4), Some(&Value::Nil));
        Ok(())
    }

    #[test]
    fn test_large_unsigned_becomes_decimal() -> Result<()> {
        let val = from_json_str("18446744073709551615")?;
        assert_eq!(val, Value::Decimal(Decimal::from(u64::MAX)));
        Ok(())
    }

    #[test]
    fn test_from_json_matches_from_json_str() -> Result<()> {
        let text = r#"{"user": {"name": "admin", "permissions": ["read", "write"]}, "count": 42}"#;
        let json: serde_json::Value = serde_json::from_str(text)?;
        assert_eq!(Value::from_json(json), from_json_str(text)?);
        Ok(())
    }

    #[test]
    fn test_from_toml_str() -> Result<()> {
        let val = from_toml_str(
            r#"
            title = "demo"
            when = 2024-03-01T10:00:00Z

            [limits]
            depth = 3
            "#,
        )?;
        let dict = val.as_dict()?;
        assert_eq!(dict.get("title"), Some(&Value::from("demo")));
        assert!(dict.get("when").is_some_and(Value::is_datetime));
        let limits = dict.get("limits").map(Value::as_dict).transpose()?;
        assert_eq!(limits.and_then(|l| l.get("depth")), Some(&Value::Long(3)));
        Ok(())
    }

    #[test]
    fn test_to_json_shapes() -> Result<()> {
        let val = Value::dict([
            ("d", Value::Decimal(Decimal::new(15, 1))),
            ("b", Value::binary(vec![1u8, 2])),
            ("n", Value::Nil),
        ]);
        assert_eq!(
            val.to_json()?,
            serde_json::json!({"b": [1, 2], "d": "1.5", "n": null})
        );
        Ok(())
    }

    fn identity(_: &mut crate::call::CallContext<'_>, args: &[Value]) -> Result<Value> {
        Ok(args[0].clone())
    }

    #[test]
    fn test_functions_are_not_serializable() {
        let f = FunctionValue::native(
            "identity",
            FunctionSignature::new(vec![crate::val::Parameter::new("x", Type::Any)], Type::Any),
            identity,
        );
        let nested = Value::list(vec![Value::Long(1), Value::Function(Arc::new(f))]);
        let err = nested.to_json().unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::NotSerializable));
    }
}
