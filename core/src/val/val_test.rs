#[cfg(test)]
mod tests {
    use std::cmp::Ordering;
    use std::collections::HashSet;
    use std::collections::hash_map::DefaultHasher;
    use std::hash::{Hash, Hasher};

    use anyhow::Result;
    use chrono::DateTime;
    use rust_decimal::Decimal;

    use crate::error::{ErrorKind, error_kind};
    use crate::typ::Type;
    use crate::val::{Comparison, ListValue, Value, ValueKey, arithmetic, compare, Arith};

    fn hash_of(v: &Value) -> u64 {
        let mut h = DefaultHasher::new();
        v.hash(&mut h);
        h.finish()
    }

    fn dec(s: &str) -> Value {
        Value::Decimal(s.parse::<Decimal>().unwrap())
    }

    #[test]
    fn test_accessor_mismatch_is_cast_error() {
        let err = Value::from("x").as_long().unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::CastError));
        assert!(err.to_string().contains("expected long but got string"));
    }

    #[test]
    fn test_predicates() {
        assert!(Value::Nil.is_nil());
        assert!(Value::Long(1).is_numeric());
        assert!(dec("1.5").is_numeric());
        assert!(!Value::from("1").is_numeric());
        assert_eq!(Value::Double(1.0).type_of(), Type::Double);
        assert_eq!(Value::list(vec![1i64]).type_name(), "list");
    }

    #[test]
    fn test_strict_equality_and_nan() {
        assert_ne!(Value::Long(1), Value::Double(1.0));
        assert_eq!(Value::list(vec![1i64, 2]), Value::list(vec![1i64, 2]));
        let nan = Value::Double(f64::NAN);
        assert_ne!(nan, nan.clone());
        assert!(!nan.value_equals(&nan));
    }

    #[test]
    fn test_value_equals_promotes_numbers() {
        assert!(Value::Long(1).value_equals(&Value::Double(1.0)));
        assert!(Value::Long(2).value_equals(&dec("2.00")));
        let a = Value::list(vec![Value::Long(1), Value::dict([("k", Value::Double(2.0))])]);
        let b = Value::list(vec![Value::Double(1.0), Value::dict([("k", Value::Long(2))])]);
        assert!(a.value_equals(&b));
        assert!(!Value::Long(1).value_equals(&Value::from("1")));
        assert!(Value::Nil.value_equals(&Value::Nil));
        assert!(!Value::Nil.value_equals(&Value::Long(0)));
    }

    #[test]
    fn test_hash_consistent_with_equality() {
        assert_eq!(hash_of(&Value::Double(0.0)), hash_of(&Value::Double(-0.0)));
        assert_eq!(hash_of(&dec("1.0")), hash_of(&dec("1.00")));
        let a = Value::dict([("x", 1i64), ("y", 2i64)]);
        let b = Value::dict([("y", 2i64), ("x", 1i64)]);
        assert_eq!(a, b);
        assert_eq!(hash_of(&a), hash_of(&b));
    }

    #[test]
    fn test_value_key_set() {
        let mut seen = HashSet::new();
        assert!(seen.insert(ValueKey(Value::from("a"))));
        assert!(!seen.insert(ValueKey(Value::from("a"))));
        assert!(seen.insert(ValueKey(Value::Long(1))));
        assert!(seen.insert(ValueKey(Value::Double(1.0))));
    }

    #[test]
    fn test_display() {
        let v = Value::dict([
            ("name", Value::from("a\"b")),
            ("n", Value::Long(3)),
            ("two words", Value::Nil),
        ]);
        assert_eq!(v.to_string(), r#"{:n 3, :name "a\"b", "two words" nil}"#);
        assert_eq!(Value::list(vec![Value::Double(1.0), dec("2.5")]).to_string(), "[1.0, 2.5d]");
        assert_eq!(Value::binary(vec![0xCAu8, 0xFE]).to_string(), "0bCAFE");
        assert_eq!(Value::Double(f64::NEG_INFINITY).to_string(), "-Infinity");
    }

    #[test]
    fn test_cast_lattice() -> Result<()> {
        assert_eq!(Value::Nil.cast_to(Type::Long)?, Value::Nil);
        assert_eq!(Value::from(" 42 ").cast_to(Type::Long)?, Value::Long(42));
        assert_eq!(Value::Double(-3.9).cast_to(Type::Long)?, Value::Long(-3));
        assert_eq!(Value::Double(f64::NAN).cast_to(Type::Long)?, Value::Long(0));
        assert_eq!(Value::Double(0.1).cast_to(Type::Decimal)?, dec("0.1"));
        assert_eq!(Value::from("Infinity").cast_to(Type::Double)?, Value::Double(f64::INFINITY));
        assert_eq!(Value::TRUE.cast_to(Type::Long)?, Value::Long(1));
        assert_eq!(Value::from("").cast_to(Type::Boolean)?, Value::FALSE);
        assert_eq!(Value::Double(f64::NAN).cast_to(Type::Boolean)?, Value::FALSE);
        assert_eq!(Value::Long(7).cast_to(Type::String)?, Value::from("7"));
        assert_eq!(
            Value::dict([("a", 1i64)]).cast_to(Type::List)?,
            Value::list(vec![Value::from("a"), Value::Long(1)])
        );
        assert_eq!(
            Value::list(vec![Value::from("a"), Value::Long(1)]).cast_to(Type::Dict)?,
            Value::dict([("a", 1i64)])
        );
        assert_eq!(
            Value::binary(vec![1u8, 255]).cast_to(Type::List)?,
            Value::list(vec![1i64, 255])
        );
        let dt = Value::from("2024-01-02T03:04:05+01:00").cast_to(Type::DateTime)?;
        assert_eq!(
            dt,
            Value::DateTime(DateTime::parse_from_rfc3339("2024-01-02T03:04:05+01:00")?)
        );
        Ok(())
    }

    #[test]
    fn test_cast_failures() {
        let cases = [
            (Value::from("abc"), Type::Long),
            (Value::list(vec![1i64]), Type::String),
            (Value::list(vec![1i64]), Type::Dict),
            (Value::Double(f64::INFINITY), Type::Decimal),
            (Value::Long(1), Type::Function),
            (Value::Long(1), Type::DateTime),
        ];
        for (value, target) in cases {
            let err = value.cast_to(target).unwrap_err();
            assert_eq!(error_kind(&err), Some(ErrorKind::CastError), "{} as {}", value, target);
        }
    }

    #[test]
    fn test_nil_comparisons() -> Result<()> {
        assert!(compare(Comparison::Ge, &Value::Nil, &Value::Nil)?);
        assert!(compare(Comparison::Le, &Value::Nil, &Value::Nil)?);
        assert!(!compare(Comparison::Gt, &Value::Nil, &Value::Nil)?);
        assert!(!compare(Comparison::Lt, &Value::Nil, &Value::Nil)?);
        assert!(!compare(Comparison::Ge, &Value::Nil, &Value::Long(1))?);
        assert!(!compare(Comparison::Ge, &Value::Long(1), &Value::Nil)?);
        assert!(!compare(Comparison::Lt, &Value::Long(1), &Value::Nil)?);
        Ok(())
    }

    #[test]
    fn test_mixed_numeric_comparisons() -> Result<()> {
        assert!(compare(Comparison::Lt, &Value::Long(1), &Value::Double(1.5))?);
        assert!(compare(Comparison::Ge, &dec("0.1"), &Value::Double(0.1))?);
        assert!(compare(Comparison::Gt, &Value::Double(f64::INFINITY), &dec("79228162514264337593543950335"))?);
        assert!(compare(Comparison::Lt, &Value::Double(f64::NEG_INFINITY), &dec("-1"))?);
        assert!(!compare(Comparison::Ge, &Value::Double(f64::NAN), &Value::Double(f64::NAN))?);
        assert!(!compare(Comparison::Le, &Value::Double(f64::NAN), &dec("1"))?);
        Ok(())
    }

    #[test]
    fn test_incompatible_comparison_names_types() {
        let err = compare(Comparison::Lt, &Value::from("a"), &Value::Long(1)).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::CastError));
        assert!(err.to_string().contains("string and long"));
        let now = Value::DateTime(DateTime::parse_from_rfc3339("2024-01-01T00:00:00Z").unwrap());
        let err = compare(Comparison::Lt, &now, &Value::Long(1)).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::CastError));
    }

    #[test]
    fn test_arithmetic_promotion_and_nil() -> Result<()> {
        assert_eq!(arithmetic(Arith::Add, &Value::Long(1), &Value::Long(2))?, Value::Long(3));
        assert_eq!(arithmetic(Arith::Add, &Value::Long(1), &Value::Double(0.5))?, Value::Double(1.5));
        assert_eq!(arithmetic(Arith::Add, &Value::Double(0.1), &dec("0.2"))?, dec("0.3"));
        assert_eq!(arithmetic(Arith::Div, &Value::Long(1), &Value::Long(2))?, Value::Double(0.5));
        assert_eq!(arithmetic(Arith::IntDiv, &Value::Long(-7), &Value::Long(2))?, Value::Long(-4));
        assert_eq!(arithmetic(Arith::Mod, &Value::Long(-7), &Value::Long(2))?, Value::Long(-1));
        assert_eq!(arithmetic(Arith::Mul, &Value::Nil, &Value::Long(2))?, Value::Nil);
        assert_eq!(arithmetic(Arith::Add, &Value::Long(i64::MAX), &Value::Long(1))?, Value::Long(i64::MIN));
        Ok(())
    }

    #[test]
    fn test_arithmetic_failures() {
        let err = arithmetic(Arith::IntDiv, &Value::Long(1), &Value::Long(0)).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::DivisionByZero));
        let err = arithmetic(Arith::Div, &dec("1"), &dec("0")).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::DivisionByZero));
        let err = arithmetic(Arith::Sub, &Value::from("a"), &Value::Nil).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::CastError));
        assert!(err.to_string().contains("cannot subtract types string and nil"));
        let err = arithmetic(Arith::Add, &Value::Double(f64::NAN), &dec("1")).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::CastError));
    }

    #[test]
    fn test_list_persistence() -> Result<()> {
        let l1 = ListValue::from(vec![Value::Long(1), Value::Long(2)]);
        let l2 = l1.append(Value::Long(3));
        assert_eq!(l1.len(), 2);
        assert_eq!(l1.to_vec(), vec![Value::Long(1), Value::Long(2)]);
        assert_eq!(l2.len(), 3);
        let l3 = l1.set(0, Value::Long(9))?;
        assert_eq!(l1.get(0), Some(&Value::Long(1)));
        assert_eq!(l3.get(0), Some(&Value::Long(9)));
        Ok(())
    }

    #[test]
    fn test_list_set_bounds() -> Result<()> {
        let list = ListValue::from(vec![Value::Long(1)]);
        assert_eq!(list.set(1, Value::Long(2))?.len(), 2);
        assert_eq!(list.insert(0, Value::Long(0))?.to_vec(), vec![Value::Long(0), Value::Long(1)]);
        let err = list.set(2, Value::Nil).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::IndexOutOfBounds));
        let err = list.insert(-1, Value::Nil).unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::IndexOutOfBounds));
        assert!(list.delete(5).ptr_eq(&list));
        Ok(())
    }

    #[test]
    fn test_slice_take_drop() {
        let list: ListValue = (1..=5).map(Value::Long).collect();
        assert_eq!(list.slice(1, 4).to_vec(), vec![Value::Long(2), Value::Long(3), Value::Long(4)]);
        assert!(list.slice(0, 10).ptr_eq(&list));
        assert!(list.slice(4, 2).is_empty());
        assert!(list.take(-1).is_empty());
        assert!(list.take(5).ptr_eq(&list));
        assert!(list.drop(0).ptr_eq(&list));
        assert_eq!(list.drop(3).to_vec(), vec![Value::Long(4), Value::Long(5)]);
        assert_eq!(list.reverse().first(), Some(&Value::Long(5)));
    }

    #[test]
    fn test_sort_is_stable_and_fallible() -> Result<()> {
        let list = ListValue::from(vec![
            Value::list(vec![Value::Long(2), Value::from("a")]),
            Value::list(vec![Value::Long(1), Value::from("b")]),
            Value::list(vec![Value::Long(2), Value::from("c")]),
        ]);
        let by_first = |a: &Value, b: &Value| -> Result<Ordering> {
            let x = a.as_list()?.get(0).cloned().unwrap_or_default().as_long()?;
            let y = b.as_list()?.get(0).cloned().unwrap_or_default().as_long()?;
            Ok(x.cmp(&y))
        };
        let sorted = list.sort_by(by_first)?;
        let tags: Vec<String> = sorted
            .iter()
            .map(|v| v.as_list().ok().and_then(|l| l.get(1).cloned()).unwrap_or_default().to_string())
            .collect();
        assert_eq!(tags, vec!["\"b\"", "\"a\"", "\"c\""]);

        let err = list
            .sort_by(|_, _| Err(crate::error::lang_error(ErrorKind::IllegalArgument, "nope")))
            .unwrap_err();
        assert_eq!(error_kind(&err), Some(ErrorKind::IllegalArgument));
        Ok(())
    }

    #[test]
    fn test_dict_operations() {
        let d = Value::dict([("a", 1i64), ("b", 2i64)]);
        let d = d.as_dict().unwrap();
        assert!(d.delete("zz").ptr_eq(d));
        assert_eq!(d.delete("a").len(), 1);
        let other = Value::dict([("b", 20i64), ("c", 30i64)]);
        let merged = d.merge(other.as_dict().unwrap());
        assert_eq!(merged.get("b"), Some(&Value::Long(20)));
        assert_eq!(merged.get("a"), Some(&Value::Long(1)));
        assert_eq!(merged.keys().map(|k| k.to_string()).collect::<Vec<_>>(), vec!["a", "b", "c"]);
    }

    #[test]
    fn test_merge_right_side_wins_when_left_is_larger() {
        let left = Value::dict([("a", 1i64), ("b", 1i64), ("c", 1i64)]);
        let right = Value::dict([("b", 2i64)]);
        let left = left.as_dict().unwrap();
        let merged = left.merge(right.as_dict().unwrap());
        assert_eq!(merged.get("b"), Some(&Value::Long(2)));
        assert_eq!(merged.get("a"), Some(&Value::Long(1)));
        assert_eq!(merged.len(), 3);
        assert_eq!(left.get("b"), Some(&Value::Long(1)));
    }
}
