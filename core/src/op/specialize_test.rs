#[cfg(test)]
mod tests {
    use chrono::{DateTime, FixedOffset};
    use proptest::prelude::*;
    use rust_decimal::Decimal;

    use crate::ast::Node;
    use crate::error::error_kind;
    use crate::interp::{EvaluationContext, Stack};
    use crate::op::{BinaryOperator, ExpressionOp, NumericPath, build};
    use crate::typ::Type;
    use crate::val::Value;

    const NUMBERS: [Type; 3] = [Type::Long, Type::Double, Type::Decimal];
    const ORDERED: [Type; 4] = [Type::Long, Type::Double, Type::Decimal, Type::DateTime];

    fn datetime() -> impl Strategy<Value = Value> {
        (-4_000_000_000i64..4_000_000_000, -14i32..=14).prop_filter_map("instant in range", |(secs, hours)| {
            let offset = FixedOffset::east_opt(hours * 3600)?;
            let instant = DateTime::from_timestamp(secs, 0)?;
            Some(Value::DateTime(instant.with_timezone(&offset)))
        })
    }

    /// Values whose runtime type is `ty`, with the occasional nil.
    fn typed_value(ty: Type) -> BoxedStrategy<Value> {
        let typed = match ty {
            Type::Long => prop_oneof![
                (-50i64..50).prop_map(Value::Long),
                Just(Value::Long(0)),
                any::<i64>().prop_map(Value::Long),
            ]
            .boxed(),
            Type::Double => prop_oneof![
                (-1e6f64..1e6).prop_map(Value::Double),
                Just(Value::Double(0.0)),
                Just(Value::Double(f64::NAN)),
                Just(Value::Double(f64::INFINITY)),
                Just(Value::Double(f64::NEG_INFINITY)),
            ]
            .boxed(),
            Type::Decimal => prop_oneof![
                (-100_000i64..100_000, 0u32..4).prop_map(|(m, s)| Value::Decimal(Decimal::new(m, s))),
                Just(Value::Decimal(Decimal::ZERO)),
                Just(Value::Decimal(Decimal::MAX)),
            ]
            .boxed(),
            _ => datetime().boxed(),
        };
        prop_oneof![9 => typed, 1 => Just(Value::Nil)].boxed()
    }

    /// A static type with two operands of that runtime type.
    fn operands(types: &[Type]) -> impl Strategy<Value = (Type, Value, Value)> {
        prop::sample::select(types.to_vec()).prop_flat_map(|ty| (Just(ty), typed_value(ty), typed_value(ty)))
    }

    fn any_value() -> impl Strategy<Value = Value> {
        prop_oneof![
            Just(Value::Nil),
            any::<i64>().prop_map(Value::Long),
            (-1e6f64..1e6).prop_map(Value::Double),
            Just(Value::Double(f64::NAN)),
            (-100_000i64..100_000, 0u32..4).prop_map(|(m, s)| Value::Decimal(Decimal::new(m, s))),
            datetime(),
            Just(Value::from("x")),
        ]
    }

    fn static_type() -> impl Strategy<Value = Type> {
        prop::sample::select(vec![Type::Long, Type::Double, Type::Decimal, Type::DateTime, Type::Any])
    }

    fn run(op: &dyn ExpressionOp, a: &Value, b: &Value) -> Result<Value, String> {
        let mut stack = Stack::new();
        stack.bind("a", a.clone());
        stack.bind("b", b.clone());
        op.eval(&mut stack, &EvaluationContext::default()).map_err(|e| {
            error_kind(&e).map(|k| k.to_string()).unwrap_or_else(|| e.to_string())
        })
    }

    fn same(x: &Result<Value, String>, y: &Result<Value, String>) -> bool {
        match (x, y) {
            (Ok(Value::Double(p)), Ok(Value::Double(q))) => (p.is_nan() && q.is_nan()) || p == q,
            _ => x == y,
        }
    }

    fn expected_path(op: BinaryOperator, ty: Type) -> NumericPath {
        match op {
            BinaryOperator::Gt | BinaryOperator::Lt | BinaryOperator::Ge | BinaryOperator::Le => {
                NumericPath::for_comparison(ty, ty)
            }
            _ => NumericPath::for_arithmetic(ty, ty),
        }
    }

    /// Evaluates `a op b` with both operands statically typed `ty` on the
    /// generic and the specialized tree.
    fn agree(op: BinaryOperator, ty: Type, a: &Value, b: &Value) -> Result<(), TestCaseError> {
        let node = Node::binary(op, Node::reference("a", ty), Node::reference("b", ty));
        let generic = build(&node);
        let specialized = generic.specialize();
        if generic.numeric_path().is_some() {
            prop_assert_eq!(specialized.numeric_path(), Some(expected_path(op, ty)));
        }
        let expected = run(generic.as_ref(), a, b);
        let actual = run(specialized.as_ref(), a, b);
        prop_assert!(same(&expected, &actual), "{} {} {}: {:?} vs {:?}", a, op, b, expected, actual);
        Ok(())
    }

    proptest! {
        #![proptest_config(ProptestConfig::with_cases(128))]

        #[test]
        fn add_agrees((ty, a, b) in operands(&NUMBERS)) {
            agree(BinaryOperator::Add, ty, &a, &b)?;
        }

        #[test]
        fn sub_agrees((ty, a, b) in operands(&NUMBERS)) {
            agree(BinaryOperator::Sub, ty, &a, &b)?;
        }

        #[test]
        fn mul_agrees((ty, a, b) in operands(&NUMBERS)) {
            agree(BinaryOperator::Mul, ty, &a, &b)?;
        }

        #[test]
        fn div_agrees((ty, a, b) in operands(&NUMBERS)) {
            agree(BinaryOperator::Div, ty, &a, &b)?;
        }

        #[test]
        fn int_div_agrees((ty, a, b) in operands(&NUMBERS)) {
            agree(BinaryOperator::IntDiv, ty, &a, &b)?;
        }

        #[test]
        fn mod_agrees((ty, a, b) in operands(&NUMBERS)) {
            agree(BinaryOperator::Mod, ty, &a, &b)?;
        }

        #[test]
        fn eq_agrees((ty, a, b) in operands(&ORDERED)) {
            agree(BinaryOperator::Eq, ty, &a, &b)?;
        }

        #[test]
        fn ne_agrees((ty, a, b) in operands(&ORDERED)) {
            agree(BinaryOperator::Ne, ty, &a, &b)?;
        }

        #[test]
        fn gt_agrees((ty, a, b) in operands(&ORDERED)) {
            agree(BinaryOperator::Gt, ty, &a, &b)?;
        }

        #[test]
        fn lt_agrees((ty, a, b) in operands(&ORDERED)) {
            agree(BinaryOperator::Lt, ty, &a, &b)?;
        }

        #[test]
        fn ge_agrees((ty, a, b) in operands(&ORDERED)) {
            agree(BinaryOperator::Ge, ty, &a, &b)?;
        }

        #[test]
        fn le_agrees((ty, a, b) in operands(&ORDERED)) {
            agree(BinaryOperator::Le, ty, &a, &b)?;
        }

        #[test]
        fn unexpected_runtime_types_fall_back(
            op in prop::sample::select(vec![
                BinaryOperator::Add,
                BinaryOperator::Div,
                BinaryOperator::Mod,
                BinaryOperator::Ge,
                BinaryOperator::Lt,
            ]),
            a in any_value(),
            b in any_value(),
            ta in static_type(),
            tb in static_type(),
        ) {
            let node = Node::binary(op, Node::reference("a", ta), Node::reference("b", tb));
            let generic = build(&node);
            let specialized = generic.specialize();
            let expected = run(generic.as_ref(), &a, &b);
            let actual = run(specialized.as_ref(), &a, &b);
            prop_assert!(same(&expected, &actual), "{} {} {}: {:?} vs {:?}", a, op, b, expected, actual);
        }

        #[test]
        fn nil_ge_nil_holds_on_every_path(ta in static_type(), tb in static_type()) {
            let node = Node::binary(BinaryOperator::Ge, Node::reference("a", ta), Node::reference("b", tb));
            let specialized = build(&node).specialize();
            prop_assert_eq!(run(specialized.as_ref(), &Value::Nil, &Value::Nil), Ok(Value::TRUE));
        }
    }
}
