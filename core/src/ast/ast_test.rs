#[cfg(test)]
mod tests {
    use crate::ast::{Binding, BindTarget, MatchArm, Node, NodeKind, ParamDef, PatternNode};
    use crate::error::SourceInfo;
    use crate::op::BinaryOperator;
    use crate::typ::Type;

    #[test]
    fn test_binary_result_types() {
        let typed = |op, l, r| Node::binary(op, Node::reference("a", l), Node::reference("b", r)).value_type;
        assert_eq!(typed(BinaryOperator::Add, Type::Long, Type::Long), Type::Long);
        assert_eq!(typed(BinaryOperator::Div, Type::Long, Type::Long), Type::Double);
        assert_eq!(typed(BinaryOperator::IntDiv, Type::Long, Type::Long), Type::Long);
        assert_eq!(typed(BinaryOperator::Mul, Type::Long, Type::Double), Type::Double);
        assert_eq!(typed(BinaryOperator::Sub, Type::Decimal, Type::Long), Type::Decimal);
        assert_eq!(typed(BinaryOperator::Add, Type::Any, Type::Long), Type::Any);
        assert_eq!(typed(BinaryOperator::Le, Type::Any, Type::Long), Type::Boolean);
    }

    #[test]
    fn test_constant_type_follows_value() {
        assert_eq!(Node::constant(1i64).value_type, Type::Long);
        assert_eq!(Node::constant("s").value_type, Type::String);
        assert_eq!(Node::nil().value_type, Type::Nil);
    }

    #[test]
    fn test_branch_types_merge() {
        let same = Node::if_(Node::constant(true), Node::constant(1i64), Node::constant(2i64));
        assert_eq!(same.value_type, Type::Long);
        let mixed = Node::if_(Node::constant(true), Node::constant(1i64), Node::constant("x"));
        assert_eq!(mixed.value_type, Type::Any);
        let arms = Node::match_(
            Node::nil(),
            vec![MatchArm::new(PatternNode::wildcard(), Node::constant(1.5))],
        );
        assert_eq!(arms.value_type, Type::Double);
        assert_eq!(Node::negate(Node::constant("x")).value_type, Type::Any);
    }

    #[test]
    fn test_binding_names_anonymous_function() {
        let binding = Binding::name("inc", Node::function(vec![ParamDef::new("x", Type::Long)], Type::Long, Node::nil()));
        assert!(matches!(&binding.target, BindTarget::Name(n) if &**n == "inc"));
        match &binding.value.kind {
            NodeKind::Function(def) => assert_eq!(def.name.as_deref(), Some("inc")),
            other => panic!("expected function, got {:?}", other),
        }

        let plain = Binding::name("one", Node::constant(1i64));
        assert!(matches!(plain.value.kind, NodeKind::Constant(_)));
    }

    #[test]
    fn test_at_keeps_kind_and_type() {
        let node = Node::constant(1i64).at(SourceInfo::new("f", 4, 2));
        assert_eq!(node.value_type, Type::Long);
        assert_eq!(node.source, Some(SourceInfo::new("f", 4, 2)));
    }

    #[test]
    fn test_member_is_access_on_module_dict() {
        let node = Node::member("data", "size");
        match &node.kind {
            NodeKind::Access { container, key } => {
                assert!(matches!(&container.kind, NodeKind::Reference(n) if &**n == "data"));
                assert!(matches!(key.kind, NodeKind::Constant(_)));
            }
            other => panic!("expected access, got {:?}", other),
        }
    }
}
