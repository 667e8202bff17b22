//! Syntax tree as handed over by a parser.
//!
//! Nodes carry the statically inferred value type the op layer specializes
//! on, and an optional source position that only feeds error reports.

use std::sync::Arc;

use crate::error::SourceInfo;
use crate::op::BinaryOperator;
use crate::typ::Type;
use crate::val::Value;

#[cfg(test)]
mod ast_test;

#[derive(Debug, Clone)]
pub struct Node {
    pub kind: NodeKind,
    pub value_type: Type,
    pub source: Option<SourceInfo>,
}

#[derive(Debug, Clone)]
pub enum NodeKind {
    Constant(Value),
    Reference(Arc<str>),
    Binary {
        op: BinaryOperator,
        left: Arc<Node>,
        right: Arc<Node>,
    },
    StringConcat {
        left: Arc<Node>,
        right: Arc<Node>,
    },
    And {
        left: Arc<Node>,
        right: Arc<Node>,
    },
    Or {
        left: Arc<Node>,
        right: Arc<Node>,
    },
    Not(Arc<Node>),
    Negate(Arc<Node>),
    If {
        condition: Arc<Node>,
        then_branch: Arc<Node>,
        else_branch: Arc<Node>,
    },
    Let {
        bindings: Vec<Binding>,
        body: Arc<Node>,
    },
    Match {
        subject: Arc<Node>,
        arms: Vec<MatchArm>,
    },
    Call {
        callee: Arc<Node>,
        args: Vec<Argument>,
    },
    Curry {
        callee: Arc<Node>,
        args: Vec<(Arc<str>, Arc<Node>)>,
    },
    Function(Arc<FunctionDef>),
    List(Vec<Arc<Node>>),
    Dict(Vec<(Arc<Node>, Arc<Node>)>),
    Access {
        container: Arc<Node>,
        key: Arc<Node>,
    },
    Cast {
        expr: Arc<Node>,
        target: Type,
    },
    Is {
        expr: Arc<Node>,
        target: Type,
    },
}

#[derive(Debug, Clone)]
pub enum Argument {
    Positional(Arc<Node>),
    Named(Arc<str>, Arc<Node>),
}

#[derive(Debug, Clone)]
pub struct ParamDef {
    pub name: Arc<str>,
    pub declared_type: Type,
    pub default: Option<Value>,
}

impl ParamDef {
    pub fn new(name: impl Into<Arc<str>>, declared_type: Type) -> Self {
        Self {
            name: name.into(),
            declared_type,
            default: None,
        }
    }

    pub fn with_default(mut self, default: impl Into<Value>) -> Self {
        self.default = Some(default.into());
        self
    }
}

#[derive(Debug, Clone)]
pub struct FunctionDef {
    /// Name the body can call itself by.
    pub name: Option<Arc<str>>,
    pub params: Vec<ParamDef>,
    pub return_type: Type,
    pub body: Arc<Node>,
}

#[derive(Debug, Clone)]
pub enum BindTarget {
    Name(Arc<str>),
    Pattern(PatternNode),
}

#[derive(Debug, Clone)]
pub struct Binding {
    pub target: BindTarget,
    pub value: Arc<Node>,
}

impl Binding {
    /// `name = value`. An anonymous function literal takes `name` as its
    /// self name, so it can recurse.
    pub fn name(name: impl Into<Arc<str>>, value: Arc<Node>) -> Self {
        let name = name.into();
        let value = match &value.kind {
            NodeKind::Function(def) if def.name.is_none() => {
                let mut def = (**def).clone();
                def.name = Some(name.clone());
                Arc::new(Node {
                    kind: NodeKind::Function(Arc::new(def)),
                    value_type: value.value_type,
                    source: value.source.clone(),
                })
            }
            _ => value,
        };
        Self {
            target: BindTarget::Name(name),
            value,
        }
    }

    /// Destructuring bind; fails at runtime when the pattern does not match.
    pub fn pattern(pattern: PatternNode, value: Arc<Node>) -> Self {
        Self {
            target: BindTarget::Pattern(pattern),
            value,
        }
    }
}

#[derive(Debug, Clone)]
pub struct MatchArm {
    pub pattern: PatternNode,
    pub body: Arc<Node>,
}

impl MatchArm {
    pub fn new(pattern: PatternNode, body: Arc<Node>) -> Self {
        Self { pattern, body }
    }
}

/// Rest marker of an open list or dict pattern, optionally capturing the rest.
pub type RestCapture = Option<Option<Arc<str>>>;

#[derive(Debug, Clone)]
pub enum PatternNode {
    /// `x`, or `_` when unnamed.
    Capture(Option<Arc<str>>),
    Value(Value),
    DataType {
        declared_type: Type,
        capture: Option<Arc<str>>,
    },
    List {
        items: Vec<PatternNode>,
        rest: RestCapture,
    },
    Dict {
        entries: Vec<(Arc<str>, PatternNode)>,
        rest: RestCapture,
    },
    Guard {
        pattern: Box<PatternNode>,
        guard: Arc<Node>,
    },
}

impl PatternNode {
    pub fn capture(name: impl Into<Arc<str>>) -> Self {
        PatternNode::Capture(Some(name.into()))
    }

    pub fn wildcard() -> Self {
        PatternNode::Capture(None)
    }

    pub fn value(value: impl Into<Value>) -> Self {
        PatternNode::Value(value.into())
    }

    pub fn data_type(declared_type: Type, capture: Option<&str>) -> Self {
        PatternNode::DataType {
            declared_type,
            capture: capture.map(Arc::from),
        }
    }

    /// Exact-length list pattern.
    pub fn list(items: Vec<PatternNode>) -> Self {
        PatternNode::List { items, rest: None }
    }

    /// `[a, b, ...rest]`
    pub fn list_open(items: Vec<PatternNode>, rest: Option<&str>) -> Self {
        PatternNode::List {
            items,
            rest: Some(rest.map(Arc::from)),
        }
    }

    /// Dict pattern requiring exactly `entries`' keys.
    pub fn dict(entries: Vec<(&str, PatternNode)>) -> Self {
        PatternNode::Dict {
            entries: entries.into_iter().map(|(k, p)| (Arc::from(k), p)).collect(),
            rest: None,
        }
    }

    /// `{:a x, ...rest}`
    pub fn dict_open(entries: Vec<(&str, PatternNode)>, rest: Option<&str>) -> Self {
        PatternNode::Dict {
            entries: entries.into_iter().map(|(k, p)| (Arc::from(k), p)).collect(),
            rest: Some(rest.map(Arc::from)),
        }
    }

    pub fn guard(pattern: PatternNode, guard: Arc<Node>) -> Self {
        PatternNode::Guard {
            pattern: Box::new(pattern),
            guard,
        }
    }
}

impl Node {
    fn new(kind: NodeKind, value_type: Type) -> Arc<Node> {
        Arc::new(Node {
            kind,
            value_type,
            source: None,
        })
    }

    /// Attach a source position.
    pub fn at(self: Arc<Self>, source: SourceInfo) -> Arc<Node> {
        let mut node = Arc::unwrap_or_clone(self);
        node.source = Some(source);
        Arc::new(node)
    }

    pub fn constant(value: impl Into<Value>) -> Arc<Node> {
        let value = value.into();
        let ty = value.type_of();
        Node::new(NodeKind::Constant(value), ty)
    }

    pub fn nil() -> Arc<Node> {
        Node::constant(Value::Nil)
    }

    pub fn reference(name: impl Into<Arc<str>>, declared_type: Type) -> Arc<Node> {
        Node::new(NodeKind::Reference(name.into()), declared_type)
    }

    pub fn binary(op: BinaryOperator, left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
        let ty = op.result_type(left.value_type, right.value_type);
        Node::new(NodeKind::Binary { op, left, right }, ty)
    }

    pub fn concat(left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
        Node::new(NodeKind::StringConcat { left, right }, Type::String)
    }

    pub fn and(left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
        Node::new(NodeKind::And { left, right }, Type::Boolean)
    }

    pub fn or(left: Arc<Node>, right: Arc<Node>) -> Arc<Node> {
        Node::new(NodeKind::Or { left, right }, Type::Boolean)
    }

    pub fn not(operand: Arc<Node>) -> Arc<Node> {
        Node::new(NodeKind::Not(operand), Type::Boolean)
    }

    pub fn negate(operand: Arc<Node>) -> Arc<Node> {
        let ty = if operand.value_type.is_numeric() {
            operand.value_type
        } else {
            Type::Any
        };
        Node::new(NodeKind::Negate(operand), ty)
    }

    pub fn if_(condition: Arc<Node>, then_branch: Arc<Node>, else_branch: Arc<Node>) -> Arc<Node> {
        let ty = common_type(then_branch.value_type, else_branch.value_type);
        Node::new(
            NodeKind::If {
                condition,
                then_branch,
                else_branch,
            },
            ty,
        )
    }

    pub fn let_(bindings: Vec<Binding>, body: Arc<Node>) -> Arc<Node> {
        let ty = body.value_type;
        Node::new(NodeKind::Let { bindings, body }, ty)
    }

    pub fn match_(subject: Arc<Node>, arms: Vec<MatchArm>) -> Arc<Node> {
        // no arm matching yields nil, so arm types only survive when all agree
        let ty = arms
            .iter()
            .map(|arm| arm.body.value_type)
            .reduce(common_type)
            .unwrap_or(Type::Nil);
        Node::new(NodeKind::Match { subject, arms }, ty)
    }

    /// Positional call.
    pub fn call(callee: Arc<Node>, args: Vec<Arc<Node>>) -> Arc<Node> {
        Node::call_with(callee, args.into_iter().map(Argument::Positional).collect())
    }

    pub fn call_with(callee: Arc<Node>, args: Vec<Argument>) -> Arc<Node> {
        Node::new(NodeKind::Call { callee, args }, Type::Any)
    }

    pub fn curry(callee: Arc<Node>, args: Vec<(&str, Arc<Node>)>) -> Arc<Node> {
        let args = args.into_iter().map(|(name, node)| (Arc::from(name), node)).collect();
        Node::new(NodeKind::Curry { callee, args }, Type::Any)
    }

    pub fn function(params: Vec<ParamDef>, return_type: Type, body: Arc<Node>) -> Arc<Node> {
        Node::new(
            NodeKind::Function(Arc::new(FunctionDef {
                name: None,
                params,
                return_type,
                body,
            })),
            Type::Function,
        )
    }

    pub fn list(items: Vec<Arc<Node>>) -> Arc<Node> {
        Node::new(NodeKind::List(items), Type::List)
    }

    pub fn dict(entries: Vec<(Arc<Node>, Arc<Node>)>) -> Arc<Node> {
        Node::new(NodeKind::Dict(entries), Type::Dict)
    }

    pub fn access(container: Arc<Node>, key: Arc<Node>) -> Arc<Node> {
        Node::new(NodeKind::Access { container, key }, Type::Any)
    }

    /// `module.name`: access into the global dict a module is exposed as.
    pub fn member(module: &str, name: &str) -> Arc<Node> {
        Node::access(Node::reference(module, Type::Dict), Node::constant(name))
    }

    pub fn cast(expr: Arc<Node>, target: Type) -> Arc<Node> {
        Node::new(NodeKind::Cast { expr, target }, target)
    }

    pub fn is(expr: Arc<Node>, target: Type) -> Arc<Node> {
        Node::new(NodeKind::Is { expr, target }, Type::Boolean)
    }
}

fn common_type(a: Type, b: Type) -> Type {
    if a == b { a } else { Type::Any }
}
