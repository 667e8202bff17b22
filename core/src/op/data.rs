use std::sync::Arc;

use anyhow::Result;
use once_cell::sync::OnceCell;

use crate::ast::Node;
use crate::error::{ErrorKind, lang_error};
use crate::interp::{EvaluationContext, Stack};
use crate::typ::Type;
use crate::val::{DictValue, ListValue, Value};

use super::{BoxedOp, ExpressionOp, located};

#[derive(Debug)]
pub struct ConstantOp {
    node: Arc<Node>,
    value: Value,
}

impl ConstantOp {
    pub fn new(node: Arc<Node>, value: Value) -> Self {
        Self { node, value }
    }

    pub fn value(&self) -> &Value {
        &self.value
    }
}

impl ExpressionOp for ConstantOp {
    fn eval(&self, _: &mut Stack, _: &EvaluationContext) -> Result<Value> {
        Ok(self.value.clone())
    }

    fn is_constant(&self) -> bool {
        true
    }

    fn specialize(&self) -> BoxedOp {
        self.refresh()
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(ConstantOp::new(self.node.clone(), self.value.clone()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// Name lookup: locals, then the closure, then globals.
///
/// A global hit is cached together with the id of the context it came
/// from. User functions share their op tree across calls, so a call under
/// another context bypasses the cache and reads its own globals. The cache
/// lives until the op is refreshed.
#[derive(Debug)]
pub struct ReferenceOp {
    node: Arc<Node>,
    name: Arc<str>,
    global: OnceCell<(u64, Value)>,
}

impl ReferenceOp {
    pub fn new(node: Arc<Node>, name: Arc<str>) -> Self {
        Self {
            node,
            name,
            global: OnceCell::new(),
        }
    }

    pub fn name(&self) -> &str {
        &self.name
    }
}

impl ExpressionOp for ReferenceOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        if let Some(v) = stack.lookup(&self.name) {
            return Ok(v.clone());
        }
        if let Some((_, v)) = self.global.get().filter(|(owner, _)| *owner == context.id()) {
            return Ok(v.clone());
        }
        match context.global(&self.name) {
            Some(v) => {
                // first context to resolve the name owns the cache
                let _ = self.global.set((context.id(), v.clone()));
                Ok(v.clone())
            }
            None => Err(stack.error(
                ErrorKind::UnresolvedReference,
                format!("cannot resolve reference {}", self.name),
                self.node.source.as_ref(),
            )),
        }
    }

    fn is_constant(&self) -> bool {
        false
    }

    fn specialize(&self) -> BoxedOp {
        self.refresh()
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(ReferenceOp::new(self.node.clone(), self.name.clone()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

#[derive(Debug)]
pub struct ListOp {
    node: Arc<Node>,
    items: Vec<BoxedOp>,
}

impl ListOp {
    pub fn new(node: Arc<Node>, items: Vec<BoxedOp>) -> Self {
        Self { node, items }
    }
}

impl ExpressionOp for ListOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let items = self
            .items
            .iter()
            .map(|item| item.eval(stack, context))
            .collect::<Result<ListValue>>()?;
        Ok(Value::List(items))
    }

    fn is_constant(&self) -> bool {
        self.items.iter().all(|i| i.is_constant())
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(ListOp::new(self.node.clone(), self.items.iter().map(|i| i.specialize()).collect()))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(ListOp::new(self.node.clone(), self.items.iter().map(|i| i.refresh()).collect()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// Dict literal. Keys are cast to strings; a later duplicate key wins.
#[derive(Debug)]
pub struct DictOp {
    node: Arc<Node>,
    entries: Vec<(BoxedOp, BoxedOp)>,
}

impl DictOp {
    pub fn new(node: Arc<Node>, entries: Vec<(BoxedOp, BoxedOp)>) -> Self {
        Self { node, entries }
    }
}

impl ExpressionOp for DictOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let mut dict = DictValue::new();
        for (key_op, value_op) in &self.entries {
            let key = key_op.eval(stack, context)?;
            if key.is_nil() {
                return Err(stack.error(
                    ErrorKind::NilError,
                    "dict keys cannot be nil",
                    key_op.node().source.as_ref(),
                ));
            }
            let key = located(key.cast_to(Type::String), stack, key_op.node())?;
            let value = value_op.eval(stack, context)?;
            dict = dict.put(located(key.as_str(), stack, key_op.node())?, value);
        }
        Ok(Value::Dict(dict))
    }

    fn is_constant(&self) -> bool {
        self.entries.iter().all(|(k, v)| k.is_constant() && v.is_constant())
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(DictOp::new(
            self.node.clone(),
            self.entries.iter().map(|(k, v)| (k.specialize(), v.specialize())).collect(),
        ))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(DictOp::new(
            self.node.clone(),
            self.entries.iter().map(|(k, v)| (k.refresh(), v.refresh())).collect(),
        ))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// `xs[key]`. Missing entries read as nil.
#[derive(Debug)]
pub struct AccessOp {
    node: Arc<Node>,
    container: BoxedOp,
    key: BoxedOp,
}

impl AccessOp {
    pub fn new(node: Arc<Node>, container: BoxedOp, key: BoxedOp) -> Self {
        Self { node, container, key }
    }

    fn access(container: &Value, key: &Value) -> Result<Value> {
        if container.is_nil() || key.is_nil() {
            return Ok(Value::Nil);
        }
        match container {
            Value::List(list) => {
                let index = key.cast_to(Type::Long)?.as_long()?;
                Ok(list.get_at(index).cloned().unwrap_or_default())
            }
            Value::Dict(dict) => {
                let key = key.cast_to(Type::String)?;
                Ok(dict.get(key.as_str()?).cloned().unwrap_or_default())
            }
            other => Err(lang_error(
                ErrorKind::CastError,
                format!("cannot access {} with a key", other.type_name()),
            )),
        }
    }
}

impl ExpressionOp for AccessOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let container = self.container.eval(stack, context)?;
        let key = self.key.eval(stack, context)?;
        located(AccessOp::access(&container, &key), stack, &self.node)
    }

    fn is_constant(&self) -> bool {
        self.container.is_constant() && self.key.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(AccessOp::new(self.node.clone(), self.container.specialize(), self.key.specialize()))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(AccessOp::new(self.node.clone(), self.container.refresh(), self.key.refresh()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// `x as T`
#[derive(Debug)]
pub struct CastOp {
    node: Arc<Node>,
    expr: BoxedOp,
    target: Type,
}

impl CastOp {
    pub fn new(node: Arc<Node>, expr: BoxedOp, target: Type) -> Self {
        Self { node, expr, target }
    }
}

impl ExpressionOp for CastOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let v = self.expr.eval(stack, context)?;
        located(v.cast_to(self.target), stack, &self.node)
    }

    fn is_constant(&self) -> bool {
        self.expr.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(CastOp::new(self.node.clone(), self.expr.specialize(), self.target))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(CastOp::new(self.node.clone(), self.expr.refresh(), self.target))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// `x is T`; `x is any` holds for every non-nil value.
#[derive(Debug)]
pub struct IsOp {
    node: Arc<Node>,
    expr: BoxedOp,
    target: Type,
}

impl IsOp {
    pub fn new(node: Arc<Node>, expr: BoxedOp, target: Type) -> Self {
        Self { node, expr, target }
    }
}

impl ExpressionOp for IsOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let v = self.expr.eval(stack, context)?;
        Ok(Value::Boolean(match self.target {
            Type::Any => !v.is_nil(),
            ty => v.type_of() == ty,
        }))
    }

    fn is_constant(&self) -> bool {
        self.expr.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(IsOp::new(self.node.clone(), self.expr.specialize(), self.target))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(IsOp::new(self.node.clone(), self.expr.refresh(), self.target))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}

/// `a .. b`: string concatenation of both sides cast to strings.
#[derive(Debug)]
pub struct ConcatOp {
    node: Arc<Node>,
    left: BoxedOp,
    right: BoxedOp,
}

impl ConcatOp {
    pub fn new(node: Arc<Node>, left: BoxedOp, right: BoxedOp) -> Self {
        Self { node, left, right }
    }

    fn concat(l: &Value, r: &Value) -> Result<Value> {
        if l.is_nil() || r.is_nil() {
            return Ok(Value::Nil);
        }
        let l = l.cast_to(Type::String)?;
        let r = r.cast_to(Type::String)?;
        let (l, r) = (l.as_str()?, r.as_str()?);
        let mut out = String::with_capacity(l.len() + r.len());
        out.push_str(l);
        out.push_str(r);
        Ok(Value::from(out))
    }
}

impl ExpressionOp for ConcatOp {
    fn eval(&self, stack: &mut Stack, context: &EvaluationContext) -> Result<Value> {
        let l = self.left.eval(stack, context)?;
        let r = self.right.eval(stack, context)?;
        located(ConcatOp::concat(&l, &r), stack, &self.node)
    }

    fn is_constant(&self) -> bool {
        self.left.is_constant() && self.right.is_constant()
    }

    fn specialize(&self) -> BoxedOp {
        Box::new(ConcatOp::new(self.node.clone(), self.left.specialize(), self.right.specialize()))
    }

    fn refresh(&self) -> BoxedOp {
        Box::new(ConcatOp::new(self.node.clone(), self.left.refresh(), self.right.refresh()))
    }

    fn node(&self) -> &Arc<Node> {
        &self.node
    }
}
