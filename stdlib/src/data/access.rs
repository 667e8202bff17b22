use std::sync::Arc;

use anyhow::Result;
use twig_core::call::CallContext;
use twig_core::error::{ErrorKind, lang_error};
use twig_core::typ::Type;
use twig_core::val::{DictValue, ListValue, Value};

use super::{DataModule, as_index, as_key, illegal, not_defined, param, param_or};

pub(super) fn register(module: &mut DataModule) {
    let xs = || param("xs", Type::Any);
    let key = || param("key", Type::Any);
    let keys = || param("keys", Type::List);
    let not_found = || param_or("not_found", Type::Any, Value::Nil);

    module.define("get", vec![xs(), key(), not_found()], Type::Any, get);
    module.define("get_in", vec![xs(), keys(), not_found()], Type::Any, get_in);
    module.define("select", vec![xs(), keys(), not_found()], Type::Any, select);
    module.define("has?", vec![xs(), key()], Type::Boolean, has);
    module.define("contains?", vec![xs(), param("x", Type::Any)], Type::Boolean, contains);
    module.define("put", vec![xs(), key(), param("v", Type::Any)], Type::Any, put);
    module.define("put_in", vec![xs(), keys(), param("v", Type::Any)], Type::Any, put_in);
    module.define("update", vec![xs(), key(), param("f", Type::Function)], Type::Any, update);
    module.define("update_in", vec![xs(), keys(), param("f", Type::Function)], Type::Any, update_in);
    module.define("delete", vec![xs(), key()], Type::Any, delete);
    module.define(
        "insert",
        vec![param("xs", Type::List), param("i", Type::Long), param("v", Type::Any)],
        Type::List,
        insert,
    );
    module.define("keys", vec![xs()], Type::List, keys_of);
    module.define("values", vec![xs()], Type::List, values_of);
    module.define("entries", vec![param("xs", Type::Dict)], Type::List, entries);
    module.define("pluck", vec![xs(), key()], Type::Any, pluck);
    module.define("size", vec![xs()], Type::Long, size);
    module.define("empty?", vec![xs()], Type::Boolean, empty);
}

fn get(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, key, not_found) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() || key.is_nil() {
        return Ok(Value::Nil);
    }
    match xs {
        Value::Dict(dict) => Ok(match as_key(key)? {
            Some(k) => dict.get(&k).cloned().unwrap_or_else(|| not_found.clone()),
            None => not_found.clone(),
        }),
        Value::List(list) => Ok(match as_index(key)? {
            Some(i) => list.get_at(i).cloned().unwrap_or_else(|| not_found.clone()),
            None => not_found.clone(),
        }),
        _ => Err(not_defined("get", xs)),
    }
}

fn get_in(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, keys, not_found) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() || keys.is_nil() {
        return Ok(Value::Nil);
    }
    let mut current = xs.clone();
    for key in keys.as_list()? {
        let next = match &current {
            Value::Dict(dict) => match as_key(key)? {
                None => return Ok(Value::Nil),
                Some(k) => match dict.get(&k) {
                    Some(v) => v.clone(),
                    None => return Ok(not_found.clone()),
                },
            },
            Value::List(list) => match as_index(key)? {
                None => return Ok(Value::Nil),
                Some(i) => match list.get_at(i) {
                    Some(v) => v.clone(),
                    None => return Ok(not_found.clone()),
                },
            },
            other => return Err(not_defined("get_in", other)),
        };
        if next.is_nil() {
            return Ok(Value::Nil);
        }
        current = next;
    }
    Ok(current)
}

fn select(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, keys, not_found) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() || keys.is_nil() {
        return Ok(Value::Nil);
    }
    let keys = keys.as_list()?;
    let nil_key = || lang_error(ErrorKind::NilError, "cannot select nil key");
    match xs {
        Value::Dict(dict) => {
            let mut selected = DictValue::new();
            for key in keys {
                let k = as_key(key)?.ok_or_else(nil_key)?;
                let v = dict.get(&k).cloned().unwrap_or_else(|| not_found.clone());
                selected = selected.put(k, v);
            }
            Ok(Value::Dict(selected))
        }
        Value::List(list) => {
            let mut selected = Vec::with_capacity(keys.len());
            for key in keys {
                let i = as_index(key)?.ok_or_else(nil_key)?;
                selected.push(list.get_at(i).cloned().unwrap_or_else(|| not_found.clone()));
            }
            Ok(Value::List(ListValue::from(selected)))
        }
        _ => Err(not_defined("select", xs)),
    }
}

fn has(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, key) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if key.is_nil() {
        return Ok(Value::FALSE);
    }
    match xs {
        Value::Dict(dict) => Ok(Value::Boolean(as_key(key)?.is_some_and(|k| dict.contains_key(&k)))),
        Value::List(list) => Ok(Value::Boolean(as_index(key)?.is_some_and(|i| list.get_at(i).is_some()))),
        _ => Err(not_defined("has?", xs)),
    }
}

fn contains(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, x) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if !x.is_comparable() {
        return Ok(Value::FALSE);
    }
    match xs {
        Value::Dict(dict) => Ok(Value::Boolean(dict.values().any(|v| v == x))),
        Value::List(list) => Ok(Value::Boolean(list.iter().any(|v| v == x))),
        _ => Err(not_defined("contains?", xs)),
    }
}

fn put(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, key, v) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if key.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "cannot set nil key"));
    }
    match xs {
        Value::Dict(dict) => {
            let k = as_key(key)?.ok_or_else(|| lang_error(ErrorKind::NilError, "cannot set nil key"))?;
            Ok(Value::Dict(dict.put(k, v.clone())))
        }
        Value::List(list) => {
            let i = as_index(key)?.ok_or_else(|| lang_error(ErrorKind::NilError, "cannot set nil key"))?;
            Ok(Value::List(list.set(i, v.clone())?))
        }
        _ => Err(not_defined("put", xs)),
    }
}

fn update(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, key, f) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if key.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "cannot update nil key"));
    }
    if f.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "update function cannot be nil"));
    }
    match xs {
        Value::Dict(dict) => {
            let k = as_key(key)?.ok_or_else(|| lang_error(ErrorKind::NilError, "cannot update nil key"))?;
            let current = dict.get(&k).cloned().unwrap_or_default();
            let updated = cx.call(f, vec![current])?;
            Ok(Value::Dict(dict.put(k, updated)))
        }
        Value::List(list) => {
            let i = as_index(key)?.ok_or_else(|| lang_error(ErrorKind::NilError, "cannot update nil key"))?;
            if i < 0 {
                return Err(lang_error(ErrorKind::IndexOutOfBounds, format!("cannot update index {}", i)));
            }
            let current = list.get_at(i).cloned().unwrap_or_default();
            let updated = cx.call(f, vec![current])?;
            Ok(Value::List(list.set(i, updated)?))
        }
        _ => Err(not_defined("update", xs)),
    }
}

/// One level of a path walk: the container visited and the key taken out of it.
enum Step {
    Dict(DictValue, Arc<str>),
    List(ListValue, i64),
}

/// Walk `keys` down from `xs`, creating empty containers for nil
/// intermediates. Returns the visited containers and the value at the end
/// of the path.
fn descend(xs: &Value, keys: &ListValue) -> Result<(Vec<Step>, Value)> {
    let nil_key = || lang_error(ErrorKind::NilError, "nil keys not supported");
    let mut steps = Vec::with_capacity(keys.len());
    let mut current = xs.clone();
    for key in keys {
        if current.is_nil() {
            current = if key.is_long() {
                Value::List(ListValue::new())
            } else {
                Value::Dict(DictValue::new())
            };
        }
        current = match current {
            Value::Dict(dict) => {
                let k = as_key(key)?.ok_or_else(nil_key)?;
                let next = dict.get(&k).cloned().unwrap_or_default();
                steps.push(Step::Dict(dict, k));
                next
            }
            Value::List(list) => {
                let i = as_index(key)?.ok_or_else(nil_key)?;
                let next = list.get_at(i).cloned().unwrap_or_default();
                steps.push(Step::List(list, i));
                next
            }
            other => return Err(illegal(format!("cannot navigate into type {}", other.type_name()))),
        };
    }
    Ok((steps, current))
}

/// Put `value` at the bottom of the walk and rebuild every container on the
/// way back up.
fn stitch(steps: Vec<Step>, value: Value) -> Result<Value> {
    let mut value = value;
    for step in steps.into_iter().rev() {
        value = match step {
            Step::Dict(dict, k) => Value::Dict(dict.put(k, value)),
            Step::List(list, i) => Value::List(list.set(i, value)?),
        };
    }
    Ok(value)
}

/// `xs` with `value` stored at the end of `keys`, creating containers for
/// nil intermediates.
pub(super) fn put_path(xs: &Value, keys: &ListValue, value: Value) -> Result<Value> {
    let (steps, _) = descend(xs, keys)?;
    stitch(steps, value)
}

fn put_in(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, keys, v) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if keys.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "nil keys not supported"));
    }
    let keys = keys.as_list()?;
    if keys.is_empty() {
        return Ok(v.clone());
    }
    put_path(xs, keys, v.clone())
}

fn update_in(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, keys, f) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if keys.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "nil keys not supported"));
    }
    if f.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "f cannot be nil"));
    }
    let keys = keys.as_list()?;
    if keys.is_empty() {
        return cx.call(f, vec![xs.clone()]);
    }
    let (steps, current) = descend(xs, keys)?;
    let updated = cx.call(f, vec![current])?;
    stitch(steps, updated)
}

fn delete(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, key) = (&args[0], &args[1]);
    match xs {
        Value::Nil => Ok(Value::Nil),
        _ if key.is_nil() && (xs.is_dict() || xs.is_list()) => Ok(xs.clone()),
        Value::Dict(dict) => Ok(match as_key(key)? {
            Some(k) => Value::Dict(dict.delete(&k)),
            None => xs.clone(),
        }),
        Value::List(list) => Ok(match as_index(key)? {
            Some(i) => Value::List(list.delete(i)),
            None => xs.clone(),
        }),
        _ => Err(not_defined("delete", xs)),
    }
}

fn insert(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, i, v) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if i.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "cannot insert at nil index"));
    }
    Ok(Value::List(xs.as_list()?.insert(i.as_long()?, v.clone())?))
}

fn keys_of(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Dict(dict) => Ok(Value::List(dict.keys().map(|k| Value::String(k.clone())).collect())),
        Value::List(list) => Ok(Value::List((0..list.len()).map(Value::from).collect())),
        other => Err(not_defined("keys", other)),
    }
}

fn values_of(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::Dict(dict) => Ok(Value::List(dict.values().cloned().collect())),
        list @ Value::List(_) => Ok(list.clone()),
        other => Err(not_defined("values", other)),
    }
}

fn entries(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let xs = &args[0];
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let entries = xs
        .as_dict()?
        .iter()
        .map(|(k, v)| Value::dict([("key", Value::String(k.clone())), ("value", v.clone())]))
        .collect();
    Ok(Value::List(entries))
}

fn pluck_one(key: &Value, item: &Value) -> Result<Value> {
    match item {
        Value::Nil => Ok(Value::Nil),
        Value::List(list) => Ok(match as_index(key)? {
            Some(i) => list.get_at(i).cloned().unwrap_or_default(),
            None => Value::Nil,
        }),
        Value::Dict(dict) => Ok(match as_key(key)? {
            Some(k) => dict.get(&k).cloned().unwrap_or_default(),
            None => Value::Nil,
        }),
        other => Err(illegal(format!(
            "item must be a dict, list, or nil - cannot pluck key {} from item: {}",
            key, other
        ))),
    }
}

fn pluck(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, key) = (&args[0], &args[1]);
    if xs.is_nil() || key.is_nil() {
        return Ok(Value::Nil);
    }
    match xs {
        Value::Dict(dict) => {
            let mut plucked = DictValue::new();
            for (k, item) in dict.iter() {
                plucked = plucked.put(k.clone(), pluck_one(key, item)?);
            }
            Ok(Value::Dict(plucked))
        }
        Value::List(list) => Ok(Value::List(
            list.iter().map(|item| pluck_one(key, item)).collect::<Result<ListValue>>()?,
        )),
        _ => Err(not_defined("pluck", xs)),
    }
}

fn size(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::List(list) => Ok(Value::from(list.len())),
        Value::Dict(dict) => Ok(Value::from(dict.len())),
        other => Err(not_defined("size", other)),
    }
}

fn empty(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        Value::List(list) => Ok(Value::Boolean(list.is_empty())),
        Value::Dict(dict) => Ok(Value::Boolean(dict.is_empty())),
        other => Err(not_defined("empty?", other)),
    }
}
