use std::cmp::Ordering;
use std::sync::Arc;

use anyhow::Result;
use tracing::debug;
use twig_core::call::CallContext;
use twig_core::error::{ErrorKind, lang_error};
use twig_core::typ::Type;
use twig_core::util::fast_map::FastHashMap;
use twig_core::val::{DictValue, ListValue, Value, ValueKey};

use super::access::put_path;
use super::{Callback, DataModule, Reducer, accumulator_predicate, as_key, illegal, not_defined, param};

pub(super) fn register(module: &mut DataModule) {
    let list = || param("xs", Type::List);
    let any = || param("xs", Type::Any);
    let p = || param("p", Type::Function);
    let f = || param("f", Type::Function);

    module.define("find", vec![list(), p()], Type::Any, find);
    module.define("find_index", vec![list(), p()], Type::Long, find_index);
    module.define("find_last", vec![list(), p()], Type::Any, find_last);
    module.define("find_last_index", vec![list(), p()], Type::Long, find_last_index);
    module.define("any?", vec![list(), p()], Type::Boolean, any_match);
    module.define("all?", vec![list(), p()], Type::Boolean, all_match);
    module.define("none?", vec![list(), p()], Type::Boolean, none_match);

    module.define("filter", vec![any(), p()], Type::Any, filter);
    module.define("map", vec![any(), f()], Type::Any, map);
    module.define("reduce", vec![any(), param("init", Type::Any), f()], Type::Any, reduce);
    module.define("reduce_until", vec![any(), param("init", Type::Any), p(), f()], Type::Any, reduce_until);
    module.define("reduce_while", vec![any(), param("init", Type::Any), p(), f()], Type::Any, reduce_while);
    module.define("index_by", vec![any(), f()], Type::Dict, index_by);
    module.define("group_by", vec![any(), f()], Type::Dict, group_by);
    module.define("index_deep_by", vec![any(), f()], Type::Dict, index_deep_by);
    module.define("group_deep_by", vec![any(), f()], Type::Dict, group_deep_by);
    module.define("sort", vec![list(), f()], Type::List, sort);
}

/// Index of the first item passing `p`, scanning from the front or the back.
fn position(cx: &mut CallContext<'_>, xs: &ListValue, p: &Value, from_back: bool) -> Result<Option<usize>> {
    let predicate = Callback::new(cx, p, "predicate function")?;
    let len = xs.len();
    for step in 0..len {
        let i = if from_back { len - 1 - step } else { step };
        let Some(x) = xs.get(i) else { continue };
        if predicate.test(cx, x, || Value::from(i))? {
            return Ok(Some(i));
        }
    }
    Ok(None)
}

fn find_item(cx: &mut CallContext<'_>, args: &[Value], from_back: bool) -> Result<Value> {
    let (xs, p) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    Ok(position(cx, list, p, from_back)?
        .and_then(|i| list.get(i))
        .cloned()
        .unwrap_or_default())
}

fn find_slot(cx: &mut CallContext<'_>, args: &[Value], from_back: bool) -> Result<Value> {
    let (xs, p) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(position(cx, xs.as_list()?, p, from_back)?.map(Value::from).unwrap_or_default())
}

fn find(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    find_item(cx, args, false)
}

fn find_last(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    find_item(cx, args, true)
}

fn find_index(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    find_slot(cx, args, false)
}

fn find_last_index(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    find_slot(cx, args, true)
}

/// Whether any item's predicate result equals `expected`.
fn any_result(cx: &mut CallContext<'_>, args: &[Value], expected: bool) -> Result<Option<bool>> {
    let (xs, p) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(None);
    }
    let predicate = Callback::new(cx, p, "predicate function")?;
    for (i, x) in xs.as_list()?.iter().enumerate() {
        if predicate.test(cx, x, || Value::from(i))? == expected {
            return Ok(Some(true));
        }
    }
    Ok(Some(false))
}

fn any_match(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    Ok(any_result(cx, args, true)?.map(Value::Boolean).unwrap_or_default())
}

fn all_match(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    Ok(any_result(cx, args, false)?.map(|failed| Value::Boolean(!failed)).unwrap_or_default())
}

fn none_match(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    Ok(any_result(cx, args, true)?.map(|found| Value::Boolean(!found)).unwrap_or_default())
}

fn filter(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, p) = (&args[0], &args[1]);
    match xs {
        Value::Nil => Ok(Value::Nil),
        Value::List(list) => {
            let predicate = Callback::new(cx, p, "predicate function")?;
            let mut kept = Vec::new();
            for (i, x) in list.iter().enumerate() {
                if predicate.test(cx, x, || Value::from(i))? {
                    kept.push(x.clone());
                }
            }
            Ok(Value::List(ListValue::from(kept)))
        }
        Value::Dict(dict) => {
            let predicate = Callback::new(cx, p, "predicate function")?;
            let mut kept = dict.clone();
            for (k, x) in dict.iter() {
                if !predicate.test(cx, x, || Value::String(k.clone()))? {
                    kept = kept.delete(k);
                }
            }
            Ok(Value::Dict(kept))
        }
        _ => Err(not_defined("filter", xs)),
    }
}

fn map(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, f) = (&args[0], &args[1]);
    match xs {
        Value::Nil => Ok(Value::Nil),
        Value::List(list) => {
            let f = Callback::new(cx, f, "f")?;
            let mut mapped = Vec::with_capacity(list.len());
            for (i, x) in list.iter().enumerate() {
                mapped.push(f.call(cx, x, || Value::from(i))?);
            }
            Ok(Value::List(ListValue::from(mapped)))
        }
        Value::Dict(dict) => {
            let f = Callback::new(cx, f, "f")?;
            let mut mapped = DictValue::new();
            for (k, x) in dict.iter() {
                let v = f.call(cx, x, || Value::String(k.clone()))?;
                mapped = mapped.put(k.clone(), v);
            }
            Ok(Value::Dict(mapped))
        }
        _ => Err(not_defined("map", xs)),
    }
}

/// Items of a list or dict paired with their index or key.
fn keyed_items(function: &str, xs: &Value) -> Result<Vec<(Value, Value)>> {
    match xs {
        Value::List(list) => Ok(list.iter().enumerate().map(|(i, x)| (Value::from(i), x.clone())).collect()),
        Value::Dict(dict) => Ok(dict.iter().map(|(k, x)| (Value::String(k.clone()), x.clone())).collect()),
        _ => Err(not_defined(function, xs)),
    }
}

fn reduce(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, init, f) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let f = Reducer::new(cx, f)?;
    let mut acc = init.clone();
    for (key, x) in keyed_items("reduce", xs)? {
        acc = f.call(cx, acc, &x, || key)?;
    }
    Ok(acc)
}

fn reduce_until(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, init, p, f) = (&args[0], &args[1], &args[2], &args[3]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let f = Reducer::new(cx, f)?;
    let done = accumulator_predicate(cx, p)?;
    let items = keyed_items("reduce_until", xs)?;
    let mut acc = init.clone();
    if done.call(cx, acc.clone())?.truthy() {
        return Ok(acc);
    }
    for (key, x) in items {
        acc = f.call(cx, acc, &x, || key)?;
        if done.call(cx, acc.clone())?.truthy() {
            break;
        }
    }
    Ok(acc)
}

fn reduce_while(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, init, p, f) = (&args[0], &args[1], &args[2], &args[3]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let f = Reducer::new(cx, f)?;
    let keep_going = accumulator_predicate(cx, p)?;
    let items = keyed_items("reduce_while", xs)?;
    let mut acc = init.clone();
    for (key, x) in items {
        if !keep_going.call(cx, acc.clone())?.truthy() {
            break;
        }
        acc = f.call(cx, acc, &x, || key)?;
    }
    Ok(acc)
}

/// Items grouped under the string form of `f(x)`; items keyed nil are skipped.
fn keyed_by(cx: &mut CallContext<'_>, function: &str, xs: &Value, f: &Value) -> Result<Vec<(Arc<str>, Value)>> {
    let items = keyed_items(function, xs)?;
    let f = Callback::new(cx, f, "f")?;
    let mut keyed = Vec::with_capacity(items.len());
    for (index, x) in items {
        let key = f.call(cx, &x, || index)?;
        if let Some(k) = as_key(&key)? {
            keyed.push((k, x));
        }
    }
    Ok(keyed)
}

fn index_by(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, f) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::Dict(keyed_by(cx, "index_by", xs, f)?.into_iter().collect()))
}

fn group_by(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, f) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let mut groups: FastHashMap<Arc<str>, Vec<Value>> = FastHashMap::default();
    for (k, x) in keyed_by(cx, "group_by", xs, f)? {
        groups.entry(k).or_default().push(x);
    }
    Ok(Value::Dict(
        groups.into_iter().map(|(k, items)| (k, Value::List(ListValue::from(items)))).collect(),
    ))
}

fn path_error(detail: String) -> anyhow::Error {
    lang_error(
        ErrorKind::CastError,
        format!("indexing function must return a list of strings or nil, {}", detail),
    )
}

/// `path` with every key cast to a string.
fn key_path(path: &ListValue, x: &Value) -> Result<ListValue> {
    if path.is_empty() {
        return Err(illegal(format!("indexing function returned an empty key list for value: {}", x)));
    }
    path.iter()
        .map(|key| match as_key(key)? {
            Some(k) => Ok(Value::String(k)),
            None => Err(path_error(format!("got nil as part of key list {}", Value::List(path.clone())))),
        })
        .collect()
}

/// Items paired with the key path `f(x)`; items whose path is nil are skipped.
fn keyed_by_path(cx: &mut CallContext<'_>, function: &str, xs: &Value, f: &Value) -> Result<Vec<(ListValue, Value)>> {
    let items = keyed_items(function, xs)?;
    let f = Callback::new(cx, f, "f")?;
    let mut keyed = Vec::with_capacity(items.len());
    for (index, x) in items {
        match f.call(cx, &x, || index)? {
            Value::Nil => {}
            Value::List(path) => keyed.push((key_path(&path, &x)?, x)),
            other => return Err(path_error(format!("got: {} for value: {}", other, x))),
        }
    }
    Ok(keyed)
}

fn index_deep_by(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, f) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let mut index = Value::Dict(DictValue::new());
    for (path, x) in keyed_by_path(cx, "index_deep_by", xs, f)? {
        index = put_path(&index, &path, x)?;
    }
    Ok(index)
}

fn group_deep_by(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, f) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let mut groups: Vec<(ListValue, Vec<Value>)> = Vec::new();
    let mut slots: FastHashMap<ValueKey, usize> = FastHashMap::default();
    for (path, x) in keyed_by_path(cx, "group_deep_by", xs, f)? {
        let key = ValueKey(Value::List(path.clone()));
        let slot = *slots.entry(key).or_insert_with(|| {
            groups.push((path, Vec::new()));
            groups.len() - 1
        });
        groups[slot].1.push(x);
    }
    let mut grouped = Value::Dict(DictValue::new());
    for (path, items) in groups {
        grouped = put_path(&grouped, &path, Value::List(ListValue::from(items)))?;
    }
    Ok(grouped)
}

fn comparator_order(result: &Value) -> Result<Ordering> {
    match result {
        Value::Long(n) => Ok(n.cmp(&0)),
        Value::Double(d) if !d.is_nan() => Ok(d.partial_cmp(&0.0).unwrap_or(Ordering::Equal)),
        other => Err(illegal(format!(
            "comparator function must return a number, but returned {}",
            other
        ))),
    }
}

fn sort(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, f) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if f.is_nil() {
        debug!(target: "twig::data", "sort called with nil comparator");
        return Ok(Value::Nil);
    }
    let comparator = cx.arity2(f)?;
    let sorted = xs
        .as_list()?
        .sort_by(|a, b| comparator_order(&comparator.call(cx, a.clone(), b.clone())?))?;
    Ok(Value::List(sorted))
}
