use anyhow::Result;
use twig_core::call::CallContext;
use twig_core::error::{ErrorKind, lang_error};
use twig_core::typ::Type;
use twig_core::util::fast_map::fast_hash_set_with_capacity;
use twig_core::val::{DictValue, ListValue, Value, ValueKey};

use super::{Callback, DataModule, as_key, illegal, param, param_or};

pub(super) fn register(module: &mut DataModule) {
    let xs = || param("xs", Type::List);
    let n = || param("n", Type::Long);
    let p = || param("p", Type::Function);

    module.define("append", vec![xs(), param("x", Type::Any)], Type::List, append);
    module.define("prepend", vec![param("x", Type::Any), xs()], Type::List, prepend);
    module.define("concat", vec![param("lists", Type::List)], Type::List, concat);
    module.define("merge", vec![param("dicts", Type::List)], Type::Dict, merge);
    module.define("omit", vec![param("xs", Type::Dict), param("keys", Type::List)], Type::Dict, omit);
    module.define("repeat", vec![n(), param("x", Type::Any)], Type::List, repeat);
    module.define("range", vec![param("start", Type::Long), param("end", Type::Long)], Type::List, range);

    module.define("take", vec![n(), xs()], Type::List, take);
    module.define("drop", vec![n(), xs()], Type::List, drop);
    module.define("take_while", vec![p(), xs()], Type::List, take_while);
    module.define("take_until", vec![p(), xs()], Type::List, take_until);
    module.define("drop_while", vec![p(), xs()], Type::List, drop_while);
    module.define("drop_until", vec![p(), xs()], Type::List, drop_until);

    module.define("init", vec![xs()], Type::List, init);
    module.define("head", vec![xs()], Type::Any, head);
    module.define("last", vec![xs()], Type::Any, last);
    module.define("tail", vec![xs()], Type::List, tail);
    module.define("reverse", vec![xs()], Type::List, reverse);
    module.define(
        "slice",
        vec![
            xs(),
            param_or("start", Type::Long, Value::Long(0)),
            param_or("end", Type::Long, Value::Nil),
        ],
        Type::List,
        slice,
    );

    module.define(
        "index_of",
        vec![xs(), param("x", Type::Any), param_or("start", Type::Long, Value::Long(0))],
        Type::Long,
        index_of,
    );
    module.define(
        "last_index_of",
        vec![xs(), param("x", Type::Any), param_or("end", Type::Long, Value::Nil)],
        Type::Long,
        last_index_of,
    );
    module.define("key_of", vec![param("xs", Type::Dict), param("x", Type::Any)], Type::String, key_of);
    module.define("unique", vec![xs()], Type::List, unique);
}

fn append(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        xs => Ok(Value::List(xs.as_list()?.append(args[1].clone()))),
    }
}

fn prepend(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    match &args[1] {
        Value::Nil => Ok(Value::Nil),
        xs => Ok(Value::List(xs.as_list()?.prepend(args[0].clone()))),
    }
}

fn concat(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let lists = &args[0];
    if lists.is_nil() {
        return Ok(Value::Nil);
    }
    let mut joined = ListValue::new();
    for list in lists.as_list()? {
        match list {
            Value::List(items) => joined = joined.concat(items),
            Value::Nil => return Ok(Value::Nil),
            other => return Err(illegal(format!("cannot concat type {}", other.type_name()))),
        }
    }
    Ok(Value::List(joined))
}

fn merge(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let dicts = &args[0];
    if dicts.is_nil() {
        return Ok(Value::Nil);
    }
    let mut merged = DictValue::new();
    for dict in dicts.as_list()? {
        match dict {
            Value::Dict(entries) => merged = merged.merge(entries),
            Value::Nil => return Ok(Value::Nil),
            other => return Err(illegal(format!("cannot merge type {}", other.type_name()))),
        }
    }
    Ok(Value::Dict(merged))
}

fn omit(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, keys) = (&args[0], &args[1]);
    if xs.is_nil() || keys.is_nil() {
        return Ok(Value::Nil);
    }
    let dict = xs.as_dict()?;
    let mut kept = dict.clone();
    for key in keys.as_list()? {
        if let Some(k) = as_key(key)? {
            kept = kept.delete(&k);
        }
    }
    Ok(Value::Dict(kept))
}

fn repeat(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (n, x) = (&args[0], &args[1]);
    if n.is_nil() {
        return Ok(Value::Nil);
    }
    let times = n.as_long()?;
    if !(0..=i64::from(i32::MAX)).contains(&times) {
        return Err(lang_error(ErrorKind::IndexOutOfBounds, format!("cannot repeat {} times", times)));
    }
    Ok(Value::List(std::iter::repeat_n(x.clone(), times as usize).collect()))
}

fn range(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (start, end) = (&args[0], &args[1]);
    if start.is_nil() || end.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::List((start.as_long()?..=end.as_long()?).map(Value::Long).collect()))
}

fn take(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (n, xs) = (&args[0], &args[1]);
    if n.is_nil() || xs.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::List(xs.as_list()?.take(n.as_long()?)))
}

fn drop(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (n, xs) = (&args[0], &args[1]);
    if n.is_nil() || xs.is_nil() {
        return Ok(Value::Nil);
    }
    Ok(Value::List(xs.as_list()?.drop(n.as_long()?)))
}

/// Length of the leading run of items whose predicate result equals `expected`.
fn leading_run(cx: &mut CallContext<'_>, p: &Value, list: &ListValue, expected: bool) -> Result<usize> {
    let predicate = Callback::new(cx, p, "predicate function")?;
    for (i, x) in list.iter().enumerate() {
        if predicate.test(cx, x, || Value::from(i))? != expected {
            return Ok(i);
        }
    }
    Ok(list.len())
}

fn take_run(cx: &mut CallContext<'_>, args: &[Value], expected: bool) -> Result<Value> {
    let (p, xs) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    let n = leading_run(cx, p, list, expected)?;
    Ok(Value::List(list.take(n as i64)))
}

fn drop_run(cx: &mut CallContext<'_>, args: &[Value], expected: bool) -> Result<Value> {
    let (p, xs) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    let n = leading_run(cx, p, list, expected)?;
    Ok(Value::List(list.drop(n as i64)))
}

fn take_while(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    take_run(cx, args, true)
}

fn take_until(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    take_run(cx, args, false)
}

fn drop_while(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    drop_run(cx, args, true)
}

fn drop_until(cx: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    drop_run(cx, args, false)
}

fn non_empty(xs: &Value) -> Result<Option<&ListValue>> {
    if xs.is_nil() {
        return Ok(None);
    }
    let list = xs.as_list()?;
    if list.is_empty() {
        return Err(illegal("list must not be empty"));
    }
    Ok(Some(list))
}

fn init(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    Ok(match non_empty(&args[0])? {
        Some(list) => Value::List(list.take(list.len() as i64 - 1)),
        None => Value::Nil,
    })
}

fn head(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    Ok(non_empty(&args[0])?.and_then(ListValue::first).cloned().unwrap_or_default())
}

fn last(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    Ok(non_empty(&args[0])?.and_then(ListValue::last).cloned().unwrap_or_default())
}

fn tail(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    Ok(match non_empty(&args[0])? {
        Some(list) => Value::List(list.drop(1)),
        None => Value::Nil,
    })
}

fn reverse(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    match &args[0] {
        Value::Nil => Ok(Value::Nil),
        xs => Ok(Value::List(xs.as_list()?.reverse())),
    }
}

fn slice(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, start, end) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    if start.is_nil() {
        return Err(lang_error(ErrorKind::NilError, "cannot slice starting at nil"));
    }
    let start = start.as_long()?;
    if start < 0 {
        return Err(lang_error(
            ErrorKind::IndexOutOfBounds,
            format!("cannot slice starting at: {}", start),
        ));
    }
    let list = xs.as_list()?;
    let end = if end.is_nil() { list.len() as i64 } else { end.as_long()? };
    if end <= start {
        return Ok(Value::List(ListValue::new()));
    }
    // both bounds are non-negative here; slice clamps them to the list
    Ok(Value::List(list.slice(start as usize, end as usize)))
}

fn index_of(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, x, start) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() || start.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    if !x.is_comparable() {
        return Ok(Value::Long(-1));
    }
    let start = start.as_long()?.max(0) as usize;
    let found = list.iter().enumerate().skip(start).find(|(_, v)| *v == x).map(|(i, _)| i as i64);
    Ok(Value::Long(found.unwrap_or(-1)))
}

fn last_index_of(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, x, end) = (&args[0], &args[1], &args[2]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    if list.is_empty() || !x.is_comparable() {
        return Ok(Value::Long(-1));
    }
    let last = list.len() - 1;
    let end = if end.is_nil() {
        last
    } else {
        match end.as_long()? {
            e if e < 0 => return Ok(Value::Long(-1)),
            e => (e as usize).min(last),
        }
    };
    let found = (0..=end).rev().find(|&i| list.get(i) == Some(x)).map(|i| i as i64);
    Ok(Value::Long(found.unwrap_or(-1)))
}

fn key_of(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, x) = (&args[0], &args[1]);
    if xs.is_nil() || !x.is_comparable() {
        return Ok(Value::Nil);
    }
    Ok(xs
        .as_dict()?
        .iter()
        .find(|(_, v)| *v == x)
        .map(|(k, _)| Value::String(k.clone()))
        .unwrap_or_default())
}

fn unique(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let xs = &args[0];
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    if list.len() < 2 {
        return Ok(xs.clone());
    }
    let mut seen = fast_hash_set_with_capacity(list.len());
    let kept: ListValue = list
        .iter()
        .filter(|v| !v.is_comparable() || seen.insert(ValueKey((*v).clone())))
        .cloned()
        .collect();
    Ok(Value::List(kept))
}
