use anyhow::Result;
use rand::rngs::StdRng;
use rand::seq::SliceRandom;
use rand::{Rng, SeedableRng};
use twig_core::call::CallContext;
use twig_core::error::{ErrorKind, lang_error};
use twig_core::typ::Type;
use twig_core::util::fast_map::stable_hash;
use twig_core::val::{ListValue, Value};

use super::{DataModule, param};

pub(super) fn register(module: &mut DataModule) {
    let xs = || param("xs", Type::List);
    let seed = || param("seed", Type::Any);

    module.define("shuffle", vec![xs(), seed()], Type::List, shuffle);
    module.define("choice", vec![xs(), seed()], Type::Any, choice);
    module.define(
        "sample",
        vec![xs(), param("count", Type::Long), param("with_return", Type::Boolean), seed()],
        Type::List,
        sample,
    );
}

/// Generator seeded from the hash of `seed`: equal seeds pick the same way.
fn seeded(seed: &Value) -> StdRng {
    StdRng::seed_from_u64(stable_hash(seed))
}

fn shuffle(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, seed) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    if list.len() < 2 {
        return Ok(xs.clone());
    }
    let mut items: Vec<Value> = list.iter().cloned().collect();
    items.shuffle(&mut seeded(seed));
    Ok(Value::List(ListValue::from(items)))
}

fn choice(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, seed) = (&args[0], &args[1]);
    if xs.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    if list.is_empty() {
        return Ok(Value::Nil);
    }
    let i = seeded(seed).gen_range(0..list.len());
    Ok(list.get(i).cloned().unwrap_or_default())
}

fn sample(_: &mut CallContext<'_>, args: &[Value]) -> Result<Value> {
    let (xs, count, with_return, seed) = (&args[0], &args[1], &args[2], &args[3]);
    if xs.is_nil() || count.is_nil() || with_return.is_nil() {
        return Ok(Value::Nil);
    }
    let list = xs.as_list()?;
    let count = count.as_long()?;
    if list.is_empty() || count <= 0 {
        return Ok(Value::List(ListValue::new()));
    }
    if count > i64::from(i32::MAX) {
        return Err(lang_error(ErrorKind::IndexOutOfBounds, format!("cannot sample {} items", count)));
    }
    let mut rng = seeded(seed);
    let picked: Vec<Value> = if with_return.truthy() {
        (0..count)
            .filter_map(|_| list.get(rng.gen_range(0..list.len())).cloned())
            .collect()
    } else {
        let mut indexes: Vec<usize> = (0..list.len()).collect();
        indexes.shuffle(&mut rng);
        indexes
            .into_iter()
            .take(count as usize)
            .filter_map(|i| list.get(i).cloned())
            .collect()
    };
    Ok(Value::List(ListValue::from(picked)))
}
