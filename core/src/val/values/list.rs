use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use anyhow::Result;
use im::Vector;

use crate::error::{ErrorKind, lang_error};

use super::Value;

/// Persistent list. Every mutator returns a new list; the receiver is never
/// changed. Nodes are shared between versions through `im::Vector`.
#[derive(Clone, Default)]
pub struct ListValue {
    items: Arc<Vector<Value>>,
}

impl ListValue {
    pub fn new() -> Self {
        Self::default()
    }

    fn wrap(items: Vector<Value>) -> Self {
        Self { items: Arc::new(items) }
    }

    #[inline]
    pub fn len(&self) -> usize {
        self.items.len()
    }

    #[inline]
    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    #[inline]
    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Lookup by a language-level index; negative indexes are absent.
    pub fn get_at(&self, index: i64) -> Option<&Value> {
        usize::try_from(index).ok().and_then(|i| self.items.get(i))
    }

    pub fn first(&self) -> Option<&Value> {
        self.items.front()
    }

    pub fn last(&self) -> Option<&Value> {
        self.items.back()
    }

    pub fn iter(&self) -> im::vector::Iter<'_, Value> {
        self.items.iter()
    }

    /// True when both handles refer to the same list instance.
    #[inline]
    pub fn ptr_eq(&self, other: &ListValue) -> bool {
        Arc::ptr_eq(&self.items, &other.items)
    }

    pub fn to_vec(&self) -> Vec<Value> {
        self.items.iter().cloned().collect()
    }

    pub fn append(&self, value: Value) -> ListValue {
        let mut items = (*self.items).clone();
        items.push_back(value);
        Self::wrap(items)
    }

    pub fn prepend(&self, value: Value) -> ListValue {
        let mut items = (*self.items).clone();
        items.push_front(value);
        Self::wrap(items)
    }

    fn checked_position(&self, index: i64) -> Result<usize> {
        match usize::try_from(index) {
            Ok(i) if i <= self.len() => Ok(i),
            _ => Err(lang_error(
                ErrorKind::IndexOutOfBounds,
                format!("index {} out of bounds for list of size {}", index, self.len()),
            )),
        }
    }

    /// Replace the item at `index`. `index == len` appends.
    pub fn set(&self, index: i64, value: Value) -> Result<ListValue> {
        let i = self.checked_position(index)?;
        if i == self.len() {
            return Ok(self.append(value));
        }
        Ok(Self::wrap(self.items.update(i, value)))
    }

    /// Insert before `index`, shifting the tail. `index == len` appends.
    pub fn insert(&self, index: i64, value: Value) -> Result<ListValue> {
        let i = self.checked_position(index)?;
        let mut items = (*self.items).clone();
        items.insert(i, value);
        Ok(Self::wrap(items))
    }

    /// Remove the item at `index`; an index outside the list returns the list itself.
    pub fn delete(&self, index: i64) -> ListValue {
        match usize::try_from(index) {
            Ok(i) if i < self.len() => {
                let mut items = (*self.items).clone();
                items.remove(i);
                Self::wrap(items)
            }
            _ => self.clone(),
        }
    }

    pub fn take(&self, n: i64) -> ListValue {
        if n <= 0 {
            return ListValue::new();
        }
        let n = n as usize;
        if n >= self.len() {
            return self.clone();
        }
        Self::wrap(self.items.take(n))
    }

    pub fn drop(&self, n: i64) -> ListValue {
        if n <= 0 {
            return self.clone();
        }
        let n = n as usize;
        if n >= self.len() {
            return ListValue::new();
        }
        Self::wrap(self.items.skip(n))
    }

    /// Items in `[start, end)`, clamped to the list. The full range returns
    /// this same instance.
    pub fn slice(&self, start: usize, end: usize) -> ListValue {
        let end = end.min(self.len());
        if start == 0 && end == self.len() {
            return self.clone();
        }
        if start >= end {
            return ListValue::new();
        }
        Self::wrap(self.items.skip(start).take(end - start))
    }

    pub fn reverse(&self) -> ListValue {
        self.items.iter().rev().cloned().collect()
    }

    pub fn concat(&self, other: &ListValue) -> ListValue {
        if other.is_empty() {
            return self.clone();
        }
        if self.is_empty() {
            return other.clone();
        }
        let mut items = (*self.items).clone();
        items.append((*other.items).clone());
        Self::wrap(items)
    }

    /// Stable sort with a fallible comparator. The first comparator error aborts the sort.
    pub fn sort_by<F>(&self, mut cmp: F) -> Result<ListValue>
    where
        F: FnMut(&Value, &Value) -> Result<Ordering>,
    {
        if self.len() < 2 {
            return Ok(self.clone());
        }
        let items = merge_sort(self.to_vec(), &mut cmp)?;
        Ok(items.into_iter().collect())
    }
}

/// Top-down merge sort. Unlike `slice::sort_by`, a comparator that is not a
/// total order cannot make this panic, and errors stop the sort early.
fn merge_sort<F>(mut items: Vec<Value>, cmp: &mut F) -> Result<Vec<Value>>
where
    F: FnMut(&Value, &Value) -> Result<Ordering>,
{
    if items.len() < 2 {
        return Ok(items);
    }
    let right = items.split_off(items.len() / 2);
    let left = merge_sort(items, cmp)?;
    let right = merge_sort(right, cmp)?;

    let mut merged = Vec::with_capacity(left.len() + right.len());
    let mut left = left.into_iter().peekable();
    let mut right = right.into_iter().peekable();
    while let (Some(l), Some(r)) = (left.peek(), right.peek()) {
        // ties keep the left item first
        let next = if cmp(l, r)? == Ordering::Greater {
            right.next()
        } else {
            left.next()
        };
        merged.extend(next);
    }
    merged.extend(left);
    merged.extend(right);
    Ok(merged)
}

impl FromIterator<Value> for ListValue {
    fn from_iter<I: IntoIterator<Item = Value>>(iter: I) -> Self {
        Self::wrap(iter.into_iter().collect())
    }
}

impl From<Vec<Value>> for ListValue {
    fn from(items: Vec<Value>) -> Self {
        items.into_iter().collect()
    }
}

impl<'a> IntoIterator for &'a ListValue {
    type Item = &'a Value;
    type IntoIter = im::vector::Iter<'a, Value>;

    fn into_iter(self) -> Self::IntoIter {
        self.iter()
    }
}

impl PartialEq for ListValue {
    fn eq(&self, other: &Self) -> bool {
        self.len() == other.len() && self.iter().zip(other.iter()).all(|(a, b)| a == b)
    }
}

impl Hash for ListValue {
    fn hash<H: Hasher>(&self, state: &mut H) {
        self.len().hash(state);
        for item in self.iter() {
            item.hash(state);
        }
    }
}

impl fmt::Debug for ListValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_list().entries(self.iter()).finish()
    }
}
