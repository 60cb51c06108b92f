//! Ordered collections: List (duplicates, index-addressable) and Tuple
//! (fixed arity: insert/remove are reported errors, never silent no-ops).

use std::cell::Cell;
use std::fmt;

use crate::bag::Bag;
use crate::error::{Result, ValueError};
use crate::hashing;
use crate::set::Set;
use crate::value::Value;

// ============================================================================
// List
// ============================================================================

#[derive(Debug, Clone, Default)]
pub struct List {
    items: Vec<Value>,
    hash_memo: Cell<Option<u64>>,
}

impl List {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    pub fn add(&mut self, value: Value) {
        self.items.push(value);
        self.touch();
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Replace the element at `index`, returning the previous one. `None` if
    /// the index is out of bounds (the list is unchanged).
    pub fn replace(&mut self, index: usize, value: Value) -> Option<Value> {
        let slot = self.items.get_mut(index)?;
        let old = std::mem::replace(slot, value);
        self.touch();
        Some(old)
    }

    /// Insert at `index` (existing elements shift right). Returns false if
    /// `index > len`.
    pub fn insert(&mut self, index: usize, value: Value) -> bool {
        if index > self.items.len() {
            return false;
        }
        self.items.insert(index, value);
        self.touch();
        true
    }

    pub fn remove_at(&mut self, index: usize) -> Option<Value> {
        if index >= self.items.len() {
            return None;
        }
        let old = self.items.remove(index);
        self.touch();
        Some(old)
    }

    /// Remove the first occurrence of `value`.
    pub fn remove(&mut self, value: &Value) -> bool {
        match self.index_of(value) {
            Some(i) => {
                self.items.remove(i);
                self.touch();
                true
            }
            None => false,
        }
    }

    pub fn index_of(&self, value: &Value) -> Option<usize> {
        self.items.iter().position(|v| v == value)
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.index_of(value).is_some()
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    /// Sort in place by the total value order.
    pub fn sort(&mut self) {
        self.items.sort_by(Value::total_order);
        self.touch();
    }

    pub fn to_set(&self) -> Set {
        self.iter().cloned().collect()
    }

    pub fn to_bag(&self) -> Bag {
        self.iter().cloned().collect()
    }

    pub fn to_tuple(&self) -> Tuple {
        Tuple::from_values(self.items.clone())
    }

    /// Canonical hash: order-sensitive mix chain.
    pub fn value_hash(&self) -> u64 {
        if let Some(h) = self.hash_memo.get() {
            return h;
        }
        let mut acc = hashing::TAG_LIST;
        for v in self.iter() {
            acc = hashing::mix(acc, v.value_hash());
        }
        self.hash_memo.set(Some(acc));
        acc
    }

    fn touch(&mut self) {
        self.hash_memo.set(None);
    }
}

impl PartialEq for List {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for List {}

impl FromIterator<Value> for List {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self {
            items: iter.into_iter().collect(),
            hash_memo: Cell::new(None),
        }
    }
}

impl fmt::Display for List {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("[")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("]")
    }
}

// ============================================================================
// Tuple
// ============================================================================

/// Ordered fixed-arity sequence. Grows only through `add` during
/// construction; `insert` and `remove` are unsupported operations and report
/// failure without changing the tuple.
#[derive(Debug, Clone, Default)]
pub struct Tuple {
    items: Vec<Value>,
    hash_memo: Cell<Option<u64>>,
}

impl Tuple {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn from_values(items: Vec<Value>) -> Self {
        Self {
            items,
            hash_memo: Cell::new(None),
        }
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }

    /// Append a component. Legal: tuples are built left to right.
    pub fn add(&mut self, value: Value) {
        self.items.push(value);
        self.touch();
    }

    pub fn get(&self, index: usize) -> Option<&Value> {
        self.items.get(index)
    }

    /// Replace the component at `index`, returning the previous one.
    pub fn replace(&mut self, index: usize, value: Value) -> Option<Value> {
        let slot = self.items.get_mut(index)?;
        let old = std::mem::replace(slot, value);
        self.touch();
        Some(old)
    }

    /// Tuples have fixed arity: inserting is unsupported and leaves the
    /// tuple unchanged.
    pub fn insert(&mut self, _index: usize, _value: Value) -> Result<()> {
        Err(ValueError::UnsupportedOperation("insert into a tuple"))
    }

    /// Tuples have fixed arity: removing is unsupported and leaves the
    /// tuple unchanged.
    pub fn remove(&mut self, _index: usize) -> Result<()> {
        Err(ValueError::UnsupportedOperation("remove from a tuple"))
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.items.iter().any(|v| v == value)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.items.iter()
    }

    pub fn to_list(&self) -> List {
        self.iter().cloned().collect()
    }

    /// Canonical hash: the collection fold, as for Set/Bag/Record/Map.
    pub fn value_hash(&self) -> u64 {
        if let Some(h) = self.hash_memo.get() {
            return h;
        }
        let h = hashing::fold_elements(hashing::TAG_TUPLE, self.iter().map(Value::value_hash));
        self.hash_memo.set(Some(h));
        h
    }

    fn touch(&mut self) {
        self.hash_memo.set(None);
    }
}

impl PartialEq for Tuple {
    fn eq(&self, other: &Self) -> bool {
        self.items == other.items
    }
}

impl Eq for Tuple {}

impl FromIterator<Value> for Tuple {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        Self::from_values(iter.into_iter().collect())
    }
}

impl fmt::Display for Tuple {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("(")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str(")")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tuple_insert_and_remove_report_failure_and_leave_state() {
        let mut t = Tuple::from_values(vec![Value::from(1), Value::from(2)]);
        assert!(matches!(
            t.insert(0, Value::from(3)),
            Err(ValueError::UnsupportedOperation(_))
        ));
        assert!(matches!(
            t.remove(0),
            Err(ValueError::UnsupportedOperation(_))
        ));
        assert_eq!(t.len(), 2);
        assert_eq!(t.get(0), Some(&Value::from(1)));
        assert_eq!(t.get(1), Some(&Value::from(2)));
    }

    #[test]
    fn list_sort_uses_total_order() {
        let mut list: List = [3, 1, 2].into_iter().map(Value::from).collect();
        list.sort();
        let sorted: Vec<i32> = list.iter().map(|v| v.as_int().unwrap()).collect();
        assert_eq!(sorted, vec![1, 2, 3]);
    }
}
