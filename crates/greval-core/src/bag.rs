//! Multiset of values: each distinct element carries a positive count.
//!
//! `size()` is the sum of counts, `element_count()` the number of distinct
//! elements. Shares the generation-counter cursor contract with [`Set`].
//!
//! [`Set`]: crate::set::Set

use std::cell::Cell;
use std::fmt;
use std::iter;

use indexmap::IndexMap;

use crate::error::{Result, ValueError};
use crate::hashing;
use crate::list::List;
use crate::set::Set;
use crate::value::Value;

#[derive(Debug, Clone, Default)]
pub struct Bag {
    counts: IndexMap<Value, usize, ahash::RandomState>,
    total: usize,
    generation: u64,
    hash_memo: Cell<Option<u64>>,
}

impl Bag {
    pub fn new() -> Self {
        Self::default()
    }

    /// Sum of all counts.
    pub fn size(&self) -> usize {
        self.total
    }

    /// Number of distinct elements.
    pub fn element_count(&self) -> usize {
        self.counts.len()
    }

    pub fn is_empty(&self) -> bool {
        self.total == 0
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.counts.contains_key(value)
    }

    pub fn quantity(&self, value: &Value) -> usize {
        self.counts.get(value).copied().unwrap_or(0)
    }

    pub fn add(&mut self, value: Value) {
        self.add_n(value, 1);
    }

    /// Add `n` occurrences. Adding zero occurrences is a no-op.
    pub fn add_n(&mut self, value: Value, n: usize) {
        if n == 0 {
            return;
        }
        *self.counts.entry(value).or_insert(0) += n;
        self.total += n;
        self.touch();
    }

    /// Remove one occurrence. Returns false if the element was absent.
    pub fn remove_one(&mut self, value: &Value) -> bool {
        match self.counts.get_mut(value) {
            Some(count) if *count > 1 => {
                *count -= 1;
                self.total -= 1;
                self.touch();
                true
            }
            Some(_) => {
                self.counts.shift_remove(value);
                self.total -= 1;
                self.touch();
                true
            }
            None => false,
        }
    }

    /// Remove every occurrence, returning how many there were.
    pub fn remove_all(&mut self, value: &Value) -> usize {
        match self.counts.shift_remove(value) {
            Some(count) => {
                self.total -= count;
                self.touch();
                count
            }
            None => 0,
        }
    }

    pub fn clear(&mut self) {
        if self.total > 0 {
            self.counts.clear();
            self.total = 0;
            self.touch();
        }
    }

    /// Iterate over `(element, count)` pairs.
    pub fn iter(&self) -> impl Iterator<Item = (&Value, usize)> {
        self.counts.iter().map(|(v, &c)| (v, c))
    }

    /// Detached fail-fast cursor yielding every element `count` times.
    pub fn cursor(&self) -> BagCursor {
        BagCursor {
            generation: self.generation,
            index: 0,
            yielded_of_current: 0,
        }
    }

    // ------------------------------------------------------------------
    // Multiset algebra
    // ------------------------------------------------------------------

    /// Per-element quantity = max(self, other).
    pub fn union(&self, other: &Bag) -> Bag {
        let mut out = Bag::new();
        for (v, c) in self.iter() {
            out.add_n(v.clone(), c.max(other.quantity(v)));
        }
        for (v, c) in other.iter() {
            if !self.contains(v) {
                out.add_n(v.clone(), c);
            }
        }
        out
    }

    /// True multiset addition: per-element quantity = self + other.
    pub fn sum(&self, other: &Bag) -> Bag {
        let mut out = self.clone();
        for (v, c) in other.iter() {
            out.add_n(v.clone(), c);
        }
        out
    }

    /// Per-element quantity = min(self, other).
    pub fn intersection(&self, other: &Bag) -> Bag {
        let mut out = Bag::new();
        for (v, c) in self.iter() {
            let q = c.min(other.quantity(v));
            if q > 0 {
                out.add_n(v.clone(), q);
            }
        }
        out
    }

    /// Per-element quantity = |self − other|, over elements present in
    /// *either* operand.
    ///
    /// Note: despite the name this is not one-sided subtraction; it is the
    /// symmetric magnitude of the quantity delta. Callers rely on this exact
    /// shape, so it stays.
    pub fn difference(&self, other: &Bag) -> Bag {
        let mut out = Bag::new();
        for (v, c) in self.iter() {
            let d = c.abs_diff(other.quantity(v));
            if d > 0 {
                out.add_n(v.clone(), d);
            }
        }
        for (v, c) in other.iter() {
            if !self.contains(v) {
                out.add_n(v.clone(), c);
            }
        }
        out
    }

    /// Subset under multiset order: every quantity here is <= the other's.
    pub fn is_subset(&self, other: &Bag) -> bool {
        self.iter().all(|(v, c)| c <= other.quantity(v))
    }

    pub fn is_superset(&self, other: &Bag) -> bool {
        other.is_subset(self)
    }

    pub fn is_disjoint(&self, other: &Bag) -> bool {
        self.iter().all(|(v, _)| !other.contains(v))
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    pub fn to_set(&self) -> Set {
        self.iter().map(|(v, _)| v.clone()).collect()
    }

    pub fn to_list(&self) -> List {
        let mut list = List::new();
        for (v, c) in self.iter() {
            for _ in 0..c {
                list.add(v.clone());
            }
        }
        list
    }

    /// Canonical hash: each element's hash folded once per occurrence.
    pub fn value_hash(&self) -> u64 {
        if let Some(h) = self.hash_memo.get() {
            return h;
        }
        let h = hashing::fold_elements(
            hashing::TAG_BAG,
            self.iter()
                .flat_map(|(v, c)| iter::repeat(v.value_hash()).take(c)),
        );
        self.hash_memo.set(Some(h));
        h
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn get_index(&self, index: usize) -> Option<(&Value, usize)> {
        self.counts.get_index(index).map(|(v, &c)| (v, c))
    }

    fn touch(&mut self) {
        self.generation += 1;
        self.hash_memo.set(None);
    }
}

impl PartialEq for Bag {
    fn eq(&self, other: &Self) -> bool {
        self.counts == other.counts
    }
}

impl Eq for Bag {}

impl FromIterator<Value> for Bag {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let mut bag = Bag::new();
        for v in iter {
            bag.add(v);
        }
        bag
    }
}

impl fmt::Display for Bag {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        let mut first = true;
        for (v, c) in self.iter() {
            for _ in 0..c {
                if !first {
                    f.write_str(", ")?;
                }
                first = false;
                write!(f, "{v}")?;
            }
        }
        f.write_str("}")
    }
}

/// Detached cursor over a [`Bag`]; yields each element once per occurrence.
#[derive(Debug, Clone)]
pub struct BagCursor {
    generation: u64,
    index: usize,
    yielded_of_current: usize,
}

impl BagCursor {
    pub fn next<'a>(&mut self, bag: &'a Bag) -> Result<Option<&'a Value>> {
        if self.generation != bag.generation() {
            return Err(ValueError::ConcurrentModification);
        }
        loop {
            match bag.get_index(self.index) {
                None => return Ok(None),
                Some((v, count)) => {
                    if self.yielded_of_current < count {
                        self.yielded_of_current += 1;
                        return Ok(Some(v));
                    }
                    self.index += 1;
                    self.yielded_of_current = 0;
                }
            }
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn quantities_and_size() {
        let mut bag = Bag::new();
        bag.add(Value::from(1));
        bag.add(Value::from(1));
        bag.add(Value::from(2));

        assert_eq!(bag.size(), 3);
        assert_eq!(bag.element_count(), 2);
        assert_eq!(bag.quantity(&Value::from(1)), 2);
    }

    #[test]
    fn cursor_repeats_elements_by_count() {
        let mut bag = Bag::new();
        bag.add_n(Value::from(7), 2);
        bag.add(Value::from(8));

        let mut cursor = bag.cursor();
        let mut seen = Vec::new();
        while let Some(v) = cursor.next(&bag).unwrap() {
            seen.push(v.clone());
        }
        assert_eq!(
            seen,
            vec![Value::from(7), Value::from(7), Value::from(8)]
        );
    }

    #[test]
    fn cursor_fails_fast_after_mutation() {
        let mut bag = Bag::new();
        bag.add(Value::from(1));
        let mut cursor = bag.cursor();
        bag.add(Value::from(2));
        assert_eq!(cursor.next(&bag), Err(ValueError::ConcurrentModification));
    }
}
