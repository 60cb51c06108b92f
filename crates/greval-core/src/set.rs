//! Deduplicated, hash-based value set.
//!
//! Backed by an insertion-ordered hash set so that display output and
//! iteration are deterministic. Structural mutation bumps a generation
//! counter; detached cursors capture the generation they were created at and
//! fail fast with `ConcurrentModification` when it moved under them.

use std::cell::Cell;
use std::fmt;

use indexmap::IndexSet;

use crate::bag::Bag;
use crate::error::{Result, ValueError};
use crate::hashing;
use crate::list::List;
use crate::value::Value;

pub(crate) type ValueIndexSet = IndexSet<Value, ahash::RandomState>;

#[derive(Debug, Clone, Default)]
pub struct Set {
    elems: ValueIndexSet,
    generation: u64,
    hash_memo: Cell<Option<u64>>,
}

impl Set {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.elems.len()
    }

    pub fn is_empty(&self) -> bool {
        self.elems.is_empty()
    }

    pub fn contains(&self, value: &Value) -> bool {
        self.elems.contains(value)
    }

    /// Insert an element. Returns false if it was already present.
    pub fn add(&mut self, value: Value) -> bool {
        let inserted = self.elems.insert(value);
        if inserted {
            self.touch();
        }
        inserted
    }

    /// Remove an element, preserving the order of the rest.
    pub fn remove(&mut self, value: &Value) -> bool {
        let removed = self.elems.shift_remove(value);
        if removed {
            self.touch();
        }
        removed
    }

    pub fn clear(&mut self) {
        if !self.elems.is_empty() {
            self.elems.clear();
            self.touch();
        }
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.elems.iter()
    }

    /// Detached fail-fast cursor; see [`SetCursor`].
    pub fn cursor(&self) -> SetCursor {
        SetCursor {
            generation: self.generation,
            index: 0,
        }
    }

    // ------------------------------------------------------------------
    // Set algebra (presence only; textbook semantics)
    // ------------------------------------------------------------------

    pub fn union(&self, other: &Set) -> Set {
        let mut out = self.clone();
        for v in other.iter() {
            out.add(v.clone());
        }
        out
    }

    pub fn intersection(&self, other: &Set) -> Set {
        let mut out = Set::new();
        for v in self.iter() {
            if other.contains(v) {
                out.add(v.clone());
            }
        }
        out
    }

    pub fn difference(&self, other: &Set) -> Set {
        let mut out = Set::new();
        for v in self.iter() {
            if !other.contains(v) {
                out.add(v.clone());
            }
        }
        out
    }

    pub fn symmetric_difference(&self, other: &Set) -> Set {
        let mut out = self.difference(other);
        for v in other.iter() {
            if !self.contains(v) {
                out.add(v.clone());
            }
        }
        out
    }

    pub fn is_subset(&self, other: &Set) -> bool {
        self.iter().all(|v| other.contains(v))
    }

    pub fn is_superset(&self, other: &Set) -> bool {
        other.is_subset(self)
    }

    pub fn is_disjoint(&self, other: &Set) -> bool {
        self.iter().all(|v| !other.contains(v))
    }

    // ------------------------------------------------------------------
    // Conversions
    // ------------------------------------------------------------------

    pub fn to_list(&self) -> List {
        self.iter().cloned().collect()
    }

    pub fn to_bag(&self) -> Bag {
        let mut bag = Bag::new();
        for v in self.iter() {
            bag.add(v.clone());
        }
        bag
    }

    /// Canonical hash: permutation-invariant cubic fold, memoized until the
    /// next structural mutation.
    pub fn value_hash(&self) -> u64 {
        if let Some(h) = self.hash_memo.get() {
            return h;
        }
        let h = hashing::fold_elements(hashing::TAG_SET, self.iter().map(Value::value_hash));
        self.hash_memo.set(Some(h));
        h
    }

    pub(crate) fn generation(&self) -> u64 {
        self.generation
    }

    pub(crate) fn get_index(&self, index: usize) -> Option<&Value> {
        self.elems.get_index(index)
    }

    fn touch(&mut self) {
        self.generation += 1;
        self.hash_memo.set(None);
    }
}

impl PartialEq for Set {
    fn eq(&self, other: &Self) -> bool {
        // Order-independent element equality; generation and memo are not
        // part of the value.
        self.elems == other.elems
    }
}

impl Eq for Set {}

impl FromIterator<Value> for Set {
    fn from_iter<T: IntoIterator<Item = Value>>(iter: T) -> Self {
        let mut set = Set::new();
        for v in iter {
            set.add(v);
        }
        set
    }
}

impl fmt::Display for Set {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, v) in self.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{v}")?;
        }
        f.write_str("}")
    }
}

/// Detached cursor over a [`Set`].
///
/// The cursor does not borrow the set; every call re-validates the generation
/// captured at creation and fails with `ConcurrentModification` if the set
/// was structurally mutated in between.
#[derive(Debug, Clone)]
pub struct SetCursor {
    generation: u64,
    index: usize,
}

impl SetCursor {
    pub fn next<'a>(&mut self, set: &'a Set) -> Result<Option<&'a Value>> {
        if self.generation != set.generation() {
            return Err(ValueError::ConcurrentModification);
        }
        match set.get_index(self.index) {
            Some(v) => {
                self.index += 1;
                Ok(Some(v))
            }
            None => Ok(None),
        }
    }

    /// Remove the element most recently yielded by `next`. The cursor adopts
    /// the set's new generation, so iteration may continue.
    pub fn remove(&mut self, set: &mut Set) -> Result<Value> {
        if self.generation != set.generation() {
            return Err(ValueError::ConcurrentModification);
        }
        if self.index == 0 {
            return Err(ValueError::UnsupportedOperation(
                "cursor remove before the first next()",
            ));
        }
        let value = set
            .get_index(self.index - 1)
            .cloned()
            .ok_or(ValueError::ConcurrentModification)?;
        set.remove(&value);
        self.generation = set.generation();
        self.index -= 1;
        Ok(value)
    }
}
