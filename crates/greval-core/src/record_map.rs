//! Keyed collections: Record (named fields), Map (value keys) and Table
//! (header tuple over row tuples).

use std::cell::Cell;
use std::fmt;

use indexmap::IndexMap;

use crate::bag::Bag;
use crate::hashing;
use crate::list::{List, Tuple};
use crate::set::Set;
use crate::value::{Value, ValueKind};

/// Field name under which [`Table::to_record`] stores the header tuple.
pub const TABLE_HEADER_FIELD: &str = "__header";

// ============================================================================
// Record
// ============================================================================

/// Named-field map, String key to Value. Duplicate keys are rejected
/// (non-throwing `add` returns false); iteration yields values only.
#[derive(Debug, Clone, Default)]
pub struct Record {
    fields: IndexMap<String, Value, ahash::RandomState>,
    hash_memo: Cell<Option<u64>>,
}

impl Record {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.fields.len()
    }

    pub fn is_empty(&self) -> bool {
        self.fields.is_empty()
    }

    /// Add a field. Returns false (and changes nothing) if the name is
    /// already taken.
    pub fn add(&mut self, name: impl Into<String>, value: Value) -> bool {
        let name = name.into();
        if self.fields.contains_key(&name) {
            return false;
        }
        self.fields.insert(name, value);
        self.touch();
        true
    }

    pub fn get(&self, name: &str) -> Option<&Value> {
        self.fields.get(name)
    }

    pub fn contains_field(&self, name: &str) -> bool {
        self.fields.contains_key(name)
    }

    pub fn remove(&mut self, name: &str) -> Option<Value> {
        let old = self.fields.shift_remove(name);
        if old.is_some() {
            self.touch();
        }
        old
    }

    /// Iteration over values only; field order is unspecified.
    pub fn values(&self) -> impl Iterator<Item = &Value> {
        self.fields.values()
    }

    pub fn field_names(&self) -> impl Iterator<Item = &str> {
        self.fields.keys().map(String::as_str)
    }

    pub fn to_list(&self) -> List {
        self.values().cloned().collect()
    }

    pub fn value_hash(&self) -> u64 {
        if let Some(h) = self.hash_memo.get() {
            return h;
        }
        let h = hashing::fold_elements(
            hashing::TAG_RECORD,
            self.fields
                .iter()
                .map(|(k, v)| hashing::mix(hashing::fnv1a(k.as_bytes()), v.value_hash())),
        );
        self.hash_memo.set(Some(h));
        h
    }

    fn touch(&mut self) {
        self.hash_memo.set(None);
    }
}

impl PartialEq for Record {
    fn eq(&self, other: &Self) -> bool {
        self.fields == other.fields
    }
}

impl Eq for Record {}

impl fmt::Display for Record {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("rec(")?;
        for (i, (k, v)) in self.fields.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k}: {v}")?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// Map
// ============================================================================

/// Value-keyed map: one value per key, last write wins. Key lookup relies on
/// the canonical value hash contract.
#[derive(Debug, Clone, Default)]
pub struct Map {
    entries: IndexMap<Value, Value, ahash::RandomState>,
    hash_memo: Cell<Option<u64>>,
}

impl Map {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn len(&self) -> usize {
        self.entries.len()
    }

    pub fn is_empty(&self) -> bool {
        self.entries.is_empty()
    }

    /// Insert or overwrite; returns the previous value for the key.
    pub fn put(&mut self, key: Value, value: Value) -> Option<Value> {
        let old = self.entries.insert(key, value);
        self.touch();
        old
    }

    pub fn get(&self, key: &Value) -> Option<&Value> {
        self.entries.get(key)
    }

    pub fn contains_key(&self, key: &Value) -> bool {
        self.entries.contains_key(key)
    }

    pub fn remove(&mut self, key: &Value) -> Option<Value> {
        let old = self.entries.shift_remove(key);
        if old.is_some() {
            self.touch();
        }
        old
    }

    pub fn iter(&self) -> impl Iterator<Item = (&Value, &Value)> {
        self.entries.iter()
    }

    pub fn key_set(&self) -> Set {
        self.entries.keys().cloned().collect()
    }

    pub fn values(&self) -> List {
        self.entries.values().cloned().collect()
    }

    pub fn value_hash(&self) -> u64 {
        if let Some(h) = self.hash_memo.get() {
            return h;
        }
        let h = hashing::fold_elements(
            hashing::TAG_MAP,
            self.entries
                .iter()
                .map(|(k, v)| hashing::mix(k.value_hash(), v.value_hash())),
        );
        self.hash_memo.set(Some(h));
        h
    }

    fn touch(&mut self) {
        self.hash_memo.set(None);
    }
}

impl PartialEq for Map {
    fn eq(&self, other: &Self) -> bool {
        self.entries == other.entries
    }
}

impl Eq for Map {}

impl fmt::Display for Map {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("{")?;
        for (i, (k, v)) in self.entries.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "{k} -> {v}")?;
        }
        f.write_str("}")
    }
}

// ============================================================================
// Table
// ============================================================================

/// A header tuple naming the columns plus a list of row tuples. Adding a
/// non-tuple value wraps it as a singleton row.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Table {
    header: Tuple,
    data: List,
}

impl Table {
    pub fn new(header: Tuple) -> Self {
        Self {
            header,
            data: List::new(),
        }
    }

    pub fn header(&self) -> &Tuple {
        &self.header
    }

    pub fn data(&self) -> &List {
        &self.data
    }

    /// Number of rows.
    pub fn len(&self) -> usize {
        self.data.len()
    }

    pub fn is_empty(&self) -> bool {
        self.data.is_empty()
    }

    /// Append a row; a non-tuple value becomes a singleton row tuple.
    pub fn add(&mut self, value: Value) {
        if value.kind() == ValueKind::Tuple {
            self.data.add(value);
        } else {
            self.data.add(Value::from(Tuple::from_values(vec![value])));
        }
    }

    pub fn row(&self, index: usize) -> Option<&Value> {
        self.data.get(index)
    }

    pub fn iter(&self) -> impl Iterator<Item = &Value> {
        self.data.iter()
    }

    /// Sort rows by the total value order.
    pub fn sort(&mut self) {
        self.data.sort();
    }

    // Conversions delegate to the data collection.

    pub fn to_list(&self) -> List {
        self.data.clone()
    }

    pub fn to_set(&self) -> Set {
        self.data.to_set()
    }

    pub fn to_bag(&self) -> Bag {
        self.data.to_bag()
    }

    pub fn to_tuple(&self) -> Tuple {
        self.data.to_tuple()
    }

    /// Record conversion: rows keyed by their index, with the header tuple
    /// injected under the reserved field [`TABLE_HEADER_FIELD`].
    pub fn to_record(&self) -> Record {
        let mut rec = Record::new();
        rec.add(TABLE_HEADER_FIELD, Value::from(self.header.clone()));
        for (i, row) in self.data.iter().enumerate() {
            rec.add(i.to_string(), row.clone());
        }
        rec
    }

    pub fn value_hash(&self) -> u64 {
        hashing::mix(
            hashing::TAG_TABLE,
            hashing::mix(self.header.value_hash(), self.data.value_hash()),
        )
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "table{} {}", self.header, self.data)
    }
}
