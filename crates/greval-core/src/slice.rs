//! Multi-root relative of [`PathSystem`] for backward/criterion-based
//! search.
//!
//! A slice has no single root: `add_slicing_criterion_vertex` registers any
//! number of criterion roots, and the key map stores a *list* of entries per
//! `(vertex, state)` key because several criteria may reach the same
//! discovery point independently.
//!
//! There is no Open/Finished state machine. Every query first runs the
//! idempotent `clear_path_system()` pass, which resolves the same
//! deferred-edge queue as `PathSystem::finish()`; mutation re-arms the pass.
//! The lazily rebuilt state lives behind a `RefCell`, matching the
//! single-mutator model — no query result borrows the interior.
//!
//! [`PathSystem`]: crate::path_system::PathSystem

use std::cell::RefCell;
use std::collections::HashMap;
use std::fmt;

use tracing::debug;

use crate::error::{Result, ValueError};
use crate::graph::{Edge, TypeDescriptor, Vertex, VertexId};
use crate::hashing;
use crate::path_system::{PathSystemEntry, PathSystemKey};
use crate::set::Set;
use crate::value::Value;

type EntryListMap = HashMap<PathSystemKey, Vec<PathSystemEntry>, ahash::RandomState>;

#[derive(Debug, Clone, Default)]
struct SliceInner {
    entries: EntryListMap,
    /// Criterion roots in registration order.
    criteria: Vec<PathSystemKey>,
    /// `(key, index)` positions still awaiting deferred-edge resolution.
    deferred: Vec<(PathSystemKey, usize)>,
    cleared: bool,
    hash_memo: Option<u64>,
}

#[derive(Debug, Clone, Default)]
pub struct Slice {
    inner: RefCell<SliceInner>,
}

impl Slice {
    pub fn new() -> Self {
        Self::default()
    }

    /// Total number of stored entries across all keys.
    pub fn weight(&self) -> usize {
        self.inner
            .borrow()
            .entries
            .values()
            .map(Vec::len)
            .sum()
    }

    pub fn criterion_count(&self) -> usize {
        self.inner.borrow().criteria.len()
    }

    // ------------------------------------------------------------------
    // Mutation (always allowed; re-arms the lazy clearing pass)
    // ------------------------------------------------------------------

    /// Register an additional root criterion.
    pub fn add_slicing_criterion_vertex(&mut self, vertex: Vertex, state: u32, is_final: bool) {
        let inner = self.inner.get_mut();
        let key = PathSystemKey::new(vertex.id(), state);
        inner.entries.entry(key).or_default().push(PathSystemEntry {
            vertex,
            parent_vertex: None,
            parent_edge: None,
            parent_state: state,
            distance: 0,
            is_final,
        });
        inner.criteria.push(key);
        inner.cleared = false;
        inner.hash_memo = None;
    }

    /// Register the discovery of `vertex` in automaton state `state`.
    /// Duplicates per key are kept: several criteria may reach the same
    /// discovery point independently.
    #[allow(clippy::too_many_arguments)]
    pub fn add_vertex(
        &mut self,
        vertex: Vertex,
        state: u32,
        parent_edge: Option<Edge>,
        parent_vertex: Option<VertexId>,
        parent_state: u32,
        distance: u32,
        is_final: bool,
    ) {
        let inner = self.inner.get_mut();
        let parent_vertex = parent_vertex.or_else(|| parent_edge.as_ref().map(|e| e.start().id()));
        let key = PathSystemKey::new(vertex.id(), state);
        let deferred = parent_edge.is_none() && parent_vertex.is_some();
        let list = inner.entries.entry(key).or_default();
        list.push(PathSystemEntry {
            vertex,
            parent_vertex,
            parent_edge,
            parent_state,
            distance,
            is_final,
        });
        if deferred {
            inner.deferred.push((key, list.len() - 1));
        }
        inner.cleared = false;
        inner.hash_memo = None;
    }

    /// Idempotent deferred-edge resolution pass. Ran implicitly by every
    /// query; explicit calls are allowed and cheap once cleared.
    pub fn clear_path_system(&self) -> Result<()> {
        let mut inner = self.inner.borrow_mut();
        if inner.cleared {
            return Ok(());
        }
        Self::resolve_deferred(&mut inner)?;
        let hash = Self::compute_hash(&inner);
        inner.hash_memo = Some(hash);
        inner.cleared = true;
        debug!(
            entries = inner.entries.values().map(Vec::len).sum::<usize>(),
            criteria = inner.criteria.len(),
            "slice cleared"
        );
        Ok(())
    }

    fn resolve_deferred(inner: &mut SliceInner) -> Result<()> {
        let mut pending: Vec<(PathSystemKey, usize)> = std::mem::take(&mut inner.deferred);
        while !pending.is_empty() {
            debug!(pending = pending.len(), "resolving deferred slice entries");
            let pending_set: ahash::HashSet<(PathSystemKey, usize)> =
                pending.iter().copied().collect();
            let mut requeue = Vec::new();
            let mut progressed = false;

            for (key, index) in pending {
                let entry = &inner.entries[&key][index];
                let Some(pv) = entry.parent_vertex else {
                    // Became criterion-like; nothing to resolve.
                    progressed = true;
                    continue;
                };
                let source = PathSystemKey::new(pv, entry.parent_state);
                let Some(candidates) = inner.entries.get(&source) else {
                    return Err(ValueError::Path(format!(
                        "deferred slice entry {key} references unknown parent {source}"
                    )));
                };
                // Copy linkage from the first source entry that is itself
                // resolved.
                let src = candidates
                    .iter()
                    .enumerate()
                    .find(|(j, _)| !pending_set.contains(&(source, *j)))
                    .map(|(_, e)| e.clone());
                match src {
                    Some(src) => {
                        let entry = &mut inner
                            .entries
                            .get_mut(&key)
                            .expect("pending key always has entries")[index];
                        entry.parent_vertex = src.parent_vertex;
                        entry.parent_edge = src.parent_edge;
                        entry.parent_state = src.parent_state;
                        entry.distance = src.distance;
                        progressed = true;
                    }
                    None => requeue.push((key, index)),
                }
            }

            if !progressed && !requeue.is_empty() {
                return Err(ValueError::Path(format!(
                    "deferred-edge resolution stalled with {} unresolved slice entries",
                    requeue.len()
                )));
            }
            pending = requeue;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries (union across all stored entries per key)
    // ------------------------------------------------------------------

    /// All vertices with at least one entry.
    pub fn nodes(&self) -> Result<Set> {
        self.clear_path_system()?;
        let inner = self.inner.borrow();
        Ok(inner
            .entries
            .values()
            .flatten()
            .map(|e| Value::from(e.vertex.clone()))
            .collect())
    }

    /// All parent edges across all entries.
    pub fn edges(&self) -> Result<Set> {
        self.clear_path_system()?;
        let inner = self.inner.borrow();
        Ok(inner
            .entries
            .values()
            .flatten()
            .filter_map(|e| e.parent_edge.as_ref())
            .map(|e| Value::from(e.clone()))
            .collect())
    }

    /// Vertices with at least one final entry.
    pub fn leaves(&self) -> Result<Set> {
        self.clear_path_system()?;
        let inner = self.inner.borrow();
        Ok(inner
            .entries
            .values()
            .flatten()
            .filter(|e| e.is_final)
            .map(|e| Value::from(e.vertex.clone()))
            .collect())
    }

    pub fn inner_nodes(&self) -> Result<Set> {
        let nodes = self.nodes()?;
        let leaves = self.leaves()?;
        Ok(nodes.difference(&leaves))
    }

    /// Union of parent vertices over every entry of `v`, across all states.
    pub fn parents(&self, v: VertexId) -> Result<Set> {
        self.clear_path_system()?;
        let inner = self.inner.borrow();
        let mut out = Set::new();
        for entry in inner.entries.values().flatten() {
            if entry.vertex.id() != v {
                continue;
            }
            let Some(pv) = entry.parent_vertex else {
                continue;
            };
            let parent_key = PathSystemKey::new(pv, entry.parent_state);
            if let Some(parent) = inner.entries.get(&parent_key).and_then(|l| l.first()) {
                out.add(Value::from(parent.vertex.clone()));
            }
        }
        Ok(out)
    }

    pub fn is_neighbour(&self, a: VertexId, b: VertexId) -> Result<bool> {
        self.clear_path_system()?;
        let inner = self.inner.borrow();
        Ok(inner
            .entries
            .values()
            .flatten()
            .filter_map(|e| e.parent_edge.as_ref())
            .any(|e| {
                (e.start().id() == a && e.end().id() == b)
                    || (e.start().id() == b && e.end().id() == a)
            }))
    }

    pub fn contains_vertex(&self, v: VertexId) -> Result<bool> {
        self.clear_path_system()?;
        let inner = self.inner.borrow();
        Ok(inner
            .entries
            .values()
            .flatten()
            .any(|e| e.vertex.id() == v))
    }

    /// Orientation-free edge containment.
    pub fn contains_edge(&self, edge: &Edge) -> Result<bool> {
        self.clear_path_system()?;
        let inner = self.inner.borrow();
        Ok(inner
            .entries
            .values()
            .flatten()
            .filter_map(|e| e.parent_edge.as_ref())
            .any(|e| e.normal_id() == edge.normal_id()))
    }

    /// Does any contained vertex or edge carry this type?
    pub fn contains_type(&self, t: &TypeDescriptor) -> Result<bool> {
        self.clear_path_system()?;
        let inner = self.inner.borrow();
        Ok(inner.entries.values().flatten().any(|e| {
            e.vertex.vertex_type() == t
                || e.parent_edge
                    .as_ref()
                    .map_or(false, |edge| edge.edge_type() == t)
        }))
    }

    // ------------------------------------------------------------------
    // Hashing
    // ------------------------------------------------------------------

    /// Canonical hash, cached by `clear_path_system()`.
    pub fn value_hash(&self) -> u64 {
        let inner = self.inner.borrow();
        if let Some(h) = inner.hash_memo {
            return h;
        }
        Self::compute_hash(&inner)
    }

    fn compute_hash(inner: &SliceInner) -> u64 {
        let mut acc = hashing::TAG_SLICE;
        for (k, list) in &inner.entries {
            for e in list {
                acc = acc.wrapping_add(
                    k.canonical_hash()
                        .wrapping_mul(11)
                        .wrapping_add(e.canonical_hash().wrapping_mul(7)),
                );
            }
        }
        acc
    }
}

impl PartialEq for Slice {
    fn eq(&self, other: &Self) -> bool {
        let a = self.inner.borrow();
        let b = other.inner.borrow();
        a.criteria == b.criteria && a.entries == b.entries
    }
}

impl fmt::Display for Slice {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let inner = self.inner.borrow();
        write!(
            f,
            "slice(criteria={}, entries={})",
            inner.criteria.len(),
            inner.entries.values().map(Vec::len).sum::<usize>()
        )
    }
}
