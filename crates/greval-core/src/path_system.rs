//! Single-root forest of traversal paths discovered by an automaton-driven
//! graph search.
//!
//! The evaluator walks the graph guided by an automaton; for every
//! `(vertex, state)` pair it reaches it registers the discovery here,
//! supplying the parent linkage, the distance to the root and whether the
//! automaton state was accepting. Entries are keyed by
//! [`PathSystemKey`] `(vertex, state)` and stored arena-style: parents are
//! referenced through keys, never through pointers.
//!
//! An entry may be registered before its connecting edge is known (a
//! state-only transition): such *deferred* entries are queued and resolved by
//! [`PathSystem::finish`], which copies the parent linkage from the entry
//! already stored at `(parent_vertex, parent_state)` — resolution chains
//! terminate at the root, which is never deferred.
//!
//! The structure is Open while the search runs and Finished afterwards;
//! queries require Finished, mutation requires Open.

use std::cell::Cell;
use std::collections::HashMap;
use std::fmt;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::error::{Result, ValueError};
use crate::graph::{Edge, EdgeDirection, TypeDescriptor, Vertex, VertexId};
use crate::hashing;
use crate::path::Path;
use crate::set::Set;
use crate::value::{TypeCollection, Value};

/// Discovery point of the automaton-driven search: which vertex was reached
/// in which automaton state.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct PathSystemKey {
    pub vertex: VertexId,
    pub state: u32,
}

impl PathSystemKey {
    pub fn new(vertex: VertexId, state: u32) -> Self {
        Self { vertex, state }
    }

    pub(crate) fn canonical_hash(&self) -> u64 {
        hashing::mix(self.vertex.raw() as u64, self.state as u64)
    }
}

impl fmt::Display for PathSystemKey {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "({}, s{})", self.vertex, self.state)
    }
}

/// Parent linkage, distance and finality recorded for one key.
///
/// `parent_edge == None` with a known `parent_vertex` is the deferred-edge
/// state awaiting resolution; after `finish()` it means the entry shares its
/// parent's linkage (a state-only transition).
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct PathSystemEntry {
    pub vertex: Vertex,
    pub parent_vertex: Option<VertexId>,
    pub parent_edge: Option<Edge>,
    pub parent_state: u32,
    pub distance: u32,
    pub is_final: bool,
}

impl PathSystemEntry {
    pub(crate) fn canonical_hash(&self) -> u64 {
        let mut acc = self.vertex.canonical_hash();
        acc = hashing::mix(
            acc,
            self.parent_vertex.map(|v| v.raw() as u64 + 1).unwrap_or(0),
        );
        acc = hashing::mix(
            acc,
            self.parent_edge
                .as_ref()
                .map(|e| e.canonical_hash())
                .unwrap_or(0),
        );
        acc = hashing::mix(acc, self.parent_state as u64);
        acc = hashing::mix(acc, self.distance as u64);
        hashing::mix(acc, self.is_final as u64)
    }
}

type EntryMap = HashMap<PathSystemKey, PathSystemEntry, ahash::RandomState>;

#[derive(Debug, Clone, Default)]
pub struct PathSystem {
    entries: EntryMap,
    root: Option<PathSystemKey>,
    /// Keys whose entries still await deferred-edge resolution.
    deferred: indexmap::IndexSet<PathSystemKey, ahash::RandomState>,
    /// Leaf cache, computed by `finish()`.
    leaf_keys: Vec<PathSystemKey>,
    finished: bool,
    hash_memo: Cell<Option<u64>>,
}

impl PathSystem {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn is_finished(&self) -> bool {
        self.finished
    }

    /// Number of stored `(vertex, state)` entries.
    pub fn entry_count(&self) -> usize {
        self.entries.len()
    }

    pub fn root_vertex(&self) -> Option<&Vertex> {
        self.root
            .and_then(|k| self.entries.get(&k))
            .map(|e| &e.vertex)
    }

    // ------------------------------------------------------------------
    // Mutation (Open state)
    // ------------------------------------------------------------------

    /// Set the single root. Must happen before any `add_vertex`.
    pub fn set_root_vertex(&mut self, vertex: Vertex, state: u32, is_final: bool) -> Result<()> {
        self.ensure_open()?;
        if self.root.is_some() {
            return Err(ValueError::Path(
                "path system root is already set".to_string(),
            ));
        }
        let key = PathSystemKey::new(vertex.id(), state);
        self.entries.insert(
            key,
            PathSystemEntry {
                vertex,
                parent_vertex: None,
                parent_edge: None,
                parent_state: state,
                distance: 0,
                is_final,
            },
        );
        self.root = Some(key);
        Ok(())
    }

    /// Register the discovery of `vertex` in automaton state `state`.
    ///
    /// Insert-or-replace policy: the existing entry at `(vertex, state)` is
    /// replaced iff none exists yet, or the new distance is strictly shorter
    /// and the existing entry is not final unless the new one is too. This
    /// tie-break decides which parent chain `extract_path` later returns.
    ///
    /// A call without `parent_edge` records a deferred entry, resolved on
    /// `finish()` from the entry at `(parent_vertex, parent_state)` (the
    /// root when `parent_vertex` is `None`).
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
    ) -> Result<()> {
        self.ensure_open()?;
        let Some(root) = self.root else {
            return Err(ValueError::Path(
                "path system root must be set before adding vertices".to_string(),
            ));
        };

        // An edge pins the parent vertex even when the caller omitted it.
        let parent_vertex = parent_vertex.or_else(|| parent_edge.as_ref().map(|e| e.start().id()));

        let key = PathSystemKey::new(vertex.id(), state);
        if key == root {
            // The root is never displaced: its distance 0 beats everything.
            return Ok(());
        }

        if let Some(existing) = self.entries.get(&key) {
            let replace = distance < existing.distance && (!existing.is_final || is_final);
            if !replace {
                return Ok(());
            }
        }

        let deferred = parent_edge.is_none();
        self.entries.insert(
            key,
            PathSystemEntry {
                vertex,
                parent_vertex,
                parent_edge,
                parent_state,
                distance,
                is_final,
            },
        );
        if deferred {
            self.deferred.insert(key);
        } else {
            self.deferred.shift_remove(&key);
        }
        Ok(())
    }

    /// Seal the structure: drain the deferred queue, compute the leaf cache
    /// and the hash. Idempotent — only the first call mutates state.
    pub fn finish(&mut self) -> Result<()> {
        if self.finished {
            return Ok(());
        }
        let root = self
            .root
            .ok_or_else(|| ValueError::Path("cannot finish a path system without a root".to_string()))?;

        self.resolve_deferred(root)?;

        self.leaf_keys = self
            .entries
            .iter()
            .filter(|(_, e)| e.is_final)
            .map(|(k, _)| *k)
            .collect();

        self.hash_memo.set(Some(self.compute_hash()));
        self.finished = true;
        debug!(
            entries = self.entries.len(),
            leaves = self.leaf_keys.len(),
            "path system finished"
        );
        Ok(())
    }

    /// Drain the deferred queue: each pending entry copies its parent's
    /// linkage once that parent is itself resolved. Chains terminate at the
    /// root; a pass without progress means a pending entry references an
    /// unknown or cyclic parent, which is a caller bug.
    fn resolve_deferred(&mut self, root: PathSystemKey) -> Result<()> {
        let mut pending: Vec<PathSystemKey> = self.deferred.drain(..).collect();
        while !pending.is_empty() {
            debug!(pending = pending.len(), "resolving deferred path-system entries");
            let pending_set: ahash::HashSet<PathSystemKey> = pending.iter().copied().collect();
            let mut requeue = Vec::new();
            let mut progressed = false;

            for key in pending {
                let entry = self
                    .entries
                    .get(&key)
                    .expect("deferred key always has an entry");
                let source = PathSystemKey::new(
                    entry.parent_vertex.unwrap_or(root.vertex),
                    entry.parent_state,
                );
                if pending_set.contains(&source) {
                    requeue.push(key);
                    continue;
                }
                let Some(src) = self.entries.get(&source).cloned() else {
                    return Err(ValueError::Path(format!(
                        "deferred entry {key} references unknown parent {source}"
                    )));
                };
                let entry = self.entries.get_mut(&key).expect("checked above");
                entry.parent_vertex = src.parent_vertex;
                entry.parent_edge = src.parent_edge;
                entry.parent_state = src.parent_state;
                entry.distance = src.distance;
                progressed = true;
            }

            if !progressed && !requeue.is_empty() {
                return Err(ValueError::Path(format!(
                    "deferred-edge resolution stalled with {} unresolved entries",
                    requeue.len()
                )));
            }
            pending = requeue;
        }
        Ok(())
    }

    // ------------------------------------------------------------------
    // Queries (Finished state; O(n) scans over the entry map)
    // ------------------------------------------------------------------

    /// All vertices with an entry, as a Set of vertex values.
    pub fn nodes(&self) -> Result<Set> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .map(|e| Value::from(e.vertex.clone()))
            .collect())
    }

    /// Vertices of final entries.
    pub fn leaves(&self) -> Result<Set> {
        self.ensure_finished()?;
        Ok(self
            .leaf_keys
            .iter()
            .filter_map(|k| self.entries.get(k))
            .map(|e| Value::from(e.vertex.clone()))
            .collect())
    }

    /// Nodes that are not leaves.
    pub fn inner_nodes(&self) -> Result<Set> {
        let nodes = self.nodes()?;
        let leaves = self.leaves()?;
        Ok(nodes.difference(&leaves))
    }

    /// All parent edges in the forest.
    pub fn edges(&self) -> Result<Set> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .filter_map(|e| e.parent_edge.as_ref())
            .map(|e| Value::from(e.clone()))
            .collect())
    }

    /// Children of `v` across all automaton states.
    pub fn children(&self, v: VertexId) -> Result<Set> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .filter(|e| e.parent_vertex == Some(v) && e.parent_edge.is_some())
            .map(|e| Value::from(e.vertex.clone()))
            .collect())
    }

    /// Children of one exact `(vertex, state)` entry.
    pub fn children_of(&self, key: PathSystemKey) -> Result<Set> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .filter(|e| {
                e.parent_vertex == Some(key.vertex)
                    && e.parent_state == key.state
                    && e.parent_edge.is_some()
            })
            .map(|e| Value::from(e.vertex.clone()))
            .collect())
    }

    /// Parent vertex of `v` (the best entry's parent), or Invalid for the
    /// root and unknown vertices.
    pub fn parent(&self, v: VertexId) -> Result<Value> {
        self.ensure_finished()?;
        let Some((_, entry)) = self.best_entry(v) else {
            return Ok(Value::invalid());
        };
        let Some(pv) = entry.parent_vertex else {
            return Ok(Value::invalid());
        };
        let parent_key = PathSystemKey::new(pv, entry.parent_state);
        Ok(self
            .entries
            .get(&parent_key)
            .map(|e| Value::from(e.vertex.clone()))
            .unwrap_or_else(Value::invalid))
    }

    /// Other children of `v`'s parent.
    pub fn siblings(&self, v: VertexId) -> Result<Set> {
        self.ensure_finished()?;
        let Some((_, entry)) = self.best_entry(v) else {
            return Ok(Set::new());
        };
        let Some(pv) = entry.parent_vertex else {
            return Ok(Set::new());
        };
        let mut out = self.children(pv)?;
        let self_value: Value = self
            .entries
            .values()
            .find(|e| e.vertex.id() == v)
            .map(|e| Value::from(e.vertex.clone()))
            .expect("best_entry proved the vertex exists");
        out.remove(&self_value);
        Ok(out)
    }

    /// Number of forest edges incident to `v`, optionally restricted by
    /// direction and an edge-type filter.
    pub fn degree(
        &self,
        v: VertexId,
        direction: EdgeDirection,
        type_filter: Option<&TypeCollection>,
    ) -> Result<usize> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .filter_map(|e| e.parent_edge.as_ref())
            .filter(|e| e.is_incident(v, direction))
            .filter(|e| type_filter.map_or(true, |tc| tc.allows(e.edge_type())))
            .count())
    }

    /// Minimal distance to the root over all states of `v`.
    pub fn distance(&self, v: VertexId) -> Result<Option<u32>> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .filter(|e| e.vertex.id() == v)
            .map(|e| e.distance)
            .min())
    }

    /// Maximal distance over all entries.
    pub fn depth(&self) -> Result<u32> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .map(|e| e.distance)
            .max()
            .unwrap_or(0))
    }

    pub fn min_path_length(&self) -> Result<Option<u32>> {
        self.ensure_finished()?;
        Ok(self.leaf_entries().map(|e| e.distance).min())
    }

    pub fn max_path_length(&self) -> Result<Option<u32>> {
        self.ensure_finished()?;
        Ok(self.leaf_entries().map(|e| e.distance).max())
    }

    /// Are the two vertices connected by one forest edge?
    pub fn is_neighbour(&self, a: VertexId, b: VertexId) -> Result<bool> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .filter_map(|e| e.parent_edge.as_ref())
            .any(|e| {
                (e.start().id() == a && e.end().id() == b)
                    || (e.start().id() == b && e.end().id() == a)
            }))
    }

    /// Do the two vertices share a parent?
    pub fn is_sibling(&self, a: VertexId, b: VertexId) -> Result<bool> {
        self.ensure_finished()?;
        let parent_of = |v: VertexId| {
            self.entries
                .values()
                .filter(|e| e.vertex.id() == v)
                .filter_map(|e| e.parent_vertex)
                .collect::<ahash::HashSet<_>>()
        };
        let pa = parent_of(a);
        if pa.is_empty() {
            return Ok(false);
        }
        Ok(parent_of(b).iter().any(|p| pa.contains(p)))
    }

    pub fn contains_vertex(&self, v: VertexId) -> Result<bool> {
        self.ensure_finished()?;
        Ok(self.entries.values().any(|e| e.vertex.id() == v))
    }

    /// Orientation-free edge containment.
    pub fn contains_edge(&self, edge: &Edge) -> Result<bool> {
        self.ensure_finished()?;
        Ok(self
            .entries
            .values()
            .filter_map(|e| e.parent_edge.as_ref())
            .any(|e| e.normal_id() == edge.normal_id()))
    }

    /// Does any contained vertex or edge carry this type?
    pub fn contains_type(&self, t: &TypeDescriptor) -> Result<bool> {
        self.ensure_finished()?;
        Ok(self.entries.values().any(|e| {
            e.vertex.vertex_type() == t
                || e.parent_edge
                    .as_ref()
                    .map_or(false, |edge| edge.edge_type() == t)
        }))
    }

    // ------------------------------------------------------------------
    // Path extraction
    // ------------------------------------------------------------------

    /// Path from the root to the best entry of `v` (minimal distance,
    /// preferring final entries among equals).
    pub fn extract_path(&self, v: VertexId) -> Result<Path> {
        self.ensure_finished()?;
        let (key, _) = self
            .best_entry(v)
            .ok_or_else(|| ValueError::Path(format!("vertex {v} is not in the path system")))?;
        self.extract_path_for(key)
    }

    /// Path from the root to one exact `(vertex, state)` entry: walk the
    /// parent chain collecting reversed edges, then reverse the result.
    pub fn extract_path_for(&self, key: PathSystemKey) -> Result<Path> {
        self.ensure_finished()?;
        let mut edges = Vec::new();
        let mut cur = key;
        // The chain cannot be longer than the entry count.
        let mut guard = self.entries.len() + 1;
        loop {
            if guard == 0 {
                return Err(ValueError::Path(format!(
                    "parent chain of {key} does not terminate at the root"
                )));
            }
            guard -= 1;

            let entry = self.entries.get(&cur).ok_or_else(|| {
                ValueError::Path(format!("entry {cur} is missing from the path system"))
            })?;
            match (&entry.parent_edge, entry.parent_vertex) {
                (Some(edge), Some(pv)) => {
                    edges.push(edge.clone());
                    cur = PathSystemKey::new(pv, entry.parent_state);
                }
                (Some(edge), None) => {
                    // Linkage resolved against the root.
                    edges.push(edge.clone());
                    let root = self.root.expect("finished implies a root");
                    cur = PathSystemKey::new(root.vertex, entry.parent_state);
                }
                (None, _) => break,
            }
        }

        let start = self
            .entries
            .get(&cur)
            .map(|e| e.vertex.clone())
            .expect("chain walk only visits stored keys");
        let mut path = Path::new(start);
        for edge in edges.into_iter().rev() {
            path.add_edge(edge)?;
        }
        Ok(path)
    }

    /// One path per leaf, as a Set of path values.
    pub fn extract_paths(&self) -> Result<Set> {
        self.ensure_finished()?;
        let mut out = Set::new();
        for key in &self.leaf_keys {
            out.add(Value::from(self.extract_path_for(*key)?));
        }
        Ok(out)
    }

    /// Leaf paths of exactly `len` edges.
    pub fn extract_paths_of_length(&self, len: usize) -> Result<Set> {
        self.ensure_finished()?;
        let mut out = Set::new();
        for key in &self.leaf_keys {
            let path = self.extract_path_for(*key)?;
            if path.length() == len {
                out.add(Value::from(path));
            }
        }
        Ok(out)
    }

    // ------------------------------------------------------------------
    // Hashing
    // ------------------------------------------------------------------

    /// Canonical hash, cached by `finish()`.
    pub fn value_hash(&self) -> u64 {
        if let Some(h) = self.hash_memo.get() {
            return h;
        }
        self.compute_hash()
    }

    fn compute_hash(&self) -> u64 {
        let mut acc = hashing::TAG_PATH_SYSTEM;
        for (k, e) in &self.entries {
            acc = acc.wrapping_add(
                k.canonical_hash()
                    .wrapping_mul(11)
                    .wrapping_add(e.canonical_hash().wrapping_mul(7)),
            );
        }
        acc
    }

    // ------------------------------------------------------------------
    // Internal helpers
    // ------------------------------------------------------------------

    fn ensure_open(&self) -> Result<()> {
        if self.finished {
            return Err(ValueError::Path(
                "path system is finished; further mutation is not allowed".to_string(),
            ));
        }
        Ok(())
    }

    fn ensure_finished(&self) -> Result<()> {
        if !self.finished {
            return Err(ValueError::Path(
                "path system must be finished before it can be queried".to_string(),
            ));
        }
        Ok(())
    }

    /// Best entry for a vertex: minimal distance, final preferred among
    /// equal distances.
    fn best_entry(&self, v: VertexId) -> Option<(PathSystemKey, &PathSystemEntry)> {
        self.entries
            .iter()
            .filter(|(_, e)| e.vertex.id() == v)
            .min_by_key(|(_, e)| (e.distance, !e.is_final))
            .map(|(k, e)| (*k, e))
    }

    fn leaf_entries(&self) -> impl Iterator<Item = &PathSystemEntry> {
        self.leaf_keys.iter().filter_map(|k| self.entries.get(k))
    }
}

impl PartialEq for PathSystem {
    fn eq(&self, other: &Self) -> bool {
        self.root == other.root && self.finished == other.finished && self.entries == other.entries
    }
}

impl fmt::Display for PathSystem {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match (self.root_vertex(), self.finished) {
            (Some(root), true) => write!(
                f,
                "pathsystem(root={}, entries={}, leaves={})",
                root.id(),
                self.entries.len(),
                self.leaf_keys.len()
            ),
            (Some(root), false) => write!(
                f,
                "pathsystem(root={}, entries={}, open)",
                root.id(),
                self.entries.len()
            ),
            (None, _) => f.write_str("pathsystem(empty)"),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::graph::EdgeId;

    fn v(id: u32) -> Vertex {
        Vertex::new(VertexId::new(id), TypeDescriptor::new("Node"))
    }

    fn e(id: i32, from: u32, to: u32) -> Edge {
        Edge::new(EdgeId::new(id), v(from), v(to), TypeDescriptor::new("Link"))
    }

    #[test]
    fn shorter_distance_wins_regardless_of_order() {
        // distance 3 (non-final) then 2 (final): the final distance-2 entry wins.
        let mut ps = PathSystem::new();
        ps.set_root_vertex(v(1), 0, false).unwrap();
        ps.add_vertex(v(2), 1, Some(e(1, 1, 2)), Some(VertexId::new(1)), 0, 3, false)
            .unwrap();
        ps.add_vertex(v(2), 1, Some(e(2, 1, 2)), Some(VertexId::new(1)), 0, 2, true)
            .unwrap();
        ps.finish().unwrap();
        let key = PathSystemKey::new(VertexId::new(2), 1);
        let path = ps.extract_path_for(key).unwrap();
        assert_eq!(path.edge_slice()[0].id(), EdgeId::new(2));

        // distance 2 (final) then 3 (non-final): the distance-2 entry stays.
        let mut ps = PathSystem::new();
        ps.set_root_vertex(v(1), 0, false).unwrap();
        ps.add_vertex(v(2), 1, Some(e(2, 1, 2)), Some(VertexId::new(1)), 0, 2, true)
            .unwrap();
        ps.add_vertex(v(2), 1, Some(e(1, 1, 2)), Some(VertexId::new(1)), 0, 3, false)
            .unwrap();
        ps.finish().unwrap();
        let path = ps.extract_path_for(key).unwrap();
        assert_eq!(path.edge_slice()[0].id(), EdgeId::new(2));
    }

    #[test]
    fn final_entry_not_displaced_by_equal_distance() {
        let mut ps = PathSystem::new();
        ps.set_root_vertex(v(1), 0, false).unwrap();
        ps.add_vertex(v(2), 1, Some(e(1, 1, 2)), Some(VertexId::new(1)), 0, 2, true)
            .unwrap();
        ps.add_vertex(v(2), 1, Some(e(2, 1, 2)), Some(VertexId::new(1)), 0, 2, false)
            .unwrap();
        ps.finish().unwrap();
        let key = PathSystemKey::new(VertexId::new(2), 1);
        let path = ps.extract_path_for(key).unwrap();
        assert_eq!(path.edge_slice()[0].id(), EdgeId::new(1));
    }

    #[test]
    fn queries_require_finish() {
        let mut ps = PathSystem::new();
        ps.set_root_vertex(v(1), 0, false).unwrap();
        assert!(ps.nodes().is_err());
        ps.finish().unwrap();
        assert!(ps.nodes().is_ok());
        assert!(ps
            .add_vertex(v(2), 1, Some(e(1, 1, 2)), Some(VertexId::new(1)), 0, 1, false)
            .is_err());
    }
}
