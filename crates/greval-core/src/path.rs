//! An alternating vertex/edge sequence through the external graph.
//!
//! A path is built incrementally during traversal and treated as immutable
//! afterwards. The structural invariant is contiguity: every edge must start
//! at the vertex the path currently ends at, checked on every `add_edge`.

use std::fmt;

use crate::error::{Result, ValueError};
use crate::graph::{Edge, EdgeDirection, TypeDescriptor, Vertex, VertexId};
use crate::hashing;
use crate::list::List;
use crate::value::Value;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Path {
    start: Vertex,
    edges: Vec<Edge>,
}

impl Path {
    pub fn new(start: Vertex) -> Self {
        Self {
            start,
            edges: Vec::new(),
        }
    }

    pub fn start_vertex(&self) -> &Vertex {
        &self.start
    }

    pub fn end_vertex(&self) -> &Vertex {
        self.edges.last().map(Edge::end).unwrap_or(&self.start)
    }

    /// Number of edges.
    pub fn length(&self) -> usize {
        self.edges.len()
    }

    pub fn is_empty(&self) -> bool {
        self.edges.is_empty()
    }

    /// Append an edge. Fails if the edge does not start at the path's
    /// current end vertex.
    pub fn add_edge(&mut self, edge: Edge) -> Result<()> {
        let end = self.end_vertex().id();
        if edge.start().id() != end {
            return Err(ValueError::Path(format!(
                "edge {} starts at {}, but the path ends at {}",
                edge.id(),
                edge.start().id(),
                end
            )));
        }
        self.edges.push(edge);
        Ok(())
    }

    /// A new path from the end vertex backwards, each edge replaced by its
    /// directional inverse. The original is unchanged.
    pub fn reverse(&self) -> Path {
        let mut out = Path::new(self.end_vertex().clone());
        for edge in self.edges.iter().rev() {
            out.edges.push(edge.reversed());
        }
        out
    }

    /// Structural copy of `self` with `other`'s edges appended. Fails if
    /// `other` does not start where `self` ends.
    pub fn path_concat(&self, other: &Path) -> Result<Path> {
        if self.end_vertex().id() != other.start_vertex().id() {
            return Err(ValueError::Path(format!(
                "cannot concatenate: path ends at {}, other starts at {}",
                self.end_vertex().id(),
                other.start_vertex().id()
            )));
        }
        let mut out = self.clone();
        out.edges.extend(other.edges.iter().cloned());
        Ok(out)
    }

    /// No vertex visited twice. O(n) with a seen-set.
    pub fn is_trail(&self) -> bool {
        let mut seen: ahash::HashSet<VertexId> = ahash::HashSet::default();
        seen.insert(self.start.id());
        for edge in &self.edges {
            if !seen.insert(edge.end().id()) {
                return false;
            }
        }
        true
    }

    /// Non-trivial and closed: at least one edge, start == end.
    pub fn is_cycle(&self) -> bool {
        !self.edges.is_empty() && self.start.id() == self.end_vertex().id()
    }

    /// Locate this path's first edge inside `other`, then verify a
    /// contiguous match. Fails closed: an empty path or an unlocated first
    /// edge yields false.
    pub fn is_subpath_of(&self, other: &Path) -> bool {
        let Some(first) = self.edges.first() else {
            return false;
        };
        let Some(offset) = other.edges.iter().position(|e| e.id() == first.id()) else {
            return false;
        };
        if offset + self.edges.len() > other.edges.len() {
            return false;
        }
        self.edges
            .iter()
            .zip(&other.edges[offset..])
            .all(|(a, b)| a.id() == b.id())
    }

    pub fn contains_vertex(&self, v: VertexId) -> bool {
        self.start.id() == v || self.edges.iter().any(|e| e.end().id() == v)
    }

    /// Orientation-free containment: the edge element occurs in this path.
    pub fn contains_edge(&self, edge: &Edge) -> bool {
        self.edges.iter().any(|e| e.normal_id() == edge.normal_id())
    }

    /// Number of path edges incident to `v` under the direction filter.
    pub fn degree(&self, v: VertexId, direction: EdgeDirection) -> usize {
        self.edges
            .iter()
            .filter(|e| e.is_incident(v, direction))
            .count()
    }

    /// The path edges incident to `v` under the direction filter, in path
    /// order, as a List of edge values.
    pub fn edges_connected(&self, v: VertexId, direction: EdgeDirection) -> List {
        self.edges
            .iter()
            .filter(|e| e.is_incident(v, direction))
            .map(|e| Value::from(e.clone()))
            .collect()
    }

    /// All vertices in path order (start first) as a List.
    pub fn vertices(&self) -> List {
        std::iter::once(&self.start)
            .chain(self.edges.iter().map(Edge::end))
            .map(|v| Value::from(v.clone()))
            .collect()
    }

    /// All edges in path order as a List.
    pub fn edges(&self) -> List {
        self.edges
            .iter()
            .map(|e| Value::from(e.clone()))
            .collect()
    }

    pub fn edge_slice(&self) -> &[Edge] {
        &self.edges
    }

    /// Does any element of the path carry this type?
    pub fn contains_type(&self, t: &TypeDescriptor) -> bool {
        self.start.vertex_type() == t
            || self
                .edges
                .iter()
                .any(|e| e.edge_type() == t || e.end().vertex_type() == t)
    }

    /// Canonical hash: order-sensitive mix chain over start and edges.
    pub fn value_hash(&self) -> u64 {
        let mut acc = hashing::mix(hashing::TAG_PATH, self.start.canonical_hash());
        for e in &self.edges {
            acc = hashing::mix(acc, e.canonical_hash());
        }
        acc
    }
}

impl fmt::Display for Path {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.start.id())?;
        for e in &self.edges {
            write!(f, " --{}-> {}", e.id(), e.end().id())?;
        }
        Ok(())
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
    fn add_edge_requires_contiguity() {
        let mut path = Path::new(v(1));
        assert!(path.add_edge(e(1, 2, 3)).is_err());
        assert!(path.add_edge(e(1, 1, 2)).is_ok());
        assert!(path.add_edge(e(2, 3, 4)).is_err());
        assert_eq!(path.length(), 1);
    }

    #[test]
    fn double_reverse_restores_the_path() {
        let mut path = Path::new(v(1));
        path.add_edge(e(1, 1, 2)).unwrap();
        path.add_edge(e(2, 2, 3)).unwrap();
        assert_eq!(path.reverse().reverse(), path);
    }

    #[test]
    fn subpath_requires_contiguous_match() {
        let mut long = Path::new(v(1));
        long.add_edge(e(1, 1, 2)).unwrap();
        long.add_edge(e(2, 2, 3)).unwrap();
        long.add_edge(e(3, 3, 4)).unwrap();

        let mut mid = Path::new(v(2));
        mid.add_edge(e(2, 2, 3)).unwrap();
        assert!(mid.is_subpath_of(&long));

        let mut skipping = Path::new(v(1));
        skipping.add_edge(e(1, 1, 2)).unwrap();
        skipping.add_edge(e(3, 2, 4)).unwrap();
        assert!(!skipping.is_subpath_of(&long));

        let empty = Path::new(v(1));
        assert!(!empty.is_subpath_of(&long));
    }
}
