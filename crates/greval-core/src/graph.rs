//! Collaborator-boundary types for the external graph store.
//!
//! This core never creates or deletes graph elements; it only references
//! them. A referenced element is a small self-contained record: a stable
//! integer identity plus whatever the traversal structures need locally
//! (endpoint ids for edges, a type descriptor for type filters). Lifetime
//! belongs to the graph store, so nothing here owns graph memory.
//!
//! Edge identities are signed: `e` and `-e` are the two orientations of the
//! same edge element. `normal_id()` gives the orientation-free element
//! identity, `reversed()` the opposite orientation.

use serde::{Deserialize, Serialize};
use std::fmt;

use crate::hashing;

// ============================================================================
// Stable integer identities
// ============================================================================

/// Stable vertex identity supplied by the graph store.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct VertexId(u32);

impl VertexId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for VertexId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "v{}", self.0)
    }
}

/// Stable oriented edge identity. Never zero; the sign encodes orientation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct EdgeId(i32);

impl EdgeId {
    /// `raw` must be non-zero; zero has no orientation to negate.
    pub fn new(raw: i32) -> Self {
        assert!(raw != 0, "edge id 0 is reserved");
        Self(raw)
    }

    pub const fn raw(self) -> i32 {
        self.0
    }

    /// Orientation-free element identity.
    pub const fn normal_id(self) -> i32 {
        self.0.abs()
    }

    pub const fn is_reversed(self) -> bool {
        self.0 < 0
    }

    pub const fn reversed(self) -> Self {
        Self(-self.0)
    }
}

impl fmt::Display for EdgeId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "e{}", self.0)
    }
}

/// Stable graph identity.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[repr(transparent)]
pub struct GraphId(u32);

impl GraphId {
    pub const fn new(raw: u32) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u32 {
        self.0
    }
}

impl fmt::Display for GraphId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "g{}", self.0)
    }
}

/// Opaque handle to an external graph marker.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct GraphMarkerId(u64);

impl GraphMarkerId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

/// Opaque handle to the automaton collaborator. State numbers inside a
/// PathSystem are plain `u32`s; this handle only identifies which automaton
/// produced them.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[repr(transparent)]
pub struct AutomatonId(u64);

impl AutomatonId {
    pub const fn new(raw: u64) -> Self {
        Self(raw)
    }

    pub const fn raw(self) -> u64 {
        self.0
    }
}

// ============================================================================
// Type descriptors and enum domains
// ============================================================================

/// Descriptor of a vertex/edge/attribute type in the external schema.
/// Identity is the qualified name.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
pub struct TypeDescriptor {
    qualified_name: String,
}

impl TypeDescriptor {
    pub fn new(qualified_name: impl Into<String>) -> Self {
        Self {
            qualified_name: qualified_name.into(),
        }
    }

    pub fn qualified_name(&self) -> &str {
        &self.qualified_name
    }

    pub(crate) fn canonical_hash(&self) -> u64 {
        hashing::mix(
            hashing::TAG_TYPE,
            hashing::fnv1a(self.qualified_name.as_bytes()),
        )
    }
}

impl fmt::Display for TypeDescriptor {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.qualified_name)
    }
}

/// A value of a schema-declared enumeration domain.
///
/// Equality against plain Strings with the same literal is sanctioned (and
/// symmetric), so the canonical hash is the literal's textual hash.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct EnumValue {
    enum_type: TypeDescriptor,
    literal: String,
    ordinal: u32,
}

impl EnumValue {
    pub fn new(enum_type: TypeDescriptor, literal: impl Into<String>, ordinal: u32) -> Self {
        Self {
            enum_type,
            literal: literal.into(),
            ordinal,
        }
    }

    pub fn enum_type(&self) -> &TypeDescriptor {
        &self.enum_type
    }

    pub fn literal(&self) -> &str {
        &self.literal
    }

    pub fn ordinal(&self) -> u32 {
        self.ordinal
    }

    pub(crate) fn canonical_hash(&self) -> u64 {
        hashing::hash_str(&self.literal)
    }
}

impl PartialEq for EnumValue {
    fn eq(&self, other: &Self) -> bool {
        self.enum_type == other.enum_type && self.literal == other.literal
    }
}

impl Eq for EnumValue {}

impl fmt::Display for EnumValue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.literal)
    }
}

// ============================================================================
// Element references
// ============================================================================

/// Reference record of an external vertex. Identity (equality, hash,
/// ordering) is the stable integer id; the type descriptor rides along for
/// type-filter queries.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Vertex {
    id: VertexId,
    vertex_type: TypeDescriptor,
}

impl Vertex {
    pub fn new(id: VertexId, vertex_type: TypeDescriptor) -> Self {
        Self { id, vertex_type }
    }

    pub fn id(&self) -> VertexId {
        self.id
    }

    pub fn vertex_type(&self) -> &TypeDescriptor {
        &self.vertex_type
    }

    pub(crate) fn canonical_hash(&self) -> u64 {
        hashing::mix(hashing::TAG_VERTEX, self.id.raw() as u64)
    }
}

impl PartialEq for Vertex {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Vertex {}

impl std::hash::Hash for Vertex {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.canonical_hash());
    }
}

impl fmt::Display for Vertex {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Reference record of one *oriented* external edge, self-contained enough
/// that paths and path systems never need a live graph handle: the endpoint
/// vertices ride along.
///
/// Identity is the signed id, so an edge and its reversal are distinct
/// values; use `normal_id()` when orientation must not matter.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Edge {
    id: EdgeId,
    start: Vertex,
    end: Vertex,
    edge_type: TypeDescriptor,
}

impl Edge {
    pub fn new(id: EdgeId, start: Vertex, end: Vertex, edge_type: TypeDescriptor) -> Self {
        Self {
            id,
            start,
            end,
            edge_type,
        }
    }

    pub fn id(&self) -> EdgeId {
        self.id
    }

    pub fn normal_id(&self) -> i32 {
        self.id.normal_id()
    }

    pub fn start(&self) -> &Vertex {
        &self.start
    }

    pub fn end(&self) -> &Vertex {
        &self.end
    }

    pub fn edge_type(&self) -> &TypeDescriptor {
        &self.edge_type
    }

    /// The same edge element traversed the other way.
    pub fn reversed(&self) -> Edge {
        Edge {
            id: self.id.reversed(),
            start: self.end.clone(),
            end: self.start.clone(),
            edge_type: self.edge_type.clone(),
        }
    }

    /// Is `v` an endpoint under the given direction filter? `Out` means the
    /// edge leaves `v`, `In` means it enters `v`.
    pub fn is_incident(&self, v: VertexId, direction: EdgeDirection) -> bool {
        match direction {
            EdgeDirection::Out => self.start.id() == v,
            EdgeDirection::In => self.end.id() == v,
            EdgeDirection::InOut => self.start.id() == v || self.end.id() == v,
        }
    }

    pub(crate) fn canonical_hash(&self) -> u64 {
        hashing::mix(hashing::TAG_EDGE, self.id.raw() as i64 as u64)
    }
}

impl PartialEq for Edge {
    fn eq(&self, other: &Self) -> bool {
        self.id == other.id
    }
}

impl Eq for Edge {}

impl std::hash::Hash for Edge {
    fn hash<H: std::hash::Hasher>(&self, state: &mut H) {
        state.write_u64(self.canonical_hash());
    }
}

impl fmt::Display for Edge {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.id)
    }
}

/// Direction filter for degree/incidence queries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum EdgeDirection {
    In,
    Out,
    InOut,
}

/// UI-navigation back-reference optionally carried by a value. Never affects
/// equality or hashing; a weak id-based reference resolved through the graph
/// collaborator.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum BrowsingInfo {
    Vertex(VertexId),
    Edge(EdgeId),
    Graph(GraphId),
}
