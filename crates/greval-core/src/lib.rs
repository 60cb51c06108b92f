//! greval-core: the runtime value model of a graph query evaluator.
//!
//! Everything a query evaluates to is a [`Value`]: a tagged union over
//! scalars, schema-typed enums, graph-element references, a type-erased
//! object escape hatch, the collection algebra (Set, Bag, List, Tuple,
//! Record, Map, Table), and the path-search results (Path, PathSystem,
//! Slice).
//!
//! The load-bearing contracts:
//!
//! - **Equality and the canonical hash** ([`value`], [`hashing`]): equal
//!   values always share their canonical 64-bit hash, including the two
//!   sanctioned cross-variant equalities (Enum vs String, Object vs
//!   primitive). Hash-based collections key on this contract.
//! - **Collection mutation discipline** ([`set`], [`bag`]): detached cursors
//!   are generation-stamped and fail fast with
//!   [`ValueError::ConcurrentModification`] once the collection mutates
//!   underneath them.
//! - **Path-system lifecycle** ([`path_system`]): an Open build phase
//!   (`add_vertex` with distance tie-breaking and deferred parent edges),
//!   then `finish()` resolves deferrals and freezes the structure before any
//!   query runs.
//! - **Slices** ([`slice`]): the multi-root variant, clearing lazily on the
//!   first query after a mutation.
//!
//! Graph elements are reference records ([`graph`]); this crate never owns
//! graph storage.

pub mod bag;
pub mod error;
pub mod graph;
mod hashing;
pub mod list;
pub mod path;
pub mod path_system;
pub mod record_map;
pub mod set;
pub mod slice;
pub mod value;
pub mod visitor;

pub use bag::{Bag, BagCursor};
pub use error::{Result, ValueError};
pub use graph::{
    AutomatonId, BrowsingInfo, Edge, EdgeDirection, EdgeId, EnumValue, GraphId, GraphMarkerId,
    TypeDescriptor, Vertex, VertexId,
};
pub use list::{List, Tuple};
pub use path::Path;
pub use path_system::{PathSystem, PathSystemEntry, PathSystemKey};
pub use record_map::{Map, Record, Table, TABLE_HEADER_FIELD};
pub use set::{Set, SetCursor};
pub use slice::Slice;
pub use value::{
    conversion_cost, Number, Opaque, OpaqueValue, TypeCollection, Value, ValueData, ValueKind,
};
pub use visitor::{visit_sequence, ValueVisitor};
