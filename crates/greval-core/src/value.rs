//! The universal tagged result type of a graph query.
//!
//! Every result the evaluator produces — scalar, graph element, collection,
//! path structure — is one [`Value`] with exactly one active variant.
//! Variant dispatch is a plain enum match (including the visitor, see
//! [`crate::visitor`]), so exhaustiveness is checked by the compiler.
//!
//! Two contracts shape everything here:
//!
//! - **Equality & hash**: values are equal iff same variant and equal
//!   payload, with exactly two sanctioned symmetric cross-variant cases —
//!   a generic Object against a compatible payload, and an Enum against a
//!   String with the same literal. The canonical hash is invariant under
//!   this equality, which the hash-based collections rely on.
//! - **Conversion cost**: a total function over variant pairs used by the
//!   evaluator to rank function overloads; see [`conversion_cost`].

use std::any::Any;
use std::cmp::Ordering;
use std::fmt;
use std::hash::{Hash, Hasher};
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::bag::Bag;
use crate::error::{Result, ValueError};
use crate::graph::{
    AutomatonId, BrowsingInfo, Edge, EnumValue, GraphId, GraphMarkerId, TypeDescriptor, Vertex,
};
use crate::hashing;
use crate::list::{List, Tuple};
use crate::path::Path;
use crate::path_system::PathSystem;
use crate::record_map::{Map, Record, Table};
use crate::set::Set;
use crate::slice::Slice;

// ============================================================================
// Kinds and conversion costs
// ============================================================================

/// Variant tags, plus the abstract conversion targets (`Number`,
/// `AttributedElement`, `Collection`) that are never the kind of a concrete
/// value but appear as overload parameter types.
///
/// Declaration order is the cross-variant total order used by
/// [`Value::total_order`]; `Invalid` sorts first.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum ValueKind {
    Invalid,
    Bool,
    Int,
    Long,
    Double,
    String,
    Enum,
    Type,
    Vertex,
    Edge,
    Graph,
    GraphMarker,
    Automaton,
    Object,
    Set,
    Bag,
    List,
    Tuple,
    Record,
    Map,
    Table,
    Path,
    PathSystem,
    Slice,
    TypeCollection,
    Number,
    AttributedElement,
    Collection,
}

impl ValueKind {
    pub fn is_collection(self) -> bool {
        matches!(
            self,
            ValueKind::Set
                | ValueKind::Bag
                | ValueKind::List
                | ValueKind::Tuple
                | ValueKind::Record
                | ValueKind::Map
                | ValueKind::Table
                | ValueKind::TypeCollection
        )
    }
}

impl fmt::Display for ValueKind {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            ValueKind::Invalid => "Invalid",
            ValueKind::Bool => "Bool",
            ValueKind::Int => "Int",
            ValueKind::Long => "Long",
            ValueKind::Double => "Double",
            ValueKind::String => "String",
            ValueKind::Enum => "Enum",
            ValueKind::Type => "Type",
            ValueKind::Vertex => "Vertex",
            ValueKind::Edge => "Edge",
            ValueKind::Graph => "Graph",
            ValueKind::GraphMarker => "GraphMarker",
            ValueKind::Automaton => "Automaton",
            ValueKind::Object => "Object",
            ValueKind::Set => "Set",
            ValueKind::Bag => "Bag",
            ValueKind::List => "List",
            ValueKind::Tuple => "Tuple",
            ValueKind::Record => "Record",
            ValueKind::Map => "Map",
            ValueKind::Table => "Table",
            ValueKind::Path => "Path",
            ValueKind::PathSystem => "PathSystem",
            ValueKind::Slice => "Slice",
            ValueKind::TypeCollection => "TypeCollection",
            ValueKind::Number => "Number",
            ValueKind::AttributedElement => "AttributedElement",
            ValueKind::Collection => "Collection",
        };
        f.write_str(name)
    }
}

/// Cost of converting a value of kind `from` into an overload parameter of
/// kind `to`. `None` means impossible; 0 an exact or free abstract match;
/// larger numbers are worse. The evaluator picks the candidate overload with
/// the smallest total cost, so the deliberately expensive `String`/`Object`
/// targets make generic overloads lose against specific ones.
pub fn conversion_cost(from: ValueKind, to: ValueKind) -> Option<u32> {
    use ValueKind as K;
    if from == to {
        return Some(0);
    }
    match (from, to) {
        // Numeric widening.
        (K::Int, K::Long) => Some(1),
        (K::Int, K::Double) | (K::Long, K::Double) => Some(2),
        (K::Int | K::Long | K::Double, K::Number) => Some(0),
        // Graph elements are attributed elements.
        (K::Vertex | K::Edge | K::Graph, K::AttributedElement) => Some(0),
        // Collections, and the path structures viewed as their node sets.
        (
            K::Set | K::Bag | K::List | K::Tuple | K::Record | K::Map | K::Table
            | K::TypeCollection,
            K::Collection,
        ) => Some(0),
        (K::PathSystem | K::Slice, K::Collection) => Some(10),
        // Everything has a textual and an opaque rendition, at a price.
        (_, K::String) => Some(100),
        (_, K::Object) => Some(100),
        _ => None,
    }
}

// ============================================================================
// Opaque payloads (the Object variant)
// ============================================================================

/// Type-erased payload of the generic `Object` variant.
///
/// The cross-variant equality exception requires an Object wrapping a
/// primitive to equal (and hash like) the primitive's own variant, so the
/// primitive impls below canonicalize both; `eq_data` stays `false` for
/// everything else.
pub trait OpaqueValue: fmt::Debug + fmt::Display {
    fn as_any(&self) -> &dyn Any;
    fn dyn_eq(&self, other: &dyn Any) -> bool;
    fn dyn_hash(&self) -> u64;
    /// Equality against a non-Object value. Only the primitive payloads
    /// sanction this; the default refuses.
    fn eq_data(&self, other: &ValueData) -> bool {
        let _ = other;
        false
    }
}

impl OpaqueValue for bool {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<bool>() == Some(self)
    }

    fn dyn_hash(&self) -> u64 {
        hashing::hash_bool(*self)
    }

    fn eq_data(&self, other: &ValueData) -> bool {
        matches!(other, ValueData::Bool(b) if b == self)
    }
}

impl OpaqueValue for i32 {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<i32>() == Some(self)
    }

    fn dyn_hash(&self) -> u64 {
        hashing::hash_int(*self)
    }

    fn eq_data(&self, other: &ValueData) -> bool {
        matches!(other, ValueData::Int(i) if i == self)
    }
}

impl OpaqueValue for i64 {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<i64>() == Some(self)
    }

    fn dyn_hash(&self) -> u64 {
        hashing::hash_long(*self)
    }

    fn eq_data(&self, other: &ValueData) -> bool {
        matches!(other, ValueData::Long(l) if l == self)
    }
}

impl OpaqueValue for f64 {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other
            .downcast_ref::<f64>()
            .map_or(false, |o| o.to_bits() == self.to_bits())
    }

    fn dyn_hash(&self) -> u64 {
        hashing::hash_double(*self)
    }

    fn eq_data(&self, other: &ValueData) -> bool {
        matches!(other, ValueData::Double(d) if d.to_bits() == self.to_bits())
    }
}

impl OpaqueValue for String {
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<String>() == Some(self)
    }

    fn dyn_hash(&self) -> u64 {
        hashing::hash_str(self)
    }

    fn eq_data(&self, other: &ValueData) -> bool {
        matches!(other, ValueData::String(s) if s == self)
    }
}

/// Wrapper turning any `Eq + Hash + Debug` payload into an opaque value.
#[derive(Debug, Clone, PartialEq, Eq, Hash)]
pub struct Opaque<T>(pub T);

impl<T> fmt::Display for Opaque<T>
where
    T: fmt::Debug,
{
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self.0)
    }
}

impl<T> OpaqueValue for Opaque<T>
where
    T: Any + Eq + Hash + fmt::Debug,
{
    fn as_any(&self) -> &dyn Any {
        self
    }

    fn dyn_eq(&self, other: &dyn Any) -> bool {
        other.downcast_ref::<Opaque<T>>().map_or(false, |o| o == self)
    }

    fn dyn_hash(&self) -> u64 {
        // Fixed-key hasher: the canonical hash must not vary per instance.
        let mut h = ahash::AHasher::default();
        self.0.hash(&mut h);
        h.finish()
    }
}

// ============================================================================
// Numbers
// ============================================================================

/// View of the numeric variants produced by [`Value::as_number`].
#[derive(Debug, Clone, Copy, PartialEq)]
pub enum Number {
    Int(i32),
    Long(i64),
    Double(f64),
}

impl Number {
    pub fn to_f64(self) -> f64 {
        match self {
            Number::Int(i) => i as f64,
            Number::Long(l) => l as f64,
            Number::Double(d) => d,
        }
    }

    /// Integral view; a Double is truncated.
    pub fn to_i64(self) -> i64 {
        match self {
            Number::Int(i) => i as i64,
            Number::Long(l) => l,
            Number::Double(d) => d as i64,
        }
    }
}

// ============================================================================
// Type collections
// ============================================================================

/// A set of allowed and forbidden type descriptors, used as a type filter in
/// degree/containment queries. An empty allowed set admits everything not
/// forbidden.
#[derive(Debug, Clone, Default)]
pub struct TypeCollection {
    allowed: indexmap::IndexSet<TypeDescriptor, ahash::RandomState>,
    forbidden: indexmap::IndexSet<TypeDescriptor, ahash::RandomState>,
}

impl TypeCollection {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn add_allowed(&mut self, t: TypeDescriptor) {
        self.allowed.insert(t);
    }

    pub fn add_forbidden(&mut self, t: TypeDescriptor) {
        self.forbidden.insert(t);
    }

    pub fn allows(&self, t: &TypeDescriptor) -> bool {
        if self.forbidden.contains(t) {
            return false;
        }
        self.allowed.is_empty() || self.allowed.contains(t)
    }

    pub fn is_empty(&self) -> bool {
        self.allowed.is_empty() && self.forbidden.is_empty()
    }

    pub fn allowed(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.allowed.iter()
    }

    pub fn forbidden(&self) -> impl Iterator<Item = &TypeDescriptor> {
        self.forbidden.iter()
    }

    pub fn value_hash(&self) -> u64 {
        let a = hashing::fold_elements(
            hashing::TAG_TYPE_COLLECTION,
            self.allowed.iter().map(TypeDescriptor::canonical_hash),
        );
        let f = hashing::fold_elements(
            hashing::TAG_TYPE_COLLECTION,
            self.forbidden.iter().map(TypeDescriptor::canonical_hash),
        );
        hashing::mix(a, f)
    }
}

impl PartialEq for TypeCollection {
    fn eq(&self, other: &Self) -> bool {
        self.allowed == other.allowed && self.forbidden == other.forbidden
    }
}

impl Eq for TypeCollection {}

impl fmt::Display for TypeCollection {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str("types(")?;
        for (i, t) in self.allowed.iter().enumerate() {
            if i > 0 {
                f.write_str(", ")?;
            }
            write!(f, "+{t}")?;
        }
        for (i, t) in self.forbidden.iter().enumerate() {
            if i > 0 || !self.allowed.is_empty() {
                f.write_str(", ")?;
            }
            write!(f, "-{t}")?;
        }
        f.write_str(")")
    }
}

// ============================================================================
// The value itself
// ============================================================================

/// The active variant and payload of a [`Value`].
#[derive(Debug, Clone)]
pub enum ValueData {
    Invalid,
    Bool(bool),
    Int(i32),
    Long(i64),
    Double(f64),
    String(String),
    Enum(EnumValue),
    Type(TypeDescriptor),
    Vertex(Vertex),
    Edge(Edge),
    Graph(GraphId),
    GraphMarker(GraphMarkerId),
    Automaton(AutomatonId),
    Object(Arc<dyn OpaqueValue>),
    Set(Set),
    Bag(Bag),
    List(List),
    Tuple(Tuple),
    Record(Record),
    Map(Map),
    Table(Table),
    Path(Path),
    PathSystem(PathSystem),
    Slice(Slice),
    TypeCollection(TypeCollection),
}

/// One polymorphic query result: a [`ValueData`] plus an optional
/// browsing-info back-reference that never affects equality or hashing.
#[derive(Debug, Clone)]
pub struct Value {
    data: ValueData,
    browsing_info: Option<BrowsingInfo>,
}

impl Value {
    pub fn new(data: ValueData) -> Self {
        Self {
            data,
            browsing_info: None,
        }
    }

    /// The variant-less sentinel. Has no payload; stringifies to `null`.
    pub fn invalid() -> Self {
        Self::new(ValueData::Invalid)
    }

    /// Wrap an arbitrary opaque payload.
    pub fn object(payload: impl OpaqueValue + 'static) -> Self {
        Self::new(ValueData::Object(Arc::new(payload)))
    }

    pub fn data(&self) -> &ValueData {
        &self.data
    }

    pub fn kind(&self) -> ValueKind {
        match &self.data {
            ValueData::Invalid => ValueKind::Invalid,
            ValueData::Bool(_) => ValueKind::Bool,
            ValueData::Int(_) => ValueKind::Int,
            ValueData::Long(_) => ValueKind::Long,
            ValueData::Double(_) => ValueKind::Double,
            ValueData::String(_) => ValueKind::String,
            ValueData::Enum(_) => ValueKind::Enum,
            ValueData::Type(_) => ValueKind::Type,
            ValueData::Vertex(_) => ValueKind::Vertex,
            ValueData::Edge(_) => ValueKind::Edge,
            ValueData::Graph(_) => ValueKind::Graph,
            ValueData::GraphMarker(_) => ValueKind::GraphMarker,
            ValueData::Automaton(_) => ValueKind::Automaton,
            ValueData::Object(_) => ValueKind::Object,
            ValueData::Set(_) => ValueKind::Set,
            ValueData::Bag(_) => ValueKind::Bag,
            ValueData::List(_) => ValueKind::List,
            ValueData::Tuple(_) => ValueKind::Tuple,
            ValueData::Record(_) => ValueKind::Record,
            ValueData::Map(_) => ValueKind::Map,
            ValueData::Table(_) => ValueKind::Table,
            ValueData::Path(_) => ValueKind::Path,
            ValueData::PathSystem(_) => ValueKind::PathSystem,
            ValueData::Slice(_) => ValueKind::Slice,
            ValueData::TypeCollection(_) => ValueKind::TypeCollection,
        }
    }

    pub fn is_invalid(&self) -> bool {
        matches!(self.data, ValueData::Invalid)
    }

    pub fn is_valid(&self) -> bool {
        !self.is_invalid()
    }

    // ------------------------------------------------------------------
    // Browsing info
    // ------------------------------------------------------------------

    pub fn browsing_info(&self) -> Option<BrowsingInfo> {
        self.browsing_info
    }

    pub fn set_browsing_info(&mut self, info: Option<BrowsingInfo>) {
        self.browsing_info = info;
    }

    pub fn with_browsing_info(mut self, info: BrowsingInfo) -> Self {
        self.browsing_info = Some(info);
        self
    }

    // ------------------------------------------------------------------
    // Strict accessors: payload or InvalidType
    // ------------------------------------------------------------------

    pub fn as_bool(&self) -> Result<bool> {
        match &self.data {
            ValueData::Bool(b) => Ok(*b),
            _ => Err(ValueError::invalid_type(ValueKind::Bool, self.kind())),
        }
    }

    pub fn as_int(&self) -> Result<i32> {
        match &self.data {
            ValueData::Int(i) => Ok(*i),
            _ => Err(ValueError::invalid_type(ValueKind::Int, self.kind())),
        }
    }

    pub fn as_long(&self) -> Result<i64> {
        match &self.data {
            ValueData::Long(l) => Ok(*l),
            _ => Err(ValueError::invalid_type(ValueKind::Long, self.kind())),
        }
    }

    pub fn as_double(&self) -> Result<f64> {
        match &self.data {
            ValueData::Double(d) => Ok(*d),
            _ => Err(ValueError::invalid_type(ValueKind::Double, self.kind())),
        }
    }

    pub fn as_str(&self) -> Result<&str> {
        match &self.data {
            ValueData::String(s) => Ok(s),
            _ => Err(ValueError::invalid_type(ValueKind::String, self.kind())),
        }
    }

    pub fn as_enum(&self) -> Result<&EnumValue> {
        match &self.data {
            ValueData::Enum(e) => Ok(e),
            _ => Err(ValueError::invalid_type(ValueKind::Enum, self.kind())),
        }
    }

    pub fn as_type(&self) -> Result<&TypeDescriptor> {
        match &self.data {
            ValueData::Type(t) => Ok(t),
            _ => Err(ValueError::invalid_type(ValueKind::Type, self.kind())),
        }
    }

    pub fn as_vertex(&self) -> Result<&Vertex> {
        match &self.data {
            ValueData::Vertex(v) => Ok(v),
            _ => Err(ValueError::invalid_type(ValueKind::Vertex, self.kind())),
        }
    }

    pub fn as_edge(&self) -> Result<&Edge> {
        match &self.data {
            ValueData::Edge(e) => Ok(e),
            _ => Err(ValueError::invalid_type(ValueKind::Edge, self.kind())),
        }
    }

    pub fn as_graph(&self) -> Result<GraphId> {
        match &self.data {
            ValueData::Graph(g) => Ok(*g),
            _ => Err(ValueError::invalid_type(ValueKind::Graph, self.kind())),
        }
    }

    pub fn as_graph_marker(&self) -> Result<GraphMarkerId> {
        match &self.data {
            ValueData::GraphMarker(m) => Ok(*m),
            _ => Err(ValueError::invalid_type(ValueKind::GraphMarker, self.kind())),
        }
    }

    pub fn as_automaton(&self) -> Result<AutomatonId> {
        match &self.data {
            ValueData::Automaton(a) => Ok(*a),
            _ => Err(ValueError::invalid_type(ValueKind::Automaton, self.kind())),
        }
    }

    pub fn as_set(&self) -> Result<&Set> {
        match &self.data {
            ValueData::Set(s) => Ok(s),
            _ => Err(ValueError::invalid_type(ValueKind::Set, self.kind())),
        }
    }

    pub fn as_set_mut(&mut self) -> Result<&mut Set> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::Set(s) => Ok(s),
            _ => Err(ValueError::invalid_type(ValueKind::Set, kind)),
        }
    }

    pub fn as_bag(&self) -> Result<&Bag> {
        match &self.data {
            ValueData::Bag(b) => Ok(b),
            _ => Err(ValueError::invalid_type(ValueKind::Bag, self.kind())),
        }
    }

    pub fn as_bag_mut(&mut self) -> Result<&mut Bag> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::Bag(b) => Ok(b),
            _ => Err(ValueError::invalid_type(ValueKind::Bag, kind)),
        }
    }

    pub fn as_list(&self) -> Result<&List> {
        match &self.data {
            ValueData::List(l) => Ok(l),
            _ => Err(ValueError::invalid_type(ValueKind::List, self.kind())),
        }
    }

    pub fn as_list_mut(&mut self) -> Result<&mut List> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::List(l) => Ok(l),
            _ => Err(ValueError::invalid_type(ValueKind::List, kind)),
        }
    }

    pub fn as_tuple(&self) -> Result<&Tuple> {
        match &self.data {
            ValueData::Tuple(t) => Ok(t),
            _ => Err(ValueError::invalid_type(ValueKind::Tuple, self.kind())),
        }
    }

    pub fn as_tuple_mut(&mut self) -> Result<&mut Tuple> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::Tuple(t) => Ok(t),
            _ => Err(ValueError::invalid_type(ValueKind::Tuple, kind)),
        }
    }

    pub fn as_record(&self) -> Result<&Record> {
        match &self.data {
            ValueData::Record(r) => Ok(r),
            _ => Err(ValueError::invalid_type(ValueKind::Record, self.kind())),
        }
    }

    pub fn as_record_mut(&mut self) -> Result<&mut Record> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::Record(r) => Ok(r),
            _ => Err(ValueError::invalid_type(ValueKind::Record, kind)),
        }
    }

    pub fn as_map(&self) -> Result<&Map> {
        match &self.data {
            ValueData::Map(m) => Ok(m),
            _ => Err(ValueError::invalid_type(ValueKind::Map, self.kind())),
        }
    }

    pub fn as_map_mut(&mut self) -> Result<&mut Map> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::Map(m) => Ok(m),
            _ => Err(ValueError::invalid_type(ValueKind::Map, kind)),
        }
    }

    pub fn as_table(&self) -> Result<&Table> {
        match &self.data {
            ValueData::Table(t) => Ok(t),
            _ => Err(ValueError::invalid_type(ValueKind::Table, self.kind())),
        }
    }

    pub fn as_table_mut(&mut self) -> Result<&mut Table> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::Table(t) => Ok(t),
            _ => Err(ValueError::invalid_type(ValueKind::Table, kind)),
        }
    }

    pub fn as_path(&self) -> Result<&Path> {
        match &self.data {
            ValueData::Path(p) => Ok(p),
            _ => Err(ValueError::invalid_type(ValueKind::Path, self.kind())),
        }
    }

    pub fn as_path_system(&self) -> Result<&PathSystem> {
        match &self.data {
            ValueData::PathSystem(p) => Ok(p),
            _ => Err(ValueError::invalid_type(ValueKind::PathSystem, self.kind())),
        }
    }

    pub fn as_path_system_mut(&mut self) -> Result<&mut PathSystem> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::PathSystem(p) => Ok(p),
            _ => Err(ValueError::invalid_type(ValueKind::PathSystem, kind)),
        }
    }

    pub fn as_slice(&self) -> Result<&Slice> {
        match &self.data {
            ValueData::Slice(s) => Ok(s),
            _ => Err(ValueError::invalid_type(ValueKind::Slice, self.kind())),
        }
    }

    pub fn as_slice_mut(&mut self) -> Result<&mut Slice> {
        let kind = self.kind();
        match &mut self.data {
            ValueData::Slice(s) => Ok(s),
            _ => Err(ValueError::invalid_type(ValueKind::Slice, kind)),
        }
    }

    pub fn as_type_collection(&self) -> Result<&TypeCollection> {
        match &self.data {
            ValueData::TypeCollection(tc) => Ok(tc),
            _ => Err(ValueError::invalid_type(
                ValueKind::TypeCollection,
                self.kind(),
            )),
        }
    }

    // ------------------------------------------------------------------
    // Broad accessors: succeed per the conversion-cost table
    // ------------------------------------------------------------------

    /// Numeric view of Int/Long/Double values.
    pub fn as_number(&self) -> Result<Number> {
        match &self.data {
            ValueData::Int(i) => Ok(Number::Int(*i)),
            ValueData::Long(l) => Ok(Number::Long(*l)),
            ValueData::Double(d) => Ok(Number::Double(*d)),
            _ => Err(ValueError::invalid_type(ValueKind::Number, self.kind())),
        }
    }

    /// Opaque view of any value: an Object's payload directly, a primitive's
    /// canonical payload, or the textual representation of everything else.
    pub fn as_object(&self) -> Arc<dyn OpaqueValue> {
        match &self.data {
            ValueData::Object(o) => Arc::clone(o),
            ValueData::Bool(b) => Arc::new(*b),
            ValueData::Int(i) => Arc::new(*i),
            ValueData::Long(l) => Arc::new(*l),
            ValueData::Double(d) => Arc::new(*d),
            ValueData::String(s) => Arc::new(s.clone()),
            _ => Arc::new(self.to_string()),
        }
    }

    /// Textual view of any value (conversion cost 100, never fails).
    pub fn as_string(&self) -> String {
        self.to_string()
    }

    /// Collection view per the cost table: collections pass through, a
    /// PathSystem or Slice converts to its node set (cost 10).
    pub fn to_collection(&self) -> Result<Value> {
        match &self.data {
            ValueData::Set(_)
            | ValueData::Bag(_)
            | ValueData::List(_)
            | ValueData::Tuple(_)
            | ValueData::Record(_)
            | ValueData::Map(_)
            | ValueData::Table(_)
            | ValueData::TypeCollection(_) => Ok(self.clone()),
            ValueData::PathSystem(ps) => Ok(Value::from(ps.nodes()?)),
            ValueData::Slice(s) => Ok(Value::from(s.nodes()?)),
            _ => Err(ValueError::invalid_type(ValueKind::Collection, self.kind())),
        }
    }

    // ------------------------------------------------------------------
    // Textual round-trips
    // ------------------------------------------------------------------

    pub fn parse_bool(s: &str) -> Option<Value> {
        s.parse::<bool>().ok().map(Value::from)
    }

    pub fn parse_int(s: &str) -> Option<Value> {
        s.parse::<i32>().ok().map(Value::from)
    }

    pub fn parse_long(s: &str) -> Option<Value> {
        s.parse::<i64>().ok().map(Value::from)
    }

    pub fn parse_double(s: &str) -> Option<Value> {
        s.parse::<f64>().ok().map(Value::from)
    }

    // ------------------------------------------------------------------
    // Hashing and ordering
    // ------------------------------------------------------------------

    /// Canonical 64-bit hash, invariant under the value equality rule.
    pub fn value_hash(&self) -> u64 {
        match &self.data {
            ValueData::Invalid => hashing::INVALID_HASH,
            ValueData::Bool(b) => hashing::hash_bool(*b),
            ValueData::Int(i) => hashing::hash_int(*i),
            ValueData::Long(l) => hashing::hash_long(*l),
            ValueData::Double(d) => hashing::hash_double(*d),
            ValueData::String(s) => hashing::hash_str(s),
            // Enums hash as their literal so Enum == String implies equal
            // hashes.
            ValueData::Enum(e) => e.canonical_hash(),
            ValueData::Type(t) => t.canonical_hash(),
            ValueData::Vertex(v) => v.canonical_hash(),
            ValueData::Edge(e) => e.canonical_hash(),
            ValueData::Graph(g) => hashing::mix(hashing::TAG_GRAPH, g.raw() as u64),
            ValueData::GraphMarker(m) => hashing::mix(hashing::TAG_GRAPH_MARKER, m.raw()),
            ValueData::Automaton(a) => hashing::mix(hashing::TAG_AUTOMATON, a.raw()),
            ValueData::Object(o) => o.dyn_hash(),
            ValueData::Set(s) => s.value_hash(),
            ValueData::Bag(b) => b.value_hash(),
            ValueData::List(l) => l.value_hash(),
            ValueData::Tuple(t) => t.value_hash(),
            ValueData::Record(r) => r.value_hash(),
            ValueData::Map(m) => m.value_hash(),
            ValueData::Table(t) => t.value_hash(),
            ValueData::Path(p) => p.value_hash(),
            ValueData::PathSystem(ps) => ps.value_hash(),
            ValueData::Slice(s) => s.value_hash(),
            ValueData::TypeCollection(tc) => tc.value_hash(),
        }
    }

    /// Total order over values: variant tag first (Invalid sorts before
    /// everything), then the natural in-variant order, falling back to the
    /// canonical hash. Distinct from `==`: the sanctioned cross-variant
    /// equalities cannot be made consistent with a variant-tag order, which
    /// is why this is a named method rather than an `Ord` impl.
    pub fn total_order(&self, other: &Self) -> Ordering {
        use ValueData as D;
        let ra = self.kind() as u32;
        let rb = other.kind() as u32;
        if ra != rb {
            return ra.cmp(&rb);
        }
        match (&self.data, &other.data) {
            (D::Invalid, D::Invalid) => Ordering::Equal,
            // true sorts before false.
            (D::Bool(a), D::Bool(b)) => b.cmp(a),
            (D::Int(a), D::Int(b)) => a.cmp(b),
            (D::Long(a), D::Long(b)) => a.cmp(b),
            (D::Double(a), D::Double(b)) => a.total_cmp(b),
            (D::String(a), D::String(b)) => a.cmp(b),
            (D::Enum(a), D::Enum(b)) => a.ordinal().cmp(&b.ordinal()),
            (D::Type(a), D::Type(b)) => a.qualified_name().cmp(b.qualified_name()),
            (D::Vertex(a), D::Vertex(b)) => a.id().cmp(&b.id()),
            (D::Edge(a), D::Edge(b)) => a.id().cmp(&b.id()),
            (D::Graph(a), D::Graph(b)) => a.cmp(b),
            _ => self.value_hash().cmp(&other.value_hash()),
        }
    }
}

impl Default for Value {
    fn default() -> Self {
        Value::invalid()
    }
}

impl PartialEq for Value {
    fn eq(&self, other: &Self) -> bool {
        use ValueData as D;
        match (&self.data, &other.data) {
            (D::Invalid, D::Invalid) => true,
            (D::Bool(a), D::Bool(b)) => a == b,
            (D::Int(a), D::Int(b)) => a == b,
            (D::Long(a), D::Long(b)) => a == b,
            // Bit equality: NaN equals itself, so Doubles are usable as
            // Set/Map elements.
            (D::Double(a), D::Double(b)) => a.to_bits() == b.to_bits(),
            (D::String(a), D::String(b)) => a == b,
            (D::Enum(a), D::Enum(b)) => a == b,
            // Sanctioned cross-variant equality #1: Enum vs String with the
            // same literal (symmetric by the or-pattern).
            (D::Enum(e), D::String(s)) | (D::String(s), D::Enum(e)) => e.literal() == s,
            (D::Type(a), D::Type(b)) => a == b,
            (D::Vertex(a), D::Vertex(b)) => a == b,
            (D::Edge(a), D::Edge(b)) => a == b,
            (D::Graph(a), D::Graph(b)) => a == b,
            (D::GraphMarker(a), D::GraphMarker(b)) => a == b,
            (D::Automaton(a), D::Automaton(b)) => a == b,
            (D::Object(a), D::Object(b)) => a.dyn_eq(b.as_any()),
            // Sanctioned cross-variant equality #2: Object vs a compatible
            // payload (symmetric: both arms delegate to the same check).
            (D::Object(o), data) | (data, D::Object(o)) => o.eq_data(data),
            (D::Set(a), D::Set(b)) => a == b,
            (D::Bag(a), D::Bag(b)) => a == b,
            (D::List(a), D::List(b)) => a == b,
            (D::Tuple(a), D::Tuple(b)) => a == b,
            (D::Record(a), D::Record(b)) => a == b,
            (D::Map(a), D::Map(b)) => a == b,
            (D::Table(a), D::Table(b)) => a == b,
            (D::Path(a), D::Path(b)) => a == b,
            (D::PathSystem(a), D::PathSystem(b)) => a == b,
            (D::Slice(a), D::Slice(b)) => a == b,
            (D::TypeCollection(a), D::TypeCollection(b)) => a == b,
            _ => false,
        }
    }
}

impl Eq for Value {}

impl Hash for Value {
    fn hash<H: Hasher>(&self, state: &mut H) {
        state.write_u64(self.value_hash());
    }
}

impl fmt::Display for Value {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match &self.data {
            ValueData::Invalid => f.write_str("null"),
            ValueData::Bool(b) => write!(f, "{b}"),
            ValueData::Int(i) => write!(f, "{i}"),
            ValueData::Long(l) => write!(f, "{l}"),
            ValueData::Double(d) => write!(f, "{d}"),
            ValueData::String(s) => f.write_str(s),
            ValueData::Enum(e) => write!(f, "{e}"),
            ValueData::Type(t) => write!(f, "{t}"),
            ValueData::Vertex(v) => write!(f, "{v}"),
            ValueData::Edge(e) => write!(f, "{e}"),
            ValueData::Graph(g) => write!(f, "{g}"),
            ValueData::GraphMarker(m) => write!(f, "marker#{}", m.raw()),
            ValueData::Automaton(a) => write!(f, "automaton#{}", a.raw()),
            ValueData::Object(o) => write!(f, "{o}"),
            ValueData::Set(s) => write!(f, "{s}"),
            ValueData::Bag(b) => write!(f, "{b}"),
            ValueData::List(l) => write!(f, "{l}"),
            ValueData::Tuple(t) => write!(f, "{t}"),
            ValueData::Record(r) => write!(f, "{r}"),
            ValueData::Map(m) => write!(f, "{m}"),
            ValueData::Table(t) => write!(f, "{t}"),
            ValueData::Path(p) => write!(f, "{p}"),
            ValueData::PathSystem(ps) => write!(f, "{ps}"),
            ValueData::Slice(s) => write!(f, "{s}"),
            ValueData::TypeCollection(tc) => write!(f, "{tc}"),
        }
    }
}

// ------------------------------------------------------------------
// Constructors from native payloads
// ------------------------------------------------------------------

impl From<ValueData> for Value {
    fn from(data: ValueData) -> Self {
        Value::new(data)
    }
}

macro_rules! impl_from {
    ($($ty:ty => $variant:ident),* $(,)?) => {
        $(
            impl From<$ty> for Value {
                fn from(v: $ty) -> Self {
                    Value::new(ValueData::$variant(v))
                }
            }
        )*
    };
}

impl_from! {
    bool => Bool,
    i32 => Int,
    i64 => Long,
    f64 => Double,
    String => String,
    EnumValue => Enum,
    TypeDescriptor => Type,
    Vertex => Vertex,
    Edge => Edge,
    GraphId => Graph,
    GraphMarkerId => GraphMarker,
    AutomatonId => Automaton,
    Set => Set,
    Bag => Bag,
    List => List,
    Tuple => Tuple,
    Record => Record,
    Map => Map,
    Table => Table,
    Path => Path,
    PathSystem => PathSystem,
    Slice => Slice,
    TypeCollection => TypeCollection,
}

impl From<&str> for Value {
    fn from(s: &str) -> Self {
        Value::new(ValueData::String(s.to_string()))
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn invalid_stringifies_to_null_and_has_fixed_hash() {
        let v = Value::invalid();
        assert_eq!(v.to_string(), "null");
        assert_eq!(v.value_hash(), Value::invalid().value_hash());
    }

    #[test]
    fn enum_equals_string_with_same_literal_symmetrically() {
        let color = TypeDescriptor::new("Color");
        let red = Value::from(EnumValue::new(color, "RED", 0));
        let s = Value::from("RED");
        assert_eq!(red, s);
        assert_eq!(s, red);
        assert_eq!(red.value_hash(), s.value_hash());
        assert_ne!(red, Value::from("BLUE"));
    }

    #[test]
    fn object_equals_compatible_primitive_symmetrically() {
        let obj = Value::object(5i32);
        let int = Value::from(5);
        assert_eq!(obj, int);
        assert_eq!(int, obj);
        assert_eq!(obj.value_hash(), int.value_hash());
        assert_ne!(obj, Value::from(6));
        assert_ne!(obj, Value::from(5i64));
    }

    #[test]
    fn browsing_info_never_affects_equality_or_hash() {
        use crate::graph::VertexId;
        let plain = Value::from(42);
        let tagged = Value::from(42).with_browsing_info(BrowsingInfo::Vertex(VertexId::new(7)));
        assert_eq!(plain, tagged);
        assert_eq!(plain.value_hash(), tagged.value_hash());
    }
}
