//! Double dispatch over values.
//!
//! A visitor implements `visit_*` for the variants it understands; every
//! hook it leaves out falls through to [`ValueVisitor::cannot_visit`], which
//! refuses by default. Output-oriented visitors additionally get structural
//! hooks (`pre`/`inter`/`post` around sequences, `head`/`foot` around a whole
//! document) that default to no-ops.

use std::sync::Arc;

use crate::bag::Bag;
use crate::error::{Result, ValueError};
use crate::graph::{AutomatonId, Edge, EnumValue, GraphId, GraphMarkerId, TypeDescriptor, Vertex};
use crate::list::{List, Tuple};
use crate::path::Path;
use crate::path_system::PathSystem;
use crate::record_map::{Map, Record, Table};
use crate::set::Set;
use crate::slice::Slice;
use crate::value::{OpaqueValue, TypeCollection, Value, ValueData, ValueKind};

pub trait ValueVisitor {
    // ------------------------------------------------------------------
    // Variant hooks, one per concrete variant
    // ------------------------------------------------------------------

    fn visit_invalid(&mut self) -> Result<()> {
        self.cannot_visit(ValueKind::Invalid)
    }

    fn visit_bool(&mut self, value: bool) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Bool)
    }

    fn visit_int(&mut self, value: i32) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Int)
    }

    fn visit_long(&mut self, value: i64) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Long)
    }

    fn visit_double(&mut self, value: f64) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Double)
    }

    fn visit_string(&mut self, value: &str) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::String)
    }

    fn visit_enum(&mut self, value: &EnumValue) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Enum)
    }

    fn visit_type(&mut self, value: &TypeDescriptor) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Type)
    }

    fn visit_vertex(&mut self, value: &Vertex) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Vertex)
    }

    fn visit_edge(&mut self, value: &Edge) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Edge)
    }

    fn visit_graph(&mut self, value: GraphId) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Graph)
    }

    fn visit_graph_marker(&mut self, value: GraphMarkerId) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::GraphMarker)
    }

    fn visit_automaton(&mut self, value: AutomatonId) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Automaton)
    }

    fn visit_object(&mut self, value: &Arc<dyn OpaqueValue>) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Object)
    }

    fn visit_set(&mut self, value: &Set) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Set)
    }

    fn visit_bag(&mut self, value: &Bag) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Bag)
    }

    fn visit_list(&mut self, value: &List) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::List)
    }

    fn visit_tuple(&mut self, value: &Tuple) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Tuple)
    }

    fn visit_record(&mut self, value: &Record) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Record)
    }

    fn visit_map(&mut self, value: &Map) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Map)
    }

    fn visit_table(&mut self, value: &Table) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Table)
    }

    fn visit_path(&mut self, value: &Path) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Path)
    }

    fn visit_path_system(&mut self, value: &PathSystem) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::PathSystem)
    }

    fn visit_slice(&mut self, value: &Slice) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::Slice)
    }

    fn visit_type_collection(&mut self, value: &TypeCollection) -> Result<()> {
        let _ = value;
        self.cannot_visit(ValueKind::TypeCollection)
    }

    // ------------------------------------------------------------------
    // Structural hooks, all no-ops by default
    // ------------------------------------------------------------------

    /// Before the first element of a sequence.
    fn pre(&mut self) -> Result<()> {
        Ok(())
    }

    /// Between two elements of a sequence.
    fn inter(&mut self) -> Result<()> {
        Ok(())
    }

    /// After the last element of a sequence.
    fn post(&mut self) -> Result<()> {
        Ok(())
    }

    /// Before an entire document.
    fn head(&mut self) -> Result<()> {
        Ok(())
    }

    /// After an entire document.
    fn foot(&mut self) -> Result<()> {
        Ok(())
    }

    /// Fallback for every variant hook the visitor does not override.
    fn cannot_visit(&mut self, kind: ValueKind) -> Result<()> {
        Err(ValueError::CannotVisit(kind))
    }
}

impl Value {
    /// Dispatch to the visitor hook matching this value's variant. The match
    /// is exhaustive, so adding a variant without a hook will not compile.
    pub fn accept<V>(&self, visitor: &mut V) -> Result<()>
    where
        V: ValueVisitor + ?Sized,
    {
        match self.data() {
            ValueData::Invalid => visitor.visit_invalid(),
            ValueData::Bool(b) => visitor.visit_bool(*b),
            ValueData::Int(i) => visitor.visit_int(*i),
            ValueData::Long(l) => visitor.visit_long(*l),
            ValueData::Double(d) => visitor.visit_double(*d),
            ValueData::String(s) => visitor.visit_string(s),
            ValueData::Enum(e) => visitor.visit_enum(e),
            ValueData::Type(t) => visitor.visit_type(t),
            ValueData::Vertex(v) => visitor.visit_vertex(v),
            ValueData::Edge(e) => visitor.visit_edge(e),
            ValueData::Graph(g) => visitor.visit_graph(*g),
            ValueData::GraphMarker(m) => visitor.visit_graph_marker(*m),
            ValueData::Automaton(a) => visitor.visit_automaton(*a),
            ValueData::Object(o) => visitor.visit_object(o),
            ValueData::Set(s) => visitor.visit_set(s),
            ValueData::Bag(b) => visitor.visit_bag(b),
            ValueData::List(l) => visitor.visit_list(l),
            ValueData::Tuple(t) => visitor.visit_tuple(t),
            ValueData::Record(r) => visitor.visit_record(r),
            ValueData::Map(m) => visitor.visit_map(m),
            ValueData::Table(t) => visitor.visit_table(t),
            ValueData::Path(p) => visitor.visit_path(p),
            ValueData::PathSystem(ps) => visitor.visit_path_system(ps),
            ValueData::Slice(s) => visitor.visit_slice(s),
            ValueData::TypeCollection(tc) => visitor.visit_type_collection(tc),
        }
    }
}

/// Drive a visitor over a sequence of values with the structural hooks:
/// `pre`, elements separated by `inter`, then `post`.
pub fn visit_sequence<'a, V, I>(visitor: &mut V, items: I) -> Result<()>
where
    V: ValueVisitor + ?Sized,
    I: IntoIterator<Item = &'a Value>,
{
    visitor.pre()?;
    for (i, item) in items.into_iter().enumerate() {
        if i > 0 {
            visitor.inter()?;
        }
        item.accept(visitor)?;
    }
    visitor.post()
}

#[cfg(test)]
mod tests {
    use super::*;

    /// Collects int payloads, understands nothing else.
    #[derive(Default)]
    struct IntCollector {
        ints: Vec<i32>,
        separators: usize,
    }

    impl ValueVisitor for IntCollector {
        fn visit_int(&mut self, value: i32) -> Result<()> {
            self.ints.push(value);
            Ok(())
        }

        fn inter(&mut self) -> Result<()> {
            self.separators += 1;
            Ok(())
        }
    }

    #[test]
    fn unhandled_variant_is_refused() {
        let mut visitor = IntCollector::default();
        assert!(Value::from(1).accept(&mut visitor).is_ok());
        let err = Value::from("text").accept(&mut visitor).unwrap_err();
        assert!(matches!(err, ValueError::CannotVisit(ValueKind::String)));
    }

    #[test]
    fn sequence_hooks_fire_between_elements() {
        let items = [Value::from(1), Value::from(2), Value::from(3)];
        let mut visitor = IntCollector::default();
        visit_sequence(&mut visitor, items.iter()).unwrap();
        assert_eq!(visitor.ints, vec![1, 2, 3]);
        assert_eq!(visitor.separators, 2);
    }
}
