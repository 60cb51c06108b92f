//! End-to-end tests of the value model: accessors, conversion costs, the
//! equality/hash contract and textual round-trips.

use greval_core::{
    conversion_cost, BrowsingInfo, Edge, EdgeId, EnumValue, Map, Number, Opaque, Set,
    TypeDescriptor, Value, ValueError, ValueKind, Vertex, VertexId,
};

fn vertex(id: u32) -> Vertex {
    Vertex::new(VertexId::new(id), TypeDescriptor::new("Person"))
}

#[test]
fn strict_accessors_succeed_on_matching_variant_only() {
    let v = Value::from(42);
    assert_eq!(v.as_int().unwrap(), 42);

    let err = v.as_str().unwrap_err();
    assert_eq!(
        err,
        ValueError::InvalidType {
            requested: ValueKind::String,
            actual: ValueKind::Int,
        }
    );

    // No silent widening: an Int is not a Long.
    assert!(v.as_long().is_err());
    assert!(v.as_double().is_err());
}

#[test]
fn native_payloads_round_trip_through_value() {
    assert_eq!(Value::from(true).as_bool().unwrap(), true);
    assert_eq!(Value::from(-3).as_int().unwrap(), -3);
    assert_eq!(Value::from(9_000_000_000i64).as_long().unwrap(), 9_000_000_000);
    assert_eq!(Value::from(2.5).as_double().unwrap(), 2.5);
    assert_eq!(Value::from("s").as_str().unwrap(), "s");
}

#[test]
fn as_number_covers_all_three_numeric_variants() {
    assert_eq!(Value::from(1).as_number().unwrap(), Number::Int(1));
    assert_eq!(Value::from(2i64).as_number().unwrap(), Number::Long(2));
    assert_eq!(Value::from(2.5).as_number().unwrap(), Number::Double(2.5));
    assert!(Value::from("x").as_number().is_err());

    assert_eq!(Number::Int(3).to_f64(), 3.0);
    assert_eq!(Number::Double(3.9).to_i64(), 3);
}

#[test]
fn conversion_cost_table() {
    use ValueKind as K;

    // Identity is free.
    assert_eq!(conversion_cost(K::Int, K::Int), Some(0));
    assert_eq!(conversion_cost(K::Path, K::Path), Some(0));

    // Numeric widening has a small cost; narrowing is impossible.
    assert_eq!(conversion_cost(K::Int, K::Long), Some(1));
    assert_eq!(conversion_cost(K::Int, K::Double), Some(2));
    assert_eq!(conversion_cost(K::Long, K::Double), Some(2));
    assert_eq!(conversion_cost(K::Long, K::Int), None);
    assert_eq!(conversion_cost(K::Double, K::Int), None);

    // Abstract targets.
    assert_eq!(conversion_cost(K::Int, K::Number), Some(0));
    assert_eq!(conversion_cost(K::Vertex, K::AttributedElement), Some(0));
    assert_eq!(conversion_cost(K::Set, K::Collection), Some(0));
    assert_eq!(conversion_cost(K::PathSystem, K::Collection), Some(10));
    assert_eq!(conversion_cost(K::Slice, K::Collection), Some(10));
    assert_eq!(conversion_cost(K::Int, K::Collection), None);

    // The expensive universal targets.
    assert_eq!(conversion_cost(K::Int, K::String), Some(100));
    assert_eq!(conversion_cost(K::Vertex, K::Object), Some(100));
}

#[test]
fn display_and_parse_round_trip_for_scalars() {
    assert_eq!(Value::invalid().to_string(), "null");
    assert_eq!(Value::from(true).to_string(), "true");
    assert_eq!(Value::from(-7).to_string(), "-7");

    assert_eq!(Value::parse_bool("true"), Some(Value::from(true)));
    assert_eq!(Value::parse_bool("yes"), None);
    assert_eq!(Value::parse_int("-7"), Some(Value::from(-7)));
    assert_eq!(Value::parse_int("7.5"), None);
    assert_eq!(Value::parse_long("9000000000"), Some(Value::from(9_000_000_000i64)));
    assert_eq!(Value::parse_double("2.5"), Some(Value::from(2.5)));
}

#[test]
fn nan_equals_itself_so_doubles_work_as_set_elements() {
    let nan = Value::from(f64::NAN);
    assert_eq!(nan, nan.clone());

    let mut set = Set::new();
    assert!(set.add(Value::from(f64::NAN)));
    assert!(!set.add(Value::from(f64::NAN)));
    assert_eq!(set.len(), 1);
}

#[test]
fn enum_value_keys_are_found_by_string_lookup() {
    // Cross-variant equality plus the shared canonical hash means a Map
    // keyed by an Enum answers String lookups for the same literal.
    let color = TypeDescriptor::new("schema.Color");
    let red = Value::from(EnumValue::new(color, "RED", 0));

    let mut map = Map::new();
    map.put(red, Value::from(1));
    assert_eq!(map.get(&Value::from("RED")), Some(&Value::from(1)));
    assert_eq!(map.get(&Value::from("BLUE")), None);
}

#[test]
fn opaque_wrapper_distinguishes_payload_types() {
    let a = Value::object(Opaque(("pair", 1)));
    let b = Value::object(Opaque(("pair", 1)));
    let c = Value::object(Opaque(("pair", 2)));
    assert_eq!(a, b);
    assert_eq!(a.value_hash(), b.value_hash());
    assert_ne!(a, c);

    // A wrapped tuple is not a primitive: no cross-variant equality.
    assert_ne!(a, Value::from("pair"));
}

#[test]
fn object_string_round_trip_through_as_object() {
    let v = Value::from("hello");
    let obj = v.as_object();
    assert_eq!(obj.to_string(), "hello");

    let as_value = Value::new(greval_core::ValueData::Object(obj));
    assert_eq!(as_value, v);
    assert_eq!(as_value.value_hash(), v.value_hash());
}

#[test]
fn to_collection_accepts_collections_and_path_structures_only() {
    let set: Set = [1, 2].into_iter().map(Value::from).collect();
    let v = Value::from(set);
    assert_eq!(v.to_collection().unwrap(), v);

    let err = Value::from(1).to_collection().unwrap_err();
    assert_eq!(
        err,
        ValueError::InvalidType {
            requested: ValueKind::Collection,
            actual: ValueKind::Int,
        }
    );
}

#[test]
fn total_order_sorts_across_variants_deterministically() {
    let mut values = vec![
        Value::from("b"),
        Value::from(2),
        Value::invalid(),
        Value::from(true),
        Value::from("a"),
        Value::from(1),
    ];
    values.sort_by(Value::total_order);

    // Invalid first, then per-variant: Bool (true before false), Int
    // ascending, String lexicographic.
    assert_eq!(values[0], Value::invalid());
    assert_eq!(values[1], Value::from(true));
    assert_eq!(values[2], Value::from(1));
    assert_eq!(values[3], Value::from(2));
    assert_eq!(values[4], Value::from("a"));
    assert_eq!(values[5], Value::from("b"));
}

#[test]
fn edge_identity_is_the_signed_id() {
    let t = TypeDescriptor::new("Knows");
    let e = Edge::new(EdgeId::new(4), vertex(1), vertex(2), t);
    let rev = e.reversed();

    assert_ne!(Value::from(e.clone()), Value::from(rev.clone()));
    assert_eq!(rev.id(), EdgeId::new(-4));
    assert_eq!(rev.normal_id(), 4);
    assert_eq!(rev.reversed(), e);
}

#[test]
fn browsing_info_rides_along_without_changing_identity() {
    let tagged = Value::from(vertex(3)).with_browsing_info(BrowsingInfo::Vertex(VertexId::new(3)));
    let plain = Value::from(vertex(3));

    assert_eq!(tagged, plain);
    assert_eq!(tagged.value_hash(), plain.value_hash());
    assert_eq!(tagged.browsing_info(), Some(BrowsingInfo::Vertex(VertexId::new(3))));
    assert_eq!(plain.browsing_info(), None);
}

#[test]
fn graph_element_references_serialize() {
    let t = TypeDescriptor::new("Knows");
    let e = Edge::new(EdgeId::new(4), vertex(1), vertex(2), t);
    let json = serde_json::to_string(&e).unwrap();
    let back: Edge = serde_json::from_str(&json).unwrap();
    assert_eq!(back, e);
    assert_eq!(back.start().id(), VertexId::new(1));
}
