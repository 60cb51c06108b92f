//! Canonical value hashing.
//!
//! Every value has a single canonical 64-bit hash, independent of any
//! per-container hasher seed. The cross-variant equality exceptions (Enum vs
//! String, Object vs primitive) demand that equal values hash equal, so the
//! canonical hash is computed from a canonical form:
//!
//! - an Enum hashes exactly like the String of its literal,
//! - an Object wrapping a primitive hashes exactly like the primitive's own
//!   variant.
//!
//! Collections fold their elements' canonical hashes with a cubic polynomial,
//! `acc += (3+h)*(7+h)*(11+h) - 1`, plus a per-kind tag. The fold is
//! permutation-invariant, which is what the hash-based containers need; the
//! constants are pinned because tests assert the permutation property against
//! this exact fold.

/// Per-kind tags. Values are arbitrary but fixed; they only need to be
/// pairwise distinct.
pub(crate) const TAG_INVALID: u64 = 0x01;
pub(crate) const TAG_BOOL: u64 = 0x02;
pub(crate) const TAG_INT: u64 = 0x03;
pub(crate) const TAG_LONG: u64 = 0x04;
pub(crate) const TAG_DOUBLE: u64 = 0x05;
pub(crate) const TAG_STRING: u64 = 0x06;
pub(crate) const TAG_TYPE: u64 = 0x07;
pub(crate) const TAG_VERTEX: u64 = 0x08;
pub(crate) const TAG_EDGE: u64 = 0x09;
pub(crate) const TAG_GRAPH: u64 = 0x0a;
pub(crate) const TAG_GRAPH_MARKER: u64 = 0x0b;
pub(crate) const TAG_AUTOMATON: u64 = 0x0c;
pub(crate) const TAG_SET: u64 = 0x0d;
pub(crate) const TAG_BAG: u64 = 0x0e;
pub(crate) const TAG_LIST: u64 = 0x0f;
pub(crate) const TAG_TUPLE: u64 = 0x10;
pub(crate) const TAG_RECORD: u64 = 0x11;
pub(crate) const TAG_MAP: u64 = 0x12;
pub(crate) const TAG_TABLE: u64 = 0x13;
pub(crate) const TAG_PATH: u64 = 0x14;
pub(crate) const TAG_PATH_SYSTEM: u64 = 0x15;
pub(crate) const TAG_SLICE: u64 = 0x16;
pub(crate) const TAG_TYPE_COLLECTION: u64 = 0x17;

/// The fixed sentinel hash of an Invalid value.
pub(crate) const INVALID_HASH: u64 = mix(TAG_INVALID, 0);

/// Mix a kind tag with a 64-bit payload (splitmix64 finalizer).
pub(crate) const fn mix(tag: u64, payload: u64) -> u64 {
    let mut z = tag
        .wrapping_mul(0x9e37_79b9_7f4a_7c15)
        .wrapping_add(payload);
    z = (z ^ (z >> 30)).wrapping_mul(0xbf58_476d_1ce4_e5b9);
    z = (z ^ (z >> 27)).wrapping_mul(0x94d0_49bb_1331_11eb);
    z ^ (z >> 31)
}

/// FNV-1a over raw bytes. Used for textual payloads so that Enum literals and
/// Strings share one canonical hash.
pub(crate) fn fnv1a(bytes: &[u8]) -> u64 {
    let mut h: u64 = 0xcbf2_9ce4_8422_2325;
    for &b in bytes {
        h ^= b as u64;
        h = h.wrapping_mul(0x0000_0100_0000_01b3);
    }
    h
}

pub(crate) fn hash_bool(b: bool) -> u64 {
    mix(TAG_BOOL, b as u64)
}

pub(crate) fn hash_int(i: i32) -> u64 {
    mix(TAG_INT, i as i64 as u64)
}

pub(crate) fn hash_long(l: i64) -> u64 {
    mix(TAG_LONG, l as u64)
}

pub(crate) fn hash_double(d: f64) -> u64 {
    mix(TAG_DOUBLE, d.to_bits())
}

/// Canonical hash of textual payloads: Strings and Enum literals.
pub(crate) fn hash_str(s: &str) -> u64 {
    mix(TAG_STRING, fnv1a(s.as_bytes()))
}

/// Fold element hashes into a collection hash: permutation-invariant cubic
/// polynomial plus the collection-kind tag.
pub(crate) fn fold_elements<I>(kind_tag: u64, hashes: I) -> u64
where
    I: IntoIterator<Item = u64>,
{
    let mut acc = kind_tag;
    for h in hashes {
        acc = acc.wrapping_add(
            h.wrapping_add(3)
                .wrapping_mul(h.wrapping_add(7))
                .wrapping_mul(h.wrapping_add(11))
                .wrapping_sub(1),
        );
    }
    acc
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn fold_is_permutation_invariant() {
        let a = fold_elements(TAG_SET, [1u64, 2, 3]);
        let b = fold_elements(TAG_SET, [3u64, 1, 2]);
        assert_eq!(a, b);
    }

    #[test]
    fn fold_distinguishes_kinds() {
        let a = fold_elements(TAG_SET, [1u64, 2]);
        let b = fold_elements(TAG_BAG, [1u64, 2]);
        assert_ne!(a, b);
    }

    #[test]
    fn enum_and_string_share_textual_hash() {
        assert_eq!(hash_str("RED"), hash_str("RED"));
        assert_ne!(hash_str("RED"), hash_str("BLUE"));
    }
}
