//! Error taxonomy for the value model.
//!
//! Every error here is local to the operation that raised it: the core is a
//! pure in-memory structure, so there is no partial-failure or retry story.
//! The evaluator above decides whether to abort the query or recover.

use thiserror::Error;

use crate::value::ValueKind;

pub type Result<T> = std::result::Result<T, ValueError>;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ValueError {
    /// A typed accessor was called on a value of a different variant and no
    /// conversion applies.
    #[error("invalid type: requested {requested}, actual {actual}")]
    InvalidType {
        requested: ValueKind,
        actual: ValueKind,
    },

    /// A structural precondition on a Path, PathSystem or Slice was violated:
    /// discontiguous edge, query before `finish()`, mutation after it, or an
    /// unresolvable deferred entry.
    #[error("path error: {0}")]
    Path(String),

    /// A cursor observed a structural change in the collection it iterates.
    /// Recoverable by re-creating the cursor.
    #[error("collection was structurally modified during cursor iteration")]
    ConcurrentModification,

    /// A variant-specific restriction, e.g. insert/remove on a Tuple.
    #[error("unsupported operation: {0}")]
    UnsupportedOperation(&'static str),

    /// Visitor fallback: the visitor has no handler for this variant.
    #[error("visitor cannot handle values of kind {0}")]
    CannotVisit(ValueKind),
}

impl ValueError {
    /// Shorthand for the accessor-mismatch case.
    pub(crate) fn invalid_type(requested: ValueKind, actual: ValueKind) -> Self {
        ValueError::InvalidType { requested, actual }
    }
}
