//! Persistence codec for tag trees.
//!
//! # Responsibility
//! - Convert between the live forest and plain, path-independent records.
//!
//! # See also
//! - `repo::tree_store` for where records are stored.

pub mod tree_codec;

pub use tree_codec::{
    dump, dump_forest, from_json, parse, parse_forest, to_draft, to_json, CodecError,
    CodecResult, LocationData, PersistData, PersistKind, PositionData, RangeData,
};
