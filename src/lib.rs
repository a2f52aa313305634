//! Rebuild nested trees from flat form paths and coerce them against a schema.
//!
//! ```
//! use formtree::{BuildOptions, Schema, SchemaType};
//! use serde_json::json;
//!
//! let schema = Schema::object()
//!     .with_property("key", Schema::new(SchemaType::Integer))
//!     .with_property("completed", Schema::new(SchemaType::Boolean));
//! let todo = formtree::convert_urlencoded("key=3&title=Buy+milk", &BuildOptions::new(), &schema)
//!     .unwrap();
//! assert_eq!(todo, json!({"key": 3, "title": "Buy milk", "completed": false}));
//! ```

pub mod arena;
pub mod build;
pub mod coerce;
pub mod constants;
pub mod entry;
pub mod error;
pub mod flatten;
pub mod options;
pub mod path;
pub mod schema;

use serde_json::Value;

pub use crate::build::{build, build_from_map, build_from_pairs, build_from_urlencoded, TreeBuilder};
#[cfg(feature = "parallel")]
pub use crate::build::build_batch;
pub use crate::coerce::{coerce, coerce_value};
pub use crate::entry::{entries_from_map, entries_from_pairs, entries_from_urlencoded, PathEntry};
pub use crate::error::{Error, ErrorKind, ErrorStage};
pub use crate::flatten::{
    to_entries, to_entries_with_options, to_urlencoded, to_urlencoded_with_options,
};
pub use crate::options::{ArrayNotation, BuildOptions, EntrySource, EntryTransform, FlattenOptions};
pub use crate::path::{parse_path, PathSegment, SegmentKind};
pub use crate::schema::{Schema, SchemaType};

pub type Result<T> = std::result::Result<T, Error>;

/// Builds the tree for `entries` and coerces it against `schema`.
pub fn convert<I>(entries: I, options: &BuildOptions, schema: &Schema) -> Result<Value>
where
    I: IntoIterator<Item = PathEntry>,
{
    let tree = build(entries, options)?;
    coerce_value(tree, schema)
}

pub fn convert_urlencoded(input: &str, options: &BuildOptions, schema: &Schema) -> Result<Value> {
    let tree = build_from_urlencoded(input, options)?;
    coerce_value(tree, schema)
}

/// Converts and serializes to JSON text, ready to hand to a store.
pub fn convert_to_string<I>(entries: I, options: &BuildOptions, schema: &Schema) -> Result<String>
where
    I: IntoIterator<Item = PathEntry>,
{
    let value = convert(entries, options, schema)?;
    Ok(serde_json::to_string(&value)?)
}
