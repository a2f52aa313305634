//! Folds flat path entries into a nested tree.

use serde_json::{Map, Value};
use tracing::{debug, trace};

use crate::arena::{Arena, ArrayMode, ArrayModes, Node, NodeId, Slot, SlotKey, ROOT};
use crate::entry::{entries_from_map, entries_from_pairs, entries_from_urlencoded, PathEntry};
use crate::options::{BuildOptions, EntrySource};
use crate::path::{parse_path, ArrayIndex, ContainerKind, PathSegment, SegmentKind};
use crate::{Error, Result};

pub fn build<I>(entries: I, options: &BuildOptions) -> Result<Value>
where
    I: IntoIterator<Item = PathEntry>,
{
    let mut builder = TreeBuilder::new(options);
    for entry in entries {
        builder.push(entry)?;
    }
    Ok(builder.finish())
}

/// Builds from raw pairs, which may repeat a path.
pub fn build_from_pairs<I, P, V>(pairs: I, options: &BuildOptions) -> Result<Value>
where
    I: IntoIterator<Item = (P, V)>,
    P: Into<String>,
    V: Into<Value>,
{
    let options = options.clone().with_source(EntrySource::Iterable);
    build(entries_from_pairs(pairs), &options)
}

/// Builds from a property bag whose keys are paths.
pub fn build_from_map(map: &Map<String, Value>, options: &BuildOptions) -> Result<Value> {
    let options = options.clone().with_source(EntrySource::Mapping);
    build(entries_from_map(map), &options)
}

pub fn build_from_urlencoded(input: &str, options: &BuildOptions) -> Result<Value> {
    let options = options.clone().with_source(EntrySource::Iterable);
    build(entries_from_urlencoded(input), &options)
}

/// Builds several independent submissions on the rayon pool.
#[cfg(feature = "parallel")]
pub fn build_batch(batches: Vec<Vec<PathEntry>>, options: &BuildOptions) -> Vec<Result<Value>> {
    use rayon::prelude::*;

    batches
        .into_par_iter()
        .map(|entries| build(entries, options))
        .collect()
}

/// Incremental form of [`build`]. Each builder owns its arena and array
/// bookkeeping, so builders never share state.
pub struct TreeBuilder<'a> {
    options: &'a BuildOptions,
    arena: Arena,
    modes: ArrayModes,
}

impl<'a> TreeBuilder<'a> {
    pub fn new(options: &'a BuildOptions) -> Self {
        Self {
            options,
            arena: Arena::new(),
            modes: ArrayModes::new(),
        }
    }

    pub fn push(&mut self, entry: PathEntry) -> Result<()> {
        if self.options.remove_empty_string && entry.is_empty_string() {
            debug!(path = %entry.path, "skipping empty value");
            return Ok(());
        }
        let entry = match &self.options.transform {
            Some(transform) => transform(entry, self.options.source),
            None => entry,
        };
        let entry = self.normalize(entry);
        let segments = parse_path(&entry.path);
        if segments.is_empty() {
            debug!(path = %entry.path, "skipping entry without path segments");
            return Ok(());
        }
        trace!(path = %entry.path, segments = segments.len(), "folding entry");
        self.fold(&segments, entry.value)
    }

    /// Materializes the tree. Index-addressed arrays come out compacted,
    /// since sequences only hold the positions that were written.
    pub fn finish(self) -> Value {
        self.arena.into_value()
    }

    fn normalize(&self, entry: PathEntry) -> PathEntry {
        let source = self.options.source;
        let entry = if !source.is_iterable() && entry.value.is_array() && entry.ends_with_append()
        {
            debug!(path = %entry.path, "dropping append marker from pre-built array");
            entry.strip_append()
        } else {
            entry
        };
        if source.is_iterable() && self.options.is_duplicate_key(&entry.path) {
            debug!(path = %entry.path, "treating known duplicate as append");
            return entry.push_append();
        }
        entry
    }

    fn fold(&mut self, segments: &[PathSegment], value: Value) -> Result<()> {
        let Some((last, intermediate)) = segments.split_last() else {
            return Ok(());
        };
        let mut current = ROOT;
        let mut current_path = "";
        for segment in intermediate {
            let key = self.resolve(current, current_path, segment)?;
            let next = match self.arena.slot(current, &key) {
                Slot::Unset => {
                    let id = self.arena.alloc(Node::empty(segment.default_container));
                    self.arena.set_child(current, key, id);
                    id
                }
                Slot::Mapping(id) | Slot::Sequence(id) => id,
                Slot::Leaf(_) => return Err(Error::duplicate_key(segment.prefix.as_str())),
            };
            current = next;
            current_path = segment.prefix.as_str();
        }

        let key = self.resolve(current, current_path, last)?;
        if self.arena.slot(current, &key) != Slot::Unset {
            return Err(Error::duplicate_key(last.prefix.as_str()));
        }
        let node = self.arena.alloc_value(value);
        self.arena.set_child(current, key, node);
        Ok(())
    }

    /// Checks that `segment` fits the container at `current` and returns the
    /// key it addresses there.
    fn resolve(
        &mut self,
        current: NodeId,
        current_path: &str,
        segment: &PathSegment,
    ) -> Result<SlotKey> {
        match (segment.kind, self.arena.container_kind(current)) {
            (SegmentKind::Object, Some(ContainerKind::Mapping)) => {
                Ok(SlotKey::Name(segment.key.clone()))
            }
            (SegmentKind::Array, Some(ContainerKind::Sequence)) => {
                let mode = self.modes.get(current);
                match segment.array_index() {
                    ArrayIndex::At(index) => {
                        // A pre-built array that already holds items only takes appends.
                        let prefilled = mode.is_none() && self.arena.sequence_len(current) > 0;
                        if mode == Some(ArrayMode::Unordered) || prefilled {
                            return Err(Error::mixed_array(current_path));
                        }
                        self.modes.mark(current, ArrayMode::Ordered);
                        Ok(SlotKey::Index(index))
                    }
                    ArrayIndex::Append => {
                        if mode == Some(ArrayMode::Ordered) {
                            return Err(Error::mixed_array(current_path));
                        }
                        self.modes.mark(current, ArrayMode::Unordered);
                        Ok(SlotKey::Index(self.arena.sequence_len(current)))
                    }
                    ArrayIndex::Overflow => Err(Error::index_overflow(segment.prefix.as_str())),
                }
            }
            _ => Err(Error::duplicate_key(segment.prefix.as_str())),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    fn build_pairs(pairs: &[(&str, &str)], options: &BuildOptions) -> Result<Value> {
        build(
            pairs.iter().map(|(path, value)| PathEntry::new(*path, *value)),
            options,
        )
    }

    #[rstest::rstest]
    fn test_nested_objects_and_arrays() {
        let value = build_pairs(
            &[
                ("title", "Buy milk"),
                ("owner.name", "Ada"),
                ("owner.roles[]", "admin"),
                ("owner.roles[]", "editor"),
                ("items[0].qty", "2"),
                ("items[0].sku", "A1"),
                ("items[1].qty", "1"),
            ],
            &BuildOptions::new(),
        )
        .expect("build");
        assert_eq!(
            value,
            json!({
                "title": "Buy milk",
                "owner": {"name": "Ada", "roles": ["admin", "editor"]},
                "items": [{"qty": "2", "sku": "A1"}, {"qty": "1"}]
            })
        );
    }

    #[rstest::rstest]
    fn test_append_with_nested_key_starts_new_element() {
        let value = build_pairs(
            &[("items[].name", "a"), ("items[].name", "b")],
            &BuildOptions::new(),
        )
        .expect("build");
        assert_eq!(value, json!({"items": [{"name": "a"}, {"name": "b"}]}));
    }

    #[rstest::rstest]
    #[case(&[("a", "1"), ("a.b", "2")], "a")]
    #[case(&[("a.b", "1"), ("a", "2")], "a")]
    #[case(&[("a[0]", "1"), ("a.b", "2")], "a.b")]
    #[case(&[("a.b", "1"), ("a[0]", "2")], "a[0]")]
    #[case(&[("[0]", "1")], "[0]")]
    fn test_kind_conflicts_are_duplicate_keys(
        #[case] pairs: &[(&str, &str)],
        #[case] expected: &str,
    ) {
        let err = build_pairs(pairs, &BuildOptions::new()).expect_err("conflict");
        assert!(matches!(err, Error::DuplicateKey { ref path } if path == expected));
    }

    #[rstest::rstest]
    fn test_unordered_then_ordered_is_mixed() {
        let err = build_pairs(&[("arr[]", "x"), ("arr[1]", "y")], &BuildOptions::new())
            .expect_err("mixed");
        assert!(matches!(err, Error::MixedArray { ref path } if path == "arr"));
    }

    #[rstest::rstest]
    fn test_index_overflow() {
        let err = build_pairs(&[("a[184467440737095516160]", "x")], &BuildOptions::new())
            .expect_err("overflow");
        assert!(matches!(err, Error::IndexOverflow { .. }));
    }

    #[rstest::rstest]
    fn test_builders_do_not_share_array_modes() {
        let options = BuildOptions::new();
        build_pairs(&[("arr[0]", "x")], &options).expect("first build");
        let value = build_pairs(&[("arr[]", "y")], &options).expect("second build");
        assert_eq!(value, json!({"arr": ["y"]}));
    }

    #[rstest::rstest]
    fn test_transform_runs_before_normalization() {
        let options = BuildOptions::new()
            .with_duplicate_keys(["tag"])
            .with_transform(|mut entry, _| {
                entry.path = entry.path.trim_start_matches("todo-").to_string();
                entry
            });
        let value = build_pairs(&[("todo-tag", "a"), ("todo-tag", "b")], &options).expect("build");
        assert_eq!(value, json!({"tag": ["a", "b"]}));
    }

    #[rstest::rstest]
    fn test_mapping_source_unwraps_prebuilt_arrays() {
        let map = json!({"tags[]": ["a", "b"], "title": "x"});
        let value = build_from_map(map.as_object().expect("object"), &BuildOptions::new())
            .expect("build");
        assert_eq!(value, json!({"tags": ["a", "b"], "title": "x"}));
    }

    #[rstest::rstest]
    fn test_mapping_source_writes_into_prebuilt_containers() {
        let map = json!({"todo": {"title": "x"}, "todo.done": "on", "tags": ["a"], "tags[]": "b"});
        let value = build_from_map(map.as_object().expect("object"), &BuildOptions::new())
            .expect("build");
        assert_eq!(
            value,
            json!({"todo": {"title": "x", "done": "on"}, "tags": ["a", "b"]})
        );
    }

    #[rstest::rstest]
    #[case(json!({"todo": {"title": "x"}, "todo.title": "y"}), "todo.title")]
    #[case(json!({"todo.done": "on", "todo": {"title": "x"}}), "todo")]
    #[case(json!({"tags": ["a"], "tags.first": "b"}), "tags.first")]
    fn test_prebuilt_containers_keep_single_write(#[case] map: Value, #[case] expected: &str) {
        let err = build_from_map(map.as_object().expect("object"), &BuildOptions::new())
            .expect_err("conflict");
        assert!(matches!(err, Error::DuplicateKey { ref path } if path == expected));
    }

    #[rstest::rstest]
    fn test_index_into_filled_prebuilt_array_is_mixed() {
        let map = json!({"tags": ["a"], "tags[1]": "b"});
        let err = build_from_map(map.as_object().expect("object"), &BuildOptions::new())
            .expect_err("mixed");
        assert!(matches!(err, Error::MixedArray { ref path } if path == "tags"));

        let map = json!({"tags": [], "tags[1]": "b", "tags[0]": "a"});
        let value = build_from_map(map.as_object().expect("object"), &BuildOptions::new())
            .expect("empty prebuilt array accepts indices");
        assert_eq!(value, json!({"tags": ["a", "b"]}));
    }

    #[rstest::rstest]
    fn test_iterable_source_keeps_append_marker_for_arrays() {
        let value = build(
            vec![PathEntry::new("tags[]", json!(["a", "b"]))],
            &BuildOptions::new(),
        )
        .expect("build");
        assert_eq!(value, json!({"tags": [["a", "b"]]}));
    }

    #[rstest::rstest]
    fn test_entries_without_segments_are_skipped() {
        let value = build_pairs(&[("", "x"), (".a", "y"), ("b", "z")], &BuildOptions::new())
            .expect("build");
        assert_eq!(value, json!({"b": "z"}));
    }

    #[cfg(feature = "parallel")]
    #[rstest::rstest]
    fn test_build_batch_keeps_results_separate() {
        let batches = vec![
            vec![PathEntry::new("arr[0]", "x")],
            vec![PathEntry::new("arr[]", "y")],
            vec![PathEntry::new("a", "1"), PathEntry::new("a", "2")],
        ];
        let results = build_batch(batches, &BuildOptions::new().with_source(EntrySource::Mapping));
        assert_eq!(results[0].as_ref().expect("first"), &json!({"arr": ["x"]}));
        assert_eq!(results[1].as_ref().expect("second"), &json!({"arr": ["y"]}));
        assert!(results[2].is_err());
    }
}
