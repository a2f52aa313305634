use serde_json::{Map, Value};

use crate::constants::APPEND_MARKER;

/// One flat `(path, value)` pair, e.g. a single form field.
#[derive(Debug, Clone, PartialEq)]
pub struct PathEntry {
    pub path: String,
    pub value: Value,
}

impl PathEntry {
    pub fn new(path: impl Into<String>, value: impl Into<Value>) -> Self {
        Self {
            path: path.into(),
            value: value.into(),
        }
    }

    pub fn is_empty_string(&self) -> bool {
        matches!(&self.value, Value::String(value) if value.is_empty())
    }

    pub(crate) fn ends_with_append(&self) -> bool {
        self.path.ends_with(APPEND_MARKER)
    }

    pub(crate) fn strip_append(mut self) -> Self {
        if self.ends_with_append() {
            self.path.truncate(self.path.len() - APPEND_MARKER.len());
        }
        self
    }

    pub(crate) fn push_append(mut self) -> Self {
        self.path.push_str(APPEND_MARKER);
        self
    }
}

impl<P: Into<String>, V: Into<Value>> From<(P, V)> for PathEntry {
    fn from((path, value): (P, V)) -> Self {
        PathEntry::new(path, value)
    }
}

pub fn entries_from_pairs<I, P, V>(pairs: I) -> Vec<PathEntry>
where
    I: IntoIterator<Item = (P, V)>,
    P: Into<String>,
    V: Into<Value>,
{
    pairs.into_iter().map(PathEntry::from).collect()
}

/// Entries of a property bag, in the map's insertion order.
pub fn entries_from_map(map: &Map<String, Value>) -> Vec<PathEntry> {
    map.iter()
        .map(|(path, value)| PathEntry::new(path.as_str(), value.clone()))
        .collect()
}

/// Decodes an `application/x-www-form-urlencoded` body or query string.
///
/// A leading `?` and trailing line breaks are ignored. Repeated names are
/// kept as separate entries.
pub fn entries_from_urlencoded(input: &str) -> Vec<PathEntry> {
    let input = input.trim_end_matches(['\r', '\n']);
    let input = input.strip_prefix('?').unwrap_or(input);
    url::form_urlencoded::parse(input.as_bytes())
        .map(|(path, value)| PathEntry::new(path.into_owned(), value.into_owned()))
        .collect()
}
