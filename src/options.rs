use std::fmt;
use std::sync::Arc;

use crate::entry::PathEntry;

/// Where a batch of entries came from.
///
/// A `Mapping` is a plain property bag, so every literal path appears at
/// most once and a repeated path is a conflict. An `Iterable` source (a raw
/// form submission) may legitimately repeat a path for multi-value fields.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum EntrySource {
    Mapping,
    #[default]
    Iterable,
}

impl EntrySource {
    pub fn is_iterable(self) -> bool {
        matches!(self, EntrySource::Iterable)
    }
}

/// Hook applied to every entry before its path is normalized.
pub type EntryTransform = Arc<dyn Fn(PathEntry, EntrySource) -> PathEntry + Send + Sync>;

#[derive(Clone, Default)]
pub struct BuildOptions {
    pub source: EntrySource,
    pub remove_empty_string: bool,
    pub duplicate_keys: Vec<String>,
    pub transform: Option<EntryTransform>,
}

impl BuildOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_source(mut self, source: EntrySource) -> Self {
        self.source = source;
        self
    }

    pub fn with_remove_empty_string(mut self, remove_empty_string: bool) -> Self {
        self.remove_empty_string = remove_empty_string;
        self
    }

    pub fn with_duplicate_keys<I, S>(mut self, keys: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: Into<String>,
    {
        self.duplicate_keys = keys.into_iter().map(Into::into).collect();
        self
    }

    pub fn with_duplicate_key(mut self, key: impl Into<String>) -> Self {
        self.duplicate_keys.push(key.into());
        self
    }

    pub fn with_transform<F>(mut self, transform: F) -> Self
    where
        F: Fn(PathEntry, EntrySource) -> PathEntry + Send + Sync + 'static,
    {
        self.transform = Some(Arc::new(transform));
        self
    }

    pub(crate) fn is_duplicate_key(&self, path: &str) -> bool {
        self.duplicate_keys.iter().any(|key| key == path)
    }
}

impl fmt::Debug for BuildOptions {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("BuildOptions")
            .field("source", &self.source)
            .field("remove_empty_string", &self.remove_empty_string)
            .field("duplicate_keys", &self.duplicate_keys)
            .field("transform", &self.transform.as_ref().map(|_| "<fn>"))
            .finish()
    }
}

/// How sequences are spelled when a tree is flattened back into entries.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum ArrayNotation {
    /// `tags[0]`, `tags[1]`
    #[default]
    Indexed,
    /// `tags[]` for sequences of plain leaves; nested sequences stay indexed.
    Appended,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct FlattenOptions {
    pub array_notation: ArrayNotation,
}

impl FlattenOptions {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn with_array_notation(mut self, array_notation: ArrayNotation) -> Self {
        self.array_notation = array_notation;
        self
    }
}
