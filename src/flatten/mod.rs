//! Turns a nested tree back into flat path entries.
//!
//! For any tree produced by [`crate::build`] from non-conflicting entries,
//! building the flattened entries again yields an equal tree. Empty
//! mappings and sequences have no leaves and disappear.

use serde_json::{Map, Value};

use crate::constants::{is_path_delimiter, APPEND_MARKER};
use crate::entry::PathEntry;
use crate::options::{ArrayNotation, FlattenOptions};
use crate::{Error, Result};

pub fn to_entries(tree: &Value) -> Result<Vec<PathEntry>> {
    to_entries_with_options(tree, &FlattenOptions::default())
}

/// The root must be a mapping, since a path always starts with a key.
pub fn to_entries_with_options(tree: &Value, options: &FlattenOptions) -> Result<Vec<PathEntry>> {
    let Value::Object(map) = tree else {
        return Err(Error::UnrepresentableKey { key: String::new() });
    };
    let mut flattener = Flattener {
        options,
        path: String::new(),
        entries: Vec::new(),
    };
    flattener.write_map(map)?;
    Ok(flattener.entries)
}

/// Flattens and encodes as `application/x-www-form-urlencoded`.
pub fn to_urlencoded(tree: &Value) -> Result<String> {
    to_urlencoded_with_options(tree, &FlattenOptions::default())
}

pub fn to_urlencoded_with_options(tree: &Value, options: &FlattenOptions) -> Result<String> {
    let entries = to_entries_with_options(tree, options)?;
    let mut serializer = url::form_urlencoded::Serializer::new(String::new());
    for entry in &entries {
        serializer.append_pair(&entry.path, &leaf_text(&entry.value));
    }
    Ok(serializer.finish())
}

/// Text form of a leaf as a form field would carry it.
pub fn leaf_text(value: &Value) -> String {
    match value {
        Value::String(text) => text.clone(),
        Value::Null => String::new(),
        Value::Bool(flag) => flag.to_string(),
        Value::Number(number) => {
            if let Some(int) = number.as_i64() {
                itoa::Buffer::new().format(int).to_string()
            } else if let Some(int) = number.as_u64() {
                itoa::Buffer::new().format(int).to_string()
            } else {
                let float = number.as_f64().unwrap_or_default();
                ryu::Buffer::new().format(float).to_string()
            }
        }
        other => other.to_string(),
    }
}

struct Flattener<'a> {
    options: &'a FlattenOptions,
    path: String,
    entries: Vec<PathEntry>,
}

impl Flattener<'_> {
    fn write_value(&mut self, value: &Value) -> Result<()> {
        match value {
            Value::Object(map) => self.write_map(map),
            Value::Array(items) => self.write_items(items),
            leaf => {
                self.entries.push(PathEntry::new(self.path.clone(), leaf.clone()));
                Ok(())
            }
        }
    }

    fn write_map(&mut self, map: &Map<String, Value>) -> Result<()> {
        for (key, value) in map {
            if key.is_empty() || key.bytes().any(is_path_delimiter) {
                return Err(Error::UnrepresentableKey { key: key.clone() });
            }
            let mark = self.path.len();
            if mark > 0 {
                self.path.push('.');
            }
            self.path.push_str(key);
            self.write_value(value)?;
            self.path.truncate(mark);
        }
        Ok(())
    }

    fn write_items(&mut self, items: &[Value]) -> Result<()> {
        let appended = self.options.array_notation == ArrayNotation::Appended
            && items.iter().all(|item| !item.is_object() && !item.is_array());
        let mut index = itoa::Buffer::new();
        for (position, item) in items.iter().enumerate() {
            let mark = self.path.len();
            if appended {
                self.path.push_str(APPEND_MARKER);
            } else {
                self.path.push('[');
                self.path.push_str(index.format(position));
                self.path.push(']');
            }
            self.write_value(item)?;
            self.path.truncate(mark);
        }
        Ok(())
    }
}
