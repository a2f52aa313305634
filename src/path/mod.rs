//! Path addresses such as `user.tags[1]` and the segments they decompose into.

mod scanner;

use smallvec::SmallVec;
use smol_str::SmolStr;

pub use scanner::PathScanner;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SegmentKind {
    /// `.key`, or a bare key at the start of the path.
    Object,
    /// `[n]` or `[]`.
    Array,
}

/// Container a segment creates when its slot is unset and more segments follow.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ContainerKind {
    Mapping,
    Sequence,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ArrayIndex {
    /// `[]`: the next free position.
    Append,
    /// `[n]`
    At(usize),
    /// Digits that do not fit in `usize`.
    Overflow,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathSegment {
    /// Property name, or the digits between the brackets (empty for `[]`).
    pub key: SmolStr,
    pub kind: SegmentKind,
    /// The path consumed up to and including this segment.
    pub prefix: SmolStr,
    pub default_container: ContainerKind,
}

impl PathSegment {
    pub fn is_object(&self) -> bool {
        self.kind == SegmentKind::Object
    }

    pub fn is_array(&self) -> bool {
        self.kind == SegmentKind::Array
    }

    pub fn array_index(&self) -> ArrayIndex {
        if self.key.is_empty() {
            return ArrayIndex::Append;
        }
        match self.key.parse::<usize>() {
            Ok(index) => ArrayIndex::At(index),
            Err(_) => ArrayIndex::Overflow,
        }
    }
}

pub type Segments = SmallVec<[PathSegment; 4]>;

/// Splits a path into segments.
///
/// Scanning stops silently at the first malformed piece (an unmatched
/// bracket, non-digits between brackets, an empty key); the segments read
/// so far are returned.
pub fn parse_path(path: &str) -> Segments {
    PathScanner::new(path).collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    fn keys(path: &str) -> Vec<(String, SegmentKind)> {
        parse_path(path)
            .into_iter()
            .map(|segment| (segment.key.to_string(), segment.kind))
            .collect()
    }

    #[rstest::rstest]
    fn test_parse_mixed_path() {
        let segments = parse_path("a.b[2].c");
        let prefixes: Vec<_> = segments.iter().map(|s| s.prefix.as_str()).collect();
        assert_eq!(prefixes, vec!["a", "a.b", "a.b[2]", "a.b[2].c"]);
        assert_eq!(
            keys("a.b[2].c"),
            vec![
                ("a".to_string(), SegmentKind::Object),
                ("b".to_string(), SegmentKind::Object),
                ("2".to_string(), SegmentKind::Array),
                ("c".to_string(), SegmentKind::Object),
            ]
        );
        let defaults: Vec<_> = segments.iter().map(|s| s.default_container).collect();
        assert_eq!(
            defaults,
            vec![
                ContainerKind::Mapping,
                ContainerKind::Sequence,
                ContainerKind::Mapping,
                ContainerKind::Mapping,
            ]
        );
    }

    #[rstest::rstest]
    fn test_append_segment() {
        let segments = parse_path("tags[]");
        assert_eq!(segments.len(), 2);
        assert_eq!(segments[1].prefix, "tags[]");
        assert_eq!(segments[1].array_index(), ArrayIndex::Append);
    }

    #[rstest::rstest]
    #[case("007", ArrayIndex::At(7))]
    #[case("0", ArrayIndex::At(0))]
    #[case("", ArrayIndex::Append)]
    #[case("99999999999999999999999999", ArrayIndex::Overflow)]
    fn test_array_index(#[case] digits: &str, #[case] expected: ArrayIndex) {
        let path = format!("a[{digits}]");
        let segments = parse_path(&path);
        assert_eq!(segments[1].array_index(), expected);
    }

    #[rstest::rstest]
    fn test_keys_may_contain_closing_bracket() {
        assert_eq!(
            keys("a]b.c"),
            vec![
                ("a]b".to_string(), SegmentKind::Object),
                ("c".to_string(), SegmentKind::Object),
            ]
        );
    }
}
