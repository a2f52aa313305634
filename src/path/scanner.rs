use memchr::memchr2;
use smol_str::SmolStr;

use super::{ContainerKind, PathSegment, SegmentKind};
use crate::constants::{is_path_delimiter, ARRAY_CLOSE, ARRAY_OPEN, OBJECT_SEPARATOR};

/// Left-to-right scanner over the path grammar:
///
/// ```text
/// path    := key? tail*
/// tail    := '.' key | '[' digit* ']'
/// key     := (any byte except '.' and '[')+
/// ```
///
/// A `]` must be followed by `.`, `[` or the end of the path.
#[derive(Debug)]
pub struct PathScanner<'a> {
    path: &'a str,
    pos: usize,
    done: bool,
}

impl<'a> PathScanner<'a> {
    pub fn new(path: &'a str) -> Self {
        Self {
            path,
            pos: 0,
            done: false,
        }
    }

    fn bytes(&self) -> &'a [u8] {
        self.path.as_bytes()
    }

    fn scan_key(&mut self, start: usize) -> Option<PathSegment> {
        let rest = &self.bytes()[start..];
        let end = start + memchr2(OBJECT_SEPARATOR, ARRAY_OPEN, rest).unwrap_or(rest.len());
        if end == start {
            return None;
        }
        self.pos = end;
        Some(self.segment(start, end, end, SegmentKind::Object))
    }

    fn scan_index(&mut self, open: usize) -> Option<PathSegment> {
        let bytes = self.bytes();
        let start = open + 1;
        let digits = bytes[start..]
            .iter()
            .take_while(|byte| byte.is_ascii_digit())
            .count();
        let close = start + digits;
        if bytes.get(close) != Some(&ARRAY_CLOSE) {
            return None;
        }
        let end = close + 1;
        if let Some(&next) = bytes.get(end) {
            if !is_path_delimiter(next) {
                return None;
            }
        }
        self.pos = end;
        Some(self.segment(start, close, end, SegmentKind::Array))
    }

    fn segment(
        &self,
        key_start: usize,
        key_end: usize,
        end: usize,
        kind: SegmentKind,
    ) -> PathSegment {
        let default_container = match self.bytes().get(end) {
            Some(&ARRAY_OPEN) => ContainerKind::Sequence,
            _ => ContainerKind::Mapping,
        };
        PathSegment {
            key: SmolStr::new(&self.path[key_start..key_end]),
            kind,
            prefix: SmolStr::new(&self.path[..end]),
            default_container,
        }
    }
}

impl Iterator for PathScanner<'_> {
    type Item = PathSegment;

    fn next(&mut self) -> Option<Self::Item> {
        if self.done || self.pos >= self.path.len() {
            return None;
        }
        let pos = self.pos;
        let segment = match self.bytes()[pos] {
            ARRAY_OPEN => self.scan_index(pos),
            OBJECT_SEPARATOR if pos > 0 => self.scan_key(pos + 1),
            OBJECT_SEPARATOR => None,
            _ => self.scan_key(pos),
        };
        if segment.is_none() {
            self.done = true;
        }
        segment
    }
}
