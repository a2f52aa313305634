pub const OBJECT_SEPARATOR: u8 = b'.';

pub const ARRAY_OPEN: u8 = b'[';

pub const ARRAY_CLOSE: u8 = b']';

/// Suffix that turns a plain path into an array append.
pub const APPEND_MARKER: &str = "[]";

/// Value a checkbox submits when ticked.
pub const CHECKBOX_ON: &str = "on";

pub const TIME_FORMATS: &[&str] = &["time", "date-time"];

#[inline]
pub fn is_path_delimiter(byte: u8) -> bool {
    matches!(byte, OBJECT_SEPARATOR | ARRAY_OPEN)
}

#[inline]
pub fn is_time_format(format: &str) -> bool {
    TIME_FORMATS.contains(&format)
}
