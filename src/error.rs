use thiserror::Error as ThisError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorKind {
    DuplicateKey,
    MixedArray,
    IndexOverflow,
    InvalidNumber,
    UnrepresentableKey,
    Json,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ErrorStage {
    Input,
    Build,
    Coerce,
    Flatten,
}

/// Failure raised while converting flat entries into a typed tree.
///
/// Structural errors carry the path prefix at which the conflict was
/// detected so callers can point the end user at the offending field.
#[derive(Debug, ThisError)]
pub enum Error {
    #[error("Duplicate key at path part {path}")]
    DuplicateKey { path: String },

    #[error("Mixed array at path part {path}")]
    MixedArray { path: String },

    #[error("array index out of range at path part {path}")]
    IndexOverflow { path: String },

    #[error("invalid number for property '{property}': {value:?} ({reason})")]
    InvalidNumber {
        property: String,
        value: String,
        reason: String,
    },

    #[error("property '{property}' does not hold a numeric value")]
    InvalidNumberValue { property: String },

    #[error("key {key:?} cannot be written as a path segment")]
    UnrepresentableKey { key: String },

    #[error("json: {0}")]
    Json(#[from] serde_json::Error),
}

impl Error {
    pub fn duplicate_key(path: impl Into<String>) -> Self {
        Error::DuplicateKey { path: path.into() }
    }

    pub fn mixed_array(path: impl Into<String>) -> Self {
        Error::MixedArray { path: path.into() }
    }

    pub fn index_overflow(path: impl Into<String>) -> Self {
        Error::IndexOverflow { path: path.into() }
    }

    pub fn invalid_number(
        property: impl Into<String>,
        value: impl Into<String>,
        reason: impl ToString,
    ) -> Self {
        Error::InvalidNumber {
            property: property.into(),
            value: value.into(),
            reason: reason.to_string(),
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Error::DuplicateKey { .. } => ErrorKind::DuplicateKey,
            Error::MixedArray { .. } => ErrorKind::MixedArray,
            Error::IndexOverflow { .. } => ErrorKind::IndexOverflow,
            Error::InvalidNumber { .. } | Error::InvalidNumberValue { .. } => {
                ErrorKind::InvalidNumber
            }
            Error::UnrepresentableKey { .. } => ErrorKind::UnrepresentableKey,
            Error::Json(_) => ErrorKind::Json,
        }
    }

    pub fn stage(&self) -> ErrorStage {
        match self {
            Error::DuplicateKey { .. } | Error::MixedArray { .. } | Error::IndexOverflow { .. } => {
                ErrorStage::Build
            }
            Error::InvalidNumber { .. } | Error::InvalidNumberValue { .. } => ErrorStage::Coerce,
            Error::UnrepresentableKey { .. } => ErrorStage::Flatten,
            Error::Json(_) => ErrorStage::Input,
        }
    }

    /// Path prefix reported by structural errors.
    pub fn path(&self) -> Option<&str> {
        match self {
            Error::DuplicateKey { path }
            | Error::MixedArray { path }
            | Error::IndexOverflow { path } => Some(path),
            _ => None,
        }
    }

    pub fn is_structural(&self) -> bool {
        self.stage() == ErrorStage::Build
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[rstest::rstest]
    fn test_structural_errors_carry_path() {
        let err = Error::duplicate_key("a.b");
        assert_eq!(err.kind(), ErrorKind::DuplicateKey);
        assert_eq!(err.stage(), ErrorStage::Build);
        assert_eq!(err.path(), Some("a.b"));
        assert_eq!(err.to_string(), "Duplicate key at path part a.b");

        let err = Error::mixed_array("arr");
        assert!(err.is_structural());
        assert_eq!(err.to_string(), "Mixed array at path part arr");
    }

    #[rstest::rstest]
    fn test_coercion_errors_have_no_path() {
        let err = Error::invalid_number("count", "abc", "invalid digit found in string");
        assert_eq!(err.kind(), ErrorKind::InvalidNumber);
        assert_eq!(err.stage(), ErrorStage::Coerce);
        assert_eq!(err.path(), None);
        assert!(!err.is_structural());
    }
}
