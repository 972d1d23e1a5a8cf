use serde::Serialize;

/// Restore failure classification.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub enum ErrorClass {
    /// Required payload missing or malformed.
    Structural,
    /// Archive produced by an unsupported schema or release.
    Compatibility,
    /// Internal duplication that breaks a uniqueness invariant.
    Integrity,
    /// Path traversal or media outside the archive namespace.
    Security,
}

impl std::fmt::Display for ErrorClass {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// Stable, machine-checkable error codes for restore validation.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Structural
    MissingFile,
    InvalidTrip,
    // Compatibility
    UnsupportedSchema,
    UnsupportedAppVersion,
    // Integrity
    DuplicateTagName,
    DuplicateEntryTag,
    // Security
    InvalidMediaPath,
}

impl ErrorCode {
    pub const ALL: [ErrorCode; 7] = [
        ErrorCode::MissingFile,
        ErrorCode::UnsupportedSchema,
        ErrorCode::UnsupportedAppVersion,
        ErrorCode::InvalidTrip,
        ErrorCode::DuplicateTagName,
        ErrorCode::DuplicateEntryTag,
        ErrorCode::InvalidMediaPath,
    ];

    /// Wire representation, e.g. `MISSING_FILE`.
    pub fn as_str(self) -> &'static str {
        match self {
            ErrorCode::MissingFile => "MISSING_FILE",
            ErrorCode::InvalidTrip => "INVALID_TRIP",
            ErrorCode::UnsupportedSchema => "UNSUPPORTED_SCHEMA",
            ErrorCode::UnsupportedAppVersion => "UNSUPPORTED_APP_VERSION",
            ErrorCode::DuplicateTagName => "DUPLICATE_TAG_NAME",
            ErrorCode::DuplicateEntryTag => "DUPLICATE_ENTRY_TAG",
            ErrorCode::InvalidMediaPath => "INVALID_MEDIA_PATH",
        }
    }

    pub fn class(self) -> ErrorClass {
        match self {
            ErrorCode::MissingFile | ErrorCode::InvalidTrip => ErrorClass::Structural,
            ErrorCode::UnsupportedSchema | ErrorCode::UnsupportedAppVersion => {
                ErrorClass::Compatibility
            }
            ErrorCode::DuplicateTagName | ErrorCode::DuplicateEntryTag => ErrorClass::Integrity,
            ErrorCode::InvalidMediaPath => ErrorClass::Security,
        }
    }
}

impl std::fmt::Display for ErrorCode {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Typed restore error with stable code.
///
/// Carries only the code and a human-readable message, so it can be handed
/// to an HTTP layer as-is.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, thiserror::Error)]
#[error("{class}: {message} ({code})")]
pub struct RestoreError {
    pub class: ErrorClass,
    pub code: ErrorCode,
    pub message: String,
}

impl RestoreError {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            class: code.class(),
            code,
            message: message.into(),
        }
    }

    pub fn with_context(mut self, context: impl Into<String>) -> Self {
        self.message = format!("{}: {}", context.into(), self.message);
        self
    }

    pub fn class(&self) -> ErrorClass {
        self.class
    }

    pub fn code(&self) -> ErrorCode {
        self.code
    }

    pub(crate) fn missing_file(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::MissingFile, message)
    }

    pub(crate) fn invalid_trip(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidTrip, message)
    }

    pub(crate) fn invalid_media_path(message: impl Into<String>) -> Self {
        Self::new(ErrorCode::InvalidMediaPath, message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn codes_serialize_in_wire_form() {
        for code in ErrorCode::ALL {
            let json = serde_json::to_value(code).unwrap();
            assert_eq!(json, serde_json::Value::String(code.as_str().to_string()));
        }
    }

    #[test]
    fn display_includes_class_and_code() {
        let err = RestoreError::new(ErrorCode::InvalidMediaPath, "escapes media root")
            .with_context("entries[0].media[1]");
        assert_eq!(err.class(), ErrorClass::Security);
        assert_eq!(
            err.to_string(),
            "Security: entries[0].media[1]: escapes media root (INVALID_MEDIA_PATH)"
        );
    }
}
