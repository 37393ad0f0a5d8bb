#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CodecErrorKind {
    /// Bad registration or schema wiring: conflicting duplicate registration,
    /// unknown auxiliary type, enum redefinition mismatch.
    Config,
    /// A required field without a default was absent during decode.
    MissingField,
    /// The wire value could not be converted: unparseable scalar text,
    /// wrong JSON shape, arity mismatch, unknown enum wire value.
    Malformed,
}

#[derive(Debug, Clone)]
pub struct CodecError {
    pub kind: CodecErrorKind,
    pub message: String,
}

impl CodecError {
    pub fn new(kind: CodecErrorKind, message: String) -> Self {
        Self { kind, message }
    }

    pub fn config(message: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::Config, message.into())
    }

    pub fn missing_field(record: &str, field: &str) -> Self {
        Self::new(
            CodecErrorKind::MissingField,
            format!("{record}.{field}: required field is absent and has no default"),
        )
    }

    pub fn malformed(message: impl Into<String>) -> Self {
        Self::new(CodecErrorKind::Malformed, message.into())
    }
}

impl std::fmt::Display for CodecError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CodecError {}
