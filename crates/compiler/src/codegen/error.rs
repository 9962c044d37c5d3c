use std::fmt;

/// Errors raised while emitting assembly. Writing to an in-memory `String`
/// buffer can only fail on a formatting bug (`Format`); `Logic` covers the
/// fatal, non-accumulating conditions described in §7 (allocator
/// exhaustion, the unsupported `/` operator).
#[derive(Debug)]
pub enum CodeGenError {
    Logic(String),
    Format(std::fmt::Error),
}

impl fmt::Display for CodeGenError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            CodeGenError::Logic(msg) => write!(f, "{msg}"),
            CodeGenError::Format(e) => write!(f, "formatting error: {e}"),
        }
    }
}

impl std::error::Error for CodeGenError {}

impl From<std::fmt::Error> for CodeGenError {
    fn from(e: std::fmt::Error) -> Self {
        CodeGenError::Format(e)
    }
}

impl From<crate::diagnostics::FatalError> for CodeGenError {
    fn from(e: crate::diagnostics::FatalError) -> Self {
        CodeGenError::Logic(e.to_string())
    }
}
