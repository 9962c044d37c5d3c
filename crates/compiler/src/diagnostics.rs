//! Fatal-error reporting and the accumulating diagnostic list used by the
//! parser/binder. Mirrors the reference compiler's split between
//! "accumulate then stop" (parse/semantic) and "stop immediately"
//! (everything downstream of a clean parse).

use std::fmt;

/// A single line-numbered diagnostic produced while parsing or binding.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub line: u32,
    pub message: String,
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "line {}: {}", self.line, self.message)
    }
}

/// Accumulates diagnostics during parsing, numbering them the way the
/// reference compiler's bison-generated `yyerror` does: the count reported
/// in `[error N] ...` is the number of errors seen *before* this one.
#[derive(Debug, Default)]
pub struct Diagnostics {
    errors: Vec<Diagnostic>,
}

impl Diagnostics {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn report(&mut self, line: u32, message: impl Into<String>) {
        let n = self.errors.len();
        let message = message.into();
        tracing::debug!(line, %message, "diagnostic recorded");
        eprintln!("[error {n}] line {line}: {message}");
        self.errors.push(Diagnostic { line, message });
    }

    pub fn count(&self) -> usize {
        self.errors.len()
    }

    pub fn is_empty(&self) -> bool {
        self.errors.is_empty()
    }

    pub fn into_vec(self) -> Vec<Diagnostic> {
        self.errors
    }
}

/// Fatal, non-accumulating errors raised by the register allocator. These
/// abort the compilation immediately rather than being collected.
#[derive(Debug)]
pub enum FatalError {
    /// An expression tree's Sethi-Ullman number exceeded the three-register
    /// scratch pool.
    RegisterExhaustion { line: u32 },
}

impl fmt::Display for FatalError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            FatalError::RegisterExhaustion { line } => {
                write!(f, "line {line}: number of registers is not sufficient")
            }
        }
    }
}

impl std::error::Error for FatalError {}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn error_numbering_matches_reference_scheme() {
        let mut diags = Diagnostics::new();
        assert_eq!(diags.count(), 0);
        diags.report(3, "Undeclared variable: x");
        assert_eq!(diags.count(), 1);
        assert_eq!(diags.into_vec()[0].line, 3);
    }

    #[test]
    fn fatal_error_display() {
        let e = FatalError::RegisterExhaustion { line: 10 };
        assert!(e.to_string().contains("not sufficient"));
    }
}
