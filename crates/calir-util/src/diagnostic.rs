//! Minimal diagnostic type shared by the parser and verifier.
//!
//! Calir's failure contract (spec §7) is "return a typed error or a bool,
//! print a diagnostic" rather than rustc-style diagnostic batching, so this
//! stays deliberately small: a level, a message, and the span it points at.

use crate::span::Span;
use std::fmt;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum Level {
    Error,
    Warning,
    Note,
}

impl fmt::Display for Level {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let s = match self {
            Level::Error => "error",
            Level::Warning => "warning",
            Level::Note => "note",
        };
        f.write_str(s)
    }
}

#[derive(Clone, Debug)]
pub struct Diagnostic {
    pub level: Level,
    pub message: String,
    pub span: Span,
}

impl Diagnostic {
    pub fn error(message: impl Into<String>, span: Span) -> Self {
        Diagnostic { level: Level::Error, message: message.into(), span }
    }

    pub fn note(message: impl Into<String>, span: Span) -> Self {
        Diagnostic { level: Level::Note, message: message.into(), span }
    }
}

impl fmt::Display for Diagnostic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}:{}: {}: {}", self.span.line, self.span.column, self.level, self.message)
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn formats_with_position() {
        let d = Diagnostic::error("bad token", Span::new(0, 1, 3, 7));
        assert_eq!(format!("{d}"), "3:7: error: bad token");
    }
}
